// Program wide top-level error handling

mod diagnostic;
mod present;

// Re-export all public symbols
pub use diagnostic::*;
pub use present::*;
