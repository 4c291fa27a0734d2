// Types representing grammar productions and typing rules

mod error;
mod types;

// Re-export all public symbols
pub use error::*;
pub use types::*;
