//! Cross-checking typing rules against the productions that name them

mod validator;

pub use validator::*;
