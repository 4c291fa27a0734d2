//! parser for specification documents

use std::path::Path;
use tracing::debug;

use crate::language::{Document, LoadingError};

pub mod lexer;
pub mod parser;

pub use parser::{
    parse_context, parse_premise, parse_production, parse_type, parse_typing_rule,
    parse_with_recovery, Failure, ParsingError,
};

/// Read a file and return an owned String. We pass that ownership back to the
/// main function so that the Document object created by parse() below can
/// borrow from it.
pub fn load(filename: &Path) -> Result<String, LoadingError<'_>> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename,
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename,
                }),
            }
        }
    }
}

/// Parse text into a Document object, or return the list of errors
/// encountered.
pub fn parse(content: &str) -> Result<Document<'_>, Vec<ParsingError<'_>>> {
    let (document, failures) = parser::parse_with_recovery(content);

    if failures.is_empty() {
        let productions = document
            .productions()
            .count();
        let rules = document
            .typing_rules()
            .count();
        debug!(
            "Found {} production{} and {} typing rule{}",
            productions,
            if productions == 1 { "" } else { "s" },
            rules,
            if rules == 1 { "" } else { "s" }
        );
        Ok(document)
    } else {
        debug!("errors: {}", failures.len());
        Err(failures
            .into_iter()
            .map(|failure| failure.error)
            .collect())
    }
}
