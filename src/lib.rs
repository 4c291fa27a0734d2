//! Parsing and binding validation for type system specifications: grammar
//! productions annotated with typing rule names, and the inference rules
//! that give those productions their types.

use tracing::{debug, info};

pub mod checking;
pub mod formatting;
pub mod language;
pub mod parsing;
pub mod problem;

mod regex;

use crate::checking::ValidatedDocument;
use crate::parsing::ParsingError;
use crate::problem::{sort_diagnostics, Diagnostic};

/// Parse a document and check its bindings in one pass. Every rule that
/// fails to parse contributes one diagnostic; rules that parse are then
/// validated, except that a rule whose own parse failed is not reported
/// again as unmatched or missing. The diagnostics come back sorted by
/// position.
pub fn parse_and_validate(content: &str) -> Result<ValidatedDocument<'_>, Vec<Diagnostic>> {
    let (document, failures) = parsing::parse_with_recovery(content);

    let mut diagnostics: Vec<Diagnostic> = failures
        .iter()
        .map(|failure| Diagnostic::from_parsing(&failure.error, failure.rule, content))
        .collect();

    let empty = failures
        .iter()
        .any(|failure| matches!(failure.error, ParsingError::EmptyDocument(_)));

    if !empty {
        let excused: Vec<&str> = failures
            .iter()
            .filter_map(|failure| failure.rule)
            .collect();

        let errors = checking::check(&document, &excused);
        debug!(
            "{} parse failures, {} binding errors",
            failures.len(),
            errors.len()
        );

        diagnostics.extend(
            errors
                .iter()
                .map(|error| Diagnostic::from_checking(error, content)),
        );
    }

    if diagnostics.is_empty() {
        let validated = ValidatedDocument::new(document);
        let count = validated
            .rules()
            .count();
        info!(
            "Validated {} typing rule{}",
            count,
            if count == 1 { "" } else { "s" }
        );
        Ok(validated)
    } else {
        sort_diagnostics(&mut diagnostics);
        info!("{} diagnostics", diagnostics.len());
        Err(diagnostics)
    }
}
