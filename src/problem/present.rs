use owo_colors::OwoColorize;
use std::path::Path;

use crate::language::LoadingError;
use crate::problem::Diagnostic;

/// Format a diagnostic with full details including the offending source line
pub fn full_diagnostic(diagnostic: &Diagnostic, filename: &Path, source: &str) -> String {
    let code = source
        .lines()
        .nth(diagnostic.line - 1)
        .unwrap_or("?");
    let line = diagnostic.line;
    let column = diagnostic.column;
    let width = 3.max(
        line.to_string()
            .len(),
    );

    let details = match &diagnostic.rule {
        Some(rule) => format!("{} in rule '{}'", diagnostic.kind, rule),
        None => diagnostic
            .kind
            .to_string(),
    };

    format!(
        r#"
{}: {}:{}:{} {}

{:width$} {}
{:width$} {} {}
{:width$} {} {:>column$}

{}
        "#,
        "error".bright_red(),
        filename.to_string_lossy(),
        line,
        column,
        diagnostic
            .message
            .bold(),
        ' ',
        '|'.bright_blue(),
        line.bright_blue(),
        '|'.bright_blue(),
        code,
        ' ',
        '|'.bright_blue(),
        '^'.bright_red(),
        details
    )
    .trim_ascii()
    .to_string()
}

/// Format a diagnostic with concise single-line output
pub fn concise_diagnostic(diagnostic: &Diagnostic, filename: &Path) -> String {
    format!(
        "{}: {}:{}:{} {}",
        "error".bright_red(),
        filename.to_string_lossy(),
        diagnostic.line,
        diagnostic.column,
        diagnostic
            .message
            .bold(),
    )
}

/// Format a LoadingError with concise single-line output
pub fn concise_loading_error<'i>(error: &LoadingError<'i>) -> String {
    format!(
        "{}: {}: {}",
        "error".bright_red(),
        error
            .filename
            .display(),
        error
            .problem
            .bold()
    )
}
