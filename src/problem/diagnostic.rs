use serde::Serialize;
use std::fmt;

use crate::checking::CheckingError;
use crate::parsing::ParsingError;

/// Every kind of problem that can be reported. Declaration order is the
/// ordinal used to break ties when sorting diagnostics: lexical kinds first,
/// then syntactic, then semantic, then document level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Kind {
    // lexical
    UnrecognizedCharacter,

    // syntactic
    Expected,
    MissingArrowOperand,
    UnbalancedGeneric,
    EmptyGenericArgs,
    InvalidConstructorCase,
    MissingBase,
    MalformedExtension,
    MultipleJudgmentSymbols,
    InvalidMembershipArity,
    MultipleRelationSymbols,
    AmbiguousWithJudgment,
    InvalidPredicateName,
    InvalidPredicateArgument,
    UnrecognizedPremiseForm,
    DuplicateBinding,
    MissingBar,
    MissingRuleName,
    EmptyConclusion,

    // semantic
    UnmatchedRuleName,
    MissingTypingRule,
    DuplicateRuleName,
    UnboundVariable,
    InvalidVariableFormat,

    // document
    EmptyDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Lexical,
    Syntactic,
    Semantic,
    Document,
}

impl Kind {
    pub fn category(&self) -> Category {
        match self {
            Kind::UnrecognizedCharacter => Category::Lexical,
            Kind::UnmatchedRuleName
            | Kind::MissingTypingRule
            | Kind::DuplicateRuleName
            | Kind::UnboundVariable
            | Kind::InvalidVariableFormat => Category::Semantic,
            Kind::EmptyDocument => Category::Document,
            _ => Category::Syntactic,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A problem found in a document, positioned by line and column (both
/// starting at 1, columns counted in characters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: Kind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip)]
    pub offset: usize,
}

impl Diagnostic {
    pub fn new(kind: Kind, message: String, rule: Option<&str>, source: &str, offset: usize) -> Diagnostic {
        let offset = offset.min(source.len());

        Diagnostic {
            kind,
            message,
            line: calculate_line_number(source, offset) + 1,
            column: calculate_column_number(source, offset) + 1,
            rule: rule.map(str::to_string),
            offset,
        }
    }

    pub fn from_parsing(error: &ParsingError, rule: Option<&str>, source: &str) -> Diagnostic {
        Diagnostic::new(error.kind(), error.message(), rule, source, error.offset())
    }

    pub fn from_checking(error: &CheckingError, source: &str) -> Diagnostic {
        Diagnostic::new(
            error.kind(),
            error.message(),
            error.rule(),
            source,
            error.offset(),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Put diagnostics into the order they are reported in: by position, then by
/// kind, with the message as a last resort so the order never depends on how
/// they were gathered.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.line, a.column, a.kind, &a.message).cmp(&(b.line, b.column, b.kind, &b.message))
    });
}

// Helper functions for line/column calculation. Both are zero origin.

pub(crate) fn calculate_line_number(content: &str, offset: usize) -> usize {
    content[..offset]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
}

pub(crate) fn calculate_column_number(content: &str, offset: usize) -> usize {
    let before = &content[..offset];
    match before.rfind('\n') {
        Some(start) => content[start + 1..offset]
            .chars()
            .count(),
        None => before
            .chars()
            .count(),
    }
}
