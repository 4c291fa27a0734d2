//! Classes of fragment a rendered specification is made of

/// Types of content that can be rendered with different styles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Syntax {
    Neutral, // default
    Comment,
    Declaration,
    Label,
    Terminal,
    Pattern,
    NonTerminal,
    Variable,
    Constructor,
    Context,
    Predicate,
    Operator,
    Punctuation,
    Bar,
}
