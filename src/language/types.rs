//! Types representing the parsed form of a specification document: grammar
//! productions annotated with typing rule names, and the inference rules
//! themselves.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::regex::*;

/// The symbol every typing context starts from.
pub const BASE_CONTEXT: &str = "Γ";

#[derive(Eq, Debug, PartialEq)]
pub struct Document<'i> {
    pub declarations: Vec<Declaration<'i>>,
}

impl<'i> Document<'i> {
    pub fn productions(&self) -> impl Iterator<Item = &ProductionRule<'i>> {
        self.declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Production(production) => Some(production),
                _ => None,
            })
    }

    pub fn typing_rules(&self) -> impl Iterator<Item = &TypingRule<'i>> {
        self.declarations
            .iter()
            .filter_map(|declaration| match declaration {
                Declaration::Typing(rule) => Some(rule),
                _ => None,
            })
    }
}

#[derive(Eq, Debug, PartialEq)]
pub enum Declaration<'i> {
    Production(ProductionRule<'i>),
    Typing(TypingRule<'i>),
    Comment(&'i str),
}

#[derive(Clone, Copy, Eq, Debug, PartialEq, Hash, PartialOrd, Ord)]
pub struct Identifier<'i>(pub &'i str);

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A semantic variable such as `x`, `τ₁`, or `α₁₂₃`. The parser accepts any
/// word in a variable position and keeps where it was found; whether the
/// text is actually of the allowed form is decided during validation.
///
/// Two variables are equal when they are written the same way. The offset is
/// only there for reporting.
#[derive(Clone, Copy, Debug)]
pub struct Variable<'i> {
    pub text: &'i str,
    pub offset: usize,
}

impl<'i> Variable<'i> {
    pub fn new(text: &'i str, offset: usize) -> Variable<'i> {
        Variable { text, offset }
    }

    pub fn is_well_formed(&self) -> bool {
        is_variable(self.text)
    }

    pub fn is_base_context(&self) -> bool {
        self.text == BASE_CONTEXT
    }

    /// The single letter this variable is named by.
    pub fn base(&self) -> Option<char> {
        if self.is_well_formed() {
            self.text
                .chars()
                .next()
        } else {
            None
        }
    }

    /// The subscript digits following the base letter, if any.
    pub fn subscript(&self) -> Option<&'i str> {
        let base = self.base()?;
        let rest = &self.text[base.len_utf8()..];
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

impl PartialEq for Variable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Variable<'_> {}

impl Hash for Variable<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text
            .hash(state);
    }
}

impl PartialOrd for Variable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text
            .cmp(other.text)
    }
}

impl fmt::Display for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

// grammar productions

#[derive(Eq, Debug, PartialEq)]
pub struct ProductionRule<'i> {
    pub name: Identifier<'i>,
    pub rule: Option<Identifier<'i>>,
    pub rhs: GrammarExpr<'i>,
    pub offset: usize,
}

impl<'i> ProductionRule<'i> {
    /// Every variable bound by a `Symbol[var]` occurrence on the right hand
    /// side, in the order written.
    pub fn bindings(&self) -> Vec<Variable<'i>> {
        let mut result = Vec::new();
        self.rhs
            .bindings(&mut result);
        result
    }
}

#[derive(Clone, Copy, Eq, Debug, PartialEq)]
pub enum Terminal<'i> {
    /// Quoted literal, including its quotes
    Literal(&'i str),
    /// Slash delimited regular expression, including the slashes
    Pattern(&'i str),
}

impl<'i> Terminal<'i> {
    pub fn text(&self) -> &'i str {
        match self {
            Terminal::Literal(text) => text,
            Terminal::Pattern(text) => text,
        }
    }
}

#[derive(Eq, Debug, PartialEq)]
pub enum GrammarExpr<'i> {
    Terminal(Terminal<'i>, Option<Variable<'i>>),
    NonTerminal(Identifier<'i>, Option<Variable<'i>>),
    Sequence(Vec<GrammarExpr<'i>>),
    Alternatives(Vec<GrammarExpr<'i>>),
}

impl<'i> GrammarExpr<'i> {
    fn bindings(&self, result: &mut Vec<Variable<'i>>) {
        match self {
            GrammarExpr::Terminal(_, binding) | GrammarExpr::NonTerminal(_, binding) => {
                if let Some(variable) = binding {
                    result.push(*variable);
                }
            }
            GrammarExpr::Sequence(items) | GrammarExpr::Alternatives(items) => {
                for item in items {
                    item.bindings(result);
                }
            }
        }
    }
}

// typing rules

#[derive(Eq, Debug, PartialEq)]
pub struct TypingRule<'i> {
    pub name: Identifier<'i>,
    pub premises: Vec<Premise<'i>>,
    pub conclusion: Conclusion<'i>,
    pub offset: usize,
}

impl<'i> TypingRule<'i> {
    /// Variables used anywhere in the premises or conclusion, in order of
    /// appearance, including the ones a context extension introduces.
    pub fn variables(&self) -> Vec<Variable<'i>> {
        let mut result = Vec::new();
        for premise in &self.premises {
            premise.variables(&mut result);
        }
        self.conclusion
            .variables(&mut result);
        result
    }

    /// Variables introduced by `Γ,x:τ` extensions in this rule's premises.
    /// Extensions in the conclusion introduce nothing.
    pub fn introduced(&self) -> Vec<Variable<'i>> {
        let mut result = Vec::new();
        for premise in &self.premises {
            if let Premise::Judgment(judgment) = premise {
                result.extend(
                    judgment
                        .context
                        .introduced(),
                );
            }
        }
        result
    }

    /// Contexts named on the right of a membership premise, other than the
    /// base context.
    pub fn context_references(&self) -> Vec<Variable<'i>> {
        self.premises
            .iter()
            .filter_map(|premise| match premise {
                Premise::Membership { context, .. } if !context.is_base_context() => {
                    Some(*context)
                }
                _ => None,
            })
            .collect()
    }
}

#[derive(Eq, Debug, PartialEq)]
pub enum Premise<'i> {
    Judgment(Judgment<'i>),
    Membership {
        variable: Variable<'i>,
        context: Variable<'i>,
    },
    Relation {
        left: TypeExpr<'i>,
        relation: Relation,
        right: TypeExpr<'i>,
    },
    Predicate {
        name: Identifier<'i>,
        arguments: Vec<Variable<'i>>,
    },
}

impl<'i> Premise<'i> {
    fn variables(&self, result: &mut Vec<Variable<'i>>) {
        match self {
            Premise::Judgment(judgment) => judgment.variables(result),
            Premise::Membership { variable, .. } => result.push(*variable),
            Premise::Relation { left, right, .. } => {
                left.variables(result);
                right.variables(result);
            }
            Premise::Predicate { arguments, .. } => result.extend(arguments),
        }
    }
}

/// An assertion `Γ ⊢ e : τ`.
#[derive(Eq, Debug, PartialEq)]
pub struct Judgment<'i> {
    pub context: Context<'i>,
    pub expression: Variable<'i>,
    pub ty: TypeExpr<'i>,
}

impl<'i> Judgment<'i> {
    fn variables(&self, result: &mut Vec<Variable<'i>>) {
        for extension in &self
            .context
            .extensions
        {
            result.push(extension.variable);
            extension
                .ty
                .variables(result);
        }
        result.push(self.expression);
        self.ty
            .variables(result);
    }
}

/// The base context `Γ` followed by zero or more extensions.
#[derive(Eq, Debug, PartialEq, Default)]
pub struct Context<'i> {
    pub extensions: Vec<Extension<'i>>,
}

impl<'i> Context<'i> {
    /// Find the type bound to a variable. A later extension of the same
    /// variable shadows an earlier one.
    pub fn lookup(&self, variable: &Variable) -> Option<&TypeExpr<'i>> {
        self.extensions
            .iter()
            .rev()
            .find(|extension| extension.variable == *variable)
            .map(|extension| &extension.ty)
    }

    pub fn introduced(&self) -> impl Iterator<Item = Variable<'i>> + '_ {
        self.extensions
            .iter()
            .map(|extension| extension.variable)
    }
}

#[derive(Eq, Debug, PartialEq)]
pub struct Extension<'i> {
    pub variable: Variable<'i>,
    pub ty: TypeExpr<'i>,
}

#[derive(Clone, Copy, Eq, Debug, PartialEq)]
pub enum Relation {
    Equal,
    Member,
    Less,
    Subtype,
    LessEqual,
    Subset,
    ProperSubset,
    Superset,
    ProperSuperset,
    Equivalent,
    NotEqual,
}

impl Relation {
    pub fn from_symbol(symbol: &str) -> Option<Relation> {
        match symbol {
            "=" => Some(Relation::Equal),
            "∈" => Some(Relation::Member),
            "<" => Some(Relation::Less),
            "<:" => Some(Relation::Subtype),
            "≤" => Some(Relation::LessEqual),
            "⊆" => Some(Relation::Subset),
            "⊂" => Some(Relation::ProperSubset),
            "⊇" => Some(Relation::Superset),
            "⊃" => Some(Relation::ProperSuperset),
            "≡" => Some(Relation::Equivalent),
            "≠" => Some(Relation::NotEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Equal => "=",
            Relation::Member => "∈",
            Relation::Less => "<",
            Relation::Subtype => "<:",
            Relation::LessEqual => "≤",
            Relation::Subset => "⊆",
            Relation::ProperSubset => "⊂",
            Relation::Superset => "⊇",
            Relation::ProperSuperset => "⊃",
            Relation::Equivalent => "≡",
            Relation::NotEqual => "≠",
        }
    }
}

#[derive(Eq, Debug, PartialEq)]
pub enum TypeExpr<'i> {
    Variable(Variable<'i>),
    Constructor(Identifier<'i>, Vec<TypeExpr<'i>>),
    Arrow(Box<TypeExpr<'i>>, Box<TypeExpr<'i>>),
    Paren(Box<TypeExpr<'i>>),
}

impl<'i> TypeExpr<'i> {
    pub fn variables(&self, result: &mut Vec<Variable<'i>>) {
        match self {
            TypeExpr::Variable(variable) => result.push(*variable),
            TypeExpr::Constructor(_, arguments) => {
                for argument in arguments {
                    argument.variables(result);
                }
            }
            TypeExpr::Arrow(left, right) => {
                left.variables(result);
                right.variables(result);
            }
            TypeExpr::Paren(inner) => inner.variables(result),
        }
    }

    /// Look through any explicit grouping.
    pub fn unparenthesized(&self) -> &TypeExpr<'i> {
        match self {
            TypeExpr::Paren(inner) => inner.unparenthesized(),
            _ => self,
        }
    }
}

#[derive(Eq, Debug, PartialEq)]
pub enum Conclusion<'i> {
    Type(TypeExpr<'i>),
    Judgment(Judgment<'i>),
    ContextLookup(Variable<'i>),
}

impl<'i> Conclusion<'i> {
    fn variables(&self, result: &mut Vec<Variable<'i>>) {
        match self {
            Conclusion::Type(ty) => ty.variables(result),
            Conclusion::Judgment(judgment) => judgment.variables(result),
            Conclusion::ContextLookup(variable) => result.push(*variable),
        }
    }
}

// the validate_*() functions take a string and check it is of the expected
// form, returning the wrapped value if so.

pub fn validate_identifier(input: &str) -> Option<Identifier<'_>> {
    let re = regex!(r"^[a-zA-Z][a-zA-Z0-9_]*$");
    if re.is_match(input) {
        Some(Identifier(input))
    } else {
        None
    }
}

/// Type constructors start with an uppercase Latin letter.
pub fn validate_constructor(input: &str) -> Option<Identifier<'_>> {
    let re = regex!(r"^[A-Z][a-zA-Z0-9]*$");
    if re.is_match(input) {
        Some(Identifier(input))
    } else {
        None
    }
}

/// Custom predicate names are purely alphabetic.
pub fn validate_predicate(input: &str) -> Option<Identifier<'_>> {
    let re = regex!(r"^[a-zA-Z]+$");
    if re.is_match(input) {
        Some(Identifier(input))
    } else {
        None
    }
}

/// One Latin or Greek letter optionally followed by subscript digits.
pub fn is_variable(input: &str) -> bool {
    let re = regex!(r"^[a-zA-Z\p{Greek}][₀-₉]*$");
    re.is_match(input)
}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn variable_forms() {
        assert!(is_variable("x"));
        assert!(is_variable("x₁"));
        assert!(is_variable("τ₂"));
        assert!(is_variable("α₁₂₃"));
        assert!(is_variable("Γ"));

        assert!(!is_variable("x1"));
        assert!(!is_variable("τ_1"));
        assert!(!is_variable("xy"));
        assert!(!is_variable("var"));

        // Greek letters outside the basic alphabet block
        assert!(is_variable("ϕ"));
        assert!(is_variable("ϵ"));
        assert!(is_variable("ϑ₁"));
        assert!(!is_variable("ϕϵ"));
        assert!(!is_variable(""));
        assert!(!is_variable("₁"));
    }

    #[test]
    fn variable_parts() {
        let v = Variable::new("α₁₂₃", 0);
        assert_eq!(v.base(), Some('α'));
        assert_eq!(v.subscript(), Some("₁₂₃"));

        let v = Variable::new("x", 0);
        assert_eq!(v.base(), Some('x'));
        assert_eq!(v.subscript(), None);

        let v = Variable::new("xy", 0);
        assert_eq!(v.base(), None);
        assert_eq!(v.subscript(), None);
    }

    #[test]
    fn variable_equality_ignores_position() {
        assert_eq!(Variable::new("τ₁", 3), Variable::new("τ₁", 40));
        assert_ne!(Variable::new("τ₁", 3), Variable::new("τ₂", 3));
    }

    #[test]
    fn identifier_rules() {
        assert_eq!(validate_identifier("lambda"), Some(Identifier("lambda")));
        assert_eq!(validate_identifier("impl_intro"), Some(Identifier("impl_intro")));
        assert_eq!(validate_identifier("1st"), None);

        assert_eq!(validate_constructor("List"), Some(Identifier("List")));
        assert_eq!(validate_constructor("T"), Some(Identifier("T")));
        assert_eq!(validate_constructor("list"), None);
        assert_eq!(validate_constructor("Foo_bar"), None);

        assert_eq!(validate_predicate("fresh"), Some(Identifier("fresh")));
        assert_eq!(validate_predicate("is_value"), None);
        assert_eq!(validate_predicate("value2"), None);
    }

    #[test]
    fn context_shadowing() {
        let context = Context {
            extensions: vec![
                Extension {
                    variable: Variable::new("x", 0),
                    ty: TypeExpr::Constructor(Identifier("Int"), vec![]),
                },
                Extension {
                    variable: Variable::new("y", 0),
                    ty: TypeExpr::Constructor(Identifier("Bool"), vec![]),
                },
                Extension {
                    variable: Variable::new("x", 0),
                    ty: TypeExpr::Variable(Variable::new("τ", 0)),
                },
            ],
        };

        assert_eq!(
            context.lookup(&Variable::new("x", 0)),
            Some(&TypeExpr::Variable(Variable::new("τ", 0)))
        );
        assert_eq!(
            context.lookup(&Variable::new("y", 0)),
            Some(&TypeExpr::Constructor(Identifier("Bool"), vec![]))
        );
        assert_eq!(context.lookup(&Variable::new("z", 0)), None);
    }

    #[test]
    fn relation_symbols() {
        for symbol in ["=", "∈", "<", "<:", "≤", "⊆", "⊂", "⊇", "⊃", "≡", "≠"] {
            let relation = Relation::from_symbol(symbol).unwrap();
            assert_eq!(relation.symbol(), symbol);
        }
        assert_eq!(Relation::from_symbol(">"), None);
    }
}
