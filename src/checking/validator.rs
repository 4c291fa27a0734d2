//! Binding validation. Every production annotated with a rule name is paired
//! with the typing rule of that name; the variables the production binds
//! (plus any the rule introduces through context extensions) are the only
//! ones the rule may use.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::language::*;
use crate::problem::Kind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckingError<'i> {
    UnmatchedRuleName(usize, &'i str),
    MissingTypingRule(usize, &'i str, &'i str),
    DuplicateRuleName(usize, &'i str),
    UnboundVariable(usize, &'i str, &'i str),
    InvalidVariableFormat(usize, &'i str, Option<&'i str>),
}

impl<'i> CheckingError<'i> {
    pub fn offset(&self) -> usize {
        match self {
            CheckingError::UnmatchedRuleName(offset, _) => *offset,
            CheckingError::MissingTypingRule(offset, _, _) => *offset,
            CheckingError::DuplicateRuleName(offset, _) => *offset,
            CheckingError::UnboundVariable(offset, _, _) => *offset,
            CheckingError::InvalidVariableFormat(offset, _, _) => *offset,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            CheckingError::UnmatchedRuleName(_, _) => Kind::UnmatchedRuleName,
            CheckingError::MissingTypingRule(_, _, _) => Kind::MissingTypingRule,
            CheckingError::DuplicateRuleName(_, _) => Kind::DuplicateRuleName,
            CheckingError::UnboundVariable(_, _, _) => Kind::UnboundVariable,
            CheckingError::InvalidVariableFormat(_, _, _) => Kind::InvalidVariableFormat,
        }
    }

    /// The typing rule this error concerns, if any.
    pub fn rule(&self) -> Option<&'i str> {
        match self {
            CheckingError::UnmatchedRuleName(_, rule) => Some(*rule),
            CheckingError::MissingTypingRule(_, _, rule) => Some(*rule),
            CheckingError::DuplicateRuleName(_, rule) => Some(*rule),
            CheckingError::UnboundVariable(_, _, rule) => Some(*rule),
            CheckingError::InvalidVariableFormat(_, _, rule) => *rule,
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckingError::UnmatchedRuleName(_, rule) => {
                format!("typing rule '{}' is not named by any production", rule)
            }
            CheckingError::MissingTypingRule(_, production, rule) => format!(
                "production '{}' names typing rule '{}' but no such rule is defined",
                production, rule
            ),
            CheckingError::DuplicateRuleName(_, rule) => {
                format!("rule name '{}' is declared more than once", rule)
            }
            CheckingError::UnboundVariable(_, variable, rule) => format!(
                "variable '{}' is not bound in typing rule '{}'",
                variable, rule
            ),
            CheckingError::InvalidVariableFormat(_, text, _) => format!(
                "'{}' is not a valid variable, expected a single letter optionally followed by subscript digits",
                text
            ),
        }
    }
}

/// The variables a production makes available to its typing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingEnvironment<'i> {
    pub variables: BTreeSet<Variable<'i>>,
}

impl<'i> BindingEnvironment<'i> {
    pub fn from_production(production: &ProductionRule<'i>) -> BindingEnvironment<'i> {
        BindingEnvironment {
            variables: production
                .bindings()
                .into_iter()
                .collect(),
        }
    }

    pub fn contains(&self, variable: &Variable<'i>) -> bool {
        self.variables
            .contains(variable)
    }
}

/// A Document which passed validation, indexed so the production and typing
/// rule sharing a name can be found together.
#[derive(Debug)]
pub struct ValidatedDocument<'i> {
    document: Document<'i>,
    index: BTreeMap<&'i str, (usize, usize)>,
    environments: BTreeMap<&'i str, BindingEnvironment<'i>>,
}

impl<'i> ValidatedDocument<'i> {
    /// Index a document. Only meaningful for one that check() found no
    /// problems with; names that don't pair up are left out.
    pub(crate) fn new(document: Document<'i>) -> ValidatedDocument<'i> {
        let mut productions = BTreeMap::new();
        let mut rules = BTreeMap::new();

        for (i, declaration) in document
            .declarations
            .iter()
            .enumerate()
        {
            match declaration {
                Declaration::Production(ProductionRule {
                    rule: Some(name), ..
                }) => {
                    productions
                        .entry(name.0)
                        .or_insert(i);
                }
                Declaration::Typing(rule) => {
                    rules
                        .entry(rule.name.0)
                        .or_insert(i);
                }
                _ => {}
            }
        }

        let mut index = BTreeMap::new();
        let mut environments = BTreeMap::new();

        for (name, p) in productions {
            if let Some(&t) = rules.get(name) {
                index.insert(name, (p, t));
                if let Declaration::Production(production) = &document.declarations[p] {
                    environments.insert(name, BindingEnvironment::from_production(production));
                }
            }
        }

        ValidatedDocument {
            document,
            index,
            environments,
        }
    }

    /// Find the production and typing rule going by the given rule name.
    pub fn lookup(&self, name: &str) -> Option<(&ProductionRule<'i>, &TypingRule<'i>)> {
        let (p, t) = *self
            .index
            .get(name)?;

        match (&self.document.declarations[p], &self.document.declarations[t]) {
            (Declaration::Production(production), Declaration::Typing(rule)) => {
                Some((production, rule))
            }
            _ => None,
        }
    }

    pub fn environment(&self, name: &str) -> Option<&BindingEnvironment<'i>> {
        self.environments
            .get(name)
    }

    /// Names of every paired rule, in sorted order.
    pub fn rules(&self) -> impl Iterator<Item = &'i str> + '_ {
        self.index
            .keys()
            .copied()
    }

    pub fn document(&self) -> &Document<'i> {
        &self.document
    }

    pub fn into_document(self) -> Document<'i> {
        self.document
    }
}

/// Validate a parsed Document, returning it wrapped up for lookup or every
/// problem found.
pub fn validate(document: Document<'_>) -> Result<ValidatedDocument<'_>, Vec<CheckingError<'_>>> {
    let errors = check(&document, &[]);

    if errors.is_empty() {
        Ok(ValidatedDocument::new(document))
    } else {
        Err(errors)
    }
}

/// Run every check over the document without stopping at the first problem.
/// Names in `excused` belong to declarations that failed to parse; their
/// counterparts aren't reported as unmatched.
pub fn check<'i>(document: &Document<'i>, excused: &[&str]) -> Vec<CheckingError<'i>> {
    let mut errors = Vec::new();

    let mut productions: BTreeMap<&'i str, &ProductionRule<'i>> = BTreeMap::new();
    for production in document.productions() {
        if let Some(name) = production.rule {
            if productions.contains_key(name.0) {
                errors.push(CheckingError::DuplicateRuleName(production.offset, name.0));
            } else {
                productions.insert(name.0, production);
            }
        }

        for variable in production.bindings() {
            if !variable.is_well_formed() {
                errors.push(CheckingError::InvalidVariableFormat(
                    variable.offset,
                    variable.text,
                    production
                        .rule
                        .map(|name| name.0),
                ));
            }
        }
    }

    let mut rules: BTreeSet<&'i str> = BTreeSet::new();
    for rule in document.typing_rules() {
        let name = rule.name.0;

        if !rules.insert(name) {
            errors.push(CheckingError::DuplicateRuleName(rule.offset, name));
        }

        match productions.get(name) {
            Some(production) => {
                let environment = BindingEnvironment::from_production(production);
                check_rule(rule, &environment, &mut errors);
            }
            None => {
                if !is_excused(excused, name) {
                    errors.push(CheckingError::UnmatchedRuleName(rule.offset, name));
                }
            }
        }
    }

    for (name, production) in &productions {
        if !rules.contains(name) && !is_excused(excused, name) {
            errors.push(CheckingError::MissingTypingRule(
                production.offset,
                production.name.0,
                *name,
            ));
        }
    }

    debug!(
        productions = productions.len(),
        rules = rules.len(),
        errors = errors.len(),
        "checked bindings"
    );

    errors
}

fn is_excused(excused: &[&str], name: &str) -> bool {
    excused
        .iter()
        .any(|other| *other == name)
}

/// Each offending variable is reported once, where it first appears.
fn check_rule<'i>(
    rule: &TypingRule<'i>,
    environment: &BindingEnvironment<'i>,
    errors: &mut Vec<CheckingError<'i>>,
) {
    let name = rule.name.0;
    let introduced = rule.introduced();
    let mut reported: Vec<&'i str> = Vec::new();

    for variable in rule.variables() {
        if reported.contains(&variable.text) {
            continue;
        }

        if !variable.is_well_formed() {
            errors.push(CheckingError::InvalidVariableFormat(
                variable.offset,
                variable.text,
                Some(name),
            ));
            reported.push(variable.text);
        } else if !environment.contains(&variable) && !introduced.contains(&variable) {
            errors.push(CheckingError::UnboundVariable(
                variable.offset,
                variable.text,
                name,
            ));
            reported.push(variable.text);
        }
    }

    // contexts named in membership premises need only be well formed
    for context in rule.context_references() {
        if !context.is_well_formed() && !reported.contains(&context.text) {
            errors.push(CheckingError::InvalidVariableFormat(
                context.offset,
                context.text,
                Some(name),
            ));
            reported.push(context.text);
        }
    }
}

#[cfg(test)]
mod verify {
    use super::*;
    use crate::parsing::parse;

    fn errors(content: &str) -> Vec<CheckingError<'_>> {
        let document = parse(content).unwrap();
        check(&document, &[])
    }

    #[test]
    fn context_lookup_rule() {
        let content = r#"
Variable(var) ::= /[a-zA-Z][a-zA-Z0-9_]*/[x]

x ∈ Γ
------------ (var)
Γ(x)
        "#;

        let document = parse(content).unwrap();
        let validated = validate(document).unwrap();

        let (production, rule) = validated
            .lookup("var")
            .unwrap();
        assert_eq!(production.name, Identifier("Variable"));
        assert_eq!(rule.name, Identifier("var"));

        let environment = validated
            .environment("var")
            .unwrap();
        assert!(environment.contains(&Variable::new("x", 0)));
        assert!(!environment.contains(&Variable::new("y", 0)));

        assert_eq!(
            validated
                .rules()
                .collect::<Vec<_>>(),
            vec!["var"]
        );
        assert!(validated
            .lookup("lambda")
            .is_none());
    }

    #[test]
    fn extension_type_is_unbound() {
        // σ appears only in the rule, so nothing binds it
        let content = r#"
Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e]

Γ,x:τ ⊢ e : σ
----------------- (lambda)
τ -> σ
        "#;

        let result = errors(content);
        assert_eq!(result.len(), 1);
        assert!(matches!(
            result[0],
            CheckingError::UnboundVariable(_, "σ", "lambda")
        ));
    }

    #[test]
    fn extension_variables_are_in_scope() {
        let content = r#"
Let(let) ::= 'let' Term[e₁] 'in' Term[e₂]

Γ ⊢ e₁ : τ₁, Γ,y:τ₁ ⊢ e₂ : τ₂
------------------------ (let)
Γ ⊢ e₂ : τ₂
        "#;

        let result = errors(content);
        let names: Vec<&str> = result
            .iter()
            .filter_map(|error| match error {
                CheckingError::UnboundVariable(_, variable, _) => Some(*variable),
                _ => None,
            })
            .collect();

        // y comes from the extension; the types were never bound
        assert_eq!(names, vec!["τ₁", "τ₂"]);
    }

    #[test]
    fn conclusion_extensions_introduce_nothing() {
        let content = r#"
Fresh(fresh) ::= 'new' ':' Type[τ]

----------- (fresh)
Γ,y:τ ⊢ y : τ
        "#;

        let result = errors(content);
        assert_eq!(result.len(), 1);
        assert!(matches!(
            result[0],
            CheckingError::UnboundVariable(_, "y", "fresh")
        ));
    }

    #[test]
    fn greek_variants_bind() {
        let content = r#"
Variable(var) ::= /[a-z]+/[ϕ]
Epsilon(eps) ::= Term[ϵ] Type[ϑ]

ϕ ∈ Γ
----- (var)
Γ(ϕ)

Γ,ϕ:ϑ ⊢ ϵ : ϑ
------------- (eps)
Γ ⊢ ϵ : ϑ
        "#;

        assert_eq!(errors(content), vec![]);
    }

    #[test]
    fn unmatched_rule_name() {
        let content = r#"
x ∈ Γ
------ (foo)
Γ(x)
        "#;

        let result = errors(content);
        assert_eq!(result.len(), 1);
        assert!(matches!(
            result[0],
            CheckingError::UnmatchedRuleName(_, "foo")
        ));
        assert_eq!(result[0].rule(), Some("foo"));
    }

    #[test]
    fn missing_typing_rule() {
        let content = "Variable(var) ::= /[a-z]+/[x]\n";

        let result = errors(content);
        assert_eq!(
            result,
            vec![CheckingError::MissingTypingRule(0, "Variable", "var")]
        );
    }

    #[test]
    fn excused_names() {
        let content = "Variable(var) ::= /[a-z]+/[x]\n";
        let document = parse(content).unwrap();

        assert_eq!(check(&document, &["var"]), vec![]);
    }

    #[test]
    fn duplicate_rule_names() {
        let content = r#"
Variable(var) ::= /[a-z]+/[x]
Name(var) ::= /[A-Z]+/[x]

x ∈ Γ
------ (var)
Γ(x)
        "#;

        let result = errors(content);
        assert_eq!(result.len(), 1);
        assert!(matches!(
            result[0],
            CheckingError::DuplicateRuleName(_, "var")
        ));
    }

    #[test]
    fn invalid_variable_formats() {
        let content = r#"
Pair(pair) ::= '(' Term[x1] ',' Term[y] ')'

Γ ⊢ x1 : τ_1, Γ ⊢ y : σ₁
------------- (pair)
Γ ⊢ y : var
        "#;

        let result = errors(content);
        let formats: Vec<&str> = result
            .iter()
            .filter_map(|error| match error {
                CheckingError::InvalidVariableFormat(_, text, _) => Some(*text),
                _ => None,
            })
            .collect();

        // x1 in the production, then x1, τ_1, var in the rule
        assert_eq!(formats, vec!["x1", "x1", "τ_1", "var"]);
        assert!(result
            .iter()
            .any(|error| matches!(error, CheckingError::UnboundVariable(_, "σ₁", "pair"))));
        assert!(!result
            .iter()
            .any(|error| matches!(error, CheckingError::UnboundVariable(_, "x1", _))));
    }

    #[test]
    fn unbound_reported_once() {
        let content = r#"
Application(app) ::= Term[f] Term[a]

Γ ⊢ f : τ₁ → τ₂, Γ ⊢ a : τ₁
----------------- (app)
τ₂
        "#;

        let result = errors(content);
        let unbound: Vec<(usize, &str)> = result
            .iter()
            .filter_map(|error| match error {
                CheckingError::UnboundVariable(offset, variable, _) => Some((*offset, *variable)),
                _ => None,
            })
            .collect();

        assert_eq!(
            unbound
                .iter()
                .map(|(_, variable)| *variable)
                .collect::<Vec<_>>(),
            vec!["τ₁", "τ₂"]
        );

        // at the first occurrence, in the first premise
        let first = content
            .find("τ₁")
            .unwrap();
        assert_eq!(unbound[0].0, first);
    }

    #[test]
    fn context_references_need_form_only() {
        let content = r#"
Variable(var) ::= /[a-z]+/[x]

x ∈ Δ
------ (var)
Γ(x)
        "#;

        assert_eq!(errors(content), vec![]);

        let content = r#"
Variable(var) ::= /[a-z]+/[x]

x ∈ ctx
------ (var)
Γ(x)
        "#;

        let result = errors(content);
        assert_eq!(result.len(), 1);
        assert!(matches!(
            result[0],
            CheckingError::InvalidVariableFormat(_, "ctx", Some("var"))
        ));
    }

    #[test]
    fn predicates_and_relations() {
        let content = r#"
Cast(cast) ::= Term[e] 'as' Type[τ] Type[σ]

Γ ⊢ e : τ, τ <: σ, fresh(e)
------------ (cast)
σ
        "#;

        assert_eq!(errors(content), vec![]);
    }

    #[test]
    fn messages() {
        assert_eq!(
            CheckingError::UnboundVariable(0, "σ", "lambda").message(),
            "variable 'σ' is not bound in typing rule 'lambda'"
        );
        assert_eq!(
            CheckingError::UnmatchedRuleName(0, "foo").message(),
            "typing rule 'foo' is not named by any production"
        );
        assert_eq!(
            CheckingError::InvalidVariableFormat(0, "x1", None).kind(),
            Kind::InvalidVariableFormat
        );
    }
}
