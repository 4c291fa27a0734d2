use turnstile::problem::{Diagnostic, Kind};

fn diagnostics(content: &str) -> Vec<Diagnostic> {
    match turnstile::parse_and_validate(content) {
        Ok(_) => Vec::new(),
        Err(diagnostics) => diagnostics,
    }
}

fn kinds(content: &str) -> Vec<Kind> {
    diagnostics(content)
        .into_iter()
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

#[test]
fn context_introduced_type_is_unbound() {
    let content = "\
Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e]

Γ,x:τ ⊢ e : σ
------------- (lambda)
τ -> σ
";
    let result = diagnostics(content);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].kind, Kind::UnboundVariable);
    assert_eq!(
        result[0].message,
        "variable 'σ' is not bound in typing rule 'lambda'"
    );
    assert_eq!(result[0].line, 3);
    assert_eq!(result[0].column, 13);
    assert_eq!(result[0].rule, Some("lambda".to_string()));
}

#[test]
fn binding_the_result_type_fixes_it() {
    let content = "\
Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e] ':' Type[σ]

Γ,x:τ ⊢ e : σ
------------- (lambda)
τ -> σ
";
    assert!(turnstile::parse_and_validate(content).is_ok());
}

#[test]
fn unmatched_rule_name_alone() {
    let content = "\
Variable(var) ::= /[a-z]+/[x]

x ∈ Γ
----- (var)
Γ(x)

x ∈ Γ, y ∈ Γ
------------ (foo)
Γ(y)
";
    let result = diagnostics(content);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].kind, Kind::UnmatchedRuleName);
    assert_eq!(result[0].rule, Some("foo".to_string()));
    assert_eq!(result[0].line, 8);
}

#[test]
fn independent_failures() {
    let content = "\
Variable(var) ::= /[a-z]+/[x]
Pair(pair) ::= Term[e] Term[e]

x ∈ Γ
----- (var)
Γ(x)

Γ ⊢ e : τ ->
---- (broken)
τ
";
    let result = diagnostics(content);

    assert_eq!(
        result
            .iter()
            .map(|diagnostic| diagnostic.kind)
            .collect::<Vec<Kind>>(),
        vec![Kind::DuplicateBinding, Kind::MissingArrowOperand]
    );
    assert_eq!(result[0].line, 2);
    assert_eq!(result[0].rule, Some("pair".to_string()));
    assert_eq!(result[1].line, 8);
    assert_eq!(result[1].rule, Some("broken".to_string()));
}

#[test]
fn syntax_error_suppresses_binding_errors() {
    // y is unbound, but the rule never parses so that is not reported
    let content = "\
Variable(var) ::= /[a-z]+/[x]

y ∈ Γ, Γ ⊢ y : τ ->
----- (var)
Γ(y)
";
    assert_eq!(kinds(content), vec![Kind::MissingArrowOperand]);
}

#[test]
fn sorted_by_position() {
    let content = "\
Variable(var) ::= /[a-z]+/[x]
Lambda(lambda) ::= 'λ' Variable[x] '.' Term[e]

y ∈ Γ
----- (var)
Γ(y)

x₁ ∈ Γ
------ (orphan)
Γ(x₁)
";
    let result = diagnostics(content);

    let positions: Vec<(usize, usize)> = result
        .iter()
        .map(|diagnostic| (diagnostic.line, diagnostic.column))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);

    assert_eq!(
        result
            .iter()
            .map(|diagnostic| diagnostic.kind)
            .collect::<Vec<Kind>>(),
        vec![
            Kind::MissingTypingRule,
            Kind::UnboundVariable,
            Kind::UnmatchedRuleName
        ]
    );
}

#[test]
fn deterministic() {
    let content = "\
Variable(var) ::= /[a-z]+/[x]
Broken(broken) ::= Term[e] Term[e]
Lambda(lambda) ::= 'λ' Variable[x] '.' Term[e]

y ∈ Γ, z ∈ Γ, fresh(w)
---------------------- (var)
Γ(y)

x ∈ Γ
---- (nothing)
Γ(x)

τ ->
---- (broken)
τ
";
    let first = diagnostics(content);
    let second = diagnostics(content);

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn malformed_variables() {
    let content = "\
Variable(var) ::= /[a-z]+/[x1]

x1 ∈ Γ
------ (var)
Γ(x1)
";
    let result = kinds(content);

    assert!(!result.is_empty());
    assert!(result
        .iter()
        .all(|kind| *kind == Kind::InvalidVariableFormat));
}

#[test]
fn document_with_no_declarations() {
    let result = diagnostics("\n\n// just a note\n");

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].kind, Kind::EmptyDocument);
    assert_eq!(result[0].line, 1);
    assert_eq!(result[0].column, 1);
}

#[test]
fn json_shape() {
    let content = "\
x ∈ Γ
----- (foo)
Γ(x)
";
    let json = serde_json::to_value(diagnostics(content)).unwrap();

    assert_eq!(json[0]["kind"], "UnmatchedRuleName");
    assert_eq!(json[0]["line"], 2);
    assert_eq!(json[0]["rule"], "foo");
    assert!(json[0]
        .get("offset")
        .is_none());
}
