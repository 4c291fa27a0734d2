use super::*;

/// Helper function to check if parsing a document produces the expected error
fn expect_error(content: &str, expected: ParsingError) {
    let (_, failures) = parse_with_recovery(content);

    if failures.is_empty() {
        panic!(
            "Expected parsing to fail, but it succeeded for input: {}",
            content
        );
    }

    let found = failures
        .iter()
        .any(|failure| failure.error == expected);

    if !found {
        panic!(
            "Expected error {:?} but got: {:?} for input '{}'",
            expected, failures, content
        );
    }
}

#[test]
fn unrecognized_character() {
    assert_eq!(
        parse_premise("x @ y"),
        Err(ParsingError::UnrecognizedCharacter(2, '@'))
    );

    expect_error(
        r#"
Term ::= Variable % Application
        "#
        .trim_ascii(),
        ParsingError::UnrecognizedCharacter(18, '%'),
    );
}

#[test]
fn missing_arrow_operand() {
    assert_eq!(
        parse_type("τ ->"),
        Err(ParsingError::MissingArrowOperand(3))
    );
    assert_eq!(
        parse_type("τ -> )"),
        Err(ParsingError::MissingArrowOperand(3))
    );
}

#[test]
fn unbalanced_generic() {
    assert_eq!(
        parse_type("List<τ"),
        Err(ParsingError::UnbalancedGeneric(4))
    );
    assert_eq!(parse_type("τ>"), Err(ParsingError::UnbalancedGeneric(2)));
    assert_eq!(
        parse_type("List<τ σ>"),
        Err(ParsingError::UnbalancedGeneric(4))
    );
}

#[test]
fn empty_generic_arguments() {
    assert_eq!(
        parse_type("List<>"),
        Err(ParsingError::EmptyGenericArgs(4))
    );
}

#[test]
fn lowercase_constructor() {
    assert_eq!(
        parse_type("list<τ>"),
        Err(ParsingError::InvalidConstructorCase(0, "list"))
    );
}

#[test]
fn trailing_type_tokens() {
    assert_eq!(
        parse_type("τ σ"),
        Err(ParsingError::Expected(
            3,
            "the end of the type expression"
        ))
    );
    assert_eq!(
        parse_type("(τ -> σ"),
        Err(ParsingError::Expected(9, "a closing ')'"))
    );
}

#[test]
fn context_without_base() {
    assert_eq!(parse_context("x:τ"), Err(ParsingError::MissingBase(0)));
    assert_eq!(parse_context(""), Err(ParsingError::MissingBase(0)));
}

#[test]
fn malformed_extensions() {
    assert_eq!(
        parse_context("Γ,x"),
        Err(ParsingError::MalformedExtension(3, "x"))
    );
    assert_eq!(
        parse_context("Γ,x:"),
        Err(ParsingError::MalformedExtension(3, "x:"))
    );
    assert_eq!(
        parse_context("Γ,:τ"),
        Err(ParsingError::MalformedExtension(3, ":τ"))
    );
    assert_eq!(
        parse_context("Γ,"),
        Err(ParsingError::MalformedExtension(3, ""))
    );
    assert_eq!(
        parse_context("Γ x:τ"),
        Err(ParsingError::MalformedExtension(3, "x:τ"))
    );
}

#[test]
fn multiple_judgment_symbols() {
    assert_eq!(
        parse_premise("Γ ⊢ e : τ : σ"),
        Err(ParsingError::MultipleJudgmentSymbols(0, "Γ ⊢ e : τ : σ"))
    );
    assert_eq!(
        parse_premise("Γ ⊢ Γ ⊢ e : τ"),
        Err(ParsingError::MultipleJudgmentSymbols(0, "Γ ⊢ Γ ⊢ e : τ"))
    );
    assert_eq!(
        parse_premise("Γ ⊢ e"),
        Err(ParsingError::MultipleJudgmentSymbols(0, "Γ ⊢ e"))
    );
}

#[test]
fn judgment_with_relation() {
    assert_eq!(
        parse_premise("Γ ⊢ e : τ = σ"),
        Err(ParsingError::AmbiguousWithJudgment(0, "Γ ⊢ e : τ = σ"))
    );
    assert_eq!(
        parse_premise("x ∈ Γ ⊢ e : τ"),
        Err(ParsingError::AmbiguousWithJudgment(0, "x ∈ Γ ⊢ e : τ"))
    );
}

#[test]
fn judgment_expression_must_be_one_variable() {
    assert_eq!(
        parse_premise("Γ ⊢ f a : τ"),
        Err(ParsingError::Expected(
            6,
            "a single variable between '⊢' and ':'"
        ))
    );
}

#[test]
fn membership_arity() {
    assert_eq!(
        parse_premise("x y ∈ Γ"),
        Err(ParsingError::InvalidMembershipArity(0, "x y ∈ Γ"))
    );
    assert_eq!(
        parse_premise("∈ Γ"),
        Err(ParsingError::InvalidMembershipArity(0, "∈ Γ"))
    );
}

#[test]
fn multiple_relation_symbols() {
    assert_eq!(
        parse_premise("τ = σ = ρ"),
        Err(ParsingError::MultipleRelationSymbols(0, "τ = σ = ρ"))
    );
    assert_eq!(
        parse_premise("x ∈ Γ = Δ"),
        Err(ParsingError::MultipleRelationSymbols(0, "x ∈ Γ = Δ"))
    );
}

#[test]
fn predicate_name() {
    assert_eq!(
        parse_premise("is_value(x)"),
        Err(ParsingError::InvalidPredicateName(0, "is_value"))
    );
    assert_eq!(
        parse_premise("value2(x)"),
        Err(ParsingError::InvalidPredicateName(0, "value2"))
    );
}

#[test]
fn predicate_argument() {
    assert_eq!(
        parse_premise("fresh(x, List<τ>)"),
        Err(ParsingError::InvalidPredicateArgument(9, "List<τ>"))
    );
    assert_eq!(
        parse_premise("fresh(x,)"),
        Err(ParsingError::InvalidPredicateArgument(8, ""))
    );
}

#[test]
fn unrecognized_premise() {
    assert_eq!(
        parse_premise("x y"),
        Err(ParsingError::UnrecognizedPremiseForm(0, "x y"))
    );
    assert_eq!(
        parse_premise("'λ'"),
        Err(ParsingError::UnrecognizedPremiseForm(0, "'λ'"))
    );
}

#[test]
fn empty_premise_between_commas() {
    expect_error(
        r#"
x ∈ Γ,, y ∈ Γ
------ (pair)
Γ(x)
        "#
        .trim_ascii(),
        ParsingError::Expected(9, "a premise between commas"),
    );
}

#[test]
fn duplicate_binding() {
    assert_eq!(
        parse_production("Pair ::= Term[x] ',' Term[x]"),
        Err(ParsingError::DuplicateBinding(26, "x"))
    );
}

#[test]
fn malformed_production_headers() {
    assert_eq!(
        parse_production("Lambda(lambda ::= Term"),
        Err(ParsingError::Expected(
            14,
            "')' after the typing rule name"
        ))
    );
    assert_eq!(
        parse_production("::= Term"),
        Err(ParsingError::Expected(0, "a production name"))
    );
    assert_eq!(
        parse_production("Term ::="),
        Err(ParsingError::Expected(8, "a grammar symbol"))
    );
    assert_eq!(
        parse_production("Term ::= Left | | Right"),
        Err(ParsingError::Expected(16, "a grammar symbol"))
    );
    assert_eq!(
        parse_production("Term ::= Variable[]"),
        Err(ParsingError::Expected(
            18,
            "a variable between '[' and ']'"
        ))
    );
}

#[test]
fn missing_bar() {
    assert_eq!(
        parse_typing_rule("x ∈ Γ\nΓ(x)"),
        Err(ParsingError::MissingBar(0))
    );

    expect_error(
        r#"
Variable(var) ::= /[a-z]+/[x]

x ∈ Γ
Γ(x)
        "#
        .trim_ascii(),
        ParsingError::MissingBar(31),
    );
}

#[test]
fn missing_rule_name() {
    assert_eq!(
        parse_typing_rule("x ∈ Γ\n-----\nΓ(x)"),
        Err(ParsingError::MissingRuleName(14))
    );
    assert_eq!(
        parse_typing_rule("x ∈ Γ\n----- var\nΓ(x)"),
        Err(ParsingError::MissingRuleName(14))
    );
}

#[test]
fn empty_conclusion() {
    assert_eq!(
        parse_typing_rule("x ∈ Γ\n----- (var)"),
        Err(ParsingError::EmptyConclusion(20))
    );
    assert_eq!(
        parse_typing_rule("x ∈ Γ\n----- (var)\n\n"),
        Err(ParsingError::EmptyConclusion(20))
    );
}

#[test]
fn empty_documents() {
    expect_error("", ParsingError::EmptyDocument(0));
    expect_error("\n\n   \n", ParsingError::EmptyDocument(0));
    expect_error("// nothing but a comment\n", ParsingError::EmptyDocument(0));
}

#[test]
fn failures_are_independent() {
    let content = r#"
Lambda(lambda) ::= 'λ' Variable[x] '.' Term[x]
Variable(var) ::= /[a-z]+/[x]

x ∈ Γ
------ (var)
Γ(x)

Γ ⊢ e : τ = σ
------ (lambda)
τ
    "#;

    let (document, failures) = parse_with_recovery(content);

    assert_eq!(failures.len(), 2);
    assert!(matches!(
        failures[0].error,
        ParsingError::DuplicateBinding(_, "x")
    ));
    assert_eq!(failures[0].rule, Some("lambda"));
    assert!(matches!(
        failures[1].error,
        ParsingError::AmbiguousWithJudgment(_, _)
    ));
    assert_eq!(failures[1].rule, Some("lambda"));

    // the rules that did parse are still there
    assert_eq!(
        document
            .productions()
            .count(),
        1
    );
    assert_eq!(
        document
            .typing_rules()
            .count(),
        1
    );
}

#[test]
fn error_kinds_and_messages() {
    let error = ParsingError::MalformedExtension(3, "x");
    assert_eq!(error.offset(), 3);
    assert_eq!(error.kind(), Kind::MalformedExtension);
    assert_eq!(
        error.message(),
        "malformed context extension 'x', expected 'var:type'"
    );

    let error = ParsingError::UnrecognizedCharacter(7, '@');
    assert_eq!(error.kind(), Kind::UnrecognizedCharacter);
    assert_eq!(error.message(), "unrecognized character '@'");
}
