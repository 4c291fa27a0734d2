use super::*;

fn v(text: &str) -> Variable<'_> {
    Variable::new(text, 0)
}

fn var(text: &str) -> TypeExpr<'_> {
    TypeExpr::Variable(v(text))
}

fn con<'i>(name: &'i str, arguments: Vec<TypeExpr<'i>>) -> TypeExpr<'i> {
    TypeExpr::Constructor(Identifier(name), arguments)
}

fn arrow<'i>(left: TypeExpr<'i>, right: TypeExpr<'i>) -> TypeExpr<'i> {
    TypeExpr::Arrow(Box::new(left), Box::new(right))
}

#[test]
fn arrows_associate_right() {
    assert_eq!(
        parse_type("τ -> σ -> ρ"),
        Ok(arrow(var("τ"), arrow(var("σ"), var("ρ"))))
    );

    // the unicode arrow is the same operator
    assert_eq!(
        parse_type("τ → σ → ρ"),
        Ok(arrow(var("τ"), arrow(var("σ"), var("ρ"))))
    );
}

#[test]
fn parentheses_are_kept() {
    assert_eq!(
        parse_type("(τ -> σ) -> ρ"),
        Ok(arrow(
            TypeExpr::Paren(Box::new(arrow(var("τ"), var("σ")))),
            var("ρ")
        ))
    );
}

#[test]
fn constructors_and_generics() {
    assert_eq!(parse_type("Int"), Ok(con("Int", vec![])));
    assert_eq!(parse_type("List<τ>"), Ok(con("List", vec![var("τ")])));
    assert_eq!(
        parse_type("Map<K, List<τ₁>>"),
        Ok(con(
            "Map",
            vec![con("K", vec![]), con("List", vec![var("τ₁")])]
        ))
    );
    assert_eq!(
        parse_type("List<τ> -> Int"),
        Ok(arrow(con("List", vec![var("τ")]), con("Int", vec![])))
    );
}

#[test]
fn lowercase_names_are_variables() {
    // whether this is a well formed variable is decided later
    assert_eq!(parse_type("int"), Ok(var("int")));
    assert_eq!(parse_type("α₁₂₃"), Ok(var("α₁₂₃")));
}

#[test]
fn contexts() {
    assert_eq!(parse_context("Γ"), Ok(Context::default()));

    let context = parse_context("Γ,x:τ₁,y:List<τ₂>").unwrap();
    assert_eq!(
        context.extensions,
        vec![
            Extension {
                variable: v("x"),
                ty: var("τ₁"),
            },
            Extension {
                variable: v("y"),
                ty: con("List", vec![var("τ₂")]),
            },
        ]
    );

    // commas within generic arguments don't separate extensions
    let context = parse_context("Γ, f:Map<K, V> -> τ").unwrap();
    assert_eq!(context.extensions.len(), 1);
    assert_eq!(
        context.extensions[0].ty,
        arrow(con("Map", vec![con("K", vec![]), con("V", vec![])]), var("τ"))
    );
}

#[test]
fn extension_offsets() {
    let context = parse_context("Γ,x:τ").unwrap();
    assert_eq!(
        context.extensions[0]
            .variable
            .offset,
        3
    );
}

#[test]
fn judgment_premise() {
    assert_eq!(
        parse_premise("Γ,x:τ₁ ⊢ e : τ₂"),
        Ok(Premise::Judgment(Judgment {
            context: Context {
                extensions: vec![Extension {
                    variable: v("x"),
                    ty: var("τ₁"),
                }],
            },
            expression: v("e"),
            ty: var("τ₂"),
        }))
    );

    assert_eq!(
        parse_premise("Γ ⊢ f : τ₁ → τ₂"),
        Ok(Premise::Judgment(Judgment {
            context: Context::default(),
            expression: v("f"),
            ty: arrow(var("τ₁"), var("τ₂")),
        }))
    );
}

#[test]
fn membership_premise() {
    assert_eq!(
        parse_premise("x ∈ Γ"),
        Ok(Premise::Membership {
            variable: v("x"),
            context: v("Γ"),
        })
    );
    assert_eq!(
        parse_premise("x ∈ Δ"),
        Ok(Premise::Membership {
            variable: v("x"),
            context: v("Δ"),
        })
    );
}

#[test]
fn relation_premise() {
    assert_eq!(
        parse_premise("τ = σ"),
        Ok(Premise::Relation {
            left: var("τ"),
            relation: Relation::Equal,
            right: var("σ"),
        })
    );
    assert_eq!(
        parse_premise("τ < σ"),
        Ok(Premise::Relation {
            left: var("τ"),
            relation: Relation::Less,
            right: var("σ"),
        })
    );
    assert_eq!(
        parse_premise("List<τ> <: σ"),
        Ok(Premise::Relation {
            left: con("List", vec![var("τ")]),
            relation: Relation::Subtype,
            right: var("σ"),
        })
    );

    // a single ∈ with a type on the right is a relation, not membership
    assert_eq!(
        parse_premise("τ ∈ List<σ>"),
        Ok(Premise::Relation {
            left: var("τ"),
            relation: Relation::Member,
            right: con("List", vec![var("σ")]),
        })
    );
}

#[test]
fn predicate_premise() {
    assert_eq!(
        parse_premise("fresh(x)"),
        Ok(Premise::Predicate {
            name: Identifier("fresh"),
            arguments: vec![v("x")],
        })
    );
    assert_eq!(
        parse_premise("distinct(x, y, z)"),
        Ok(Premise::Predicate {
            name: Identifier("distinct"),
            arguments: vec![v("x"), v("y"), v("z")],
        })
    );
    assert_eq!(
        parse_premise("closed()"),
        Ok(Premise::Predicate {
            name: Identifier("closed"),
            arguments: vec![],
        })
    );
}

#[test]
fn turnstile_always_means_judgment() {
    let fragments = [
        "Γ ⊢ e : τ",
        "Γ,x:τ ⊢ e : σ",
        "Γ ⊢ e : τ = σ",
        "x ∈ Γ ⊢ e : τ",
        "Γ ⊢ e",
        "Γ ⊢ e : τ : σ",
        "fresh(x) ⊢ e : τ",
        "Γ ⊢ Γ ⊢ e : τ",
        "τ < σ ⊢ e : ρ",
    ];

    for fragment in fragments {
        match parse_premise(fragment) {
            Ok(Premise::Judgment(_)) => {}
            Err(_) => {}
            Ok(other) => panic!("'{}' classified as {:?}", fragment, other),
        }
    }
}

#[test]
fn premises_line() {
    let content = "Γ,x:τ₁ ⊢ e : τ₂, x ∈ Γ, fresh(x)";
    let tokens = tokenize(content, 0).unwrap();
    let mut input = Parser::new(content, &tokens, content.len());

    let premises = input
        .read_premises()
        .unwrap();
    assert_eq!(premises.len(), 3);
    assert!(matches!(premises[0], Premise::Judgment(_)));
    assert!(matches!(premises[1], Premise::Membership { .. }));
    assert!(matches!(premises[2], Premise::Predicate { .. }));
    assert!(input.is_finished());
}

#[test]
fn premises_line_two_judgments() {
    let content = "Γ ⊢ f : τ₁ → τ₂, Γ ⊢ a : τ₁";
    let tokens = tokenize(content, 0).unwrap();
    let mut input = Parser::new(content, &tokens, content.len());

    let premises = input
        .read_premises()
        .unwrap();
    assert_eq!(premises.len(), 2);
}

#[test]
fn premises_line_leading_relation() {
    // a relation on Γ is not the start of a judgment's context
    let content = "Γ = Δ, x ∈ Γ";
    let tokens = tokenize(content, 0).unwrap();

    assert_eq!(split_premises(&tokens), vec![0..3, 4..7]);

    let content = "Γ,x:τ ⊢ e : σ";
    let tokens = tokenize(content, 0).unwrap();

    assert_eq!(split_premises(&tokens), vec![0..tokens.len()]);
}

#[test]
fn production_with_rule_name() {
    let production =
        parse_production("Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e]").unwrap();

    assert_eq!(production.name, Identifier("Lambda"));
    assert_eq!(production.rule, Some(Identifier("lambda")));
    assert_eq!(production.offset, 0);
    assert_eq!(
        production.rhs,
        GrammarExpr::Sequence(vec![
            GrammarExpr::Terminal(Terminal::Literal("'λ'"), None),
            GrammarExpr::NonTerminal(Identifier("Variable"), Some(v("x"))),
            GrammarExpr::Terminal(Terminal::Literal("':'"), None),
            GrammarExpr::NonTerminal(Identifier("Type"), Some(v("τ"))),
            GrammarExpr::Terminal(Terminal::Literal("'.'"), None),
            GrammarExpr::NonTerminal(Identifier("Term"), Some(v("e"))),
        ])
    );
    assert_eq!(production.bindings(), vec![v("x"), v("τ"), v("e")]);
}

#[test]
fn production_alternatives() {
    let production = parse_production("Term ::= Variable | Application | Lambda").unwrap();

    assert_eq!(production.rule, None);
    assert_eq!(
        production.rhs,
        GrammarExpr::Alternatives(vec![
            GrammarExpr::NonTerminal(Identifier("Variable"), None),
            GrammarExpr::NonTerminal(Identifier("Application"), None),
            GrammarExpr::NonTerminal(Identifier("Lambda"), None),
        ])
    );

    // the same variable may appear in different alternatives
    let production = parse_production("Choice ::= Left[x] | Right[x]").unwrap();
    assert_eq!(production.bindings(), vec![v("x"), v("x")]);
}

#[test]
fn production_terminals() {
    let production = parse_production(r#"Variable(var) ::= /[a-zA-Z][a-zA-Z0-9_]*/[x]"#).unwrap();
    assert_eq!(
        production.rhs,
        GrammarExpr::Terminal(Terminal::Pattern("/[a-zA-Z][a-zA-Z0-9_]*/"), Some(v("x")))
    );

    let production = parse_production(r#"Unit ::= "()""#).unwrap();
    assert_eq!(
        production.rhs,
        GrammarExpr::Terminal(Terminal::Literal(r#""()""#), None)
    );
}

#[test]
fn typing_rule_lookup() {
    let rule = parse_typing_rule("x ∈ Γ\n------------ (var)\nΓ(x)").unwrap();

    assert_eq!(rule.name, Identifier("var"));
    assert_eq!(
        rule.premises,
        vec![Premise::Membership {
            variable: v("x"),
            context: v("Γ"),
        }]
    );
    assert_eq!(rule.conclusion, Conclusion::ContextLookup(v("x")));
}

#[test]
fn typing_rule_judgment_conclusion() {
    let content = "Γ,x:τ ⊢ e : σ\n----------------- (lambda)\nΓ ⊢ λ : τ -> σ";
    let rule = parse_typing_rule(content).unwrap();

    assert_eq!(rule.name, Identifier("lambda"));
    assert_eq!(rule.premises.len(), 1);
    assert_eq!(
        rule.conclusion,
        Conclusion::Judgment(Judgment {
            context: Context::default(),
            expression: v("λ"),
            ty: arrow(var("τ"), var("σ")),
        })
    );
}

#[test]
fn typing_rule_axiom() {
    let rule = parse_typing_rule("-------- (unit)\nUnit").unwrap();

    assert_eq!(rule.name, Identifier("unit"));
    assert!(rule
        .premises
        .is_empty());
    assert_eq!(rule.conclusion, Conclusion::Type(con("Unit", vec![])));
    assert_eq!(rule.offset, 10);
}

#[test]
fn typing_rule_premises_over_several_lines() {
    let content = "Γ ⊢ f : τ₁ → τ₂,\nΓ ⊢ a : τ₁\n----------- (app)\nτ₂";
    let rule = parse_typing_rule(content).unwrap();

    assert_eq!(rule.premises.len(), 2);
    assert_eq!(rule.conclusion, Conclusion::Type(var("τ₂")));
}

#[test]
fn bar_lines() {
    assert!(is_bar("------------ (var)"));
    assert!(is_bar("----"));
    assert!(is_bar("  ---(x)"));
    assert!(!is_bar("-> τ"));
    assert!(!is_bar("τ -> σ"));
    assert!(!is_bar("x ∈ Γ"));
}

#[test]
fn line_classification() {
    assert!(is_blank("   "));
    assert!(is_comment("  // note"));
    assert!(is_production("Term ::= Variable"));
    assert!(!is_production("// Term ::= Variable"));
    assert!(is_continuation("    | Application"));
    assert!(!is_continuation("Application"));
}

#[test]
fn grouping_lines() {
    let content = "// a comment\nTerm ::= Variable\n    | Application\n\nx ∈ Γ\n----- (var)\nΓ(x)\n";
    let lines = split_lines(content);

    assert_eq!(lines.len(), 7);
    assert_eq!(
        group_lines(&lines),
        vec![
            Chunk::Comment(0),
            Chunk::Production(1..3),
            Chunk::Rule {
                premises: vec![4],
                bar: 5,
                conclusion: Some(6),
            },
        ]
    );
}

#[test]
fn grouping_adjacent_rules() {
    let content = "x ∈ Γ\n--- (var)\nΓ(x)\n--- (unit)\nUnit\n";
    let lines = split_lines(content);

    assert_eq!(
        group_lines(&lines),
        vec![
            Chunk::Rule {
                premises: vec![0],
                bar: 1,
                conclusion: Some(2),
            },
            Chunk::Rule {
                premises: vec![],
                bar: 3,
                conclusion: Some(4),
            },
        ]
    );
}

#[test]
fn grouping_without_bar() {
    let content = "x ∈ Γ\nΓ(x)\n";
    let lines = split_lines(content);

    assert_eq!(group_lines(&lines), vec![Chunk::Stray(0..2)]);
}

#[test]
fn grouping_with_comment_above_bar() {
    let content = "x ∈ Γ\n// membership\n----- (var)\nΓ(x)\n";
    let lines = split_lines(content);

    assert_eq!(
        group_lines(&lines),
        vec![
            Chunk::Comment(1),
            Chunk::Rule {
                premises: vec![0],
                bar: 2,
                conclusion: Some(3),
            },
        ]
    );
}

#[test]
fn grouping_with_comment_inside_production() {
    let content = "Term ::= Variable\n// the other one\n     | Lambda\n";
    let lines = split_lines(content);

    assert_eq!(
        group_lines(&lines),
        vec![Chunk::Production(0..3), Chunk::Comment(1)]
    );
}

#[test]
fn grouping_comment_only_run() {
    let content = "x ∈ Γ\n// stray\nΓ(x)\n";
    let lines = split_lines(content);

    assert_eq!(
        group_lines(&lines),
        vec![Chunk::Comment(1), Chunk::Stray(0..3)]
    );
}

#[test]
fn spans_skip_indentation() {
    let content = "  Term ::= Variable  \n";
    let lines = split_lines(content);

    assert_eq!(span_of(&lines, 0..1), 2..19);
}

#[test]
fn generic_detection() {
    let tokens = tokenize("List<τ> < σ", 0).unwrap();

    assert!(is_generic_open(&tokens, 1));
    assert!(!is_generic_open(&tokens, 4));
    assert_eq!(depths(&tokens), vec![0, 0, 1, 0, 0, 0]);
}

#[test]
fn whole_document() {
    let content = r#"
// simply typed lambda calculus
Variable(var) ::= /[a-zA-Z][a-zA-Z0-9_]*/[x]
Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e]

x ∈ Γ
------------ (var)
Γ(x)

Γ,x:τ ⊢ e : σ
----------------- (lambda)
τ -> σ
    "#;

    let (document, failures) = parse_with_recovery(content);

    assert_eq!(failures, vec![]);
    assert_eq!(document.declarations.len(), 5);
    assert_eq!(
        document.declarations[0],
        Declaration::Comment("// simply typed lambda calculus")
    );
    assert_eq!(
        document
            .productions()
            .count(),
        2
    );
    assert_eq!(
        document
            .typing_rules()
            .map(|rule| rule.name)
            .collect::<Vec<_>>(),
        vec![Identifier("var"), Identifier("lambda")]
    );
}

#[test]
fn annotations() {
    assert_eq!(annotation_of("Lambda(lambda) ::= 'λ' Term["), Some("lambda"));
    assert_eq!(annotation_of("Term ::= Variable"), None);
}
