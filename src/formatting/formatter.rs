//! Canonical layout of grammar productions and typing rules

use crate::formatting::renderer::render_to_string;
use crate::formatting::{Render, Syntax};
use crate::language::*;

/// Shortest inference bar emitted, even over very short premises.
const MINIMUM_BAR: usize = 4;

pub fn format_document(document: &Document) -> Vec<(Syntax, String)> {
    let mut output = Formatter::new();

    output.append_document(document);

    output.fragments
}

pub fn render_type(ty: &TypeExpr, renderer: &dyn Render) -> String {
    let mut output = Formatter::new();
    output.append_type(ty);
    render_to_string(renderer, output.fragments)
}

pub fn render_premise(premise: &Premise, renderer: &dyn Render) -> String {
    let mut output = Formatter::new();
    output.append_premise(premise);
    render_to_string(renderer, output.fragments)
}

pub fn render_conclusion(conclusion: &Conclusion, renderer: &dyn Render) -> String {
    let mut output = Formatter::new();
    output.append_conclusion(conclusion);
    render_to_string(renderer, output.fragments)
}

pub fn render_production(production: &ProductionRule, renderer: &dyn Render) -> String {
    let mut output = Formatter::new();
    output.append_production(production);
    render_to_string(renderer, output.fragments)
}

pub fn render_typing_rule(rule: &TypingRule, renderer: &dyn Render) -> String {
    let mut output = Formatter::new();
    output.append_typing_rule(rule);
    render_to_string(renderer, output.fragments)
}

struct Formatter {
    fragments: Vec<(Syntax, String)>,
}

impl Formatter {
    fn new() -> Formatter {
        Formatter {
            fragments: Vec::new(),
        }
    }

    fn append(&mut self, syntax: Syntax, content: &str) {
        if content.is_empty() {
            return;
        }
        self.fragments
            .push((syntax, content.to_string()));
    }

    /// Width in characters of everything appended so far.
    fn width(&self) -> usize {
        self.fragments
            .iter()
            .map(|(_, content)| {
                content
                    .chars()
                    .count()
            })
            .sum()
    }

    fn append_document(&mut self, document: &Document) {
        let mut previous: Option<&Declaration> = None;

        for declaration in &document.declarations {
            if let Some(previous) = previous {
                let blank = match (previous, declaration) {
                    (Declaration::Typing(_), _) => true,
                    (Declaration::Comment(_), _) => false,
                    (_, Declaration::Typing(_)) => true,
                    _ => false,
                };
                if blank {
                    self.append(Syntax::Neutral, "\n");
                }
            }

            match declaration {
                Declaration::Production(production) => {
                    self.append_production(production);
                    self.append(Syntax::Neutral, "\n");
                }
                Declaration::Typing(rule) => {
                    self.append_typing_rule(rule);
                    self.append(Syntax::Neutral, "\n");
                }
                Declaration::Comment(text) => {
                    self.append(Syntax::Comment, text.trim_end());
                    self.append(Syntax::Neutral, "\n");
                }
            }

            previous = Some(declaration);
        }
    }

    fn append_production(&mut self, production: &ProductionRule) {
        self.append(Syntax::Declaration, production.name.0);

        if let Some(rule) = &production.rule {
            self.append(Syntax::Punctuation, "(");
            self.append(Syntax::Label, rule.0);
            self.append(Syntax::Punctuation, ")");
        }

        self.append(Syntax::Operator, " ::= ");
        self.append_grammar(&production.rhs);
    }

    fn append_grammar(&mut self, expr: &GrammarExpr) {
        match expr {
            GrammarExpr::Terminal(terminal, binding) => {
                match terminal {
                    Terminal::Literal(text) => self.append(Syntax::Terminal, text),
                    Terminal::Pattern(text) => self.append(Syntax::Pattern, text),
                }
                self.append_binding(binding);
            }
            GrammarExpr::NonTerminal(name, binding) => {
                self.append(Syntax::NonTerminal, name.0);
                self.append_binding(binding);
            }
            GrammarExpr::Sequence(symbols) => {
                for (i, symbol) in symbols
                    .iter()
                    .enumerate()
                {
                    if i > 0 {
                        self.append(Syntax::Neutral, " ");
                    }
                    self.append_grammar(symbol);
                }
            }
            GrammarExpr::Alternatives(alternatives) => {
                for (i, alternative) in alternatives
                    .iter()
                    .enumerate()
                {
                    if i > 0 {
                        self.append(Syntax::Operator, " | ");
                    }
                    self.append_grammar(alternative);
                }
            }
        }
    }

    fn append_binding(&mut self, binding: &Option<Variable>) {
        if let Some(variable) = binding {
            self.append(Syntax::Punctuation, "[");
            self.append(Syntax::Variable, variable.text);
            self.append(Syntax::Punctuation, "]");
        }
    }

    fn append_typing_rule(&mut self, rule: &TypingRule) {
        let mut premises = Formatter::new();
        for (i, premise) in rule
            .premises
            .iter()
            .enumerate()
        {
            if i > 0 {
                premises.append(Syntax::Punctuation, ", ");
            }
            premises.append_premise(premise);
        }

        let mut conclusion = Formatter::new();
        conclusion.append_conclusion(&rule.conclusion);

        let width = premises
            .width()
            .max(conclusion.width())
            .max(MINIMUM_BAR);

        if !rule
            .premises
            .is_empty()
        {
            self.fragments
                .extend(premises.fragments);
            self.append(Syntax::Neutral, "\n");
        }

        self.append(Syntax::Bar, &"-".repeat(width));
        self.append(Syntax::Neutral, " ");
        self.append(Syntax::Punctuation, "(");
        self.append(Syntax::Label, rule.name.0);
        self.append(Syntax::Punctuation, ")");
        self.append(Syntax::Neutral, "\n");

        self.fragments
            .extend(conclusion.fragments);
    }

    fn append_premise(&mut self, premise: &Premise) {
        match premise {
            Premise::Judgment(judgment) => self.append_judgment(judgment),
            Premise::Membership { variable, context } => {
                self.append(Syntax::Variable, variable.text);
                self.append(Syntax::Operator, " ∈ ");
                self.append(Syntax::Context, context.text);
            }
            Premise::Relation {
                left,
                relation,
                right,
            } => {
                self.append_type(left);
                self.append(Syntax::Neutral, " ");
                self.append(Syntax::Operator, relation.symbol());
                self.append(Syntax::Neutral, " ");
                self.append_type(right);
            }
            Premise::Predicate { name, arguments } => {
                self.append(Syntax::Predicate, name.0);
                self.append(Syntax::Punctuation, "(");
                for (i, argument) in arguments
                    .iter()
                    .enumerate()
                {
                    if i > 0 {
                        self.append(Syntax::Punctuation, ", ");
                    }
                    self.append(Syntax::Variable, argument.text);
                }
                self.append(Syntax::Punctuation, ")");
            }
        }
    }

    fn append_conclusion(&mut self, conclusion: &Conclusion) {
        match conclusion {
            Conclusion::Type(ty) => self.append_type(ty),
            Conclusion::Judgment(judgment) => self.append_judgment(judgment),
            Conclusion::ContextLookup(variable) => {
                self.append(Syntax::Context, BASE_CONTEXT);
                self.append(Syntax::Punctuation, "(");
                self.append(Syntax::Variable, variable.text);
                self.append(Syntax::Punctuation, ")");
            }
        }
    }

    fn append_judgment(&mut self, judgment: &Judgment) {
        self.append_context(&judgment.context);
        self.append(Syntax::Operator, " ⊢ ");
        self.append(
            Syntax::Variable,
            judgment
                .expression
                .text,
        );
        self.append(Syntax::Punctuation, " : ");
        self.append_type(&judgment.ty);
    }

    fn append_context(&mut self, context: &Context) {
        self.append(Syntax::Context, BASE_CONTEXT);
        for extension in &context.extensions {
            self.append(Syntax::Punctuation, ",");
            self.append(
                Syntax::Variable,
                extension
                    .variable
                    .text,
            );
            self.append(Syntax::Punctuation, ":");
            self.append_type(&extension.ty);
        }
    }

    fn append_type(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Variable(variable) => self.append(Syntax::Variable, variable.text),
            TypeExpr::Constructor(name, arguments) => {
                self.append(Syntax::Constructor, name.0);
                if !arguments.is_empty() {
                    self.append(Syntax::Punctuation, "<");
                    for (i, argument) in arguments
                        .iter()
                        .enumerate()
                    {
                        if i > 0 {
                            self.append(Syntax::Punctuation, ", ");
                        }
                        self.append_type(argument);
                    }
                    self.append(Syntax::Punctuation, ">");
                }
            }
            TypeExpr::Arrow(left, right) => {
                // arrows associate to the right, so a bare arrow on the
                // left needs parenthesizing to survive a reparse
                if let TypeExpr::Arrow(_, _) = left.as_ref() {
                    self.append(Syntax::Punctuation, "(");
                    self.append_type(left);
                    self.append(Syntax::Punctuation, ")");
                } else {
                    self.append_type(left);
                }
                self.append(Syntax::Operator, " -> ");
                self.append_type(right);
            }
            TypeExpr::Paren(inner) => {
                self.append(Syntax::Punctuation, "(");
                self.append_type(inner);
                self.append(Syntax::Punctuation, ")");
            }
        }
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::formatting::Identity;
    use crate::parsing::{parse_premise, parse_production, parse_type, parse_typing_rule};

    fn ty(input: &str) -> String {
        let ty = parse_type(input).unwrap();
        render_type(&ty, &Identity)
    }

    fn premise(input: &str) -> String {
        let premise = parse_premise(input).unwrap();
        render_premise(&premise, &Identity)
    }

    #[test]
    fn types() {
        assert_eq!(ty("τ"), "τ");
        assert_eq!(ty("τ→σ"), "τ -> σ");
        assert_eq!(ty("τ -> σ -> ρ"), "τ -> σ -> ρ");
        assert_eq!(ty("(τ -> σ) -> ρ"), "(τ -> σ) -> ρ");
        assert_eq!(ty("List<τ>"), "List<τ>");
        assert_eq!(ty("Map<K,V>"), "Map<K, V>");
        assert_eq!(ty("Int"), "Int");
    }

    #[test]
    fn arrow_on_left_is_parenthesized() {
        let ty = TypeExpr::Arrow(
            Box::new(TypeExpr::Arrow(
                Box::new(TypeExpr::Variable(Variable::new("τ", 0))),
                Box::new(TypeExpr::Variable(Variable::new("σ", 0))),
            )),
            Box::new(TypeExpr::Variable(Variable::new("ρ", 0))),
        );
        assert_eq!(render_type(&ty, &Identity), "(τ -> σ) -> ρ");
    }

    #[test]
    fn premises() {
        assert_eq!(premise("Γ,x:τ ⊢ e : σ"), "Γ,x:τ ⊢ e : σ");
        assert_eq!(premise("Γ ⊢ f:τ→σ"), "Γ ⊢ f : τ -> σ");
        assert_eq!(premise("x∈Γ"), "x ∈ Γ");
        assert_eq!(premise("τ <: σ"), "τ <: σ");
        assert_eq!(premise("List<τ> = σ"), "List<τ> = σ");
        assert_eq!(premise("fresh(x,y)"), "fresh(x, y)");
    }

    #[test]
    fn productions() {
        let production = parse_production("Lambda(lambda) ::= 'λ' Variable[x]  ':' Type[τ] '.' Term[e]").unwrap();
        assert_eq!(
            render_production(&production, &Identity),
            "Lambda(lambda) ::= 'λ' Variable[x] ':' Type[τ] '.' Term[e]"
        );

        let production = parse_production("Term ::= Variable|Lambda | /[0-9]+/").unwrap();
        assert_eq!(
            render_production(&production, &Identity),
            "Term ::= Variable | Lambda | /[0-9]+/"
        );
    }

    #[test]
    fn typing_rules() {
        let rule = parse_typing_rule("x ∈ Γ\n---------------- (var)\nΓ(x)").unwrap();
        assert_eq!(render_typing_rule(&rule, &Identity), "x ∈ Γ\n----- (var)\nΓ(x)");

        let rule = parse_typing_rule("Γ,x:τ ⊢ e : σ\n--- (lambda)\nτ -> σ").unwrap();
        assert_eq!(
            render_typing_rule(&rule, &Identity),
            "Γ,x:τ ⊢ e : σ\n------------- (lambda)\nτ -> σ"
        );
    }

    #[test]
    fn axiom_has_no_premise_line() {
        let rule = parse_typing_rule("----- (unit)\nUnit").unwrap();
        assert_eq!(render_typing_rule(&rule, &Identity), "---- (unit)\nUnit");
    }

    #[test]
    fn document_layout() {
        let document = Document {
            declarations: vec![
                Declaration::Comment("// terms"),
                Declaration::Production(parse_production("Variable(var) ::= /[a-z]+/[x]").unwrap()),
                Declaration::Production(parse_production("Unit(unit) ::= 'unit'").unwrap()),
                Declaration::Typing(parse_typing_rule("x ∈ Γ\n--- (var)\nΓ(x)").unwrap()),
                Declaration::Typing(parse_typing_rule("--- (unit)\nUnit").unwrap()),
            ],
        };

        let fragments = format_document(&document);
        let output = render_to_string(&Identity, fragments);

        assert_eq!(
            output,
            "// terms\nVariable(var) ::= /[a-z]+/[x]\nUnit(unit) ::= 'unit'\n\nx ∈ Γ\n----- (var)\nΓ(x)\n\n---- (unit)\nUnit\n"
        );
    }

    #[test]
    fn terminal_renderer_adds_escapes() {
        let ty = parse_type("τ -> σ").unwrap();
        let output = render_type(&ty, &crate::formatting::Terminal);
        assert!(output.contains("\x1b["));
        assert_ne!(output, "τ -> σ");
    }
}
