//! Tokenizer for specification text. Trailing `//` comments and whitespace
//! are skipped; everything else must fall into one of the token classes below.

use logos::Logos;

use crate::parsing::parser::ParsingError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token<'i> {
    #[token("::=")]
    Defines,

    #[token("|")]
    Pipe,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("->")]
    #[token("→")]
    Arrow,

    #[token("⊢")]
    Turnstile,

    #[token("∈")]
    Member,

    #[token("=", |lex| lex.slice())]
    #[token("<:", |lex| lex.slice())]
    #[token("≤", |lex| lex.slice())]
    #[token("⊆", |lex| lex.slice())]
    #[token("⊂", |lex| lex.slice())]
    #[token("⊇", |lex| lex.slice())]
    #[token("⊃", |lex| lex.slice())]
    #[token("≡", |lex| lex.slice())]
    #[token("≠", |lex| lex.slice())]
    Relation(&'i str),

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    // Either a generic argument list or the less-than relation, depending on
    // what it is attached to.
    #[token("<")]
    OpenAngle,

    #[token(">")]
    CloseAngle,

    // The inference bar under a rule's premises.
    #[regex(r"-+")]
    Bar,

    #[regex(r"'[^'\n]*'", |lex| lex.slice())]
    #[regex(r#""[^"\n]*""#, |lex| lex.slice())]
    Literal(&'i str),

    #[regex(r"/([^/\n\\]|\\[^\n])+/", |lex| lex.slice())]
    Pattern(&'i str),

    // Identifiers, constructor names, and semantic variables all lex as
    // words; which one a word is depends on where it appears.
    #[regex(r"[a-zA-Z\p{Greek}][a-zA-Z0-9_\p{Greek}₀-₉]*", |lex| lex.slice())]
    Word(&'i str),
}

/// A token along with where it was found. Offsets are byte positions into the
/// whole document, not into whatever fragment was handed to the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'i> {
    pub token: Token<'i>,
    pub offset: usize,
    pub width: usize,
}

impl<'i> Lexeme<'i> {
    pub fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Break a fragment of the document into tokens. `base` is the offset of
/// the fragment within the document.
pub fn tokenize<'i>(content: &'i str, base: usize) -> Result<Vec<Lexeme<'i>>, ParsingError<'i>> {
    let mut lexer = Token::lexer(content);
    let mut result = Vec::new();

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let offset = base + span.start;

        match token {
            Ok(token) => result.push(Lexeme {
                token,
                offset,
                width: span.len(),
            }),
            Err(()) => {
                let c = lexer
                    .slice()
                    .chars()
                    .next()
                    .unwrap_or(' ');
                return Err(ParsingError::UnrecognizedCharacter(offset, c));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod check {
    use super::*;

    fn tokens(content: &str) -> Vec<Token<'_>> {
        tokenize(content, 0)
            .unwrap()
            .into_iter()
            .map(|lexeme| lexeme.token)
            .collect()
    }

    #[test]
    fn production_tokens() {
        assert_eq!(
            tokens("Lambda(lambda) ::= 'λ' Variable[x] '.' Term[e]"),
            vec![
                Token::Word("Lambda"),
                Token::OpenParen,
                Token::Word("lambda"),
                Token::CloseParen,
                Token::Defines,
                Token::Literal("'λ'"),
                Token::Word("Variable"),
                Token::OpenBracket,
                Token::Word("x"),
                Token::CloseBracket,
                Token::Literal("'.'"),
                Token::Word("Term"),
                Token::OpenBracket,
                Token::Word("e"),
                Token::CloseBracket,
            ]
        );
    }

    #[test]
    fn regex_terminal_with_binding() {
        assert_eq!(
            tokens("/[a-zA-Z][a-zA-Z0-9_]*/[x]"),
            vec![
                Token::Pattern("/[a-zA-Z][a-zA-Z0-9_]*/"),
                Token::OpenBracket,
                Token::Word("x"),
                Token::CloseBracket,
            ]
        );
    }

    #[test]
    fn judgment_tokens() {
        assert_eq!(
            tokens("Γ,x:τ₁ ⊢ e : τ₁ → τ₂"),
            vec![
                Token::Word("Γ"),
                Token::Comma,
                Token::Word("x"),
                Token::Colon,
                Token::Word("τ₁"),
                Token::Turnstile,
                Token::Word("e"),
                Token::Colon,
                Token::Word("τ₁"),
                Token::Arrow,
                Token::Word("τ₂"),
            ]
        );
    }

    #[test]
    fn greek_letter_variants() {
        assert_eq!(
            tokens("ϕ ∈ Γ, ϵ : ϑ₁"),
            vec![
                Token::Word("ϕ"),
                Token::Member,
                Token::Word("Γ"),
                Token::Comma,
                Token::Word("ϵ"),
                Token::Colon,
                Token::Word("ϑ₁"),
            ]
        );
    }

    #[test]
    fn relation_glyphs() {
        assert_eq!(
            tokens("τ₁ <: τ₂"),
            vec![
                Token::Word("τ₁"),
                Token::Relation("<:"),
                Token::Word("τ₂")
            ]
        );
        assert_eq!(
            tokens("τ = σ"),
            vec![Token::Word("τ"), Token::Relation("="), Token::Word("σ")]
        );
        assert_eq!(
            tokens("List<τ> < σ"),
            vec![
                Token::Word("List"),
                Token::OpenAngle,
                Token::Word("τ"),
                Token::CloseAngle,
                Token::OpenAngle,
                Token::Word("σ")
            ]
        );
    }

    #[test]
    fn bars_and_arrows() {
        assert_eq!(
            tokens("------------ (var)"),
            vec![
                Token::Bar,
                Token::OpenParen,
                Token::Word("var"),
                Token::CloseParen
            ]
        );
        assert_eq!(
            tokens("τ -> σ"),
            vec![Token::Word("τ"), Token::Arrow, Token::Word("σ")]
        );
        assert_eq!(tokens("-"), vec![Token::Bar]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("Number ::= /[0-9]+/ // digits only"),
            vec![
                Token::Word("Number"),
                Token::Defines,
                Token::Pattern("/[0-9]+/")
            ]
        );
        assert_eq!(tokens("// nothing here"), vec![]);
    }

    #[test]
    fn words_keep_their_spelling() {
        // variable form is checked later, not here
        assert_eq!(tokens("x1"), vec![Token::Word("x1")]);
        assert_eq!(tokens("τ_1"), vec![Token::Word("τ_1")]);
        assert_eq!(tokens("α₁₂₃"), vec![Token::Word("α₁₂₃")]);
    }

    #[test]
    fn offsets_are_absolute() {
        let result = tokenize("x ∈ Γ", 10).unwrap();
        assert_eq!(result[0].offset, 10);
        assert_eq!(result[1].offset, 12);
        assert_eq!(result[1].width, "∈".len());
        assert_eq!(result[2].offset, 12 + "∈".len() + 1);
    }

    #[test]
    fn unrecognized_character() {
        assert_eq!(
            tokenize("x @ y", 0),
            Err(ParsingError::UnrecognizedCharacter(2, '@'))
        );
        assert_eq!(
            tokenize("'unterminated", 5),
            Err(ParsingError::UnrecognizedCharacter(5, '\''))
        );
    }
}
