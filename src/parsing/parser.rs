//! Recursive descent parser for specification documents.
//!
//! A document is first carved into declarations by looking at its lines: a
//! line containing `::=` starts a production (continued by lines beginning
//! with `|`), and a line of dashes is the inference bar of a typing rule with
//! its premises above and its conclusion below. Each declaration is then
//! tokenized and parsed on its own, so that a problem in one rule doesn't
//! prevent the rest of the document from being examined.

use std::ops::Range;
use tracing::debug;

use crate::language::*;
use crate::parsing::lexer::{tokenize, Lexeme, Token};
use crate::problem::Kind;
use crate::regex::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsingError<'i> {
    UnrecognizedCharacter(usize, char),
    Expected(usize, &'static str),
    MissingArrowOperand(usize),
    UnbalancedGeneric(usize),
    EmptyGenericArgs(usize),
    InvalidConstructorCase(usize, &'i str),
    MissingBase(usize),
    MalformedExtension(usize, &'i str),
    MultipleJudgmentSymbols(usize, &'i str),
    InvalidMembershipArity(usize, &'i str),
    MultipleRelationSymbols(usize, &'i str),
    AmbiguousWithJudgment(usize, &'i str),
    InvalidPredicateName(usize, &'i str),
    InvalidPredicateArgument(usize, &'i str),
    UnrecognizedPremiseForm(usize, &'i str),
    DuplicateBinding(usize, &'i str),
    MissingBar(usize),
    MissingRuleName(usize),
    EmptyConclusion(usize),
    EmptyDocument(usize),
}

impl<'i> ParsingError<'i> {
    pub fn offset(&self) -> usize {
        match self {
            ParsingError::UnrecognizedCharacter(offset, _) => *offset,
            ParsingError::Expected(offset, _) => *offset,
            ParsingError::MissingArrowOperand(offset) => *offset,
            ParsingError::UnbalancedGeneric(offset) => *offset,
            ParsingError::EmptyGenericArgs(offset) => *offset,
            ParsingError::InvalidConstructorCase(offset, _) => *offset,
            ParsingError::MissingBase(offset) => *offset,
            ParsingError::MalformedExtension(offset, _) => *offset,
            ParsingError::MultipleJudgmentSymbols(offset, _) => *offset,
            ParsingError::InvalidMembershipArity(offset, _) => *offset,
            ParsingError::MultipleRelationSymbols(offset, _) => *offset,
            ParsingError::AmbiguousWithJudgment(offset, _) => *offset,
            ParsingError::InvalidPredicateName(offset, _) => *offset,
            ParsingError::InvalidPredicateArgument(offset, _) => *offset,
            ParsingError::UnrecognizedPremiseForm(offset, _) => *offset,
            ParsingError::DuplicateBinding(offset, _) => *offset,
            ParsingError::MissingBar(offset) => *offset,
            ParsingError::MissingRuleName(offset) => *offset,
            ParsingError::EmptyConclusion(offset) => *offset,
            ParsingError::EmptyDocument(offset) => *offset,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            ParsingError::UnrecognizedCharacter(_, _) => Kind::UnrecognizedCharacter,
            ParsingError::Expected(_, _) => Kind::Expected,
            ParsingError::MissingArrowOperand(_) => Kind::MissingArrowOperand,
            ParsingError::UnbalancedGeneric(_) => Kind::UnbalancedGeneric,
            ParsingError::EmptyGenericArgs(_) => Kind::EmptyGenericArgs,
            ParsingError::InvalidConstructorCase(_, _) => Kind::InvalidConstructorCase,
            ParsingError::MissingBase(_) => Kind::MissingBase,
            ParsingError::MalformedExtension(_, _) => Kind::MalformedExtension,
            ParsingError::MultipleJudgmentSymbols(_, _) => Kind::MultipleJudgmentSymbols,
            ParsingError::InvalidMembershipArity(_, _) => Kind::InvalidMembershipArity,
            ParsingError::MultipleRelationSymbols(_, _) => Kind::MultipleRelationSymbols,
            ParsingError::AmbiguousWithJudgment(_, _) => Kind::AmbiguousWithJudgment,
            ParsingError::InvalidPredicateName(_, _) => Kind::InvalidPredicateName,
            ParsingError::InvalidPredicateArgument(_, _) => Kind::InvalidPredicateArgument,
            ParsingError::UnrecognizedPremiseForm(_, _) => Kind::UnrecognizedPremiseForm,
            ParsingError::DuplicateBinding(_, _) => Kind::DuplicateBinding,
            ParsingError::MissingBar(_) => Kind::MissingBar,
            ParsingError::MissingRuleName(_) => Kind::MissingRuleName,
            ParsingError::EmptyConclusion(_) => Kind::EmptyConclusion,
            ParsingError::EmptyDocument(_) => Kind::EmptyDocument,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParsingError::UnrecognizedCharacter(_, c) => {
                format!("unrecognized character '{}'", c)
            }
            ParsingError::Expected(_, value) => format!("expected {}", value),
            ParsingError::MissingArrowOperand(_) => "missing type after '->'".to_string(),
            ParsingError::UnbalancedGeneric(_) => {
                "unbalanced '<' and '>' around generic arguments".to_string()
            }
            ParsingError::EmptyGenericArgs(_) => "empty generic argument list".to_string(),
            ParsingError::InvalidConstructorCase(_, name) => format!(
                "type constructor '{}' must start with an uppercase letter",
                name
            ),
            ParsingError::MissingBase(_) => "context must begin with 'Γ'".to_string(),
            ParsingError::MalformedExtension(_, fragment) => {
                if fragment.is_empty() {
                    "empty context extension after ','".to_string()
                } else {
                    format!(
                        "malformed context extension '{}', expected 'var:type'",
                        fragment
                    )
                }
            }
            ParsingError::MultipleJudgmentSymbols(_, fragment) => format!(
                "typing judgment '{}' must have exactly one '⊢' followed by exactly one ':'",
                fragment
            ),
            ParsingError::InvalidMembershipArity(_, fragment) => format!(
                "membership '{}' must have exactly one variable before '∈'",
                fragment
            ),
            ParsingError::MultipleRelationSymbols(_, fragment) => format!(
                "type relation '{}' has more than one relation symbol",
                fragment
            ),
            ParsingError::AmbiguousWithJudgment(_, fragment) => format!(
                "premise '{}' mixes '⊢' with a relation symbol",
                fragment
            ),
            ParsingError::InvalidPredicateName(_, name) => {
                format!("predicate name '{}' must be purely alphabetic", name)
            }
            ParsingError::InvalidPredicateArgument(_, argument) => {
                format!("predicate argument '{}' is not a variable", argument)
            }
            ParsingError::UnrecognizedPremiseForm(_, fragment) => {
                format!("unrecognized premise '{}'", fragment)
            }
            ParsingError::DuplicateBinding(_, variable) => format!(
                "variable '{}' is bound more than once in the same alternative",
                variable
            ),
            ParsingError::MissingBar(_) => "typing rule has no inference bar".to_string(),
            ParsingError::MissingRuleName(_) => {
                "inference bar must be followed by a parenthesized rule name".to_string()
            }
            ParsingError::EmptyConclusion(_) => {
                "typing rule has nothing below its inference bar".to_string()
            }
            ParsingError::EmptyDocument(_) => {
                "document contains no productions or typing rules".to_string()
            }
        }
    }
}

/// A declaration that could not be parsed, along with the name of the typing
/// rule it concerns if that much could be worked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<'i> {
    pub error: ParsingError<'i>,
    pub rule: Option<&'i str>,
}

/// Parse an entire document. Declarations that parse are returned in the
/// Document; each one that doesn't contributes one Failure.
pub fn parse_with_recovery(content: &str) -> (Document<'_>, Vec<Failure<'_>>) {
    let lines = split_lines(content);
    let chunks = group_lines(&lines);

    let mut declarations = Vec::new();
    let mut failures = Vec::new();

    // nothing but commentary and unstructured lines
    if chunks
        .iter()
        .all(|chunk| matches!(chunk, Chunk::Comment(_) | Chunk::Stray(_)))
    {
        debug!("No declarations found");
        failures.push(Failure {
            error: ParsingError::EmptyDocument(0),
            rule: None,
        });
        return (Document { declarations }, failures);
    }

    for chunk in chunks {
        match chunk {
            Chunk::Comment(i) => {
                declarations.push(Declaration::Comment(
                    lines[i]
                        .text
                        .trim(),
                ));
            }
            Chunk::Production(range) => {
                let span = span_of(&lines, range);
                match parse_production_at(content, span.clone()) {
                    Ok(production) => declarations.push(Declaration::Production(production)),
                    Err(error) => {
                        let rule = annotation_of(&content[span]);
                        debug!(?error, ?rule, "production failed to parse");
                        failures.push(Failure { error, rule });
                    }
                }
            }
            Chunk::Rule {
                premises,
                bar,
                conclusion,
            } => {
                let premises: Vec<Range<usize>> = premises
                    .into_iter()
                    .map(|i| span_of(&lines, i..i + 1))
                    .collect();
                let bar = span_of(&lines, bar..bar + 1);
                let conclusion = conclusion.map(|i| span_of(&lines, i..i + 1));

                let rule = read_bar(content, bar.clone())
                    .ok()
                    .map(|(name, _)| name.0);

                match parse_typing_rule_at(content, &premises, bar, conclusion) {
                    Ok(typing) => declarations.push(Declaration::Typing(typing)),
                    Err(error) => {
                        debug!(?error, ?rule, "typing rule failed to parse");
                        failures.push(Failure { error, rule });
                    }
                }
            }
            Chunk::Stray(range) => {
                let span = span_of(&lines, range);
                failures.push(Failure {
                    error: ParsingError::MissingBar(span.start),
                    rule: None,
                });
            }
        }
    }

    (Document { declarations }, failures)
}

/// Parse a single type expression, such as `τ -> List<σ>`.
pub fn parse_type(content: &str) -> Result<TypeExpr<'_>, ParsingError<'_>> {
    let tokens = tokenize(content, 0)?;
    let mut parser = Parser::new(content, &tokens, content.len());
    parser.read_type_complete()
}

/// Parse a typing context, such as `Γ,x:τ₁,y:τ₂`.
pub fn parse_context(content: &str) -> Result<Context<'_>, ParsingError<'_>> {
    let tokens = tokenize(content, 0)?;
    let mut parser = Parser::new(content, &tokens, content.len());
    parser.read_context()
}

/// Classify and parse one premise.
pub fn parse_premise(content: &str) -> Result<Premise<'_>, ParsingError<'_>> {
    let tokens = tokenize(content, 0)?;
    let mut parser = Parser::new(content, &tokens, content.len());
    if parser.is_finished() {
        return Err(ParsingError::Expected(0, "a premise"));
    }
    parser.read_premise()
}

/// Parse a production, such as `Lambda(lambda) ::= 'λ' Variable[x] '.' Term[e]`.
pub fn parse_production(content: &str) -> Result<ProductionRule<'_>, ParsingError<'_>> {
    parse_production_at(content, 0..content.len())
}

/// Parse a typing rule written as premises, inference bar with rule name,
/// and conclusion on successive lines.
pub fn parse_typing_rule(content: &str) -> Result<TypingRule<'_>, ParsingError<'_>> {
    let lines = split_lines(content);
    let significant: Vec<usize> = (0..lines.len())
        .filter(|&i| !is_blank(lines[i].text) && !is_comment(lines[i].text))
        .collect();

    let position = significant
        .iter()
        .position(|&i| is_bar(lines[i].text));

    let position = match position {
        Some(position) => position,
        None => {
            let offset = significant
                .first()
                .map(|&i| span_of(&lines, i..i + 1).start)
                .unwrap_or(0);
            return Err(ParsingError::MissingBar(offset));
        }
    };

    let premises: Vec<Range<usize>> = significant[..position]
        .iter()
        .map(|&i| span_of(&lines, i..i + 1))
        .collect();
    let bar = significant[position];
    let bar = span_of(&lines, bar..bar + 1);

    let after = &significant[position + 1..];
    if after.len() > 1 {
        let i = after[1];
        return Err(ParsingError::Expected(
            span_of(&lines, i..i + 1).start,
            "the end of the typing rule",
        ));
    }
    let conclusion = after
        .first()
        .map(|&i| span_of(&lines, i..i + 1));

    parse_typing_rule_at(content, &premises, bar, conclusion)
}

fn parse_production_at<'i>(
    source: &'i str,
    range: Range<usize>,
) -> Result<ProductionRule<'i>, ParsingError<'i>> {
    let tokens = tokenize(&source[range.clone()], range.start)?;
    let mut parser = Parser::new(source, &tokens, range.end);
    parser.read_production()
}

fn parse_typing_rule_at<'i>(
    source: &'i str,
    premises: &[Range<usize>],
    bar: Range<usize>,
    conclusion: Option<Range<usize>>,
) -> Result<TypingRule<'i>, ParsingError<'i>> {
    let (name, offset) = read_bar(source, bar.clone())?;

    // each line holds its own list of premises; a line may end with a comma
    // when more premises follow on the next line.
    let mut list = Vec::new();
    for (i, range) in premises
        .iter()
        .enumerate()
    {
        let mut tokens = tokenize(&source[range.clone()], range.start)?;
        if i + 1 < premises.len()
            && tokens
                .last()
                .map(|lexeme| lexeme.token)
                == Some(Token::Comma)
        {
            tokens.pop();
        }
        let mut parser = Parser::new(source, &tokens, range.end);
        list.extend(parser.read_premises()?);
    }

    let range = conclusion.ok_or(ParsingError::EmptyConclusion(bar.end))?;
    let tokens = tokenize(&source[range.clone()], range.start)?;
    if tokens.is_empty() {
        return Err(ParsingError::EmptyConclusion(range.start));
    }
    let mut parser = Parser::new(source, &tokens, range.end);
    let conclusion = parser.read_conclusion()?;

    Ok(TypingRule {
        name,
        premises: list,
        conclusion,
        offset,
    })
}

/// Read the inference bar line, returning the rule name and where it is.
fn read_bar<'i>(
    source: &'i str,
    range: Range<usize>,
) -> Result<(Identifier<'i>, usize), ParsingError<'i>> {
    let tokens = tokenize(&source[range.clone()], range.start)?;

    match tokens.as_slice() {
        [Lexeme {
            token: Token::Bar, ..
        }, Lexeme {
            token: Token::OpenParen,
            ..
        }, Lexeme {
            token: Token::Word(word),
            offset,
            ..
        }, Lexeme {
            token: Token::CloseParen,
            ..
        }] => validate_identifier(*word)
            .map(|name| (name, *offset))
            .ok_or(ParsingError::MissingRuleName(*offset)),
        _ => {
            let offset = tokens
                .first()
                .map(|lexeme| lexeme.end())
                .unwrap_or(range.start);
            Err(ParsingError::MissingRuleName(offset))
        }
    }
}

/// Pick the typing rule name out of a production's header, if it has one,
/// without otherwise parsing it.
fn annotation_of(content: &str) -> Option<&str> {
    let re = regex!(r"^\s*[a-zA-Z][a-zA-Z0-9_]*\s*\(\s*([a-zA-Z][a-zA-Z0-9_]*)\s*\)\s*::=");
    re.captures(content)
        .and_then(|cap| cap.get(1))
        .map(|one| one.as_str())
}

// Line level structure of a document

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line<'i> {
    offset: usize,
    text: &'i str,
}

fn split_lines(content: &str) -> Vec<Line<'_>> {
    let mut offset = 0;
    let mut result = Vec::new();

    for piece in content.split_inclusive('\n') {
        let text = piece.trim_end_matches(['\n', '\r']);
        result.push(Line { offset, text });
        offset += piece.len();
    }

    result
}

/// The source range covered by the given lines, less leading and trailing
/// whitespace.
fn span_of(lines: &[Line], range: Range<usize>) -> Range<usize> {
    let first = lines[range.start];
    let last = lines[range.end - 1];

    let start = first.offset
        + (first
            .text
            .len()
            - first
                .text
                .trim_start()
                .len());
    let end = last.offset
        + last
            .text
            .trim_end()
            .len();

    start..end.max(start)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Comment(usize),
    Production(Range<usize>),
    Rule {
        premises: Vec<usize>,
        bar: usize,
        conclusion: Option<usize>,
    },
    Stray(Range<usize>),
}

fn group_lines(lines: &[Line]) -> Vec<Chunk> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let text = lines[i].text;

        if is_blank(text) {
            i += 1;
        } else if is_comment(text) {
            result.push(Chunk::Comment(i));
            i += 1;
        } else if is_production(text) {
            let start = i;
            let mut comments = Vec::new();
            i += 1;

            // comment lines may sit between a production and its continuations
            loop {
                let mut j = i;
                while j < lines.len() && is_comment(lines[j].text) {
                    j += 1;
                }
                if j < lines.len() && is_continuation(lines[j].text) {
                    comments.extend(i..j);
                    i = j + 1;
                } else {
                    break;
                }
            }

            result.push(Chunk::Production(start..i));
            result.extend(
                comments
                    .into_iter()
                    .map(Chunk::Comment),
            );
        } else {
            let start = i;
            while i < lines.len() && !is_blank(lines[i].text) && !is_production(lines[i].text) {
                i += 1;
            }
            group_rules(lines, start..i, &mut result);
        }
    }

    result
}

/// Within a run of consecutive lines, each bar takes the lines above it (back
/// to the previous rule) as premises and the next line below as conclusion.
/// Comment lines in the run are passed over, and come out ahead of the rule
/// they were written in.
fn group_rules(lines: &[Line], range: Range<usize>, result: &mut Vec<Chunk>) {
    let mut k = range.start;

    while k < range.end {
        let bar = (k..range.end).find(|&j| is_bar(lines[j].text));

        match bar {
            None => {
                let stray: Vec<usize> = (k..range.end)
                    .filter(|&j| !is_comment(lines[j].text))
                    .collect();
                push_comments(lines, k..range.end, result);
                if let Some(&first) = stray.first() {
                    result.push(Chunk::Stray(first..range.end));
                }
                break;
            }
            Some(bar) => {
                let conclusion = (bar + 1..range.end)
                    .find(|&j| !is_comment(lines[j].text))
                    .filter(|&j| !is_bar(lines[j].text));
                let premises: Vec<usize> = (k..bar)
                    .filter(|&j| !is_comment(lines[j].text))
                    .collect();

                let end = match conclusion {
                    Some(c) => c + 1,
                    None => bar + 1,
                };
                push_comments(lines, k..end, result);
                result.push(Chunk::Rule {
                    premises,
                    bar,
                    conclusion,
                });
                k = end;
            }
        }
    }
}

fn push_comments(lines: &[Line], range: Range<usize>, result: &mut Vec<Chunk>) {
    result.extend(
        range
            .filter(|&j| is_comment(lines[j].text))
            .map(Chunk::Comment),
    );
}

fn is_blank(content: &str) -> bool {
    content
        .trim()
        .is_empty()
}

fn is_comment(content: &str) -> bool {
    content
        .trim_start()
        .starts_with("//")
}

fn is_production(content: &str) -> bool {
    !is_comment(content) && content.contains("::=")
}

fn is_continuation(content: &str) -> bool {
    content
        .trim_start()
        .starts_with('|')
}

fn is_bar(content: &str) -> bool {
    let re = regex!(r"^\s*-+(\s|\(|$)");
    re.is_match(content)
}

// Token level structure

/// A '<' opens generic arguments when written directly against a name
/// starting with a Latin letter, as in `List<τ>`. Anywhere else it is the
/// less-than relation.
fn is_generic_open(tokens: &[Lexeme], i: usize) -> bool {
    if i == 0 || tokens[i].token != Token::OpenAngle {
        return false;
    }

    let previous = tokens[i - 1];
    match previous.token {
        Token::Word(word) => {
            previous.end() == tokens[i].offset
                && word.starts_with(|c: char| c.is_ascii_alphabetic())
        }
        _ => false,
    }
}

/// How deeply each token is nested within brackets. Brackets themselves sit
/// at the depth outside the group they delimit.
fn depths(tokens: &[Lexeme]) -> Vec<usize> {
    let mut stack: Vec<Token> = Vec::new();
    let mut result = Vec::with_capacity(tokens.len());

    for (i, lexeme) in tokens
        .iter()
        .enumerate()
    {
        let opening = match lexeme.token {
            Token::OpenParen | Token::OpenBracket => true,
            Token::OpenAngle => is_generic_open(tokens, i),
            _ => false,
        };
        let closing = match (lexeme.token, stack.last()) {
            (Token::CloseParen, Some(Token::OpenParen)) => true,
            (Token::CloseBracket, Some(Token::OpenBracket)) => true,
            (Token::CloseAngle, Some(Token::OpenAngle)) => true,
            _ => false,
        };

        if opening {
            result.push(stack.len());
            stack.push(lexeme.token);
        } else if closing {
            stack.pop();
            result.push(stack.len());
        } else {
            result.push(stack.len());
        }
    }

    result
}

fn split_top_level(tokens: &[Lexeme], separator: Token) -> Vec<Range<usize>> {
    let depths = depths(tokens);
    let mut result = Vec::new();
    let mut start = 0;

    for (i, lexeme) in tokens
        .iter()
        .enumerate()
    {
        if lexeme.token == separator && depths[i] == 0 {
            result.push(start..i);
            start = i + 1;
        }
    }
    result.push(start..tokens.len());

    result
}

/// Split a premises line on top level commas, except that the commas of a
/// context's extension list (between a leading `Γ` and the `⊢` still to
/// come) don't count.
fn split_premises(tokens: &[Lexeme]) -> Vec<Range<usize>> {
    let depths = depths(tokens);
    let mut result = Vec::new();
    let mut start = 0;
    let mut judgment = false;
    let mut relation = false;

    for (i, lexeme) in tokens
        .iter()
        .enumerate()
    {
        match lexeme.token {
            Token::Turnstile => judgment = true,
            Token::Comma if depths[i] == 0 => {
                let context = !judgment
                    && !relation
                    && matches!(
                        tokens.get(start).map(|first| first.token),
                        Some(Token::Word(word)) if word == BASE_CONTEXT
                    )
                    && tokens[i..]
                        .iter()
                        .any(|later| later.token == Token::Turnstile);
                if !context {
                    result.push(start..i);
                    start = i + 1;
                    judgment = false;
                    relation = false;
                }
            }
            _ if depths[i] == 0 && is_relation(tokens, i) => relation = true,
            _ => {}
        }
    }
    result.push(start..tokens.len());

    result
}

fn is_relation(tokens: &[Lexeme], i: usize) -> bool {
    match tokens[i].token {
        Token::Member | Token::Relation(_) => true,
        Token::OpenAngle => !is_generic_open(tokens, i),
        _ => false,
    }
}

fn collapse<'i>(
    mut items: Vec<GrammarExpr<'i>>,
    wrap: fn(Vec<GrammarExpr<'i>>) -> GrammarExpr<'i>,
) -> GrammarExpr<'i> {
    if items.len() == 1 {
        if let Some(only) = items.pop() {
            return only;
        }
    }
    wrap(items)
}

#[derive(Debug, Clone)]
struct Parser<'t, 'i> {
    source: &'i str,
    tokens: &'t [Lexeme<'i>],
    position: usize,
    end: usize,
}

impl<'t, 'i> Parser<'t, 'i> {
    fn new(source: &'i str, tokens: &'t [Lexeme<'i>], end: usize) -> Parser<'t, 'i> {
        Parser {
            source,
            tokens,
            position: 0,
            end,
        }
    }

    /// Fork a parser over a range of this parser's tokens. Does NOT advance
    /// this parser; the caller needs to do that.
    fn subparser(&self, range: Range<usize>) -> Parser<'t, 'i> {
        let end = self
            .tokens
            .get(range.end)
            .map(|lexeme| lexeme.offset)
            .unwrap_or(self.end);

        let tokens = self.tokens;

        Parser {
            source: self.source,
            tokens: &tokens[range],
            position: 0,
            end,
        }
    }

    fn peek(&self) -> Option<Token<'i>> {
        self.tokens
            .get(self.position)
            .map(|lexeme| lexeme.token)
    }

    fn advance(&mut self) -> Option<Lexeme<'i>> {
        let lexeme = self
            .tokens
            .get(self.position)
            .copied();
        if lexeme.is_some() {
            self.position += 1;
        }
        lexeme
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map(|lexeme| lexeme.offset)
            .unwrap_or(self.end)
    }

    fn is_finished(&self) -> bool {
        self.position
            >= self
                .tokens
                .len()
    }

    fn finish(&mut self) {
        self.position = self
            .tokens
            .len();
    }

    fn remaining(&self) -> &'t [Lexeme<'i>] {
        let tokens = self.tokens;
        &tokens[self.position..]
    }

    /// The source text spanned by the tokens not yet consumed.
    fn fragment(&self) -> &'i str {
        let source = self.source;
        let remaining = self.remaining();
        match (remaining.first(), remaining.last()) {
            (Some(first), Some(last)) => &source[first.offset..last.end()],
            _ => "",
        }
    }

    fn require(
        &mut self,
        token: Token<'i>,
        what: &'static str,
    ) -> Result<Lexeme<'i>, ParsingError<'i>> {
        let offset = self.offset();
        match self.advance() {
            Some(lexeme) if lexeme.token == token => Ok(lexeme),
            _ => Err(ParsingError::Expected(offset, what)),
        }
    }

    // type expressions

    fn read_type_complete(&mut self) -> Result<TypeExpr<'i>, ParsingError<'i>> {
        let ty = self.read_type()?;
        match self.peek() {
            None => Ok(ty),
            Some(Token::CloseAngle) => Err(ParsingError::UnbalancedGeneric(self.offset())),
            Some(_) => Err(ParsingError::Expected(
                self.offset(),
                "the end of the type expression",
            )),
        }
    }

    /// Arrows associate to the right, so `τ -> σ -> ρ` is `τ -> (σ -> ρ)`.
    fn read_type(&mut self) -> Result<TypeExpr<'i>, ParsingError<'i>> {
        let left = self.read_type_atom()?;

        if self.peek() == Some(Token::Arrow) {
            let offset = self.offset();
            self.advance();

            if !matches!(self.peek(), Some(Token::Word(_)) | Some(Token::OpenParen)) {
                return Err(ParsingError::MissingArrowOperand(offset));
            }

            let right = self.read_type()?;
            return Ok(TypeExpr::Arrow(Box::new(left), Box::new(right)));
        }

        Ok(left)
    }

    fn read_type_atom(&mut self) -> Result<TypeExpr<'i>, ParsingError<'i>> {
        let offset = self.offset();

        match self.peek() {
            Some(Token::OpenParen) => {
                self.advance();
                let inner = self.read_type()?;
                self.require(Token::CloseParen, "a closing ')'")?;
                Ok(TypeExpr::Paren(Box::new(inner)))
            }
            Some(Token::Word(word)) => {
                self.advance();
                if is_generic_open(self.tokens, self.position) {
                    let name = validate_constructor(word)
                        .ok_or(ParsingError::InvalidConstructorCase(offset, word))?;
                    let arguments = self.read_generic_arguments()?;
                    Ok(TypeExpr::Constructor(name, arguments))
                } else if let Some(name) = validate_constructor(word) {
                    Ok(TypeExpr::Constructor(name, Vec::new()))
                } else {
                    Ok(TypeExpr::Variable(Variable::new(word, offset)))
                }
            }
            Some(Token::CloseAngle) => Err(ParsingError::UnbalancedGeneric(offset)),
            _ => Err(ParsingError::Expected(offset, "a type expression")),
        }
    }

    fn read_generic_arguments(&mut self) -> Result<Vec<TypeExpr<'i>>, ParsingError<'i>> {
        let open = self.offset();
        self.advance();

        if self.peek() == Some(Token::CloseAngle) {
            return Err(ParsingError::EmptyGenericArgs(open));
        }

        let mut arguments = vec![self.read_type()?];
        loop {
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                    arguments.push(self.read_type()?);
                }
                Some(Token::CloseAngle) => {
                    self.advance();
                    return Ok(arguments);
                }
                _ => return Err(ParsingError::UnbalancedGeneric(open)),
            }
        }
    }

    // contexts

    fn read_context(&mut self) -> Result<Context<'i>, ParsingError<'i>> {
        let offset = self.offset();
        match self.peek() {
            Some(Token::Word(word)) if word == BASE_CONTEXT => {
                self.advance();
            }
            _ => return Err(ParsingError::MissingBase(offset)),
        }

        if self.is_finished() {
            return Ok(Context::default());
        }

        if self.peek() != Some(Token::Comma) {
            return Err(ParsingError::MalformedExtension(
                self.offset(),
                self.fragment(),
            ));
        }
        self.advance();

        let start = self.position;
        let mut extensions = Vec::new();
        for range in split_top_level(self.remaining(), Token::Comma) {
            let mut inner = self.subparser(start + range.start..start + range.end);
            extensions.push(inner.read_extension()?);
        }
        self.finish();

        Ok(Context { extensions })
    }

    fn read_extension(&mut self) -> Result<Extension<'i>, ParsingError<'i>> {
        let offset = self.offset();
        let fragment = self.fragment();
        let malformed = ParsingError::MalformedExtension(offset, fragment);

        let variable = match self.advance() {
            Some(Lexeme {
                token: Token::Word(word),
                offset,
                ..
            }) => Variable::new(word, offset),
            _ => return Err(malformed),
        };

        if self.peek() != Some(Token::Colon) {
            return Err(malformed);
        }
        self.advance();

        if self.is_finished() {
            return Err(malformed);
        }

        let ty = self.read_type()?;
        if !self.is_finished() {
            return Err(malformed);
        }

        Ok(Extension { variable, ty })
    }

    // premises and conclusions

    fn read_premises(&mut self) -> Result<Vec<Premise<'i>>, ParsingError<'i>> {
        let start = self.position;
        let mut premises = Vec::new();

        if self.is_finished() {
            return Ok(premises);
        }

        for range in split_premises(self.remaining()) {
            let mut inner = self.subparser(start + range.start..start + range.end);
            if inner.is_finished() {
                return Err(ParsingError::Expected(
                    inner.offset(),
                    "a premise between commas",
                ));
            }
            premises.push(inner.read_premise()?);
        }
        self.finish();

        Ok(premises)
    }

    /// Work out which of the four kinds of premise this is, then parse it as
    /// that kind. Anything with a '⊢' in it is a judgment or an error.
    fn read_premise(&mut self) -> Result<Premise<'i>, ParsingError<'i>> {
        let offset = self.offset();
        let fragment = self.fragment();
        let start = self.position;
        let tokens = self.remaining();
        let depths = depths(tokens);

        let turnstiles = tokens
            .iter()
            .filter(|lexeme| lexeme.token == Token::Turnstile)
            .count();
        let relations: Vec<usize> = (0..tokens.len())
            .filter(|&i| depths[i] == 0 && is_relation(tokens, i))
            .collect();

        if turnstiles > 0 {
            if turnstiles > 1 {
                return Err(ParsingError::MultipleJudgmentSymbols(offset, fragment));
            }
            if !relations.is_empty() {
                return Err(ParsingError::AmbiguousWithJudgment(offset, fragment));
            }
            return self
                .read_judgment()
                .map(Premise::Judgment);
        }

        if relations.len() > 1 {
            return Err(ParsingError::MultipleRelationSymbols(offset, fragment));
        }

        if let [r] = relations[..] {
            if tokens[r].token == Token::Member && tokens.len() == r + 2 {
                if let Token::Word(name) = tokens[r + 1].token {
                    let context = Variable::new(name, tokens[r + 1].offset);
                    let variable = match &tokens[..r] {
                        [Lexeme {
                            token: Token::Word(word),
                            offset: at,
                            ..
                        }] => Variable::new(*word, *at),
                        _ => return Err(ParsingError::InvalidMembershipArity(offset, fragment)),
                    };
                    self.finish();
                    return Ok(Premise::Membership { variable, context });
                }
            }

            let relation = match tokens[r].token {
                Token::Member => Relation::Member,
                Token::OpenAngle => Relation::Less,
                Token::Relation(symbol) => Relation::from_symbol(symbol).ok_or(
                    ParsingError::Expected(tokens[r].offset, "a relation symbol"),
                )?,
                _ => return Err(ParsingError::Expected(tokens[r].offset, "a relation symbol")),
            };

            let left = self
                .subparser(start..start + r)
                .read_type_complete()?;
            let right = self
                .subparser(start + r + 1..start + tokens.len())
                .read_type_complete()?;
            self.finish();

            return Ok(Premise::Relation {
                left,
                relation,
                right,
            });
        }

        if let [Lexeme {
            token: Token::Word(_),
            ..
        }, Lexeme {
            token: Token::OpenParen,
            ..
        }, .., Lexeme {
            token: Token::CloseParen,
            ..
        }] = tokens
        {
            return self.read_predicate();
        }

        Err(ParsingError::UnrecognizedPremiseForm(offset, fragment))
    }

    fn read_judgment(&mut self) -> Result<Judgment<'i>, ParsingError<'i>> {
        let offset = self.offset();
        let fragment = self.fragment();
        let start = self.position;
        let tokens = self.remaining();

        let turnstiles: Vec<usize> = (0..tokens.len())
            .filter(|&i| tokens[i].token == Token::Turnstile)
            .collect();
        let t = match turnstiles[..] {
            [t] => t,
            _ => return Err(ParsingError::MultipleJudgmentSymbols(offset, fragment)),
        };

        let colons: Vec<usize> = (t + 1..tokens.len())
            .filter(|&i| tokens[i].token == Token::Colon)
            .collect();
        let c = match colons[..] {
            [c] => c,
            _ => return Err(ParsingError::MultipleJudgmentSymbols(offset, fragment)),
        };

        let context = self
            .subparser(start..start + t)
            .read_context()?;

        let expression = match &tokens[t + 1..c] {
            [Lexeme {
                token: Token::Word(word),
                offset: at,
                ..
            }] => Variable::new(*word, *at),
            _ => {
                return Err(ParsingError::Expected(
                    tokens[t].end(),
                    "a single variable between '⊢' and ':'",
                ))
            }
        };

        let ty = self
            .subparser(start + c + 1..start + tokens.len())
            .read_type_complete()?;
        self.finish();

        Ok(Judgment {
            context,
            expression,
            ty,
        })
    }

    fn read_predicate(&mut self) -> Result<Premise<'i>, ParsingError<'i>> {
        let start = self.position;
        let tokens = self.remaining();

        let (word, at) = match tokens.first() {
            Some(Lexeme {
                token: Token::Word(word),
                offset,
                ..
            }) => (*word, *offset),
            _ => return Err(ParsingError::Expected(self.offset(), "a predicate name")),
        };
        let name = validate_predicate(word).ok_or(ParsingError::InvalidPredicateName(at, word))?;

        // between the parentheses
        let inner = &tokens[2..tokens.len() - 1];
        let mut arguments = Vec::new();

        if !inner.is_empty() {
            for range in split_top_level(inner, Token::Comma) {
                match &inner[range.clone()] {
                    [Lexeme {
                        token: Token::Word(word),
                        offset,
                        ..
                    }] => arguments.push(Variable::new(*word, *offset)),
                    _ => {
                        let argument =
                            self.subparser(start + 2 + range.start..start + 2 + range.end);
                        return Err(ParsingError::InvalidPredicateArgument(
                            argument.offset(),
                            argument.fragment(),
                        ));
                    }
                }
            }
        }
        self.finish();

        Ok(Premise::Predicate { name, arguments })
    }

    fn read_conclusion(&mut self) -> Result<Conclusion<'i>, ParsingError<'i>> {
        let tokens = self.remaining();

        if tokens
            .iter()
            .any(|lexeme| lexeme.token == Token::Turnstile)
        {
            return self
                .read_judgment()
                .map(Conclusion::Judgment);
        }

        if let [Lexeme {
            token: Token::Word(base),
            ..
        }, Lexeme {
            token: Token::OpenParen,
            ..
        }, Lexeme {
            token: Token::Word(word),
            offset,
            ..
        }, Lexeme {
            token: Token::CloseParen,
            ..
        }] = tokens
        {
            if *base == BASE_CONTEXT {
                let variable = Variable::new(*word, *offset);
                self.finish();
                return Ok(Conclusion::ContextLookup(variable));
            }
        }

        self.read_type_complete()
            .map(Conclusion::Type)
    }

    // productions

    fn read_production(&mut self) -> Result<ProductionRule<'i>, ParsingError<'i>> {
        let offset = self.offset();

        let name = match self.advance() {
            Some(Lexeme {
                token: Token::Word(word),
                ..
            }) => validate_identifier(word)
                .ok_or(ParsingError::Expected(offset, "a production name"))?,
            _ => return Err(ParsingError::Expected(offset, "a production name")),
        };

        let rule = if self.peek() == Some(Token::OpenParen) {
            self.advance();
            let at = self.offset();
            let rule = match self.advance() {
                Some(Lexeme {
                    token: Token::Word(word),
                    ..
                }) => validate_identifier(word)
                    .ok_or(ParsingError::Expected(at, "a typing rule name"))?,
                _ => return Err(ParsingError::Expected(at, "a typing rule name")),
            };
            self.require(Token::CloseParen, "')' after the typing rule name")?;
            Some(rule)
        } else {
            None
        };

        self.require(Token::Defines, "'::='")?;

        let rhs = self.read_alternatives()?;

        Ok(ProductionRule {
            name,
            rule,
            rhs,
            offset,
        })
    }

    fn read_alternatives(&mut self) -> Result<GrammarExpr<'i>, ParsingError<'i>> {
        let start = self.position;
        let mut alternatives = Vec::new();

        for range in split_top_level(self.remaining(), Token::Pipe) {
            let mut inner = self.subparser(start + range.start..start + range.end);
            alternatives.push(inner.read_sequence()?);
        }
        self.finish();

        Ok(collapse(alternatives, GrammarExpr::Alternatives))
    }

    fn read_sequence(&mut self) -> Result<GrammarExpr<'i>, ParsingError<'i>> {
        if self.is_finished() {
            return Err(ParsingError::Expected(self.offset(), "a grammar symbol"));
        }

        let mut items = Vec::new();
        let mut bound: Vec<Variable<'i>> = Vec::new();

        while !self.is_finished() {
            let offset = self.offset();
            let item = match self.peek() {
                Some(Token::Literal(text)) => {
                    self.advance();
                    GrammarExpr::Terminal(Terminal::Literal(text), self.read_binding()?)
                }
                Some(Token::Pattern(text)) => {
                    self.advance();
                    GrammarExpr::Terminal(Terminal::Pattern(text), self.read_binding()?)
                }
                Some(Token::Word(word)) => {
                    self.advance();
                    let name = validate_identifier(word)
                        .ok_or(ParsingError::Expected(offset, "a nonterminal name"))?;
                    GrammarExpr::NonTerminal(name, self.read_binding()?)
                }
                _ => return Err(ParsingError::Expected(offset, "a terminal or nonterminal")),
            };

            if let GrammarExpr::Terminal(_, Some(variable))
            | GrammarExpr::NonTerminal(_, Some(variable)) = &item
            {
                if bound.contains(variable) {
                    return Err(ParsingError::DuplicateBinding(
                        variable.offset,
                        variable.text,
                    ));
                }
                bound.push(*variable);
            }

            items.push(item);
        }

        Ok(collapse(items, GrammarExpr::Sequence))
    }

    fn read_binding(&mut self) -> Result<Option<Variable<'i>>, ParsingError<'i>> {
        if self.peek() != Some(Token::OpenBracket) {
            return Ok(None);
        }
        self.advance();

        let at = self.offset();
        let variable = match self.advance() {
            Some(Lexeme {
                token: Token::Word(word),
                offset,
                ..
            }) => Variable::new(word, offset),
            _ => return Err(ParsingError::Expected(at, "a variable between '[' and ']'")),
        };
        self.require(Token::CloseBracket, "']' after the bound variable")?;

        Ok(Some(variable))
    }
}

#[cfg(test)]
#[path = "checks/parser.rs"]
mod check;

#[cfg(test)]
#[path = "checks/errors.rs"]
mod verify;
