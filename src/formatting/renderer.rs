//! Renderers for colourizing specification documents

use owo_colors::OwoColorize;

use crate::formatting::formatter::format_document;
use crate::formatting::Syntax;
use crate::language::Document;

/// Trait for different rendering backends (the no-op no-markup one, and ANSI
/// escapes for terminal colouring)
pub trait Render {
    /// Render content with the specified type/style
    fn render(&self, syntax: Syntax, content: &str) -> String;
}

/// Returns content unchanged, with no markup applied
pub struct Identity;

impl Render for Identity {
    fn render(&self, _syntax: Syntax, content: &str) -> String {
        content.to_string()
    }
}

/// Embellish fragments with ANSI escapes to create syntax highlighting in
/// terminal output.
pub struct Terminal;

impl Render for Terminal {
    fn render(&self, syntax: Syntax, content: &str) -> String {
        match syntax {
            Syntax::Neutral => content.to_string(),
            Syntax::Comment => content // comment - #999999 (grey)
                .color(owo_colors::Rgb(153, 153, 153))
                .to_string(),
            Syntax::Declaration => content // entity.name.function - #3465a4 (blue) bold
                .color(owo_colors::Rgb(52, 101, 164))
                .bold()
                .to_string(),
            Syntax::Label => content // entity.name.tag - #ad7fa8 (purple) bold
                .color(owo_colors::Rgb(173, 127, 168))
                .bold()
                .to_string(),
            Syntax::Terminal => content // string - #4e9a06 (green) bold
                .color(owo_colors::Rgb(78, 154, 6))
                .bold()
                .to_string(),
            Syntax::Pattern => content // string.regexp - #4e9a06 (green)
                .color(owo_colors::Rgb(78, 154, 6))
                .to_string(),
            Syntax::NonTerminal => content // entity.name.type - #8f5902 (brown) bold
                .color(owo_colors::Rgb(143, 89, 2))
                .bold()
                .to_string(),
            Syntax::Variable => content // variable.parameter - #729fcf (light blue) bold
                .color(owo_colors::Rgb(114, 159, 207))
                .bold()
                .to_string(),
            Syntax::Constructor => content // entity.name.type - #8f5902 (brown) bold
                .color(owo_colors::Rgb(143, 89, 2))
                .bold()
                .to_string(),
            Syntax::Context => content // constant.language - #ad7fa8 (purple)
                .color(owo_colors::Rgb(173, 127, 168))
                .to_string(),
            Syntax::Predicate => content // meta.function-call - #3465a4 (blue) bold
                .color(owo_colors::Rgb(52, 101, 164))
                .bold()
                .to_string(),
            Syntax::Operator => content // keyword.operator - #cc0000 (red) bold
                .color(owo_colors::Rgb(204, 0, 0))
                .bold()
                .to_string(),
            Syntax::Punctuation => content // punctuation - #999999 (grey)
                .color(owo_colors::Rgb(153, 153, 153))
                .to_string(),
            Syntax::Bar => content // markup.heading - bold
                .bold()
                .to_string(),
        }
    }
}

/// We do the code formatting in two passes. First we convert from our
/// Abstract Syntax Tree types into a Vec of "fragments" (Syntax tag, String
/// pairs). Then second we apply the specified renderer to each pair to result
/// in an embellished/highlighted/marked-up String.
pub fn render(renderer: &impl Render, document: &Document) -> String {
    // Pass 1: Format AST to tagged fragments
    let fragments = format_document(document);

    // Pass 2: Render tagged fragments to final output
    let mut result = render_to_string(renderer, fragments);

    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }

    result
}

/// Pass 2: apply markup to fragments via render() and combine.
pub(crate) fn render_to_string(renderer: &dyn Render, fragments: Vec<(Syntax, String)>) -> String {
    let mut output = String::new();

    for (syntax, content) in fragments {
        let rendered = renderer.render(syntax, &content);
        output.push_str(&rendered);
    }

    output
}
