//! Parser registry (C3).
//!
//! Parsers are pure functions over `(text, url)` — no I/O, no access to the
//! loader or document cache. A parse failure never propagates as an `Err`:
//! it yields a synthetic empty document plus a `parse-error` warning at the
//! offending range, same as every other malformed-input case in this crate.

pub mod html;
pub mod script;

use crate::text::{Position, SourceRange};
use crate::url::Resolved;
use crate::warning::{codes, Severity, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Html,
    Js,
}

/// The AST payload of a [`ParsedDocument`], one variant per [`Language`].
#[derive(Debug, Clone)]
pub enum Ast {
    Html(html::HtmlNode),
    Js(script::JsModule),
}

/// Opaque AST plus the bookkeeping every scanner needs regardless of
/// language: original text, resolved URL, whether this document is an
/// inline child of another, and the language tag.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub url: Resolved,
    pub text: String,
    pub is_inline: bool,
    pub language: Language,
    pub ast: Ast,
}

impl ParsedDocument {
    /// Re-derives the source range of a byte span within this document's
    /// own text (not shifted into any enclosing document's coordinates —
    /// that shift is the scanner's job, via `SourceRange::from_span_in`).
    pub fn source_range(&self, span: crate::text::Span) -> SourceRange {
        SourceRange::new(
            crate::text::offset_to_position(&self.text, span.start),
            crate::text::offset_to_position(&self.text, span.end),
        )
    }
}

/// Result of running a [`Parser`]: the document plus any warnings raised
/// while producing it (never an `Err`).
pub struct ParseOutcome {
    pub document: ParsedDocument,
    pub warnings: Vec<Warning>,
}

pub trait Parser: Send + Sync {
    fn parse(&self, text: &str, url: &Resolved, is_inline: bool) -> ParseOutcome;
}

pub struct HtmlParser;
pub struct ScriptParser;

impl Parser for HtmlParser {
    fn parse(&self, text: &str, url: &Resolved, is_inline: bool) -> ParseOutcome {
        match html::parse_document(text) {
            Ok(root) => ParseOutcome {
                document: ParsedDocument {
                    url: url.clone(),
                    text: text.to_string(),
                    is_inline,
                    language: Language::Html,
                    ast: Ast::Html(root),
                },
                warnings: Vec::new(),
            },
            Err(_) => empty_document_with_parse_error(Language::Html, text, url, is_inline),
        }
    }
}

impl Parser for ScriptParser {
    fn parse(&self, text: &str, url: &Resolved, is_inline: bool) -> ParseOutcome {
        match script::parse_module(text) {
            Ok(module) => ParseOutcome {
                document: ParsedDocument {
                    url: url.clone(),
                    text: text.to_string(),
                    is_inline,
                    language: Language::Js,
                    ast: Ast::Js(module),
                },
                warnings: Vec::new(),
            },
            Err(_) => empty_document_with_parse_error(Language::Js, text, url, is_inline),
        }
    }
}

fn empty_document_with_parse_error(
    language: Language,
    text: &str,
    url: &Resolved,
    is_inline: bool,
) -> ParseOutcome {
    let ast = match language {
        Language::Html => Ast::Html(html::HtmlNode::Element {
            tag: "html".to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            span: crate::text::Span::new(0, text.len()),
        }),
        Language::Js => Ast::Js(script::JsModule { statements: Vec::new() }),
    };
    let range = SourceRange::new(Position::new(0, 0), Position::new(0, 0));
    let warning = Warning::new(
        codes::PARSE_ERROR,
        "failed to parse document",
        Severity::Error,
        range,
        url.clone(),
    );
    ParseOutcome {
        document: ParsedDocument {
            url: url.clone(),
            text: text.to_string(),
            is_inline,
            language,
            ast,
        },
        warnings: vec![warning],
    }
}

/// Dispatches by file extension (or, for inline `<script>`, by declared
/// `type`) to one of the two concrete parsers. Mirrors spec §6's default
/// extension table: `.html`/`.htm` to the markup parser, `.js`/`.mjs`/inline
/// `<script>` content to the script parser. `.css` has no registered parser
/// — style content is carried opaquely by the HTML scanner instead.
pub struct ParserRegistry {
    html: HtmlParser,
    script: ScriptParser,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry {
            html: HtmlParser,
            script: ScriptParser,
        }
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_url(&self, url: &Resolved) -> Option<&dyn Parser> {
        let path = url.0.rsplit(['/', '#']).next().unwrap_or(&url.0);
        if path.ends_with(".html") || path.ends_with(".htm") {
            Some(&self.html)
        } else if path.ends_with(".js") || path.ends_with(".mjs") {
            Some(&self.script)
        } else {
            None
        }
    }

    pub fn for_inline_script(&self) -> &dyn Parser {
        &self.script
    }
}
