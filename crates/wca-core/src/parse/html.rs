//! A scoped HTML parser: enough markup grammar for the import, databinding,
//! and pseudo-element scanners to walk a real tree, not a conformant HTML5
//! parser (no tree-construction error recovery, no implied end tags, no
//! entity decoding beyond what scanners need).

use winnow::ascii::multispace0;
use winnow::combinator::{delimited, opt, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};
use winnow::ModalResult;

use crate::text::Span;

/// Tags whose content is opaque raw text up to the matching close tag
/// (never recursed into as markup) — `<script>`/`<style>` bodies are JS/CSS,
/// not HTML.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// One parsed attribute: its name, optional value, and (when it has a
/// value) the byte span of the value *inside its quotes* — needed by the
/// databinding scanner to translate an offset within the value string back
/// into a document source range.
#[derive(Debug, Clone)]
pub struct HtmlAttr {
    pub name: String,
    pub value: Option<String>,
    pub value_span: Option<Span>,
}

#[derive(Debug, Clone)]
pub enum HtmlNode {
    Element {
        tag: String,
        attrs: Vec<HtmlAttr>,
        children: Vec<HtmlNode>,
        span: Span,
    },
    Text {
        content: String,
        span: Span,
    },
    Comment {
        content: String,
        span: Span,
    },
}

impl HtmlNode {
    pub fn span(&self) -> Span {
        match self {
            HtmlNode::Element { span, .. } => *span,
            HtmlNode::Text { span, .. } => *span,
            HtmlNode::Comment { span, .. } => *span,
        }
    }

    pub fn as_element(&self) -> Option<(&str, &[HtmlAttr], &[HtmlNode])> {
        match self {
            HtmlNode::Element { tag, attrs, children, .. } => {
                Some((tag.as_str(), attrs.as_slice(), children.as_slice()))
            }
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<Option<&str>> {
        match self {
            HtmlNode::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_deref()),
            _ => None,
        }
    }

    /// Depth-first pre-order walk, invoking `visit` on every node.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HtmlNode)) {
        visit(self);
        if let HtmlNode::Element { children, .. } = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

fn offset(original: &str, remaining: &str) -> usize {
    original.len() - remaining.len()
}

pub fn parse_document(input: &str) -> Result<HtmlNode, String> {
    let mut cursor = input;
    skip_doctype(&mut cursor);
    let children = parse_nodes(input, &mut cursor, None)
        .map_err(|e| format!("{:?}", e))?;
    Ok(HtmlNode::Element {
        tag: "#document".to_string(),
        attrs: Vec::new(),
        children,
        span: Span::new(0, input.len()),
    })
}

fn skip_doctype(cursor: &mut &str) {
    let _ = multispace0.parse_next(cursor);
    if cursor.to_ascii_lowercase().starts_with("<!doctype") {
        if let Some(end) = cursor.find('>') {
            *cursor = &cursor[end + 1..];
        }
    }
}

/// Parses sibling nodes until EOF or, if `closing_tag` is given, until the
/// matching `</tag>` (which is consumed but not included in the result).
fn parse_nodes(
    original: &str,
    cursor: &mut &str,
    closing_tag: Option<&str>,
) -> ModalResult<Vec<HtmlNode>> {
    let mut nodes = Vec::new();
    loop {
        if cursor.is_empty() {
            return Ok(nodes);
        }
        if let Some(tag) = closing_tag {
            if let Some(rest) = match_close_tag(cursor, tag) {
                *cursor = rest;
                return Ok(nodes);
            }
        }
        if cursor.starts_with("<!--") {
            nodes.push(parse_comment(original, cursor)?);
            continue;
        }
        if cursor.starts_with("</") {
            // Stray close tag for a tag we're not inside: stop here and let
            // the caller (or EOF) absorb it, rather than looping forever.
            if closing_tag.is_none() {
                if let Some(end) = cursor.find('>') {
                    *cursor = &cursor[end + 1..];
                    continue;
                }
            }
            return Ok(nodes);
        }
        if cursor.starts_with('<') {
            nodes.push(parse_element(original, cursor)?);
            continue;
        }
        nodes.push(parse_text(original, cursor)?);
    }
}

fn match_close_tag<'a>(cursor: &'a str, tag: &str) -> Option<&'a str> {
    let prefix = format!("</{}", tag);
    if cursor.len() >= prefix.len() && cursor[..prefix.len()].eq_ignore_ascii_case(&prefix) {
        let after = &cursor[prefix.len()..];
        let end = after.find('>')?;
        return Some(&after[end + 1..]);
    }
    None
}

fn parse_comment<'a>(original: &str, cursor: &mut &'a str) -> ModalResult<HtmlNode> {
    let start = offset(original, cursor);
    let parsed: &str = delimited("<!--", take_until(0.., "-->"), "-->").parse_next(cursor)?;
    let end = offset(original, cursor);
    Ok(HtmlNode::Comment {
        content: parsed.to_string(),
        span: Span::new(start, end),
    })
}

fn parse_text<'a>(original: &str, cursor: &mut &'a str) -> ModalResult<HtmlNode> {
    let start = offset(original, cursor);
    let text: &str = take_till(1.., |c| c == '<').parse_next(cursor)?;
    let end = offset(original, cursor);
    Ok(HtmlNode::Text {
        content: text.to_string(),
        span: Span::new(start, end),
    })
}

fn parse_element<'a>(original: &str, cursor: &mut &'a str) -> ModalResult<HtmlNode> {
    let start = offset(original, cursor);
    '<'.parse_next(cursor)?;
    let tag: &str = take_while(1.., |c: char| !c.is_whitespace() && c != '>' && c != '/')
        .parse_next(cursor)?;
    let tag_lower = tag.to_ascii_lowercase();

    let attrs = parse_attrs(original, cursor)?;
    let _ = multispace0.parse_next(cursor);
    let self_closing = opt('/').parse_next(cursor)?.is_some();
    '>'.parse_next(cursor).map_err(|_| ErrMode::from_input(cursor))?;

    if self_closing || VOID_TAGS.contains(&tag_lower.as_str()) {
        let end = offset(original, cursor);
        return Ok(HtmlNode::Element {
            tag: tag_lower,
            attrs,
            children: Vec::new(),
            span: Span::new(start, end),
        });
    }

    if RAW_TEXT_TAGS.contains(&tag_lower.as_str()) {
        let content_start = offset(original, cursor);
        let closing = format!("</{}", tag_lower);
        let raw: &str = take_until(0.., closing.as_str())
            .parse_next(cursor)
            .unwrap_or_else(|_: ErrMode<winnow::error::ContextError>| {
                let rest = *cursor;
                *cursor = "";
                rest
            });
        let content_end = content_start + raw.len();
        if let Some(end_idx) = cursor.find('>') {
            *cursor = &cursor[end_idx + 1..];
        }
        let span_end = offset(original, cursor);
        let child = HtmlNode::Text {
            content: raw.to_string(),
            span: Span::new(content_start, content_end),
        };
        return Ok(HtmlNode::Element {
            tag: tag_lower,
            attrs,
            children: vec![child],
            span: Span::new(start, span_end),
        });
    }

    let children = parse_nodes(original, cursor, Some(&tag_lower))?;
    let end = offset(original, cursor);
    Ok(HtmlNode::Element {
        tag: tag_lower,
        attrs,
        children,
        span: Span::new(start, end),
    })
}

fn parse_attrs(original: &str, cursor: &mut &str) -> ModalResult<Vec<HtmlAttr>> {
    repeat(0.., |c: &mut &str| parse_attr(original, c)).parse_next(cursor)
}

fn parse_attr(original: &str, cursor: &mut &str) -> ModalResult<HtmlAttr> {
    let _ = multispace0.parse_next(cursor);
    let checkpoint = *cursor;
    let name: &str =
        take_while(1.., |c: char| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .parse_next(cursor)?;
    if name.is_empty() {
        *cursor = checkpoint;
        return Err(ErrMode::from_input(cursor));
    }
    let _ = multispace0.parse_next(cursor);
    let value = opt(|c: &mut &str| parse_attr_value(original, c)).parse_next(cursor)?;
    let (value, value_span) = match value {
        Some((v, span)) => (Some(v), Some(span)),
        None => (None, None),
    };
    Ok(HtmlAttr {
        name: name.to_string(),
        value,
        value_span,
    })
}

fn parse_attr_value(original: &str, cursor: &mut &str) -> ModalResult<(String, Span)> {
    '='.parse_next(cursor)?;
    let _ = multispace0.parse_next(cursor);
    let quote = cursor.chars().next().filter(|c| *c == '"' || *c == '\'');
    let raw: &str = match quote {
        Some('"') => delimited('"', take_till(0.., |c| c == '"'), '"').parse_next(cursor)?,
        Some('\'') => delimited('\'', take_till(0.., |c| c == '\''), '\'').parse_next(cursor)?,
        _ => take_while(1.., |c: char| !c.is_whitespace() && c != '>').parse_next(cursor)?,
    };
    let value_end = offset(original, cursor) - if quote.is_some() { 1 } else { 0 };
    let value_start = value_end - raw.len();
    Ok((raw.to_string(), Span::new(value_start, value_end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_import_link() {
        let src = r#"<link rel="import" href="./a.html">"#;
        let doc = parse_document(src).unwrap();
        let (_, _, children) = doc.as_element().unwrap();
        let (tag, attrs, _) = children[0].as_element().unwrap();
        assert_eq!(tag, "link");
        let href = attrs.iter().find(|a| a.name == "href").unwrap();
        assert_eq!(href.value.as_deref(), Some("./a.html"));
        let span = href.value_span.unwrap();
        assert_eq!(&src[span.start..span.end], "./a.html");
    }

    #[test]
    fn captures_inline_script_content_as_raw_text() {
        let src = "<script>class El {}</script>";
        let doc = parse_document(src).unwrap();
        let (_, _, children) = doc.as_element().unwrap();
        let (tag, _, script_children) = children[0].as_element().unwrap();
        assert_eq!(tag, "script");
        match &script_children[0] {
            HtmlNode::Text { content, .. } => assert_eq!(content, "class El {}"),
            _ => panic!("expected raw text child"),
        }
    }

    #[test]
    fn parses_nested_elements_and_text() {
        let src = "<div><p>hello</p></div>";
        let doc = parse_document(src).unwrap();
        let (_, _, children) = doc.as_element().unwrap();
        let (tag, _, div_children) = children[0].as_element().unwrap();
        assert_eq!(tag, "div");
        let (p_tag, _, p_children) = div_children[0].as_element().unwrap();
        assert_eq!(p_tag, "p");
        match &p_children[0] {
            HtmlNode::Text { content, .. } => assert_eq!(content, "hello"),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn parses_comment() {
        let doc = parse_document("<!-- @pseudoElement hi -->").unwrap();
        let (_, _, children) = doc.as_element().unwrap();
        match &children[0] {
            HtmlNode::Comment { content, .. } => assert!(content.contains("@pseudoElement")),
            _ => panic!("expected comment"),
        }
    }
}
