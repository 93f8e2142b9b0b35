//! A scoped ECMAScript parser: recognizes the handful of top-level shapes
//! the script scanners need (class declarations, function declarations,
//! assignment expressions, `customElements.define` calls), each tagged with
//! its leading doc comment. This is not a general-purpose JS parser — full
//! expression and statement grammars are an external collaborator per this
//! analyzer's scope, same as the markup grammar.

use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

use crate::text::Span;

#[derive(Debug, Clone)]
pub struct JsModule {
    pub statements: Vec<JsStatement>,
}

#[derive(Debug, Clone)]
pub struct JsStatement {
    pub doc_comment: Option<String>,
    pub span: Span,
    pub kind: JsStatementKind,
}

#[derive(Debug, Clone)]
pub enum JsStatementKind {
    /// `class Name [extends Super] { ...body... }` or `ClassExpr` bound via
    /// an assignment (`const Name = class extends Super { ... }`).
    Class {
        name: Option<String>,
        extends: Option<String>,
        members: Vec<ClassMember>,
    },
    /// `function name(params) { ... }`, a named function declaration.
    Function {
        name: String,
        params: Vec<String>,
    },
    /// `target = expression;` or `var/let/const target = expression;` at
    /// statement level — covers namespace object-literal assignments and
    /// `customElements.define(...)` calls (captured as `Call`).
    Assignment {
        target: AssignmentTarget,
        value: AssignmentValue,
    },
    /// A bare call-expression statement, e.g. `customElements.define(...)`.
    Call {
        callee: String,
        args: Vec<String>,
    },
    /// Any other statement — kept only so traversal order and raw text are
    /// preserved; scanners ignore these.
    Other,
}

/// The left-hand side of a top-level assignment, as far as it can be
/// statically named. `Dynamic` marks a computed member whose subscript
/// was not a literal string (the `DynamicNamespace[baz]` case).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentTarget {
    Path(Vec<String>),
    Dynamic,
}

#[derive(Debug, Clone)]
pub enum AssignmentValue {
    /// `{}` or `{ key: value, ... }` — a namespace/behavior object literal.
    /// Nested plain-identifier keys are recorded as dotted child paths by
    /// the namespace scanner, not here; this just carries the raw keys.
    ObjectLiteral { keys: Vec<String> },
    /// `customElements.define(tagExpr, classExpr)`, or any other
    /// `callee(args...)` form.
    Call { callee: String, args: Vec<String> },
    Other,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub doc_comment: Option<String>,
    pub span: Span,
    pub kind: ClassMemberKind,
}

#[derive(Debug, Clone)]
pub enum ClassMemberKind {
    /// `static get is() { return 'tag-name'; }`.
    StaticGetterReturningString { name: String, value: String },
    /// `static get observedAttributes() { return ['a', 'b']; }`.
    StaticGetterReturningArray { name: String, values: Vec<(String, Option<String>)> },
    /// `static get behaviors() { return [MyBehaviorA, MyBehaviorB]; }` — an
    /// array of bare identifiers rather than string literals.
    StaticGetterReturningIdentifierArray { name: String, values: Vec<String> },
    Method { name: String },
}

fn offset(original: &str, remaining: &str) -> usize {
    original.len() - remaining.len()
}

pub fn parse_module(input: &str) -> Result<JsModule, String> {
    let mut cursor = input;
    let mut statements = Vec::new();
    loop {
        skip_trivia_no_doc(&mut cursor);
        if cursor.trim().is_empty() {
            break;
        }
        match parse_statement(input, &mut cursor) {
            Ok(stmt) => statements.push(stmt),
            Err(_) => {
                // Skip one character and resynchronize rather than abort
                // the whole module on one unrecognized construct.
                let mut chars = cursor.chars();
                if chars.next().is_some() {
                    cursor = chars.as_str();
                } else {
                    break;
                }
            }
        }
    }
    Ok(JsModule { statements })
}

fn skip_trivia_no_doc(cursor: &mut &str) {
    loop {
        let before = cursor.len();
        *cursor = cursor.trim_start();
        if cursor.starts_with("//") {
            if let Some(end) = cursor.find('\n') {
                *cursor = &cursor[end + 1..];
            } else {
                *cursor = "";
            }
        } else if cursor.starts_with("/*") {
            if let Some(end) = cursor.find("*/") {
                *cursor = &cursor[end + 2..];
            } else {
                *cursor = "";
            }
        }
        if cursor.len() == before {
            break;
        }
    }
}

/// Consumes leading whitespace and comments, returning the text of the last
/// block comment seen (the JSDoc attached to whatever follows), or `None`.
fn take_doc_comment(cursor: &mut &str) -> Option<String> {
    let mut doc = None;
    loop {
        let before = cursor.len();
        *cursor = cursor.trim_start();
        if cursor.starts_with("//") {
            if let Some(end) = cursor.find('\n') {
                *cursor = &cursor[end + 1..];
            } else {
                *cursor = "";
            }
        } else if cursor.starts_with("/*") {
            if let Some(end) = cursor.find("*/") {
                doc = Some(cursor[2..end].to_string());
                *cursor = &cursor[end + 2..];
            } else {
                *cursor = "";
            }
        }
        if cursor.len() == before {
            break;
        }
    }
    doc
}

fn parse_statement(original: &str, cursor: &mut &str) -> ModalResult<JsStatement> {
    let doc_comment = take_doc_comment(cursor);
    let start = offset(original, cursor);

    if let Ok(class) = parse_class_decl(cursor) {
        let end = offset(original, cursor);
        return Ok(JsStatement {
            doc_comment,
            span: Span::new(start, end),
            kind: class,
        });
    }
    if let Ok(func) = parse_function_decl(cursor) {
        let end = offset(original, cursor);
        return Ok(JsStatement {
            doc_comment,
            span: Span::new(start, end),
            kind: func,
        });
    }
    if let Ok(assign) = parse_assignment(cursor) {
        let end = offset(original, cursor);
        return Ok(JsStatement {
            doc_comment,
            span: Span::new(start, end),
            kind: assign,
        });
    }
    if let Ok(AssignmentValue::Call { callee, args }) = parse_call(cursor) {
        let _ = opt(';').parse_next(cursor);
        let end = offset(original, cursor);
        return Ok(JsStatement {
            doc_comment,
            span: Span::new(start, end),
            kind: JsStatementKind::Call { callee, args },
        });
    }

    // Fall through: consume one statement-ish chunk up to `;` or a balanced
    // `{ ... }` block so the cursor still advances.
    skip_one_statement(cursor)?;
    let end = offset(original, cursor);
    Ok(JsStatement {
        doc_comment,
        span: Span::new(start, end),
        kind: JsStatementKind::Other,
    })
}

fn identifier(cursor: &mut &str) -> ModalResult<String> {
    let _ = multispace0.parse_next(cursor)?;
    let ident: &str = take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '$')
        .parse_next(cursor)?;
    Ok(ident.to_string())
}

fn literal(tag: &'static str) -> impl Fn(&mut &str) -> ModalResult<&'static str> {
    move |cursor: &mut &str| {
        let _ = multispace0.parse_next(cursor)?;
        if cursor.starts_with(tag) {
            let following_ok = {
                let after = &cursor[tag.len()..];
                !tag.chars().last().unwrap().is_alphanumeric()
                    || !after.starts_with(|c: char| c.is_alphanumeric() || c == '_')
            };
            if following_ok {
                *cursor = &cursor[tag.len()..];
                return Ok(tag);
            }
        }
        Err(ErrMode::from_input(cursor))
    }
}

fn skip_balanced_braces(cursor: &mut &str) -> ModalResult<String> {
    let _ = multispace0.parse_next(cursor)?;
    if !cursor.starts_with('{') {
        return Err(ErrMode::from_input(cursor));
    }
    let bytes = cursor.as_bytes();
    let mut depth = 0i32;
    let mut idx = 0usize;
    let mut in_string: Option<u8> = None;
    while idx < bytes.len() {
        let b = bytes[idx];
        if let Some(quote) = in_string {
            if b == b'\\' {
                idx += 1;
            } else if b == quote {
                in_string = None;
            }
        } else {
            match b {
                b'"' | b'\'' | b'`' => in_string = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let body = cursor[1..idx].to_string();
                        *cursor = &cursor[idx + 1..];
                        return Ok(body);
                    }
                }
                _ => {}
            }
        }
        idx += 1;
    }
    Err(ErrMode::from_input(cursor))
}

fn skip_one_statement(cursor: &mut &str) -> ModalResult<()> {
    let _ = multispace0.parse_next(cursor)?;
    if cursor.starts_with('{') {
        skip_balanced_braces(cursor)?;
        return Ok(());
    }
    if cursor.is_empty() {
        return Err(ErrMode::from_input(cursor));
    }
    let mut depth = 0i32;
    for (idx, ch) in cursor.char_indices() {
        match ch {
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            ';' if depth <= 0 => {
                *cursor = &cursor[idx + 1..];
                return Ok(());
            }
            _ => {}
        }
    }
    *cursor = "";
    Ok(())
}

fn parse_class_decl(cursor: &mut &str) -> ModalResult<JsStatementKind> {
    let checkpoint = *cursor;
    // `const Name = class [extends Super] { ... }` or `class Name [extends Super] { ... }`
    let bound_name = if literal("class")(cursor).is_err() {
        let is_decl = opt(alt((literal("const"), literal("let"), literal("var"))))
            .parse_next(cursor)?
            .is_some();
        if !is_decl {
            *cursor = checkpoint;
            return Err(ErrMode::from_input(cursor));
        }
        let name = identifier(cursor)?;
        let _ = multispace0.parse_next(cursor)?;
        '='.parse_next(cursor)?;
        literal("class")(cursor)?;
        Some(name)
    } else {
        None
    };

    let _ = multispace0.parse_next(cursor)?;
    let inline_name = opt(identifier).parse_next(cursor)?;
    let name = bound_name.or(inline_name);

    let extends = opt(|c: &mut &str| -> ModalResult<String> {
        literal("extends")(c)?;
        identifier(c)
    })
    .parse_next(cursor)?;

    let body = skip_balanced_braces(cursor)?;
    let members = parse_class_members(&body);

    Ok(JsStatementKind::Class {
        name,
        extends,
        members,
    })
}

fn parse_class_members(body: &str) -> Vec<ClassMember> {
    let mut members = Vec::new();
    let mut cursor = body;
    loop {
        let doc = take_doc_comment(&mut cursor);
        cursor = cursor.trim_start();
        if cursor.is_empty() {
            break;
        }
        let start = body.len() - cursor.len();
        let is_static = {
            let save = cursor;
            if literal("static")(&mut cursor).is_ok() {
                true
            } else {
                cursor = save;
                false
            }
        };
        let is_getter = {
            let save = cursor;
            if literal("get")(&mut cursor).is_ok() {
                true
            } else {
                cursor = save;
                false
            }
        };
        let name = match identifier(&mut cursor) {
            Ok(n) => n,
            Err(_) => {
                // Can't make sense of this member; skip to next `}`-closing
                // method body or give up on the rest of the class.
                if skip_one_statement(&mut cursor).is_err() {
                    break;
                }
                continue;
            }
        };
        let _ = multispace0.parse_next(&mut cursor);
        if cursor.starts_with('(') {
            // method or getter body: `name(...) { ... }`
            if let Some(paren_end) = cursor.find(')') {
                cursor = &cursor[paren_end + 1..];
            }
            let member_body = skip_balanced_braces(&mut cursor).unwrap_or_default();
            let end = body.len() - cursor.len();
            let span = Span::new(start, end);
            if is_static && is_getter {
                if let Some(returned) = extract_return_string_literal(&member_body) {
                    members.push(ClassMember {
                        doc_comment: doc,
                        span,
                        kind: ClassMemberKind::StaticGetterReturningString {
                            name,
                            value: returned,
                        },
                    });
                    continue;
                }
                if let Some(values) = extract_return_string_array(&member_body) {
                    members.push(ClassMember {
                        doc_comment: doc,
                        span,
                        kind: ClassMemberKind::StaticGetterReturningArray { name, values },
                    });
                    continue;
                }
                if let Some(values) = extract_return_identifier_array(&member_body) {
                    members.push(ClassMember {
                        doc_comment: doc,
                        span,
                        kind: ClassMemberKind::StaticGetterReturningIdentifierArray { name, values },
                    });
                    continue;
                }
            }
            members.push(ClassMember {
                doc_comment: doc,
                span,
                kind: ClassMemberKind::Method { name },
            });
        } else {
            // class field: skip to `;` or newline-terminated expression.
            let _ = skip_one_statement(&mut cursor);
        }
    }
    members
}

fn extract_return_string_literal(body: &str) -> Option<String> {
    let idx = body.find("return")?;
    let rest = body[idx + "return".len()..].trim_start();
    let quote = rest.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let end = rest[1..].find(quote)? + 1;
    Some(rest[1..end].to_string())
}

/// Same shape as a `return [...]` array, but every entry is a bare
/// (dotted-path-capable) identifier such as `Polymer.IronResizableBehavior`
/// rather than a quoted string. Returns `None` if the array is empty or any
/// entry is quoted, so callers can fall back to the string-array reading.
fn extract_return_identifier_array(body: &str) -> Option<Vec<String>> {
    let idx = body.find("return")?;
    let rest = body[idx + "return".len()..].trim_start();
    if !rest.starts_with('[') {
        return None;
    }
    let end = rest.find(']')?;
    let inner = &rest[1..end];
    let values: Vec<String> = inner
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if values.is_empty() || values.iter().any(|v| v.starts_with(['\'', '"'])) {
        return None;
    }
    Some(values)
}

fn extract_return_string_array(body: &str) -> Option<Vec<(String, Option<String>)>> {
    let idx = body.find("return")?;
    let rest = body[idx + "return".len()..].trim_start();
    if !rest.starts_with('[') {
        return None;
    }
    let end = rest.find(']')?;
    let inner = &rest[1..end];
    let mut values = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let quote = item.chars().next()?;
        if quote == '\'' || quote == '"' {
            if let Some(close) = item[1..].rfind(quote) {
                values.push((item[1..=close].trim_end_matches(quote).to_string(), None));
            }
        }
    }
    Some(values)
}

fn parse_function_decl(cursor: &mut &str) -> ModalResult<JsStatementKind> {
    literal("function")(cursor)?;
    let name = identifier(cursor)?;
    let _ = multispace0.parse_next(cursor)?;
    let params_src = delimited('(', take_till(0.., |c| c == ')'), ')').parse_next(cursor)?;
    let params: Vec<String> = params_src
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    skip_balanced_braces(cursor)?;
    Ok(JsStatementKind::Function { name, params })
}

fn parse_assignment(cursor: &mut &str) -> ModalResult<JsStatementKind> {
    let checkpoint = *cursor;
    let _ = opt(alt((literal("const"), literal("let"), literal("var")))).parse_next(cursor)?;
    let target = parse_assignment_target(cursor)?;
    let _ = multispace0.parse_next(cursor)?;
    if !cursor.starts_with('=') || cursor.starts_with("==") {
        *cursor = checkpoint;
        return Err(ErrMode::from_input(cursor));
    }
    *cursor = &cursor[1..];
    let _ = multispace0.parse_next(cursor)?;

    let value = if cursor.starts_with('{') {
        let body = skip_balanced_braces(cursor)?;
        AssignmentValue::ObjectLiteral {
            keys: top_level_object_keys(&body),
        }
    } else if let Ok(call) = parse_call(cursor) {
        call
    } else {
        skip_one_statement(cursor)?;
        AssignmentValue::Other
    };
    let _ = opt(';').parse_next(cursor)?;
    Ok(JsStatementKind::Assignment { target, value })
}

fn parse_assignment_target(cursor: &mut &str) -> ModalResult<AssignmentTarget> {
    let mut path = vec![identifier(cursor)?];
    loop {
        let save = *cursor;
        if opt('.').parse_next(cursor)?.is_some() {
            path.push(identifier(cursor)?);
            continue;
        }
        *cursor = save;
        if cursor.starts_with('[') {
            let inner = delimited('[', take_till(0.., |c| c == ']'), ']').parse_next(cursor)?;
            let inner = inner.trim();
            if (inner.starts_with('"') && inner.ends_with('"') && inner.len() >= 2)
                || (inner.starts_with('\'') && inner.ends_with('\'') && inner.len() >= 2)
            {
                path.push(inner[1..inner.len() - 1].to_string());
                continue;
            }
            return Ok(AssignmentTarget::Dynamic);
        }
        break;
    }
    Ok(AssignmentTarget::Path(path))
}

fn parse_call(cursor: &mut &str) -> ModalResult<AssignmentValue> {
    let checkpoint = *cursor;
    let mut callee = vec![identifier(cursor)?];
    loop {
        let save = *cursor;
        if opt('.').parse_next(cursor)?.is_some() {
            callee.push(identifier(cursor)?);
            continue;
        }
        *cursor = save;
        break;
    }
    let _ = multispace0.parse_next(cursor)?;
    if !cursor.starts_with('(') {
        *cursor = checkpoint;
        return Err(ErrMode::from_input(cursor));
    }
    let args_src = delimited('(', balanced_parens_body, ')').parse_next(cursor)?;
    let args: Vec<String> = split_top_level_commas(args_src)
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let _ = opt(';').parse_next(cursor)?;
    Ok(AssignmentValue::Call {
        callee: callee.join("."),
        args,
    })
}

fn balanced_parens_body<'a>(cursor: &mut &'a str) -> ModalResult<&'a str> {
    let bytes = cursor.as_bytes();
    let mut depth = 1i32;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let body = &cursor[..idx];
                    *cursor = &cursor[idx..];
                    return Ok(body);
                }
            }
            _ => {}
        }
    }
    Err(ErrMode::from_input(cursor))
}

fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn top_level_object_keys(body: &str) -> Vec<String> {
    split_top_level_commas(body)
        .into_iter()
        .filter_map(|entry| entry.split(':').next())
        .map(|k| k.trim().trim_matches(['"', '\'']).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_polymer_class_with_static_is() {
        let src = r#"
/** @polymerElement */
class El {
  static get is() { return 'x-el'; }
}
"#;
        let module = parse_module(src).unwrap();
        assert_eq!(module.statements.len(), 1);
        match &module.statements[0].kind {
            JsStatementKind::Class { name, members, .. } => {
                assert_eq!(name.as_deref(), Some("El"));
                assert!(members.iter().any(|m| matches!(
                    &m.kind,
                    ClassMemberKind::StaticGetterReturningString { value, .. } if value == "x-el"
                )));
            }
            other => panic!("expected class, got {:?}", other),
        }
        assert!(module.statements[0]
            .doc_comment
            .as_deref()
            .unwrap()
            .contains("@polymerElement"));
    }

    #[test]
    fn parses_namespace_assignment() {
        let src = "/** @namespace */ var Foo = {}; Foo.Bar = { baz: 1 };";
        let module = parse_module(src).unwrap();
        assert_eq!(module.statements.len(), 2);
        match &module.statements[0].kind {
            JsStatementKind::Assignment { target, .. } => {
                assert_eq!(target, &AssignmentTarget::Path(vec!["Foo".to_string()]));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
        match &module.statements[1].kind {
            JsStatementKind::Assignment { target, .. } => {
                assert_eq!(
                    target,
                    &AssignmentTarget::Path(vec!["Foo".to_string(), "Bar".to_string()])
                );
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn parses_dynamic_namespace_subscript() {
        let src = "DynamicNamespace[baz] = { foo: 'bar' };";
        let module = parse_module(src).unwrap();
        match &module.statements[0].kind {
            JsStatementKind::Assignment { target, .. } => {
                assert_eq!(target, &AssignmentTarget::Dynamic);
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn parses_behaviors_identifier_array() {
        let src = r#"
class XFoo {
  static get behaviors() { return [MyBehaviorA, Polymer.IronResizableBehavior]; }
}
"#;
        let module = parse_module(src).unwrap();
        match &module.statements[0].kind {
            JsStatementKind::Class { members, .. } => {
                assert!(members.iter().any(|m| matches!(
                    &m.kind,
                    ClassMemberKind::StaticGetterReturningIdentifierArray { name, values }
                        if name == "behaviors"
                        && values == &vec!["MyBehaviorA".to_string(), "Polymer.IronResizableBehavior".to_string()]
                )));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn parses_custom_elements_define_call() {
        let src = "customElements.define('x-foo', XFoo);";
        let module = parse_module(src).unwrap();
        match &module.statements[0].kind {
            JsStatementKind::Call { callee, args } => {
                assert_eq!(callee, "customElements.define");
                assert_eq!(args, &vec!["'x-foo'".to_string(), "XFoo".to_string()]);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }
}
