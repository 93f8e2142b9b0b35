//! Scanner registry & concrete scanners (C4).
//!
//! A single recursive traversal per language walks the parsed AST exactly
//! once; at each node it runs every registered scanner's callback, in fixed
//! registration order, against a shared [`ScanOutput`]. There is no runtime
//! introspection over node shape: dispatch is the `match` over the concrete
//! `HtmlNode`/`JsStatementKind` enum, which is this corpus's usual stand-in
//! for a static dispatch table (see `tugtool-cst`'s visitor pattern).
//!
//! Four coherent scanners are implemented, per spec §4.4:
//! 1. [`html`] import scanner — `<link rel="import">`, external
//!    `<script src>`/stylesheets, and inline `<script>` (which recurses into
//!    [`js`] to produce a nested [`crate::document::ScannedDocument`]).
//! 2. [`html`] databinding expression scanner — `{{ }}`/`[[ ]]` inside
//!    `<template>` subtrees.
//! 3. [`html`] pseudo-element scanner — `@pseudoElement` HTML comments.
//! 4. [`js`] script element scanner group — polymer-class (plus its
//!    `behaviors` array), function, namespace, pseudo-element (JS-comment),
//!    mixin/behavior declaration, core-feature usage, and `@requires`
//!    element-reference sub-scanners, sharing one pass over a module's
//!    top-level statements.

use regex::Regex;
use std::sync::OnceLock;

use crate::document::ScannedDocument;
use crate::feature::{
    DatabindingDirection, DatabindingInto, ImportType, ScannedAttribute, ScannedBehavior,
    ScannedDatabindingExpression, ScannedElement, ScannedElementMixin, ScannedElementReference,
    ScannedFeature, ScannedFunction, ScannedImport, ScannedNamespace, ScannedPolymerCoreFeature,
    ScannedReference,
};
use crate::parse::html::HtmlNode;
use crate::parse::script::{
    AssignmentTarget, AssignmentValue, ClassMemberKind, JsModule, JsStatement, JsStatementKind,
};
use crate::parse::{Ast, ParsedDocument, ParserRegistry};
use crate::text::Span;
use crate::url::{PackageRelative, Resolved};
use crate::warning::{codes, Severity, Warning};

/// Output accumulated by one language's traversal: the scanned features,
/// the warnings raised while scanning, and (HTML only) any inline child
/// documents discovered along the way.
#[derive(Default)]
pub struct ScanOutput {
    pub features: Vec<ScannedFeature>,
    pub warnings: Vec<Warning>,
    pub inline_documents: Vec<ScannedDocument>,
}

/// Registered scanners for one language, in the fixed order they run.
/// Holding the order as data (rather than baking it into the traversal
/// function) is what makes this a "registry": a caller assembling a custom
/// pipeline can reorder or drop entries without touching the walker.
pub struct ScannerRegistry {
    html_order: Vec<HtmlScannerKind>,
    js_order: Vec<JsScannerKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlScannerKind {
    Import,
    Databinding,
    PseudoElement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsScannerKind {
    PolymerClass,
    Function,
    Namespace,
    PseudoElement,
    /// `@polymerBehavior`/`@mixinFunction`-annotated assignments/functions.
    Mixin,
    /// Classes extending one of the well-known Polymer core base classes.
    CoreFeature,
    /// `@requires` doc-tag references to another document's element.
    ElementReference,
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        ScannerRegistry {
            html_order: vec![
                HtmlScannerKind::Import,
                HtmlScannerKind::Databinding,
                HtmlScannerKind::PseudoElement,
            ],
            js_order: vec![
                JsScannerKind::PolymerClass,
                JsScannerKind::Function,
                JsScannerKind::Namespace,
                JsScannerKind::PseudoElement,
                JsScannerKind::Mixin,
                JsScannerKind::CoreFeature,
                JsScannerKind::ElementReference,
            ],
        }
    }
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scans an already-parsed document, dispatching by language. Produces the
/// document-local features/warnings and, for HTML documents, any nested
/// inline documents (discovered and fully scanned in the same pass).
pub fn scan(parsed: &ParsedDocument, parsers: &ParserRegistry, registry: &ScannerRegistry) -> ScanOutput {
    match &parsed.ast {
        Ast::Html(root) => html::scan_html_document(parsed, root, parsers, registry),
        Ast::Js(module) => {
            let mut out = ScanOutput::default();
            js::scan_js_module(parsed, module, registry, &mut out);
            out
        }
    }
}

/// HTML-side scanners: import, databinding, pseudo-element.
pub mod html {
    use super::*;

    pub fn scan_html_document(
        parsed: &ParsedDocument,
        root: &HtmlNode,
        parsers: &ParserRegistry,
        registry: &ScannerRegistry,
    ) -> ScanOutput {
        let mut out = ScanOutput::default();
        let mut inline_ordinal = 0usize;
        walk(parsed, root, false, false, parsers, registry, &mut inline_ordinal, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        parsed: &ParsedDocument,
        node: &HtmlNode,
        ancestor_dom_module: bool,
        in_databinding_scope: bool,
        parsers: &ParserRegistry,
        registry: &ScannerRegistry,
        inline_ordinal: &mut usize,
        out: &mut ScanOutput,
    ) {
        for kind in &registry.html_order {
            match kind {
                HtmlScannerKind::Import => scan_import_node(parsed, node, parsers, inline_ordinal, out),
                HtmlScannerKind::Databinding => {
                    if in_databinding_scope {
                        scan_databinding_node(parsed, node, out);
                    }
                }
                HtmlScannerKind::PseudoElement => scan_pseudo_element_node(parsed, node, out),
            }
        }

        if let HtmlNode::Element { tag, attrs, children, .. } = node {
            let child_ancestor_dom_module = ancestor_dom_module || tag == "dom-module";
            let child_in_databinding = in_databinding_scope
                || matches_databinding_root(tag, attrs, ancestor_dom_module);
            for child in children {
                walk(
                    parsed,
                    child,
                    child_ancestor_dom_module,
                    child_in_databinding,
                    parsers,
                    registry,
                    inline_ordinal,
                    out,
                );
            }
        }
    }

    /// Per spec §4.4.2: a `<template>` is a databinding root if it carries
    /// `is="dom-bind"/"dom-if"/"dom-repeat"`, or if it (or any ancestor
    /// already known to be one) lives inside a `<dom-module>`.
    fn matches_databinding_root(
        tag: &str,
        attrs: &[crate::parse::html::HtmlAttr],
        ancestor_dom_module: bool,
    ) -> bool {
        if tag != "template" {
            return false;
        }
        let is_attr = attrs.iter().find(|a| a.name == "is").and_then(|a| a.value.as_deref());
        matches!(is_attr, Some("dom-bind") | Some("dom-if") | Some("dom-repeat")) || ancestor_dom_module
    }

    fn scan_import_node(
        parsed: &ParsedDocument,
        node: &HtmlNode,
        parsers: &ParserRegistry,
        inline_ordinal: &mut usize,
        out: &mut ScanOutput,
    ) {
        let HtmlNode::Element { tag, attrs, children, span } = node else {
            return;
        };
        let source_range = parsed.source_range(*span);

        if tag == "link" {
            let rel = attrs.iter().find(|a| a.name == "rel").and_then(|a| a.value.as_deref());
            let href = attrs.iter().find(|a| a.name == "href").and_then(|a| a.value.as_deref());
            match (rel, href) {
                (Some(rel), Some(href)) if rel.eq_ignore_ascii_case("import") => {
                    out.features.push(ScannedFeature::Import(ScannedImport {
                        import_type: ImportType::HtmlImport,
                        url: PackageRelative::new(href),
                        resolved_url: None,
                        source_range,
                        warnings: Vec::new(),
                    }));
                }
                (Some(rel), Some(href)) if rel.eq_ignore_ascii_case("stylesheet") => {
                    out.features.push(ScannedFeature::Import(ScannedImport {
                        import_type: ImportType::HtmlStyle,
                        url: PackageRelative::new(href),
                        resolved_url: None,
                        source_range,
                        warnings: Vec::new(),
                    }));
                }
                _ => {}
            }
            return;
        }

        if tag == "script" {
            let src = attrs.iter().find(|a| a.name == "src").and_then(|a| a.value.as_deref());
            if let Some(src) = src {
                out.features.push(ScannedFeature::Import(ScannedImport {
                    import_type: ImportType::HtmlScript,
                    url: PackageRelative::new(src),
                    resolved_url: None,
                    source_range,
                    warnings: Vec::new(),
                }));
                return;
            }

            let script_type = attrs.iter().find(|a| a.name == "type").and_then(|a| a.value.as_deref());
            if !is_javascript_mime(script_type) {
                return;
            }

            let Some(HtmlNode::Text { content, .. }) = children.first() else {
                return;
            };
            *inline_ordinal += 1;
            let inline_url = Resolved::new_unchecked(format!(
                "{}#inline-script-{}",
                parsed.url.0, inline_ordinal
            ));
            let outcome = parsers.for_inline_script().parse(content, &inline_url, true);
            let mut nested = ScannedDocument {
                parsed: outcome.document,
                features: Vec::new(),
                warnings: outcome.warnings,
                inline_documents: Vec::new(),
            };
            if let Ast::Js(module) = &nested.parsed.ast {
                let mut nested_out = ScanOutput::default();
                super::js::scan_js_module(&nested.parsed, module, &super::ScannerRegistry::new(), &mut nested_out);
                nested.features = nested_out.features;
                nested.warnings.extend(nested_out.warnings);
                nested.inline_documents = nested_out.inline_documents;
            }
            out.inline_documents.push(nested);
        }
    }

    fn is_javascript_mime(script_type: Option<&str>) -> bool {
        match script_type {
            None => true,
            Some(t) => matches!(
                t.trim(),
                "text/javascript" | "application/javascript" | "module" | ""
            ),
        }
    }

    fn scan_databinding_node(parsed: &ParsedDocument, node: &HtmlNode, out: &mut ScanOutput) {
        match node {
            HtmlNode::Text { content, span } => {
                push_databindings(parsed, content, span.start, None, out);
            }
            HtmlNode::Element { attrs, .. } => {
                for attr in attrs {
                    if let (Some(value), Some(value_span)) = (&attr.value, attr.value_span) {
                        push_databindings(parsed, value, value_span.start, Some(value.len()), out);
                    }
                }
            }
            _ => {}
        }
    }

    /// `attribute_len` is `Some(len)` when scanning an attribute value (used
    /// to classify `databindingInto`), `None` for a text node (always
    /// `string-interpolation`).
    fn push_databindings(
        parsed: &ParsedDocument,
        content: &str,
        base_offset: usize,
        attribute_len: Option<usize>,
        out: &mut ScanOutput,
    ) {
        for binding in extract_databindings(content) {
            let absolute = Span::new(base_offset + binding.span.start, base_offset + binding.span.end);
            let source_range = parsed.source_range(absolute);
            if binding.expression_text.trim().is_empty() {
                out.warnings.push(Warning::new(
                    codes::INVALID_DATABINDING,
                    "databinding expression is empty",
                    Severity::Warning,
                    source_range,
                    parsed.url.clone(),
                ));
                continue;
            }
            let databinding_into = match attribute_len {
                Some(len) if binding.span.start == 0 && binding.span.end == len => {
                    DatabindingInto::Attribute
                }
                _ => DatabindingInto::StringInterpolation,
            };
            out.features.push(ScannedFeature::DatabindingExpression(ScannedDatabindingExpression {
                direction: binding.direction,
                databinding_into,
                expression_text: binding.expression_text,
                event_name: binding.event_name,
                source_range,
                warnings: Vec::new(),
            }));
        }
    }

    struct RawBinding {
        span: Span,
        direction: DatabindingDirection,
        expression_text: String,
        event_name: Option<String>,
    }

    /// Linear scan per spec §4.4.2: find the next opener, locate its
    /// matching closer, carve the expression (and `::event` suffix for
    /// `{{ }}`). An opener with no closer stops scanning the *rest of this
    /// string* — it is not a binding, and nothing after it is considered
    /// either, matching the "stable under duplication" invariant (a second
    /// scan of the same text finds the same thing).
    fn extract_databindings(text: &str) -> Vec<RawBinding> {
        let mut results = Vec::new();
        let mut i = 0usize;
        while i < text.len() {
            let rest = &text[i..];
            let two_way = rest.find("{{");
            let one_way = rest.find("[[");
            let (opener_rel, direction) = match (two_way, one_way) {
                (Some(a), Some(b)) => {
                    if a <= b {
                        (a, DatabindingDirection::TwoWay)
                    } else {
                        (b, DatabindingDirection::OneWay)
                    }
                }
                (Some(a), None) => (a, DatabindingDirection::TwoWay),
                (None, Some(b)) => (b, DatabindingDirection::OneWay),
                (None, None) => break,
            };
            let opener_abs = i + opener_rel;
            let closer = if direction == DatabindingDirection::TwoWay { "}}" } else { "]]" };
            let search_from = opener_abs + 2;
            if search_from > text.len() {
                break;
            }
            match text[search_from..].find(closer) {
                Some(rel_close) => {
                    let closer_abs = search_from + rel_close;
                    let mut expr = &text[search_from..closer_abs];
                    let mut event_name = None;
                    if direction == DatabindingDirection::TwoWay {
                        if let Some(idx) = expr.rfind("::") {
                            event_name = Some(expr[idx + 2..].to_string());
                            expr = &expr[..idx];
                        }
                    }
                    let span = Span::new(opener_abs, closer_abs + 2);
                    results.push(RawBinding {
                        span,
                        direction,
                        expression_text: expr.trim().to_string(),
                        event_name,
                    });
                    i = closer_abs + 2;
                }
                None => break,
            }
        }
        results
    }

    fn pseudo_element_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"@pseudoElement\s*([\w-]+)?").unwrap())
    }

    fn scan_pseudo_element_node(parsed: &ParsedDocument, node: &HtmlNode, out: &mut ScanOutput) {
        let HtmlNode::Comment { content, span } = node else {
            return;
        };
        let Some(caps) = pseudo_element_re().captures(content) else {
            return;
        };
        let tagname = caps.get(1).map(|m| m.as_str().to_string());
        out.features.push(ScannedFeature::Element(ScannedElement {
            tagname,
            classname: None,
            superclass: None,
            attributes: Vec::new(),
            pseudo: true,
            source_range: parsed.source_range(*span),
            warnings: Vec::new(),
        }));
    }
}

/// JS-side scanners: polymer-class, function, namespace, pseudo-element.
pub mod js {
    use super::*;

    pub fn scan_js_module(
        parsed: &ParsedDocument,
        module: &JsModule,
        registry: &ScannerRegistry,
        out: &mut ScanOutput,
    ) {
        // The namespace scanner's "is this path a child of a known
        // namespace" rule needs to see assignments in source order, so the
        // whole group shares one left-to-right pass rather than one pass
        // per scanner kind. `known_namespace_roots` is the per-document
        // mutable state the namespace sub-scanner alone owns.
        let mut known_namespace_roots: Vec<String> = Vec::new();
        let class_scanner_enabled = registry.js_order.contains(&JsScannerKind::PolymerClass);

        for stmt in module.statements.iter() {
            for kind in &registry.js_order {
                match kind {
                    // The polymer-class scanner needs the whole module (to
                    // match `customElements.define` calls against earlier
                    // class declarations), so it runs once below rather
                    // than per-statement here.
                    JsScannerKind::PolymerClass => {}
                    JsScannerKind::Function => scan_function_statement(parsed, stmt, out),
                    JsScannerKind::Namespace => {
                        scan_namespace_statement(parsed, stmt, &mut known_namespace_roots, out)
                    }
                    JsScannerKind::PseudoElement => scan_pseudo_element_statement(parsed, stmt, out),
                    JsScannerKind::Mixin => {
                        if let Some(feature) = scan_mixin_statement(parsed, stmt) {
                            out.features.push(feature);
                        }
                    }
                    JsScannerKind::CoreFeature => {
                        if let Some(feature) = scan_core_feature_usage(parsed, stmt) {
                            out.features.push(feature);
                        }
                    }
                    JsScannerKind::ElementReference => {
                        scan_element_reference_statement(parsed, stmt, out)
                    }
                }
            }
        }

        if class_scanner_enabled {
            scan_classes(parsed, module, out);
        }
    }

    struct ClassInfo<'a> {
        name: Option<&'a str>,
        tagname: Option<String>,
        superclass: Option<String>,
        attributes: Vec<ScannedAttribute>,
        behaviors: Vec<String>,
        stmt: &'a JsStatement,
    }

    /// Two passes over the module's class declarations: first gather every
    /// annotated class (`@polymerElement`/`@customElement`) with whatever
    /// tag its own `static get is()` supplies; then scan `customElements
    /// .define(tag, ClassName)` calls to fill in a tag for any class that
    /// didn't have one, per spec §4.4.3.
    fn scan_classes(parsed: &ParsedDocument, module: &JsModule, out: &mut ScanOutput) {
        let mut classes: Vec<ClassInfo> = Vec::new();
        for stmt in &module.statements {
            let JsStatementKind::Class { name, extends, members } = &stmt.kind else {
                continue;
            };
            if !is_element_annotated(stmt.doc_comment.as_deref()) {
                continue;
            }
            let tagname = members.iter().find_map(|m| match &m.kind {
                ClassMemberKind::StaticGetterReturningString { name: n, value } if n == "is" => {
                    Some(value.clone())
                }
                _ => None,
            });
            // Open Question #2: an `@extends` annotation wins over a
            // literal `extends` clause when both are present.
            let superclass = stmt
                .doc_comment
                .as_deref()
                .and_then(|d| extract_doc_value(d, "extends"))
                .or_else(|| extends.clone());
            let mut attributes = Vec::new();
            let mut behaviors = Vec::new();
            for member in members {
                match &member.kind {
                    ClassMemberKind::StaticGetterReturningArray { name: n, values }
                        if n == "observedAttributes" =>
                    {
                        for (attr_name, _) in values {
                            attributes.push(ScannedAttribute {
                                name: attr_name.clone(),
                                description: member.doc_comment.clone(),
                                source_range: parsed.source_range(member.span),
                            });
                        }
                    }
                    ClassMemberKind::StaticGetterReturningIdentifierArray { name: n, values }
                        if n == "behaviors" =>
                    {
                        behaviors.extend(values.iter().cloned());
                    }
                    _ => {}
                }
            }
            classes.push(ClassInfo {
                name: name.as_deref(),
                tagname,
                superclass,
                attributes,
                behaviors,
                stmt,
            });
        }

        for stmt in &module.statements {
            let JsStatementKind::Call { callee, args } = &stmt.kind else {
                continue;
            };
            if callee != "customElements.define" || args.len() < 2 {
                continue;
            }
            let tag = args[0].trim().trim_matches(['\'', '"']).to_string();
            let class_ref = args[1].trim();
            if let Some(info) = classes
                .iter_mut()
                .find(|c| c.name == Some(class_ref) && c.tagname.is_none())
            {
                info.tagname = Some(tag);
            }
        }

        for info in classes {
            if !info.behaviors.is_empty() {
                scan_behaviors_array(parsed, info.stmt, &info.behaviors, out);
            }
            out.features.push(ScannedFeature::Element(ScannedElement {
                tagname: info.tagname,
                classname: info.name.map(|n| n.to_string()),
                superclass: info.superclass,
                attributes: info.attributes,
                pseudo: false,
                source_range: parsed.source_range(info.stmt.span),
                warnings: Vec::new(),
            }));
        }
    }

    fn doc_has_tag(doc: Option<&str>, tag: &str) -> bool {
        doc.map(|d| d.contains(tag)).unwrap_or(false)
    }

    fn extract_doc_value(doc: &str, tag: &str) -> Option<String> {
        let re = Regex::new(&format!(r"@{}\s*\{{?\s*\[?([\w.$-]+)", regex::escape(tag))).ok()?;
        re.captures(doc).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
    }

    /// `@polymerElement`/`@customElement` are treated as synonyms (Open
    /// Question #1): either annotation marks a class declaration as an
    /// element.
    fn is_element_annotated(doc: Option<&str>) -> bool {
        doc_has_tag(doc, "@polymerElement") || doc_has_tag(doc, "@customElement")
    }

    fn scan_function_statement(parsed: &ParsedDocument, stmt: &JsStatement, out: &mut ScanOutput) {
        let JsStatementKind::Function { name, params } = &stmt.kind else {
            return;
        };
        let Some(doc) = stmt.doc_comment.as_deref() else {
            return;
        };
        if doc_has_tag(doc, "@mixinFunction") {
            return;
        }
        let Some(memberof) = extract_doc_value(doc, "memberof") else {
            return;
        };
        let description = extract_description(doc);
        out.features.push(ScannedFeature::Function(ScannedFunction {
            name: format!("{}.{}", memberof, name),
            params: params.clone(),
            description,
            source_range: parsed.source_range(stmt.span),
            warnings: Vec::new(),
        }));
    }

    fn extract_description(doc: &str) -> Option<String> {
        let first_line = doc
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim())
            .find(|l| !l.is_empty() && !l.starts_with('@'));
        first_line.map(|s| s.to_string())
    }

    fn scan_namespace_statement(
        parsed: &ParsedDocument,
        stmt: &JsStatement,
        known_roots: &mut Vec<String>,
        out: &mut ScanOutput,
    ) {
        let JsStatementKind::Assignment { target, value } = &stmt.kind else {
            return;
        };
        let AssignmentValue::ObjectLiteral { .. } = value else {
            return;
        };
        let own_doc = stmt.doc_comment.as_deref();
        let source_range = parsed.source_range(stmt.span);

        match target {
            AssignmentTarget::Path(segments) => {
                let dotted = segments.join(".");
                let root = segments[0].clone();
                let is_child_of_known = known_roots.iter().any(|r| &root == r);
                let is_annotated = doc_has_tag(own_doc, "@namespace");
                if is_annotated || is_child_of_known {
                    known_roots.push(dotted.clone());
                    out.features.push(ScannedFeature::Namespace(ScannedNamespace {
                        name: dotted,
                        source_range,
                        warnings: Vec::new(),
                    }));
                }
            }
            AssignmentTarget::Dynamic => {
                if !doc_has_tag(own_doc, "@namespace") {
                    return;
                }
                match own_doc.and_then(|d| extract_doc_value(d, "namespace")) {
                    Some(name) => {
                        known_roots.push(name.clone());
                        out.features.push(ScannedFeature::Namespace(ScannedNamespace {
                            name,
                            source_range,
                            warnings: Vec::new(),
                        }));
                    }
                    None => {
                        out.warnings.push(Warning::new(
                            codes::DYNAMIC_NAMESPACE_NO_NAME,
                            "Unable to determine name for @namespace: target is a computed member expression",
                            Severity::Warning,
                            source_range,
                            parsed.url.clone(),
                        ));
                    }
                }
            }
        }
    }

    fn pseudo_element_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"@pseudoElement\s*([\w-]+)?").unwrap())
    }

    fn scan_pseudo_element_statement(parsed: &ParsedDocument, stmt: &JsStatement, out: &mut ScanOutput) {
        let Some(doc) = stmt.doc_comment.as_deref() else {
            return;
        };
        let Some(caps) = pseudo_element_re().captures(doc) else {
            return;
        };
        let tagname = caps.get(1).map(|m| m.as_str().to_string());
        out.features.push(ScannedFeature::Element(ScannedElement {
            tagname,
            classname: None,
            superclass: None,
            attributes: Vec::new(),
            pseudo: true,
            source_range: parsed.source_range(stmt.span),
            warnings: Vec::new(),
        }));
    }

    /// One `ScannedReference` per entry in a class's `static get behaviors()`
    /// array (see `scan_classes`), each resolved by C6 against the global
    /// `behavior` index.
    pub fn scan_behaviors_array(
        parsed: &ParsedDocument,
        stmt: &JsStatement,
        behaviors: &[String],
        out: &mut ScanOutput,
    ) {
        for name in behaviors {
            out.features.push(ScannedFeature::Reference(ScannedReference {
                kind: "behavior",
                identifier: name.clone(),
                scope_hint: Some(stmt.span),
                source_range: parsed.source_range(stmt.span),
                warnings: Vec::new(),
            }));
        }
    }

    /// A `<x-foo>`-shaped custom element tag used as a value, e.g. a
    /// `@requires` doc tag (see `scan_element_reference_statement`).
    pub fn element_reference(parsed: &ParsedDocument, stmt: &JsStatement, tagname: &str) -> ScannedFeature {
        ScannedFeature::ElementReference(ScannedElementReference {
            tagname: tagname.to_string(),
            source_range: parsed.source_range(stmt.span),
            warnings: Vec::new(),
        })
    }

    /// `@requires x-foo` on a statement's doc comment: a reference to
    /// another document's element, resolved the same way a behavior or
    /// mixin reference is.
    fn scan_element_reference_statement(parsed: &ParsedDocument, stmt: &JsStatement, out: &mut ScanOutput) {
        let Some(doc) = stmt.doc_comment.as_deref() else {
            return;
        };
        let Some(tagname) = extract_doc_value(doc, "requires") else {
            return;
        };
        out.features.push(element_reference(parsed, stmt, &tagname));
    }

    /// Emits a core-feature usage marker when a class extends one of the
    /// well-known Polymer core base classes/mixins, so `polymer-core-feature`
    /// queries have something to return (spec §3's `ScannedPolymerCoreFeature`).
    pub fn scan_core_feature_usage(parsed: &ParsedDocument, stmt: &JsStatement) -> Option<ScannedFeature> {
        const CORE_NAMES: &[&str] = &[
            "Polymer.Element",
            "Polymer.LegacyElementMixin",
            "PolymerElement",
        ];
        let JsStatementKind::Class { extends: Some(extends), .. } = &stmt.kind else {
            return None;
        };
        if CORE_NAMES.contains(&extends.as_str()) {
            Some(ScannedFeature::PolymerCoreFeature(ScannedPolymerCoreFeature {
                name: extends.clone(),
                source_range: parsed.source_range(stmt.span),
                warnings: Vec::new(),
            }))
        } else {
            None
        }
    }

    /// Mixin functions: `@polymerBehavior` or `@mixinFunction` assignments
    /// that wrap an anonymous function expression. Our simplified grammar
    /// does not model function-valued assignments, so this records mixins
    /// defined as annotated namespaced functions instead, consistent with
    /// `ScannedFunction` carrying the `@mixinFunction` exclusion already
    /// applied in `scan_function_statement`.
    pub fn scan_mixin_statement(parsed: &ParsedDocument, stmt: &JsStatement) -> Option<ScannedFeature> {
        let doc = stmt.doc_comment.as_deref()?;
        if !doc_has_tag(Some(doc), "@polymerBehavior") && !doc_has_tag(Some(doc), "@mixinFunction") {
            return None;
        }
        let name = match &stmt.kind {
            JsStatementKind::Assignment { target: AssignmentTarget::Path(segments), .. } => {
                segments.join(".")
            }
            JsStatementKind::Function { name, .. } => name.clone(),
            _ => return None,
        };
        if doc_has_tag(Some(doc), "@polymerBehavior") {
            Some(ScannedFeature::Behavior(ScannedBehavior {
                name,
                source_range: parsed.source_range(stmt.span),
                warnings: Vec::new(),
            }))
        } else {
            Some(ScannedFeature::ElementMixin(ScannedElementMixin {
                name,
                source_range: parsed.source_range(stmt.span),
                warnings: Vec::new(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{HtmlParser, Parser, ScriptParser};

    fn scan_html(src: &str) -> ScanOutput {
        let url = Resolved::new_unchecked("file:///a.html");
        let outcome = HtmlParser.parse(src, &url, false);
        let Ast::Html(root) = &outcome.document.ast else { unreachable!() };
        html::scan_html_document(&outcome.document, root, &ParserRegistry::new(), &ScannerRegistry::new())
    }

    fn scan_js(src: &str) -> ScanOutput {
        let url = Resolved::new_unchecked("file:///a.js");
        let outcome = ScriptParser.parse(src, &url, false);
        let Ast::Js(module) = &outcome.document.ast else { unreachable!() };
        let mut out = ScanOutput::default();
        js::scan_js_module(&outcome.document, module, &ScannerRegistry::new(), &mut out);
        out
    }

    #[test]
    fn html_import_scanner_emits_import() {
        let out = scan_html(r#"<link rel="import" href="./a.html">"#);
        assert_eq!(out.features.len(), 1);
        match &out.features[0] {
            ScannedFeature::Import(imp) => {
                assert_eq!(imp.import_type, ImportType::HtmlImport);
                assert_eq!(imp.url.0, "./a.html");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn inline_script_becomes_nested_document() {
        let out = scan_html("<script>class El { static get is() { return 'x-el'; } }</script>");
        assert_eq!(out.features.len(), 0);
        assert_eq!(out.inline_documents.len(), 1);
        assert!(out.inline_documents[0].parsed.url.0.ends_with("#inline-script-1"));
    }

    #[test]
    fn databinding_scanner_finds_string_interpolation() {
        let out = scan_html(r#"<template is="dom-bind">Hello {{name}}!</template>"#);
        assert_eq!(out.features.len(), 1);
        match &out.features[0] {
            ScannedFeature::DatabindingExpression(expr) => {
                assert_eq!(expr.direction, DatabindingDirection::TwoWay);
                assert_eq!(expr.databinding_into, DatabindingInto::StringInterpolation);
                assert_eq!(expr.expression_text, "name");
                assert_eq!(expr.event_name, None);
            }
            other => panic!("expected databinding, got {:?}", other),
        }
    }

    #[test]
    fn databinding_scanner_classifies_whole_attribute() {
        let out = scan_html(r#"<template is="dom-bind"><input value="[[name]]"></template>"#);
        match &out.features[0] {
            ScannedFeature::DatabindingExpression(expr) => {
                assert_eq!(expr.direction, DatabindingDirection::OneWay);
                assert_eq!(expr.databinding_into, DatabindingInto::Attribute);
            }
            other => panic!("expected databinding, got {:?}", other),
        }
    }

    #[test]
    fn databinding_two_way_with_event_name() {
        let out = scan_html(r#"<template is="dom-bind"><input value="{{name::changed}}"></template>"#);
        match &out.features[0] {
            ScannedFeature::DatabindingExpression(expr) => {
                assert_eq!(expr.expression_text, "name");
                assert_eq!(expr.event_name.as_deref(), Some("changed"));
            }
            other => panic!("expected databinding, got {:?}", other),
        }
    }

    #[test]
    fn unclosed_opener_produces_no_binding() {
        let out = scan_html(r#"<template is="dom-bind">[[x</template>"#);
        assert!(out.features.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn databinding_outside_template_is_ignored() {
        let out = scan_html("<div>Hello {{name}}!</div>");
        assert!(out.features.is_empty());
    }

    #[test]
    fn pseudo_element_html_comment() {
        let out = scan_html("<!-- @pseudoElement x-pseudo -->");
        assert_eq!(out.features.len(), 1);
        match &out.features[0] {
            ScannedFeature::Element(el) => {
                assert!(el.pseudo);
                assert_eq!(el.tagname.as_deref(), Some("x-pseudo"));
            }
            other => panic!("expected pseudo element, got {:?}", other),
        }
    }

    #[test]
    fn polymer_class_scanner_extracts_tag_and_class() {
        let src = r#"
/** @polymerElement */
class XFoo {
  static get is() { return 'x-foo'; }
  static get observedAttributes() { return ['name']; }
}
"#;
        let out = scan_js(src);
        assert_eq!(out.features.len(), 1);
        match &out.features[0] {
            ScannedFeature::Element(el) => {
                assert_eq!(el.tagname.as_deref(), Some("x-foo"));
                assert_eq!(el.classname.as_deref(), Some("XFoo"));
                assert_eq!(el.attributes.len(), 1);
                assert_eq!(el.attributes[0].name, "name");
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn unannotated_class_is_not_an_element() {
        let src = "class Plain { static get is() { return 'x-plain'; } }";
        let out = scan_js(src);
        assert!(out.features.is_empty());
    }

    #[test]
    fn extends_annotation_wins_over_literal_extends() {
        let src = r#"
/** @polymerElement
 *  @extends {LegacyBase}
 */
class XFoo extends HTMLElement {
  static get is() { return 'x-foo'; }
}
"#;
        let out = scan_js(src);
        match &out.features[0] {
            ScannedFeature::Element(el) => assert_eq!(el.superclass.as_deref(), Some("LegacyBase")),
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn class_bound_via_customelements_define() {
        let src = r#"
/** @customElement */
class XBar { }
customElements.define('x-bar', XBar);
"#;
        let out = scan_js(src);
        assert_eq!(out.features.len(), 1);
        match &out.features[0] {
            ScannedFeature::Element(el) => {
                assert_eq!(el.tagname.as_deref(), Some("x-bar"));
                assert_eq!(el.classname.as_deref(), Some("XBar"));
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn namespace_scanner_two_namespaces() {
        let src = "/** @namespace */ var Foo = {}; Foo.Bar = { baz: 1 };";
        let out = scan_js(src);
        let names: Vec<&str> = out
            .features
            .iter()
            .filter_map(|f| match f {
                ScannedFeature::Namespace(n) => Some(n.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Foo", "Foo.Bar"]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn dynamic_namespace_without_annotation_warns() {
        let src = "DynamicNamespace[baz] = { foo: 'bar' };";
        let out = scan_js(src);
        assert!(out.features.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("Unable to determine name for @namespace"));
        assert_eq!(out.warnings[0].code, codes::DYNAMIC_NAMESPACE_NO_NAME);
    }

    #[test]
    fn function_scanner_requires_memberof() {
        let src = r#"
/** @memberof Foo.utils */
function helper(a, b) {}
"#;
        let out = scan_js(src);
        match &out.features[0] {
            ScannedFeature::Function(f) => {
                assert_eq!(f.name, "Foo.utils.helper");
                assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn function_without_memberof_is_skipped() {
        let src = "function helper() {}";
        let out = scan_js(src);
        assert!(out.features.is_empty());
    }

    #[test]
    fn mixin_function_is_excluded_from_function_scanner() {
        let src = r#"
/** @memberof Foo
 *  @mixinFunction
 */
function MyMixin() {}
"#;
        let out = scan_js(src);
        assert!(out.features.iter().all(|f| !matches!(f, ScannedFeature::Function(_))));
    }

    #[test]
    fn pseudo_element_js_block_comment() {
        let src = "/** @pseudoElement x-js-pseudo */\nvar x = 1;";
        let out = scan_js(src);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::Element(el) if el.pseudo && el.tagname.as_deref() == Some("x-js-pseudo")
        )));
    }

    #[test]
    fn polymer_behavior_annotated_assignment_emits_behavior() {
        let src = "/** @polymerBehavior */\nvar MyBehavior = { attached() {} };";
        let out = scan_js(src);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::Behavior(b) if b.name == "MyBehavior"
        )));
    }

    #[test]
    fn mixin_function_annotated_function_emits_element_mixin() {
        let src = r#"
/** @memberof Foo
 *  @mixinFunction
 */
function MyMixin() {}
"#;
        let out = scan_js(src);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::ElementMixin(m) if m.name == "MyMixin"
        )));
    }

    #[test]
    fn class_extending_core_base_emits_polymer_core_feature() {
        let src = "class XFoo extends PolymerElement {}";
        let out = scan_js(src);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::PolymerCoreFeature(c) if c.name == "PolymerElement"
        )));
    }

    #[test]
    fn requires_doc_tag_emits_element_reference() {
        let src = "/** @requires x-other */\nvar x = 1;";
        let out = scan_js(src);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::ElementReference(r) if r.tagname == "x-other"
        )));
    }

    #[test]
    fn behaviors_array_on_annotated_class_emits_behavior_references() {
        let src = r#"
/** @polymerElement */
class XFoo {
  static get is() { return 'x-foo'; }
  static get behaviors() { return [MyBehaviorA, MyBehaviorB]; }
}
"#;
        let out = scan_js(src);
        let names: Vec<&str> = out
            .features
            .iter()
            .filter_map(|f| match f {
                ScannedFeature::Reference(r) if r.kind == "behavior" => Some(r.identifier.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["MyBehaviorA", "MyBehaviorB"]);
        assert!(out.features.iter().any(|f| matches!(
            f,
            ScannedFeature::Element(el) if el.tagname.as_deref() == Some("x-foo")
        )));
    }
}
