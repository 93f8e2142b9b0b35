//! Reference resolver (C6).
//!
//! Turns each document's `ScannedReference`/`ScannedElementReference` into a
//! [`ResolvedFeature::Reference`], per spec §4.6. Lookup is two-step: first
//! the features declared at the reference's own enclosing statement (the
//! scope-based step — almost always empty in practice, since behaviors and
//! mixins are declared in a different document than the one that lists
//! them, but cheap to check and occasionally relevant for same-file
//! self-reference), then every reachable document's features of the queried
//! kind, matched by identifier. Zero matches and more than one match are
//! both warnings rather than failures: a reference with no resolvable
//! target, or an ambiguous one, still appears in the graph.

use std::sync::Arc;

use crate::document::{Document, ResolveContext};
use crate::feature::{ResolvedFeature, ResolvedReference, ScannedElementReference, ScannedReference};
use crate::text::SourceRange;
use crate::warning::{codes, Severity, Warning};

pub fn resolve_reference(scanned: &ScannedReference, ctx: &ResolveContext) -> ResolvedFeature {
    resolve(
        scanned.kind,
        &scanned.identifier,
        scanned.scope_hint.map(|span| ctx.current.scanned().parsed.source_range(span)),
        scanned.source_range,
        ctx,
    )
}

pub fn resolve_element_reference(
    scanned: &ScannedElementReference,
    ctx: &ResolveContext,
) -> ResolvedFeature {
    resolve("element", &scanned.tagname, None, scanned.source_range, ctx)
}

fn resolve(
    kind: &'static str,
    identifier: &str,
    scope_range: Option<SourceRange>,
    source_range: SourceRange,
    ctx: &ResolveContext,
) -> ResolvedFeature {
    if let Some(scope_range) = scope_range {
        let in_scope = ctx
            .current
            .locally_resolved_so_far()
            .into_iter()
            .filter(|f| {
                f.kinds().contains(kind)
                    && f.source_range() == scope_range
                    && f.identifiers().contains(identifier)
            })
            .count();
        if in_scope == 1 {
            return make_resolved(kind, identifier, source_range, Vec::new());
        }
    }

    let matches = global_matches(kind, identifier, ctx);
    match matches.len() {
        0 => {
            let message = match resolution_hint(kind) {
                Some(hint) => format!(
                    "could not resolve {kind} reference '{identifier}'. {hint}"
                ),
                None => format!("could not resolve {kind} reference '{identifier}'"),
            };
            let warning = Warning::new(
                codes::COULD_NOT_RESOLVE_REFERENCE,
                message,
                Severity::Warning,
                source_range,
                ctx.current.url().clone(),
            );
            make_resolved(kind, identifier, source_range, vec![warning])
        }
        1 => make_resolved(kind, identifier, source_range, Vec::new()),
        n => {
            // Still resolves — to the deterministic first match — but the
            // ambiguity itself is worth surfacing.
            let warning = Warning::new(
                codes::MULTIPLE_GLOBAL_DECLARATIONS,
                format!("found {n} global declarations of {kind} '{identifier}'; using the first"),
                Severity::Warning,
                source_range,
                ctx.current.url().clone(),
            );
            make_resolved(kind, identifier, source_range, vec![warning])
        }
    }
}

fn make_resolved(
    kind: &'static str,
    identifier: &str,
    source_range: SourceRange,
    warnings: Vec<Warning>,
) -> ResolvedFeature {
    ResolvedFeature::Reference(ResolvedReference {
        kinds: [kind].into_iter().collect(),
        kind_queried: kind,
        identifier: identifier.to_string(),
        source_range,
        warnings,
    })
}

/// Every reachable document's features of `kind` with a matching
/// identifier, ordered by document URL for deterministic tie-breaking.
/// Reads `locally_resolved_so_far`, not `get_by_kind` — resolution is
/// still in flight and most documents in `ctx.documents` are not `done`
/// yet.
fn global_matches(kind: &str, identifier: &str, ctx: &ResolveContext) -> Vec<ResolvedFeature> {
    let mut docs: Vec<&Arc<Document>> = ctx.documents.values().collect();
    docs.sort_by(|a, b| a.url().cmp(b.url()));

    docs.into_iter()
        .flat_map(|doc| doc.locally_resolved_so_far())
        .filter(|f| f.kinds().contains(kind) && f.identifiers().contains(identifier))
        .collect()
}

fn resolution_hint(kind: &str) -> Option<&'static str> {
    match kind {
        "behavior" => Some("Is it annotated with @polymerBehavior?"),
        "element-mixin" => Some("Is it annotated with @mixinFunction?"),
        "namespace" => Some("Is it annotated with @namespace?"),
        "element" => Some("Is it annotated with @polymerElement or @customElement, or registered via customElements.define?"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ScannedDocument;
    use crate::feature::{ResolvedBehavior, ResolvedElement};
    use crate::parse::{Ast, Language, ParsedDocument};
    use crate::text::Position;
    use crate::url::Resolved;
    use std::collections::{HashMap, HashSet};

    fn shell(url: &str) -> Arc<Document> {
        Document::new_shell(ScannedDocument {
            parsed: ParsedDocument {
                url: Resolved::new_unchecked(url),
                text: String::new(),
                is_inline: false,
                language: Language::Html,
                ast: Ast::Html(crate::parse::html::HtmlNode::Element {
                    tag: "#document".to_string(),
                    attrs: Vec::new(),
                    children: Vec::new(),
                    span: crate::text::Span::new(0, 0),
                }),
            },
            features: Vec::new(),
            warnings: Vec::new(),
            inline_documents: Vec::new(),
        })
    }

    fn range() -> SourceRange {
        SourceRange::new(Position::new(0, 0), Position::new(0, 1))
    }

    fn scanned_ref(kind: &'static str, identifier: &str) -> ScannedReference {
        ScannedReference {
            kind,
            identifier: identifier.to_string(),
            scope_hint: None,
            source_range: range(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn resolves_to_the_single_global_declaration() {
        let a = shell("file:///a.html");
        let b = shell("file:///b.html");
        b.add_local_feature(ResolvedFeature::Behavior(ResolvedBehavior {
            kinds: ["behavior"].into_iter().collect(),
            identifiers: ["MyBehavior".to_string()].into_iter().collect(),
            name: "MyBehavior".to_string(),
            source_range: range(),
            warnings: Vec::new(),
        }));
        let mut documents = HashMap::new();
        documents.insert(a.url().clone(), a.clone());
        documents.insert(b.url().clone(), b.clone());
        let ctx = ResolveContext { current: &a, documents: &documents };

        let resolved = resolve_reference(&scanned_ref("behavior", "MyBehavior"), &ctx);
        assert!(resolved.warnings().is_empty());
        assert_eq!(resolved.identifiers(), ["MyBehavior".to_string()].into_iter().collect());
    }

    #[test]
    fn unresolvable_reference_warns_with_kind_specific_hint() {
        let a = shell("file:///a.html");
        let documents = HashMap::from([(a.url().clone(), a.clone())]);
        let ctx = ResolveContext { current: &a, documents: &documents };

        let resolved = resolve_reference(&scanned_ref("behavior", "Missing"), &ctx);
        let warnings = resolved.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, codes::COULD_NOT_RESOLVE_REFERENCE);
        assert!(warnings[0].message.contains("@polymerBehavior"));
    }

    #[test]
    fn ambiguous_global_declarations_warn_but_still_resolve() {
        let a = shell("file:///a.html");
        let b = shell("file:///b.html");
        let c = shell("file:///c.html");
        for doc in [&b, &c] {
            doc.add_local_feature(ResolvedFeature::Element(ResolvedElement {
                kinds: ["element", "polymer-element"].into_iter().collect(),
                identifiers: ["x-foo".to_string()].into_iter().collect(),
                tagname: Some("x-foo".to_string()),
                classname: None,
                superclass: None,
                attributes: Vec::new(),
                pseudo: false,
                source_range: range(),
                warnings: Vec::new(),
            }));
        }
        let mut documents = HashMap::new();
        for doc in [&a, &b, &c] {
            documents.insert(doc.url().clone(), doc.clone());
        }
        let ctx = ResolveContext { current: &a, documents: &documents };

        let resolved = resolve_element_reference(
            &ScannedElementReference {
                tagname: "x-foo".to_string(),
                source_range: range(),
                warnings: Vec::new(),
            },
            &ctx,
        );
        let warnings = resolved.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, codes::MULTIPLE_GLOBAL_DECLARATIONS);
        assert_eq!(resolved.identifiers(), ["x-foo".to_string()].into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn unknown_kind_gets_no_hint_suffix() {
        let a = shell("file:///a.html");
        let documents = HashMap::from([(a.url().clone(), a.clone())]);
        let ctx = ResolveContext { current: &a, documents: &documents };

        let resolved = resolve_reference(&scanned_ref("polymer-core-feature", "iron-resizable"), &ctx);
        let warnings = resolved.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].message.contains("Is it annotated"));
    }
}
