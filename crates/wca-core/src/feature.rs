//! Scanned and resolved feature types — the sum types at the center of the
//! data model (§3). Scanned features are document-local and come straight
//! out of a scanner; resolved features carry concrete cross-document
//! references and are what queries (`Document::get_by_kind`) return.

use std::collections::HashSet;

use crate::document::{Document, ResolveContext};
use crate::text::SourceRange;
use crate::url::Resolved;
use crate::warning::Warning;

/// A weak reference to a feature by kind/identifier, materialized into a
/// concrete pointer only after resolution (C6).
#[derive(Debug, Clone)]
pub struct Reference<F> {
    pub target: Option<F>,
    pub warnings: Vec<Warning>,
}

impl<F> Reference<F> {
    pub fn resolved(target: F) -> Self {
        Reference {
            target: Some(target),
            warnings: Vec::new(),
        }
    }

    pub fn unresolved(warnings: Vec<Warning>) -> Self {
        Reference {
            target: None,
            warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedAttribute {
    pub name: String,
    pub description: Option<String>,
    pub source_range: SourceRange,
}

/// A scanned `<link rel="import">`/external `<script src>`/external
/// stylesheet, or the synthetic import an inline `<script>` produces once
/// the nested document is parsed.
#[derive(Debug, Clone)]
pub struct ScannedImport {
    pub import_type: ImportType,
    pub url: crate::url::PackageRelative,
    pub resolved_url: Option<Resolved>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportType {
    HtmlImport,
    HtmlScript,
    HtmlStyle,
    JsImport,
}

#[derive(Debug, Clone)]
pub struct ScannedElement {
    pub tagname: Option<String>,
    pub classname: Option<String>,
    pub superclass: Option<String>,
    pub attributes: Vec<ScannedAttribute>,
    pub pseudo: bool,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedElementMixin {
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedNamespace {
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedFunction {
    pub name: String,
    pub params: Vec<String>,
    pub description: Option<String>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedBehavior {
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabindingDirection {
    OneWay,  // [[ ]]
    TwoWay,  // {{ }}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabindingInto {
    Attribute,
    StringInterpolation,
}

#[derive(Debug, Clone)]
pub struct ScannedDatabindingExpression {
    pub direction: DatabindingDirection,
    pub databinding_into: DatabindingInto,
    pub expression_text: String,
    pub event_name: Option<String>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedReference {
    pub kind: &'static str,
    pub identifier: String,
    /// The enclosing top-level statement's span in the referring document,
    /// when known. Stands in for spec §4.6's "astPath": the reference
    /// resolver's scope-based step narrows to features declared at this
    /// same statement before falling back to the document's global index.
    pub scope_hint: Option<crate::text::Span>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedPolymerCoreFeature {
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ScannedElementReference {
    pub tagname: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

/// The document-local sum type a scanner produces. Every variant carries a
/// source range and a warnings list; only some participate in resolution.
#[derive(Debug, Clone)]
pub enum ScannedFeature {
    Import(ScannedImport),
    Element(ScannedElement),
    ElementMixin(ScannedElementMixin),
    Namespace(ScannedNamespace),
    Function(ScannedFunction),
    Behavior(ScannedBehavior),
    DatabindingExpression(ScannedDatabindingExpression),
    Reference(ScannedReference),
    PolymerCoreFeature(ScannedPolymerCoreFeature),
    ElementReference(ScannedElementReference),
}

impl ScannedFeature {
    pub fn source_range(&self) -> SourceRange {
        match self {
            ScannedFeature::Import(f) => f.source_range,
            ScannedFeature::Element(f) => f.source_range,
            ScannedFeature::ElementMixin(f) => f.source_range,
            ScannedFeature::Namespace(f) => f.source_range,
            ScannedFeature::Function(f) => f.source_range,
            ScannedFeature::Behavior(f) => f.source_range,
            ScannedFeature::DatabindingExpression(f) => f.source_range,
            ScannedFeature::Reference(f) => f.source_range,
            ScannedFeature::PolymerCoreFeature(f) => f.source_range,
            ScannedFeature::ElementReference(f) => f.source_range,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            ScannedFeature::Import(f) => &f.warnings,
            ScannedFeature::Element(f) => &f.warnings,
            ScannedFeature::ElementMixin(f) => &f.warnings,
            ScannedFeature::Namespace(f) => &f.warnings,
            ScannedFeature::Function(f) => &f.warnings,
            ScannedFeature::Behavior(f) => &f.warnings,
            ScannedFeature::DatabindingExpression(f) => &f.warnings,
            ScannedFeature::Reference(f) => &f.warnings,
            ScannedFeature::PolymerCoreFeature(f) => &f.warnings,
            ScannedFeature::ElementReference(f) => &f.warnings,
        }
    }

    /// Whether this scanned feature yields a directly resolved feature
    /// (vs. needing C6's reference resolver, like `ScannedReference`).
    pub fn resolve(&self, ctx: &ResolveContext) -> Option<ResolvedFeature> {
        match self {
            ScannedFeature::Import(f) => Some(resolve_import(f, ctx)),
            ScannedFeature::Element(f) => Some(ResolvedFeature::Element(ResolvedElement {
                kinds: element_kinds(f),
                identifiers: element_identifiers(f),
                tagname: f.tagname.clone(),
                classname: f.classname.clone(),
                superclass: f.superclass.clone(),
                attributes: f.attributes.clone(),
                pseudo: f.pseudo,
                source_range: f.source_range,
                warnings: f.warnings.clone(),
            })),
            ScannedFeature::ElementMixin(f) => Some(ResolvedFeature::ElementMixin(ResolvedElementMixin {
                kinds: ["element-mixin"].into_iter().collect(),
                identifiers: [f.name.clone()].into_iter().collect(),
                name: f.name.clone(),
                source_range: f.source_range,
                warnings: f.warnings.clone(),
            })),
            ScannedFeature::Namespace(f) => Some(ResolvedFeature::Namespace(ResolvedNamespace {
                kinds: ["namespace"].into_iter().collect(),
                identifiers: [f.name.clone()].into_iter().collect(),
                name: f.name.clone(),
                source_range: f.source_range,
                warnings: f.warnings.clone(),
            })),
            ScannedFeature::Function(f) => Some(ResolvedFeature::Function(ResolvedFunction {
                kinds: ["function"].into_iter().collect(),
                identifiers: [f.name.clone()].into_iter().collect(),
                name: f.name.clone(),
                params: f.params.clone(),
                description: f.description.clone(),
                source_range: f.source_range,
                warnings: f.warnings.clone(),
            })),
            ScannedFeature::Behavior(f) => Some(ResolvedFeature::Behavior(ResolvedBehavior {
                kinds: ["behavior"].into_iter().collect(),
                identifiers: [f.name.clone()].into_iter().collect(),
                name: f.name.clone(),
                source_range: f.source_range,
                warnings: f.warnings.clone(),
            })),
            ScannedFeature::DatabindingExpression(f) => {
                Some(ResolvedFeature::DatabindingExpression(f.clone()))
            }
            ScannedFeature::PolymerCoreFeature(f) => {
                Some(ResolvedFeature::PolymerCoreFeature(f.clone()))
            }
            // References are resolved by C6, not here — the document
            // resolve pass routes `ScannedReference`/`ScannedElementReference`
            // through `crate::resolve` instead of calling this directly.
            ScannedFeature::Reference(_) | ScannedFeature::ElementReference(_) => None,
        }
    }
}

fn element_kinds(f: &ScannedElement) -> HashSet<&'static str> {
    let mut kinds = HashSet::new();
    kinds.insert("element");
    if f.pseudo {
        kinds.insert("pseudo-element");
    } else {
        kinds.insert("polymer-element");
    }
    kinds
}

fn element_identifiers(f: &ScannedElement) -> HashSet<String> {
    let mut ids = HashSet::new();
    if let Some(tag) = &f.tagname {
        ids.insert(tag.clone());
    }
    if let Some(class) = &f.classname {
        ids.insert(class.clone());
    }
    ids
}

fn resolve_import(f: &ScannedImport, ctx: &ResolveContext) -> ResolvedFeature {
    let target = f.resolved_url.as_ref().and_then(|url| ctx.lookup(url));
    ResolvedFeature::Import(ResolvedImport {
        kinds: ["import"].into_iter().collect(),
        identifiers: HashSet::new(),
        import_type: f.import_type,
        url: f.resolved_url.clone(),
        document: target,
        source_range: f.source_range,
        warnings: f.warnings.clone(),
    })
}

/// The resolved sum type mirroring [`ScannedFeature`], with concrete
/// cross-references and an open `kinds`/`identifiers` tag set.
#[derive(Debug, Clone)]
pub enum ResolvedFeature {
    Document(std::sync::Arc<Document>),
    Import(ResolvedImport),
    Element(ResolvedElement),
    ElementMixin(ResolvedElementMixin),
    Namespace(ResolvedNamespace),
    Function(ResolvedFunction),
    Behavior(ResolvedBehavior),
    DatabindingExpression(ScannedDatabindingExpression),
    PolymerCoreFeature(ScannedPolymerCoreFeature),
    Reference(ResolvedReference),
}

#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub kinds: HashSet<&'static str>,
    pub kind_queried: &'static str,
    pub identifier: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

impl ResolvedFeature {
    pub fn kinds(&self) -> HashSet<&'static str> {
        match self {
            ResolvedFeature::Document(_) => ["document"].into_iter().collect(),
            ResolvedFeature::Import(f) => f.kinds.clone(),
            ResolvedFeature::Element(f) => f.kinds.clone(),
            ResolvedFeature::ElementMixin(f) => f.kinds.clone(),
            ResolvedFeature::Namespace(f) => f.kinds.clone(),
            ResolvedFeature::Function(f) => f.kinds.clone(),
            ResolvedFeature::Behavior(f) => f.kinds.clone(),
            ResolvedFeature::DatabindingExpression(_) => ["databinding"].into_iter().collect(),
            ResolvedFeature::PolymerCoreFeature(_) => {
                ["polymer-core-feature"].into_iter().collect()
            }
            ResolvedFeature::Reference(f) => f.kinds.clone(),
        }
    }

    pub fn identifiers(&self) -> HashSet<String> {
        match self {
            ResolvedFeature::Document(d) => [d.url().0.clone()].into_iter().collect(),
            ResolvedFeature::Import(f) => f.identifiers.clone(),
            ResolvedFeature::Element(f) => f.identifiers.clone(),
            ResolvedFeature::ElementMixin(f) => f.identifiers.clone(),
            ResolvedFeature::Namespace(f) => f.identifiers.clone(),
            ResolvedFeature::Function(f) => f.identifiers.clone(),
            ResolvedFeature::Behavior(f) => f.identifiers.clone(),
            ResolvedFeature::DatabindingExpression(f) => [f.expression_text.clone()]
                .into_iter()
                .collect(),
            ResolvedFeature::PolymerCoreFeature(f) => [f.name.clone()].into_iter().collect(),
            ResolvedFeature::Reference(f) => [f.identifier.clone()].into_iter().collect(),
        }
    }

    pub fn source_range(&self) -> SourceRange {
        match self {
            ResolvedFeature::Document(d) => d.self_source_range(),
            ResolvedFeature::Import(f) => f.source_range,
            ResolvedFeature::Element(f) => f.source_range,
            ResolvedFeature::ElementMixin(f) => f.source_range,
            ResolvedFeature::Namespace(f) => f.source_range,
            ResolvedFeature::Function(f) => f.source_range,
            ResolvedFeature::Behavior(f) => f.source_range,
            ResolvedFeature::DatabindingExpression(f) => f.source_range,
            ResolvedFeature::PolymerCoreFeature(f) => f.source_range,
            ResolvedFeature::Reference(f) => f.source_range,
        }
    }

    pub fn warnings(&self) -> Vec<Warning> {
        match self {
            ResolvedFeature::Document(_) => Vec::new(),
            ResolvedFeature::Import(f) => f.warnings.clone(),
            ResolvedFeature::Element(f) => f.warnings.clone(),
            ResolvedFeature::ElementMixin(f) => f.warnings.clone(),
            ResolvedFeature::Namespace(f) => f.warnings.clone(),
            ResolvedFeature::Function(f) => f.warnings.clone(),
            ResolvedFeature::Behavior(f) => f.warnings.clone(),
            ResolvedFeature::DatabindingExpression(f) => f.warnings.clone(),
            ResolvedFeature::PolymerCoreFeature(f) => f.warnings.clone(),
            ResolvedFeature::Reference(f) => f.warnings.clone(),
        }
    }

    pub fn as_document(&self) -> Option<&std::sync::Arc<Document>> {
        match self {
            ResolvedFeature::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&ResolvedImport> {
        match self {
            ResolvedFeature::Import(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub import_type: ImportType,
    pub url: Option<Resolved>,
    pub document: Option<std::sync::Arc<Document>>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub tagname: Option<String>,
    pub classname: Option<String>,
    pub superclass: Option<String>,
    pub attributes: Vec<ScannedAttribute>,
    pub pseudo: bool,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ResolvedElementMixin {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ResolvedNamespace {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub name: String,
    pub params: Vec<String>,
    pub description: Option<String>,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct ResolvedBehavior {
    pub kinds: HashSet<&'static str>,
    pub identifiers: HashSet<String>,
    pub name: String,
    pub source_range: SourceRange,
    pub warnings: Vec<Warning>,
}
