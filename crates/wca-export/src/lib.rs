//! Analysis format exporter (C9).
//!
//! Turns a resolved [`wca_core::context::Analysis`] into the stable,
//! serde-serializable schema described by spec §6: a top-level document
//! with `schema_version` plus optional `namespaces`, `elements`, `mixins`,
//! `functions`, and `metadata`. Every document in the analysis contributes
//! its own locally-declared features (`imported: false` in
//! `Document::get_features`) — walking local declarations rather than each
//! document's transitive closure avoids re-emitting the same feature once
//! per importer.
//!
//! The shape of each response type (status-like top-level struct,
//! `#[serde(skip_serializing_if = "Option::is_none")]` on every optional
//! field, small `*Output` structs with a plain constructor) follows the
//! `output.rs` convention already used elsewhere in this stack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wca_core::context::Analysis;
use wca_core::document::FeatureQuery;
use wca_core::error::AnalyzerError;
use wca_core::feature::ResolvedFeature;
use wca_core::text::SourceRange;
use wca_core::warning::Warning;

/// The `schema_version` every exported document carries. Per spec §6, new
/// minor/patch versions may add fields but must not change the meaning of
/// an existing one.
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("failed to serialize analysis: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level exported shape (spec §6): `{schema_version, namespaces?,
/// elements?, mixins?, functions?, metadata?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<NamespaceOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ElementOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<MixinOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Extra, non-normative information about the analysis run. Spec §6 leaves
/// `metadata`'s contents unspecified beyond "optional" — warnings collected
/// across the whole package are the one thing worth surfacing here, since
/// nothing else in the top-level shape carries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_range: SourceRange,
}

/// A declared but never-extracted facet of an element (property, method,
/// event). Scanning doesn't currently extract any of these, so every
/// element exports empty lists here rather than omitting the fields —
/// the schema still names the slot, matching the downstream consumer's
/// expectations, even when this implementation has nothing to put in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyOutput {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_range: SourceRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodOutput {
    pub name: String,
    pub params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_range: SourceRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_range: SourceRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub attributes: Vec<AttributeOutput>,
    pub properties: Vec<PropertyOutput>,
    pub methods: Vec<MethodOutput>,
    pub events: Vec<EventOutput>,
    pub demos: Vec<String>,
    pub slots: Vec<String>,
    pub styling: Vec<String>,
    pub source_range: SourceRange,
    pub privacy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixinOutput {
    pub name: String,
    pub source_range: SourceRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub privacy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceOutput {
    pub name: String,
    pub source_range: SourceRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionOutput {
    pub name: String,
    pub params: Vec<String>,
    pub source_range: SourceRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Serializes every document in `analysis` into the stable schema. Local
/// (non-imported) features of each kind are pulled from every document in
/// the analysis's document map, so a feature is emitted exactly once
/// regardless of how many importers reach it.
pub fn export(analysis: &Analysis) -> Result<AnalysisDocument, ExportError> {
    let mut elements = Vec::new();
    let mut mixins = Vec::new();
    let mut namespaces = Vec::new();
    let mut functions = Vec::new();
    let mut warnings = Vec::new();

    for doc in analysis.documents() {
        let query = FeatureQuery {
            imported: false,
            kind: None,
            id: None,
        };
        for feature in doc.get_features(&query)? {
            match &feature {
                ResolvedFeature::Element(e) => elements.push(ElementOutput {
                    tagname: e.tagname.clone(),
                    classname: e.classname.clone(),
                    mixins: None,
                    superclass: e.superclass.clone(),
                    attributes: e
                        .attributes
                        .iter()
                        .map(|a| AttributeOutput {
                            name: a.name.clone(),
                            description: a.description.clone(),
                            source_range: a.source_range,
                        })
                        .collect(),
                    properties: Vec::new(),
                    methods: Vec::new(),
                    events: Vec::new(),
                    demos: Vec::new(),
                    slots: Vec::new(),
                    styling: Vec::new(),
                    source_range: e.source_range,
                    privacy: "public".to_string(),
                    description: None,
                    summary: None,
                }),
                ResolvedFeature::ElementMixin(m) => mixins.push(MixinOutput {
                    name: m.name.clone(),
                    source_range: m.source_range,
                    description: None,
                    privacy: "public".to_string(),
                }),
                ResolvedFeature::Namespace(n) => namespaces.push(NamespaceOutput {
                    name: n.name.clone(),
                    source_range: n.source_range,
                    description: None,
                }),
                ResolvedFeature::Function(f) => functions.push(FunctionOutput {
                    name: f.name.clone(),
                    params: f.params.clone(),
                    source_range: f.source_range,
                    description: f.description.clone(),
                }),
                _ => {}
            }
        }
        warnings.extend(doc.get_warnings(false));
    }

    Ok(AnalysisDocument {
        schema_version: SCHEMA_VERSION.to_string(),
        namespaces: (!namespaces.is_empty()).then_some(namespaces),
        elements: (!elements.is_empty()).then_some(elements),
        mixins: (!mixins.is_empty()).then_some(mixins),
        functions: (!functions.is_empty()).then_some(functions),
        metadata: Some(Metadata { warnings }),
    })
}

/// Serializes `analysis` directly to a pretty-printed JSON string.
pub fn export_to_string(analysis: &Analysis) -> Result<String, ExportError> {
    let document = export(analysis)?;
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use wca_core::document::{Document, ScannedDocument};
    use wca_core::feature::ResolvedElement;
    use wca_core::parse::html::HtmlNode;
    use wca_core::parse::{Ast, Language, ParsedDocument};
    use wca_core::text::{Position, Span};
    use wca_core::url::Resolved;

    fn empty_shell(url: &str) -> Arc<Document> {
        Document::new_shell(ScannedDocument {
            parsed: ParsedDocument {
                url: Resolved::new_unchecked(url),
                text: String::new(),
                is_inline: false,
                language: Language::Html,
                ast: Ast::Html(HtmlNode::Element {
                    tag: "#document".to_string(),
                    attrs: Vec::new(),
                    children: Vec::new(),
                    span: Span::new(0, 0),
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

    #[test]
    fn exports_schema_version_and_an_element() {
        let doc = empty_shell("file:///a.html");
        doc.add_local_feature(ResolvedFeature::Element(ResolvedElement {
            kinds: ["element", "polymer-element"].into_iter().collect(),
            identifiers: ["x-foo".to_string()].into_iter().collect(),
            tagname: Some("x-foo".to_string()),
            classname: Some("XFoo".to_string()),
            superclass: None,
            attributes: Vec::new(),
            pseudo: false,
            source_range: range(),
            warnings: Vec::new(),
        }));
        doc.mark_done();

        let mut documents = HashMap::new();
        documents.insert(doc.url().clone(), doc.clone());
        let analysis = Analysis::new(documents, Some(doc.url().clone()));

        let exported = export(&analysis).unwrap();
        assert_eq!(exported.schema_version, SCHEMA_VERSION);
        let elements = exported.elements.unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tagname.as_deref(), Some("x-foo"));
        assert_eq!(elements[0].classname.as_deref(), Some("XFoo"));
    }

    #[test]
    fn empty_analysis_omits_every_optional_section() {
        let doc = empty_shell("file:///empty.html");
        doc.mark_done();
        let mut documents = HashMap::new();
        documents.insert(doc.url().clone(), doc.clone());
        let analysis = Analysis::new(documents, Some(doc.url().clone()));

        let exported = export(&analysis).unwrap();
        assert!(exported.elements.is_none());
        assert!(exported.namespaces.is_none());
        assert!(exported.mixins.is_none());
        assert!(exported.functions.is_none());
        let json = serde_json::to_string(&exported).unwrap();
        assert!(!json.contains("\"elements\""));
    }
}
