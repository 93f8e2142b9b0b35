//! Document graph & query index (C7).
//!
//! [`ScannedDocument`] is the pre-resolution shape the context (C5) builds;
//! [`Document`] is the resolved, queryable node the caller actually sees.
//! The graph is cyclic (imports can cycle); [`Document::_begun`] cuts
//! recursion during resolution, and every query traverses with a
//! visited-URL guard to stay finite even across that cycle.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{AnalyzerError, Result};
use crate::feature::{ResolvedFeature, ScannedFeature};
use crate::parse::ParsedDocument;
use crate::text::{Position, Span, SourceRange};
use crate::url::Resolved;
use crate::warning::Warning;

/// A parsed document plus its document-local scanned features and
/// warnings (§3). Exactly one per resolved URL per analysis. May own
/// nested `ScannedDocument`s for inline `<script>`/`<style>` content.
#[derive(Debug, Clone)]
pub struct ScannedDocument {
    pub parsed: ParsedDocument,
    pub features: Vec<ScannedFeature>,
    pub warnings: Vec<Warning>,
    pub inline_documents: Vec<ScannedDocument>,
}

impl ScannedDocument {
    pub fn url(&self) -> &Resolved {
        &self.parsed.url
    }
}

/// Query filters for [`Document::get_features`], mirroring spec §6's
/// `getFeatures({imported, externalPackages, kind, id, statement})`. Only
/// `imported` actually changes traversal (whether to cross import
/// boundaries at all); the rest narrow the result set after traversal.
#[derive(Debug, Clone, Default)]
pub struct FeatureQuery {
    pub imported: bool,
    pub kind: Option<&'static str>,
    pub id: Option<String>,
}

/// A node in the resolved document graph (§3, §4.7).
pub struct Document {
    self_ref: Weak<Document>,
    scanned: ScannedDocument,
    local_features: Mutex<Vec<ResolvedFeature>>,
    begun: AtomicBool,
    done: AtomicBool,
    kind_index: Mutex<HashMap<String, Vec<ResolvedFeature>>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", self.url())
            .field("done", &self.done())
            .finish()
    }
}

impl Document {
    /// Allocates an empty, unresolved shell for `scanned`. Resolution
    /// (C5 step 2) sets `_begun`, walks `scanned.features`, and calls
    /// [`Document::mark_done`] when finished.
    pub fn new_shell(scanned: ScannedDocument) -> Arc<Document> {
        Arc::new_cyclic(|weak| Document {
            self_ref: weak.clone(),
            scanned,
            local_features: Mutex::new(Vec::new()),
            begun: AtomicBool::new(false),
            done: AtomicBool::new(false),
            kind_index: Mutex::new(HashMap::new()),
        })
    }

    pub fn url(&self) -> &Resolved {
        self.scanned.url()
    }

    pub fn scanned(&self) -> &ScannedDocument {
        &self.scanned
    }

    fn self_arc(&self) -> Arc<Document> {
        self.self_ref
            .upgrade()
            .expect("Document outlives its own Arc")
    }

    pub fn self_source_range(&self) -> SourceRange {
        let text_len = self.scanned.parsed.text.len();
        SourceRange::new(Position::new(0, 0), crate::text::offset_to_position(&self.scanned.parsed.text, text_len))
    }

    pub fn begun(&self) -> bool {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Sets `_begun=true`. Returns `false` if it was already begun — the
    /// resolve pass uses this to cut recursion into an import cycle.
    pub fn try_begin(&self) -> bool {
        !self.begun.swap(true, Ordering::SeqCst)
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub fn add_local_feature(&self, feature: ResolvedFeature) {
        self.local_features.lock().unwrap().push(feature);
    }

    /// Local features resolved so far in this document's scan order,
    /// without requiring `_done` — used mid-resolution by
    /// [`crate::resolve`], which must be able to look a reference's target
    /// up in a document that hasn't finished (or even started) its own
    /// resolve pass yet.
    pub fn locally_resolved_so_far(&self) -> Vec<ResolvedFeature> {
        self.local_features.lock().unwrap().clone()
    }

    fn self_as_feature(&self) -> ResolvedFeature {
        ResolvedFeature::Document(self.self_arc())
    }

    fn local_features_with_self(&self) -> Vec<ResolvedFeature> {
        let mut all = vec![self.self_as_feature()];
        all.extend(self.local_features.lock().unwrap().iter().cloned());
        all
    }

    /// Per spec §4.7: local features whose `kinds` contains `k`, unioned
    /// with `getByKind(k)` of every `import` target and every inline
    /// `document` child, with a visited-URL guard against cycles.
    pub fn get_by_kind(&self, kind: &str) -> Result<Vec<ResolvedFeature>> {
        if !self.done() {
            return Err(AnalyzerError::DocumentNotDone(self.url().clone()));
        }
        if let Some(cached) = self.kind_index.lock().unwrap().get(kind) {
            return Ok(cached.clone());
        }
        let mut visited = HashSet::new();
        let result = self.get_by_kind_inner(kind, &mut visited);
        self.kind_index
            .lock()
            .unwrap()
            .insert(kind.to_string(), result.clone());
        Ok(result)
    }

    fn get_by_kind_inner(&self, kind: &str, visited: &mut HashSet<Resolved>) -> Vec<ResolvedFeature> {
        if !visited.insert(self.url().clone()) {
            return Vec::new();
        }
        let locals = self.local_features_with_self();
        let mut results: Vec<ResolvedFeature> =
            locals.iter().filter(|f| f.kinds().contains(kind)).cloned().collect();

        for f in &locals {
            match f {
                ResolvedFeature::Import(imp) => {
                    if let Some(doc) = &imp.document {
                        results.extend(doc.get_by_kind_inner(kind, visited));
                    }
                }
                ResolvedFeature::Document(child) if !Arc::ptr_eq(child, &self.self_arc()) => {
                    results.extend(child.get_by_kind_inner(kind, visited));
                }
                _ => {}
            }
        }
        results
    }

    pub fn get_by_id(&self, kind: &'static str, id: &str) -> Result<Vec<ResolvedFeature>> {
        Ok(self
            .get_by_kind(kind)?
            .into_iter()
            .filter(|f| f.identifiers().contains(id))
            .collect())
    }

    /// Like `get_by_id`, but expects exactly one match; returns `None` if
    /// zero or more than one feature matched (ambiguity is the resolver's
    /// job to warn about, not the query layer's).
    pub fn get_only_at_id(&self, kind: &'static str, id: &str) -> Result<Option<ResolvedFeature>> {
        let mut matches = self.get_by_id(kind, id)?;
        if matches.len() == 1 {
            Ok(Some(matches.remove(0)))
        } else {
            Ok(None)
        }
    }

    /// Per spec §6's `getFeatures({imported, kind, id})`: `imported` decides
    /// whether to cross import/inline-document boundaries at all; `kind`
    /// and `id` narrow the result afterward.
    pub fn get_features(&self, query: &FeatureQuery) -> Result<Vec<ResolvedFeature>> {
        if !self.done() {
            return Err(AnalyzerError::DocumentNotDone(self.url().clone()));
        }
        let all = match (query.imported, query.kind) {
            (true, Some(kind)) => self.get_by_kind(kind)?,
            (true, None) => {
                let mut visited = HashSet::new();
                self.get_by_kind_inner("document", &mut visited)
                    .into_iter()
                    .flat_map(|d| {
                        d.as_document()
                            .map(|doc| doc.local_features_with_self())
                            .unwrap_or_default()
                    })
                    .collect()
            }
            (false, Some(kind)) => self
                .local_features_with_self()
                .into_iter()
                .filter(|f| f.kinds().contains(kind))
                .collect(),
            (false, None) => self.local_features_with_self(),
        };
        Ok(all
            .into_iter()
            .filter(|f| match query.id.as_deref() {
                Some(id) => f.identifiers().contains(id),
                None => true,
            })
            .collect())
    }

    /// All warnings local to this document, plus (if `deep`) every
    /// reachable document's warnings, with the same cycle guard as
    /// `get_by_kind`.
    pub fn get_warnings(&self, deep: bool) -> Vec<Warning> {
        if !deep {
            return self.local_warnings();
        }
        let mut visited = HashSet::new();
        self.get_warnings_inner(&mut visited)
    }

    fn local_warnings(&self) -> Vec<Warning> {
        let mut warnings = self.scanned.warnings.clone();
        for f in self.local_features.lock().unwrap().iter() {
            warnings.extend(f.warnings());
        }
        warnings
    }

    fn get_warnings_inner(&self, visited: &mut HashSet<Resolved>) -> Vec<Warning> {
        if !visited.insert(self.url().clone()) {
            return Vec::new();
        }
        let mut warnings = self.local_warnings();
        for f in self.local_features.lock().unwrap().iter() {
            match f {
                ResolvedFeature::Import(imp) => {
                    if let Some(doc) = &imp.document {
                        warnings.extend(doc.get_warnings_inner(visited));
                    }
                }
                ResolvedFeature::Document(child) => {
                    warnings.extend(child.get_warnings_inner(visited));
                }
                _ => {}
            }
        }
        warnings
    }
}

/// Turns a local [`Span`] within this document's own text into a
/// `SourceRange`, without any inline-document offset shift.
pub fn local_source_range(scanned: &ScannedDocument, span: Span) -> SourceRange {
    scanned.parsed.source_range(span)
}

/// The view a [`ScannedFeature::resolve`] or [`crate::resolve`] call has
/// over the in-progress analysis: the document being resolved, and the
/// per-analysis URL->Document map (populated with shells for every
/// reachable document before any document starts resolving, per §4.5).
pub struct ResolveContext<'a> {
    pub current: &'a Arc<Document>,
    pub documents: &'a HashMap<Resolved, Arc<Document>>,
}

impl<'a> ResolveContext<'a> {
    pub fn lookup(&self, url: &Resolved) -> Option<Arc<Document>> {
        self.documents.get(url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{ImportType, ResolvedImport};
    use crate::parse::{Ast, Language};

    fn empty_scanned(url: &str) -> ScannedDocument {
        ScannedDocument {
            parsed: ParsedDocument {
                url: Resolved::new_unchecked(url),
                text: String::new(),
                is_inline: false,
                language: Language::Html,
                ast: Ast::Html(crate::parse::html::HtmlNode::Element {
                    tag: "#document".to_string(),
                    attrs: Vec::new(),
                    children: Vec::new(),
                    span: Span::new(0, 0),
                }),
            },
            features: Vec::new(),
            warnings: Vec::new(),
            inline_documents: Vec::new(),
        }
    }

    #[test]
    fn document_contains_itself_as_document_kind() {
        let doc = Document::new_shell(empty_scanned("file:///a.html"));
        doc.mark_done();
        let docs = doc.get_by_kind("document").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(Arc::ptr_eq(docs[0].as_document().unwrap(), &doc));
    }

    #[test]
    fn querying_before_done_errors() {
        let doc = Document::new_shell(empty_scanned("file:///a.html"));
        assert!(matches!(
            doc.get_by_kind("document"),
            Err(AnalyzerError::DocumentNotDone(_))
        ));
    }

    #[test]
    fn circular_imports_terminate_and_both_appear() {
        let a = Document::new_shell(empty_scanned("file:///a.html"));
        let b = Document::new_shell(empty_scanned("file:///b.html"));

        let import_to_b = ResolvedFeature::Import(ResolvedImport {
            kinds: ["import"].into_iter().collect(),
            identifiers: HashSet::new(),
            import_type: ImportType::HtmlImport,
            url: Some(b.url().clone()),
            document: Some(b.clone()),
            source_range: SourceRange::new(Position::new(0, 0), Position::new(0, 0)),
            warnings: Vec::new(),
        });
        let import_to_a = ResolvedFeature::Import(ResolvedImport {
            kinds: ["import"].into_iter().collect(),
            identifiers: HashSet::new(),
            import_type: ImportType::HtmlImport,
            url: Some(a.url().clone()),
            document: Some(a.clone()),
            source_range: SourceRange::new(Position::new(0, 0), Position::new(0, 0)),
            warnings: Vec::new(),
        });
        a.add_local_feature(import_to_b);
        b.add_local_feature(import_to_a);
        a.mark_done();
        b.mark_done();

        let docs = a.get_by_kind("document").unwrap();
        assert_eq!(docs.len(), 2);
    }
}
