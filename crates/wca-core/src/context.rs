//! Analysis context: document cache, load/scan/resolve pipeline (C5).
//!
//! `Analyzer::analyze` is the public entry point. It resolves the entry
//! URL, recursively loads/parses/scans every reachable document (crawling
//! `ScannedImport`s and inline documents as it goes, deduplicating
//! concurrent requests for the same URL through `scanned_cache`), then runs
//! a resolve pass over the whole reachable set and returns an `Analysis`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::Instrument;

use crate::document::{Document, ResolveContext, ScannedDocument};
use crate::error::{LoadError, Result};
use crate::feature::{ImportType, ResolvedFeature, ScannedFeature};
use crate::loader::Loader;
use crate::parse::ParserRegistry;
use crate::scan::{self, ScannerRegistry};
use crate::text::{Position, SourceRange};
use crate::url::{FileRelative, ImportHint, PackageRelative, PackageUrlResolver, Resolved};
use crate::warning::{Severity, Warning};
use crate::workspace::AnalyzerOptions;

/// The result of `Analyzer::analyze`/`analyze_all`: every `Document`
/// reachable during that run, keyed by resolved URL.
pub struct Analysis {
    documents: HashMap<Resolved, Arc<Document>>,
    entry: Option<Resolved>,
}

impl Analysis {
    /// Builds an `Analysis` directly from an already-resolved document map,
    /// bypassing `Analyzer::analyze`. Used by the exporter and CLI test
    /// suites, and by callers that assemble a document set some other way
    /// (e.g. merging the results of several independent `analyze` calls).
    pub fn new(documents: HashMap<Resolved, Arc<Document>>, entry: Option<Resolved>) -> Self {
        Analysis { documents, entry }
    }

    pub fn get_document(&self, url: &Resolved) -> Option<Arc<Document>> {
        self.documents.get(url).cloned()
    }

    pub fn entry_document(&self) -> Option<Arc<Document>> {
        self.entry.as_ref().and_then(|url| self.get_document(url))
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.documents.values()
    }
}

/// Orchestrates C1-C8 over a set of loaders. One `Analyzer` corresponds to
/// one long-lived document cache; construct a single instance per workspace
/// and call `analyze`/`analyze_all` repeatedly (e.g. once per CLI
/// invocation, or kept alive across edits in an editor integration, using
/// `files_changed` to invalidate stale entries).
pub struct Analyzer {
    loaders: Vec<Box<dyn Loader>>,
    parsers: ParserRegistry,
    scanners: ScannerRegistry,
    url_resolver: PackageUrlResolver,
    options: AnalyzerOptions,
    scanned_cache: Mutex<HashMap<Resolved, Arc<OnceCell<Arc<ScannedDocument>>>>>,
    /// child URL -> every URL whose scan produced an import to it, as of
    /// the last successful scan. Consulted by `files_changed` to invalidate
    /// the transitive closure of importers, per spec §4.5.
    parents: Mutex<HashMap<Resolved, HashSet<Resolved>>>,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions, loaders: Vec<Box<dyn Loader>>) -> Result<Self> {
        options.validate()?;
        Ok(Analyzer {
            url_resolver: options.url_resolver(),
            loaders,
            parsers: ParserRegistry::new(),
            scanners: ScannerRegistry::new(),
            options,
            scanned_cache: Mutex::new(HashMap::new()),
            parents: Mutex::new(HashMap::new()),
        })
    }

    pub async fn analyze(&self, url: PackageRelative) -> Analysis {
        let Some(entry) = self.url_resolver.resolve_package(&url) else {
            return Analysis { documents: HashMap::new(), entry: None };
        };
        self.scan_tree(entry.clone()).await;
        let documents = self.build_document_graph();
        resolve_all(&documents);
        Analysis { documents, entry: Some(entry) }
    }

    /// Analyzes multiple entry URLs against one shared document cache, so
    /// imports common to more than one entry are only loaded and scanned
    /// once.
    pub async fn analyze_all(&self, urls: Vec<PackageRelative>) -> Analysis {
        let mut last_entry = None;
        for url in urls {
            if let Some(entry) = self.url_resolver.resolve_package(&url) {
                self.scan_tree(entry.clone()).await;
                last_entry = Some(entry);
            }
        }
        let documents = self.build_document_graph();
        resolve_all(&documents);
        Analysis { documents, entry: last_entry }
    }

    /// Invalidates `urls` and every URL transitively importing them (per
    /// the import graph observed during the last successful scan), so the
    /// next `analyze` call reloads and rescans them.
    pub fn files_changed(&self, urls: &[Resolved]) {
        let to_clear = {
            let parents = self.parents.lock().unwrap();
            let mut seen: HashSet<Resolved> = urls.iter().cloned().collect();
            let mut frontier: Vec<Resolved> = urls.to_vec();
            while let Some(url) = frontier.pop() {
                if let Some(importers) = parents.get(&url) {
                    for importer in importers {
                        if seen.insert(importer.clone()) {
                            frontier.push(importer.clone());
                        }
                    }
                }
            }
            seen
        };
        let mut cache = self.scanned_cache.lock().unwrap();
        let mut parents = self.parents.lock().unwrap();
        for url in &to_clear {
            cache.remove(url);
            parents.remove(url);
        }
    }

    async fn load(&self, url: &Resolved) -> std::result::Result<String, LoadError> {
        for loader in &self.loaders {
            if loader.can_load(url) {
                return loader.load(url).await;
            }
        }
        Err(LoadError::UnsupportedScheme(url.clone()))
    }

    /// Loads, parses, and scans `url` if it isn't already cached, then (the
    /// first time only) recurses into its imports. Boxed because an async
    /// fn cannot be directly recursive.
    fn scan_tree<'a>(&'a self, url: Resolved) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if self.parsers.for_url(&url).is_none() {
                // No registered parser (e.g. an opaque stylesheet target):
                // leave it unscanned. `ResolvedImport.document` stays none
                // for these, same as a load failure would.
                return;
            }
            let cell = {
                let mut cache = self.scanned_cache.lock().unwrap();
                cache.entry(url.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
            };
            let first_time = !cell.initialized();
            let scanned = cell
                .get_or_init(|| self.load_and_scan(url.clone()))
                .await
                .clone();

            if !first_time || !self.options.follow_imports {
                return;
            }
            for feature in &scanned.features {
                if let ScannedFeature::Import(imp) = feature {
                    if let Some(target) = &imp.resolved_url {
                        self.record_parent(target.clone(), url.clone());
                        self.scan_tree(target.clone()).await;
                    }
                }
            }
        })
    }

    async fn load_and_scan(&self, url: Resolved) -> Arc<ScannedDocument> {
        async move {
            let (text, mut warnings) = match self.load(&url).await {
                Ok(text) => (text, Vec::new()),
                Err(err) => {
                    tracing::warn!(code = err.warning_code(), url = %url.0, "{err}");
                    let warning = Warning::new(
                        err.warning_code(),
                        err.to_string(),
                        Severity::Error,
                        SourceRange::new(Position::new(0, 0), Position::new(0, 0)),
                        url.clone(),
                    );
                    (String::new(), vec![warning])
                }
            };
            let parser = self
                .parsers
                .for_url(&url)
                .expect("scan_tree only calls load_and_scan when a parser is registered");
            let outcome = parser.parse(&text, &url, false);
            warnings.extend(outcome.warnings);

            let mut scan_output = {
                let _span = tracing::info_span!("scan_document", url = %url.0).entered();
                scan::scan(&outcome.document, &self.parsers, &self.scanners)
            };
            // Imports come out of the scanner as authored (`PackageRelative`)
            // text; `scan_tree`'s crawl and `resolve_import`'s linking both
            // key off `resolved_url`, so every import found here (and in any
            // inline document nested inside it) is resolved file-relative to
            // the document that declared it before this scan's output is
            // cached.
            self.resolve_imports(&mut scan_output.features, &url);
            for inline in &mut scan_output.inline_documents {
                self.resolve_inline_imports(inline);
            }
            for warning in &scan_output.warnings {
                tracing::warn!(code = %warning.code, url = %url.0, "{}", warning.message);
            }
            warnings.extend(scan_output.warnings);

            tracing::debug!(url = %url.0, features = scan_output.features.len(), "scanned document");
            Arc::new(ScannedDocument {
                parsed: outcome.document,
                features: scan_output.features,
                warnings,
                inline_documents: scan_output.inline_documents,
            })
        }
        .instrument(tracing::info_span!("analyze_url", url = %url.0))
        .await
    }

    fn record_parent(&self, child: Resolved, parent: Resolved) {
        self.parents.lock().unwrap().entry(child).or_default().insert(parent);
    }

    /// Populates `ScannedImport.resolved_url` for every import among
    /// `features`, file-relative to `base` (the document that declared
    /// them). A scanner only ever sees the authored href; this is the one
    /// place that turns it into something `scan_tree`/`resolve_document` can
    /// follow.
    fn resolve_imports(&self, features: &mut [ScannedFeature], base: &Resolved) {
        for feature in features.iter_mut() {
            if let ScannedFeature::Import(imp) = feature {
                let href = FileRelative::new(imp.url.0.clone());
                imp.resolved_url =
                    self.url_resolver
                        .resolve_file_relative(&href, base, Some(import_hint(imp.import_type)));
            }
        }
    }

    /// Same as `resolve_imports`, but against an inline document's own URL
    /// (an inline `<script>`'s imports, were this grammar to model ES
    /// imports, would be relative to its synthetic `#inline-script-N` URL,
    /// not its enclosing HTML document's).
    fn resolve_inline_imports(&self, doc: &mut ScannedDocument) {
        let base = doc.url().clone();
        self.resolve_imports(&mut doc.features, &base);
        for inline in &mut doc.inline_documents {
            self.resolve_inline_imports(inline);
        }
    }

    /// Snapshots every cached `ScannedDocument` (and, recursively, every
    /// inline document nested inside one) into an allocated `Document`
    /// shell, per spec §4.5 step 1: shells exist for the whole reachable
    /// set before any resolve step runs.
    fn build_document_graph(&self) -> HashMap<Resolved, Arc<Document>> {
        let cache = self.scanned_cache.lock().unwrap();
        let mut documents = HashMap::new();
        for cell in cache.values() {
            if let Some(scanned) = cell.get() {
                allocate_shells((**scanned).clone(), &mut documents);
            }
        }
        documents
    }
}

fn import_hint(import_type: ImportType) -> ImportHint {
    match import_type {
        ImportType::HtmlImport => ImportHint::HtmlImport,
        ImportType::HtmlScript => ImportHint::HtmlScript,
        ImportType::HtmlStyle => ImportHint::HtmlStyle,
        ImportType::JsImport => ImportHint::JsImport,
    }
}

fn allocate_shells(scanned: ScannedDocument, documents: &mut HashMap<Resolved, Arc<Document>>) {
    let inline_children = scanned.inline_documents.clone();
    let url = scanned.url().clone();
    if documents.contains_key(&url) {
        return;
    }
    documents.insert(url, Document::new_shell(scanned));
    for child in inline_children {
        allocate_shells(child, documents);
    }
}

/// Resolves every allocated document (§4.5 step 2), in URL order for
/// determinism. `resolve_document`'s `try_begin` guard makes each call
/// idempotent, so it's safe to simply sweep every shell regardless of
/// which one was the original entry.
fn resolve_all(documents: &HashMap<Resolved, Arc<Document>>) {
    let mut urls: Vec<Resolved> = documents.keys().cloned().collect();
    urls.sort();
    for url in urls {
        resolve_document(&url, documents);
    }
}

fn resolve_document(url: &Resolved, documents: &HashMap<Resolved, Arc<Document>>) {
    let Some(doc) = documents.get(url) else { return };
    if !doc.try_begin() {
        return;
    }
    let ctx = ResolveContext { current: doc, documents };

    for feature in &doc.scanned().features {
        match feature {
            ScannedFeature::Import(imp) => {
                if let Some(target) = &imp.resolved_url {
                    resolve_document(target, documents);
                }
                let resolved = feature
                    .resolve(&ctx)
                    .expect("ScannedFeature::Import always resolves to a feature");
                doc.add_local_feature(resolved);
            }
            ScannedFeature::Reference(r) => {
                doc.add_local_feature(crate::resolve::resolve_reference(r, &ctx));
            }
            ScannedFeature::ElementReference(r) => {
                doc.add_local_feature(crate::resolve::resolve_element_reference(r, &ctx));
            }
            other => {
                if let Some(resolved) = other.resolve(&ctx) {
                    doc.add_local_feature(resolved);
                }
            }
        }
    }

    for inline in &doc.scanned().inline_documents {
        resolve_document(inline.url(), documents);
        if let Some(child) = documents.get(inline.url()) {
            doc.add_local_feature(ResolvedFeature::Document(child.clone()));
        }
    }

    doc.mark_done();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    fn analyzer(loader: MemoryLoader) -> Analyzer {
        let options = AnalyzerOptions::new(Resolved::new_unchecked("file:///pkg/"));
        let loaders: Vec<Box<dyn Loader>> = vec![Box::new(loader)];
        Analyzer::new(options, loaders).unwrap()
    }

    #[tokio::test]
    async fn scenario_one_entry_with_two_imports_and_inline_class() {
        let loader = MemoryLoader::new()
            .with(
                "file:///pkg/index.html",
                r#"<link rel="import" href="./a.html"><link rel="import" href="./b.html">"#,
            )
            .with(
                "file:///pkg/a.html",
                "<script>\n/** @customElement */\nclass El {\n  static get is() { return 'x-el'; }\n}\n</script>",
            )
            .with("file:///pkg/b.html", "");
        let analysis = analyzer(loader)
            .analyze(PackageRelative::new("index.html"))
            .await;

        let entry = analysis.entry_document().unwrap();
        let element = entry.get_only_at_id("element", "x-el").unwrap().unwrap();
        assert_eq!(
            element.identifiers(),
            ["x-el".to_string(), "El".to_string()]
                .into_iter()
                .collect::<std::collections::HashSet<_>>()
        );
        assert_eq!(entry.get_by_kind("element").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn circular_imports_resolve_without_overflow() {
        let loader = MemoryLoader::new()
            .with("file:///pkg/a.html", r#"<link rel="import" href="./b.html">"#)
            .with("file:///pkg/b.html", r#"<link rel="import" href="./a.html">"#);
        let analysis = analyzer(loader).analyze(PackageRelative::new("a.html")).await;

        let a = analysis.entry_document().unwrap();
        assert_eq!(a.get_by_kind("document").unwrap().len(), 2);
        assert!(a.get_warnings(true).is_empty());
    }

    #[tokio::test]
    async fn files_changed_clears_importer_and_imported() {
        let loader = MemoryLoader::new()
            .with("file:///pkg/index.html", r#"<link rel="import" href="./a.html">"#)
            .with("file:///pkg/a.html", "<p>hi</p>");
        let analyzer = analyzer(loader);
        analyzer.analyze(PackageRelative::new("index.html")).await;
        assert_eq!(analyzer.scanned_cache.lock().unwrap().len(), 2);

        analyzer.files_changed(&[Resolved::new_unchecked("file:///pkg/a.html")]);
        let cache = analyzer.scanned_cache.lock().unwrap();
        assert!(!cache.contains_key(&Resolved::new_unchecked("file:///pkg/a.html")));
        assert!(!cache.contains_key(&Resolved::new_unchecked("file:///pkg/index.html")));
    }

    #[tokio::test]
    async fn malformed_entry_url_produces_empty_analysis() {
        let analysis = analyzer(MemoryLoader::new())
            .analyze(PackageRelative::new("%><><%="))
            .await;
        assert!(analysis.entry_document().is_none());
    }

    #[tokio::test]
    async fn unloadable_entry_document_still_appears_with_a_warning() {
        let analysis = analyzer(MemoryLoader::new())
            .analyze(PackageRelative::new("missing.html"))
            .await;
        let doc = analysis.entry_document().unwrap();
        assert!(doc.get_warnings(false).iter().any(|w| w.code == "could-not-load"));
    }
}
