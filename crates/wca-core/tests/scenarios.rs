//! End-to-end scenario tests: build a small in-memory package with
//! `MemoryLoader`, run it through `Analyzer::analyze`, and check the
//! resolved `Document` the way a caller actually would. Complements the
//! scanner-level unit tests beside `scan.rs`, which check the same
//! extraction logic on a bare fragment without going through loading,
//! import resolution, or the query index.

use wca_core::context::Analyzer;
use wca_core::loader::{Loader, MemoryLoader};
use wca_core::url::{PackageRelative, Resolved};
use wca_core::workspace::AnalyzerOptions;

fn analyzer(loader: MemoryLoader) -> Analyzer {
    let options = AnalyzerOptions::new(Resolved::new_unchecked("file:///pkg/"));
    let loaders: Vec<Box<dyn Loader>> = vec![Box::new(loader)];
    Analyzer::new(options, loaders).unwrap()
}

#[tokio::test]
async fn dual_namespace_assignment_produces_two_namespaces_without_warnings() {
    let loader = MemoryLoader::new().with(
        "file:///pkg/a.js",
        "/** @namespace */ var Foo = {}; Foo.Bar = { baz: 1 };",
    );
    let analysis = analyzer(loader).analyze(PackageRelative::new("a.js")).await;

    let doc = analysis.entry_document().unwrap();
    let namespaces = doc.get_by_kind("namespace").unwrap();
    let mut names: Vec<String> = namespaces
        .iter()
        .flat_map(|n| n.identifiers())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Foo".to_string(), "Foo.Bar".to_string()]);
    assert!(doc.get_warnings(false).is_empty());
}

#[tokio::test]
async fn unannotated_dynamic_namespace_subscript_warns() {
    let loader =
        MemoryLoader::new().with("file:///pkg/a.js", "DynamicNamespace[baz] = { foo: 'bar' };");
    let analysis = analyzer(loader).analyze(PackageRelative::new("a.js")).await;

    let doc = analysis.entry_document().unwrap();
    let warnings = doc.get_warnings(false);
    assert!(warnings
        .iter()
        .any(|w| w.message.contains("Unable to determine name for @namespace")));
}

#[tokio::test]
async fn dom_bind_template_yields_one_string_interpolation_databinding() {
    let loader = MemoryLoader::new().with(
        "file:///pkg/index.html",
        r#"<template is="dom-bind">Hello {{name}}!</template>"#,
    );
    let analysis = analyzer(loader)
        .analyze(PackageRelative::new("index.html"))
        .await;

    let doc = analysis.entry_document().unwrap();
    let bindings = doc.get_by_kind("databinding").unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(
        bindings[0].identifiers(),
        ["name".to_string()].into_iter().collect::<std::collections::HashSet<_>>()
    );
}
