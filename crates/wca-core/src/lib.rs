//! Core analysis engine for the web-components static analyzer.
//!
//! This crate provides the full scan-then-resolve pipeline:
//! - URL model and package-root-aware resolver (C1)
//! - Loader trait and a filesystem loader (C2)
//! - Parser registry and minimal HTML/script parsers (C3)
//! - Scanned/resolved feature types (C4 data model)
//! - Scanner registry and concrete scanners (C4)
//! - Analysis context: document cache, load/scan/resolve pipeline (C5)
//! - Reference resolver (C6)
//! - Document graph and query index (C7)
//! - Warning model (C8)

pub mod context;
pub mod document;
pub mod error;
pub mod feature;
pub mod loader;
pub mod parse;
pub mod resolve;
pub mod scan;
pub mod text;
pub mod url;
pub mod warning;
pub mod workspace;
