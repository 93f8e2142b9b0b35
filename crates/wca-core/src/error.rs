//! Error types for wca-core.
//!
//! Per spec §7, almost everything that can go wrong during analysis becomes
//! a structured [`crate::warning::Warning`] attached to a feature, document,
//! or import — never an exception that escapes the analyzer. The two error
//! types in this module cover what's left:
//!
//! - [`LoadError`]: the failure surface of the [`crate::loader::Loader`]
//!   trait. Callers (the analysis context) bridge this into a
//!   `could-not-load` warning on the referencing import; it never reaches
//!   the top-level `Analyzer::analyze` caller as a raw `Err`.
//! - [`AnalyzerError`]: programming/precondition errors (§7 "Internal
//!   precondition violations... are fatal") — calling `resolve` twice on
//!   the same document, querying a document that was never allocated, and
//!   similar invariant breaks. These alone produce `Result::Err`.

use thiserror::Error;

use crate::url::Resolved;

/// Failure surface of the [`crate::loader::Loader`] trait (C2).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("no content at {0}")]
    NotFound(Resolved),

    #[error("path escapes loader root: {0}")]
    PathEscapesRoot(Resolved),

    #[error("unsupported scheme for {0}")]
    UnsupportedScheme(Resolved),

    #[error("I/O error loading {url}: {message}")]
    Io { url: Resolved, message: String },
}

impl LoadError {
    /// Stable warning code this error becomes when attached to an import
    /// or to the top-level entry load.
    pub fn warning_code(&self) -> &'static str {
        "could-not-load"
    }
}

/// Fatal, non-recoverable analyzer errors (programming/precondition
/// violations). Never produced by malformed input source — that always
/// becomes a warning instead.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("document {0} was resolved twice")]
    DoubleResolve(Resolved),

    #[error("no document shell allocated for {0}")]
    MissingDocumentShell(Resolved),

    #[error("queried document {0} that has not finished resolving")]
    DocumentNotDone(Resolved),

    #[error("invalid analyzer configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_warning_code_is_stable() {
        let err = LoadError::NotFound(Resolved::new_unchecked("file:///a.html"));
        assert_eq!(err.warning_code(), "could-not-load");
    }

    #[test]
    fn load_error_display_includes_url() {
        let err = LoadError::PathEscapesRoot(Resolved::new_unchecked("file:///etc/passwd"));
        assert!(err.to_string().contains("file:///etc/passwd"));
    }
}
