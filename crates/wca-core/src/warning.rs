//! The structured warning model (C8).
//!
//! Per spec §7, malformed input almost never produces a `Result::Err`: it
//! produces a [`Warning`] attached to whatever feature, document, or import
//! it was found on. The stable `code` values are listed in spec §6 and
//! reproduced in [`codes`].

use serde::{Deserialize, Serialize};

use crate::text::SourceRange;
use crate::url::Resolved;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single diagnostic produced while scanning or resolving a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    pub severity: Severity,
    pub source_range: SourceRange,
    /// URL of the document the warning is attached to — the document the
    /// offending source range lives in, not necessarily the entry document.
    pub document_url: Resolved,
}

impl Warning {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        source_range: SourceRange,
        document_url: Resolved,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            severity,
            source_range,
            document_url,
        }
    }
}

/// Stable warning codes, per spec §6. Kept as string constants rather than
/// an enum so scanners can emit codes the exporter and CLI don't need to
/// know about ahead of time — the schema treats `code` as an open string.
pub mod codes {
    pub const COULD_NOT_LOAD: &str = "could-not-load";
    pub const PARSE_ERROR: &str = "parse-error";
    pub const COULD_NOT_RESOLVE_REFERENCE: &str = "could-not-resolve-reference";
    pub const MULTIPLE_GLOBAL_DECLARATIONS: &str = "multiple-global-declarations";
    pub const CLASS_EXTENDS_ANNOTATION_NO_ID: &str = "class-extends-annotation-no-id";
    pub const INVALID_POLYMER_CALL: &str = "invalid-polymer-call";
    pub const DYNAMIC_NAMESPACE_NO_NAME: &str = "dynamic-namespace-no-name";
    pub const INVALID_DATABINDING: &str = "invalid-databinding";
    pub const INVALID_ATTRIBUTE: &str = "invalid-attribute";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Position;

    #[test]
    fn warning_carries_stable_code_and_document() {
        let range = SourceRange::new(Position::new(0, 0), Position::new(0, 5));
        let doc = Resolved::new_unchecked("file:///a.html");
        let warning = Warning::new(
            codes::PARSE_ERROR,
            "unexpected token",
            Severity::Warning,
            range,
            doc.clone(),
        );
        assert_eq!(warning.code, codes::PARSE_ERROR);
        assert_eq!(warning.document_url, doc);
    }
}
