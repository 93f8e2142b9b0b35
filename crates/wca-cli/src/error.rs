//! CLI-level error type and exit-code mapping.
//!
//! Exit codes: `2` bad arguments, `3` load/resolution failure, `10` internal
//! error. Every other failure surface in this workspace (scanning, resolving
//! references, loading a missing file) becomes a [`wca_core::warning::Warning`]
//! long before it reaches the CLI — these three variants are what's left.

use thiserror::Error;

use wca_core::error::AnalyzerError;
use wca_export::ExportError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("could not resolve entry: {0}")]
    ResolutionFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidArguments(_) => 2,
            CliError::ResolutionFailure(_) => 3,
            CliError::Internal(_) => 10,
        }
    }
}

impl From<AnalyzerError> for CliError {
    fn from(err: AnalyzerError) -> Self {
        match err {
            AnalyzerError::InvalidConfig(message) => CliError::InvalidArguments(message),
            other => CliError::Internal(other.to_string()),
        }
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        CliError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_stable_table() {
        assert_eq!(CliError::InvalidArguments(String::new()).exit_code(), 2);
        assert_eq!(CliError::ResolutionFailure(String::new()).exit_code(), 3);
        assert_eq!(CliError::Internal(String::new()).exit_code(), 10);
    }

    #[test]
    fn invalid_config_maps_to_invalid_arguments() {
        let err: CliError = AnalyzerError::InvalidConfig("bad".to_string()).into();
        assert!(matches!(err, CliError::InvalidArguments(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn other_analyzer_errors_map_to_internal() {
        let err: CliError =
            AnalyzerError::DocumentNotDone(wca_core::url::Resolved::new_unchecked("file:///a"))
                .into();
        assert!(matches!(err, CliError::Internal(_)));
        assert_eq!(err.exit_code(), 10);
    }
}
