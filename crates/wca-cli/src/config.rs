//! Optional `wca.toml` workspace config.
//!
//! Mirrors [`wca_core::workspace::AnalyzerOptions`]'s tunables so a project
//! can pin them once instead of passing flags on every invocation. CLI flags
//! still win over the file, which still wins over the built-in defaults —
//! flag > file > default.

use std::path::Path;

use serde::Deserialize;

use crate::error::CliError;

/// On-disk shape of `wca.toml`. Every field is optional; an absent field
/// falls through to `AnalyzerOptions`'s own default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WcaConfig {
    pub component_dir: Option<String>,
    pub package_hostname: Option<String>,
    pub follow_imports: Option<bool>,
}

impl WcaConfig {
    /// Loads `wca.toml` from `workspace_root` if it exists. A missing file
    /// is not an error — it just means every tunable falls back to its
    /// CLI-flag-or-default value.
    pub fn load(workspace_root: &Path) -> Result<Self, CliError> {
        let path = workspace_root.join("wca.toml");
        if !path.exists() {
            return Ok(WcaConfig::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            CliError::InvalidArguments(format!("could not read {}: {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| {
            CliError::InvalidArguments(format!("could not parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = std::env::temp_dir().join("wca-cli-config-test-missing");
        let config = WcaConfig::load(&dir).unwrap();
        assert!(config.component_dir.is_none());
    }

    #[test]
    fn malformed_file_is_an_invalid_arguments_error() {
        let dir = std::env::temp_dir().join(format!("wca-cli-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("wca.toml"), "component_dir = [").unwrap();
        let err = WcaConfig::load(&dir).unwrap_err();
        assert!(matches!(err, CliError::InvalidArguments(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
