//! Analyzer configuration.
//!
//! `AnalyzerOptions` carries the tunables spec §4.1's URL resolver and §4.5's
//! analysis context leave implicit: where the package root is, what sibling
//! directory out-of-package imports redirect into, and whether to follow
//! imports at all.

use crate::error::{AnalyzerError, Result};
use crate::url::{PackageUrlResolver, Resolved};

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Anchor for package-relative resolution (§4.1).
    pub package_root: Resolved,
    /// Sibling directory out-of-package imports redirect into.
    pub component_dir: String,
    /// The "configured package hostname" of §4.1 step 2. Empty for `file:`
    /// URLs, which have no meaningful host.
    pub package_hostname: String,
    /// Whether to load and scan imported documents at all. `false` scans
    /// only the entry document — useful for single-file editor diagnostics.
    pub follow_imports: bool,
}

impl AnalyzerOptions {
    pub fn new(package_root: Resolved) -> Self {
        AnalyzerOptions {
            package_root,
            component_dir: "bower_components".to_string(),
            package_hostname: String::new(),
            follow_imports: true,
        }
    }

    pub fn with_component_dir(mut self, component_dir: impl Into<String>) -> Self {
        self.component_dir = component_dir.into();
        self
    }

    pub fn with_package_hostname(mut self, package_hostname: impl Into<String>) -> Self {
        self.package_hostname = package_hostname.into();
        self
    }

    pub fn with_follow_imports(mut self, follow_imports: bool) -> Self {
        self.follow_imports = follow_imports;
        self
    }

    /// Rejects configurations that would silently produce broken URLs
    /// downstream rather than a clear error up front.
    pub fn validate(&self) -> Result<()> {
        if self.component_dir.is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "component_dir must not be empty".to_string(),
            ));
        }
        if self.component_dir.contains('/') {
            return Err(AnalyzerError::InvalidConfig(format!(
                "component_dir must be a single path segment, got {:?}",
                self.component_dir
            )));
        }
        Ok(())
    }

    pub fn url_resolver(&self) -> PackageUrlResolver {
        PackageUrlResolver::new(
            self.package_root.clone(),
            self.component_dir.clone(),
            self.package_hostname.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_component_dir_is_rejected() {
        let opts = AnalyzerOptions::new(Resolved::new_unchecked("file:///pkg/"))
            .with_component_dir("");
        assert!(matches!(opts.validate(), Err(AnalyzerError::InvalidConfig(_))));
    }

    #[test]
    fn component_dir_with_slash_is_rejected() {
        let opts = AnalyzerOptions::new(Resolved::new_unchecked("file:///pkg/"))
            .with_component_dir("a/b");
        assert!(matches!(opts.validate(), Err(AnalyzerError::InvalidConfig(_))));
    }

    #[test]
    fn default_options_validate() {
        let opts = AnalyzerOptions::new(Resolved::new_unchecked("file:///pkg/"));
        assert!(opts.validate().is_ok());
    }
}
