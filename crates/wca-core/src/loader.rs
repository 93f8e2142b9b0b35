//! Content loading (C2).
//!
//! A [`Loader`] turns a [`Resolved`] URL into source text. The analysis
//! context never touches the filesystem or network directly — it always
//! goes through a `Loader`, which is what makes [`crate::context::Analyzer`]
//! testable with an in-memory fixture instead of real files.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, PathBuf};
use std::pin::Pin;

use crate::error::LoadError;
use crate::url::Resolved;

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LoadError>> + Send + 'a>>;

/// Source of document content, keyed by [`Resolved`] URL.
pub trait Loader: Send + Sync {
    /// Whether this loader claims responsibility for `url`. The analysis
    /// context tries loaders in registration order and uses the first
    /// that returns `true`.
    fn can_load(&self, url: &Resolved) -> bool;

    fn load<'a>(&'a self, url: &'a Resolved) -> LoadFuture<'a>;
}

/// Loads `file:` URLs from a directory root, refusing to read outside it.
///
/// Mirrors this workspace's sandboxed-path-resolution discipline: every
/// load is checked against `root` after normalizing `..` components, so a
/// malicious or buggy import can't escape the analyzed package onto the
/// rest of the filesystem.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsLoader { root: root.into() }
    }

    fn path_for(&self, url: &Resolved) -> Result<PathBuf, LoadError> {
        let parsed = url::Url::parse(&url.0)
            .map_err(|_| LoadError::UnsupportedScheme(url.clone()))?;
        if parsed.scheme() != "file" {
            return Err(LoadError::UnsupportedScheme(url.clone()));
        }
        let raw_path = parsed
            .to_file_path()
            .map_err(|_| LoadError::UnsupportedScheme(url.clone()))?;

        let mut normalized = PathBuf::new();
        for component in raw_path.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(LoadError::PathEscapesRoot(url.clone()));
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }

        if !normalized.starts_with(&self.root) {
            return Err(LoadError::PathEscapesRoot(url.clone()));
        }
        Ok(normalized)
    }
}

impl Loader for FsLoader {
    fn can_load(&self, url: &Resolved) -> bool {
        url.0.starts_with("file:")
    }

    fn load<'a>(&'a self, url: &'a Resolved) -> LoadFuture<'a> {
        Box::pin(async move {
            let path = self.path_for(url)?;
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        LoadError::NotFound(url.clone())
                    } else {
                        LoadError::Io {
                            url: url.clone(),
                            message: e.to_string(),
                        }
                    }
                })
        })
    }
}

/// An in-memory fixture loader for tests: a fixed map of URL to content.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn with(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(url.into(), content.into());
        self
    }
}

impl Loader for MemoryLoader {
    fn can_load(&self, url: &Resolved) -> bool {
        self.files.contains_key(&url.0)
    }

    fn load<'a>(&'a self, url: &'a Resolved) -> LoadFuture<'a> {
        let result = self
            .files
            .get(&url.0)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(url.clone()));
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_loader_round_trips_known_url() {
        let loader = MemoryLoader::new().with("file:///pkg/a.html", "<p>hi</p>");
        let url = Resolved::new_unchecked("file:///pkg/a.html");
        assert!(loader.can_load(&url));
        assert_eq!(loader.load(&url).await.unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn memory_loader_reports_not_found() {
        let loader = MemoryLoader::new();
        let url = Resolved::new_unchecked("file:///missing.html");
        assert!(matches!(
            loader.load(&url).await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn fs_loader_rejects_path_escaping_root() {
        let dir = std::env::temp_dir().join("wca-core-loader-test");
        tokio::fs::create_dir_all(&dir).await.ok();
        let loader = FsLoader::new(&dir);
        let escaping = Resolved::new_unchecked("file:///etc/passwd");
        assert!(matches!(
            loader.load(&escaping).await,
            Err(LoadError::PathEscapesRoot(_)) | Err(LoadError::UnsupportedScheme(_))
        ));
    }
}
