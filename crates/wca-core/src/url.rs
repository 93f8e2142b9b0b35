//! URL model and resolver (C1).
//!
//! Three non-interchangeable string-tagged URL flavors, matching spec §3/§4.1:
//!
//! - [`PackageRelative`]: authored-as-written (`./foo.html`, `polymer/polymer.html`).
//! - [`FileRelative`]: relative to one specific resolved document.
//! - [`Resolved`]: an absolute URL usable with the [`crate::loader::Loader`].
//!
//! Resolution is built on the `url` crate's RFC 3986 join/parse, with a
//! package-root-aware redirect layered on top for imports that climb above
//! the configured package directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A URL string exactly as authored in an import (`./foo.html`,
/// `polymer/polymer.html`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRelative(pub String);

impl PackageRelative {
    pub fn new(s: impl Into<String>) -> Self {
        PackageRelative(s.into())
    }
}

impl fmt::Display for PackageRelative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A URL relative to a specific resolved base document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRelative(pub String);

impl FileRelative {
    pub fn new(s: impl Into<String>) -> Self {
        FileRelative(s.into())
    }
}

impl fmt::Display for FileRelative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An absolute URL (typically `file://…` or `http(s)://…`), usable with the
/// loader. The only URL flavor the loader ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resolved(pub String);

impl Resolved {
    /// Brands a string as Resolved without validation. Used for inputs
    /// already known to be absolute (e.g. an entry URL handed to
    /// `Analyzer::analyze`, or a pass-through from a foreign scheme).
    pub fn new_unchecked(s: impl Into<String>) -> Self {
        Resolved(s.into())
    }

    fn parsed(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an import statement is (e.g., an html-import vs. an html-script),
/// used by the package resolver as a tie-break hint for ambiguous cases.
/// Reserved for adapters that need finer control than plain text resolution;
/// the core resolver currently treats every hint identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportHint {
    HtmlImport,
    HtmlScript,
    HtmlStyle,
    JsImport,
}

/// Configuration for package-relative resolution (§4.1).
#[derive(Debug, Clone)]
pub struct PackageUrlResolver {
    /// The resolved URL of the package root directory (a `Resolved` whose
    /// path ends in `/`).
    package_root: Resolved,
    /// Sibling directory out-of-package imports redirect into. Default
    /// `bower_components`.
    component_dir: String,
    /// Hostname considered "the package" for scheme/host passthrough
    /// checks. Empty string means "no host" (typical for `file:` URLs).
    package_hostname: String,
}

/// Characters that make a raw (unescaped) URL string invalid input: control
/// characters and a handful of reserved characters that must be
/// percent-escaped before they can appear in a path. Real unescaped use
/// signals malformed input per spec §8 (`%><><%=` → none).
const INVALID_RAW_CHARS: &[char] = &['<', '>', '`', '"', '{', '}', '|', '\\', '^'];

fn looks_malformed(input: &str) -> bool {
    input.chars().any(|c| c.is_control() || INVALID_RAW_CHARS.contains(&c))
}

impl PackageUrlResolver {
    pub fn new(package_root: Resolved, component_dir: impl Into<String>, package_hostname: impl Into<String>) -> Self {
        PackageUrlResolver {
            package_root,
            component_dir: component_dir.into(),
            package_hostname: package_hostname.into(),
        }
    }

    pub fn package_root(&self) -> &Resolved {
        &self.package_root
    }

    /// `resolve(url: PackageRelative) → Resolved | none`
    pub fn resolve_package(&self, url: &PackageRelative) -> Option<Resolved> {
        let base = self.package_root.parsed()?;
        self.resolve_against(&base, &url.0)
    }

    /// `resolve(url: FileRelative, base: Resolved, hint?) → Resolved | none`
    pub fn resolve_file_relative(
        &self,
        url: &FileRelative,
        base: &Resolved,
        _hint: Option<ImportHint>,
    ) -> Option<Resolved> {
        let base_url = base.parsed()?;
        self.resolve_against(&base_url, &url.0)
    }

    fn resolve_against(&self, base: &Url, input: &str) -> Option<Resolved> {
        if looks_malformed(input) {
            return None;
        }

        // Step 2: scheme/authority other than the configured package host
        // passes through unchanged.
        if let Ok(absolute) = Url::parse(input) {
            let same_host = absolute.host_str().unwrap_or("") == self.package_hostname;
            if !same_host || absolute.scheme() != base.scheme() {
                return Some(Resolved(absolute.to_string()));
            }
        }

        let joined = base.join(input).ok()?;
        Some(self.redirect_if_needed(joined))
    }

    /// Steps 3-5: collapse a join result that climbed above the package
    /// root into the sibling component directory, or leave it untouched if
    /// it's inside the root or too far outside to redirect meaningfully.
    fn redirect_if_needed(&self, joined: Url) -> Resolved {
        let root = match self.package_root.parsed() {
            Some(r) => r,
            None => return Resolved(joined.to_string()),
        };
        if joined.scheme() != root.scheme() || joined.host_str() != root.host_str() {
            return Resolved(joined.to_string());
        }

        let root_segments: Vec<&str> = path_segments(&root);
        let joined_segments: Vec<&str> = path_segments(&joined);

        let common = root_segments
            .iter()
            .zip(joined_segments.iter())
            .take_while(|(a, b)| a == b)
            .count();

        if common == root_segments.len() {
            // Inside the package root (or exactly at it): keep as-is.
            return Resolved(joined.to_string());
        }

        let levels_above = root_segments.len() - common;
        if levels_above != 1 {
            // Further up than an immediate parent: leave external, unchanged.
            return Resolved(joined.to_string());
        }

        // Immediate parent: redirect into <packageRoot>/<componentDir>/<rest>.
        let rest = &joined_segments[common..];
        let mut new_segments: Vec<&str> = root_segments.clone();
        new_segments.push(&self.component_dir);
        new_segments.extend(rest.iter().copied());

        let mut redirected = root.clone();
        redirected.set_path(&format!("/{}", new_segments.join("/")));
        if let Some(q) = joined.query() {
            redirected.set_query(Some(q));
        }
        if let Some(fr) = joined.fragment() {
            redirected.set_fragment(Some(fr));
        }
        Resolved(redirected.to_string())
    }
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// `relative(from, to) → FileRelative`
///
/// Computes a POSIX path-relative reference from `from`'s containing
/// directory to `to`. If `to` differs from `from` in scheme/host, `to` is
/// returned unchanged (branded `FileRelative`) — there is no meaningful
/// relative form across origins.
pub fn relative(from: &Resolved, to: &Resolved) -> FileRelative {
    let (Some(from_url), Some(to_url)) = (from.parsed(), to.parsed()) else {
        return FileRelative(to.0.clone());
    };
    if from_url.scheme() != to_url.scheme() || from_url.host_str() != to_url.host_str() {
        return FileRelative(to.0.clone());
    }

    let from_segments = path_segments(&from_url);
    let to_segments = path_segments(&to_url);

    // `from`'s *directory* is all but its last segment (the document itself).
    let from_dir = if from_segments.is_empty() {
        &from_segments[..]
    } else {
        &from_segments[..from_segments.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(to_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let mut parts: Vec<String> = std::iter::repeat("..".to_string()).take(ups).collect();
    parts.extend(to_segments[common..].iter().map(|s| s.to_string()));

    let trailing_slash = to_url.path().ends_with('/');
    let mut rel = if parts.is_empty() {
        String::new()
    } else {
        parts.join("/")
    };
    if trailing_slash && !rel.is_empty() {
        rel.push('/');
    } else if trailing_slash && rel.is_empty() {
        rel.push('.');
        rel.push('/');
    }
    if rel.is_empty() {
        rel.push('.');
    }

    let mut result = rel;
    if let Some(q) = to_url.query() {
        result.push('?');
        result.push_str(q);
    }
    if let Some(fr) = to_url.fragment() {
        result.push('#');
        result.push_str(fr);
    }
    FileRelative(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(root: &str) -> PackageUrlResolver {
        PackageUrlResolver::new(Resolved::new_unchecked(root), "bower_components", "")
    }

    #[test]
    fn malformed_path_returns_none() {
        let r = resolver("file:///1/2/");
        assert_eq!(
            r.resolve_package(&PackageRelative::new("%><><%=")),
            None
        );
    }

    #[test]
    fn spaced_name_percent_encodes() {
        let r = resolver("file:///pkg/");
        let resolved = r
            .resolve_package(&PackageRelative::new("spaced name.html"))
            .unwrap();
        assert_eq!(resolved.0, "file:///pkg/spaced%20name.html");
    }

    #[test]
    fn inside_package_root_is_kept() {
        let r = resolver("file:///pkg/");
        let resolved = r.resolve_package(&PackageRelative::new("./foo.html")).unwrap();
        assert_eq!(resolved.0, "file:///pkg/foo.html");
    }

    #[test]
    fn immediate_parent_redirects_into_component_dir() {
        let r = resolver("file:///1/2/");
        let resolved = r
            .resolve_package(&PackageRelative::new("../foo/foo.html"))
            .unwrap();
        assert_eq!(resolved.0, "file:///1/2/bower_components/foo/foo.html");
    }

    #[test]
    fn further_up_stays_external() {
        let r = resolver("file:///1/2/");
        let resolved = r
            .resolve_package(&PackageRelative::new("../../foo/foo.html"))
            .unwrap();
        assert_eq!(resolved.0, "file:///foo/foo.html");
    }

    #[test]
    fn foreign_scheme_passes_through() {
        let r = resolver("file:///pkg/");
        let resolved = r
            .resolve_package(&PackageRelative::new("https://example.com/a.js"))
            .unwrap();
        assert_eq!(resolved.0, "https://example.com/a.js");
    }

    #[test]
    fn relative_is_identity_for_same_document() {
        let a = Resolved::new_unchecked("file:///pkg/a.html");
        assert_eq!(relative(&a, &a).0, "a.html");
    }

    #[test]
    fn relative_across_directories() {
        let from = Resolved::new_unchecked("file:///pkg/sub/a.html");
        let to = Resolved::new_unchecked("file:///pkg/b.html");
        assert_eq!(relative(&from, &to).0, "../b.html");
    }

    #[test]
    fn relative_into_subdirectory() {
        let from = Resolved::new_unchecked("file:///pkg/a.html");
        let to = Resolved::new_unchecked("file:///pkg/sub/b.html");
        assert_eq!(relative(&from, &to).0, "sub/b.html");
    }

    #[test]
    fn relative_differing_host_passes_through() {
        let from = Resolved::new_unchecked("file:///pkg/a.html");
        let to = Resolved::new_unchecked("https://example.com/b.html");
        assert_eq!(relative(&from, &to).0, "https://example.com/b.html");
    }

    #[test]
    fn relative_resolve_round_trip() {
        let r = resolver("file:///pkg/");
        let from = Resolved::new_unchecked("file:///pkg/sub/a.html");
        let to = Resolved::new_unchecked("file:///pkg/sub/other/b.html");
        let rel = relative(&from, &to);
        let resolved = r
            .resolve_file_relative(&FileRelative::new(rel.0.clone()), &from, None)
            .unwrap();
        assert_eq!(resolved, to);
    }
}
