use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{BrowseError, Result};

/// Maps client-supplied browse paths onto the filesystem under a fixed root
///
/// Every path this resolver hands out is equal to or nested under the root.
/// Anything that would leave the root is reported as `NotFound`, never as a
/// distinguishable "forbidden".
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `root`, which must be an existing directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|e| BrowseError::InvalidConfig {
            message: format!("root directory '{}' is not accessible: {}", root.display(), e),
        })?;

        if !canonical.is_dir() {
            return Err(BrowseError::InvalidConfig {
                message: format!("root '{}' is not a directory", canonical.display()),
            });
        }

        Ok(Self { root: canonical })
    }

    /// The canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Percent-decode a raw browse path, then resolve it
    pub fn resolve_encoded(&self, raw: &str) -> Result<PathBuf> {
        let decoded = urlencoding::decode(raw).map_err(|_| {
            debug!("Rejecting undecodable browse path: {}", raw);
            BrowseError::not_found(raw)
        })?;
        self.resolve(&decoded)
    }

    /// Join an already-decoded browse path onto the root
    ///
    /// Pure path computation: existence is the caller's concern.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();

        for segment in requested.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if !is_safe_segment(segment) {
                debug!("Rejecting browse path {:?} at segment {:?}", requested, segment);
                return Err(BrowseError::not_found(requested));
            }
            resolved.push(segment);
        }

        Ok(resolved)
    }

    /// Canonicalize a resolved path and check it still lies under the root
    ///
    /// Catches symlinks pointing outside the root. Containment is compared
    /// component by component, so `/data2` is never accepted under `/data`.
    pub async fn confine(&self, path: &Path) -> Result<PathBuf> {
        let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
            debug!("Cannot canonicalize {}: {}", path.display(), e);
            BrowseError::not_found(path.to_string_lossy())
        })?;

        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            debug!(
                "{} resolves to {} outside the root",
                path.display(),
                canonical.display()
            );
            Err(BrowseError::not_found(path.to_string_lossy()))
        }
    }
}

/// A segment is safe when it is a single, visible, normal path component
fn is_safe_segment(segment: &str) -> bool {
    if segment.starts_with('.') || segment.contains('\0') {
        return false;
    }

    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
