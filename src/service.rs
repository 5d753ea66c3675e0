use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::{
    config::ServerConfig,
    error::{BrowseError, Result},
    listing::DirectoryLister,
    path::PathResolver,
    publisher::LinkPublisher,
    shortener::{PassthroughShortener, Shortener, TinyUrlShortener},
    types::{DirectoryListing, FileEntry, LinkSet},
};

/// What a browse path turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum Browsed {
    /// A regular file; `path` is canonical and inside the root
    File { path: PathBuf, entry: FileEntry },
    /// A directory and its current listing
    Directory(DirectoryListing),
}

/// Per-request orchestration of resolving, listing and link publishing
///
/// Holds only read-only configuration, so one instance serves every request.
pub struct BrowseService {
    resolver: PathResolver,
    lister: DirectoryLister,
    publisher: LinkPublisher,
}

impl BrowseService {
    pub fn new(resolver: PathResolver, publisher: LinkPublisher) -> Self {
        let lister = DirectoryLister::new(resolver.root());
        Self {
            resolver,
            lister,
            publisher,
        }
    }

    /// Wire up the service from startup configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let resolver = PathResolver::new(&config.root_dir)?;
        let shortener: Arc<dyn Shortener> = match &config.shortener_url {
            Some(endpoint) => Arc::new(TinyUrlShortener::new(
                endpoint.clone(),
                config.shorten_timeout,
            )),
            None => Arc::new(PassthroughShortener),
        };
        let publisher = LinkPublisher::new(config.base_url.clone(), shortener);
        Ok(Self::new(resolver, publisher))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Browse a raw, still percent-encoded path taken from a request URI
    pub async fn browse_encoded(&self, raw: &str) -> Result<Browsed> {
        let path = self.resolver.resolve_encoded(raw)?;
        self.browse_resolved(path).await
    }

    /// Browse an already-decoded path
    pub async fn browse(&self, requested: &str) -> Result<Browsed> {
        let path = self.resolver.resolve(requested)?;
        self.browse_resolved(path).await
    }

    /// Links for everything directly under `requested`, or for the file itself
    pub async fn links(&self, requested: &str) -> Result<LinkSet> {
        match self.browse(requested).await? {
            Browsed::Directory(listing) => Ok(self.publisher.publish(&listing).await),
            Browsed::File { entry, .. } => Ok(self.publisher.publish_entry(&entry).await),
        }
    }

    async fn browse_resolved(&self, path: PathBuf) -> Result<Browsed> {
        let path = self.resolver.confine(&path).await?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|_| BrowseError::not_found(path.to_string_lossy()))?;

        if !metadata.is_dir() {
            return self.file(path).await;
        }

        match self.lister.list(&path).await {
            Ok(listing) => Ok(Browsed::Directory(listing)),
            // Swapped for a file since the stat above
            Err(BrowseError::NotADirectory { .. }) => {
                debug!("{} is no longer a directory", path.display());
                self.file(path).await
            }
            Err(e) => Err(e),
        }
    }

    async fn file(&self, path: PathBuf) -> Result<Browsed> {
        let entry = self.lister.describe_file(&path).await?;
        Ok(Browsed::File { path, entry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> (TempDir, BrowseService) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("movies")).unwrap();
        std::fs::write(dir.path().join("movies").join("a b.mp4"), b"abc").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"0123456789").unwrap();

        let resolver = PathResolver::new(dir.path()).unwrap();
        let publisher = LinkPublisher::new("http://host", Arc::new(PassthroughShortener));
        (dir, BrowseService::new(resolver, publisher))
    }

    #[tokio::test]
    async fn test_browse_root_lists_directory() {
        let (_dir, service) = service();
        match assert_ok!(service.browse("").await) {
            Browsed::Directory(listing) => {
                let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, ["movies", "readme.txt"]);
            }
            other => panic!("expected a directory, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_browse_file() {
        let (_dir, service) = service();
        match assert_ok!(service.browse_encoded("movies/a%20b.mp4").await) {
            Browsed::File { path, entry } => {
                assert!(path.ends_with("movies/a b.mp4"));
                assert_eq!(entry.relative_path, "movies/a b.mp4");
                assert_eq!(entry.size_bytes, Some(3));
            }
            other => panic!("expected a file, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_browse_traversal_is_not_found() {
        let (_dir, service) = service();
        let err = assert_err!(service.browse("../../etc/passwd").await);
        assert!(err.is_not_found());
        let err = assert_err!(service.browse_encoded("..%2F..%2Fetc%2Fpasswd").await);
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_browse_missing_is_not_found() {
        let (_dir, service) = service();
        let err = assert_err!(service.browse("movies/missing.mp4").await);
        assert!(matches!(err, BrowseError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_browse_special_file_is_not_found() {
        let (dir, service) = service();
        let _socket = std::os::unix::net::UnixListener::bind(dir.path().join("app.sock")).unwrap();

        let err = assert_err!(service.browse("app.sock").await);
        assert!(matches!(err, BrowseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_links_for_directory_and_file() {
        let (_dir, service) = service();

        let links = assert_ok!(service.links("").await);
        assert_eq!(
            links.direct,
            vec!["http://host/browse/movies", "http://host/browse/readme.txt"]
        );
        assert_eq!(links.short, links.direct);

        let links = assert_ok!(service.links("movies/a b.mp4").await);
        assert_eq!(links.direct, vec!["http://host/browse/movies/a%20b.mp4"]);
    }

    #[tokio::test]
    async fn test_links_for_missing_path() {
        let (_dir, service) = service();
        assert!(service.links("nope").await.unwrap_err().is_not_found());
    }
}
