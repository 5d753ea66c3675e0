use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use crate::{
    shortener::Shortener,
    types::{DirectoryListing, FileEntry, LinkSet},
};

/// Route under which the server exposes files and directories
pub const BROWSE_ROUTE: &str = "/browse/";

/// Builds direct links for entries and shortens them as one concurrent batch
pub struct LinkPublisher {
    base_url: String,
    shortener: Arc<dyn Shortener>,
}

impl LinkPublisher {
    /// `base_url` is the public origin of this service, e.g. `http://host:8080`
    pub fn new(base_url: impl Into<String>, shortener: Arc<dyn Shortener>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            shortener,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Direct URL of an entry, each path segment percent-encoded on its own
    pub fn direct_link(&self, relative_path: &str) -> String {
        let encoded = relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!("{}{}{}", self.base_url, BROWSE_ROUTE, encoded)
    }

    /// Links for every entry of a listing, in listing order
    pub async fn publish(&self, listing: &DirectoryListing) -> LinkSet {
        let direct = listing
            .entries
            .iter()
            .map(|entry| self.direct_link(&entry.relative_path))
            .collect();
        self.publish_links(direct).await
    }

    /// Links for a single entry
    pub async fn publish_entry(&self, entry: &FileEntry) -> LinkSet {
        self.publish_links(vec![self.direct_link(&entry.relative_path)])
            .await
    }

    /// Shorten every link concurrently and pair the results up by index
    ///
    /// All calls are in flight at once; the set is returned once each has
    /// finished or fallen back, so wall-clock cost tracks the slowest call.
    pub async fn publish_links(&self, direct: Vec<String>) -> LinkSet {
        debug!(
            "Shortening {} links via {}",
            direct.len(),
            self.shortener.identifier()
        );

        let short = join_all(direct.iter().map(|url| self.shortener.shorten(url))).await;

        LinkSet { direct, short }
    }
}
