use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{BrowseError, Result};

/// Default public shortening endpoint
pub const DEFAULT_SHORTENER_URL: &str = "http://tinyurl.com/api-create.php";

/// Default bound on a single shortening call
pub const DEFAULT_SHORTEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Core abstraction for link shortening backends
///
/// Shortening is best-effort: implementors never fail, they hand back the
/// input URL whenever the shortened form is unavailable.
#[async_trait]
pub trait Shortener: Send + Sync {
    /// Shorten `url`, or return it unchanged
    async fn shorten(&self, url: &str) -> String;

    /// Get a human-readable identifier for this backend (for logging/debugging)
    fn identifier(&self) -> String;
}

/// Shortener backed by a TinyURL-style HTTP endpoint
///
/// Sends `url=<link>` as a form POST and expects the shortened URL as the
/// plain-text body. One attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct TinyUrlShortener {
    endpoint: String,
    timeout: Duration,
}

impl TinyUrlShortener {
    /// Create a shortener for `endpoint` with a per-call `timeout`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the outbound call, surfacing every failure
    async fn request(&self, url: &str) -> Result<String> {
        // Each call gets its own client so no connection outlives it
        let client = Client::builder()
            .user_agent(concat!("browse-links/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let response = client
            .post(&self.endpoint)
            .form(&[("url", url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowseError::Shortener {
                message: format!("endpoint returned {}", status),
            });
        }

        let body = response.text().await?;
        let short = body.trim();
        if !(short.starts_with("http://") || short.starts_with("https://")) {
            return Err(BrowseError::Shortener {
                message: format!("unexpected response body {:?}", short),
            });
        }

        Ok(short.to_string())
    }
}

impl Default for TinyUrlShortener {
    fn default() -> Self {
        Self::new(DEFAULT_SHORTENER_URL, DEFAULT_SHORTEN_TIMEOUT)
    }
}

#[async_trait]
impl Shortener for TinyUrlShortener {
    async fn shorten(&self, url: &str) -> String {
        match tokio::time::timeout(self.timeout, self.request(url)).await {
            Ok(Ok(short)) => {
                debug!("Shortened {} to {}", url, short);
                short
            }
            Ok(Err(e)) => {
                warn!("Shortening {} failed, using direct link: {}", url, e);
                url.to_string()
            }
            Err(_) => {
                warn!(
                    "Shortening {} timed out after {:?}, using direct link",
                    url, self.timeout
                );
                url.to_string()
            }
        }
    }

    fn identifier(&self) -> String {
        format!("tinyurl({})", self.endpoint)
    }
}

/// Shortener that leaves every link as-is
pub struct PassthroughShortener;

#[async_trait]
impl Shortener for PassthroughShortener {
    async fn shorten(&self, url: &str) -> String {
        url.to_string()
    }

    fn identifier(&self) -> String {
        "passthrough".to_string()
    }
}
