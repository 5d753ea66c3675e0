//! Startup configuration.
//!
//! Values come from command-line flags with environment fallbacks and are
//! validated once into an immutable [`ServerConfig`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::{BrowseError, Result};
use crate::shortener::DEFAULT_SHORTENER_URL;

/// Browse a directory over HTTP and publish direct and shortened links.
#[derive(Parser, Debug, Clone)]
#[command(name = "browse-links")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory to expose
    #[arg(short, long, env = "BROWSE_ROOT", value_name = "DIR", default_value = "video")]
    pub root: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = "BROWSE_BIND", value_name = "ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Public base URL used in direct links [default: http://<bind>]
    #[arg(long, env = "BROWSE_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Link shortening endpoint
    #[arg(long, env = "BROWSE_SHORTENER_URL", value_name = "URL", default_value = DEFAULT_SHORTENER_URL)]
    pub shortener_url: String,

    /// Per-call shortening timeout in seconds
    #[arg(long, env = "BROWSE_SHORTEN_TIMEOUT", value_name = "SECS", default_value = "5")]
    pub shorten_timeout: u64,

    /// Skip the shortening service; short links equal direct links
    #[arg(long)]
    pub no_shorten: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated, read-only configuration shared by every component
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Canonical root directory
    pub root_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Base URL without a trailing slash
    pub base_url: String,
    /// `None` disables shortening
    pub shortener_url: Option<String>,
    pub shorten_timeout: Duration,
}

impl ServerConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let root_dir = std::fs::canonicalize(&args.root).map_err(|e| BrowseError::InvalidConfig {
            message: format!("root directory '{}' does not exist: {}", args.root.display(), e),
        })?;
        if !root_dir.is_dir() {
            return Err(BrowseError::InvalidConfig {
                message: format!("root '{}' is not a directory", root_dir.display()),
            });
        }

        let base_url = match &args.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => default_base_url(args.bind),
        };
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BrowseError::InvalidConfig {
                message: format!("base URL must start with http:// or https://, got {}", base_url),
            });
        }

        if args.shorten_timeout == 0 {
            return Err(BrowseError::InvalidConfig {
                message: "shorten timeout must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            root_dir,
            bind_addr: args.bind,
            base_url,
            shortener_url: (!args.no_shorten).then(|| args.shortener_url.clone()),
            shorten_timeout: Duration::from_secs(args.shorten_timeout),
        })
    }
}

/// `http://<bind>`, with a wildcard address swapped for loopback
fn default_base_url(bind: SocketAddr) -> String {
    let host = if bind.ip().is_unspecified() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), bind.port())
    } else {
        bind
    };
    format!("http://{}", host)
}
