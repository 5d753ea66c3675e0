pub mod config;
pub mod error;
pub mod listing;
pub mod path;
pub mod publisher;
pub mod render;
pub mod server;
pub mod service;
pub mod shortener;
pub mod types;

pub use config::{Args, ServerConfig};
pub use error::{BrowseError, Result};
pub use listing::DirectoryLister;
pub use path::PathResolver;
pub use publisher::LinkPublisher;
pub use service::{BrowseService, Browsed};
pub use shortener::{PassthroughShortener, Shortener, TinyUrlShortener};
pub use types::{format_size, DirectoryListing, EntryType, FileEntry, LinkSet};
