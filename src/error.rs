use thiserror::Error;

/// Errors that can occur while browsing or publishing links
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Shortening service error: {message}")]
    Shortener { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl BrowseError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        BrowseError::NotFound { path: path.into() }
    }

    /// Whether the error should reach a client as a plain not-found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BrowseError::NotFound { .. } | BrowseError::NotADirectory { .. }
        )
    }
}

/// Result type alias for browse operations
pub type Result<T> = std::result::Result<T, BrowseError>;
