use thiserror::Error;

/// Errors from the Plex API client.
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("library not found: {0}")]
    LibraryNotFound(String),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("parse error: {0}")]
    Parse(String),
}
