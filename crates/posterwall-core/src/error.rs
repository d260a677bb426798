use thiserror::Error;

/// Fatal configuration problems, detected before any processing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Index construction failures. Fatal for that library's whole batch,
/// since nothing in it can be matched.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("library not found on server: {0}")]
    LibraryNotFound(String),

    #[error("server error while reading library {library}: {message}")]
    Server { library: String, message: String },
}

/// Why a descriptor failed to resolve. Per-item, recorded and skipped.
#[derive(Debug, Error)]
pub enum MatchFailure {
    #[error("no library item matches {0}")]
    NotFound(String),

    #[error("ambiguous match for {label}: {candidates}")]
    Ambiguous { label: String, candidates: String },

    #[error("{show} has no season {season:02}")]
    SeasonNotFound { show: String, season: u32 },
}

/// Image download failure (non-2xx, timeout, transport). Retryable.
#[derive(Debug, Error)]
#[error("fetch failed for {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

/// Deterministic image decode or re-encode failure. Never retried.
#[derive(Debug, Error)]
#[error("transform failed: {0}")]
pub struct TransformError(pub String);

/// Remote poster upload failure. Retryable; the local cache write stays.
#[derive(Debug, Error)]
#[error("upload failed: {0}")]
pub struct UploadError(pub String);
