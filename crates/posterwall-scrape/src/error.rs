use thiserror::Error;

/// Errors from poster page scraping.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page load failed for {url}: {message}")]
    Page { url: String, message: String },

    #[error("selector error: {0}")]
    Selector(String),

    #[error("parse error: {0}")]
    Parse(String),
}
