//! Raw poster image download.

use std::future::Future;

use bytes::Bytes;

use crate::error::FetchError;

/// Downloads the raw bytes behind a poster source URL.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// reqwest-backed image source. The shared client carries the request
/// timeout, so a hung download surfaces as a retryable fetch error.
pub struct HttpImageSource {
    http: reqwest::Client,
}

impl HttpImageSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        tracing::debug!(url, "Fetching poster image");

        let resp = self.http.get(url).send().await.map_err(|e| FetchError {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError {
                url: url.to_string(),
                message: format!("HTTP status {status}"),
            });
        }

        resp.bytes().await.map_err(|e| FetchError {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
