//! Sync executor: turn one resolved match into local and remote writes.
//!
//! The local file is written temp-then-rename so an interrupted run never
//! leaves a half-written poster, and its content doubles as the
//! "already applied" fingerprint: deleting a cached file forces a
//! re-upload on the next run.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::error::{FetchError, UploadError};
use crate::fetch::ImageSource;
use crate::models::{Match, MatchTarget, MediaKind, SyncOutcome, SyncStatus};
use crate::server::MediaServer;
use crate::transform::ImageTransform;

/// Applies matches: fetch, re-encode, compare, cache locally, upload.
pub struct SyncExecutor<'a, F, T> {
    source: &'a F,
    transform: &'a T,
    quality: u8,
    movies_dir: PathBuf,
    shows_dir: PathBuf,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl<'a, F, T> SyncExecutor<'a, F, T>
where
    F: ImageSource,
    T: ImageTransform,
{
    pub fn new(source: &'a F, transform: &'a T, config: &AppConfig) -> Self {
        Self {
            source,
            transform,
            quality: config.image.jpeg_quality,
            movies_dir: PathBuf::from(&config.storage.movies_dir),
            shows_dir: PathBuf::from(&config.storage.shows_dir),
            retry_attempts: config.network.retry_attempts,
            retry_backoff: config.network.backoff(),
        }
    }

    /// Apply one match. All failure modes collapse into the outcome; the
    /// caller just records it and moves on.
    pub async fn apply<S: MediaServer>(&self, server: &S, matched: &Match) -> SyncOutcome {
        let descriptor = &matched.descriptor;
        let label = descriptor.label();

        let raw = match self.fetch_with_retry(&descriptor.image_url).await {
            Ok(raw) => raw,
            Err(e) => {
                return SyncOutcome::new(
                    descriptor.clone(),
                    SyncStatus::FetchFailed,
                    format!("{label}: {e}"),
                );
            }
        };

        // Deterministic decode failure: not retried.
        let image = match self.transform.compress(&raw, self.quality) {
            Ok(image) => image,
            Err(e) => {
                return SyncOutcome::new(
                    descriptor.clone(),
                    SyncStatus::TransformFailed,
                    format!("{label}: {e}"),
                );
            }
        };

        let dest = self.destination(&matched.target);
        if is_unchanged(&dest, &image) {
            tracing::debug!(path = %dest.display(), "Poster unchanged, skipping upload");
            return SyncOutcome::new(
                descriptor.clone(),
                SyncStatus::SkippedUnchanged,
                format!("{label}: poster unchanged"),
            );
        }

        if let Err(e) = write_atomic(&dest, &image) {
            return SyncOutcome::new(
                descriptor.clone(),
                SyncStatus::CacheWriteFailed,
                format!("{label}: local write failed: {e}"),
            );
        }

        if let Err(e) = self
            .upload_with_retry(server, matched.target.upload_id(), &image)
            .await
        {
            // The local file stays: the remote server is authoritative for
            // display, the local copy is only a cache.
            return SyncOutcome::new(
                descriptor.clone(),
                SyncStatus::UploadFailed,
                format!("{label}: {e}"),
            );
        }

        tracing::info!(item = %matched.target.item().display_name(), path = %dest.display(),
            "Poster applied");
        SyncOutcome::new(
            descriptor.clone(),
            SyncStatus::Applied,
            format!("{label}: poster applied"),
        )
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Bytes, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.source.fetch(url).await {
                Ok(raw) => return Ok(raw),
                Err(e) if attempt < self.retry_attempts => {
                    tracing::warn!(url, attempt, error = %e, "Poster fetch failed, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn upload_with_retry<S: MediaServer>(
        &self,
        server: &S,
        target: &crate::models::ItemId,
        image: &[u8],
    ) -> Result<(), UploadError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match server.set_poster(target, image).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retry_attempts => {
                    tracing::warn!(target = %target, attempt, error = %e,
                        "Poster upload failed, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(UploadError(e.to_string())),
            }
        }
    }

    /// Deterministic local cache path for a target.
    fn destination(&self, target: &MatchTarget) -> PathBuf {
        let (root, item, season) = match target {
            MatchTarget::Item(item) => {
                let root = match item.kind {
                    MediaKind::Movie => self.movies_dir.as_path(),
                    MediaKind::Show => self.shows_dir.as_path(),
                };
                (root, item, None)
            }
            MatchTarget::Season { show, season } => {
                (self.shows_dir.as_path(), show, Some(season.number))
            }
        };

        let mut path = root.join(sanitize_component(&item.display_name()));
        if let Some(number) = season {
            path.push(format!("Season {number:02}"));
        }
        path.push("poster.jpg");
        path
    }
}

/// (length, SHA-256) content fingerprint.
fn fingerprint(bytes: &[u8]) -> (usize, [u8; 32]) {
    (bytes.len(), Sha256::digest(bytes).into())
}

/// Whether the poster already cached at `dest` has identical content.
/// An unreadable or absent file counts as changed and gets re-applied.
fn is_unchanged(dest: &Path, image: &[u8]) -> bool {
    match std::fs::read(dest) {
        Ok(existing) => fingerprint(&existing) == fingerprint(image),
        Err(_) => false,
    }
}

/// Write via a temp file in the destination directory, then rename over
/// the target, so no exit path leaves a partial file behind.
fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = dest.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination has no parent")
    })?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Strip filesystem-reserved characters from a directory component.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | '/' | '\\'))
        .collect();
    let trimmed = cleaned.trim().to_string();
    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed
    }
}
