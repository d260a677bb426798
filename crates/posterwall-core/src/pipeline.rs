//! Sequential run driver: feed → matcher → sync executor → run report.
//!
//! Indexes are built lazily per media kind, so a feed of movie posters
//! never touches the show library, and a missing library only sinks its
//! own batch. Per-item failures become outcomes; nothing past
//! configuration and index construction aborts the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::MatchFailure;
use crate::feed::PosterFeed;
use crate::fetch::ImageSource;
use crate::index::LibraryIndex;
use crate::matcher;
use crate::models::{MediaKind, PosterDescriptor, SyncOutcome, SyncStatus};
use crate::report::RunReport;
use crate::server::{MatchAssist, MediaServer};
use crate::sync::SyncExecutor;
use crate::transform::ImageTransform;

enum IndexSlot {
    Unbuilt,
    Ready(LibraryIndex),
    Failed(String),
}

/// One run of the matching-and-sync pipeline.
pub struct Pipeline<'a, S, A, F, T> {
    server: &'a S,
    assist: Option<&'a A>,
    executor: SyncExecutor<'a, F, T>,
    config: &'a AppConfig,
    cancel: Arc<AtomicBool>,
}

impl<'a, S, A, F, T> Pipeline<'a, S, A, F, T>
where
    S: MediaServer,
    A: MatchAssist,
    F: ImageSource,
    T: ImageTransform,
{
    pub fn new(
        server: &'a S,
        assist: Option<&'a A>,
        executor: SyncExecutor<'a, F, T>,
        config: &'a AppConfig,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            server,
            assist,
            executor,
            config,
            cancel,
        }
    }

    /// Process every descriptor the feed yields, in order, one outcome each.
    pub async fn run(&self, mut feed: impl PosterFeed) -> RunReport {
        let mut report = RunReport::new();
        let mut movies = IndexSlot::Unbuilt;
        let mut shows = IndexSlot::Unbuilt;

        while let Some(descriptor) = feed.next_descriptor() {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!("Run cancelled, stopping before the next poster");
                break;
            }

            let slot = match descriptor.kind {
                MediaKind::Movie => &mut movies,
                MediaKind::Show => &mut shows,
            };
            let outcome = self.process(descriptor, slot).await;
            tracing::info!(status = %outcome.status, detail = %outcome.detail, "Poster processed");
            report.record(outcome);
        }

        let summary = report.summary();
        tracing::info!(processed = report.len(), %summary, "Run complete");
        report
    }

    #[tracing::instrument(name = "poster", skip_all, fields(item = %descriptor.label()))]
    async fn process(&self, descriptor: PosterDescriptor, slot: &mut IndexSlot) -> SyncOutcome {
        let index = match self.ensure_index(slot, descriptor.kind).await {
            Ok(index) => index,
            Err(message) => {
                let label = descriptor.label();
                return SyncOutcome::new(
                    descriptor,
                    SyncStatus::NotFound,
                    format!("{label}: {message}"),
                );
            }
        };

        match matcher::resolve(&descriptor, index, self.server, self.assist).await {
            Ok(matched) => {
                // Cooperative cancellation: nothing for this item has been
                // written yet, so marking it cancelled is safe.
                if self.cancel.load(Ordering::Relaxed) {
                    let label = descriptor.label();
                    return SyncOutcome::new(
                        descriptor,
                        SyncStatus::Cancelled,
                        format!("{label}: run cancelled before apply"),
                    );
                }
                self.executor.apply(self.server, &matched).await
            }
            Err(failure) => {
                let status = match &failure {
                    MatchFailure::NotFound(_) => SyncStatus::NotFound,
                    MatchFailure::Ambiguous { .. } => SyncStatus::Ambiguous,
                    MatchFailure::SeasonNotFound { .. } => SyncStatus::SeasonNotFound,
                };
                SyncOutcome::new(descriptor, status, failure.to_string())
            }
        }
    }

    /// Build the index for a kind on first use. A failed build marks the
    /// whole batch for that library as unavailable rather than aborting
    /// the other kind's processing.
    async fn ensure_index<'i>(
        &self,
        slot: &'i mut IndexSlot,
        kind: MediaKind,
    ) -> Result<&'i mut LibraryIndex, String> {
        if matches!(slot, IndexSlot::Unbuilt) {
            let library = self.config.library_name(kind);
            *slot = match LibraryIndex::build(
                self.server,
                library,
                kind,
                &self.config.matching.extra_edition_tags,
            )
            .await
            {
                Ok(index) => IndexSlot::Ready(index),
                Err(e) => {
                    tracing::error!(library, error = %e,
                        "Library index build failed, skipping its whole batch");
                    IndexSlot::Failed(format!("library '{library}' unavailable: {e}"))
                }
            };
        }

        match slot {
            IndexSlot::Ready(index) => Ok(index),
            IndexSlot::Failed(message) => Err(message.clone()),
            IndexSlot::Unbuilt => Err("index not built".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, TransformError};
    use crate::models::{ItemId, LibraryItem, SeasonRef};
    use crate::server::LibrarySummary;
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("fake error: {0}")]
    struct FakeError(String);

    struct FakeServer {
        libraries: Vec<LibrarySummary>,
        movies: Vec<LibraryItem>,
        shows: Vec<LibraryItem>,
        seasons: Vec<SeasonRef>,
        uploads: Mutex<Vec<String>>,
    }

    impl FakeServer {
        fn with_movie_library(movies: Vec<LibraryItem>) -> Self {
            Self {
                libraries: vec![LibrarySummary {
                    name: "Movies".into(),
                    kind: MediaKind::Movie,
                }],
                movies,
                shows: Vec::new(),
                seasons: Vec::new(),
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    impl MediaServer for FakeServer {
        type Error = FakeError;

        async fn list_libraries(&self) -> Result<Vec<LibrarySummary>, FakeError> {
            Ok(self.libraries.clone())
        }

        async fn list_items(
            &self,
            _library: &str,
            kind: MediaKind,
        ) -> Result<Vec<LibraryItem>, FakeError> {
            Ok(match kind {
                MediaKind::Movie => self.movies.clone(),
                MediaKind::Show => self.shows.clone(),
            })
        }

        async fn list_seasons(&self, _show: &ItemId) -> Result<Vec<SeasonRef>, FakeError> {
            Ok(self.seasons.clone())
        }

        async fn set_poster(&self, target: &ItemId, _image: &[u8]) -> Result<(), FakeError> {
            self.uploads.lock().unwrap().push(target.as_str().to_string());
            Ok(())
        }
    }

    struct NoAssist;

    impl MatchAssist for NoAssist {
        type Error = FakeError;

        async fn alternative_titles(
            &self,
            _title: &str,
            _year: Option<u16>,
            _kind: MediaKind,
        ) -> Result<Vec<String>, FakeError> {
            Ok(Vec::new())
        }
    }

    struct FakeSource;

    impl ImageSource for FakeSource {
        async fn fetch(&self, _url: &str) -> Result<Bytes, FetchError> {
            Ok(Bytes::from_static(b"poster-bytes"))
        }
    }

    struct PassthroughTransform;

    impl ImageTransform for PassthroughTransform {
        fn compress(&self, raw: &[u8], _quality: u8) -> Result<Vec<u8>, TransformError> {
            Ok(raw.to_vec())
        }
    }

    fn config_in(root: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.movies_dir = root.join("movies").to_string_lossy().into_owned();
        config.storage.shows_dir = root.join("shows").to_string_lossy().into_owned();
        config.network.retry_backoff_ms = 0;
        config
    }

    fn inception_descriptor() -> PosterDescriptor {
        PosterDescriptor {
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
            image_url: "http://posters/inception".into(),
        }
    }

    #[tokio::test]
    async fn end_to_end_applies_single_movie() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let server = FakeServer::with_movie_library(vec![LibraryItem {
            id: ItemId::new("1"),
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
        }]);
        let source = FakeSource;
        let transform = PassthroughTransform;
        let executor = SyncExecutor::new(&source, &transform, &config);
        let pipeline = Pipeline::new(
            &server,
            None::<&NoAssist>,
            executor,
            &config,
            Arc::new(AtomicBool::new(false)),
        );

        let report = pipeline.run(vec![inception_descriptor()].into_iter()).await;

        assert_eq!(report.len(), 1);
        assert_eq!(report.outcomes()[0].status, SyncStatus::Applied);
        assert!(dir
            .path()
            .join("movies/Inception (2010)/poster.jpg")
            .is_file());
        assert_eq!(*server.uploads.lock().unwrap(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn per_item_failures_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let server = FakeServer::with_movie_library(vec![LibraryItem {
            id: ItemId::new("1"),
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
        }]);
        let source = FakeSource;
        let transform = PassthroughTransform;
        let executor = SyncExecutor::new(&source, &transform, &config);
        let pipeline = Pipeline::new(
            &server,
            None::<&NoAssist>,
            executor,
            &config,
            Arc::new(AtomicBool::new(false)),
        );

        let mut unknown = inception_descriptor();
        unknown.title = "Unknown Movie".into();
        let feed = vec![unknown, inception_descriptor()];

        let report = pipeline.run(feed.into_iter()).await;
        let statuses: Vec<_> = report.outcomes().iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![SyncStatus::NotFound, SyncStatus::Applied]);
        // The failure line still names the poster it refers to.
        assert!(report.outcomes()[0].detail.contains("Unknown Movie (2010)"));
    }

    #[tokio::test]
    async fn missing_library_sinks_only_its_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.libraries.shows = "Nonexistent".into();
        let server = FakeServer::with_movie_library(vec![LibraryItem {
            id: ItemId::new("1"),
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
        }]);
        let source = FakeSource;
        let transform = PassthroughTransform;
        let executor = SyncExecutor::new(&source, &transform, &config);
        let pipeline = Pipeline::new(
            &server,
            None::<&NoAssist>,
            executor,
            &config,
            Arc::new(AtomicBool::new(false)),
        );

        let show = PosterDescriptor {
            title: "Dark".into(),
            year: Some(2017),
            kind: MediaKind::Show,
            season: None,
            episode: None,
            image_url: "http://posters/dark".into(),
        };
        let report = pipeline
            .run(vec![show, inception_descriptor()].into_iter())
            .await;

        let statuses: Vec<_> = report.outcomes().iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![SyncStatus::NotFound, SyncStatus::Applied]);
        assert!(report.outcomes()[0].detail.contains("Nonexistent"));
    }

    #[tokio::test]
    async fn cancelled_run_stops_before_next_item() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let server = FakeServer::with_movie_library(Vec::new());
        let source = FakeSource;
        let transform = PassthroughTransform;
        let executor = SyncExecutor::new(&source, &transform, &config);
        let cancel = Arc::new(AtomicBool::new(true));
        let pipeline = Pipeline::new(&server, None::<&NoAssist>, executor, &config, cancel);

        let report = pipeline.run(vec![inception_descriptor()].into_iter()).await;
        assert!(report.is_empty());
        assert!(server.uploads.lock().unwrap().is_empty());
    }
}
