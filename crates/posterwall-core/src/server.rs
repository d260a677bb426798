//! Trait seams to the external services the pipeline consumes.
//!
//! Client crates implement these; the pipeline and its tests only ever see
//! the traits, so every network collaborator can be replaced with a fake.

use std::future::Future;

use crate::models::{ItemId, LibraryItem, MediaKind, SeasonRef};

/// A library visible on the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySummary {
    pub name: String,
    pub kind: MediaKind,
}

/// RPC surface of the media server, in the shape the pipeline consumes.
pub trait MediaServer: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enumerate the libraries the server exposes.
    fn list_libraries(
        &self,
    ) -> impl Future<Output = Result<Vec<LibrarySummary>, Self::Error>> + Send;

    /// Enumerate every item in the named library.
    fn list_items(
        &self,
        library: &str,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<LibraryItem>, Self::Error>> + Send;

    /// Enumerate the seasons under a show item.
    fn list_seasons(
        &self,
        show: &ItemId,
    ) -> impl Future<Output = Result<Vec<SeasonRef>, Self::Error>> + Send;

    /// Replace the poster of an item or season.
    fn set_poster(
        &self,
        target: &ItemId,
        image: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Secondary matching-assist lookup: alternative titles for a work, used
/// only after exact and year-relaxed matching both miss.
pub trait MatchAssist: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn alternative_titles(
        &self,
        title: &str,
        year: Option<u16>,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;
}
