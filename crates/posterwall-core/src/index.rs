//! Per-run library index.
//!
//! One enumeration of the library per run builds an in-memory lookup from
//! normalized titles to items. Colliding keys are kept as multi-item
//! buckets and surface as ambiguity instead of silently overwriting.
//! Seasons are enumerated lazily, per show, on first lookup.

use std::collections::HashMap;

use crate::error::IndexError;
use crate::models::{ItemId, LibraryItem, MediaKind, SeasonRef};
use crate::normalize;
use crate::server::MediaServer;

/// Result of a title lookup against the index.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(LibraryItem),
    NotFound,
    /// Multiple items share the key and cannot be told apart.
    Ambiguous(Vec<LibraryItem>),
}

/// Read-only lookup table over one media server library, rebuilt fresh
/// each run. The season memo is the only mutable part, and only grows.
#[derive(Debug)]
pub struct LibraryIndex {
    library: String,
    kind: MediaKind,
    by_title: HashMap<String, Vec<LibraryItem>>,
    seasons: HashMap<ItemId, Vec<SeasonRef>>,
    extra_tags: Vec<String>,
}

impl LibraryIndex {
    /// Enumerate the named library and build the title map.
    ///
    /// Fails with `LibraryNotFound` when the server has no library of that
    /// name and kind; everything queued for the library is then skipped.
    pub async fn build<S: MediaServer>(
        server: &S,
        library: &str,
        kind: MediaKind,
        extra_tags: &[String],
    ) -> Result<Self, IndexError> {
        let libraries = server.list_libraries().await.map_err(|e| IndexError::Server {
            library: library.to_string(),
            message: e.to_string(),
        })?;
        if !libraries
            .iter()
            .any(|l| l.name == library && l.kind == kind)
        {
            return Err(IndexError::LibraryNotFound(library.to_string()));
        }

        let items = server
            .list_items(library, kind)
            .await
            .map_err(|e| IndexError::Server {
                library: library.to_string(),
                message: e.to_string(),
            })?;

        let mut by_title: HashMap<String, Vec<LibraryItem>> = HashMap::new();
        let item_count = items.len();
        for item in items {
            let key = normalize::normalize_with(&item.title, extra_tags);
            let bucket = by_title.entry(key).or_default();
            if !bucket.is_empty() {
                tracing::debug!(
                    title = %item.title,
                    existing = bucket.len(),
                    "Normalized title collision in library"
                );
            }
            bucket.push(item);
        }

        tracing::info!(
            library,
            %kind,
            items = item_count,
            keys = by_title.len(),
            "Library index built"
        );

        Ok(Self {
            library: library.to_string(),
            kind,
            by_title,
            seasons: HashMap::new(),
            extra_tags: extra_tags.to_vec(),
        })
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Look up a title, with the year as a secondary discriminator.
    ///
    /// With a year: exactly one item carrying that year wins; several carrying
    /// it are ambiguous; none means not found (the caller may retry without
    /// the year). Without a year: a single-item bucket wins, anything more is
    /// ambiguous.
    pub fn lookup(&self, title: &str, year: Option<u16>) -> Lookup {
        let key = normalize::normalize_with(title, &self.extra_tags);
        let Some(bucket) = self.by_title.get(&key) else {
            return Lookup::NotFound;
        };

        match year {
            Some(year) => {
                let with_year: Vec<&LibraryItem> =
                    bucket.iter().filter(|i| i.year == Some(year)).collect();
                match with_year.len() {
                    0 => Lookup::NotFound,
                    1 => Lookup::Found(with_year[0].clone()),
                    _ => Lookup::Ambiguous(with_year.into_iter().cloned().collect()),
                }
            }
            None => match bucket.len() {
                1 => Lookup::Found(bucket[0].clone()),
                _ => Lookup::Ambiguous(bucket.clone()),
            },
        }
    }

    /// Resolve a season of a show, enumerating the show's seasons on first
    /// use and memoizing them for the rest of the run.
    pub async fn season<S: MediaServer>(
        &mut self,
        server: &S,
        show: &LibraryItem,
        number: u32,
    ) -> Result<Option<SeasonRef>, IndexError> {
        if !self.seasons.contains_key(&show.id) {
            let listed = server
                .list_seasons(&show.id)
                .await
                .map_err(|e| IndexError::Server {
                    library: self.library.clone(),
                    message: e.to_string(),
                })?;
            tracing::debug!(show = %show.title, seasons = listed.len(), "Seasons enumerated");
            self.seasons.insert(show.id.clone(), listed);
        }

        Ok(self
            .seasons
            .get(&show.id)
            .and_then(|list| list.iter().find(|s| s.number == number))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::LibrarySummary;
    use std::sync::Mutex;

    struct FakeServer {
        libraries: Vec<LibrarySummary>,
        items: Vec<LibraryItem>,
        seasons: Vec<SeasonRef>,
        season_calls: Mutex<u32>,
    }

    impl FakeServer {
        fn movies(items: Vec<LibraryItem>) -> Self {
            Self {
                libraries: vec![LibrarySummary {
                    name: "Movies".into(),
                    kind: MediaKind::Movie,
                }],
                items,
                seasons: Vec::new(),
                season_calls: Mutex::new(0),
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("fake server error")]
    struct FakeError;

    impl MediaServer for FakeServer {
        type Error = FakeError;

        async fn list_libraries(&self) -> Result<Vec<LibrarySummary>, FakeError> {
            Ok(self.libraries.clone())
        }

        async fn list_items(
            &self,
            _library: &str,
            _kind: MediaKind,
        ) -> Result<Vec<LibraryItem>, FakeError> {
            Ok(self.items.clone())
        }

        async fn list_seasons(&self, _show: &ItemId) -> Result<Vec<SeasonRef>, FakeError> {
            *self.season_calls.lock().unwrap() += 1;
            Ok(self.seasons.clone())
        }

        async fn set_poster(&self, _target: &ItemId, _image: &[u8]) -> Result<(), FakeError> {
            Ok(())
        }
    }

    fn movie(id: &str, title: &str, year: Option<u16>) -> LibraryItem {
        LibraryItem {
            id: ItemId::new(id),
            title: title.into(),
            year,
            kind: MediaKind::Movie,
        }
    }

    #[tokio::test]
    async fn build_fails_for_unknown_library() {
        let server = FakeServer::movies(vec![]);
        let err = LibraryIndex::build(&server, "Anime", MediaKind::Movie, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::LibraryNotFound(name) if name == "Anime"));
    }

    #[tokio::test]
    async fn build_fails_for_kind_mismatch() {
        let server = FakeServer::movies(vec![]);
        let err = LibraryIndex::build(&server, "Movies", MediaKind::Show, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::LibraryNotFound(_)));
    }

    #[tokio::test]
    async fn lookup_normalizes_titles() {
        let server = FakeServer::movies(vec![movie("1", "The Matrix", Some(1999))]);
        let index = LibraryIndex::build(&server, "Movies", MediaKind::Movie, &[])
            .await
            .unwrap();

        assert!(matches!(
            index.lookup("the   MATRIX", Some(1999)),
            Lookup::Found(item) if item.id.as_str() == "1"
        ));
        assert!(matches!(
            index.lookup("The Matrix (Director's Cut)", Some(1999)),
            Lookup::Found(_)
        ));
    }

    #[tokio::test]
    async fn year_discriminates_same_title() {
        let server = FakeServer::movies(vec![
            movie("1", "Dune", Some(1984)),
            movie("2", "Dune", Some(2021)),
        ]);
        let index = LibraryIndex::build(&server, "Movies", MediaKind::Movie, &[])
            .await
            .unwrap();

        assert!(matches!(
            index.lookup("Dune", Some(2021)),
            Lookup::Found(item) if item.id.as_str() == "2"
        ));
        assert!(matches!(index.lookup("Dune", Some(1990)), Lookup::NotFound));
        assert!(matches!(index.lookup("Dune", None), Lookup::Ambiguous(c) if c.len() == 2));
    }

    #[tokio::test]
    async fn collision_without_discriminator_is_ambiguous() {
        // Two items normalize identically and share no year.
        let server = FakeServer::movies(vec![
            movie("1", "Crash", None),
            movie("2", "Crash!", None),
        ]);
        let index = LibraryIndex::build(&server, "Movies", MediaKind::Movie, &[])
            .await
            .unwrap();

        assert!(matches!(index.lookup("Crash", None), Lookup::Ambiguous(c) if c.len() == 2));
    }

    #[tokio::test]
    async fn seasons_enumerated_once_per_show() {
        let show = LibraryItem {
            id: ItemId::new("10"),
            title: "Dark".into(),
            year: Some(2017),
            kind: MediaKind::Show,
        };
        let mut server = FakeServer::movies(vec![show.clone()]);
        server.libraries = vec![LibrarySummary {
            name: "TV Shows".into(),
            kind: MediaKind::Show,
        }];
        server.seasons = vec![
            SeasonRef {
                show_id: show.id.clone(),
                number: 1,
                id: ItemId::new("11"),
            },
            SeasonRef {
                show_id: show.id.clone(),
                number: 2,
                id: ItemId::new("12"),
            },
        ];

        let mut index = LibraryIndex::build(&server, "TV Shows", MediaKind::Show, &[])
            .await
            .unwrap();

        let found = index.season(&server, &show, 2).await.unwrap();
        assert_eq!(found.unwrap().id.as_str(), "12");

        let missing = index.season(&server, &show, 5).await.unwrap();
        assert!(missing.is_none());

        // Memoized after the first enumeration.
        assert_eq!(*server.season_calls.lock().unwrap(), 1);
    }
}
