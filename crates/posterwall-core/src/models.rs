use serde::{Deserialize, Serialize};

/// Kind of library media an item or poster refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Show,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Show => write!(f, "show"),
        }
    }
}

/// Opaque server-side identifier (a Plex rating key). Re-resolved each run,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One poster to apply, as produced by a feed. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterDescriptor {
    pub title: String,
    pub year: Option<u16>,
    pub kind: MediaKind,
    /// Season number for show posters. `None` is the show-level cover,
    /// `Some(0)` is Specials.
    pub season: Option<u32>,
    /// Reserved: posters are set-level per season, not per-episode.
    pub episode: Option<u32>,
    pub image_url: String,
}

impl PosterDescriptor {
    /// Human-readable label carried into outcome details and logs, so the
    /// operator never has to re-derive which poster a line refers to.
    pub fn label(&self) -> String {
        let mut label = self.title.clone();
        if let Some(year) = self.year {
            label.push_str(&format!(" ({year})"));
        }
        if let Some(season) = self.season {
            label.push_str(&format!(" Season {season:02}"));
        }
        label
    }
}

/// A movie or show entry in a media server library. Identifier only; the
/// server owns the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: ItemId,
    pub title: String,
    pub year: Option<u16>,
    pub kind: MediaKind,
}

impl LibraryItem {
    /// "Title (Year)" when the year is known, bare title otherwise.
    pub fn display_name(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

/// A season under a show, addressable for poster upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRef {
    pub show_id: ItemId,
    pub number: u32,
    pub id: ItemId,
}

/// How a match was found: direct (title, year) hit, or only after
/// relaxing the year / consulting assist titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Exact,
    Fuzzy,
}

/// What a resolved match points at.
#[derive(Debug, Clone)]
pub enum MatchTarget {
    Item(LibraryItem),
    Season { show: LibraryItem, season: SeasonRef },
}

impl MatchTarget {
    /// The identifier the poster upload addresses.
    pub fn upload_id(&self) -> &ItemId {
        match self {
            Self::Item(item) => &item.id,
            Self::Season { season, .. } => &season.id,
        }
    }

    /// The library item the target belongs to (the show, for seasons).
    pub fn item(&self) -> &LibraryItem {
        match self {
            Self::Item(item) => item,
            Self::Season { show, .. } => show,
        }
    }
}

/// A descriptor resolved against the library index. Consumed once by the
/// sync executor, never persisted.
#[derive(Debug, Clone)]
pub struct Match {
    pub descriptor: PosterDescriptor,
    pub target: MatchTarget,
    pub confidence: Confidence,
}

/// Final status of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Applied,
    SkippedUnchanged,
    NotFound,
    Ambiguous,
    SeasonNotFound,
    FetchFailed,
    TransformFailed,
    CacheWriteFailed,
    UploadFailed,
    Cancelled,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Applied => "applied",
            Self::SkippedUnchanged => "unchanged",
            Self::NotFound => "not found",
            Self::Ambiguous => "ambiguous",
            Self::SeasonNotFound => "season not found",
            Self::FetchFailed => "fetch failed",
            Self::TransformFailed => "transform failed",
            Self::CacheWriteFailed => "cache write failed",
            Self::UploadFailed => "upload failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Outcome recorded for exactly one descriptor.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub descriptor: PosterDescriptor,
    pub status: SyncStatus,
    pub detail: String,
}

impl SyncOutcome {
    pub fn new(descriptor: PosterDescriptor, status: SyncStatus, detail: impl Into<String>) -> Self {
        Self {
            descriptor,
            status,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_label_variants() {
        let mut d = PosterDescriptor {
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
            image_url: "http://example/poster".into(),
        };
        assert_eq!(d.label(), "Inception (2010)");

        d.year = None;
        assert_eq!(d.label(), "Inception");

        d.year = Some(2010);
        d.kind = MediaKind::Show;
        d.season = Some(2);
        assert_eq!(d.label(), "Inception (2010) Season 02");
    }

    #[test]
    fn target_upload_id_addresses_season() {
        let show = LibraryItem {
            id: ItemId::new("10"),
            title: "Dark".into(),
            year: Some(2017),
            kind: MediaKind::Show,
        };
        let season = SeasonRef {
            show_id: show.id.clone(),
            number: 2,
            id: ItemId::new("42"),
        };
        let target = MatchTarget::Season {
            show: show.clone(),
            season,
        };
        assert_eq!(target.upload_id().as_str(), "42");
        assert_eq!(target.item().title, "Dark");

        let target = MatchTarget::Item(show);
        assert_eq!(target.upload_id().as_str(), "10");
    }
}
