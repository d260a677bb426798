use serde::Deserialize;

use posterwall_core::models::{ItemId, LibraryItem, MediaKind, SeasonRef};

// ── MediaContainer envelope ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Deserialize, Default)]
pub struct SectionContainer {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<Section>,
}

#[derive(Debug, Deserialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Section {
    /// Sections of other kinds (music, photos) are skipped.
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self.kind.as_str() {
            "movie" => Some(MediaKind::Movie),
            "show" => Some(MediaKind::Show),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,
    pub title: String,
    pub year: Option<u16>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Season number on season rows.
    pub index: Option<u32>,
}

impl Metadata {
    pub fn into_library_item(self, kind: MediaKind) -> LibraryItem {
        LibraryItem {
            id: ItemId::new(self.rating_key),
            title: self.title,
            year: self.year,
            kind,
        }
    }

    /// Interpret a children row as a season. Non-season rows (e.g. the
    /// synthetic "All episodes" entry) return `None`.
    pub fn into_season_ref(self, show: &ItemId) -> Option<SeasonRef> {
        if self.kind != "season" {
            return None;
        }
        let number = self.index?;
        Some(SeasonRef {
            show_id: show.clone(),
            number,
            id: ItemId::new(self.rating_key),
        })
    }
}
