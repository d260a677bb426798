use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One search hit. Movie and TV payloads use different field names for
/// the same things, so both sets are modeled and resolved by accessors.
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
}

impl SearchResult {
    /// Release year parsed from "YYYY-MM-DD".
    pub fn year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok())
    }

    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }

    pub fn original_title(&self) -> Option<&str> {
        self.original_title.as_deref().or(self.original_name.as_deref())
    }
}

/// Alternative titles payload. Movies key the list "titles", TV keys it
/// "results"; the alias accepts both.
#[derive(Debug, Deserialize)]
pub struct AlternativeTitlesResponse {
    #[serde(default, alias = "results")]
    pub titles: Vec<AlternativeTitle>,
}

#[derive(Debug, Deserialize)]
pub struct AlternativeTitle {
    pub title: String,
}
