use reqwest::Client;

use posterwall_core::models::MediaKind;
use posterwall_core::server::MatchAssist;

use super::error::TmdbError;
use super::types::{AlternativeTitlesResponse, SearchResponse};

const API_BASE: &str = "https://api.themoviedb.org/3";

/// How many search hits to consider when looking for a year match.
const MAX_SEARCH_RESULTS: usize = 5;

/// TMDb client for the secondary matching-assist lookup.
pub struct TmdbClient {
    api_key: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, http: Client) -> Self {
        Self {
            api_key: api_key.into(),
            http,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        tracing::debug!(path, "TMDb request");

        let resp = self
            .http
            .get(format!("{API_BASE}/{path}"))
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "TMDb API error");
            return Err(TmdbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))
    }
}

impl MatchAssist for TmdbClient {
    type Error = TmdbError;

    /// Collect alternative titles for a work: search, pick the first hit
    /// whose release year agrees (any hit when the descriptor has none),
    /// then pull that hit's alternative-titles list.
    async fn alternative_titles(
        &self,
        title: &str,
        year: Option<u16>,
        kind: MediaKind,
    ) -> Result<Vec<String>, TmdbError> {
        let search_path = match kind {
            MediaKind::Movie => "search/movie",
            MediaKind::Show => "search/tv",
        };
        let search: SearchResponse = self.get_json(search_path, &[("query", title)]).await?;

        let mut titles: Vec<String> = Vec::new();
        let candidate = search
            .results
            .iter()
            .take(MAX_SEARCH_RESULTS)
            .find(|r| match year {
                Some(year) => r.year() == Some(year),
                None => true,
            });

        if let Some(result) = candidate {
            if let Some(t) = result.display_title() {
                push_unique(&mut titles, t);
            }
            if let Some(t) = result.original_title() {
                push_unique(&mut titles, t);
            }

            let alt_path = match kind {
                MediaKind::Movie => format!("movie/{}/alternative_titles", result.id),
                MediaKind::Show => format!("tv/{}/alternative_titles", result.id),
            };
            // Best-effort: a failed second call still leaves the search titles.
            match self
                .get_json::<AlternativeTitlesResponse>(&alt_path, &[])
                .await
            {
                Ok(alts) => {
                    for alt in alts.titles {
                        push_unique(&mut titles, &alt.title);
                    }
                }
                Err(e) => {
                    tracing::warn!(title, error = %e, "Alternative-titles fetch failed");
                }
            }
        }

        tracing::debug!(title, count = titles.len(), "Assist titles collected");
        Ok(titles)
    }
}

fn push_unique(titles: &mut Vec<String>, candidate: &str) {
    if !candidate.is_empty() && !titles.iter().any(|t| t == candidate) {
        titles.push(candidate.to_string());
    }
}
