use reqwest::Client;
use url::Url;

use posterwall_core::models::{ItemId, LibraryItem, MediaKind, SeasonRef};
use posterwall_core::server::{LibrarySummary, MediaServer};

use super::error::PlexError;
use super::types::{Envelope, MetadataContainer, SectionContainer};

/// Plex HTTP API client. Token auth via the `X-Plex-Token` header; the
/// JSON accept header switches the server off its default XML envelope.
pub struct PlexClient {
    base_url: Url,
    token: String,
    http: Client,
}

impl PlexClient {
    pub fn new(base_url: Url, token: impl Into<String>, http: Client) -> Self {
        Self {
            base_url,
            token: token.into(),
            http,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, PlexError> {
        self.base_url
            .join(path)
            .map_err(|e| PlexError::Url(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PlexError> {
        tracing::debug!(path, "Plex request");

        let resp = self
            .http
            .get(self.endpoint(path)?)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "Plex API error");
            return Err(PlexError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))
    }

    /// Resolve a library name to its section key.
    async fn section_key(&self, library: &str, kind: MediaKind) -> Result<String, PlexError> {
        let env: Envelope<SectionContainer> = self.get_json("/library/sections").await?;
        env.media_container
            .directories
            .into_iter()
            .find(|d| d.title == library && d.media_kind() == Some(kind))
            .map(|d| d.key)
            .ok_or_else(|| PlexError::LibraryNotFound(library.to_string()))
    }
}

impl MediaServer for PlexClient {
    type Error = PlexError;

    async fn list_libraries(&self) -> Result<Vec<LibrarySummary>, PlexError> {
        let env: Envelope<SectionContainer> = self.get_json("/library/sections").await?;
        Ok(env
            .media_container
            .directories
            .into_iter()
            .filter_map(|d| {
                let kind = d.media_kind()?;
                Some(LibrarySummary {
                    name: d.title,
                    kind,
                })
            })
            .collect())
    }

    async fn list_items(
        &self,
        library: &str,
        kind: MediaKind,
    ) -> Result<Vec<LibraryItem>, PlexError> {
        let key = self.section_key(library, kind).await?;
        let env: Envelope<MetadataContainer> = self
            .get_json(&format!("/library/sections/{key}/all"))
            .await?;

        let items: Vec<LibraryItem> = env
            .media_container
            .metadata
            .into_iter()
            .map(|m| m.into_library_item(kind))
            .collect();
        tracing::debug!(library, count = items.len(), "Listed library items");
        Ok(items)
    }

    async fn list_seasons(&self, show: &ItemId) -> Result<Vec<SeasonRef>, PlexError> {
        let env: Envelope<MetadataContainer> = self
            .get_json(&format!("/library/metadata/{show}/children"))
            .await?;

        Ok(env
            .media_container
            .metadata
            .into_iter()
            .filter_map(|m| m.into_season_ref(show))
            .collect())
    }

    async fn set_poster(&self, target: &ItemId, image: &[u8]) -> Result<(), PlexError> {
        let url = self.endpoint(&format!("/library/metadata/{target}/posters"))?;
        tracing::debug!(target = %target, bytes = image.len(), "Uploading poster");

        let resp = self
            .http
            .post(url)
            .header("X-Plex-Token", &self.token)
            .body(image.to_vec())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PlexError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
