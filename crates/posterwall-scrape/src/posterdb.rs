//! ThePosterDB page parsing.
//!
//! Set pages carry a grid of tiles, one per poster, each with a media-type
//! tooltip, a poster id, and a "Title (Year)" caption — shows add a
//! " - Season N" / " - Specials" suffix. Single-poster pages carry one
//! title heading and a type row. Fetching and parsing are split so the
//! parsers run against canned HTML in tests.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use posterwall_core::models::{MediaKind, PosterDescriptor};

use crate::error::ScrapeError;

const ASSET_BASE: &str = "https://theposterdb.com/api/assets";

/// Browser User-Agent; the site serves scrapers a challenge page otherwise.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

const FETCH_ATTEMPTS: u32 = 3;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Whether a page reference points at ThePosterDB at all.
pub fn is_posterdb_url(url: &str) -> bool {
    url.contains("theposterdb.com")
}

/// Whether a reference is a single-poster page rather than a set.
pub fn is_single_poster_url(url: &str) -> bool {
    url.contains("/poster/")
}

/// Scraper over ThePosterDB pages. Selectors and patterns are compiled
/// once at construction.
pub struct PosterDbScraper {
    http: Client,
    tile: Selector,
    tile_type: Selector,
    tile_overlay: Selector,
    tile_title: Selector,
    single_type: Selector,
    single_title: Selector,
    page_title: Selector,
    title_year: Regex,
    season_suffix: Regex,
}

impl PosterDbScraper {
    pub fn new(http: Client) -> Result<Self, ScrapeError> {
        Ok(Self {
            http,
            tile: selector("div.col-6.col-lg-2.p-1")?,
            tile_type: selector(r#"a.text-white[data-toggle="tooltip"]"#)?,
            tile_overlay: selector("div.overlay[data-poster-id]")?,
            tile_title: selector("p.p-0.mb-1.text-break")?,
            single_type: selector("p.pb-0.mb-0")?,
            single_title: selector("p.h1 a")?,
            page_title: selector("title")?,
            title_year: Regex::new(r"^(?P<title>.+?)\s*\((?P<year>\d{4})\)")
                .map_err(|e| ScrapeError::Parse(e.to_string()))?,
            season_suffix: Regex::new(r"(?i)^season\s+(\d+)$")
                .map_err(|e| ScrapeError::Parse(e.to_string()))?,
        })
    }

    /// Fetch and parse a page reference, dispatching on its shape.
    pub async fn scrape(&self, url: &str) -> Result<Vec<PosterDescriptor>, ScrapeError> {
        let html = self.fetch_page(url).await?;
        if is_single_poster_url(url) {
            self.parse_single(url, &html)
        } else {
            Ok(self.parse_set(&html))
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(url, attempt, "Fetching page");

            match self
                .http
                .get(url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    return resp.text().await.map_err(ScrapeError::Http);
                }
                Ok(resp) => {
                    let status = resp.status();
                    if attempt >= FETCH_ATTEMPTS {
                        return Err(ScrapeError::Page {
                            url: url.to_string(),
                            message: format!("HTTP status {status}"),
                        });
                    }
                    tracing::warn!(url, %status, attempt, "Page load failed, retrying");
                }
                Err(e) => {
                    if attempt >= FETCH_ATTEMPTS {
                        return Err(ScrapeError::Http(e));
                    }
                    tracing::warn!(url, error = %e, attempt, "Page fetch error, retrying");
                }
            }
            tokio::time::sleep(FETCH_RETRY_DELAY).await;
        }
    }

    /// Parse a set page's poster grid.
    pub fn parse_set(&self, html: &str) -> Vec<PosterDescriptor> {
        let document = Html::parse_document(html);
        let mut descriptors = Vec::new();

        for tile in document.select(&self.tile) {
            let Some(media_type) = tile
                .select(&self.tile_type)
                .next()
                .and_then(|a| a.value().attr("title"))
            else {
                continue;
            };
            let Some(poster_id) = tile
                .select(&self.tile_overlay)
                .next()
                .and_then(|d| d.value().attr("data-poster-id"))
            else {
                continue;
            };
            let Some(caption) = tile
                .select(&self.tile_title)
                .next()
                .map(|p| p.text().collect::<String>())
            else {
                continue;
            };
            let caption = caption.trim();
            let image_url = format!("{ASSET_BASE}/{poster_id}");

            match media_type {
                "Movie" => {
                    let (title, year) = self.split_title_year(caption);
                    tracing::debug!(%title, ?year, "Movie poster found");
                    descriptors.push(PosterDescriptor {
                        title,
                        year,
                        kind: MediaKind::Movie,
                        season: None,
                        episode: None,
                        image_url,
                    });
                }
                "Show" => {
                    let (rest, season) = self.split_season_suffix(caption);
                    let (title, year) = self.split_title_year(&rest);
                    tracing::debug!(%title, ?year, ?season, "Show poster found");
                    descriptors.push(PosterDescriptor {
                        title,
                        year,
                        kind: MediaKind::Show,
                        season,
                        episode: None,
                        image_url,
                    });
                }
                other => {
                    tracing::debug!(media_type = other, "Skipping unsupported poster type");
                }
            }
        }

        if descriptors.is_empty() {
            tracing::warn!("No posters found on set page");
        }
        descriptors
    }

    /// Parse a single-poster page.
    pub fn parse_single(
        &self,
        url: &str,
        html: &str,
    ) -> Result<Vec<PosterDescriptor>, ScrapeError> {
        let poster_id = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let image_url = format!("{ASSET_BASE}/{poster_id}");

        let document = Html::parse_document(html);

        let media_type = document
            .select(&self.single_type)
            .find_map(|p| {
                let text = p.text().collect::<String>();
                text.split_once("Type:")
                    .map(|(_, rest)| rest.trim().to_string())
            })
            .unwrap_or_else(|| "Movie".to_string());

        let heading = document
            .select(&self.single_title)
            .next()
            .or_else(|| document.select(&self.page_title).next())
            .map(|e| e.text().collect::<String>())
            .ok_or_else(|| ScrapeError::Parse(format!("no title heading on {url}")))?;
        let heading = heading.trim();

        let (rest, season) = self.split_season_suffix(heading);
        let (title, year) = self.split_title_year(&rest);
        if title.is_empty() {
            return Err(ScrapeError::Parse(format!("unparseable title on {url}")));
        }

        let kind = if media_type == "Show" {
            MediaKind::Show
        } else {
            MediaKind::Movie
        };
        tracing::debug!(%title, ?year, ?season, %kind, "Single poster parsed");

        Ok(vec![PosterDescriptor {
            title,
            year,
            kind,
            season: if kind == MediaKind::Show { season } else { None },
            episode: None,
            image_url,
        }])
    }

    /// "Title (2010) …" → ("Title", Some(2010)); captions without a year
    /// come back whole.
    fn split_title_year(&self, caption: &str) -> (String, Option<u16>) {
        if let Some(captures) = self.title_year.captures(caption) {
            let title = captures["title"].trim().to_string();
            let year = captures["year"].parse().ok();
            (title, year)
        } else {
            (caption.trim().to_string(), None)
        }
    }

    /// Split a trailing " - Season N" / " - Specials" marker off a show
    /// caption. Anything else after " - " is part of the title.
    fn split_season_suffix(&self, caption: &str) -> (String, Option<u32>) {
        if let Some((head, tail)) = caption.rsplit_once(" - ") {
            let tail = tail.trim();
            if tail.eq_ignore_ascii_case("specials") {
                return (head.trim().to_string(), Some(0));
            }
            if let Some(captures) = self.season_suffix.captures(tail) {
                if let Ok(number) = captures[1].parse() {
                    return (head.trim().to_string(), Some(number));
                }
            }
        }
        (caption.trim().to_string(), None)
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(e.to_string()))
}
