//! Descriptor resolution against the library index.
//!
//! Ladder: exact (title, year) → year-relaxed retry → assist alternative
//! titles. Ambiguity surfaces immediately at every rung; it is never
//! resolved by falling through to a fuzzier pass, so a poster can never
//! land on the wrong of two look-alike titles.

use crate::error::MatchFailure;
use crate::index::{LibraryIndex, Lookup};
use crate::models::{Confidence, LibraryItem, Match, MatchTarget, MediaKind, PosterDescriptor};
use crate::server::{MatchAssist, MediaServer};

/// Resolve one descriptor to a library item — and, for show posters with a
/// season number, to the season below it.
pub async fn resolve<S, A>(
    descriptor: &PosterDescriptor,
    index: &mut LibraryIndex,
    server: &S,
    assist: Option<&A>,
) -> Result<Match, MatchFailure>
where
    S: MediaServer,
    A: MatchAssist,
{
    let (item, confidence) = resolve_item(descriptor, index, assist).await?;

    let target = match (descriptor.kind, descriptor.season) {
        (MediaKind::Show, Some(number)) => {
            let season = match index.season(server, &item, number).await {
                Ok(season) => season,
                Err(e) => {
                    tracing::warn!(show = %item.title, season = number, error = %e,
                        "Season enumeration failed");
                    None
                }
            };
            match season {
                Some(season) => MatchTarget::Season { show: item, season },
                None => {
                    return Err(MatchFailure::SeasonNotFound {
                        show: item.display_name(),
                        season: number,
                    });
                }
            }
        }
        _ => MatchTarget::Item(item),
    };

    Ok(Match {
        descriptor: descriptor.clone(),
        target,
        confidence,
    })
}

async fn resolve_item<A: MatchAssist>(
    descriptor: &PosterDescriptor,
    index: &LibraryIndex,
    assist: Option<&A>,
) -> Result<(LibraryItem, Confidence), MatchFailure> {
    // Pass 1: exact (title, year).
    match index.lookup(&descriptor.title, descriptor.year) {
        Lookup::Found(item) => {
            tracing::debug!(item = %item.display_name(), "Exact match");
            return Ok((item, Confidence::Exact));
        }
        Lookup::Ambiguous(candidates) => return Err(ambiguous(descriptor, &candidates)),
        Lookup::NotFound => {}
    }

    // Pass 2: relax the year. Poster sites and servers disagree on
    // festival-release vs. theatrical years often enough to matter.
    if descriptor.year.is_some() {
        match index.lookup(&descriptor.title, None) {
            Lookup::Found(item) => {
                tracing::debug!(
                    item = %item.display_name(),
                    descriptor_year = descriptor.year,
                    "Year-relaxed match"
                );
                return Ok((item, Confidence::Fuzzy));
            }
            Lookup::Ambiguous(candidates) => return Err(ambiguous(descriptor, &candidates)),
            Lookup::NotFound => {}
        }
    }

    // Pass 3: alternative titles from the assist service, best-effort.
    if let Some(assist) = assist {
        match assist
            .alternative_titles(&descriptor.title, descriptor.year, descriptor.kind)
            .await
        {
            Ok(titles) => {
                for alt in titles.iter().filter(|t| **t != descriptor.title) {
                    match index.lookup(alt, None) {
                        Lookup::Found(item) => {
                            tracing::debug!(
                                item = %item.display_name(),
                                alt_title = %alt,
                                "Assist-title match"
                            );
                            return Ok((item, Confidence::Fuzzy));
                        }
                        Lookup::Ambiguous(candidates) => {
                            return Err(ambiguous(descriptor, &candidates));
                        }
                        Lookup::NotFound => {}
                    }
                }
            }
            Err(e) => {
                tracing::warn!(title = %descriptor.title, error = %e,
                    "Assist lookup failed, continuing without it");
            }
        }
    }

    Err(MatchFailure::NotFound(descriptor.label()))
}

fn ambiguous(descriptor: &PosterDescriptor, candidates: &[LibraryItem]) -> MatchFailure {
    MatchFailure::Ambiguous {
        label: descriptor.label(),
        candidates: candidates
            .iter()
            .map(LibraryItem::display_name)
            .collect::<Vec<_>>()
            .join(", "),
    }
}
