//! ThePosterDB scraping: turns set pages and single-poster pages into
//! structured poster descriptors for the core pipeline.

pub mod error;
pub mod posterdb;

pub use error::ScrapeError;
pub use posterdb::{is_posterdb_url, is_single_poster_url, PosterDbScraper};
