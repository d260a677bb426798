//! HTTP clients for the external services the pipeline consumes: the Plex
//! media server and the TMDb matching-assist lookup. Both implement the
//! trait seams defined in `posterwall-core`.

pub mod plex;
pub mod tmdb;
