//! Movie database access: transport, response validation and the cached,
//! cancellable client the rest of the application talks to.

pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
pub mod error;
pub mod types;

pub use cached_client::CachedMovieClient;
pub use client::OmdbClient;
pub use error::MovieError;
pub use types::{MovieDetail, MovieSummary, SearchQuery, SearchResult};
