// Provider implementations for movie data sources
pub mod tmdb;

pub use tmdb::TmdbProvider;
