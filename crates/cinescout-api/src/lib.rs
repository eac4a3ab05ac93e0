// API client for The Movie Database (TMDB)
pub mod retry;
pub mod tmdb;

// Re-export common types
pub use retry::RetryConfig;
pub use tmdb::{TmdbClient, TmdbError, TmdbMovie, TmdbPage};
