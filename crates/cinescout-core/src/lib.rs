// Core of CineScout: the stores the front end talks to, plus the catalog seam
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod genres;
pub mod models;
pub mod providers;
pub mod theme;

pub use auth::{
    AuthError, AuthErrorCode, AuthFlow, AuthProvider, MemoryAuthProvider, SessionGate, StartScreen,
    User,
};
pub use catalog::{Catalog, CatalogProvider, HomeFeed, SearchDebouncer, SearchState};
pub use config::Config;
pub use error::Error;
pub use favorites::FavoritesStore;
pub use models::{FavoriteId, FavoriteItem, FieldValue, MediaType, Movie};
pub use theme::{Palette, ThemePreference, ThemeStore};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
