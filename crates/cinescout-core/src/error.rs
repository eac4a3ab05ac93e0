use thiserror::Error;

/// All the ways things can go wrong in CineScout
///
/// We use thiserror here because it generates the boilerplate for us.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to persist favorites: {0}")]
    Persistence(String),

    #[error("Invalid favorite item: {0}")]
    InvalidItem(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<cinescout_api::TmdbError> for Error {
    fn from(err: cinescout_api::TmdbError) -> Self {
        Error::ApiError(err.to_string())
    }
}
