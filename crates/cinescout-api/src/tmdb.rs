use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

const TRENDING_PATH: &str = "/trending/movie/week";
// The app's "popular" rail has always been TV, not movies
const POPULAR_PATH: &str = "/tv/popular";
const SEARCH_PATH: &str = "/search/movie";

#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("API request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication required - check your TMDB token")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl TmdbError {
    /// Whether asking again could plausibly give a different answer
    pub fn is_retryable(&self) -> bool {
        match self {
            TmdbError::RateLimitExceeded => true,
            TmdbError::NetworkError(e) => !e.is_builder() && !e.is_decode(),
            TmdbError::RequestFailed { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            TmdbError::NotFound(_) | TmdbError::AuthRequired | TmdbError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TmdbError>;

pub struct TmdbClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl TmdbClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, TMDB_API_BASE.to_string())
    }

    /// Point the client somewhere other than the public API (proxies, tests)
    pub fn with_base_url(token: Option<String>, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("CineScout/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Swap the retry policy
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Movies trending this week
    pub async fn trending(&self) -> Result<TmdbPage> {
        self.get_page(TRENDING_PATH, &[]).await
    }

    /// First page of popular TV titles
    pub async fn popular(&self) -> Result<TmdbPage> {
        self.get_page(POPULAR_PATH, &[("language", "en-US"), ("page", "1")])
            .await
    }

    /// Free-text movie search, first page only
    pub async fn search(&self, query: &str) -> Result<TmdbPage> {
        self.get_page(
            SEARCH_PATH,
            &[
                ("query", query),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", "1"),
            ],
        )
        .await
    }

    async fn get_page(&self, path: &str, params: &[(&str, &str)]) -> Result<TmdbPage> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.token.clone();

        with_retry(&self.retry_config, TmdbError::is_retryable, || async {
            let mut request = self.client.get(&url).query(params);

            if let Some(ref token) = token {
                request = request.bearer_auth(token);
            }

            debug!("GET {}", url);
            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(TmdbError::NotFound(path.to_string()));
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(TmdbError::AuthRequired);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(TmdbError::RateLimitExceeded);
            }

            let body = response.text().await?;

            if !status.is_success() {
                return Err(TmdbError::RequestFailed {
                    status: status.as_u16(),
                    message: body,
                });
            }

            parse_page(&body)
        })
        .await
    }
}

/// Parse a TMDB list response body
pub fn parse_page(body: &str) -> Result<TmdbPage> {
    Ok(serde_json::from_str(body)?)
}

/// One page of list results - every list endpoint we use has this shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// A movie or TV result as TMDB returns it
///
/// Movies come with `title`/`release_date`, TV shows with
/// `name`/`first_air_date`. Everything except the id is optional in practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub popularity: Option<f64>,
}
