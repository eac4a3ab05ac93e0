// TMDB provider implementation - bridges API client with CatalogProvider trait
use async_trait::async_trait;
use cinescout_api::{RetryConfig, TmdbClient, TmdbPage};

use crate::{catalog::CatalogProvider, config::Config, models::Movie, Result};

/// Wrapper around TmdbClient that implements CatalogProvider
pub struct TmdbProvider {
    client: TmdbClient,
}

impl TmdbProvider {
    pub fn new(token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: TmdbClient::new(token)?,
        })
    }

    /// Build from config: env token, custom API URL
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = TmdbClient::with_base_url(config.tmdb_token(), config.tmdb.api_url.clone())?;
        Ok(Self { client })
    }

    pub fn with_retry_config(self, retry_config: RetryConfig) -> Self {
        Self {
            client: self.client.with_retry_config(retry_config),
        }
    }
}

#[async_trait]
impl CatalogProvider for TmdbProvider {
    async fn trending(&self) -> Result<Vec<Movie>> {
        Ok(page_to_movies(self.client.trending().await?))
    }

    async fn popular(&self) -> Result<Vec<Movie>> {
        Ok(page_to_movies(self.client.popular().await?))
    }

    async fn search(&self, query: &str) -> Result<Vec<Movie>> {
        Ok(page_to_movies(self.client.search(query).await?))
    }
}

/// Convert a TMDB result page into our internal Movie model
fn page_to_movies(page: TmdbPage) -> Vec<Movie> {
    page.results.into_iter().map(Movie::from).collect()
}
