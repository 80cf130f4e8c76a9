//! Pexels photo search.
//!
//! [Pexels API Documentation](https://www.pexels.com/api/documentation/)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    StatusCode,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{
    debug,
    warn,
};

use super::ImageSource;
use crate::core::{
    config::PEXELS_API_KEY_ENV,
    MediaError,
};

pub const DEFAULT_BASE_URL: &str = "https://api.pexels.com";

#[derive(Debug, Error)]
pub enum PexelsError {
    #[error("Pexels authentication failed: {0}")]
    Authentication(String),

    #[error("Pexels rate limit exceeded after {attempts} attempt(s)")]
    RateLimit { attempts: u32 },

    #[error("Pexels resource not found: {0}")]
    NotFound(String),

    #[error("No photos found for '{0}'")]
    NoResults(String),

    #[error("Pexels API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Pexels request failed: {0}")]
    Request(Box<reqwest::Error>),
}

impl From<reqwest::Error> for PexelsError {
    fn from(error: reqwest::Error) -> Self {
        PexelsError::Request(Box::new(error))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

/// Backoff used for 429 responses; nothing else is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(2), max_delay: Duration::from_secs(10) }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failed try (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub id: u64,
    pub src: PhotoSrc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoSrc {
    pub original: Option<String>,
    pub large2x: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
    pub small: Option<String>,
}

impl PhotoSrc {
    pub fn best_url(&self) -> Option<&str> {
        self.medium.as_deref().or(self.large.as_deref()).or(self.original.as_deref())
    }
}

pub struct PexelsClient {
    api_key: String,
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

impl PexelsClient {
    pub fn new(http: Client, api_key: impl Into<String>) -> Result<Self, PexelsError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PexelsError::Authentication(format!(
                "API key not provided; set {PEXELS_API_KEY_ENV}"
            )));
        }

        Ok(Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http, retry: RetryPolicy::default() })
    }

    pub fn from_env(http: Client) -> Result<Self, PexelsError> {
        Self::new(http, std::env::var(PEXELS_API_KEY_ENV).unwrap_or_default())
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    async fn request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<SearchResponse, PexelsError> {
        let url = format!("{}/v1/{}", self.base_url, endpoint);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let resp =
                self.http.get(&url).header("Authorization", &self.api_key).query(params).send().await?;

            let status = resp.status();
            match status {
                StatusCode::OK => {
                    let body = resp.text().await?;
                    return serde_json::from_str::<SearchResponse>(&body)
                        .map_err(|_| PexelsError::Api { status: status.as_u16(), body });
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(PexelsError::Authentication(resp.text().await.unwrap_or_default()))
                }
                StatusCode::NOT_FOUND => {
                    return Err(PexelsError::NotFound(resp.text().await.unwrap_or_default()))
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.retry.max_attempts {
                        return Err(PexelsError::RateLimit { attempts: attempt });
                    }
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, ?delay, "Pexels rate limit hit, backing off");
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    return Err(PexelsError::Api {
                        status: status.as_u16(),
                        body: resp.text().await.unwrap_or_default(),
                    })
                }
            }
        }
    }

    pub async fn search(
        &self,
        query: &str,
        per_page: u32,
        page: u32,
        orientation: Orientation,
    ) -> Result<SearchResponse, PexelsError> {
        let params = [
            ("query", query.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("orientation", orientation.as_str().to_string()),
        ];
        self.request("search", &params).await
    }

    /// URL of the best match on the given result page.
    pub async fn search_photo_url(
        &self,
        query: &str,
        per_page: u32,
        page: u32,
        orientation: Orientation,
    ) -> Result<String, PexelsError> {
        let response = self.search(query, per_page, page, orientation).await?;

        if response.total_results == 0 {
            return Err(PexelsError::NoResults(query.to_string()));
        }

        let url = response
            .photos
            .first()
            .and_then(|photo| photo.src.best_url())
            .ok_or_else(|| PexelsError::NotFound(format!("page {page} of '{query}' is empty")))?;

        debug!(query, page, url, "Pexels match");
        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageSource for PexelsClient {
    async fn find_image(&self, query: &str, page: u32) -> Result<String, MediaError> {
        Ok(self.search_photo_url(query, 1, page, Orientation::Landscape).await?)
    }
}
