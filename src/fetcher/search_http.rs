//! HTTP transport for the search API
//!
//! One GET per call against the v1.1 standard search endpoint with a bearer
//! token attached. Status classification:
//! - 2xx: page decoded from JSON
//! - 429: [`FetchOutcome::RateLimited`]
//! - anything else, or a transport failure: [`FetchOutcome::Fatal`]

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::fetcher::{FetchOutcome, FetcherError, SearchPage, SearchQuery, SearchTransport};
use crate::metrics;

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Standard search endpoint path
pub const SEARCH_ENDPOINT: &str = "/1.1/search/tweets.json";

/// User agent sent with every request
const USER_AGENT: &str = concat!("wordle-harvester/", env!("CARGO_PKG_VERSION"));

/// Search API client
pub struct SearchHttpClient {
    client: Arc<Client>,
    base_url: String,
    bearer_token: String,
}

impl SearchHttpClient {
    /// Create a client over a shared reqwest client
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client
    /// * `base_url` - API host without trailing slash (e.g., "<https://api.twitter.com>")
    /// * `bearer_token` - App-only bearer token
    pub fn new(
        client: Arc<Client>,
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    /// Build the shared reqwest client used by [`SearchHttpClient::new`]
    pub fn build_client() -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
    }

    /// Full search URL
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, SEARCH_ENDPOINT)
    }
}

impl fmt::Debug for SearchHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHttpClient")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl SearchTransport for SearchHttpClient {
    async fn fetch_once(&self, query: &SearchQuery) -> FetchOutcome {
        let url = self.search_url();
        let params = query.to_params();

        debug!(max_id = ?query.max_id, "Making search request to {}", url);
        metrics::record_search_request();

        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&params)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Network error on search request: {}", e);
                return FetchOutcome::Fatal(FetcherError::NetworkError(e.to_string()));
            }
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::RateLimited;
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "Search request failed");
            return FetchOutcome::Fatal(FetcherError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<SearchPage>().await {
            Ok(page) => {
                debug!("Received {} posts", page.statuses.len());
                FetchOutcome::Page(page)
            }
            Err(e) => FetchOutcome::Fatal(FetcherError::ParseError(format!(
                "Failed to deserialize search response: {e}"
            ))),
        }
    }
}
