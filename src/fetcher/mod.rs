//! Search API access
//!
//! A [`SearchTransport`] issues exactly one request and reports a tagged
//! [`FetchOutcome`]. The rate-limit aware [`PageSource`] built on top of it
//! lives in [`crate::harvester::rate_limit`], and the
//! [`pagination::PaginationController`] drives it page by page.

use crate::edition::SearchWindow;
use async_trait::async_trait;

pub mod pagination;
pub mod response;
pub mod search_http;

pub use response::{RawPost, SearchPage};

/// Number of posts requested per page
pub const PAGE_SIZE: u32 = 100;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-success status other than a rate limit
    #[error("HTTP error {status}: {body}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Parameters of one search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Query text
    pub q: String,
    /// Upper post id bound (inclusive); `None` requests the newest page
    pub max_id: Option<u64>,
    /// Page size
    pub count: u32,
}

impl SearchQuery {
    /// Query for one edition's window below an optional cursor
    pub fn for_window(window: &SearchWindow, max_id: Option<u64>) -> Self {
        Self {
            q: window.search_phrase(),
            max_id,
            count: PAGE_SIZE,
        }
    }

    /// Query string pairs as sent to the API
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q.clone()),
            ("result_type", "recent".to_string()),
            ("count", self.count.to_string()),
        ];
        if let Some(max_id) = self.max_id {
            params.push(("max_id", max_id.to_string()));
        }
        params
    }
}

/// Outcome of a single search request
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page received
    Page(SearchPage),
    /// Request was rejected by the rate limiter (HTTP 429)
    RateLimited,
    /// Any other failure; never retried
    Fatal(FetcherError),
}

/// Issues one search request per call
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Execute the query once
    async fn fetch_once(&self, query: &SearchQuery) -> FetchOutcome;
}

/// Source of search pages with transient failures already absorbed
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page
    ///
    /// # Errors
    /// Returns the fatal error that ended the request
    async fn fetch_page(&self, query: &SearchQuery) -> FetcherResult<SearchPage>;
}
