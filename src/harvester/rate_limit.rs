//! Rate-limit absorption
//!
//! Wraps a [`SearchTransport`] so that HTTP 429 never reaches the pagination
//! controller: the request is retried after a fixed pause, for as long as the
//! API keeps refusing it. Every other failure is returned immediately.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::config::RATE_LIMIT_PAUSE;
use crate::fetcher::{
    FetchOutcome, FetcherResult, PageSource, SearchPage, SearchQuery, SearchTransport,
};
use crate::metrics;

/// Page source that sleeps through rate limits
pub struct RateLimitedFetcher<T> {
    transport: T,
    pause: Duration,
}

impl<T: SearchTransport> RateLimitedFetcher<T> {
    /// Wrap a transport with the default pause
    pub fn new(transport: T) -> Self {
        Self::with_pause(transport, RATE_LIMIT_PAUSE)
    }

    /// Wrap a transport with a custom pause
    pub fn with_pause(transport: T, pause: Duration) -> Self {
        Self { transport, pause }
    }

    /// Pause applied after each rate-limited request
    pub fn pause(&self) -> Duration {
        self.pause
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: SearchTransport> PageSource for RateLimitedFetcher<T> {
    async fn fetch_page(&self, query: &SearchQuery) -> FetcherResult<SearchPage> {
        let mut waits: u32 = 0;
        loop {
            match self.transport.fetch_once(query).await {
                FetchOutcome::Page(page) => {
                    if waits > 0 {
                        info!(waits, "Rate limit cleared, continuing");
                    }
                    return Ok(page);
                }
                FetchOutcome::RateLimited => {
                    waits += 1;
                    metrics::record_rate_limit_hit();
                    warn!(
                        waits,
                        pause_secs = self.pause.as_secs(),
                        "Rate limit reached, pausing before retry"
                    );
                    sleep(self.pause).await;
                }
                FetchOutcome::Fatal(e) => return Err(e),
            }
        }
    }
}
