//! Ingestion orchestration and rate limiting
//!
//! # Overview
//!
//! The harvester ties the pieces of one ingestion together:
//!
//! 1. **Configuration**: Runtime settings via [`config::HarvestConfig`]
//! 2. **Rate Limiting**: HTTP 429 absorbed by [`rate_limit::RateLimitedFetcher`]
//! 3. **Pagination**: One bounded run via [`crate::fetcher::pagination::PaginationController`]
//! 4. **Orchestration**: Repeated runs per edition via [`executor::IngestionDriver`]
//! 5. **Reporting**: Progress bars and run notifications
//!
//! # Quick Start
//!
//! ```no_run
//! use wordle_harvester::harvester::{HarvestConfig, IngestionDriver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::from_env()?;
//! let mut driver = IngestionDriver::from_config(&config)?;
//! let summary = driver.harvest_edition(250).await?;
//! println!("{} records", summary.records_written);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T, HarvestError>`:
//! - Rate limits never surface; the fetcher waits them out
//! - Any other request failure ends the run after a final flush
//! - Store failures end the run immediately
//! - Rejected posts are counted, never raised

pub mod config;
pub mod executor;
pub mod notify;
pub mod progress;
pub mod rate_limit;

pub use crate::fetcher::pagination::{RunOutcome, RunReport};
pub use config::{ConfigError, ExecutionMode, HarvestConfig};
pub use executor::{EditionSummary, IngestionDriver};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use rate_limit::RateLimitedFetcher;

use crate::edition::EditionError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Harvest errors
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Search request failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetcherError),

    /// Store could not be read or written
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Edition argument unusable
    #[error("edition error: {0}")]
    Edition(#[from] EditionError),

    /// Configuration unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
