//! CLI error types and conversions

use crate::edition::EditionError;
use crate::harvester::{ConfigError, HarvestError};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Harvest error
    #[error("harvest error: {0}")]
    HarvestError(#[from] HarvestError),

    /// Edition error
    #[error("edition error: {0}")]
    EditionError(#[from] EditionError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] ConfigError),

    /// Harvest stopped before the API ran out of posts
    #[error("edition {0} stopped without progress and is incomplete")]
    IncompleteEdition(u32),

    /// Metrics exporter could not be started
    #[error("metrics error: {0}")]
    MetricsError(String),
}
