//! Harvest configuration
//!
//! Protocol constants shared by every run, and the runtime settings read from
//! the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::search_http::DEFAULT_BASE_URL;

/// Maximum number of search calls in one controller run.
/// Matches the search quota of one 15 minute rate-limit window, so a run that
/// spends its budget has also drained the quota.
pub const PAGE_BUDGET: usize = 450;

/// Pages between two flushes of the record buffer.
/// Bounds the rework after a crash to this many pages.
pub const FLUSH_INTERVAL_PAGES: usize = 50;

/// Pause after a rate-limited request before retrying.
/// The quota window resets after 15 minutes; checking every minute picks up
/// an early reset.
pub const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

/// Environment variable holding the bearer token
pub const ENV_BEARER_TOKEN: &str = "BEARER_TOKEN";

/// Environment variable selecting the execution mode
pub const ENV_MODE: &str = "HARVEST_MODE";

/// Environment variable overriding the output directory
pub const ENV_DATA_DIR: &str = "HARVEST_DATA_DIR";

/// Environment variable overriding the API host
pub const ENV_API_BASE: &str = "SEARCH_API_BASE";

/// Environment variable enabling the Prometheus exporter
pub const ENV_METRICS_ADDR: &str = "HARVEST_METRICS_ADDR";

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable not set
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    /// Variable set to an unusable value
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// How the harvester is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Operator at a terminal: progress bar, files under `data/`
    #[default]
    Interactive,
    /// Scheduled job: log output only, files in the working directory
    Unattended,
}

impl ExecutionMode {
    /// Default output directory for the mode
    pub fn default_data_dir(&self) -> PathBuf {
        match self {
            ExecutionMode::Interactive => PathBuf::from("data"),
            ExecutionMode::Unattended => PathBuf::from("."),
        }
    }

    /// Whether a terminal progress bar should be drawn
    pub fn shows_progress(&self) -> bool {
        matches!(self, ExecutionMode::Interactive)
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "interactive" | "local" | "pc" => Ok(ExecutionMode::Interactive),
            "unattended" | "ci" | "github" => Ok(ExecutionMode::Unattended),
            _ => Err(format!(
                "Invalid execution mode: {s}. Valid options: interactive, unattended"
            )),
        }
    }
}

/// Runtime settings for an ingestion driver
#[derive(Clone)]
pub struct HarvestConfig {
    /// App-only bearer token
    pub bearer_token: String,
    /// Execution mode
    pub mode: ExecutionMode,
    /// Explicit output directory, overriding the mode default
    pub data_dir: Option<PathBuf>,
    /// API host
    pub api_base: String,
    /// Prometheus listener address
    pub metrics_addr: Option<SocketAddr>,
    /// Calls per controller run
    pub page_budget: usize,
    /// Pages between flushes
    pub flush_interval: usize,
    /// Pause after a rate-limited call
    pub rate_limit_pause: Duration,
}

impl std::fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("bearer_token", &"<redacted>")
            .field("mode", &self.mode)
            .field("data_dir", &self.data_dir)
            .field("api_base", &self.api_base)
            .field("metrics_addr", &self.metrics_addr)
            .field("page_budget", &self.page_budget)
            .field("flush_interval", &self.flush_interval)
            .field("rate_limit_pause", &self.rate_limit_pause)
            .finish()
    }
}

impl HarvestConfig {
    /// Default settings around a bearer token
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            mode: ExecutionMode::default(),
            data_dir: None,
            api_base: DEFAULT_BASE_URL.to_string(),
            metrics_addr: None,
            page_budget: PAGE_BUDGET,
            flush_interval: FLUSH_INTERVAL_PAGES,
            rate_limit_pause: RATE_LIMIT_PAUSE,
        }
    }

    /// Load settings from the process environment, reading `.env` first
    ///
    /// # Errors
    /// Returns an error if the bearer token is missing or a variable is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bearer_token = lookup(ENV_BEARER_TOKEN)
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_BEARER_TOKEN))?;

        let mut config = Self::new(bearer_token.trim());

        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse().map_err(|_| ConfigError::Invalid {
                name: ENV_MODE,
                value: mode.clone(),
            })?;
        }

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|dir| !dir.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(base) = lookup(ENV_API_BASE).filter(|base| !base.is_empty()) {
            config.api_base = base;
        }

        if let Some(addr) = lookup(ENV_METRICS_ADDR).filter(|addr| !addr.is_empty()) {
            let parsed = addr.parse().map_err(|_| ConfigError::Invalid {
                name: ENV_METRICS_ADDR,
                value: addr.clone(),
            })?;
            config.metrics_addr = Some(parsed);
        }

        Ok(config)
    }

    /// Override the execution mode
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the output directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Override the rate-limit pause
    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = pause;
        self
    }

    /// Output directory in effect
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.mode.default_data_dir())
    }
}
