//! Harvest command implementation

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::CliError;
use crate::edition::EditionArg;
use crate::harvester::{EditionSummary, ExecutionMode, HarvestConfig, IngestionDriver};
use crate::metrics;

/// Wordle result harvester CLI
#[derive(Parser, Debug)]
#[command(name = "wordle-harvester")]
#[command(about = "Harvest Wordle result posts into per-edition CSV files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Edition number, or `latest` for the newest edition whose window has closed
    pub edition: EditionArg,

    /// Run without a terminal: no progress bar, files in the working directory
    ///
    /// Also selected by HARVEST_MODE=unattended.
    #[arg(long, default_value_t = false)]
    pub unattended: bool,

    /// Keep going with the following editions until one is too early to harvest
    #[arg(long, default_value_t = false)]
    pub forward: bool,

    /// Directory for the CSV files (default: "data", or "." when unattended)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply the flags on top of the environment configuration
    pub fn apply(&self, mut config: HarvestConfig) -> HarvestConfig {
        if self.unattended {
            config = config.with_mode(ExecutionMode::Unattended);
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        config
    }

    /// Execute the harvest
    ///
    /// # Errors
    /// Returns an error if configuration is incomplete or the harvest fails
    pub async fn execute(&self) -> Result<(), CliError> {
        let config = self.apply(HarvestConfig::from_env()?);

        if let Some(addr) = config.metrics_addr {
            metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::MetricsError(e.to_string()))?;
        }

        let mut driver = IngestionDriver::from_config(&config)?;

        let summaries = match (self.edition, self.forward) {
            (EditionArg::Latest, false) => vec![driver.harvest_latest().await?],
            (edition, false) => vec![driver.harvest_edition(edition.resolve(Utc::now())?).await?],
            (edition, true) => {
                let start = edition.resolve(Utc::now())?;
                driver.harvest_forward(start).await?
            }
        };

        report(&summaries);
        ensure_complete(&summaries)
    }
}

/// Fail when an edition stopped without progress, so schedulers see it
fn ensure_complete(summaries: &[EditionSummary]) -> Result<(), CliError> {
    match summaries.iter().find(|summary| summary.stalled) {
        Some(summary) => Err(CliError::IncompleteEdition(summary.edition)),
        None => Ok(()),
    }
}

fn report(summaries: &[EditionSummary]) {
    if summaries.is_empty() {
        info!("Nothing to harvest yet");
        return;
    }
    for summary in summaries {
        info!(
            edition = summary.edition,
            outcome = %summary.outcome,
            runs = summary.runs,
            pages = summary.pages,
            posts = summary.posts_seen,
            records = summary.records_written,
            "Harvest complete"
        );
    }
}
