//! Observability metrics for the harvester
//!
//! Counters are emitted through the `metrics` facade. Nothing is recorded
//! anywhere unless [`init_metrics`] installed the Prometheus exporter, so the
//! record functions are safe to call from library code and tests.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::parser::RejectionTally;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent; a second call is a no-op.
///
/// # Arguments
/// * `addr` - Socket address to bind the scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "search_requests_total",
        Unit::Count,
        "Total number of search requests sent"
    );

    describe_counter!(
        "rate_limit_hits_total",
        Unit::Count,
        "Total number of rate-limited search requests"
    );

    describe_counter!(
        "posts_rejected_total",
        Unit::Count,
        "Posts rejected by the parser, by reason"
    );

    describe_counter!(
        "records_flushed_total",
        Unit::Count,
        "Result records committed to the store"
    );

    describe_histogram!(
        "harvest_run_duration_seconds",
        Unit::Seconds,
        "Duration of one pagination run"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Count one search request
pub fn record_search_request() {
    counter!("search_requests_total").increment(1);
}

/// Count one rate-limited request
pub fn record_rate_limit_hit() {
    counter!("rate_limit_hits_total").increment(1);
}

/// Count the rejections of a page by reason
pub fn record_rejections(tally: &RejectionTally) {
    for (reason, count) in tally.iter() {
        counter!("posts_rejected_total", "reason" => reason).increment(count);
    }
}

/// Count records committed for an edition
pub fn record_records_flushed(edition: u32, count: usize) {
    counter!("records_flushed_total", "edition" => edition.to_string()).increment(count as u64);
}

/// Metrics of one pagination run
pub struct HarvestRunMetrics {
    edition: u32,
    start_time: Instant,
}

impl HarvestRunMetrics {
    /// Start tracking a run
    pub fn start(edition: u32) -> Self {
        debug!(edition, "Harvest run metrics started");
        Self {
            edition,
            start_time: Instant::now(),
        }
    }

    /// Record the end of a run
    pub fn record_finished(&self, outcome: &str, pages: usize) {
        let duration = self.start_time.elapsed();

        histogram!(
            "harvest_run_duration_seconds",
            "outcome" => outcome.to_string(),
        )
        .record(duration.as_secs_f64());

        debug!(
            edition = self.edition,
            outcome,
            pages,
            duration_secs = duration.as_secs(),
            "Harvest run finished"
        );
    }

    /// Record an aborted run
    pub fn record_failure(&self, error: &str) {
        let duration = self.start_time.elapsed();

        histogram!(
            "harvest_run_duration_seconds",
            "outcome" => "aborted",
        )
        .record(duration.as_secs_f64());

        error!(
            edition = self.edition,
            error = %error,
            duration_secs = duration.as_secs(),
            "Harvest run aborted"
        );
    }
}
