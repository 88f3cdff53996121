//! Terminal progress for interactive runs
//!
//! One bar per pagination run, measured in pages against the run's call
//! budget. Unattended runs get a hidden bar and rely on the log instead.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display of one pagination run
#[derive(Debug, Clone)]
pub struct RunProgress {
    bar: ProgressBar,
}

impl RunProgress {
    /// Visible bar for `edition`, sized to `page_budget` pages
    pub fn new(edition: u32, page_budget: usize) -> Self {
        let bar = ProgressBar::new(page_budget as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        bar.set_message(format!("[{}] starting", edition));
        Self { bar }
    }

    /// Bar that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Bar for a run, visible only when `enabled`
    pub fn for_run(edition: u32, page_budget: usize, enabled: bool) -> Self {
        if enabled {
            Self::new(edition, page_budget)
        } else {
            Self::hidden()
        }
    }

    /// Record a processed page
    pub fn on_page(&self, edition: u32, pages: usize, records: usize) {
        self.bar.set_position(pages as u64);
        self.bar
            .set_message(format!("[{}] {} records", edition, records));
    }

    /// Close the bar with a final message
    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Pages shown so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
