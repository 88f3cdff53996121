//! Run notifications
//!
//! The driver reports the end of every pagination run through a [`Notifier`].
//! Delivery (desktop popups, chat hooks) belongs to the embedding program.

use std::sync::{Arc, Mutex};
use tracing::info;

/// Receives one summary line per pagination run
pub trait Notifier: Send + Sync {
    /// Deliver a message
    fn notify(&self, message: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(target: "wordle_harvester::notify", "{}", message);
    }
}

/// Notifier that keeps every message, for inspection
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
