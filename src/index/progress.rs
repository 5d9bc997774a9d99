//! Advisory progress messages.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

/// Receives progress messages; rate limiting is up to the implementation.
pub trait ProgressReporter: Send + Sync {
    /// Report the current progress line
    fn message(&self, text: &str);
}

/// `"file"` or `"files"` depending on `count`
pub fn pluralize_files(count: usize) -> &'static str {
    if count == 1 {
        "file"
    } else {
        "files"
    }
}

/// Progress line emitted after each registration.
pub fn progress_message(count: usize, last_project_relative_path: &str) -> String {
    format!(
        "{count} {} indexed...  (last one was {last_project_relative_path})",
        pluralize_files(count)
    )
}

/// Logs at most one progress message per interval and always remembers the
/// latest one.
#[derive(Debug)]
pub struct ThrottledProgressReport {
    interval: Duration,
    state: Mutex<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    last_logged: Option<Instant>,
    last_message: Option<String>,
}

impl ThrottledProgressReport {
    /// Log at most one message per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::default(),
        }
    }

    /// Most recent message received, logged or not
    pub fn last_message(&self) -> Option<String> {
        self.state.lock().last_message.clone()
    }
}

impl ProgressReporter for ThrottledProgressReport {
    fn message(&self, text: &str) {
        let mut state = self.state.lock();
        state.last_message = Some(text.to_string());

        let due = state
            .last_logged
            .map_or(true, |at| at.elapsed() >= self.interval);
        if due {
            state.last_logged = Some(Instant::now());
            info!("{text}");
        }
    }
}
