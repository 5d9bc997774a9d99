//! User-visible analysis warnings and one-shot warning latches.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::warn;

/// Sink for warnings that must reach the end user regardless of log verbosity.
pub trait AnalysisWarnings: Send + Sync {
    /// Record a warning; identical messages are kept once.
    fn add_unique(&self, message: &str);
}

/// In-memory, insertion-ordered [`AnalysisWarnings`] implementation.
#[derive(Debug, Default)]
pub struct WarningsCollector {
    messages: Mutex<IndexSet<String>>,
}

impl WarningsCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded warnings in insertion order
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Number of distinct warnings
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl AnalysisWarnings for WarningsCollector {
    fn add_unique(&self, message: &str) {
        let mut messages = self.messages.lock();
        if !messages.contains(message) {
            messages.insert(message.to_string());
        }
    }
}

/// One-shot flag: the first caller of [`WarnLatch::try_claim`] wins.
#[derive(Debug, Default)]
pub struct WarnLatch {
    fired: AtomicBool,
}

impl WarnLatch {
    /// Create an unfired latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once over the lifetime of the latch.
    pub fn try_claim(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the latch has fired
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// A family of one-shot flags, one per key.
#[derive(Debug, Default)]
pub struct KeyedWarnLatch {
    claimed: Mutex<HashSet<String>>,
}

impl KeyedWarnLatch {
    /// Create a latch family with no fired key
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once per distinct key.
    pub fn try_claim(&self, key: &str) -> bool {
        let mut claimed = self.claimed.lock();
        if claimed.contains(key) {
            return false;
        }
        claimed.insert(key.to_string())
    }
}

/// Deprecation warnings about legacy module-level exclusion configuration.
///
/// The module-relative-patterns warning fires once per run. The
/// module-level-exclusions warning fires once per offending module, since
/// each one names a different module to fix.
pub struct DeprecationWarnings {
    module_relative_patterns: WarnLatch,
    module_level_exclusions: KeyedWarnLatch,
    sink: Arc<dyn AnalysisWarnings>,
}

impl DeprecationWarnings {
    /// Create the latches, forwarding fired warnings to `sink`
    pub fn new(sink: Arc<dyn AnalysisWarnings>) -> Self {
        Self {
            module_relative_patterns: WarnLatch::new(),
            module_level_exclusions: KeyedWarnLatch::new(),
            sink,
        }
    }

    /// A file was excluded by the project scope evaluated with module-relative paths.
    pub fn module_relative_patterns(&self, project_relative_path: &str) {
        if self.module_relative_patterns.try_claim() {
            self.emit(&module_relative_patterns_message(project_relative_path));
        }
    }

    /// A file was excluded by a module's own exclusion scope.
    pub fn module_level_exclusions(&self, module_name: &str) {
        if self.module_level_exclusions.try_claim(module_name) {
            self.emit(&module_level_exclusions_message(module_name));
        }
    }

    fn emit(&self, message: &str) {
        warn!("{message}");
        self.sink.add_unique(message);
    }
}

/// Warning text for patterns still evaluated against module-relative paths.
pub fn module_relative_patterns_message(project_relative_path: &str) -> String {
    format!(
        "File '{project_relative_path}' was excluded because patterns are still evaluated using \
         module relative paths but this is deprecated. Please update file inclusion/exclusion \
         configuration so that patterns refer to project relative paths."
    )
}

/// Warning text for exclusions declared on a module.
pub fn module_level_exclusions_message(module_name: &str) -> String {
    format!(
        "Defining inclusion/exclusions at module level is deprecated. Move file \
         inclusion/exclusion configuration from module '{module_name}' to the root project and \
         update patterns to refer to project relative paths."
    )
}
