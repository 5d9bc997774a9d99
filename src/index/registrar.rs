//! Identity allocation, programmatic filters and registry insertion.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::errors::{IndexError, Result};
use crate::index::context::FileType;
use crate::index::record::{ComponentId, IndexedFile};
use crate::index::registry::{ComponentIdGenerator, FileRegistry, InsertOutcome};

/// Programmatic filter run over a record before it enters the registry.
pub trait FileFilter: Send + Sync {
    /// Name used in the rejection trace; defaults to the type name.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Whether the file may be indexed
    fn accept(&self, file: &IndexedFile) -> bool;
}

/// Secondary registration hook for issue exclusion bookkeeping.
pub trait IssueExclusionRegistrar: Send + Sync {
    /// Whether registration is wanted at all
    fn is_active(&self) -> bool;

    /// Record a freshly indexed file
    fn register(&self, project_relative_path: &str, id: ComponentId);
}

/// In-memory [`IssueExclusionRegistrar`].
#[derive(Debug, Default)]
pub struct IssueExclusionsRegistry {
    active: bool,
    entries: Mutex<Vec<(String, ComponentId)>>,
}

impl IssueExclusionsRegistry {
    /// Registry that records every indexed file
    pub fn active() -> Self {
        Self {
            active: true,
            entries: Mutex::default(),
        }
    }

    /// Registry that ignores registrations
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Recorded `(project-relative path, id)` pairs in registration order
    pub fn entries(&self) -> Vec<(String, ComponentId)> {
        self.entries.lock().clone()
    }
}

impl IssueExclusionRegistrar for IssueExclusionsRegistry {
    fn is_active(&self) -> bool {
        self.active
    }

    fn register(&self, project_relative_path: &str, id: ComponentId) {
        self.entries.lock().push((project_relative_path.to_string(), id));
    }
}

/// Outcome of [`FileRegistrar::register`].
#[derive(Debug)]
pub enum Registration {
    /// Stored in the registry; carries the registry size after insertion
    Registered {
        /// The stored record
        file: Arc<IndexedFile>,
        /// Registry size right after this insertion
        total: usize,
    },
    /// Dropped by a programmatic filter
    Filtered {
        /// Name of the rejecting filter
        filter: String,
    },
}

/// Admits records into the shared [`FileRegistry`].
pub struct FileRegistrar {
    ids: ComponentIdGenerator,
    registry: Arc<FileRegistry>,
    filters: Vec<Arc<dyn FileFilter>>,
    issue_exclusions: Option<Arc<dyn IssueExclusionRegistrar>>,
}

impl FileRegistrar {
    /// Create a registrar feeding `registry`
    pub fn new(
        registry: Arc<FileRegistry>,
        filters: Vec<Arc<dyn FileFilter>>,
        issue_exclusions: Option<Arc<dyn IssueExclusionRegistrar>>,
    ) -> Self {
        Self {
            ids: ComponentIdGenerator::new(),
            registry,
            filters,
            issue_exclusions,
        }
    }

    /// Allocate the identity of the next record
    pub fn allocate_id(&self) -> ComponentId {
        self.ids.next_id()
    }

    /// Registry receiving the records
    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    /// Run the filters over `file` and insert it.
    ///
    /// A path that is already registered is a fatal
    /// [`IndexError::DuplicatePath`]. A sealed registry yields
    /// [`IndexError::Aborted`].
    pub fn register(&self, file: IndexedFile) -> Result<Registration> {
        if let Some(filter) = self.filters.iter().find(|filter| !filter.accept(&file)) {
            debug!("'{}' excluded by {}", file.project_relative_path(), filter.name());
            return Ok(Registration::Filtered {
                filter: filter.name().to_string(),
            });
        }

        let file = Arc::new(file);
        let total = match self.registry.insert_if_absent(Arc::clone(&file)) {
            InsertOutcome::Inserted(total) => total,
            InsertOutcome::Duplicate(_) => {
                return Err(IndexError::duplicate_path(file.project_relative_path()))
            }
            InsertOutcome::Sealed => return Err(IndexError::Aborted),
        };

        if let Some(issue_exclusions) = &self.issue_exclusions {
            if issue_exclusions.is_active() {
                issue_exclusions.register(file.project_relative_path(), file.id());
            }
        }

        debug!(
            "'{}' indexed {}with language '{}'",
            file.project_relative_path(),
            if file.file_type() == FileType::Test { "as test " } else { "" },
            file.language().unwrap_or("null")
        );

        Ok(Registration::Registered { file, total })
    }
}
