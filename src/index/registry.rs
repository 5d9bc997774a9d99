//! The shared registry of indexed files and the identity counter.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::index::record::{ComponentId, IndexedFile};

/// Hands out strictly increasing [`ComponentId`]s, starting at 1.
#[derive(Debug)]
pub struct ComponentIdGenerator {
    next: AtomicU64,
}

impl Default for ComponentIdGenerator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl ComponentIdGenerator {
    /// Start a generator at the first id
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id
    pub fn next_id(&self) -> ComponentId {
        ComponentId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Result of [`FileRegistry::insert_if_absent`].
#[derive(Debug)]
pub enum InsertOutcome {
    /// The file was stored; carries the registry size right after insertion
    Inserted(usize),
    /// A file with the same project-relative path was already present
    Duplicate(Arc<IndexedFile>),
    /// The registry no longer accepts files
    Sealed,
}

/// Indexed files keyed by project-relative path.
///
/// At most one file exists per project-relative path, whatever module it
/// belongs to. Once sealed the registry refuses every further insertion.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: DashMap<String, Arc<IndexedFile>>,
    total: AtomicUsize,
    sealed: AtomicBool,
}

impl FileRegistry {
    /// Create an empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `file` unless its project-relative path is already taken.
    ///
    /// The check and the insertion happen under the same shard lock, so two
    /// concurrent callers can never both succeed for one path.
    pub fn insert_if_absent(&self, file: Arc<IndexedFile>) -> InsertOutcome {
        match self.files.entry(file.project_relative_path().to_string()) {
            Entry::Occupied(existing) => InsertOutcome::Duplicate(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                if self.is_sealed() {
                    return InsertOutcome::Sealed;
                }
                slot.insert(file);
                InsertOutcome::Inserted(self.total.fetch_add(1, Ordering::AcqRel) + 1)
            }
        }
    }

    /// Stop accepting files
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// True once no further insertion is accepted
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Look up a file by project-relative path
    pub fn get(&self, project_relative_path: &str) -> Option<Arc<IndexedFile>> {
        self.files
            .get(project_relative_path)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    /// True when nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All indexed files ordered by id
    pub fn files(&self) -> Vec<Arc<IndexedFile>> {
        self.collect_sorted(|_| true)
    }

    /// Files of one module ordered by id
    pub fn files_of_module(&self, module_key: &str) -> Vec<Arc<IndexedFile>> {
        self.collect_sorted(|file| file.module_key() == module_key)
    }

    fn collect_sorted(&self, keep: impl Fn(&IndexedFile) -> bool) -> Vec<Arc<IndexedFile>> {
        let mut files: Vec<Arc<IndexedFile>> = self
            .files
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        files.sort_by_key(|file| file.id());
        files
    }
}
