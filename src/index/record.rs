//! Indexed file records and their lazily computed metadata.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::core::errors::MetadataError;
use crate::index::context::{FileType, ModuleContext};
use crate::index::metadata::MetadataGenerator;
use crate::index::path_resolver::ResolvedPath;

/// Identity of an indexed file, unique and increasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Wrap a raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id value
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-derived facts about a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Canonical name of the charset used to decode the file
    pub charset: String,
    /// Hex SHA-256 of the content with normalized line endings
    pub hash: String,
    /// Number of lines (an empty file has one)
    pub lines: usize,
    /// Character offset at which every line starts
    pub line_start_offsets: Vec<usize>,
    /// Character length of the normalized content
    pub last_valid_offset: usize,
    /// True when the file has no content at all
    pub empty: bool,
}

/// Inputs the deferred metadata computation is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataInputs {
    /// Key of the owning module, qualified with its branch
    pub module_key_with_branch: String,
    /// Text encoding of the owning module
    pub encoding: String,
}

/// Observable state of a record's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataState<'a> {
    /// Nothing computed yet; holds the pending inputs
    NotComputed(&'a MetadataInputs),
    /// Computed successfully and cached
    Computed(&'a FileMetadata),
    /// Computation failed; the failure is cached too
    Failed(&'a MetadataError),
}

type MetadataSlot = std::result::Result<Arc<FileMetadata>, MetadataError>;

/// A file admitted to the registry.
///
/// Immutable from construction: language and publication are decided before
/// the record is built, and metadata moves from not computed to computed (or
/// failed) exactly once.
pub struct IndexedFile {
    id: ComponentId,
    absolute_path: PathBuf,
    project_relative_path: String,
    module_relative_path: String,
    module_key: String,
    file_type: FileType,
    language: Option<String>,
    published: bool,
    metadata_inputs: MetadataInputs,
    metadata: OnceCell<MetadataSlot>,
    generator: Arc<dyn MetadataGenerator>,
}

impl IndexedFile {
    pub(crate) fn new(
        id: ComponentId,
        resolved: ResolvedPath,
        module: &ModuleContext,
        file_type: FileType,
        language: Option<String>,
        generator: Arc<dyn MetadataGenerator>,
    ) -> Self {
        Self {
            id,
            absolute_path: resolved.absolute,
            project_relative_path: resolved.project_relative,
            module_relative_path: resolved.module_relative,
            module_key: module.key().to_string(),
            file_type,
            published: language.is_some(),
            language,
            metadata_inputs: MetadataInputs {
                module_key_with_branch: module.key_with_branch(),
                encoding: module.encoding().to_string(),
            },
            metadata: OnceCell::new(),
            generator,
        }
    }

    /// Registry id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Path of the file itself; a symlink keeps its own path
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Forward-slash path relative to the project base directory
    pub fn project_relative_path(&self) -> &str {
        &self.project_relative_path
    }

    /// Forward-slash path relative to the module base directory
    pub fn module_relative_path(&self) -> &str {
        &self.module_relative_path
    }

    /// Key of the owning module
    pub fn module_key(&self) -> &str {
        &self.module_key
    }

    /// Main or test
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Detected language key, `None` for unpublished files
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Whether the file is part of the persisted analysis output
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Text encoding the metadata computation decodes the file with
    pub fn encoding(&self) -> &str {
        &self.metadata_inputs.encoding
    }

    /// Content metadata, computed on first access and cached afterwards.
    ///
    /// A failure is cached as well and returned again on later calls.
    pub fn metadata(&self) -> std::result::Result<Arc<FileMetadata>, MetadataError> {
        self.metadata
            .get_or_init(|| {
                self.generator
                    .generate(
                        &self.metadata_inputs.module_key_with_branch,
                        self,
                        &self.metadata_inputs.encoding,
                    )
                    .map(Arc::new)
            })
            .clone()
    }

    /// Current metadata state, without triggering computation
    pub fn metadata_state(&self) -> MetadataState<'_> {
        match self.metadata.get() {
            None => MetadataState::NotComputed(&self.metadata_inputs),
            Some(Ok(metadata)) => MetadataState::Computed(metadata),
            Some(Err(err)) => MetadataState::Failed(err),
        }
    }
}

impl fmt::Debug for IndexedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedFile")
            .field("id", &self.id)
            .field("project_relative_path", &self.project_relative_path)
            .field("module_key", &self.module_key)
            .field("file_type", &self.file_type)
            .field("language", &self.language)
            .field("published", &self.published)
            .field("metadata", &self.metadata_state())
            .finish_non_exhaustive()
    }
}
