//! Project, module and candidate descriptions consumed by the indexer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::config::PatternConfig;
use crate::core::errors::{IndexError, Result, ResultExt};
use crate::index::exclusions::{AcceptAll, ExclusionFilter, GlobExclusionFilters};

/// Encoding assumed when a module does not declare one.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Declared role of a file in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    /// Production source
    Main,
    /// Test source
    Test,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("MAIN"),
            Self::Test => f.write_str("TEST"),
        }
    }
}

/// The analysed project: root directory, key and modules.
pub struct ProjectContext {
    key: String,
    base_dir: PathBuf,
    exclusions: Arc<dyn ExclusionFilter>,
    modules: Vec<Arc<ModuleContext>>,
}

impl ProjectContext {
    /// Create a project rooted at `base_dir` with its project-wide exclusion scope.
    ///
    /// The base directory is canonicalized once here so that every later
    /// containment check compares real paths.
    pub fn new(
        key: impl Into<String>,
        base_dir: impl AsRef<Path>,
        exclusions: Arc<dyn ExclusionFilter>,
    ) -> Result<Self> {
        let base_dir = canonical_dir(base_dir.as_ref())?;
        Ok(Self {
            key: key.into(),
            base_dir,
            exclusions,
            modules: Vec::new(),
        })
    }

    /// Create a project whose scope is built from configured glob patterns.
    pub fn with_patterns(
        key: impl Into<String>,
        base_dir: impl AsRef<Path>,
        patterns: &PatternConfig,
    ) -> Result<Self> {
        let exclusions: Arc<dyn ExclusionFilter> = if patterns.is_empty() {
            Arc::new(AcceptAll)
        } else {
            Arc::new(GlobExclusionFilters::from_config(patterns)?)
        };
        Self::new(key, base_dir, exclusions)
    }

    /// Project key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical project base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Project-wide exclusion scope
    pub fn exclusions(&self) -> &Arc<dyn ExclusionFilter> {
        &self.exclusions
    }

    /// Modules in declaration order
    pub fn modules(&self) -> &[Arc<ModuleContext>] {
        &self.modules
    }

    /// Look up a module by key
    pub fn module(&self, key: &str) -> Option<&Arc<ModuleContext>> {
        self.modules.iter().find(|m| m.key() == key)
    }

    /// Append a module and hand back the shared handle used by candidates.
    pub fn add_module(&mut self, module: ModuleContext) -> Arc<ModuleContext> {
        let module = Arc::new(module);
        self.modules.push(Arc::clone(&module));
        module
    }
}

impl fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectContext")
            .field("key", &self.key)
            .field("base_dir", &self.base_dir)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

/// One module of a (possibly multi-module) project.
pub struct ModuleContext {
    key: String,
    name: String,
    base_dir: PathBuf,
    encoding: String,
    branch: Option<String>,
    exclusions: Arc<dyn ExclusionFilter>,
    uses_project_scope: bool,
}

impl ModuleContext {
    /// Start building a module rooted at `base_dir`.
    pub fn builder(key: impl Into<String>, base_dir: impl Into<PathBuf>) -> ModuleContextBuilder {
        ModuleContextBuilder {
            key: key.into(),
            base_dir: base_dir.into(),
            name: None,
            encoding: None,
            branch: None,
            exclusions: None,
        }
    }

    /// Module key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name (defaults to the key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical module base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Text encoding of the module's files
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Analysed branch, if any
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Module key qualified with the branch (`key:BRANCH:name`)
    pub fn key_with_branch(&self) -> String {
        match &self.branch {
            Some(branch) => format!("{}:BRANCH:{}", self.key, branch),
            None => self.key.clone(),
        }
    }

    /// Exclusion scope evaluated with module-relative paths
    pub fn exclusions(&self) -> &Arc<dyn ExclusionFilter> {
        &self.exclusions
    }

    /// True when the module has no scope of its own and shares the project's.
    pub fn uses_project_scope(&self) -> bool {
        self.uses_project_scope
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("base_dir", &self.base_dir)
            .field("encoding", &self.encoding)
            .field("branch", &self.branch)
            .field("uses_project_scope", &self.uses_project_scope)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ModuleContext`].
pub struct ModuleContextBuilder {
    key: String,
    base_dir: PathBuf,
    name: Option<String>,
    encoding: Option<String>,
    branch: Option<String>,
    exclusions: Option<Arc<dyn ExclusionFilter>>,
}

impl ModuleContextBuilder {
    /// Set the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the text encoding
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the analysed branch
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Give the module its own (legacy, module-level) exclusion scope
    pub fn exclusions(mut self, exclusions: Arc<dyn ExclusionFilter>) -> Self {
        self.exclusions = Some(exclusions);
        self
    }

    /// Finish the module. Without an own scope the module shares the
    /// project's scope object and `uses_project_scope` is set.
    pub fn build(self, project: &ProjectContext) -> Result<ModuleContext> {
        let base_dir = canonical_dir(&self.base_dir)?;
        if !base_dir.starts_with(project.base_dir()) {
            return Err(IndexError::config_field(
                format!(
                    "Module '{}' base directory '{}' is not located in project base directory '{}'",
                    self.key,
                    base_dir.display(),
                    project.base_dir().display()
                ),
                "base_dir",
            ));
        }

        let (exclusions, uses_project_scope) = match self.exclusions {
            Some(own) => (own, false),
            None => (Arc::clone(project.exclusions()), true),
        };

        Ok(ModuleContext {
            name: self.name.unwrap_or_else(|| self.key.clone()),
            key: self.key,
            base_dir,
            encoding: self.encoding.unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
            branch: self.branch,
            exclusions,
            uses_project_scope,
        })
    }
}

/// A path proposed for indexing.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute path as produced by traversal
    pub path: PathBuf,
    /// Owning module
    pub module: Arc<ModuleContext>,
    /// Declared role
    pub file_type: FileType,
}

impl Candidate {
    /// Create a candidate
    pub fn new(path: impl Into<PathBuf>, module: Arc<ModuleContext>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            module,
            file_type,
        }
    }

    /// Create a main-file candidate
    pub fn main(path: impl Into<PathBuf>, module: &Arc<ModuleContext>) -> Self {
        Self::new(path, Arc::clone(module), FileType::Main)
    }

    /// Create a test-file candidate
    pub fn test(path: impl Into<PathBuf>, module: &Arc<ModuleContext>) -> Self {
        Self::new(path, Arc::clone(module), FileType::Test)
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve directory {}", path.display()))
}
