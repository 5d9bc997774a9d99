//! Inclusion/exclusion scopes and the arbiter applying them in order.

use std::path::Path;
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::core::config::PatternConfig;
use crate::core::errors::{IndexError, Result};
use crate::index::context::{FileType, ModuleContext};
use crate::index::warnings::DeprecationWarnings;

/// A configured inclusion/exclusion scope.
pub trait ExclusionFilter: Send + Sync {
    /// Whether the file belongs to the analysis according to this scope.
    ///
    /// `relative_path` is forward-slash separated and relative to the base
    /// directory the scope is evaluated against.
    fn accept(&self, path: &Path, relative_path: &str, file_type: FileType) -> bool;
}

/// Scope that accepts every file.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ExclusionFilter for AcceptAll {
    fn accept(&self, _path: &Path, _relative_path: &str, _file_type: FileType) -> bool {
        true
    }
}

/// Glob-backed scope built from a [`PatternConfig`].
///
/// Main and test files each have their own inclusion and exclusion sets. A
/// non-empty inclusion set must match; any exclusion match rejects.
#[derive(Debug, Clone, Default)]
pub struct GlobExclusionFilters {
    main: PatternPair,
    test: PatternPair,
}

#[derive(Debug, Clone, Default)]
struct PatternPair {
    inclusions: Option<GlobSet>,
    exclusions: Option<GlobSet>,
}

impl PatternPair {
    fn accept(&self, relative_path: &str) -> bool {
        if let Some(inclusions) = &self.inclusions {
            if !inclusions.is_match(relative_path) {
                return false;
            }
        }
        match &self.exclusions {
            Some(exclusions) => !exclusions.is_match(relative_path),
            None => true,
        }
    }
}

impl GlobExclusionFilters {
    /// Compile the four pattern lists of `config`.
    pub fn from_config(config: &PatternConfig) -> Result<Self> {
        Ok(Self {
            main: PatternPair {
                inclusions: compile_globset(&config.inclusions)?,
                exclusions: compile_globset(&config.exclusions)?,
            },
            test: PatternPair {
                inclusions: compile_globset(&config.test_inclusions)?,
                exclusions: compile_globset(&config.test_exclusions)?,
            },
        })
    }

    /// Shorthand for a scope that only excludes main and test files.
    pub fn excluding<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        Self::from_config(&PatternConfig {
            exclusions: patterns.clone(),
            test_exclusions: patterns,
            ..PatternConfig::default()
        })
    }
}

impl ExclusionFilter for GlobExclusionFilters {
    fn accept(&self, _path: &Path, relative_path: &str, file_type: FileType) -> bool {
        match file_type {
            FileType::Main => self.main.accept(relative_path),
            FileType::Test => self.test.accept(relative_path),
        }
    }
}

fn compile_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;

    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }

        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| IndexError::config(format!("Invalid glob pattern '{pattern}': {err}")))?;
        builder.add(glob);
        added = true;
    }

    if added {
        builder
            .build()
            .map(Some)
            .map_err(|err| IndexError::config(format!("Failed to build glob set: {err}")))
    } else {
        Ok(None)
    }
}

/// Outcome of running a candidate through both exclusion scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionVerdict {
    /// Both scopes accept the file
    Accepted,
    /// Rejected by the project-wide scope
    ExcludedByProject,
    /// Accepted by the project, rejected by the module scope
    ExcludedByModule,
}

impl ExclusionVerdict {
    /// True for both rejection kinds
    pub fn is_excluded(self) -> bool {
        !matches!(self, Self::Accepted)
    }
}

/// Applies the project scope, then the module scope, raising the legacy
/// configuration deprecation warnings when the module scope is the one
/// rejecting.
pub struct ExclusionArbiter {
    project_scope: Arc<dyn ExclusionFilter>,
    deprecations: DeprecationWarnings,
}

impl ExclusionArbiter {
    /// Create an arbiter over the project-wide scope
    pub fn new(project_scope: Arc<dyn ExclusionFilter>, deprecations: DeprecationWarnings) -> Self {
        Self {
            project_scope,
            deprecations,
        }
    }

    /// Evaluate a resolved candidate.
    ///
    /// The project scope sees the project-relative path, the module scope the
    /// module-relative one.
    pub fn evaluate(
        &self,
        module: &ModuleContext,
        path: &Path,
        project_relative: &str,
        module_relative: &str,
        file_type: FileType,
    ) -> ExclusionVerdict {
        if !self.project_scope.accept(path, project_relative, file_type) {
            return ExclusionVerdict::ExcludedByProject;
        }

        if !module.exclusions().accept(path, module_relative, file_type) {
            if module.uses_project_scope() {
                self.deprecations.module_relative_patterns(project_relative);
            } else {
                self.deprecations.module_level_exclusions(module.name());
            }
            return ExclusionVerdict::ExcludedByModule;
        }

        ExclusionVerdict::Accepted
    }
}
