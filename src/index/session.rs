//! The indexing session: owns the shared state of one run and drives every
//! candidate through resolution, exclusion, language detection, registration,
//! metadata scheduling and progress reporting.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::IndexerConfig;
use crate::core::errors::{IndexError, Result};
use crate::index::context::{Candidate, ProjectContext};
use crate::index::exclusions::{ExclusionArbiter, ExclusionVerdict};
use crate::index::language_gate::{LanguageGate, LanguageVerdict};
use crate::index::metadata::{ContentMetadataGenerator, MetadataGenerator, MetadataScheduler};
use crate::index::path_resolver::{PathResolver, Resolution};
use crate::index::progress::{pluralize_files, progress_message, ProgressReporter, ThrottledProgressReport};
use crate::index::record::IndexedFile;
use crate::index::registrar::{FileFilter, FileRegistrar, IssueExclusionRegistrar, Registration};
use crate::index::registry::FileRegistry;
use crate::index::warnings::{AnalysisWarnings, DeprecationWarnings, WarningsCollector};
use crate::lang::registry::{ExtensionLanguageResolver, LanguageResolver};

/// Why a candidate was not indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file or its symlink target lies outside the project
    OutsideProject,
    /// Rejected by the project-wide scope
    ExcludedByProject,
    /// Rejected by the module scope
    ExcludedByModule,
    /// Not part of the forced language
    ForcedLanguage {
        /// The configured forced language
        forced: String,
    },
    /// Dropped by a programmatic file filter
    Filtered {
        /// Name of the rejecting filter
        filter: String,
    },
}

/// Result of indexing one candidate.
#[derive(Debug, Clone)]
pub enum IndexOutcome {
    /// The file is now in the registry
    Indexed(Arc<IndexedFile>),
    /// The file was skipped; the run continues
    Skipped(SkipReason),
}

impl IndexOutcome {
    /// The indexed record, if any
    pub fn file(&self) -> Option<&Arc<IndexedFile>> {
        match self {
            Self::Indexed(file) => Some(file),
            Self::Skipped(_) => None,
        }
    }
}

/// Counts of a run, by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Files in the registry
    pub indexed: usize,
    /// Rejected by the project or module inclusion/exclusion scopes
    pub excluded_by_patterns: usize,
    /// Rejected by programmatic file filters
    pub excluded_by_filters: usize,
    /// Hidden by the forced-language restriction
    pub forced_language_skips: usize,
    /// Located outside the project base directory
    pub outside_project: usize,
}

#[derive(Debug, Default)]
struct SkipCounters {
    excluded_by_patterns: AtomicUsize,
    excluded_by_filters: AtomicUsize,
    forced_language_skips: AtomicUsize,
    outside_project: AtomicUsize,
}

impl SkipCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// One indexing run over a project.
///
/// Candidates may be indexed from any number of threads. The first fatal
/// error aborts the run: the registry is sealed and every later call returns
/// [`IndexError::Aborted`].
pub struct IndexingSession {
    project: Arc<ProjectContext>,
    resolver: PathResolver,
    arbiter: ExclusionArbiter,
    gate: LanguageGate,
    registrar: FileRegistrar,
    scheduler: MetadataScheduler,
    generator: Arc<dyn MetadataGenerator>,
    progress: Arc<dyn ProgressReporter>,
    counters: SkipCounters,
    aborted: AtomicBool,
}

impl IndexingSession {
    /// Start configuring a session over `project`
    pub fn builder(project: Arc<ProjectContext>) -> IndexingSessionBuilder {
        IndexingSessionBuilder {
            project,
            config: IndexerConfig::default(),
            language_resolver: None,
            metadata_generator: None,
            progress: None,
            warnings: None,
            filters: Vec::new(),
            issue_exclusions: None,
            registry: None,
        }
    }

    /// The shared registry populated by this session
    pub fn registry(&self) -> &Arc<FileRegistry> {
        self.registrar.registry()
    }

    /// Whether a fatal error stopped the run
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Index a single candidate.
    ///
    /// Skips are reported as [`IndexOutcome::Skipped`]. Duplicate paths,
    /// path resolution failures and eager metadata failures are fatal.
    pub fn index_file(&self, candidate: &Candidate) -> Result<IndexOutcome> {
        if self.is_aborted() {
            return Err(IndexError::Aborted);
        }

        match self.process(candidate) {
            Err(err) if err.is_fatal() => Err(self.abort(err)),
            other => other,
        }
    }

    /// Index a batch of candidates in parallel.
    ///
    /// Stops taking new candidates after the first fatal error and returns it.
    pub fn index_all(&self, candidates: &[Candidate]) -> Result<IndexSummary> {
        let first_error: Mutex<Option<IndexError>> = Mutex::new(None);

        candidates.par_iter().for_each(|candidate| {
            if self.is_aborted() {
                return;
            }
            match self.index_file(candidate) {
                Ok(_) | Err(IndexError::Aborted) => {}
                Err(err) => {
                    let mut slot = first_error.lock();
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
            }
        });

        match first_error.into_inner() {
            Some(err) => Err(err),
            None => Ok(self.summary()),
        }
    }

    /// Snapshot of the run's counters
    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            indexed: self.registry().len(),
            excluded_by_patterns: self.counters.excluded_by_patterns.load(Ordering::Relaxed),
            excluded_by_filters: self.counters.excluded_by_filters.load(Ordering::Relaxed),
            forced_language_skips: self.counters.forced_language_skips.load(Ordering::Relaxed),
            outside_project: self.counters.outside_project.load(Ordering::Relaxed),
        }
    }

    /// Log the final counts and return them
    pub fn finish(&self) -> IndexSummary {
        let summary = self.summary();
        info!("{} {} indexed", summary.indexed, pluralize_files(summary.indexed));
        if summary.excluded_by_patterns > 0 {
            info!(
                "{} {} ignored because of inclusion/exclusion patterns",
                summary.excluded_by_patterns,
                pluralize_files(summary.excluded_by_patterns)
            );
        }
        summary
    }

    fn process(&self, candidate: &Candidate) -> Result<IndexOutcome> {
        let module = &candidate.module;

        let resolved = match self.resolver.resolve(&self.project, module, &candidate.path)? {
            Resolution::Resolved(resolved) => resolved,
            Resolution::OutsideProject { .. } => {
                SkipCounters::bump(&self.counters.outside_project);
                return Ok(IndexOutcome::Skipped(SkipReason::OutsideProject));
            }
        };

        let verdict = self.arbiter.evaluate(
            module,
            &resolved.absolute,
            &resolved.project_relative,
            &resolved.module_relative,
            candidate.file_type,
        );
        if verdict.is_excluded() {
            SkipCounters::bump(&self.counters.excluded_by_patterns);
            let reason = match verdict {
                ExclusionVerdict::ExcludedByProject => SkipReason::ExcludedByProject,
                _ => SkipReason::ExcludedByModule,
            };
            return Ok(IndexOutcome::Skipped(reason));
        }

        let language = match self.gate.evaluate(&resolved.absolute, &resolved.project_relative) {
            LanguageVerdict::Proceed(language) => language,
            LanguageVerdict::ForcedLanguageMismatch { forced } => {
                SkipCounters::bump(&self.counters.forced_language_skips);
                return Ok(IndexOutcome::Skipped(SkipReason::ForcedLanguage { forced }));
            }
        };

        let file = IndexedFile::new(
            self.registrar.allocate_id(),
            resolved,
            module,
            candidate.file_type,
            language,
            Arc::clone(&self.generator),
        );

        let (file, total) = match self.registrar.register(file)? {
            Registration::Registered { file, total } => (file, total),
            Registration::Filtered { filter } => {
                SkipCounters::bump(&self.counters.excluded_by_filters);
                return Ok(IndexOutcome::Skipped(SkipReason::Filtered { filter }));
            }
        };

        self.scheduler.schedule(&file)?;
        self.progress
            .message(&progress_message(total, file.project_relative_path()));

        Ok(IndexOutcome::Indexed(file))
    }

    /// Mark the run as aborted. Only the first fatal error is surfaced;
    /// later ones collapse into [`IndexError::Aborted`].
    fn abort(&self, err: IndexError) -> IndexError {
        if self
            .aborted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.registrar.registry().seal();
            err
        } else {
            debug!("Discarding error raised after the run was aborted: {err}");
            IndexError::Aborted
        }
    }
}

/// Builder for [`IndexingSession`]. Every collaborator has a default.
pub struct IndexingSessionBuilder {
    project: Arc<ProjectContext>,
    config: IndexerConfig,
    language_resolver: Option<Arc<dyn LanguageResolver>>,
    metadata_generator: Option<Arc<dyn MetadataGenerator>>,
    progress: Option<Arc<dyn ProgressReporter>>,
    warnings: Option<Arc<dyn AnalysisWarnings>>,
    filters: Vec<Arc<dyn FileFilter>>,
    issue_exclusions: Option<Arc<dyn IssueExclusionRegistrar>>,
    registry: Option<Arc<FileRegistry>>,
}

impl IndexingSessionBuilder {
    /// Use `config` instead of the default configuration
    pub fn config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the suffix-based language resolver
    pub fn language_resolver(mut self, resolver: Arc<dyn LanguageResolver>) -> Self {
        self.language_resolver = Some(resolver);
        self
    }

    /// Replace the on-disk content metadata generator
    pub fn metadata_generator(mut self, generator: Arc<dyn MetadataGenerator>) -> Self {
        self.metadata_generator = Some(generator);
        self
    }

    /// Send progress messages to `progress`
    pub fn progress_reporter(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Where user-visible warnings go
    pub fn warnings(mut self, warnings: Arc<dyn AnalysisWarnings>) -> Self {
        self.warnings = Some(warnings);
        self
    }

    /// Append a file filter; filters run in the order they were added
    pub fn file_filter(mut self, filter: Arc<dyn FileFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Register indexed files with an issue exclusion hook
    pub fn issue_exclusions(mut self, registrar: Arc<dyn IssueExclusionRegistrar>) -> Self {
        self.issue_exclusions = Some(registrar);
        self
    }

    /// Populate an existing registry instead of a fresh one
    pub fn registry(mut self, registry: Arc<FileRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validate the configuration and assemble the session
    pub fn build(self) -> Result<IndexingSession> {
        self.config.validate()?;

        let language_resolver: Arc<dyn LanguageResolver> = match self.language_resolver {
            Some(resolver) => resolver,
            None => Arc::new(ExtensionLanguageResolver::from_config(&self.config)?),
        };
        let warnings = self
            .warnings
            .unwrap_or_else(|| Arc::new(WarningsCollector::new()));
        let progress = self.progress.unwrap_or_else(|| {
            Arc::new(ThrottledProgressReport::new(Duration::from_millis(
                self.config.progress_interval_ms,
            )))
        });
        let generator = self
            .metadata_generator
            .unwrap_or_else(|| Arc::new(ContentMetadataGenerator::new()));
        let registry = self.registry.unwrap_or_default();

        debug!(
            "Indexing session for project '{}' (eager metadata: {})",
            self.project.key(),
            self.config.preload_file_metadata
        );

        Ok(IndexingSession {
            arbiter: ExclusionArbiter::new(
                Arc::clone(self.project.exclusions()),
                DeprecationWarnings::new(warnings),
            ),
            project: self.project,
            resolver: PathResolver,
            gate: LanguageGate::new(language_resolver),
            registrar: FileRegistrar::new(registry, self.filters, self.issue_exclusions),
            scheduler: MetadataScheduler::new(self.config.preload_file_metadata),
            generator,
            progress,
            counters: SkipCounters::default(),
            aborted: AtomicBool::new(false),
        })
    }
}
