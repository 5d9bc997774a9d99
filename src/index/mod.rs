//! The file indexing pipeline.
//!
//! ```text
//! Candidate ─► PathResolver ─► ExclusionArbiter ─► LanguageGate
//!                                                      │
//!        ProgressReporter ◄─ MetadataScheduler ◄─ FileRegistrar ─► FileRegistry
//! ```

pub mod context;
pub mod exclusions;
pub mod language_gate;
pub mod metadata;
pub mod path_resolver;
pub mod progress;
pub mod record;
pub mod registrar;
pub mod registry;
pub mod session;
pub mod warnings;

pub use context::{Candidate, FileType, ModuleContext, ModuleContextBuilder, ProjectContext};
pub use exclusions::{AcceptAll, ExclusionArbiter, ExclusionFilter, ExclusionVerdict, GlobExclusionFilters};
pub use language_gate::{LanguageGate, LanguageVerdict};
pub use metadata::{ContentMetadataGenerator, MetadataGenerator, MetadataScheduler};
pub use path_resolver::{PathResolver, Resolution, ResolvedPath};
pub use progress::{ProgressReporter, ThrottledProgressReport};
pub use record::{ComponentId, FileMetadata, IndexedFile, MetadataInputs, MetadataState};
pub use registrar::{FileFilter, FileRegistrar, IssueExclusionRegistrar, IssueExclusionsRegistry, Registration};
pub use registry::{ComponentIdGenerator, FileRegistry, InsertOutcome};
pub use session::{IndexOutcome, IndexSummary, IndexingSession, IndexingSessionBuilder, SkipReason};
pub use warnings::{AnalysisWarnings, DeprecationWarnings, KeyedWarnLatch, WarnLatch, WarningsCollector};
