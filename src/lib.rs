//! # Scanindex-RS: File Indexing for Source Analysis
//!
//! Decides, for every candidate path of a (possibly multi-module) project,
//! whether the file belongs to the analysis, what type and language it has,
//! and gives it a stable identity in a shared registry.
//!
//! - **Path resolution**: real on-disk identity, symlinks kept as their own path
//! - **Exclusions**: project scope first, then the legacy module scope
//! - **Language detection**: pluggable resolver with a forced-language restriction
//! - **Registry**: one record per project-relative path, duplicates abort the run
//! - **Metadata**: hash, charset and line index, lazy or eager
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     IndexingSession                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PathResolver → ExclusionArbiter → LanguageGate →           │
//! │  FileRegistrar → MetadataScheduler → ProgressReporter       │
//! ├───────────────┬───────────────────┬─────────────────────────┤
//! │  Core         │  Language         │  Registry               │
//! │ • Config      │ • Suffix resolver │ • DashMap by path       │
//! │ • Errors      │                   │ • Atomic ids            │
//! └───────────────┴───────────────────┴─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scanindex_rs::{Candidate, IndexerConfig, IndexingSession, ModuleContext, ProjectContext};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IndexerConfig::from_yaml_file("indexer.yml")?;
//!     let mut project = ProjectContext::with_patterns("my-project", ".", &config.exclusions)?;
//!     let module = ModuleContext::builder("my-project", ".").build(&project)?;
//!     let module = project.add_module(module);
//!
//!     let session = IndexingSession::builder(Arc::new(project)).config(config).build()?;
//!     session.index_file(&Candidate::main("src/lib.rs", &module))?;
//!
//!     let summary = session.finish();
//!     println!("{} files indexed", summary.indexed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Configuration and error handling
pub mod core {
    //! Configuration and error types shared by the pipeline.

    pub mod config;
    pub mod errors;
}

// Language detection
pub mod lang {
    //! Language detection for candidate files.

    pub mod registry;
}

// The indexing pipeline
pub mod index;

// Re-export primary types for convenience
pub use core::config::{IndexerConfig, LanguageConfig, PatternConfig};
pub use core::errors::{IndexError, MetadataError, Result, ResultExt};
pub use index::{
    Candidate, FileRegistry, FileType, IndexOutcome, IndexSummary, IndexedFile, IndexingSession,
    ModuleContext, ProjectContext, SkipReason,
};
pub use lang::registry::{ExtensionLanguageResolver, LanguageResolver};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
