//! Error types for the scanindex-rs library.
//!
//! Fatal indexing conditions (duplicate path, path resolution failure, eager
//! metadata failure) are reported as clean, single-sentence user messages.
//! Anything else surfaces as an I/O or serialization error whose message
//! carries the context it was raised in.

use std::io;

use thiserror::Error;

/// Main result type for indexing operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while computing content-derived metadata of a file.
///
/// Cloneable so that a cached failure can be handed out again on every
/// later access without recomputation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The file content could not be read
    #[error("Failed to read '{path}': {message}")]
    Io {
        /// Project-relative path of the file
        path: String,
        /// Rendered I/O error
        message: String,
    },

    /// The module declares an encoding this crate cannot decode
    #[error("Unsupported encoding '{encoding}' for '{path}'")]
    UnsupportedEncoding {
        /// Project-relative path of the file
        path: String,
        /// Declared encoding name
        encoding: String,
    },

    /// The content is not valid in the declared encoding
    #[error("Failed to decode '{path}' as {encoding}: {message}")]
    Decode {
        /// Project-relative path of the file
        path: String,
        /// Declared encoding name
        encoding: String,
        /// Decoder message
        message: String,
    },
}

impl MetadataError {
    /// Project-relative path of the file the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Io { path, .. } | Self::UnsupportedEncoding { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Comprehensive error type for all indexing operations.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Two candidates resolved to the same project-relative path
    #[error(
        "File {path} can't be indexed twice. Please check that inclusion/exclusion patterns \
         produce disjoint sets for main and test files"
    )]
    DuplicatePath {
        /// Forward-slash project-relative path
        path: String,
    },

    /// A candidate path could not be resolved on disk
    #[error("Failed to resolve file '{path}': {source}")]
    PathResolution {
        /// Forward-slash path, project-relative when the candidate lies under the project
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Eager metadata computation failed for a freshly indexed file
    #[error("Failed to compute metadata of file '{path}': {source}")]
    Metadata {
        /// Forward-slash project-relative path
        path: String,
        /// Underlying metadata failure
        #[source]
        source: MetadataError,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// I/O errors outside of candidate resolution (config files, context setup)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The run was stopped by an earlier fatal error
    #[error("Indexing was aborted by a previous error")]
    Aborted,
}

impl IndexError {
    /// Create a duplicate path error
    pub fn duplicate_path(path: impl Into<String>) -> Self {
        Self::DuplicatePath { path: path.into() }
    }

    /// Create a path resolution error
    pub fn path_resolution(path: impl Into<String>, source: io::Error) -> Self {
        Self::PathResolution {
            path: path.into(),
            source,
        }
    }

    /// Create an eager metadata failure
    pub fn metadata(path: impl Into<String>, source: MetadataError) -> Self {
        Self::Metadata {
            path: path.into(),
            source,
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Prefix the message of an error with `context`.
    ///
    /// Path-carrying variants already name the offending file and are left
    /// unchanged.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            Self::Io { message, .. }
            | Self::Config { message, .. }
            | Self::Validation { message, .. }
            | Self::Serialization { message, .. } => {
                *message = format!("{context}: {message}");
            }
            Self::DuplicatePath { .. }
            | Self::PathResolution { .. }
            | Self::Metadata { .. }
            | Self::Aborted => {}
        }
        self
    }

    /// Whether this error carries a clean message meant for the end user,
    /// as opposed to an unexpected internal failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePath { .. }
                | Self::PathResolution { .. }
                | Self::Metadata { .. }
                | Self::Config { .. }
                | Self::Validation { .. }
        )
    }

    /// Whether this error stops the whole indexing run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePath { .. } | Self::PathResolution { .. } | Self::Metadata { .. }
        )
    }
}

impl From<io::Error> for IndexError {
    fn from(err: io::Error) -> Self {
        Self::io(err.to_string(), err)
    }
}

impl From<serde_yaml::Error> for IndexError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IndexError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
