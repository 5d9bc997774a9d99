//! Content-derived metadata and the lazy/eager scheduling decision.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::errors::{IndexError, MetadataError, Result};
use crate::index::record::{FileMetadata, IndexedFile};

/// Computes the content-derived metadata of an indexed file.
pub trait MetadataGenerator: Send + Sync {
    /// Compute metadata for `file`, decoding it with `encoding`.
    fn generate(
        &self,
        module_key_with_branch: &str,
        file: &IndexedFile,
        encoding: &str,
    ) -> std::result::Result<FileMetadata, MetadataError>;
}

/// Charsets understood by [`ContentMetadataGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Some(Self::Utf8),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Some(Self::Latin1),
            "US-ASCII" | "ASCII" => Some(Self::Ascii),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
        }
    }

    fn decode(self, bytes: &[u8]) -> std::result::Result<String, String> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
            }
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(format!("non-ASCII byte at offset {offset}")),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
        }
    }
}

/// Reads the file from disk and derives hash, charset and line index.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentMetadataGenerator;

impl ContentMetadataGenerator {
    /// Create the generator
    pub fn new() -> Self {
        Self
    }
}

impl MetadataGenerator for ContentMetadataGenerator {
    fn generate(
        &self,
        _module_key_with_branch: &str,
        file: &IndexedFile,
        encoding: &str,
    ) -> std::result::Result<FileMetadata, MetadataError> {
        let path = file.project_relative_path();
        let charset = Charset::from_label(encoding).ok_or_else(|| MetadataError::UnsupportedEncoding {
            path: path.to_string(),
            encoding: encoding.to_string(),
        })?;

        let bytes = std::fs::read(file.absolute_path()).map_err(|e| MetadataError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let content = charset.decode(&bytes).map_err(|message| MetadataError::Decode {
            path: path.to_string(),
            encoding: charset.name().to_string(),
            message,
        })?;

        let metadata = metadata_of(&content, charset.name());
        debug!("'{}' generated metadata with charset '{}'", path, metadata.charset);
        Ok(metadata)
    }
}

/// Line index and hash of decoded content. `\r\n` and lone `\r` count as a
/// single line break and are hashed as `\n`.
fn metadata_of(content: &str, charset: &str) -> FileMetadata {
    let mut normalized = String::with_capacity(content.len());
    let mut line_start_offsets = vec![0];
    let mut offset = 0usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        let c = if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            '\n'
        } else {
            c
        };
        normalized.push(c);
        offset += 1;
        if c == '\n' {
            line_start_offsets.push(offset);
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());

    FileMetadata {
        charset: charset.to_string(),
        hash: format!("{:x}", hasher.finalize()),
        lines: line_start_offsets.len(),
        line_start_offsets,
        last_valid_offset: offset,
        empty: content.is_empty(),
    }
}

/// Decides whether metadata is computed at registration or on first access.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataScheduler {
    eager: bool,
}

impl MetadataScheduler {
    /// Eager when `preload_file_metadata` is set, lazy otherwise
    pub fn new(preload_file_metadata: bool) -> Self {
        Self {
            eager: preload_file_metadata,
        }
    }

    /// Whether metadata is computed at registration
    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Force metadata of a freshly registered file when running eagerly.
    ///
    /// In lazy mode this is a no-op. In eager mode any failure is fatal.
    pub fn schedule(&self, file: &IndexedFile) -> Result<()> {
        if self.eager {
            file.metadata()
                .map_err(|err| IndexError::metadata(file.project_relative_path(), err))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_normalizes_line_endings() {
        let metadata = metadata_of("a\r\nbc\rd\n", "UTF-8");
        assert_eq!(metadata.lines, 4);
        assert_eq!(metadata.line_start_offsets, vec![0, 2, 5, 7]);
        assert_eq!(metadata.last_valid_offset, 7);
        assert!(!metadata.empty);
        assert_eq!(metadata.hash, metadata_of("a\nbc\nd\n", "UTF-8").hash);
    }

    #[test]
    fn empty_content_has_one_line() {
        let metadata = metadata_of("", "UTF-8");
        assert!(metadata.empty);
        assert_eq!(metadata.lines, 1);
        assert_eq!(metadata.last_valid_offset, 0);
        assert_eq!(
            metadata.hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn charset_labels() {
        assert_eq!(Charset::from_label("utf-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("latin1"), Some(Charset::Latin1));
        assert_eq!(Charset::from_label("US_ASCII"), Some(Charset::Ascii));
        assert_eq!(Charset::from_label("EBCDIC"), None);
    }

    #[test]
    fn decoding() {
        assert_eq!(Charset::Utf8.decode(b"\xEF\xBB\xBFabc").unwrap(), "abc");
        assert!(Charset::Utf8.decode(b"\xFF").is_err());
        assert_eq!(Charset::Latin1.decode(b"caf\xE9").unwrap(), "café");
        assert!(Charset::Ascii.decode(b"caf\xE9").is_err());
    }

    #[test]
    fn scheduler_modes() {
        assert!(!MetadataScheduler::default().is_eager());
        assert!(MetadataScheduler::new(true).is_eager());
    }
}
