//! Suffix-based language detection.

use std::path::Path;

use crate::core::config::IndexerConfig;
use crate::core::errors::Result;

/// Resolves the language of a candidate file.
///
/// The detection heuristic is pluggable; the indexer only relies on this
/// contract.
pub trait LanguageResolver: Send + Sync {
    /// Detect the language key of a file, or `None` when no language claims it.
    fn detect(&self, path: &Path, relative_path: &str) -> Option<String>;

    /// The single language the whole scan is restricted to, if any.
    fn forced_language(&self) -> Option<&str>;
}

/// One suffix claimed by a language.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SuffixEntry {
    /// Dot-prefixed, lowercased suffix (e.g. `.d.ts`).
    dotted: String,
    /// Language key owning the suffix.
    language: String,
}

/// [`LanguageResolver`] backed by the language table of [`IndexerConfig`].
///
/// The longest matching suffix wins and matching ignores ASCII case. When a
/// forced language is configured only that language's suffixes take part in
/// detection.
#[derive(Debug, Clone, Default)]
pub struct ExtensionLanguageResolver {
    entries: Vec<SuffixEntry>,
    forced_language: Option<String>,
}

impl ExtensionLanguageResolver {
    /// Build a resolver from a validated configuration.
    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        config.validate()?;

        let mut entries: Vec<SuffixEntry> = config
            .languages
            .iter()
            .filter(|(key, _)| {
                config
                    .forced_language
                    .as_deref()
                    .map_or(true, |forced| forced == key.as_str())
            })
            .flat_map(|(key, language)| {
                language.normalized_suffixes().map(move |suffix| SuffixEntry {
                    dotted: format!(".{suffix}"),
                    language: key.clone(),
                })
            })
            .collect();

        entries.sort_by(|a, b| b.dotted.len().cmp(&a.dotted.len()).then(a.dotted.cmp(&b.dotted)));

        Ok(Self {
            entries,
            forced_language: config.forced_language.clone(),
        })
    }

    /// Languages known to this resolver, in suffix-priority order.
    pub fn languages(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.language.as_str()) {
                seen.push(&entry.language);
            }
        }
        seen
    }
}

/// [`LanguageResolver`] implementation for [`ExtensionLanguageResolver`].
impl LanguageResolver for ExtensionLanguageResolver {
    fn detect(&self, path: &Path, _relative_path: &str) -> Option<String> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();

        self.entries
            .iter()
            .find(|entry| name.len() > entry.dotted.len() && name.ends_with(&entry.dotted))
            .map(|entry| entry.language.clone())
    }

    fn forced_language(&self) -> Option<&str> {
        self.forced_language.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IndexerConfig {
        IndexerConfig::default()
            .with_language("xoo", ["xoo"])
            .with_language("dts", [".d.ts"])
    }

    #[test]
    fn detects_by_suffix_ignoring_case() {
        let resolver = ExtensionLanguageResolver::from_config(&config()).unwrap();
        assert_eq!(
            resolver.detect(Path::new("/p/src/a.xoo"), "src/a.xoo"),
            Some("xoo".to_string())
        );
        assert_eq!(
            resolver.detect(Path::new("/p/src/A.XOO"), "src/A.XOO"),
            Some("xoo".to_string())
        );
        assert_eq!(resolver.detect(Path::new("/p/src/b.unknown"), "src/b.unknown"), None);
        assert!(resolver.forced_language().is_none());
    }

    #[test]
    fn longest_suffix_wins() {
        let resolver = ExtensionLanguageResolver::from_config(&config()).unwrap();
        assert_eq!(
            resolver.detect(Path::new("/p/types.d.ts"), "types.d.ts"),
            Some("dts".to_string())
        );
        assert_eq!(
            resolver.detect(Path::new("/p/main.ts"), "main.ts"),
            Some("ts".to_string())
        );
    }

    #[test]
    fn bare_suffix_is_not_a_match() {
        let resolver = ExtensionLanguageResolver::from_config(&config()).unwrap();
        assert_eq!(resolver.detect(Path::new("/p/.xoo"), ".xoo"), None);
    }

    #[test]
    fn forced_language_limits_detection() {
        let resolver =
            ExtensionLanguageResolver::from_config(&config().with_forced_language("java")).unwrap();
        assert_eq!(resolver.forced_language(), Some("java"));
        assert_eq!(resolver.detect(Path::new("/p/src/a.xoo"), "src/a.xoo"), None);
        assert_eq!(
            resolver.detect(Path::new("/p/src/B.java"), "src/B.java"),
            Some("java".to_string())
        );
        assert_eq!(resolver.languages(), vec!["java"]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = config().with_forced_language("cobol");
        assert!(ExtensionLanguageResolver::from_config(&config).is_err());
    }
}
