//! Configuration types for the file indexing pipeline.
//!
//! Configuration is plain serde data loaded from YAML. Every section carries
//! defaults so that a partial file (or no file at all) yields a usable
//! configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use globset::Glob;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{IndexError, Result, ResultExt};

/// Main configuration for the indexing session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Compute content metadata right after a file is registered instead of
    /// deferring it to first access
    #[serde(default)]
    pub preload_file_metadata: bool,

    /// Restrict the scan to a single language; files of any other language
    /// are invisible to the analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_language: Option<String>,

    /// Language definitions keyed by language key
    #[serde(default = "IndexerConfig::default_languages")]
    pub languages: IndexMap<String, LanguageConfig>,

    /// Project-wide inclusion/exclusion patterns
    #[serde(default)]
    pub exclusions: PatternConfig,

    /// Minimum delay between two logged progress messages
    #[serde(default = "IndexerConfig::default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

/// Default implementation for [`IndexerConfig`].
impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            preload_file_metadata: false,
            forced_language: None,
            languages: Self::default_languages(),
            exclusions: PatternConfig::default(),
            progress_interval_ms: Self::default_progress_interval_ms(),
        }
    }
}

impl IndexerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text and validate it
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Enable eager metadata computation
    pub fn with_preloaded_metadata(mut self) -> Self {
        self.preload_file_metadata = true;
        self
    }

    /// Force a single language for the whole scan
    pub fn with_forced_language(mut self, language: impl Into<String>) -> Self {
        self.forced_language = Some(language.into());
        self
    }

    /// Drop every language definition, including the defaults
    pub fn without_languages(mut self) -> Self {
        self.languages.clear();
        self
    }

    /// Register (or replace) a language definition
    pub fn with_language<I, S>(mut self, key: impl Into<String>, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages.insert(
            key.into(),
            LanguageConfig {
                file_suffixes: suffixes.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Default language definitions
    fn default_languages() -> IndexMap<String, LanguageConfig> {
        let mut languages = IndexMap::new();
        for (key, suffixes) in [
            ("java", &["java", "jav"][..]),
            ("py", &["py", "pyi"][..]),
            ("js", &["js", "jsx", "mjs", "cjs"][..]),
            ("ts", &["ts", "tsx", "cts", "mts"][..]),
            ("rs", &["rs"][..]),
            ("go", &["go"][..]),
        ] {
            languages.insert(
                key.to_string(),
                LanguageConfig {
                    file_suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
                },
            );
        }
        languages
    }

    const fn default_progress_interval_ms() -> u64 {
        10_000
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        let mut owners: HashMap<String, &str> = HashMap::new();

        for (key, language) in &self.languages {
            if key.trim().is_empty() {
                return Err(IndexError::config_field(
                    "Language key must not be empty",
                    "languages",
                ));
            }
            language.validate().map_err(|e| {
                IndexError::config_field(
                    format!("Invalid language configuration: {e}"),
                    format!("languages.{key}"),
                )
            })?;

            for suffix in language.normalized_suffixes() {
                if let Some(other) = owners.insert(suffix.clone(), key) {
                    return Err(IndexError::config_field(
                        format!("Suffix '{suffix}' is declared by both '{other}' and '{key}'"),
                        format!("languages.{key}.file_suffixes"),
                    ));
                }
            }
        }

        if let Some(forced) = &self.forced_language {
            if !self.languages.contains_key(forced) {
                return Err(IndexError::config_field(
                    format!("Forced language '{forced}' is not a declared language"),
                    "forced_language",
                ));
            }
        }

        self.exclusions.validate()
    }
}

/// Language definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// File suffixes (with or without leading dot) mapped to this language
    #[serde(default)]
    pub file_suffixes: Vec<String>,
}

impl LanguageConfig {
    /// Suffixes lowercased and stripped of their leading dot
    pub fn normalized_suffixes(&self) -> impl Iterator<Item = String> + '_ {
        self.file_suffixes
            .iter()
            .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Validate language configuration
    pub fn validate(&self) -> Result<()> {
        if self.normalized_suffixes().next().is_none() {
            return Err(IndexError::validation(
                "at least one file suffix is required",
            ));
        }
        Ok(())
    }
}

/// Inclusion/exclusion glob patterns for one configuration scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Main files must match one of these when non-empty
    #[serde(default)]
    pub inclusions: Vec<String>,

    /// Main files matching any of these are excluded
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Test files must match one of these when non-empty
    #[serde(default)]
    pub test_inclusions: Vec<String>,

    /// Test files matching any of these are excluded
    #[serde(default)]
    pub test_exclusions: Vec<String>,
}

impl PatternConfig {
    /// True when no pattern of any kind is configured
    pub fn is_empty(&self) -> bool {
        self.inclusions.is_empty()
            && self.exclusions.is_empty()
            && self.test_inclusions.is_empty()
            && self.test_exclusions.is_empty()
    }

    /// Validate that every pattern compiles
    pub fn validate(&self) -> Result<()> {
        for (field, patterns) in [
            ("inclusions", &self.inclusions),
            ("exclusions", &self.exclusions),
            ("test_inclusions", &self.test_inclusions),
            ("test_exclusions", &self.test_exclusions),
        ] {
            for pattern in patterns {
                Glob::new(pattern.trim()).map_err(|err| {
                    IndexError::config_field(
                        format!("Invalid glob pattern '{pattern}': {err}"),
                        format!("exclusions.{field}"),
                    )
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = IndexerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.preload_file_metadata);
        assert!(config.forced_language.is_none());
        assert!(config.languages.contains_key("java"));
    }

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
preload_file_metadata: true
forced_language: xoo
languages:
  xoo:
    file_suffixes: [".xoo"]
exclusions:
  exclusions: ["**/generated/**"]
"#;
        let config = IndexerConfig::from_yaml_str(yaml).unwrap();
        assert!(config.preload_file_metadata);
        assert_eq!(config.forced_language.as_deref(), Some("xoo"));
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.exclusions.exclusions, vec!["**/generated/**".to_string()]);
        assert_eq!(config.progress_interval_ms, 10_000);
    }

    #[test]
    fn rejects_unknown_forced_language() {
        let config = IndexerConfig::default().with_forced_language("cobol");
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Config { field: Some(ref f), .. } if f == "forced_language"
        ));
    }

    #[test]
    fn rejects_suffix_claimed_twice() {
        let config = IndexerConfig::default()
            .with_language("xoo", [".xoo"])
            .with_language("xoo2", ["XOO"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'xoo'"));
    }

    #[test]
    fn rejects_language_without_suffix() {
        let config = IndexerConfig::default().with_language("empty", Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_glob() {
        let mut config = IndexerConfig::default();
        config.exclusions.test_exclusions.push("[invalid".to_string());
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Config { field: Some(ref f), .. } if f == "exclusions.test_exclusions"
        ));
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexer.yml");
        let config = IndexerConfig::default()
            .with_language("xoo", ["xoo"])
            .with_preloaded_metadata();

        config.to_yaml_file(&path).unwrap();
        let loaded = IndexerConfig::from_yaml_file(&path).unwrap();

        assert!(loaded.preload_file_metadata);
        assert!(loaded.languages.contains_key("xoo"));
    }

    #[test]
    fn missing_file_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");

        let err = IndexerConfig::from_yaml_file(&path).unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, IndexError::Io { .. }));
        assert!(message.starts_with("I/O error: Failed to read config file "));
        assert!(message.contains("missing.yml"));
    }

    #[test]
    fn unwritable_target_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("indexer.yml");

        let err = IndexerConfig::default().to_yaml_file(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to write config file"));
        assert!(err.to_string().contains("indexer.yml"));
    }
}
