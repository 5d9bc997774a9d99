//! Language resolution and the forced-language restriction.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::lang::registry::LanguageResolver;

/// What the gate decided for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageVerdict {
    /// Continue indexing; the language may legitimately be unknown
    Proceed(Option<String>),
    /// A forced language is configured and the file does not belong to it
    ForcedLanguageMismatch {
        /// The configured forced language
        forced: String,
    },
}

/// Resolves the language of a candidate and hides files that do not match a
/// forced language.
pub struct LanguageGate {
    resolver: Arc<dyn LanguageResolver>,
}

impl LanguageGate {
    /// Wrap a language resolver
    pub fn new(resolver: Arc<dyn LanguageResolver>) -> Self {
        Self { resolver }
    }

    /// Detect the language of a resolved candidate
    pub fn evaluate(&self, path: &Path, project_relative: &str) -> LanguageVerdict {
        let language = self.resolver.detect(path, project_relative);

        match (language, self.resolver.forced_language()) {
            (None, Some(forced)) => {
                warn!(
                    "File '{}' is ignored because it doesn't belong to the forced language '{}'",
                    path.display(),
                    forced
                );
                LanguageVerdict::ForcedLanguageMismatch {
                    forced: forced.to_string(),
                }
            }
            (language, _) => LanguageVerdict::Proceed(language),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IndexerConfig;
    use crate::lang::registry::ExtensionLanguageResolver;

    fn gate(config: IndexerConfig) -> LanguageGate {
        LanguageGate::new(Arc::new(ExtensionLanguageResolver::from_config(&config).unwrap()))
    }

    #[test]
    fn unknown_language_still_proceeds() {
        let gate = gate(IndexerConfig::default().without_languages().with_language("xoo", ["xoo"]));

        assert_eq!(
            gate.evaluate(Path::new("/p/src/a.xoo"), "src/a.xoo"),
            LanguageVerdict::Proceed(Some("xoo".to_string()))
        );
        assert_eq!(
            gate.evaluate(Path::new("/p/src/b.java"), "src/b.java"),
            LanguageVerdict::Proceed(None)
        );
    }

    #[test]
    fn forced_language_hides_other_files() {
        let gate = gate(
            IndexerConfig::default()
                .with_language("xoo", ["xoo"])
                .with_forced_language("java"),
        );

        assert_eq!(
            gate.evaluate(Path::new("/p/src/a.xoo"), "src/a.xoo"),
            LanguageVerdict::ForcedLanguageMismatch {
                forced: "java".to_string()
            }
        );
        assert_eq!(
            gate.evaluate(Path::new("/p/src/B.java"), "src/B.java"),
            LanguageVerdict::Proceed(Some("java".to_string()))
        );
    }
}
