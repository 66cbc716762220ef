//! Configuration builder

use std::path::{Path, PathBuf};

use crate::classify::ErrorRuleSet;
use crate::compiler::{CompileContext, CompileOptions};
use crate::constants::MAX_IDENTIFIER_LENGTH;
use crate::ident::IdentifierNormalizer;
use crate::reflect::ReflectionCapabilities;
use crate::session::IsolationLevel;
use crate::{DialectError, Result};

/// Dialect configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectConfig {
    pub supports_native_boolean: bool,
    pub literal_binds: bool,
    pub supports_check_constraints: bool,
    /// Level applied to every new connection, if any.
    pub isolation_level: Option<IsolationLevel>,
    /// Materialize LOB results instead of handing out streams.
    pub auto_convert_lobs: bool,
    pub max_identifier_length: usize,
    pub extra_reserved_words: Vec<String>,
    /// TOML rule set replacing the built-in error classification table.
    pub error_rules: Option<PathBuf>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        DialectConfigBuilder::new().into_config()
    }
}

impl DialectConfig {
    #[must_use]
    pub const fn builder() -> DialectConfigBuilder {
        DialectConfigBuilder::new()
    }

    #[must_use]
    pub const fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            literal_binds: self.literal_binds,
            native_boolean: self.supports_native_boolean,
            supports_check_constraints: self.supports_check_constraints,
            max_identifier_length: self.max_identifier_length,
        }
    }

    #[must_use]
    pub fn normalizer(&self) -> IdentifierNormalizer {
        IdentifierNormalizer::new().with_reserved_words(&self.extra_reserved_words)
    }

    #[must_use]
    pub fn compile_context(&self) -> CompileContext {
        CompileContext::new(self.compile_options()).with_normalizer(self.normalizer())
    }

    #[must_use]
    pub fn reflection_capabilities(&self) -> ReflectionCapabilities {
        ReflectionCapabilities {
            check_constraints: self.supports_check_constraints,
            ..ReflectionCapabilities::default()
        }
    }

    /// The configured rule set, or the built-in one.
    pub fn load_error_rules(&self) -> Result<ErrorRuleSet> {
        match &self.error_rules {
            Some(path) => {
                let rules = ErrorRuleSet::from_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    rules = rules.rules.len(),
                    "loaded error rules"
                );
                Ok(rules)
            }
            None => Ok(ErrorRuleSet::builtin()),
        }
    }
}

/// Builder for [`DialectConfig`]
#[derive(Debug, Clone)]
pub struct DialectConfigBuilder {
    supports_native_boolean: bool,
    literal_binds: bool,
    supports_check_constraints: bool,
    isolation_level: Option<IsolationLevel>,
    auto_convert_lobs: bool,
    max_identifier_length: usize,
    extra_reserved_words: Vec<String>,
    error_rules: Option<PathBuf>,
}

impl Default for DialectConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            supports_native_boolean: true,
            literal_binds: false,
            supports_check_constraints: true,
            isolation_level: None,
            auto_convert_lobs: true,
            max_identifier_length: MAX_IDENTIFIER_LENGTH,
            extra_reserved_words: Vec::new(),
            error_rules: None,
        }
    }

    #[must_use]
    pub const fn supports_native_boolean(mut self, enabled: bool) -> Self {
        self.supports_native_boolean = enabled;
        self
    }

    #[must_use]
    pub const fn literal_binds(mut self, enabled: bool) -> Self {
        self.literal_binds = enabled;
        self
    }

    #[must_use]
    pub const fn supports_check_constraints(mut self, enabled: bool) -> Self {
        self.supports_check_constraints = enabled;
        self
    }

    #[must_use]
    pub const fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    #[must_use]
    pub const fn auto_convert_lobs(mut self, enabled: bool) -> Self {
        self.auto_convert_lobs = enabled;
        self
    }

    #[must_use]
    pub const fn max_identifier_length(mut self, length: usize) -> Self {
        self.max_identifier_length = length;
        self
    }

    #[must_use]
    pub fn extra_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_reserved_words
            .extend(words.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn error_rules(mut self, path: impl AsRef<Path>) -> Self {
        self.error_rules = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier length limit is zero or above
    /// what HANA accepts.
    pub fn build(self) -> Result<DialectConfig> {
        if self.max_identifier_length == 0 || self.max_identifier_length > MAX_IDENTIFIER_LENGTH {
            return Err(DialectError::config(format!(
                "max_identifier_length must be between 1 and {MAX_IDENTIFIER_LENGTH}, got {}",
                self.max_identifier_length
            )));
        }
        Ok(self.into_config())
    }

    fn into_config(self) -> DialectConfig {
        DialectConfig {
            supports_native_boolean: self.supports_native_boolean,
            literal_binds: self.literal_binds,
            supports_check_constraints: self.supports_check_constraints,
            isolation_level: self.isolation_level,
            auto_convert_lobs: self.auto_convert_lobs,
            max_identifier_length: self.max_identifier_length,
            extra_reserved_words: self.extra_reserved_words,
            error_rules: self.error_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = DialectConfig::builder().build().unwrap();
        assert!(config.supports_native_boolean);
        assert!(!config.literal_binds);
        assert!(config.supports_check_constraints);
        assert!(config.auto_convert_lobs);
        assert_eq!(config.isolation_level, None);
        assert_eq!(config.max_identifier_length, MAX_IDENTIFIER_LENGTH);
        assert_eq!(config, DialectConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let config = DialectConfig::builder()
            .supports_native_boolean(false)
            .literal_binds(true)
            .isolation_level(IsolationLevel::ReadCommitted)
            .extra_reserved_words(["window"])
            .build()
            .unwrap();
        let options = config.compile_options();
        assert!(!options.native_boolean);
        assert!(options.literal_binds);
        assert_eq!(config.isolation_level, Some(IsolationLevel::ReadCommitted));
        assert!(config.normalizer().is_reserved("WINDOW"));
    }

    #[test]
    fn test_builder_rejects_identifier_length() {
        let err = DialectConfig::builder()
            .max_identifier_length(500)
            .build()
            .unwrap_err();
        assert!(err.is_config());
        assert!(DialectConfig::builder().max_identifier_length(0).build().is_err());
    }

    #[test]
    fn test_check_constraints_flow_into_reflection() {
        let config = DialectConfig::builder()
            .supports_check_constraints(false)
            .build()
            .unwrap();
        assert!(!config.reflection_capabilities().check_constraints);
        assert!(config.reflection_capabilities().foreign_key_rules);
    }

    #[test]
    fn test_builtin_error_rules_without_path() {
        let rules = DialectConfig::default().load_error_rules().unwrap();
        assert_eq!(rules, ErrorRuleSet::builtin());
    }
}
