//! TOML configuration file loading

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::builder::DialectConfigBuilder;
use crate::session::IsolationLevel;
use crate::{DialectError, Result};

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "HANA_DIALECT_CONFIG";

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./hdbconnect-dialect.toml",
    "~/.config/hdbconnect-dialect/config.toml",
];

/// Find the configuration file: `HANA_DIALECT_CONFIG` first, then the
/// default locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(
            path = %path.display(),
            "{CONFIG_PATH_VAR} points at a missing file, ignoring"
        );
    }

    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: DialectConfigBuilder) -> Result<DialectConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DialectError::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        DialectError::config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config, path)
}

fn apply_file_config(
    mut builder: DialectConfigBuilder,
    config: FileConfig,
    path: &Path,
) -> Result<DialectConfigBuilder> {
    // Compiler settings
    if let Some(compiler) = config.compiler {
        if let Some(native) = compiler.supports_native_boolean {
            builder = builder.supports_native_boolean(native);
        }

        if let Some(literal) = compiler.literal_binds {
            builder = builder.literal_binds(literal);
        }

        if let Some(checks) = compiler.supports_check_constraints {
            builder = builder.supports_check_constraints(checks);
        }

        if let Some(length) = compiler.max_identifier_length {
            builder = builder.max_identifier_length(length);
        }

        if let Some(words) = compiler.extra_reserved_words {
            builder = builder.extra_reserved_words(words);
        }
    }

    // Session settings
    if let Some(session) = config.session {
        if let Some(level) = session.isolation_level {
            let level: IsolationLevel = level.parse()?;
            builder = builder.isolation_level(level);
        }

        if let Some(lobs) = session.auto_convert_lobs {
            builder = builder.auto_convert_lobs(lobs);
        }
    }

    // Error classification, relative to the config file
    if let Some(errors) = config.errors
        && let Some(rules) = errors.rules
    {
        let rules = if rules.is_relative() {
            path.parent().map_or(rules.clone(), |dir| dir.join(&rules))
        } else {
            rules
        };
        builder = builder.error_rules(rules);
    }

    Ok(builder)
}

/// TOML file configuration structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    compiler: Option<CompilerFileConfig>,
    session: Option<SessionFileConfig>,
    errors: Option<ErrorsFileConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompilerFileConfig {
    supports_native_boolean: Option<bool>,
    literal_binds: Option<bool>,
    supports_check_constraints: Option<bool>,
    max_identifier_length: Option<usize>,
    extra_reserved_words: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionFileConfig {
    isolation_level: Option<String>,
    auto_convert_lobs: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ErrorsFileConfig {
    rules: Option<PathBuf>,
}
