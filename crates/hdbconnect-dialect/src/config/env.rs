//! Environment variable loading for configuration

use std::env;

use super::builder::DialectConfigBuilder;
use crate::session::IsolationLevel;
use crate::{DialectError, Result};

/// Environment variable names
mod vars {
    pub const HANA_DIALECT_NATIVE_BOOLEAN: &str = "HANA_DIALECT_NATIVE_BOOLEAN";
    pub const HANA_DIALECT_LITERAL_BINDS: &str = "HANA_DIALECT_LITERAL_BINDS";
    pub const HANA_DIALECT_CHECK_CONSTRAINTS: &str = "HANA_DIALECT_CHECK_CONSTRAINTS";
    pub const HANA_DIALECT_ISOLATION_LEVEL: &str = "HANA_DIALECT_ISOLATION_LEVEL";
    pub const HANA_DIALECT_ERROR_RULES: &str = "HANA_DIALECT_ERROR_RULES";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: DialectConfigBuilder) -> Result<DialectConfigBuilder> {
    if let Ok(val) = env::var(vars::HANA_DIALECT_NATIVE_BOOLEAN) {
        builder = builder.supports_native_boolean(parse_bool(&val));
    }

    if let Ok(val) = env::var(vars::HANA_DIALECT_LITERAL_BINDS) {
        builder = builder.literal_binds(parse_bool(&val));
    }

    if let Ok(val) = env::var(vars::HANA_DIALECT_CHECK_CONSTRAINTS) {
        builder = builder.supports_check_constraints(parse_bool(&val));
    }

    if let Ok(val) = env::var(vars::HANA_DIALECT_ISOLATION_LEVEL) {
        let level: IsolationLevel = val.parse().map_err(|e| {
            DialectError::config(format!(
                "Invalid {}: {}",
                vars::HANA_DIALECT_ISOLATION_LEVEL,
                e
            ))
        })?;
        builder = builder.isolation_level(level);
    }

    if let Ok(path) = env::var(vars::HANA_DIALECT_ERROR_RULES)
        && !path.is_empty()
    {
        builder = builder.error_rules(path);
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
