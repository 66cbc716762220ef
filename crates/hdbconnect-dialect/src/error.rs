//! Error hierarchy for hdbconnect-dialect.
//!
//! Follows the "canonical error struct" pattern: callers branch on
//! `is_xxx()` predicates, never on the internal `ErrorKind`.

use thiserror::Error;

use crate::classify::{ClassifiedError, DriverError};

/// Root error type for the dialect crate.
///
/// Covers compile-time rejections, invalid type construction, value
/// conversion, reflection lookups and failures reported by the execution
/// collaborator.
///
/// # Example
///
/// ```rust,ignore
/// use hdbconnect_dialect::DialectError;
///
/// fn handle(err: &DialectError) {
///     if err.is_not_found() {
///         eprintln!("table does not exist");
///     } else if err.is_unsupported_feature() {
///         eprintln!("HANA cannot express this statement");
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct DialectError {
    kind: ErrorKind,
}

/// Internal error classification.
///
/// `pub(crate)` so variants can be added without breaking callers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    /// Construct the dialect cannot render.
    #[error("unsupported by the hana dialect: {feature}")]
    UnsupportedFeature { feature: String },

    /// Portable type rejected at construction.
    #[error("invalid type: {message}")]
    InvalidType { message: String },

    /// Runtime value of an unexpected shape.
    #[error("unsupported value for {type_name}: {message}")]
    UnsupportedValue { type_name: String, message: String },

    /// Reflected object does not exist.
    #[error("{object} not found: {name}")]
    NotFound { object: &'static str, name: String },

    /// Catalog row did not have the expected shape.
    #[error("malformed catalog row: {message}")]
    Catalog { message: String },

    /// Bad argument supplied by the caller (e.g. isolation level).
    #[error("{0}")]
    InvalidArgument(String),

    /// Configuration load or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection URL could not be interpreted.
    #[error("invalid connection url: {0}")]
    Url(String),

    /// Integrity constraint violated (unique key, code 301).
    #[error("integrity error: {0}")]
    Integrity(DriverError),

    /// Driver error that matched a classification rule.
    #[error(transparent)]
    Classified(ClassifiedError),

    /// Driver error passed through unchanged.
    #[error("database error: {0}")]
    Driver(DriverError),
}

impl DialectError {
    // ═══════════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════════

    /// Create error for a construct HANA cannot express.
    #[must_use]
    pub fn unsupported_feature(feature: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedFeature {
                feature: feature.into(),
            },
        }
    }

    /// Create error for an invalid portable type.
    #[must_use]
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidType {
                message: message.into(),
            },
        }
    }

    /// Create error for a value of an unexpected runtime shape.
    #[must_use]
    pub fn unsupported_value(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedValue {
                type_name: type_name.into(),
                message: message.into(),
            },
        }
    }

    /// Create error for a missing catalog object.
    #[must_use]
    pub fn not_found(object: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound {
                object,
                name: name.into(),
            },
        }
    }

    /// Create error for an unexpected catalog row shape.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Catalog {
                message: message.into(),
            },
        }
    }

    /// Create error for an invalid caller argument.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidArgument(message.into()),
        }
    }

    /// Create configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config(message.into()),
        }
    }

    /// Create connection URL error.
    #[must_use]
    pub fn url(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Url(message.into()),
        }
    }

    /// Create integrity error.
    #[must_use]
    pub const fn integrity(source: DriverError) -> Self {
        Self {
            kind: ErrorKind::Integrity(source),
        }
    }

    /// Wrap an unclassified driver error.
    #[must_use]
    pub const fn driver(source: DriverError) -> Self {
        Self {
            kind: ErrorKind::Driver(source),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicate Methods (is_xxx)
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns true if the dialect cannot express the requested construct.
    #[must_use]
    pub const fn is_unsupported_feature(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedFeature { .. })
    }

    /// Returns true if a portable type was rejected.
    #[must_use]
    pub const fn is_invalid_type(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidType { .. })
    }

    /// Returns true if a value had an unsupported runtime shape.
    #[must_use]
    pub const fn is_unsupported_value(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedValue { .. })
    }

    /// Returns true if a reflected object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }

    /// Returns true if a catalog row was malformed.
    #[must_use]
    pub const fn is_catalog(&self) -> bool {
        matches!(self.kind, ErrorKind::Catalog { .. })
    }

    /// Returns true for invalid caller arguments.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument(_))
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    /// Returns true for connection URL errors.
    #[must_use]
    pub const fn is_url(&self) -> bool {
        matches!(self.kind, ErrorKind::Url(_))
    }

    /// Returns true for integrity violations.
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self.kind, ErrorKind::Integrity(_))
    }

    /// Returns true if a driver error was classified.
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        matches!(self.kind, ErrorKind::Classified(_))
    }

    /// Returns true for an unclassified driver error.
    #[must_use]
    pub const fn is_driver(&self) -> bool {
        matches!(self.kind, ErrorKind::Driver(_))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// The classified driver error, if any.
    #[must_use]
    pub const fn as_classified(&self) -> Option<&ClassifiedError> {
        match &self.kind {
            ErrorKind::Classified(err) => Some(err),
            _ => None,
        }
    }

    /// The underlying driver error for driver-originated errors.
    #[must_use]
    pub const fn driver_error(&self) -> Option<&DriverError> {
        match &self.kind {
            ErrorKind::Classified(err) => Some(err.source_error()),
            ErrorKind::Integrity(err) | ErrorKind::Driver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClassifiedError> for DialectError {
    fn from(err: ClassifiedError) -> Self {
        Self {
            kind: ErrorKind::Classified(err),
        }
    }
}

impl From<url::ParseError> for DialectError {
    fn from(err: url::ParseError) -> Self {
        Self::url(err.to_string())
    }
}

impl From<toml::de::Error> for DialectError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

/// Result type alias for dialect operations.
pub type Result<T> = std::result::Result<T, DialectError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ErrorRuleSet;

    #[test]
    fn test_unsupported_feature() {
        let err = DialectError::unsupported_feature("ARRAY columns");
        assert!(err.is_unsupported_feature());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("ARRAY columns"));
    }

    #[test]
    fn test_not_found_message() {
        let err = DialectError::not_found("table", "HR.EMPLOYEES");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "table not found: HR.EMPLOYEES");
    }

    #[test]
    fn test_invalid_type() {
        let err = DialectError::invalid_type("VARCHAR length 6000 exceeds 5000");
        assert!(err.is_invalid_type());
        assert!(!err.is_unsupported_value());
    }

    #[test]
    fn test_unsupported_value() {
        let err = DialectError::unsupported_value("BLOB", "expected bytes");
        assert!(err.is_unsupported_value());
        assert!(err.to_string().contains("BLOB"));
    }

    #[test]
    fn test_driver_error_accessor() {
        let err = DialectError::driver(DriverError::new(-10800, "odd"));
        assert!(err.is_driver());
        assert_eq!(err.driver_error().map(DriverError::code), Some(-10800));
        assert!(err.as_classified().is_none());
    }

    #[test]
    fn test_from_classified() {
        let rules = ErrorRuleSet::builtin();
        let classified = rules
            .classify(DriverError::new(133, "deadlock detected"))
            .into_classified()
            .unwrap();
        let err = DialectError::from(classified);
        assert!(err.is_classified());
        assert!(err.as_classified().unwrap().is_deadlock());
        assert_eq!(err.driver_error().map(DriverError::code), Some(133));
    }

    #[test]
    fn test_integrity() {
        let err = DialectError::integrity(DriverError::new(301, "unique constraint violated"));
        assert!(err.is_integrity());
        assert!(err.to_string().starts_with("integrity error"));
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: DialectError = url::Url::parse("not a url").unwrap_err().into();
        assert!(err.is_url());
    }
}
