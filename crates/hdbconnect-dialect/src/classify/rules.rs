//! Ordered, data-driven classification rules.
//!
//! The built-in table can be replaced by a TOML document:
//!
//! ```toml
//! version = 1
//!
//! [[rule]]
//! class = "deadlock"
//! [[rule.match]]
//! codes = [133]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Classification, ClassifiedError, DriverError, ErrorClass};
use crate::{DialectError, Result};

/// Rule-set format understood by this crate.
pub const RULE_SET_VERSION: u32 = 1;

/// One alternative of a rule. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Matcher {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_with: Option<String>,
}

impl Matcher {
    fn code(code: i32) -> Self {
        Self {
            codes: vec![code],
            ..Self::default()
        }
    }

    fn codes(codes: &[i32]) -> Self {
        Self {
            codes: codes.to_vec(),
            ..Self::default()
        }
    }

    fn contains(text: &str) -> Self {
        Self {
            contains: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn equals(text: &str) -> Self {
        Self {
            equals: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn starts_with(text: &str) -> Self {
        Self {
            starts_with: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn and_contains(mut self, text: &str) -> Self {
        self.contains = Some(text.to_string());
        self
    }

    const fn is_empty(&self) -> bool {
        self.codes.is_empty()
            && self.contains.is_none()
            && self.equals.is_none()
            && self.starts_with.is_none()
    }

    #[must_use]
    pub fn matches(&self, error: &DriverError) -> bool {
        let text = error.text();
        (self.codes.is_empty() || self.codes.contains(&error.code()))
            && self.contains.as_deref().is_none_or(|s| text.contains(s))
            && self.equals.as_deref().is_none_or(|s| text == s)
            && self.starts_with.as_deref().is_none_or(|s| text.starts_with(s))
    }
}

/// A classification and the alternatives that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRule {
    pub class: ErrorClass,
    #[serde(rename = "match")]
    pub alternatives: Vec<Matcher>,
}

impl ErrorRule {
    fn new(class: ErrorClass, alternatives: Vec<Matcher>) -> Self {
        Self {
            class,
            alternatives,
        }
    }

    #[must_use]
    pub fn matches(&self, error: &DriverError) -> bool {
        self.alternatives.iter().any(|m| m.matches(error))
    }
}

/// Versioned, ordered rule table. First match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorRuleSet {
    pub version: u32,
    #[serde(rename = "rule")]
    pub rules: Vec<ErrorRule>,
}

impl ErrorRuleSet {
    /// The rule table shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        use ErrorClass as C;

        let rules = vec![
            // sqldbc client codes for broken connections
            ErrorRule::new(C::ClientConnection, vec![Matcher::codes(&[-10807, -10709])]),
            ErrorRule::new(C::StatementTimeout, vec![Matcher::code(613)]),
            ErrorRule::new(
                C::TransactionCancelled,
                vec![Matcher::code(139).and_contains(
                    "current operation cancelled by request and transaction rolled back",
                )],
            ),
            ErrorRule::new(
                C::SequenceCacheTimeout,
                vec![Matcher::contains(
                    "Lock timeout occurs while waiting sequence cache lock",
                )],
            ),
            ErrorRule::new(
                C::SequenceLockTimeout,
                vec![
                    Matcher::code(131)
                        .and_contains("Lock timeout occurs while waiting sequence lock"),
                ],
            ),
            ErrorRule::new(C::LockWaitTimeout, vec![Matcher::code(131)]),
            ErrorRule::new(C::LockAcquisition, vec![Matcher::code(146)]),
            ErrorRule::new(C::Deadlock, vec![Matcher::code(133)]),
            ErrorRule::new(
                C::DatabaseOutOfMemory,
                vec![
                    Matcher::contains("OutOfMemory exception"),
                    Matcher::contains("cannot allocate enough memory"),
                    Matcher::contains("Allocation failed"),
                    Matcher::code(4),
                ],
            ),
            ErrorRule::new(
                C::DatabaseOverloaded,
                vec![Matcher::code(129).and_contains("max number of SqlExecutor threads are exceeded")],
            ),
            ErrorRule::new(
                C::DatabaseConnectNotPossible,
                vec![
                    Matcher::code(663).and_contains("Error GBA503: Service is unavailable"),
                    Matcher::equals("HANA Cloud region is in maintenance window"),
                    Matcher::equals("HANA Database instance upgrade in progress"),
                    Matcher::code(1888),
                ],
            ),
            ErrorRule::new(
                C::StatementExecution,
                vec![
                    // 129: transaction rolled back by an internal error
                    Matcher::codes(&[129, 145]),
                    Matcher::code(2048).and_contains("An error occurred while opening the channel"),
                    Matcher::contains("Exception in executor plan"),
                    Matcher::contains("DTX commit(first phase commit) failed"),
                    Matcher::contains("An error occurred while reading from the channel"),
                    Matcher::contains("temp index not exists"),
                ],
            ),
            ErrorRule::new(C::InvalidObjectName, vec![Matcher::code(397)]),
            ErrorRule::new(
                C::WriteInReadOnlyReplication,
                vec![Matcher::starts_with(
                    "feature not supported: writable statement not allowed in read-enabled replication",
                )],
            ),
        ];

        Self {
            version: RULE_SET_VERSION,
            rules,
        }
    }

    /// Parse and validate a TOML rule table.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let set: Self = toml::from_str(source)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a TOML rule table from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DialectError::config(format!(
                "failed to read error rules {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.version != RULE_SET_VERSION {
            return Err(DialectError::config(format!(
                "unsupported error rule set version {} (expected {RULE_SET_VERSION})",
                self.version
            )));
        }
        for rule in &self.rules {
            if rule.alternatives.is_empty() {
                return Err(DialectError::config(format!(
                    "rule for '{}' has no match alternatives",
                    rule.class
                )));
            }
            if rule.alternatives.iter().any(Matcher::is_empty) {
                return Err(DialectError::config(format!(
                    "rule for '{}' has an empty match that would catch every error",
                    rule.class
                )));
            }
        }
        Ok(())
    }

    /// Map a native error onto the portable taxonomy.
    ///
    /// A savepoint-not-found artifact (code 128) is classified by its
    /// inner cause instead. Unmatched errors come back unchanged.
    #[must_use]
    pub fn classify(&self, mut error: DriverError) -> Classification {
        if error.is_savepoint_artifact()
            && let Some(cause) = error.cause.take()
        {
            tracing::debug!(
                inner_code = cause.code(),
                "classifying cause of TxSavepoint artifact"
            );
            return self.classify(*cause);
        }

        match self.rules.iter().find(|rule| rule.matches(&error)) {
            Some(rule) => {
                tracing::debug!(code = error.code(), class = %rule.class, "driver error classified");
                Classification::Classified(ClassifiedError::new(rule.class, error))
            }
            None => Classification::Unchanged(error),
        }
    }
}

impl Default for ErrorRuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn class_of(code: i32, text: &str) -> Option<ErrorClass> {
        ErrorRuleSet::builtin()
            .classify(DriverError::new(code, text))
            .class()
    }

    #[test]
    fn test_connection_codes() {
        assert_eq!(class_of(-10807, ""), Some(ErrorClass::ClientConnection));
        assert_eq!(class_of(-10709, ""), Some(ErrorClass::ClientConnection));
    }

    #[test]
    fn test_single_code_rules() {
        assert_eq!(class_of(613, ""), Some(ErrorClass::StatementTimeout));
        assert_eq!(class_of(131, ""), Some(ErrorClass::LockWaitTimeout));
        assert_eq!(class_of(146, ""), Some(ErrorClass::LockAcquisition));
        assert_eq!(class_of(133, ""), Some(ErrorClass::Deadlock));
        assert_eq!(class_of(397, ""), Some(ErrorClass::InvalidObjectName));
        assert_eq!(class_of(1888, ""), Some(ErrorClass::DatabaseConnectNotPossible));
        assert_eq!(class_of(145, ""), Some(ErrorClass::StatementExecution));
    }

    #[test]
    fn test_transaction_cancelled_needs_text() {
        assert_eq!(
            class_of(
                139,
                "Error: current operation cancelled by request and transaction rolled back"
            ),
            Some(ErrorClass::TransactionCancelled)
        );
        assert_eq!(class_of(139, "cancelled"), None);
    }

    #[test]
    fn test_sequence_locks() {
        assert_eq!(
            class_of(99999, "Lock timeout occurs while waiting sequence cache lock"),
            Some(ErrorClass::SequenceCacheTimeout)
        );
        assert_eq!(
            class_of(131, "Lock timeout occurs while waiting sequence lock"),
            Some(ErrorClass::SequenceLockTimeout)
        );
    }

    #[test]
    fn test_out_of_memory() {
        assert_eq!(class_of(4, "no memory"), Some(ErrorClass::DatabaseOutOfMemory));
        assert_eq!(
            class_of(99999, "OutOfMemory exception"),
            Some(ErrorClass::DatabaseOutOfMemory)
        );
        assert_eq!(
            class_of(99999, "cannot allocate enough memory"),
            Some(ErrorClass::DatabaseOutOfMemory)
        );
        assert_eq!(
            class_of(99999, "Allocation failed"),
            Some(ErrorClass::DatabaseOutOfMemory)
        );
    }

    #[test]
    fn test_code_129_depends_on_text() {
        assert_eq!(
            class_of(129, "max number of SqlExecutor threads are exceeded"),
            Some(ErrorClass::DatabaseOverloaded)
        );
        assert_eq!(
            class_of(129, "An error occurred while opening the channel"),
            Some(ErrorClass::StatementExecution)
        );
        assert_eq!(
            class_of(129, "transaction rolled back by an internal error"),
            Some(ErrorClass::StatementExecution)
        );
    }

    #[test]
    fn test_channel_error_codes() {
        assert_eq!(
            class_of(2048, "An error occurred while opening the channel"),
            Some(ErrorClass::StatementExecution)
        );
        assert_eq!(class_of(123, "An error occurred while opening the channel"), None);
        assert_eq!(
            class_of(7, "An error occurred while reading from the channel"),
            Some(ErrorClass::StatementExecution)
        );
    }

    #[test]
    fn test_connect_not_possible() {
        assert_eq!(
            class_of(663, "Error GBA503: Service is unavailable"),
            Some(ErrorClass::DatabaseConnectNotPossible)
        );
        assert_eq!(
            class_of(10, "HANA Cloud region is in maintenance window"),
            Some(ErrorClass::DatabaseConnectNotPossible)
        );
        assert_eq!(class_of(663, "user not allowed"), None);
    }

    #[test]
    fn test_read_only_replication() {
        assert_eq!(
            class_of(
                7,
                "feature not supported: writable statement not allowed in read-enabled replication: INSERT"
            ),
            Some(ErrorClass::WriteInReadOnlyReplication)
        );
    }

    #[test]
    fn test_unmatched_errors_pass_through() {
        let original = DriverError::new(-10800, "");
        let result = ErrorRuleSet::builtin().classify(original.clone());
        assert_eq!(result, Classification::Unchanged(original));
        assert_eq!(class_of(123, "some error"), None);
    }

    #[test]
    fn test_savepoint_artifact_uses_cause() {
        let error = DriverError::new(128, "TxSavepoint not found")
            .with_cause(DriverError::new(133, "some deadlock"));
        let classified = ErrorRuleSet::builtin()
            .classify(error)
            .into_classified()
            .unwrap();
        assert!(classified.is_deadlock());
        assert_eq!(classified.source_error().code(), 133);
    }

    #[test]
    fn test_savepoint_without_cause_is_unchanged() {
        assert_eq!(class_of(128, "TxSavepoint not found"), None);
    }

    #[test]
    fn test_builtin_round_trips_through_toml() {
        let builtin = ErrorRuleSet::builtin();
        let text = toml::to_string(&builtin).unwrap();
        let parsed = ErrorRuleSet::from_toml_str(&text).unwrap();
        assert_eq!(parsed, builtin);
    }

    #[test]
    fn test_custom_rules_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
version = 1

[[rule]]
class = "deadlock"
[[rule.match]]
codes = [9999]
contains = "custom deadlock"
"#
        )
        .unwrap();

        let rules = ErrorRuleSet::from_file(file.path()).unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(
            rules
                .classify(DriverError::new(9999, "a custom deadlock here"))
                .class(),
            Some(ErrorClass::Deadlock)
        );
        assert_eq!(rules.classify(DriverError::new(133, "")).class(), None);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let err = ErrorRuleSet::from_toml_str("version = 2\nrule = []\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_rejects_catch_all_match() {
        let source = r#"
version = 1

[[rule]]
class = "deadlock"
[[rule.match]]
"#;
        assert!(ErrorRuleSet::from_toml_str(source).unwrap_err().is_config());
    }
}
