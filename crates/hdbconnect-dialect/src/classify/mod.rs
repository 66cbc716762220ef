//! Driver error classification.
//!
//! A [`DriverError`] carries the numeric HANA code, the message text and an
//! optional inner cause. [`ErrorRuleSet::classify`] matches it against an
//! ordered rule table and either wraps it in a [`ClassifiedError`] or hands
//! it back unchanged.

mod guard;
mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::guard::ExecutionGuard;
pub use self::rules::{ErrorRule, ErrorRuleSet, Matcher, RULE_SET_VERSION};

/// Error code for a unique constraint violation.
pub const UNIQUE_CONSTRAINT_VIOLATED: i32 = 301;

/// Client-side code reported when the connection was closed underneath us.
pub const CONNECTION_CLOSED: i32 = -10709;

/// Native error as reported by the driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}] {text}")]
pub struct DriverError {
    code: i32,
    text: String,
    #[source]
    cause: Option<Box<Self>>,
}

impl DriverError {
    #[must_use]
    pub fn new(code: i32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            cause: None,
        }
    }

    /// Attach the error that was raised before this one.
    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    /// Masked rollback artifact: the client tried to roll back to a
    /// savepoint the server had already discarded.
    fn is_savepoint_artifact(&self) -> bool {
        self.code == 128 && self.text.contains("TxSavepoint not found") && self.cause.is_some()
    }
}

/// How a host should react to a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryPolicy {
    /// Connection unusable; discard and reconnect.
    ConnectivityFatal,
    /// Contention or load; retry with backoff.
    Transient,
    /// Needs caller intervention.
    Programming,
}

/// Portable error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    ClientConnection,
    StatementTimeout,
    TransactionCancelled,
    SequenceCacheTimeout,
    SequenceLockTimeout,
    LockWaitTimeout,
    LockAcquisition,
    Deadlock,
    DatabaseOutOfMemory,
    DatabaseOverloaded,
    DatabaseConnectNotPossible,
    StatementExecution,
    InvalidObjectName,
    WriteInReadOnlyReplication,
}

impl ErrorClass {
    #[must_use]
    pub const fn policy(self) -> RetryPolicy {
        match self {
            Self::ClientConnection | Self::DatabaseConnectNotPossible => {
                RetryPolicy::ConnectivityFatal
            }
            Self::LockWaitTimeout
            | Self::LockAcquisition
            | Self::Deadlock
            | Self::SequenceCacheTimeout
            | Self::SequenceLockTimeout
            | Self::DatabaseOverloaded
            | Self::StatementTimeout
            | Self::TransactionCancelled => RetryPolicy::Transient,
            Self::InvalidObjectName
            | Self::WriteInReadOnlyReplication
            | Self::StatementExecution
            | Self::DatabaseOutOfMemory => RetryPolicy::Programming,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientConnection => "client connection error",
            Self::StatementTimeout => "statement timeout",
            Self::TransactionCancelled => "transaction cancelled",
            Self::SequenceCacheTimeout => "sequence cache timeout",
            Self::SequenceLockTimeout => "sequence lock timeout",
            Self::LockWaitTimeout => "lock wait timeout",
            Self::LockAcquisition => "lock acquisition failed",
            Self::Deadlock => "deadlock",
            Self::DatabaseOutOfMemory => "database out of memory",
            Self::DatabaseOverloaded => "database overloaded",
            Self::DatabaseConnectNotPossible => "database connect not possible",
            Self::StatementExecution => "statement execution error",
            Self::InvalidObjectName => "invalid object name",
            Self::WriteInReadOnlyReplication => "write in read-only replication",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver error mapped to the portable taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{class}: {error}")]
pub struct ClassifiedError {
    class: ErrorClass,
    #[source]
    error: DriverError,
}

impl ClassifiedError {
    #[must_use]
    pub const fn new(class: ErrorClass, error: DriverError) -> Self {
        Self { class, error }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.class
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.class.policy()
    }

    /// The native error this classification wraps.
    #[must_use]
    pub const fn source_error(&self) -> &DriverError {
        &self.error
    }

    #[must_use]
    pub fn into_source(self) -> DriverError {
        self.error
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.policy(), RetryPolicy::Transient)
    }

    /// Client connection errors are a special case of connect-not-possible.
    #[must_use]
    pub const fn is_connect_not_possible(&self) -> bool {
        matches!(
            self.class,
            ErrorClass::DatabaseConnectNotPossible | ErrorClass::ClientConnection
        )
    }

    #[must_use]
    pub const fn is_client_connection(&self) -> bool {
        matches!(self.class, ErrorClass::ClientConnection)
    }

    /// Sequence lock timeouts are a special case of lock wait timeouts.
    #[must_use]
    pub const fn is_lock_wait_timeout(&self) -> bool {
        matches!(
            self.class,
            ErrorClass::LockWaitTimeout | ErrorClass::SequenceLockTimeout
        )
    }

    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self.class, ErrorClass::Deadlock)
    }

    #[must_use]
    pub const fn is_statement_timeout(&self) -> bool {
        matches!(self.class, ErrorClass::StatementTimeout)
    }

    #[must_use]
    pub const fn is_out_of_memory(&self) -> bool {
        matches!(self.class, ErrorClass::DatabaseOutOfMemory)
    }
}

/// Outcome of [`ErrorRuleSet::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Classified(ClassifiedError),
    Unchanged(DriverError),
}

impl Classification {
    #[must_use]
    pub fn into_classified(self) -> Option<ClassifiedError> {
        match self {
            Self::Classified(err) => Some(err),
            Self::Unchanged(_) => None,
        }
    }

    #[must_use]
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::Classified(err) => Some(err.class()),
            Self::Unchanged(_) => None,
        }
    }
}

impl From<Classification> for crate::DialectError {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Classified(err) => err.into(),
            Classification::Unchanged(err) => Self::driver(err),
        }
    }
}
