//! Connection and session policy: isolation levels, default schema,
//! disconnect detection and sequence firing.

use std::fmt;
use std::str::FromStr;

use crate::ast::{Expr, ObjectName, Select, Statement};
use crate::classify::{CONNECTION_CLOSED, DriverError, ErrorRuleSet, ExecutionGuard};
use crate::compiler::{CompileContext, compile};
use crate::constants::{CURRENT_ISOLATION_QUERY, CURRENT_USER_QUERY};
use crate::executor::Executor;
use crate::ident::{Identifier, IdentifierNormalizer};
use crate::types::WireValue;
use crate::{DialectError, Result};

/// Transaction isolation levels accepted by HANA, plus the AUTOCOMMIT
/// pseudo-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    Serializable,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    /// Not a SQL level: switches the connection to autocommit.
    Autocommit,
}

impl IsolationLevel {
    /// The SQL-settable levels, in the order reported in error messages.
    pub const SQL_LEVELS: [Self; 4] = [
        Self::Serializable,
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::RepeatableRead,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serializable => "SERIALIZABLE",
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Autocommit => "AUTOCOMMIT",
        }
    }

    #[must_use]
    pub const fn is_autocommit(self) -> bool {
        matches!(self, Self::Autocommit)
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case(Self::Autocommit.as_str()) {
            return Ok(Self::Autocommit);
        }
        Self::SQL_LEVELS
            .into_iter()
            .find(|level| wanted.eq_ignore_ascii_case(level.as_str()))
            .ok_or_else(|| {
                let valid = Self::SQL_LEVELS.map(Self::as_str).join(", ");
                DialectError::invalid_argument(format!(
                    "Invalid value '{s}' for isolation_level. \
                     Valid isolation levels for hana are {valid}"
                ))
            })
    }
}

/// Connection-level switches beyond plain statement execution.
pub trait SessionControl {
    fn set_autocommit(&mut self, enabled: bool) -> std::result::Result<(), DriverError>;

    /// Whether the connection is still usable. May probe the server.
    fn is_connected(&mut self) -> bool;
}

/// Apply `level`: AUTOCOMMIT enables autocommit, any other level disables
/// it and runs `SET TRANSACTION ISOLATION LEVEL <level>`.
pub fn set_isolation_level<C>(
    conn: &mut C,
    guard: &ExecutionGuard<'_>,
    level: IsolationLevel,
) -> Result<()>
where
    C: Executor + SessionControl + ?Sized,
{
    if level.is_autocommit() {
        conn.set_autocommit(true).map_err(|e| guard.translate(e))?;
        tracing::debug!("autocommit enabled");
        return Ok(());
    }
    conn.set_autocommit(false).map_err(|e| guard.translate(e))?;
    guard.execute(conn, &format!("SET TRANSACTION ISOLATION LEVEL {level}"), &[])?;
    tracing::debug!(level = %level, "isolation level set");
    Ok(())
}

/// Current isolation level of the session.
pub fn get_isolation_level<E>(
    executor: &mut E,
    guard: &ExecutionGuard<'_>,
) -> Result<IsolationLevel>
where
    E: Executor + ?Sized,
{
    match guard.query_scalar(executor, CURRENT_ISOLATION_QUERY, &[])? {
        Some(WireValue::String(level)) => level.parse(),
        Some(other) => Err(DialectError::catalog(format!(
            "isolation level came back as {}",
            other.kind()
        ))),
        None => Err(DialectError::catalog("isolation level query returned no row")),
    }
}

/// The session user, which HANA uses as the default schema.
pub fn default_schema<E>(
    executor: &mut E,
    guard: &ExecutionGuard<'_>,
    normalizer: &IdentifierNormalizer,
) -> Result<Identifier>
where
    E: Executor + ?Sized,
{
    match guard.query_scalar(executor, CURRENT_USER_QUERY, &[])? {
        Some(WireValue::String(user)) => Ok(normalizer.normalize(&user)),
        _ => Err(DialectError::catalog("CURRENT_USER query returned no name")),
    }
}

/// Whether `error` (or the connection itself) indicates a lost connection.
///
/// When a connection is supplied its own liveness check decides.
pub fn is_disconnect(
    rules: &ErrorRuleSet,
    error: &DriverError,
    connection: Option<&mut dyn SessionControl>,
) -> bool {
    if let Some(conn) = connection {
        return !conn.is_connected();
    }
    if error.code() == CONNECTION_CLOSED {
        return true;
    }
    rules
        .classify(error.clone())
        .into_classified()
        .is_some_and(|c| c.is_connect_not_possible())
}

/// Fetch the next value of `sequence` via `SELECT s.NEXTVAL FROM DUMMY`.
pub fn fire_sequence<E>(
    executor: &mut E,
    guard: &ExecutionGuard<'_>,
    ctx: &CompileContext,
    sequence: &ObjectName,
) -> Result<i64>
where
    E: Executor + ?Sized,
{
    let statement = Statement::Select(Select::new([Expr::next_value(sequence.clone())]));
    let compiled = compile(&statement, ctx)?;
    let value = guard.query_scalar(executor, &compiled.sql, &[])?;
    value.and_then(|v| v.as_i64()).ok_or_else(|| {
        DialectError::catalog(format!(
            "sequence '{}' did not return an integer",
            sequence.name
        ))
    })
}
