//! [`Executor`] and [`SessionControl`] over a synchronous `hdbconnect`
//! connection.

use std::fmt;
use std::io::Cursor;

use hdbconnect::{Connection, HdbError, HdbValue, TypeId};
use serde::Serialize;

use crate::classify::DriverError;
use crate::executor::{Executor, Row};
use crate::session::SessionControl;
use crate::types::{LobStream, WireValue};
use crate::url::ConnectArgs;
use crate::{DialectError, Result};

/// Liveness probe.
const VALIDATION_QUERY: &str = "SELECT 1 FROM DUMMY";

/// A `hdbconnect` connection usable by the reflector and session helpers.
pub struct HdbExecutor {
    conn: Connection,
    materialize_lobs: bool,
}

impl fmt::Debug for HdbExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdbExecutor")
            .field("materialize_lobs", &self.materialize_lobs)
            .finish_non_exhaustive()
    }
}

impl HdbExecutor {
    #[must_use]
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn,
            materialize_lobs: true,
        }
    }

    /// Open a connection for `args`.
    pub fn connect(args: &ConnectArgs) -> Result<Self> {
        let url = args.to_hdbsql_url()?;
        let conn = Connection::new(url).map_err(|e| DialectError::driver(DriverError::from(&e)))?;
        tracing::debug!("connected through hdbconnect");
        Ok(Self::new(conn))
    }

    /// Hand LOB columns out as streams instead of strings.
    #[must_use]
    pub const fn with_materialize_lobs(mut self, materialize: bool) -> Self {
        self.materialize_lobs = materialize;
        self
    }

    pub const fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    #[must_use]
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Executor for HdbExecutor {
    fn query(
        &mut self,
        sql: &str,
        params: &[WireValue],
    ) -> std::result::Result<Vec<Row>, DriverError> {
        let result_set = if params.is_empty() {
            self.conn.query(sql).map_err(|e| DriverError::from(&e))?
        } else {
            let params = to_params(params)?;
            let mut stmt = self.conn.prepare(sql).map_err(|e| DriverError::from(&e))?;
            stmt.execute(&params)
                .and_then(hdbconnect::HdbResponse::into_result_set)
                .map_err(|e| DriverError::from(&e))?
        };

        let lob_columns: Vec<bool> = result_set
            .metadata()
            .iter()
            .map(|field| is_lob(field.type_id()))
            .collect();

        let mut rows = Vec::new();
        for row in result_set {
            let row = row.map_err(|e| DriverError::from(&e))?;
            let mut values = Vec::with_capacity(lob_columns.len());
            for (index, value) in row.into_iter().enumerate() {
                let wire = from_hdb_value(value)?;
                let stream = !self.materialize_lobs && lob_columns.get(index).copied().unwrap_or(false);
                values.push(if stream { into_lob(wire) } else { wire });
            }
            rows.push(values);
        }
        tracing::trace!(rows = rows.len(), "query finished");
        Ok(rows)
    }

    fn execute(
        &mut self,
        sql: &str,
        params: &[WireValue],
    ) -> std::result::Result<usize, DriverError> {
        let response = if params.is_empty() {
            self.conn.statement(sql).map_err(|e| DriverError::from(&e))?
        } else {
            let params = to_params(params)?;
            let mut stmt = self.conn.prepare(sql).map_err(|e| DriverError::from(&e))?;
            stmt.execute(&params).map_err(|e| DriverError::from(&e))?
        };
        // DDL reports success without a row count
        Ok(response
            .into_affected_rows()
            .map(|counts| counts.iter().sum())
            .unwrap_or(0))
    }
}

impl SessionControl for HdbExecutor {
    fn set_autocommit(&mut self, enabled: bool) -> std::result::Result<(), DriverError> {
        self.conn
            .set_auto_commit(enabled)
            .map_err(|e| DriverError::from(&e))
    }

    fn is_connected(&mut self) -> bool {
        self.conn.query(VALIDATION_QUERY).is_ok()
    }
}

/// Server errors keep their code and text. Client-side failures go through
/// [`client_error`].
impl From<&HdbError> for DriverError {
    fn from(err: &HdbError) -> Self {
        if let Some(server) = err.server_error() {
            return Self::new(server.code(), server.text());
        }
        client_error(err.to_string())
    }
}

/// Driver error for a failure the server never reported.
///
/// The code is recovered from the message when it carries one. Otherwise it
/// is 0: only text-matching rules can still classify the error, and anything
/// they miss passes through classification unchanged.
fn client_error(msg: String) -> DriverError {
    DriverError::new(extract_hana_error_code(&msg).unwrap_or(0), msg)
}

/// Extract HANA error code from error message.
fn extract_hana_error_code(msg: &str) -> Option<i32> {
    // Try to find pattern like "[123]" or "Error 123:"
    if let Some(start) = msg.find('[')
        && let Some(end) = msg[start..].find(']')
        && let Ok(code) = msg[start + 1..start + end].parse::<i32>()
    {
        return Some(code);
    }

    if let Some(pos) = msg.find("Error ") {
        let rest = &msg[pos + 6..];
        if let Some(colon) = rest.find(':')
            && let Ok(code) = rest[..colon].trim().parse::<i32>()
        {
            return Some(code);
        }
    }

    None
}

const fn is_lob(type_id: TypeId) -> bool {
    matches!(
        type_id,
        TypeId::CLOB | TypeId::NCLOB | TypeId::BLOB | TypeId::TEXT
    )
}

fn into_lob(value: WireValue) -> WireValue {
    match value {
        WireValue::String(s) => WireValue::Lob(LobStream::new(Cursor::new(s.into_bytes()))),
        WireValue::Binary(b) => WireValue::Lob(LobStream::new(Cursor::new(b))),
        other => other,
    }
}

/// Convert a HANA value to a wire value.
fn from_hdb_value(value: HdbValue<'static>) -> std::result::Result<WireValue, DriverError> {
    Ok(match value {
        HdbValue::NULL => WireValue::Null,
        HdbValue::BOOLEAN(b) => WireValue::Bool(b),
        HdbValue::TINYINT(v) => WireValue::Int(i64::from(v)),
        HdbValue::SMALLINT(v) => WireValue::Int(i64::from(v)),
        HdbValue::INT(v) => WireValue::Int(i64::from(v)),
        HdbValue::BIGINT(v) => WireValue::Int(v),
        HdbValue::REAL(v) => WireValue::Float(f64::from(v)),
        HdbValue::DOUBLE(v) => WireValue::Float(v),
        HdbValue::DECIMAL(d) => WireValue::Decimal(d),
        HdbValue::STRING(s) => WireValue::String(s),
        HdbValue::BINARY(b) => WireValue::Binary(b),
        // Date/Time: textual form, parsed by the result processors
        HdbValue::DAYDATE(v) => WireValue::String(v.to_string()),
        HdbValue::LONGDATE(v) => WireValue::String(v.to_string()),
        HdbValue::SECONDDATE(v) => WireValue::String(v.to_string()),
        HdbValue::SECONDTIME(v) => WireValue::String(v.to_string()),
        // character LOBs and the remaining exotic types
        other => other
            .try_into::<String>()
            .map(WireValue::String)
            .map_err(|e| DriverError::new(0, format!("cannot convert HANA value: {e}")))?,
    })
}

/// Parameter representation `hdbconnect` can serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum SerializableValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

fn to_params(params: &[WireValue]) -> std::result::Result<Vec<SerializableValue>, DriverError> {
    params.iter().map(to_param).collect()
}

fn to_param(value: &WireValue) -> std::result::Result<SerializableValue, DriverError> {
    Ok(match value {
        WireValue::Null => SerializableValue::Null,
        WireValue::Bool(b) => SerializableValue::Bool(*b),
        WireValue::Int(i) => SerializableValue::Int(*i),
        WireValue::Float(f) => SerializableValue::Float(*f),
        WireValue::Decimal(d) => SerializableValue::String(d.to_string()),
        WireValue::String(s) => SerializableValue::String(s.clone()),
        WireValue::Binary(b) => SerializableValue::Bytes(b.clone()),
        WireValue::Lob(_) => {
            return Err(DriverError::new(
                0,
                "LOB streams cannot be bound as parameters; materialize them first",
            ));
        }
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::classify::{Classification, ErrorRuleSet};

    #[test]
    fn test_extract_hana_error_code() {
        assert_eq!(extract_hana_error_code("[301] unique constraint violated"), Some(301));
        assert_eq!(extract_hana_error_code("Error 259: invalid table name"), Some(259));
        assert_eq!(extract_hana_error_code("[abc] nothing"), None);
        assert_eq!(extract_hana_error_code("connection reset"), None);
    }

    #[test]
    fn test_client_error_code_fallback() {
        let rules = ErrorRuleSet::builtin();

        let reset = client_error("connection reset by peer".to_string());
        assert_eq!(reset.code(), 0);
        assert!(matches!(rules.classify(reset), Classification::Unchanged(_)));

        let oom = client_error("OutOfMemory exception while fetching".to_string());
        assert_eq!(oom.code(), 0);
        assert!(rules.classify(oom).class().is_some());

        let refused = client_error("[-10709] Connection failed".to_string());
        assert_eq!(refused.code(), -10709);
        assert!(
            rules
                .classify(refused)
                .into_classified()
                .is_some_and(|c| c.is_client_connection())
        );
    }

    #[test]
    fn test_from_hdb_value() {
        assert_eq!(from_hdb_value(HdbValue::NULL).unwrap(), WireValue::Null);
        assert_eq!(from_hdb_value(HdbValue::TINYINT(7)).unwrap(), WireValue::Int(7));
        assert_eq!(from_hdb_value(HdbValue::REAL(1.5)).unwrap(), WireValue::Float(1.5));
        assert_eq!(
            from_hdb_value(HdbValue::STRING("SYSTEM".into())).unwrap(),
            WireValue::from("SYSTEM")
        );
        let decimal = BigDecimal::from_str("12.50").unwrap();
        assert_eq!(
            from_hdb_value(HdbValue::DECIMAL(decimal.clone())).unwrap(),
            WireValue::Decimal(decimal)
        );
    }

    #[test]
    fn test_lob_columns_become_streams() {
        match into_lob(WireValue::from("long text")) {
            WireValue::Lob(lob) => assert_eq!(lob.read_to_string().unwrap(), "long text"),
            other => panic!("expected a stream, got {other:?}"),
        }
        assert_eq!(into_lob(WireValue::Null), WireValue::Null);
    }

    #[test]
    fn test_params() {
        let params = to_params(&[
            WireValue::Null,
            WireValue::Int(3),
            WireValue::Decimal(BigDecimal::from(10)),
            WireValue::Binary(vec![1, 2]),
        ])
        .unwrap();
        assert_eq!(
            params,
            vec![
                SerializableValue::Null,
                SerializableValue::Int(3),
                SerializableValue::String("10".into()),
                SerializableValue::Bytes(vec![1, 2]),
            ]
        );

        let lob = WireValue::Lob(LobStream::new(Cursor::new(b"x".to_vec())));
        assert!(to_param(&lob).is_err());
    }
}
