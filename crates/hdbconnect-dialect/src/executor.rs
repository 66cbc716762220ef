//! The "execute SQL, get rows" primitive the dialect runs on.
//!
//! The dialect never opens connections. Reflection and session helpers take
//! any [`Executor`]; the `hdbconnect` feature ships an implementation for
//! `hdbconnect::Connection`.

use crate::classify::DriverError;
use crate::types::WireValue;

/// One result row in column order.
pub type Row = Vec<WireValue>;

/// Synchronous statement execution against HANA.
pub trait Executor {
    /// Run a query with positional `?` parameters and fetch all rows.
    fn query(&mut self, sql: &str, params: &[WireValue]) -> Result<Vec<Row>, DriverError>;

    /// Run a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, sql: &str, params: &[WireValue]) -> Result<usize, DriverError>;

    /// First row of a query, if any.
    fn query_first(
        &mut self,
        sql: &str,
        params: &[WireValue],
    ) -> Result<Option<Row>, DriverError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// First column of the first row, if any.
    fn query_scalar(
        &mut self,
        sql: &str,
        params: &[WireValue],
    ) -> Result<Option<WireValue>, DriverError> {
        Ok(self
            .query_first(sql, params)?
            .and_then(|row| row.into_iter().next()))
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn query(&mut self, sql: &str, params: &[WireValue]) -> Result<Vec<Row>, DriverError> {
        (**self).query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[WireValue]) -> Result<usize, DriverError> {
        (**self).execute(sql, params)
    }
}
