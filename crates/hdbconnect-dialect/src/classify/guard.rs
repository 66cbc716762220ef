//! Error translation at the executor call boundary.

use super::{DriverError, ErrorRuleSet, UNIQUE_CONSTRAINT_VIOLATED};
use crate::executor::{Executor, Row};
use crate::types::WireValue;
use crate::{DialectError, Result};

/// Runs executor calls and turns driver errors into [`DialectError`]s.
///
/// Unique constraint violations (code 301) become integrity errors; every
/// other error goes through the rule set.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionGuard<'a> {
    rules: &'a ErrorRuleSet,
}

impl<'a> ExecutionGuard<'a> {
    #[must_use]
    pub const fn new(rules: &'a ErrorRuleSet) -> Self {
        Self { rules }
    }

    /// Translate one driver error.
    #[must_use]
    pub fn translate(&self, error: DriverError) -> DialectError {
        if error.code() == UNIQUE_CONSTRAINT_VIOLATED {
            return DialectError::integrity(error);
        }
        self.rules.classify(error).into()
    }

    pub fn query<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &[WireValue],
    ) -> Result<Vec<Row>> {
        executor.query(sql, params).map_err(|e| self.translate(e))
    }

    pub fn query_first<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &[WireValue],
    ) -> Result<Option<Row>> {
        executor.query_first(sql, params).map_err(|e| self.translate(e))
    }

    pub fn query_scalar<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &[WireValue],
    ) -> Result<Option<WireValue>> {
        executor
            .query_scalar(sql, params)
            .map_err(|e| self.translate(e))
    }

    pub fn execute<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        sql: &str,
        params: &[WireValue],
    ) -> Result<usize> {
        executor.execute(sql, params).map_err(|e| self.translate(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(DriverError);

    impl Executor for Failing {
        fn query(
            &mut self,
            _sql: &str,
            _params: &[WireValue],
        ) -> std::result::Result<Vec<Row>, DriverError> {
            Err(self.0.clone())
        }

        fn execute(
            &mut self,
            _sql: &str,
            _params: &[WireValue],
        ) -> std::result::Result<usize, DriverError> {
            Err(self.0.clone())
        }
    }

    #[test]
    fn test_unique_violation_becomes_integrity() {
        let rules = ErrorRuleSet::builtin();
        let guard = ExecutionGuard::new(&rules);
        let mut exec = Failing(DriverError::new(301, "unique constraint violated"));
        let err = guard
            .execute(&mut exec, "INSERT INTO t VALUES (?)", &[WireValue::Int(1)])
            .unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(err.driver_error().map(DriverError::code), Some(301));
    }

    #[test]
    fn test_known_code_is_classified() {
        let rules = ErrorRuleSet::builtin();
        let guard = ExecutionGuard::new(&rules);
        let mut exec = Failing(DriverError::new(131, "transaction rolled back by lock wait timeout"));
        let err = guard.query(&mut exec, "SELECT 1 FROM DUMMY", &[]).unwrap_err();
        let classified = err.as_classified().unwrap();
        assert!(classified.is_lock_wait_timeout());
        assert!(classified.is_retryable());
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let rules = ErrorRuleSet::builtin();
        let guard = ExecutionGuard::new(&rules);
        let err = guard.translate(DriverError::new(259, "invalid table name"));
        assert!(err.is_driver());
    }
}
