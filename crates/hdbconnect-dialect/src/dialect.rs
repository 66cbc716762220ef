//! The HANA dialect facade.
//!
//! [`HanaDialect`] bundles a [`DialectConfig`] with the compile context
//! and error rules derived from it, and exposes every dialect operation
//! from one value. [`Dialect`] is the object-safe subset a host keeps
//! behind `Box<dyn Dialect>` (see [`crate::registry`]).

use std::fmt;

use crate::ast::{ObjectName, Statement};
use crate::classify::{Classification, DriverError, ErrorRuleSet, ExecutionGuard};
use crate::compiler::{CompileContext, CompiledStatement, compile};
use crate::config::DialectConfig;
use crate::executor::Executor;
use crate::ident::Identifier;
use crate::reflect::SchemaReflector;
use crate::session::{self, IsolationLevel, SessionControl};
use crate::types::{PortableType, TypeProcessors, Value, processors, render_ddl_type, render_literal};
use crate::url::ConnectArgs;
use crate::{DialectError, Result};

/// Dialect operations that need no connection.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    fn compile(&self, statement: &Statement) -> Result<CompiledStatement>;

    /// DDL type name for a portable type.
    fn ddl_type_for(&self, ty: &PortableType) -> Result<String>;

    fn processors(&self, ty: &PortableType) -> TypeProcessors;

    fn classify(&self, error: DriverError) -> Classification;

    fn connect_args(&self, url: &str) -> Result<ConnectArgs>;
}

/// SAP HANA.
#[derive(Debug, Clone)]
pub struct HanaDialect {
    config: DialectConfig,
    context: CompileContext,
    rules: ErrorRuleSet,
}

impl Default for HanaDialect {
    fn default() -> Self {
        Self::with_parts(DialectConfig::default(), ErrorRuleSet::builtin())
    }
}

impl HanaDialect {
    pub const NAME: &'static str = "hana";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration, loading the configured error rules.
    pub fn from_config(config: DialectConfig) -> Result<Self> {
        let rules = config.load_error_rules()?;
        Ok(Self::with_parts(config, rules))
    }

    fn with_parts(config: DialectConfig, rules: ErrorRuleSet) -> Self {
        let context = config.compile_context();
        Self {
            config,
            context,
            rules,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DialectConfig {
        &self.config
    }

    #[must_use]
    pub const fn context(&self) -> &CompileContext {
        &self.context
    }

    #[must_use]
    pub const fn error_rules(&self) -> &ErrorRuleSet {
        &self.rules
    }

    #[must_use]
    pub const fn guard(&self) -> ExecutionGuard<'_> {
        ExecutionGuard::new(&self.rules)
    }

    /// Render a literal the way `literal_binds` mode would.
    pub fn render_literal(&self, ty: &PortableType, value: &Value) -> Result<String> {
        render_literal(ty, value, self.context.options.type_options())
    }

    /// Driver error to crate error, with integrity upgrades.
    #[must_use]
    pub fn translate(&self, error: DriverError) -> DialectError {
        self.guard().translate(error)
    }

    pub fn is_disconnect(
        &self,
        error: &DriverError,
        connection: Option<&mut dyn SessionControl>,
    ) -> bool {
        session::is_disconnect(&self.rules, error, connection)
    }

    /// Reflector over an already known default schema.
    #[must_use]
    pub fn reflector(&self, default_schema: impl Into<Identifier>) -> SchemaReflector {
        SchemaReflector::new(default_schema, self.context.normalizer.clone())
            .with_capabilities(self.config.reflection_capabilities())
            .with_error_rules(self.rules.clone())
    }

    /// Reflector whose default schema is the session user.
    pub fn detect_reflector<E>(&self, executor: &mut E) -> Result<SchemaReflector>
    where
        E: Executor + ?Sized,
    {
        let schema = self.default_schema(executor)?;
        Ok(self.reflector(schema))
    }

    pub fn default_schema<E>(&self, executor: &mut E) -> Result<Identifier>
    where
        E: Executor + ?Sized,
    {
        session::default_schema(executor, &self.guard(), &self.context.normalizer)
    }

    /// Prepare a fresh connection: autocommit off, then the configured
    /// isolation level if any.
    pub fn on_connect<C>(&self, conn: &mut C) -> Result<()>
    where
        C: Executor + SessionControl + ?Sized,
    {
        conn.set_autocommit(false)
            .map_err(|e| self.translate(e))?;
        if let Some(level) = self.config.isolation_level {
            session::set_isolation_level(conn, &self.guard(), level)?;
        }
        Ok(())
    }

    pub fn set_isolation_level<C>(&self, conn: &mut C, level: IsolationLevel) -> Result<()>
    where
        C: Executor + SessionControl + ?Sized,
    {
        session::set_isolation_level(conn, &self.guard(), level)
    }

    pub fn get_isolation_level<E>(&self, executor: &mut E) -> Result<IsolationLevel>
    where
        E: Executor + ?Sized,
    {
        session::get_isolation_level(executor, &self.guard())
    }

    pub fn fire_sequence<E>(&self, executor: &mut E, sequence: &ObjectName) -> Result<i64>
    where
        E: Executor + ?Sized,
    {
        session::fire_sequence(executor, &self.guard(), &self.context, sequence)
    }
}

impl Dialect for HanaDialect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compile(&self, statement: &Statement) -> Result<CompiledStatement> {
        compile(statement, &self.context)
    }

    fn ddl_type_for(&self, ty: &PortableType) -> Result<String> {
        render_ddl_type(ty, self.context.options.type_options())
    }

    fn processors(&self, ty: &PortableType) -> TypeProcessors {
        processors(ty, self.context.options.type_options())
    }

    fn classify(&self, error: DriverError) -> Classification {
        self.rules.classify(error)
    }

    fn connect_args(&self, url: &str) -> Result<ConnectArgs> {
        ConnectArgs::parse(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Select};
    use crate::executor::Row;
    use crate::types::WireValue;

    #[derive(Default)]
    struct Conn {
        log: Vec<String>,
    }

    impl Executor for Conn {
        fn query(
            &mut self,
            sql: &str,
            _params: &[WireValue],
        ) -> std::result::Result<Vec<Row>, DriverError> {
            self.log.push(sql.to_string());
            Ok(vec![vec![WireValue::from("ADMIN")]])
        }

        fn execute(
            &mut self,
            sql: &str,
            _params: &[WireValue],
        ) -> std::result::Result<usize, DriverError> {
            self.log.push(sql.to_string());
            Ok(0)
        }
    }

    impl SessionControl for Conn {
        fn set_autocommit(&mut self, enabled: bool) -> std::result::Result<(), DriverError> {
            self.log.push(format!("autocommit={enabled}"));
            Ok(())
        }

        fn is_connected(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn test_compile_uses_config() {
        let config = DialectConfig::builder()
            .supports_native_boolean(false)
            .build()
            .unwrap();
        let dialect = HanaDialect::from_config(config).unwrap();
        assert_eq!(dialect.ddl_type_for(&PortableType::Boolean).unwrap(), "TINYINT");

        let sql = dialect
            .compile(&Statement::Select(Select::new([Expr::lit(true)])))
            .unwrap()
            .sql;
        assert_eq!(sql, "SELECT 1 FROM DUMMY");
    }

    #[test]
    fn test_on_connect_applies_isolation_level() {
        let config = DialectConfig::builder()
            .isolation_level(IsolationLevel::Serializable)
            .build()
            .unwrap();
        let dialect = HanaDialect::from_config(config).unwrap();
        let mut conn = Conn::default();
        dialect.on_connect(&mut conn).unwrap();
        assert_eq!(
            conn.log,
            [
                "autocommit=false",
                "autocommit=false",
                "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE"
            ]
        );
    }

    #[test]
    fn test_detect_reflector() {
        let dialect = HanaDialect::new();
        let mut conn = Conn::default();
        let reflector = dialect.detect_reflector(&mut conn).unwrap();
        assert_eq!(reflector.default_schema(), &Identifier::new("admin"));
    }

    #[test]
    fn test_dialect_is_object_safe() {
        let boxed: Box<dyn Dialect> = Box::new(HanaDialect::new());
        assert_eq!(boxed.name(), "hana");
        assert!(boxed.classify(DriverError::new(613, "timeout")).class().is_some());
        assert!(boxed.connect_args("hana://userkey=k").unwrap().is_user_key());
    }
}
