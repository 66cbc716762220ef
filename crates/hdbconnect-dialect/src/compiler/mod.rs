//! Statement compiler: [`Statement`] trees to HANA SQL text.
//!
//! Compilation is all-or-nothing. Any construct HANA cannot express fails
//! the whole statement with an unsupported-feature error; partially
//! rendered text is never returned.
//!
//! Parameters use the `?` placeholder style. [`CompiledStatement::params`]
//! holds one entry per placeholder in text order, so an expression that is
//! rendered twice (see `IS DISTINCT FROM`) contributes its binds twice.

mod ddl;
mod dml;
mod expr;
mod migration;
mod select;

use serde::{Deserialize, Serialize};

use crate::ast::{ObjectName, Statement};
use crate::constants::MAX_IDENTIFIER_LENGTH;
use crate::ident::{Identifier, IdentifierNormalizer};
use crate::types::{PortableType, TypeOptions, Value, WireValue, bind_value};
use crate::{DialectError, Result};

/// Switches that change the rendered SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Render every bind value inline instead of as `?`.
    pub literal_binds: bool,
    /// BOOLEAN columns and `TRUE`/`FALSE` literals; `false` selects the
    /// TINYINT / `1`/`0` compatibility rendering.
    pub native_boolean: bool,
    /// Compatibility mode without CHECK constraints when `false`.
    pub supports_check_constraints: bool,
    pub max_identifier_length: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            literal_binds: false,
            native_boolean: true,
            supports_check_constraints: true,
            max_identifier_length: MAX_IDENTIFIER_LENGTH,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub const fn type_options(&self) -> TypeOptions {
        TypeOptions {
            native_boolean: self.native_boolean,
        }
    }
}

/// Everything the compiler reads: options plus identifier rules.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub options: CompileOptions,
    pub normalizer: IdentifierNormalizer,
}

impl CompileContext {
    #[must_use]
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            normalizer: IdentifierNormalizer::new(),
        }
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: IdentifierNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// One positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: Value,
    pub ty: Option<PortableType>,
}

impl BoundParam {
    /// Run the bind processor of the parameter's type.
    pub fn to_wire(&self, options: TypeOptions) -> Result<WireValue> {
        match &self.ty {
            Some(ty) => bind_value(ty, self.value.clone(), options),
            None => bind_value(&PortableType::Null, self.value.clone(), options),
        }
    }
}

/// SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

impl CompiledStatement {
    /// `true` for constructs that compile to nothing (e.g. a unique
    /// constraint without columns). Hosts should skip execution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Parameters converted for the driver.
    pub fn wire_params(&self, options: TypeOptions) -> Result<Vec<WireValue>> {
        self.params.iter().map(|p| p.to_wire(options)).collect()
    }
}

/// Compile one statement.
pub fn compile(statement: &Statement, ctx: &CompileContext) -> Result<CompiledStatement> {
    let mut writer = SqlWriter::new(ctx);
    let sql = writer.statement(statement)?;
    tracing::trace!(
        statement = statement.kind(),
        params = writer.params.len(),
        sql = %sql,
        "compiled statement"
    );
    Ok(CompiledStatement {
        sql,
        params: writer.params,
    })
}

/// How bind expressions are rendered at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BindMode {
    Param,
    /// SELECT column list: HANA would type a `?` there as NVARCHAR(5000).
    InlineNonNull,
    /// DDL bodies cannot carry parameters.
    Inline,
}

pub(crate) struct SqlWriter<'a> {
    ctx: &'a CompileContext,
    params: Vec<BoundParam>,
    bind_mode: BindMode,
}

impl<'a> SqlWriter<'a> {
    const fn new(ctx: &'a CompileContext) -> Self {
        Self {
            ctx,
            params: Vec::new(),
            bind_mode: BindMode::Param,
        }
    }

    fn statement(&mut self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Select(select) => self.select(select),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
            Statement::Upsert(upsert) => self.upsert(upsert),
            Statement::CreateTable(create) => self.create_table(create),
            Statement::DropTable(name) => Ok(format!("DROP TABLE {}", self.object(name)?)),
            Statement::CreateView { name, query } => self.create_view(name, query),
            Statement::DropView(name) => Ok(format!("DROP VIEW {}", self.object(name)?)),
            Statement::CreateSequence(seq) => self.create_sequence(seq),
            Statement::DropSequence(name) => Ok(format!("DROP SEQUENCE {}", self.object(name)?)),
            Statement::CreateIndex(index) => self.create_index(index),
            Statement::DropIndex(name) => Ok(format!("DROP INDEX {}", self.object(name)?)),
            Statement::AlterTable { table, op } => self.alter_table(table, op),
            Statement::Comment { target, text } => self.comment(target, text.as_deref()),
            Statement::SetAutocommitDdl(on) => Ok(format!(
                "SET TRANSACTION AUTOCOMMIT DDL {}",
                if *on { "ON" } else { "OFF" }
            )),
            Statement::EmptySet { columns } => empty_set(*columns),
        }
    }

    const fn type_options(&self) -> TypeOptions {
        self.ctx.options.type_options()
    }

    /// Run `f` with binds rendered in at least `mode`.
    fn with_bind_mode<T>(
        &mut self,
        mode: BindMode,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = self.bind_mode;
        self.bind_mode = mode;
        let result = f(self);
        self.bind_mode = saved;
        result
    }

    fn ident(&self, ident: &Identifier) -> Result<String> {
        let max = self.ctx.options.max_identifier_length;
        if ident.as_str().chars().count() > max {
            return Err(DialectError::invalid_argument(format!(
                "identifier '{ident}' exceeds the maximum length of {max} characters"
            )));
        }
        Ok(self.ctx.normalizer.quote(ident))
    }

    fn ident_list(&self, idents: &[Identifier]) -> Result<String> {
        let rendered = idents
            .iter()
            .map(|i| self.ident(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    fn object(&self, name: &ObjectName) -> Result<String> {
        match &name.schema {
            Some(schema) => Ok(format!("{}.{}", self.ident(schema)?, self.ident(&name.name)?)),
            None => self.ident(&name.name),
        }
    }
}

/// `SELECT 1, 1 FROM DUMMY WHERE 1 != 1` with one `1` per column.
pub(crate) fn empty_set(columns: usize) -> Result<String> {
    if columns == 0 {
        return Err(DialectError::invalid_argument(
            "an empty set needs at least one column",
        ));
    }
    let ones = vec!["1"; columns].join(", ");
    Ok(format!("SELECT {ones} FROM DUMMY WHERE 1 != 1"))
}
