//! Schema reflection over the HANA system catalog.
//!
//! Every operation queries `SYS.*` views through an [`Executor`], parses
//! the rows, normalizes names and assembles [`model`] records. Nothing is
//! cached; two calls issue two sets of queries.
//!
//! Table-scoped operations first check that the table (or view) exists and
//! fail with a not-found error otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdbconnect_dialect::reflect::SchemaReflector;
//!
//! let reflector = SchemaReflector::detect(&mut conn, Default::default())?;
//! for column in reflector.get_columns(&mut conn, &"employees".into(), None)? {
//!     println!("{} {}", column.name, column.ty);
//! }
//! ```

pub mod model;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use self::model::{
    CheckConstraint, Column, ForeignKey, Index, PrimaryKey, Sequence, Table, UniqueConstraint,
    View,
};
use crate::ast::ReferentialAction;
use crate::classify::{ErrorRuleSet, ExecutionGuard};
use crate::constants::{
    CHECK_CONSTRAINTS, FOREIGN_KEYS, HAS_INDEX, HAS_SCHEMA, HAS_SEQUENCE, HAS_TABLE, HAS_VIEW,
    INDEX_COLUMNS, IS_TEMPORARY, LIST_SCHEMAS, LIST_SEQUENCES, LIST_TABLES, LIST_TEMP_TABLES,
    LIST_VIEWS, PRIMARY_KEY, SQL_TRUE, SYSTEM_NAME_PREFIX, TABLE_COLUMNS, TABLE_COMMENT,
    TABLE_OID, UNIQUE_CONSTRAINTS, VIEW_DEFINITION,
};
use crate::executor::{Executor, Row};
use crate::ident::{Identifier, IdentifierNormalizer};
use crate::session;
use crate::types::{WireValue, catalog_name_to_type};
use crate::{DialectError, Result};

/// Reflection features that can be switched off.
///
/// A disabled feature is reported explicitly: an unsupported-feature error
/// for whole operations, `None` for individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionCapabilities {
    /// Report ON UPDATE / ON DELETE rules of foreign keys.
    pub foreign_key_rules: bool,
    pub check_constraints: bool,
    pub table_comments: bool,
}

impl Default for ReflectionCapabilities {
    fn default() -> Self {
        Self {
            foreign_key_rules: true,
            check_constraints: true,
            table_comments: true,
        }
    }
}

/// Catalog reader bound to one default schema.
#[derive(Debug, Clone)]
pub struct SchemaReflector {
    normalizer: IdentifierNormalizer,
    default_schema: Identifier,
    capabilities: ReflectionCapabilities,
    rules: ErrorRuleSet,
}

impl SchemaReflector {
    #[must_use]
    pub fn new(default_schema: impl Into<Identifier>, normalizer: IdentifierNormalizer) -> Self {
        Self {
            normalizer,
            default_schema: default_schema.into(),
            capabilities: ReflectionCapabilities::default(),
            rules: ErrorRuleSet::builtin(),
        }
    }

    /// Create a reflector whose default schema is the session user.
    pub fn detect<E>(executor: &mut E, normalizer: IdentifierNormalizer) -> Result<Self>
    where
        E: Executor + ?Sized,
    {
        let rules = ErrorRuleSet::builtin();
        let schema = session::default_schema(executor, &ExecutionGuard::new(&rules), &normalizer)?;
        tracing::debug!(schema = %schema, "detected default schema");
        Ok(Self::new(schema, normalizer))
    }

    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: ReflectionCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_error_rules(mut self, rules: ErrorRuleSet) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub const fn default_schema(&self) -> &Identifier {
        &self.default_schema
    }

    #[must_use]
    pub const fn capabilities(&self) -> ReflectionCapabilities {
        self.capabilities
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Existence checks
    // ═══════════════════════════════════════════════════════════════════════

    /// Tables and views share one namespace.
    pub fn has_table<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let params = [
            self.schema_param(schema),
            self.name_param(table),
            self.schema_param(schema),
            self.name_param(table),
        ];
        self.exists(executor, HAS_TABLE, &params)
    }

    pub fn has_view<E>(
        &self,
        executor: &mut E,
        view: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let params = [self.schema_param(schema), self.name_param(view)];
        self.exists(executor, HAS_VIEW, &params)
    }

    pub fn has_schema<E>(&self, executor: &mut E, schema: &Identifier) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        self.exists(executor, HAS_SCHEMA, &[self.name_param(schema)])
    }

    pub fn has_index<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        index: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let params = [
            self.schema_param(schema),
            self.name_param(table),
            self.name_param(index),
        ];
        self.exists(executor, HAS_INDEX, &params)
    }

    pub fn has_sequence<E>(
        &self,
        executor: &mut E,
        sequence: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let params = [self.schema_param(schema), self.name_param(sequence)];
        self.exists(executor, HAS_SEQUENCE, &params)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Listings
    // ═══════════════════════════════════════════════════════════════════════

    pub fn list_schemas<E>(&self, executor: &mut E) -> Result<Vec<Identifier>>
    where
        E: Executor + ?Sized,
    {
        self.names(executor, LIST_SCHEMAS, &[])
    }

    /// Regular tables: no user-defined-type tables, no temporaries.
    pub fn list_tables<E>(&self, executor: &mut E, schema: Option<&Identifier>) -> Result<Vec<Identifier>>
    where
        E: Executor + ?Sized,
    {
        self.names(executor, LIST_TABLES, &[self.schema_param(schema)])
    }

    pub fn list_temp_tables<E>(
        &self,
        executor: &mut E,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Identifier>>
    where
        E: Executor + ?Sized,
    {
        self.names(executor, LIST_TEMP_TABLES, &[self.schema_param(schema)])
    }

    pub fn list_views<E>(&self, executor: &mut E, schema: Option<&Identifier>) -> Result<Vec<Identifier>>
    where
        E: Executor + ?Sized,
    {
        self.names(executor, LIST_VIEWS, &[self.schema_param(schema)])
    }

    pub fn list_sequences<E>(
        &self,
        executor: &mut E,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Sequence>>
    where
        E: Executor + ?Sized,
    {
        let names = self.names(executor, LIST_SEQUENCES, &[self.schema_param(schema)])?;
        Ok(names.into_iter().map(|name| Sequence { name }).collect())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Views
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_view_definition<E>(
        &self,
        executor: &mut E,
        view: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<String>
    where
        E: Executor + ?Sized,
    {
        let params = [self.name_param(view), self.schema_param(schema)];
        match self.guard().query_scalar(executor, VIEW_DEFINITION, &params)? {
            None | Some(WireValue::Null) => Err(DialectError::not_found(
                "view",
                self.qualified(view, schema),
            )),
            Some(value) => text_cell(value, "DEFINITION"),
        }
    }

    pub fn get_view<E>(
        &self,
        executor: &mut E,
        view: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<View>
    where
        E: Executor + ?Sized,
    {
        let definition = self.get_view_definition(executor, view, schema)?;
        Ok(View {
            name: view.clone(),
            schema: schema.unwrap_or(&self.default_schema).clone(),
            definition,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Table-scoped
    // ═══════════════════════════════════════════════════════════════════════

    /// Columns of a table or view in catalog position order.
    ///
    /// Unrecognized catalog types degrade to [`crate::types::PortableType::Null`]
    /// with a `type_warning` instead of failing the call.
    pub fn get_columns<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Column>>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        self.fetch_columns(executor, table, schema)
    }

    pub fn get_primary_key<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<PrimaryKey>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        self.fetch_primary_key(executor, table, schema)
    }

    /// Named constraints first, then by name.
    pub fn get_unique_constraints<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<UniqueConstraint>>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        self.fetch_unique_constraints(executor, table, schema)
    }

    /// Indexes sorted by name, primary-key indexes excluded.
    pub fn get_indexes<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Index>>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        self.fetch_indexes(executor, table, schema)
    }

    /// Foreign keys sorted by name, one record per constraint.
    pub fn get_foreign_keys<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<ForeignKey>>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        self.fetch_foreign_keys(executor, table, schema)
    }

    pub fn get_check_constraints<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<CheckConstraint>>
    where
        E: Executor + ?Sized,
    {
        if !self.capabilities.check_constraints {
            return Err(DialectError::unsupported_feature(
                "check constraint reflection is disabled",
            ));
        }
        self.ensure_table(executor, table, schema)?;
        self.fetch_check_constraints(executor, table, schema)
    }

    pub fn get_table_oid<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<i64>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        let params = self.table_params(table, schema);
        self.guard()
            .query_scalar(executor, TABLE_OID, &params)?
            .and_then(|v| v.as_i64())
            .ok_or_else(|| DialectError::not_found("table oid", self.qualified(table, schema)))
    }

    pub fn get_table_comment<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Option<String>>
    where
        E: Executor + ?Sized,
    {
        if !self.capabilities.table_comments {
            return Err(DialectError::unsupported_feature(
                "table comment reflection is disabled",
            ));
        }
        self.ensure_table(executor, table, schema)?;
        self.fetch_table_comment(executor, table, schema)
    }

    /// Columns plus every constraint kind in one record.
    ///
    /// Check constraints and the comment are left empty when their
    /// capability is disabled.
    pub fn describe_table<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Table>
    where
        E: Executor + ?Sized,
    {
        self.ensure_table(executor, table, schema)?;
        let check_constraints = if self.capabilities.check_constraints {
            self.fetch_check_constraints(executor, table, schema)?
        } else {
            Vec::new()
        };
        let comment = if self.capabilities.table_comments {
            self.fetch_table_comment(executor, table, schema)?
        } else {
            None
        };
        let described = Table {
            name: table.clone(),
            schema: schema.unwrap_or(&self.default_schema).clone(),
            columns: self.fetch_columns(executor, table, schema)?,
            is_temporary: self.fetch_is_temporary(executor, table, schema)?,
            primary_key: self.fetch_primary_key(executor, table, schema)?,
            unique_constraints: self.fetch_unique_constraints(executor, table, schema)?,
            foreign_keys: self.fetch_foreign_keys(executor, table, schema)?,
            check_constraints,
            indexes: self.fetch_indexes(executor, table, schema)?,
            comment,
        };
        tracing::debug!(
            table = %described.name,
            schema = %described.schema,
            columns = described.columns.len(),
            "described table"
        );
        Ok(described)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Row assembly
    // ═══════════════════════════════════════════════════════════════════════

    fn fetch_columns<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Column>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        let rows = self.guard().query(executor, TABLE_COLUMNS, &params)?;
        let mut columns = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let mut cells = Cells::new(row);
            let name = self.normalizer.normalize(&cells.text("COLUMN_NAME")?);
            let type_name = cells.text("DATA_TYPE_NAME")?;
            let default = cells.opt_text("DEFAULT_VALUE")?;
            let nullable = cells.opt_text("IS_NULLABLE")?.as_deref() == Some(SQL_TRUE);
            let length = cells.opt_int("LENGTH")?;
            let scale = cells.opt_int("SCALE")?;
            let comment = cells.opt_text("COMMENTS")?;

            let lookup = catalog_name_to_type(&type_name, length, scale);
            if let Some(warning) = &lookup.warning {
                tracing::warn!(column = %name, type_name = %type_name, "{warning}");
            }
            columns.push(Column {
                name,
                ty: lookup.ty,
                nullable,
                default,
                comment,
                position: index + 1,
                type_warning: lookup.warning,
            });
        }
        tracing::debug!(table = %table, count = columns.len(), "reflected columns");
        Ok(columns)
    }

    fn fetch_primary_key<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<PrimaryKey>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        let mut key = PrimaryKey::default();
        for row in self.guard().query(executor, PRIMARY_KEY, &params)? {
            let mut cells = Cells::new(row);
            key.name = Some(self.normalizer.normalize(&cells.text("CONSTRAINT_NAME")?));
            key.column_names
                .push(self.normalizer.normalize(&cells.text("COLUMN_NAME")?));
        }
        Ok(key)
    }

    fn fetch_unique_constraints<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<UniqueConstraint>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        let mut constraints: Vec<UniqueConstraint> = Vec::new();
        let mut current: Option<String> = None;
        for row in self.guard().query(executor, UNIQUE_CONSTRAINTS, &params)? {
            let mut cells = Cells::new(row);
            let raw_name = cells.text("CONSTRAINT_NAME")?;
            let column = self.normalizer.normalize(&cells.text("COLUMN_NAME")?);

            if current.as_deref() != Some(raw_name.as_str()) {
                let (name, duplicates_index) = if raw_name.starts_with(SYSTEM_NAME_PREFIX) {
                    (None, Some(Identifier::new(raw_name.as_str())))
                } else {
                    let name = self.normalizer.normalize(&raw_name);
                    (Some(name.clone()), Some(name))
                };
                constraints.push(UniqueConstraint {
                    name,
                    column_names: Vec::new(),
                    duplicates_index,
                });
                current = Some(raw_name);
            }
            if let Some(constraint) = constraints.last_mut() {
                constraint.column_names.push(column);
            }
        }
        constraints.sort_by(|a, b| (a.name.is_none(), &a.name).cmp(&(b.name.is_none(), &b.name)));
        Ok(constraints)
    }

    fn fetch_indexes<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<Index>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        let mut indexes: BTreeMap<Identifier, Index> = BTreeMap::new();
        for row in self.guard().query(executor, INDEX_COLUMNS, &params)? {
            let mut cells = Cells::new(row);
            let raw_name = cells.text("INDEX_NAME")?;
            let column = self.normalizer.normalize(&cells.text("COLUMN_NAME")?);
            let constraint = cells.opt_text("CONSTRAINT")?;
            if constraint.as_deref() == Some("PRIMARY KEY") {
                continue;
            }

            let name = if raw_name.starts_with(SYSTEM_NAME_PREFIX) {
                Identifier::new(raw_name)
            } else {
                self.normalizer.normalize(&raw_name)
            };
            indexes
                .entry(name.clone())
                .or_insert_with(|| Index {
                    name,
                    unique: constraint
                        .as_deref()
                        .is_some_and(|c| c.to_ascii_uppercase().contains("UNIQUE")),
                    column_names: Vec::new(),
                })
                .column_names
                .push(column);
        }
        Ok(indexes.into_values().collect())
    }

    fn fetch_foreign_keys<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<ForeignKey>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        let default_schema = self.normalizer.denormalize(&self.default_schema);
        let mut keys: BTreeMap<Identifier, ForeignKey> = BTreeMap::new();
        for row in self.guard().query(executor, FOREIGN_KEYS, &params)? {
            let mut cells = Cells::new(row);
            let name = self.normalizer.normalize(&cells.text("CONSTRAINT_NAME")?);
            let column = self.normalizer.normalize(&cells.text("COLUMN_NAME")?);
            let referred_schema = cells.text("REFERENCED_SCHEMA_NAME")?;
            let referred_table = self.normalizer.normalize(&cells.text("REFERENCED_TABLE_NAME")?);
            let referred_column = self
                .normalizer
                .normalize(&cells.text("REFERENCED_COLUMN_NAME")?);
            let on_update = cells.opt_text("UPDATE_RULE")?;
            let on_delete = cells.opt_text("DELETE_RULE")?;

            let key = keys.entry(name.clone()).or_insert_with(|| ForeignKey {
                name,
                constrained_columns: Vec::new(),
                referred_schema: (referred_schema != default_schema)
                    .then(|| self.normalizer.normalize(&referred_schema)),
                referred_table,
                referred_columns: Vec::new(),
                on_update: self.referential_rule(on_update.as_deref()),
                on_delete: self.referential_rule(on_delete.as_deref()),
            });
            key.constrained_columns.push(column);
            key.referred_columns.push(referred_column);
        }
        Ok(keys.into_values().collect())
    }

    fn fetch_check_constraints<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Vec<CheckConstraint>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        self.guard()
            .query(executor, CHECK_CONSTRAINTS, &params)?
            .into_iter()
            .map(|row| {
                let mut cells = Cells::new(row);
                Ok(CheckConstraint {
                    name: self.normalizer.normalize(&cells.text("CONSTRAINT_NAME")?),
                    predicate_text: cells.text("CHECK_CONDITION")?,
                })
            })
            .collect()
    }

    fn fetch_table_comment<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<Option<String>>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        match self.guard().query_scalar(executor, TABLE_COMMENT, &params)? {
            None | Some(WireValue::Null) => Ok(None),
            Some(value) => text_cell(value, "COMMENTS").map(Some),
        }
    }

    fn fetch_is_temporary<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        let params = self.table_params(table, schema);
        // views have no SYS.TABLES row
        Ok(self
            .guard()
            .query_scalar(executor, IS_TEMPORARY, &params)?
            .is_some_and(|v| v.as_str() == Some(SQL_TRUE)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════════

    fn guard(&self) -> ExecutionGuard<'_> {
        ExecutionGuard::new(&self.rules)
    }

    fn ensure_table<E>(
        &self,
        executor: &mut E,
        table: &Identifier,
        schema: Option<&Identifier>,
    ) -> Result<()>
    where
        E: Executor + ?Sized,
    {
        if self.has_table(executor, table, schema)? {
            Ok(())
        } else {
            Err(DialectError::not_found("table", self.qualified(table, schema)))
        }
    }

    fn exists<E>(&self, executor: &mut E, sql: &str, params: &[WireValue]) -> Result<bool>
    where
        E: Executor + ?Sized,
    {
        Ok(self.guard().query_first(executor, sql, params)?.is_some())
    }

    fn names<E>(&self, executor: &mut E, sql: &str, params: &[WireValue]) -> Result<Vec<Identifier>>
    where
        E: Executor + ?Sized,
    {
        self.guard()
            .query(executor, sql, params)?
            .into_iter()
            .map(|row| Ok(self.normalizer.normalize(&Cells::new(row).text("NAME")?)))
            .collect()
    }

    fn referential_rule(&self, rule: Option<&str>) -> Option<ReferentialAction> {
        if self.capabilities.foreign_key_rules {
            rule.and_then(ReferentialAction::from_catalog)
        } else {
            None
        }
    }

    fn schema_param(&self, schema: Option<&Identifier>) -> WireValue {
        self.name_param(schema.unwrap_or(&self.default_schema))
    }

    fn name_param(&self, name: &Identifier) -> WireValue {
        WireValue::String(self.normalizer.denormalize(name))
    }

    fn table_params(&self, table: &Identifier, schema: Option<&Identifier>) -> [WireValue; 2] {
        [self.schema_param(schema), self.name_param(table)]
    }

    fn qualified(&self, name: &Identifier, schema: Option<&Identifier>) -> String {
        format!("{}.{name}", schema.unwrap_or(&self.default_schema))
    }
}

/// Positional reader over one catalog row.
struct Cells {
    values: std::vec::IntoIter<WireValue>,
}

impl Cells {
    fn new(row: Row) -> Self {
        Self {
            values: row.into_iter(),
        }
    }

    fn next(&mut self, column: &str) -> Result<WireValue> {
        self.values
            .next()
            .ok_or_else(|| DialectError::catalog(format!("row is missing column {column}")))
    }

    fn text(&mut self, column: &str) -> Result<String> {
        match self.next(column)? {
            WireValue::Null => Err(DialectError::catalog(format!("{column} is NULL"))),
            value => text_cell(value, column),
        }
    }

    fn opt_text(&mut self, column: &str) -> Result<Option<String>> {
        match self.next(column)? {
            WireValue::Null => Ok(None),
            value => text_cell(value, column).map(Some),
        }
    }

    fn opt_int(&mut self, column: &str) -> Result<Option<i64>> {
        match self.next(column)? {
            WireValue::Null => Ok(None),
            value => value.as_i64().map(Some).ok_or_else(|| {
                DialectError::catalog(format!("{column} is not an integer ({})", value.kind()))
            }),
        }
    }
}

/// Catalog text arrives as a string or, for NCLOB columns, as a LOB.
fn text_cell(value: WireValue, column: &str) -> Result<String> {
    match value {
        WireValue::String(s) => Ok(s),
        WireValue::Lob(lob) => lob
            .read_to_string()
            .map_err(|e| DialectError::catalog(format!("reading {column}: {e}"))),
        other => Err(DialectError::catalog(format!(
            "{column} came back as {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DriverError;

    /// Answers every query with the next scripted result.
    struct Script {
        replies: std::collections::VecDeque<Vec<Row>>,
        seen: Vec<(String, Vec<WireValue>)>,
    }

    impl Script {
        fn new(replies: Vec<Vec<Row>>) -> Self {
            Self {
                replies: replies.into(),
                seen: Vec::new(),
            }
        }
    }

    impl Executor for Script {
        fn query(
            &mut self,
            sql: &str,
            params: &[WireValue],
        ) -> std::result::Result<Vec<Row>, DriverError> {
            let copied = params
                .iter()
                .map(|p| p.as_str().map_or(WireValue::Null, WireValue::from))
                .collect();
            self.seen.push((sql.to_string(), copied));
            Ok(self.replies.pop_front().unwrap_or_default())
        }

        fn execute(
            &mut self,
            _sql: &str,
            _params: &[WireValue],
        ) -> std::result::Result<usize, DriverError> {
            Ok(0)
        }
    }

    fn reflector() -> SchemaReflector {
        SchemaReflector::new("app", IdentifierNormalizer::new())
    }

    fn exists() -> Vec<Row> {
        vec![vec![WireValue::Int(1)]]
    }

    #[test]
    fn test_parameters_are_denormalized() {
        let mut exec = Script::new(vec![exists()]);
        assert!(
            reflector()
                .has_table(&mut exec, &"users".into(), None)
                .unwrap()
        );
        let (sql, params) = &exec.seen[0];
        assert_eq!(sql, HAS_TABLE);
        assert_eq!(
            params,
            &vec![
                WireValue::from("APP"),
                WireValue::from("USERS"),
                WireValue::from("APP"),
                WireValue::from("USERS"),
            ]
        );
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let mut exec = Script::new(vec![Vec::new()]);
        let err = reflector()
            .get_primary_key(&mut exec, &"ghost".into(), None)
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(exec.seen.len(), 1);
    }

    #[test]
    fn test_indexes_skip_primary_key_and_sort() {
        let rows = vec![
            vec![
                WireValue::from("_SYS_TREE_RS_1_#0_#P0"),
                WireValue::from("ID"),
                WireValue::from("PRIMARY KEY"),
            ],
            vec![
                WireValue::from("IX_NAME"),
                WireValue::from("LAST"),
                WireValue::Null,
            ],
            vec![
                WireValue::from("IX_EMAIL"),
                WireValue::from("EMAIL"),
                WireValue::from("UNIQUE"),
            ],
            vec![
                WireValue::from("IX_NAME"),
                WireValue::from("FIRST"),
                WireValue::Null,
            ],
        ];
        let mut exec = Script::new(vec![exists(), rows]);
        let indexes = reflector()
            .get_indexes(&mut exec, &"users".into(), None)
            .unwrap();
        assert_eq!(
            indexes,
            vec![
                Index {
                    name: "ix_email".into(),
                    unique: true,
                    column_names: vec!["email".into()],
                },
                Index {
                    name: "ix_name".into(),
                    unique: false,
                    column_names: vec!["last".into(), "first".into()],
                },
            ]
        );
    }

    #[test]
    fn test_foreign_keys_grouped_and_schema_elided() {
        let row = |name: &str, col: &str, schema: &str, table: &str, rcol: &str| {
            vec![
                WireValue::from(name),
                WireValue::from(col),
                WireValue::from(schema),
                WireValue::from(table),
                WireValue::from(rcol),
                WireValue::from("RESTRICT"),
                WireValue::from("CASCADE"),
            ]
        };
        let rows = vec![
            row("FK_B", "REGION", "CRM", "REGIONS", "CODE"),
            row("FK_A", "CUST_ID", "APP", "CUSTOMERS", "ID"),
            row("FK_A", "CUST_SITE", "APP", "CUSTOMERS", "SITE"),
        ];
        let mut exec = Script::new(vec![exists(), rows]);
        let keys = reflector()
            .get_foreign_keys(&mut exec, &"orders".into(), None)
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name, Identifier::new("fk_a"));
        assert_eq!(keys[0].referred_schema, None);
        assert_eq!(
            keys[0].constrained_columns,
            vec![Identifier::new("cust_id"), Identifier::new("cust_site")]
        );
        assert_eq!(
            keys[0].referred_columns,
            vec![Identifier::new("id"), Identifier::new("site")]
        );
        assert_eq!(keys[0].on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(keys[1].referred_schema, Some(Identifier::new("crm")));
    }

    #[test]
    fn test_foreign_key_rules_capability() {
        let rows = vec![vec![
            WireValue::from("FK"),
            WireValue::from("A"),
            WireValue::from("APP"),
            WireValue::from("T"),
            WireValue::from("B"),
            WireValue::from("CASCADE"),
            WireValue::from("CASCADE"),
        ]];
        let mut exec = Script::new(vec![exists(), rows]);
        let reflector = reflector().with_capabilities(ReflectionCapabilities {
            foreign_key_rules: false,
            ..ReflectionCapabilities::default()
        });
        let keys = reflector
            .get_foreign_keys(&mut exec, &"orders".into(), None)
            .unwrap();
        assert_eq!(keys[0].on_update, None);
        assert_eq!(keys[0].on_delete, None);
    }

    #[test]
    fn test_check_constraints_capability() {
        let mut exec = Script::new(Vec::new());
        let reflector = reflector().with_capabilities(ReflectionCapabilities {
            check_constraints: false,
            ..ReflectionCapabilities::default()
        });
        let err = reflector
            .get_check_constraints(&mut exec, &"orders".into(), None)
            .unwrap_err();
        assert!(err.is_unsupported_feature());
        assert!(exec.seen.is_empty());
    }

    #[test]
    fn test_view_definition_not_found() {
        let mut exec = Script::new(vec![Vec::new()]);
        let err = reflector()
            .get_view_definition(&mut exec, &"v".into(), Some(&"sales".into()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "view not found: sales.v");
    }

    #[test]
    fn test_table_oid_checks_table_first() {
        let mut exec = Script::new(vec![exists(), vec![vec![WireValue::Int(170_342)]]]);
        let oid = reflector()
            .get_table_oid(&mut exec, &"users".into(), None)
            .unwrap();
        assert_eq!(oid, 170_342);
        assert_eq!(exec.seen[0].0, HAS_TABLE);
        assert_eq!(exec.seen[1].0, TABLE_OID);
    }

    #[test]
    fn test_list_sequences() {
        let rows = vec![
            vec![WireValue::from("ORDER_SEQ")],
            vec![WireValue::from("MixedSeq")],
        ];
        let mut exec = Script::new(vec![rows]);
        let sequences = reflector().list_sequences(&mut exec, None).unwrap();
        assert_eq!(sequences[0].name, Identifier::new("order_seq"));
        assert_eq!(sequences[1].name, Identifier::new("MixedSeq"));
    }
}
