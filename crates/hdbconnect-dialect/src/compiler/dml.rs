//! INSERT / UPDATE / DELETE / UPSERT rendering.

use super::SqlWriter;
use crate::ast::{Delete, Insert, InsertSource, Update, Upsert, UpsertMode};
use crate::ident::Identifier;
use crate::{DialectError, Result};

impl SqlWriter<'_> {
    pub(super) fn insert(&mut self, insert: &Insert) -> Result<String> {
        let table = self.object(&insert.table)?;
        let body = self.insert_body(&insert.columns, &insert.source, "INSERT")?;
        Ok(format!("INSERT INTO {table}{body}"))
    }

    pub(super) fn update(&mut self, update: &Update) -> Result<String> {
        if update.assignments.is_empty() {
            return Err(DialectError::invalid_argument(
                "UPDATE needs at least one assignment",
            ));
        }
        let table = self.object(&update.table)?;
        let assignments = update
            .assignments
            .iter()
            .map(|(column, value)| Ok(format!("{}={}", self.ident(column)?, self.expr(value)?)))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        if let Some(filter) = &update.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(filter)?);
        }
        Ok(sql)
    }

    pub(super) fn delete(&mut self, delete: &Delete) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", self.object(&delete.table)?);
        if let Some(filter) = &delete.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(filter)?);
        }
        Ok(sql)
    }

    /// `UPSERT t (cols) VALUES (...) {WHERE cond | WITH PRIMARY KEY}` or
    /// `UPSERT t (cols) <subquery>`.
    pub(super) fn upsert(&mut self, upsert: &Upsert) -> Result<String> {
        let table = self.object(&upsert.table)?;
        let body = self.insert_body(&upsert.columns, &upsert.source, "UPSERT")?;
        let mut sql = format!("UPSERT {table}{body}");
        match (&upsert.source, &upsert.mode) {
            (InsertSource::Values(_), UpsertMode::Where(filter)) => {
                sql.push_str(" WHERE ");
                sql.push_str(&self.predicate(filter)?);
            }
            (InsertSource::Values(_), UpsertMode::PrimaryKey) => {
                sql.push_str(" WITH PRIMARY KEY");
            }
            // a subquery upsert always matches on the primary key
            (InsertSource::Query(_), UpsertMode::PrimaryKey) => {}
            (InsertSource::Query(_), UpsertMode::Where(_)) => {
                return Err(DialectError::unsupported_feature(
                    "UPSERT from a subquery with a WHERE condition",
                ));
            }
        }
        Ok(sql)
    }

    fn insert_body(
        &mut self,
        columns: &[Identifier],
        source: &InsertSource,
        verb: &str,
    ) -> Result<String> {
        let column_list = if columns.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.ident_list(columns)?)
        };

        match source {
            InsertSource::Values(values) => {
                if values.is_empty() {
                    return Err(DialectError::unsupported_feature(format!(
                        "{verb} without values (no DEFAULT VALUES form)"
                    )));
                }
                if !columns.is_empty() && columns.len() != values.len() {
                    return Err(DialectError::invalid_argument(format!(
                        "{verb} lists {} columns but {} values",
                        columns.len(),
                        values.len()
                    )));
                }
                let rendered = values
                    .iter()
                    .map(|v| self.expr(v))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{column_list} VALUES ({})", rendered.join(", ")))
            }
            InsertSource::Query(query) => Ok(format!("{column_list} {}", self.select(query)?)),
        }
    }
}
