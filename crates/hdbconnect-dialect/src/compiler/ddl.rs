//! CREATE statements, column specifications and table constraints.

use super::{BindMode, SqlWriter};
use crate::ast::{
    ColumnDef, CreateTable, ForeignKeyDef, IndexDef, ObjectName, Select, SequenceDef,
    TableConstraint,
};
use crate::ident::Identifier;
use crate::types::{quote_string, render_ddl_type};
use crate::{DialectError, Result};

impl SqlWriter<'_> {
    /// `CREATE [<table type>] TABLE name (...)`
    ///
    /// The table type comes from the request, never from the definition, so
    /// concurrent compilations of one definition cannot see each other's
    /// prefix.
    pub(super) fn create_table(&mut self, create: &CreateTable) -> Result<String> {
        let table = &create.table;
        if table.columns.is_empty() {
            return Err(DialectError::invalid_argument(format!(
                "table '{}' has no columns",
                table.name.name
            )));
        }

        self.with_bind_mode(BindMode::Inline, |w| {
            let mut elements = table
                .columns
                .iter()
                .map(|c| w.column_spec(c))
                .collect::<Result<Vec<_>>>()?;
            for constraint in &table.constraints {
                if let TableConstraint::ForeignKey(fk) = constraint {
                    check_not_self_referential(&table.name, fk)?;
                }
                let rendered = w.constraint(constraint)?;
                if !rendered.is_empty() {
                    elements.push(rendered);
                }
            }

            let prefix = create
                .table_type
                .as_ref()
                .map(|t| format!("{} ", t.as_sql()))
                .unwrap_or_default();
            let mut sql = format!(
                "CREATE {prefix}TABLE {} ({})",
                w.object(&table.name)?,
                elements.join(", ")
            );
            if let Some(comment) = &table.comment {
                sql.push_str(&format!(" COMMENT {}", quote_string(comment)));
            }
            Ok(sql)
        })
    }

    pub(super) fn create_view(&mut self, name: &ObjectName, query: &Select) -> Result<String> {
        let name = self.object(name)?;
        let body = self.with_bind_mode(BindMode::Inline, |w| w.select(query))?;
        Ok(format!("CREATE VIEW {name} AS {body}"))
    }

    pub(super) fn create_sequence(&mut self, seq: &SequenceDef) -> Result<String> {
        let mut sql = format!("CREATE SEQUENCE {}", self.object(&seq.name)?);
        if let Some(n) = seq.increment {
            sql.push_str(&format!(" INCREMENT BY {n}"));
        }
        if let Some(n) = seq.start {
            sql.push_str(&format!(" START WITH {n}"));
        }
        if let Some(n) = seq.min_value {
            sql.push_str(&format!(" MINVALUE {n}"));
        }
        if let Some(n) = seq.max_value {
            sql.push_str(&format!(" MAXVALUE {n}"));
        }
        if seq.cycle {
            sql.push_str(" CYCLE");
        }
        if let Some(n) = seq.cache {
            sql.push_str(&format!(" CACHE {n}"));
        }
        Ok(sql)
    }

    /// Index names live in the table's schema.
    pub(super) fn create_index(&mut self, index: &IndexDef) -> Result<String> {
        if index.columns.is_empty() {
            return Err(DialectError::invalid_argument(format!(
                "index '{}' has no columns",
                index.name
            )));
        }
        let name = ObjectName {
            schema: index.table.schema.clone(),
            name: index.name.clone(),
        };
        let columns = index
            .columns
            .iter()
            .map(|c| {
                let column = self.ident(&c.name)?;
                Ok(if c.descending {
                    format!("{column} DESC")
                } else {
                    column
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.object(&name)?,
            self.object(&index.table)?,
            columns.join(", ")
        ))
    }

    /// `name TYPE [DEFAULT x] [GENERATED ... AS IDENTITY] [NOT NULL] [COMMENT '...']`
    pub(super) fn column_spec(&mut self, column: &ColumnDef) -> Result<String> {
        let mut spec = format!(
            "{} {}",
            self.ident(&column.name)?,
            render_ddl_type(&column.ty, self.type_options())?
        );
        if let Some(default) = &column.default {
            let rendered = self.with_bind_mode(BindMode::Inline, |w| w.expr(default))?;
            spec.push_str(&format!(" DEFAULT {rendered}"));
        }
        if let Some(identity) = &column.identity {
            spec.push_str(if identity.always {
                " GENERATED ALWAYS AS IDENTITY"
            } else {
                " GENERATED BY DEFAULT AS IDENTITY"
            });
            let mut options = Vec::new();
            if let Some(start) = identity.start {
                options.push(format!("START WITH {start}"));
            }
            if let Some(increment) = identity.increment {
                options.push(format!("INCREMENT BY {increment}"));
            }
            if !options.is_empty() {
                spec.push_str(&format!(" ({})", options.join(" ")));
            }
        }
        if !column.nullable {
            spec.push_str(" NOT NULL");
        }
        if let Some(comment) = &column.comment {
            spec.push_str(&format!(" COMMENT {}", quote_string(comment)));
        }
        Ok(spec)
    }

    /// Render a table constraint. A key without columns renders as the
    /// empty string.
    pub(super) fn constraint(&mut self, constraint: &TableConstraint) -> Result<String> {
        let (name, body) = match constraint {
            TableConstraint::PrimaryKey { name, columns } => {
                if columns.is_empty() {
                    return Ok(String::new());
                }
                (name, format!("PRIMARY KEY ({})", self.ident_list(columns)?))
            }
            TableConstraint::Unique { name, columns } => {
                if columns.is_empty() {
                    return Ok(String::new());
                }
                (name, format!("UNIQUE ({})", self.ident_list(columns)?))
            }
            TableConstraint::ForeignKey(fk) => (&fk.name, self.foreign_key(fk)?),
            TableConstraint::Check { name, condition } => {
                if !self.ctx.options.supports_check_constraints {
                    return Err(DialectError::unsupported_feature(
                        "CHECK constraints in compatibility mode",
                    ));
                }
                let rendered =
                    self.with_bind_mode(BindMode::Inline, |w| w.predicate(condition))?;
                (name, format!("CHECK ({rendered})"))
            }
        };
        Ok(match name {
            Some(name) => format!("CONSTRAINT {} {body}", self.ident(name)?),
            None => body,
        })
    }

    fn foreign_key(&mut self, fk: &ForeignKeyDef) -> Result<String> {
        if fk.columns.is_empty() || fk.columns.len() != fk.referred_columns.len() {
            return Err(DialectError::invalid_argument(format!(
                "foreign key to '{}' needs matching, non-empty column lists",
                fk.referred_table.name
            )));
        }
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.ident_list(&fk.columns)?,
            self.object(&fk.referred_table)?,
            self.ident_list(&fk.referred_columns)?
        );
        if let Some(action) = fk.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = fk.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        Ok(sql)
    }
}

/// Tables referencing themselves cannot be created in one statement.
pub(super) fn check_not_self_referential(table: &ObjectName, fk: &ForeignKeyDef) -> Result<()> {
    let same_schema = match (&fk.referred_table.schema, &table.schema) {
        (Some(a), Some(b)) => same_name(a, b),
        (None, None) => true,
        _ => false,
    };
    if same_schema && same_name(&fk.referred_table.name, &table.name) {
        return Err(DialectError::unsupported_feature(format!(
            "self-referential foreign key on '{}'",
            table.name
        )));
    }
    Ok(())
}

fn same_name(a: &Identifier, b: &Identifier) -> bool {
    if a.is_quoted() || b.is_quoted() {
        a.as_str() == b.as_str()
    } else {
        a.as_str().eq_ignore_ascii_case(b.as_str())
    }
}
