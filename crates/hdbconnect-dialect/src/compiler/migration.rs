//! Single-change migration DDL and comments.
//!
//! | Operation | SQL |
//! |-----------|-----|
//! | add column | `ALTER TABLE t ADD (spec)` |
//! | drop column | `ALTER TABLE t DROP (col)` |
//! | rename column | `RENAME COLUMN t.old TO new` |
//! | retype / nullability / default | `ALTER TABLE t ALTER (col TYPE [DEFAULT x] [NULL\|NOT NULL])` |
//! | rename table | `RENAME TABLE old TO new` |
//! | drop primary key | `ALTER TABLE t DROP PRIMARY KEY` |

use super::ddl::check_not_self_referential;
use super::{BindMode, SqlWriter};
use crate::ast::{AlterColumn, AlterOp, CommentTarget, DefaultChange, ObjectName, TableConstraint};
use crate::types::{quote_string, render_ddl_type};
use crate::Result;

impl SqlWriter<'_> {
    pub(super) fn alter_table(&mut self, table: &ObjectName, op: &AlterOp) -> Result<String> {
        let name = self.object(table)?;
        match op {
            AlterOp::AddColumn(column) => {
                let spec = self.column_spec(column)?;
                Ok(format!("ALTER TABLE {name} ADD ({spec})"))
            }
            AlterOp::DropColumn(column) => {
                Ok(format!("ALTER TABLE {name} DROP ({})", self.ident(column)?))
            }
            AlterOp::RenameColumn { from, to } => Ok(format!(
                "RENAME COLUMN {name}.{} TO {}",
                self.ident(from)?,
                self.ident(to)?
            )),
            AlterOp::AlterColumn(alter) => {
                let spec = self.alter_column_spec(alter)?;
                Ok(format!("ALTER TABLE {name} ALTER ({spec})"))
            }
            AlterOp::RenameTable { to } => {
                Ok(format!("RENAME TABLE {name} TO {}", self.ident(to)?))
            }
            AlterOp::DropPrimaryKey => Ok(format!("ALTER TABLE {name} DROP PRIMARY KEY")),
            AlterOp::AddConstraint(constraint) => {
                if let TableConstraint::ForeignKey(fk) = constraint {
                    check_not_self_referential(table, fk)?;
                }
                let rendered = self.constraint(constraint)?;
                if rendered.is_empty() {
                    return Ok(String::new());
                }
                Ok(format!("ALTER TABLE {name} ADD {rendered}"))
            }
            AlterOp::DropConstraint(constraint) => Ok(format!(
                "ALTER TABLE {name} DROP CONSTRAINT {}",
                self.ident(constraint)?
            )),
        }
    }

    /// DEFAULT precedes the null constraint, matching the CREATE column
    /// grammar.
    fn alter_column_spec(&mut self, alter: &AlterColumn) -> Result<String> {
        let mut spec = format!(
            "{} {}",
            self.ident(&alter.name)?,
            render_ddl_type(&alter.ty, self.type_options())?
        );
        match &alter.default {
            Some(DefaultChange::Set(expr)) => {
                let rendered = self.with_bind_mode(BindMode::Inline, |w| w.expr(expr))?;
                spec.push_str(&format!(" DEFAULT {rendered}"));
            }
            Some(DefaultChange::Drop) => spec.push_str(" DEFAULT NULL"),
            None => {}
        }
        match alter.nullable {
            Some(true) => spec.push_str(" NULL"),
            Some(false) => spec.push_str(" NOT NULL"),
            None => {}
        }
        Ok(spec)
    }

    pub(super) fn comment(&mut self, target: &CommentTarget, text: Option<&str>) -> Result<String> {
        let subject = match target {
            CommentTarget::Table(table) => format!("TABLE {}", self.object(table)?),
            CommentTarget::Column { table, column } => {
                format!("COLUMN {}.{}", self.object(table)?, self.ident(column)?)
            }
        };
        let text = text.map_or_else(|| "NULL".to_string(), quote_string);
        Ok(format!("COMMENT ON {subject} IS {text}"))
    }
}
