//! SELECT rendering: FROM DUMMY, LIMIT/OFFSET and lock clauses.

use super::{BindMode, BoundParam, SqlWriter};
use crate::ast::{FromItem, JoinKind, LockClause, LockMode, NullsOrder, OrderBy, RowBound, Select};
use crate::constants::{DUMMY_TABLE, MAX_ROW_COUNT};
use crate::types::{PortableType, Value};
use crate::{DialectError, Result};

impl SqlWriter<'_> {
    pub(super) fn select(&mut self, select: &Select) -> Result<String> {
        if select.columns.is_empty() {
            return Err(DialectError::invalid_argument(
                "SELECT needs at least one column",
            ));
        }

        // the column-list inlining applies to this query's own columns only
        let base = if self.bind_mode == BindMode::Inline {
            BindMode::Inline
        } else {
            BindMode::Param
        };
        let column_mode = base.max(BindMode::InlineNonNull);

        let mut sql = String::from("SELECT ");
        if select.distinct {
            sql.push_str("DISTINCT ");
        }

        let columns = self.with_bind_mode(column_mode, |w| {
            select
                .columns
                .iter()
                .map(|item| {
                    let rendered = w.expr(&item.expr)?;
                    match &item.alias {
                        Some(alias) => Ok(format!("{rendered} AS {}", w.ident(alias)?)),
                        None => Ok(rendered),
                    }
                })
                .collect::<Result<Vec<_>>>()
        })?;
        sql.push_str(&columns.join(", "));

        self.with_bind_mode(base, |w| w.select_tail(select, &mut sql))?;
        Ok(sql)
    }

    fn select_tail(&mut self, select: &Select, sql: &mut String) -> Result<()> {
        sql.push_str(" FROM ");
        if select.from.is_empty() {
            sql.push_str(DUMMY_TABLE);
        } else {
            let items = select
                .from
                .iter()
                .map(|item| self.from_item(item))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(&items.join(", "));
        }

        if let Some(filter) = &select.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicate(filter)?);
        }

        if !select.group_by.is_empty() {
            let groups = select
                .group_by
                .iter()
                .map(|e| self.expr(e))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }

        if let Some(having) = &select.having {
            sql.push_str(" HAVING ");
            sql.push_str(&self.predicate(having)?);
        }

        if !select.order_by.is_empty() {
            let orders = select
                .order_by
                .iter()
                .map(|o| self.order_by(o))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        self.limit_clause(select.limit.as_ref(), select.offset.as_ref(), sql)?;

        if let Some(lock) = &select.lock {
            sql.push_str(&self.lock_clause(lock)?);
        }
        Ok(())
    }

    fn from_item(&mut self, item: &FromItem) -> Result<String> {
        match item {
            FromItem::Table { name, alias } => {
                let table = self.object(name)?;
                match alias {
                    Some(alias) => Ok(format!("{table} {}", self.ident(alias)?)),
                    None => Ok(table),
                }
            }
            FromItem::Subquery { query, alias } => {
                let inner = self.select(query)?;
                Ok(format!("({inner}) {}", self.ident(alias)?))
            }
            FromItem::Join {
                left,
                right,
                kind,
                on,
            } => {
                let left = self.from_item(left)?;
                let right = self.from_item(right)?;
                let keyword = match kind {
                    JoinKind::Inner => "JOIN",
                    JoinKind::Left => "LEFT OUTER JOIN",
                    JoinKind::Right => "RIGHT OUTER JOIN",
                    JoinKind::Full => "FULL OUTER JOIN",
                    JoinKind::Cross => "CROSS JOIN",
                };
                match (kind, on) {
                    (JoinKind::Cross, None) => Ok(format!("{left} {keyword} {right}")),
                    (JoinKind::Cross, Some(_)) => Err(DialectError::invalid_argument(
                        "CROSS JOIN takes no ON condition",
                    )),
                    (_, Some(on)) => {
                        let condition = self.predicate(on)?;
                        Ok(format!("{left} {keyword} {right} ON {condition}"))
                    }
                    (_, None) => Err(DialectError::invalid_argument(format!(
                        "{keyword} requires an ON condition"
                    ))),
                }
            }
        }
    }

    fn order_by(&mut self, order: &OrderBy) -> Result<String> {
        let mut rendered = self.expr(&order.expr)?;
        if order.descending {
            rendered.push_str(" DESC");
        }
        match order.nulls {
            Some(NullsOrder::First) => rendered.push_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => rendered.push_str(" NULLS LAST"),
            None => {}
        }
        Ok(rendered)
    }

    /// `LIMIT n [OFFSET m]`; OFFSET alone needs the engine's maximum row
    /// count as LIMIT.
    fn limit_clause(
        &mut self,
        limit: Option<&RowBound>,
        offset: Option<&RowBound>,
        sql: &mut String,
    ) -> Result<()> {
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&self.row_bound(limit)?);
        }
        if let Some(offset) = offset {
            if limit.is_none() {
                sql.push_str(&format!(" LIMIT {MAX_ROW_COUNT}"));
            }
            sql.push_str(" OFFSET ");
            sql.push_str(&self.row_bound(offset)?);
        }
        Ok(())
    }

    fn row_bound(&mut self, bound: &RowBound) -> Result<String> {
        let count = match bound {
            RowBound::Count(n) => *n,
            RowBound::Expr(_) => {
                return Err(DialectError::unsupported_feature(
                    "expression-valued LIMIT / OFFSET",
                ));
            }
        };
        if self.ctx.options.literal_binds || self.bind_mode == BindMode::Inline {
            return Ok(count.to_string());
        }
        let value = i64::try_from(count).map_err(|_| {
            DialectError::invalid_argument(format!("row count {count} is out of range"))
        })?;
        self.params.push(BoundParam {
            value: Value::Int(value),
            ty: Some(PortableType::BigInt),
        });
        Ok("?".to_string())
    }

    fn lock_clause(&mut self, lock: &LockClause) -> Result<String> {
        match lock.mode {
            LockMode::Read => {
                if !lock.of.is_empty() || lock.nowait {
                    return Err(DialectError::unsupported_feature(
                        "OF / NOWAIT with a read lock (FOR SHARE LOCK)",
                    ));
                }
                let mut clause = String::from(" FOR SHARE LOCK");
                if lock.skip_locked {
                    clause.push_str(" IGNORE LOCKED");
                }
                Ok(clause)
            }
            LockMode::Update => {
                let mut clause = String::from(" FOR UPDATE");
                if !lock.of.is_empty() {
                    let columns = lock
                        .of
                        .iter()
                        .map(|e| self.expr(e))
                        .collect::<Result<Vec<_>>>()?;
                    clause.push_str(" OF ");
                    clause.push_str(&columns.join(", "));
                }
                if lock.nowait {
                    clause.push_str(" NOWAIT");
                }
                if lock.skip_locked {
                    clause.push_str(" IGNORE LOCKED");
                }
                Ok(clause)
            }
        }
    }
}
