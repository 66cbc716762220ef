//! Normalized schema records produced by reflection.
//!
//! Records are built fresh on every call and serialize to JSON for hosts
//! and the inspect CLI.

use serde::Serialize;

use crate::ast::{
    ColumnDef, Expr, ForeignKeyDef, ObjectName, ReferentialAction, TableConstraint, TableDef,
};
use crate::ident::Identifier;
use crate::types::PortableType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: Identifier,
    #[serde(rename = "type")]
    pub ty: PortableType,
    pub nullable: bool,
    /// Catalog `DEFAULT_VALUE` text, unparsed.
    pub default: Option<String>,
    pub comment: Option<String>,
    /// 1-based catalog position.
    pub position: usize,
    /// Set when the catalog type name was not recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PrimaryKey {
    pub name: Option<Identifier>,
    pub column_names: Vec<Identifier>,
}

impl PrimaryKey {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.column_names.is_empty()
    }
}

/// Unique constraint.
///
/// Engine-generated constraints (`_SYS...`) have no name but report the
/// generated name as `duplicates_index`: HANA backs every unique constraint
/// with an index of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueConstraint {
    pub name: Option<Identifier>,
    pub column_names: Vec<Identifier>,
    pub duplicates_index: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckConstraint {
    pub name: Identifier,
    pub predicate_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub name: Identifier,
    pub constrained_columns: Vec<Identifier>,
    /// `None` when the referred table lives in the default schema.
    pub referred_schema: Option<Identifier>,
    pub referred_table: Identifier,
    pub referred_columns: Vec<Identifier>,
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: Identifier,
    pub unique: bool,
    pub column_names: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub name: Identifier,
    pub schema: Identifier,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub name: Identifier,
}

/// A table with its columns and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: Identifier,
    pub schema: Identifier,
    pub columns: Vec<Column>,
    pub is_temporary: bool,
    pub primary_key: PrimaryKey,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
    pub check_constraints: Vec<CheckConstraint>,
    pub indexes: Vec<Index>,
    pub comment: Option<String>,
}

impl Table {
    /// Rebuild a definition the compiler can turn back into CREATE TABLE.
    ///
    /// Catalog defaults are carried over as raw SQL when they look like
    /// numbers or niladic functions, as string literals otherwise.
    #[must_use]
    pub fn to_definition(&self) -> TableDef {
        let name = ObjectName::new(self.name.clone()).in_schema(self.schema.clone());
        let mut def = TableDef::new(name);
        for column in &self.columns {
            let mut col = ColumnDef::new(column.name.clone(), column.ty.clone());
            if !column.nullable {
                col = col.not_null();
            }
            if let Some(default) = &column.default {
                col = col.default_value(default_expr(default));
            }
            if let Some(comment) = &column.comment {
                col = col.comment(comment.clone());
            }
            def = def.column(col);
        }

        if !self.primary_key.is_empty() {
            def = def.constraint(TableConstraint::PrimaryKey {
                name: self.primary_key.name.clone(),
                columns: self.primary_key.column_names.clone(),
            });
        }
        for unique in &self.unique_constraints {
            def = def.constraint(TableConstraint::Unique {
                name: unique.name.clone(),
                columns: unique.column_names.clone(),
            });
        }
        for fk in &self.foreign_keys {
            let referred_table = match &fk.referred_schema {
                Some(schema) => {
                    ObjectName::new(fk.referred_table.clone()).in_schema(schema.clone())
                }
                None => ObjectName::new(fk.referred_table.clone()),
            };
            def = def.constraint(TableConstraint::ForeignKey(ForeignKeyDef {
                name: Some(fk.name.clone()),
                columns: fk.constrained_columns.clone(),
                referred_table,
                referred_columns: fk.referred_columns.clone(),
                on_update: fk.on_update,
                on_delete: fk.on_delete,
            }));
        }
        for check in &self.check_constraints {
            def = def.constraint(TableConstraint::Check {
                name: Some(check.name.clone()),
                condition: Expr::raw(check.predicate_text.clone()),
            });
        }
        if let Some(comment) = &self.comment {
            def = def.comment(comment.clone());
        }
        def
    }
}

fn default_expr(text: &str) -> Expr {
    let trimmed = text.trim();
    let numeric = trimmed.parse::<f64>().is_ok();
    let niladic = trimmed.starts_with("CURRENT_") && !trimmed.contains(char::is_whitespace);
    if numeric || niladic || trimmed.eq_ignore_ascii_case("NULL") {
        Expr::raw(trimmed)
    } else {
        Expr::lit(text)
    }
}
