//! Catalog reflection against a scripted executor.

mod common;

use common::Cell::{Int, Lob, Null, Text};
use common::ScriptedExecutor;
use hdbconnect_dialect::ast::{CreateTable, Statement};
use hdbconnect_dialect::constants::{
    FOREIGN_KEYS, HAS_TABLE, INDEX_COLUMNS, IS_TEMPORARY, LIST_TABLES, PRIMARY_KEY, TABLE_COLUMNS,
    TABLE_COMMENT, UNIQUE_CONSTRAINTS, VIEW_DEFINITION,
};
use hdbconnect_dialect::reflect::UniqueConstraint;
use hdbconnect_dialect::{
    Dialect, DialectConfig, DriverError, ErrorClass, HanaDialect, Identifier, PortableType,
    ReflectionCapabilities, SchemaReflector,
};
use pretty_assertions::assert_eq;

fn reflector() -> SchemaReflector {
    HanaDialect::new().reflector("app")
}

fn employees() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .with_table()
        .reply(
            TABLE_COLUMNS,
            vec![
                vec![Text("ID"), Text("BIGINT"), Null, Text("FALSE"), Null, Null, Null],
                vec![Text("NAME"), Text("NVARCHAR"), Null, Text("TRUE"), Int(255), Null, Null],
            ],
        )
        .reply(PRIMARY_KEY, vec![vec![Text("PK_EMPLOYEES"), Text("ID")]])
        .reply(
            UNIQUE_CONSTRAINTS,
            vec![
                vec![Text("_SYS_CONSTRAINT_7_#0_#UK1"), Text("NAME")],
                vec![Text("UQ_EMAIL"), Text("EMAIL")],
            ],
        )
        .reply(IS_TEMPORARY, vec![vec![Text("FALSE")]])
        .reply(TABLE_COMMENT, vec![vec![Text("staff")]])
}

#[test]
fn test_columns_map_catalog_types() {
    let mut exec = employees();
    let columns = reflector()
        .get_columns(&mut exec, &"employees".into(), None)
        .unwrap();

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].name, Identifier::new("id"));
    assert_eq!(columns[0].ty, PortableType::BigInt);
    assert!(!columns[0].nullable);
    assert_eq!(columns[0].position, 1);
    assert_eq!(columns[1].name, Identifier::new("name"));
    assert_eq!(columns[1].ty, PortableType::nvarchar(255).unwrap());
    assert!(columns[1].nullable);

    assert_eq!(
        exec.params_of(TABLE_COLUMNS).unwrap(),
        [Some("APP".to_string()), Some("EMPLOYEES".to_string())]
    );
}

#[test]
fn test_unknown_catalog_type_degrades_with_warning() {
    let mut exec = ScriptedExecutor::new().with_table().reply(
        TABLE_COLUMNS,
        vec![vec![Text("SHAPE"), Text("ST_GEOMETRY"), Null, Text("TRUE"), Null, Null, Null]],
    );
    let columns = reflector()
        .get_columns(&mut exec, &"places".into(), None)
        .unwrap();
    assert_eq!(columns[0].ty, PortableType::Null);
    assert!(columns[0].type_warning.as_deref().unwrap().contains("ST_GEOMETRY"));
}

#[test]
fn test_unique_constraints_put_named_first() {
    let mut exec = employees();
    let uniques = reflector()
        .get_unique_constraints(&mut exec, &"employees".into(), None)
        .unwrap();
    assert_eq!(
        uniques,
        vec![
            UniqueConstraint {
                name: Some("uq_email".into()),
                column_names: vec!["email".into()],
                duplicates_index: Some("uq_email".into()),
            },
            UniqueConstraint {
                name: None,
                column_names: vec!["name".into()],
                duplicates_index: Some(Identifier::new("_SYS_CONSTRAINT_7_#0_#UK1")),
            },
        ]
    );
}

#[test]
fn test_describe_table_feeds_the_compiler() {
    let dialect = HanaDialect::new();
    let mut exec = employees();
    let table = dialect
        .reflector("app")
        .describe_table(&mut exec, &"employees".into(), None)
        .unwrap();

    assert_eq!(table.schema, Identifier::new("app"));
    assert!(!table.is_temporary);
    assert_eq!(table.primary_key.name, Some("pk_employees".into()));
    assert_eq!(table.comment.as_deref(), Some("staff"));
    assert!(table.foreign_keys.is_empty());
    assert!(table.indexes.is_empty());
    assert_eq!(exec.count(HAS_TABLE), 1);

    let compiled = dialect
        .compile(&Statement::CreateTable(CreateTable {
            table: table.to_definition(),
            table_type: None,
        }))
        .unwrap();
    assert_eq!(
        compiled.sql,
        "CREATE TABLE app.employees (id BIGINT NOT NULL, name NVARCHAR(255), \
         CONSTRAINT pk_employees PRIMARY KEY (id), \
         CONSTRAINT uq_email UNIQUE (email), \
         UNIQUE (name)) COMMENT 'staff'"
    );
}

#[test]
fn test_describe_table_skips_disabled_capabilities() {
    let config = DialectConfig::builder()
        .supports_check_constraints(false)
        .build()
        .unwrap();
    let dialect = HanaDialect::from_config(config).unwrap();
    let reflector = dialect.reflector("app").with_capabilities(ReflectionCapabilities {
        table_comments: false,
        ..dialect.config().reflection_capabilities()
    });
    let mut exec = employees();

    let table = reflector
        .describe_table(&mut exec, &"employees".into(), None)
        .unwrap();
    assert!(table.check_constraints.is_empty());
    assert_eq!(table.comment, None);
    assert_eq!(exec.count(TABLE_COMMENT), 0);

    let err = reflector
        .get_check_constraints(&mut exec, &"employees".into(), None)
        .unwrap_err();
    assert!(err.is_unsupported_feature());
}

#[test]
fn test_foreign_keys_in_other_schema() {
    let mut exec = ScriptedExecutor::new().with_table().reply(
        FOREIGN_KEYS,
        vec![
            vec![
                Text("FK_ORDERS_CUSTOMER"),
                Text("CUSTOMER_ID"),
                Text("CRM"),
                Text("CUSTOMERS"),
                Text("ID"),
                Text("RESTRICT"),
                Text("CASCADE"),
            ],
            vec![
                Text("FK_ORDERS_ITEM"),
                Text("ITEM_ID"),
                Text("APP"),
                Text("ITEMS"),
                Text("ID"),
                Null,
                Null,
            ],
        ],
    );
    let keys = reflector()
        .get_foreign_keys(&mut exec, &"orders".into(), None)
        .unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].referred_schema, Some("crm".into()));
    assert_eq!(keys[0].referred_table, Identifier::new("customers"));
    assert_eq!(keys[1].referred_schema, None);
    assert_eq!(keys[1].on_delete, None);
}

#[test]
fn test_indexes_exclude_primary_key() {
    let mut exec = ScriptedExecutor::new().with_table().reply(
        INDEX_COLUMNS,
        vec![
            vec![Text("_SYS_TREE_RS_#1_#P0"), Text("ID"), Text("PRIMARY KEY")],
            vec![Text("IDX_NAME"), Text("NAME"), Null],
            vec![Text("IDX_NAME"), Text("DEPT"), Null],
        ],
    );
    let indexes = reflector()
        .get_indexes(&mut exec, &"employees".into(), None)
        .unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].name, Identifier::new("idx_name"));
    assert!(!indexes[0].unique);
    assert_eq!(
        indexes[0].column_names,
        vec![Identifier::new("name"), Identifier::new("dept")]
    );
}

#[test]
fn test_view_definition_read_from_lob() {
    let mut exec =
        ScriptedExecutor::new().reply(VIEW_DEFINITION, vec![vec![Lob("SELECT * FROM EMPLOYEES")]]);
    let view = reflector()
        .get_view(&mut exec, &"staff".into(), Some(&"hr".into()))
        .unwrap();
    assert_eq!(view.definition, "SELECT * FROM EMPLOYEES");
    assert_eq!(view.schema, Identifier::new("hr"));
    assert_eq!(
        exec.params_of(VIEW_DEFINITION).unwrap(),
        [Some("STAFF".to_string()), Some("HR".to_string())]
    );
}

#[test]
fn test_missing_table_is_not_found() {
    let mut exec = ScriptedExecutor::new();
    let err = reflector()
        .describe_table(&mut exec, &"ghost".into(), None)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(exec.log.len(), 1);
}

#[test]
fn test_driver_errors_are_classified() {
    let mut exec = ScriptedExecutor::new().fail(
        LIST_TABLES,
        DriverError::new(131, "transaction rolled back by lock wait timeout"),
    );
    let err = reflector().list_tables(&mut exec, None).unwrap_err();
    let classified = err.as_classified().unwrap();
    assert_eq!(classified.class(), ErrorClass::LockWaitTimeout);
    assert!(classified.is_retryable());
}

#[test]
fn test_unclassified_errors_pass_through() {
    let mut exec = ScriptedExecutor::new().fail(HAS_TABLE, DriverError::new(258, "insufficient privilege"));
    let err = reflector()
        .get_columns(&mut exec, &"secret".into(), None)
        .unwrap_err();
    assert!(err.is_driver());
    assert_eq!(err.driver_error().map(DriverError::code), Some(258));
}

#[test]
fn test_quoted_names_are_sent_verbatim() {
    let mut exec = employees();
    reflector()
        .get_columns(&mut exec, &Identifier::quoted("MixedCase"), Some(&"app".into()))
        .unwrap();
    assert_eq!(
        exec.params_of(HAS_TABLE).unwrap()[1],
        Some("MixedCase".to_string())
    );
}
