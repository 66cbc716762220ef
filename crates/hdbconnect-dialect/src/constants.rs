//! Constants for the HANA dialect

/// One-row system table used when a SELECT has no FROM clause
pub const DUMMY_TABLE: &str = "DUMMY";

/// Row count rendered as LIMIT when only OFFSET is requested
pub const MAX_ROW_COUNT: u64 = 2_147_384_648;

/// Longest identifier the engine accepts
pub const MAX_IDENTIFIER_LENGTH: usize = 127;

/// Default SQL port of a single-container system
pub const DEFAULT_PORT: u16 = 30015;

/// Default SQL port of the system database in a multi-tenant system
pub const DEFAULT_TENANT_PORT: u16 = 30013;

/// Host prefix selecting a secure user store key instead of a network address
pub const USERKEY_PREFIX: &str = "userkey=";

/// Prefix of constraint and index names generated by the engine
pub const SYSTEM_NAME_PREFIX: &str = "_SYS";

/// SQL nullable / flag value: TRUE
pub const SQL_TRUE: &str = "TRUE";

/// SQL query for the session user, which doubles as the default schema
pub const CURRENT_USER_QUERY: &str = "SELECT CURRENT_USER FROM DUMMY";

/// SQL query for the active isolation level
pub const CURRENT_ISOLATION_QUERY: &str = "SELECT CURRENT_TRANSACTION_ISOLATION_LEVEL FROM DUMMY";

/// Statement switching DDL into the surrounding transaction
pub const AUTOCOMMIT_DDL_OFF: &str = "SET TRANSACTION AUTOCOMMIT DDL OFF";

// ═══════════════════════════════════════════════════════════════════════════
// Catalog queries (parameters bound positionally, denormalized names)
// ═══════════════════════════════════════════════════════════════════════════

/// Params: schema, table, schema, table
pub const HAS_TABLE: &str = "SELECT 1 FROM SYS.TABLES WHERE SCHEMA_NAME=? AND TABLE_NAME=? \
     UNION ALL SELECT 1 FROM SYS.VIEWS WHERE SCHEMA_NAME=? AND VIEW_NAME=?";

/// Params: schema, view
pub const HAS_VIEW: &str = "SELECT 1 FROM SYS.VIEWS WHERE SCHEMA_NAME=? AND VIEW_NAME=?";

/// Params: schema
pub const HAS_SCHEMA: &str = "SELECT 1 FROM SYS.SCHEMAS WHERE SCHEMA_NAME=?";

/// Params: schema, table, index
pub const HAS_INDEX: &str =
    "SELECT 1 FROM SYS.INDEXES WHERE SCHEMA_NAME=? AND TABLE_NAME=? AND INDEX_NAME=?";

/// Params: schema, sequence
pub const HAS_SEQUENCE: &str =
    "SELECT 1 FROM SYS.SEQUENCES WHERE SCHEMA_NAME=? AND SEQUENCE_NAME=?";

pub const LIST_SCHEMAS: &str = "SELECT SCHEMA_NAME FROM SYS.SCHEMAS";

/// Params: schema
pub const LIST_TABLES: &str = "SELECT TABLE_NAME FROM SYS.TABLES WHERE SCHEMA_NAME=? AND \
     IS_USER_DEFINED_TYPE='FALSE' AND IS_TEMPORARY='FALSE'";

/// Params: schema
pub const LIST_TEMP_TABLES: &str = "SELECT TABLE_NAME FROM SYS.TABLES WHERE SCHEMA_NAME=? AND \
     IS_TEMPORARY='TRUE' ORDER BY TABLE_NAME";

/// Params: schema
pub const LIST_VIEWS: &str = "SELECT VIEW_NAME FROM SYS.VIEWS WHERE SCHEMA_NAME=?";

/// Params: schema
pub const LIST_SEQUENCES: &str =
    "SELECT SEQUENCE_NAME FROM SYS.SEQUENCES WHERE SCHEMA_NAME=? ORDER BY SEQUENCE_NAME";

/// Params: view, schema
pub const VIEW_DEFINITION: &str =
    "SELECT DEFINITION FROM SYS.VIEWS WHERE VIEW_NAME=? AND SCHEMA_NAME=? LIMIT 1";

/// Params: schema, table
///
/// Row: `COLUMN_NAME, DATA_TYPE_NAME, DEFAULT_VALUE, IS_NULLABLE, LENGTH, SCALE, COMMENTS`
pub const TABLE_COLUMNS: &str = "SELECT COLUMN_NAME, DATA_TYPE_NAME, DEFAULT_VALUE, IS_NULLABLE, \
     LENGTH, SCALE, COMMENTS FROM (\
     SELECT SCHEMA_NAME, TABLE_NAME, COLUMN_NAME, POSITION, DATA_TYPE_NAME, DEFAULT_VALUE, \
     IS_NULLABLE, LENGTH, SCALE, COMMENTS FROM SYS.TABLE_COLUMNS UNION ALL \
     SELECT SCHEMA_NAME, VIEW_NAME AS TABLE_NAME, COLUMN_NAME, POSITION, DATA_TYPE_NAME, \
     DEFAULT_VALUE, IS_NULLABLE, LENGTH, SCALE, COMMENTS FROM SYS.VIEW_COLUMNS) AS COLUMNS \
     WHERE SCHEMA_NAME=? AND TABLE_NAME=? ORDER BY POSITION";

/// Params: schema, table
pub const PRIMARY_KEY: &str = "SELECT CONSTRAINT_NAME, COLUMN_NAME FROM SYS.CONSTRAINTS \
     WHERE SCHEMA_NAME=? AND TABLE_NAME=? AND IS_PRIMARY_KEY='TRUE' ORDER BY POSITION";

/// Params: schema, table
pub const UNIQUE_CONSTRAINTS: &str = "SELECT CONSTRAINT_NAME, COLUMN_NAME FROM SYS.CONSTRAINTS \
     WHERE SCHEMA_NAME=? AND TABLE_NAME=? AND IS_UNIQUE_KEY='TRUE' AND IS_PRIMARY_KEY='FALSE' \
     ORDER BY CONSTRAINT_NAME, POSITION";

/// Params: schema, table
pub const CHECK_CONSTRAINTS: &str = "SELECT CONSTRAINT_NAME, CHECK_CONDITION FROM SYS.CONSTRAINTS \
     WHERE SCHEMA_NAME=? AND TABLE_NAME=? AND CHECK_CONDITION IS NOT NULL";

/// Params: schema, table
pub const INDEX_COLUMNS: &str = "SELECT \"INDEX_NAME\", \"COLUMN_NAME\", \"CONSTRAINT\" \
     FROM SYS.INDEX_COLUMNS WHERE SCHEMA_NAME=? AND TABLE_NAME=? ORDER BY POSITION";

/// Params: schema, table
pub const FOREIGN_KEYS: &str = "SELECT CONSTRAINT_NAME, COLUMN_NAME, REFERENCED_SCHEMA_NAME, \
     REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME, UPDATE_RULE, DELETE_RULE \
     FROM SYS.REFERENTIAL_CONSTRAINTS WHERE SCHEMA_NAME=? AND TABLE_NAME=? \
     ORDER BY CONSTRAINT_NAME, POSITION";

/// Params: schema, table
pub const TABLE_OID: &str = "SELECT TABLE_OID FROM SYS.TABLES WHERE SCHEMA_NAME=? AND TABLE_NAME=?";

/// Params: schema, table
pub const TABLE_COMMENT: &str =
    "SELECT COMMENTS FROM SYS.TABLES WHERE SCHEMA_NAME=? AND TABLE_NAME=?";

/// Params: schema, table
pub const IS_TEMPORARY: &str =
    "SELECT IS_TEMPORARY FROM SYS.TABLES WHERE SCHEMA_NAME=? AND TABLE_NAME=?";
