//! SAP HANA dialect for generic SQL toolkits.
//!
//! This crate turns portable statement trees into HANA SQL, maps portable
//! column types to HANA types and back, rebuilds schema metadata from the
//! HANA system catalog and classifies driver errors into a portable
//! vocabulary.
//!
//! # Features
//!
//! - Statement compiler with HANA substitutions (`FROM DUMMY`, `LIMIT`
//!   without OFFSET, `FOR SHARE LOCK`, `UPSERT`, `RENAME COLUMN`)
//! - Identifier normalization between host and catalog case conventions
//! - Catalog reflection over any [`Executor`]
//! - Versioned, TOML-loadable error classification rules
//! - `hdbconnect` adapter behind the `hdbconnect` feature
//!
//! # Example
//!
//! ```rust,ignore
//! use hdbconnect_dialect::ast::{Expr, Select, Statement};
//! use hdbconnect_dialect::{Dialect, HanaDialect};
//!
//! let dialect = HanaDialect::new();
//! let select = Select::new([Expr::column("id")])
//!     .from("orders")
//!     .limit(10);
//! let compiled = dialect.compile(&Statement::Select(select))?;
//! assert_eq!(compiled.sql, "SELECT id FROM orders LIMIT ?");
//! ```

pub mod ast;
pub mod classify;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod dialect;
mod error;
pub mod executor;
#[cfg(feature = "hdbconnect")]
pub mod hdb;
pub mod ident;
pub mod reflect;
pub mod registry;
pub mod session;
pub mod types;
pub mod url;

// Re-export main types for convenience
pub use classify::{
    Classification, ClassifiedError, DriverError, ErrorClass, ErrorRuleSet, ExecutionGuard,
    RetryPolicy,
};
pub use compiler::{CompileContext, CompileOptions, CompiledStatement, compile};
pub use config::{DialectConfig, DialectConfigBuilder, load_config, load_config_from_path};
pub use dialect::{Dialect, HanaDialect};
pub use error::{DialectError, Result};
pub use executor::{Executor, Row};
#[cfg(feature = "hdbconnect")]
pub use hdb::HdbExecutor;
pub use ident::{Identifier, IdentifierNormalizer};
pub use reflect::{ReflectionCapabilities, SchemaReflector};
pub use registry::DialectRegistry;
pub use session::{IsolationLevel, SessionControl};
pub use types::{PortableType, TypeOptions, Value, WireValue};
pub use url::ConnectArgs;
