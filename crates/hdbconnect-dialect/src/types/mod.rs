//! Portable column types and their HANA rendering.
//!
//! | Portable | HANA DDL |
//! |----------|----------|
//! | VarChar / NVarChar | NVARCHAR(n) |
//! | Text / UnicodeText / Json | NCLOB |
//! | Boolean | BOOLEAN, or TINYINT without native booleans |
//! | Uuid | NVARCHAR(32) or VARBINARY(16) |
//! | RealVector | REAL_VECTOR(n) |

mod catalog;
mod ddl;
mod processors;
mod value;

use std::fmt;

use serde::Serialize;

pub use self::catalog::{CatalogTypeLookup, catalog_name_to_type};
pub use self::ddl::{render_ddl_type, render_literal};
pub(crate) use self::ddl::quote_string;
pub use self::processors::{TypeProcessors, bind_value, parse_result, processors};
pub use self::value::{LobStream, Value, WireValue};
use crate::{DialectError, Result};

/// Longest VARCHAR / NVARCHAR column HANA accepts.
pub const MAX_VARCHAR_LENGTH: u32 = 5000;

/// Longest ALPHANUM column HANA accepts.
pub const MAX_ALPHANUM_LENGTH: u32 = 127;

/// Longest CHAR / NCHAR column HANA accepts.
pub const MAX_CHAR_LENGTH: u32 = 2000;

/// Largest DECIMAL precision.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Largest REAL_VECTOR dimension.
pub const MAX_VECTOR_DIMENSION: u32 = 65000;

/// Dialect-level switches that affect type rendering and value binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeOptions {
    /// Render BOOLEAN natively instead of TINYINT.
    pub native_boolean: bool,
}

impl Default for TypeOptions {
    fn default() -> Self {
        Self {
            native_boolean: true,
        }
    }
}

/// Where a UUID column keeps its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidStorage {
    /// Native UUID column. HANA has none; always rejected.
    Native,
    /// 32 hex characters in NVARCHAR(32).
    String,
    /// 16 big-endian bytes in VARBINARY(16).
    VarBinary,
}

/// Abstract column / value type.
///
/// Sized variants are `#[non_exhaustive]`: outside this crate they are
/// built through the validating constructors, so HANA's length and
/// precision limits hold for every value that reaches the compiler.
///
/// ```compile_fail
/// use hdbconnect_dialect::PortableType;
///
/// let _ = PortableType::VarChar { length: Some(9000) };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum PortableType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    #[non_exhaustive]
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    /// Floating decimal; the server reports neither precision nor scale.
    SmallDecimal,
    Real,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    SecondDate,
    #[non_exhaustive]
    VarChar {
        length: Option<u32>,
    },
    #[non_exhaustive]
    NVarChar {
        length: Option<u32>,
    },
    #[non_exhaustive]
    AlphaNum {
        length: Option<u32>,
    },
    #[non_exhaustive]
    Char {
        length: Option<u32>,
    },
    #[non_exhaustive]
    NChar {
        length: Option<u32>,
    },
    #[non_exhaustive]
    VarBinary {
        length: Option<u32>,
    },
    #[non_exhaustive]
    Binary {
        length: Option<u32>,
    },
    Text,
    UnicodeText,
    Blob,
    Clob,
    NClob,
    Json,
    #[non_exhaustive]
    Uuid {
        /// Return `uuid::Uuid` values instead of hyphenated strings.
        as_uuid: bool,
        as_varbinary: bool,
    },
    #[non_exhaustive]
    RealVector {
        length: Option<u32>,
    },
    #[non_exhaustive]
    Array {
        item: Box<Self>,
    },
    /// Unknown catalog type.
    Null,
}

impl PortableType {
    // ═══════════════════════════════════════════════════════════════════════
    // Validating constructors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn decimal(precision: Option<u32>, scale: Option<u32>) -> Result<Self> {
        let ty = Self::Decimal { precision, scale };
        ty.validate()?;
        Ok(ty)
    }

    pub fn varchar(length: u32) -> Result<Self> {
        let ty = Self::VarChar {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn nvarchar(length: u32) -> Result<Self> {
        let ty = Self::NVarChar {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn alphanum(length: u32) -> Result<Self> {
        let ty = Self::AlphaNum {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn char(length: u32) -> Result<Self> {
        let ty = Self::Char {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn nchar(length: u32) -> Result<Self> {
        let ty = Self::NChar {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn binary(length: u32) -> Result<Self> {
        let ty = Self::Binary {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    /// VARCHAR without a length, for CAST targets.
    #[must_use]
    pub const fn varchar_unbounded() -> Self {
        Self::VarChar { length: None }
    }

    /// NVARCHAR without a length, for CAST targets.
    #[must_use]
    pub const fn nvarchar_unbounded() -> Self {
        Self::NVarChar { length: None }
    }

    pub fn varbinary(length: u32) -> Result<Self> {
        let ty = Self::VarBinary {
            length: Some(length),
        };
        ty.validate()?;
        Ok(ty)
    }

    pub fn uuid(storage: UuidStorage, as_uuid: bool) -> Result<Self> {
        match storage {
            UuidStorage::Native => Err(DialectError::invalid_type(
                "HANA has no native UUID column type; store as string or varbinary",
            )),
            UuidStorage::String => Ok(Self::Uuid {
                as_uuid,
                as_varbinary: false,
            }),
            UuidStorage::VarBinary => Ok(Self::Uuid {
                as_uuid,
                as_varbinary: true,
            }),
        }
    }

    pub fn real_vector(length: Option<u32>) -> Result<Self> {
        let ty = Self::RealVector { length };
        ty.validate()?;
        Ok(ty)
    }

    pub fn array(item: Self) -> Result<Self> {
        let ty = Self::Array {
            item: Box::new(item),
        };
        ty.validate()?;
        Ok(ty)
    }

    /// Check length and precision limits.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::VarChar { length: Some(n) } | Self::NVarChar { length: Some(n) } => {
                check_length(self.name(), *n, MAX_VARCHAR_LENGTH)
            }
            Self::VarBinary { length: Some(n) } => check_length("VARBINARY", *n, MAX_VARCHAR_LENGTH),
            Self::AlphaNum { length: Some(n) } => check_length("ALPHANUM", *n, MAX_ALPHANUM_LENGTH),
            Self::Char { length: Some(n) } | Self::NChar { length: Some(n) } => {
                check_length(self.name(), *n, MAX_CHAR_LENGTH)
            }
            Self::Binary { length: Some(n) } => check_length("BINARY", *n, MAX_CHAR_LENGTH),
            Self::RealVector { length: Some(n) } => {
                check_length("REAL_VECTOR", *n, MAX_VECTOR_DIMENSION)
            }
            Self::Decimal {
                precision: Some(p),
                scale,
            } => {
                check_length("DECIMAL precision", *p, MAX_DECIMAL_PRECISION)?;
                match scale {
                    Some(s) if s > p => Err(DialectError::invalid_type(format!(
                        "DECIMAL scale {s} exceeds precision {p}"
                    ))),
                    _ => Ok(()),
                }
            }
            Self::Decimal {
                precision: None,
                scale: Some(_),
            } => Err(DialectError::invalid_type(
                "DECIMAL scale requires a precision",
            )),
            Self::Array { .. } => Err(DialectError::invalid_type(
                "ARRAY columns are not supported by the hana dialect",
            )),
            _ => Ok(()),
        }
    }

    /// HANA type name without length arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Decimal { .. } => "DECIMAL",
            Self::SmallDecimal => "SMALLDECIMAL",
            Self::Real => "REAL",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::SecondDate => "SECONDDATE",
            Self::VarChar { .. } => "VARCHAR",
            Self::NVarChar { .. } => "NVARCHAR",
            Self::AlphaNum { .. } => "ALPHANUM",
            Self::Char { .. } => "CHAR",
            Self::NChar { .. } => "NCHAR",
            Self::VarBinary { .. } => "VARBINARY",
            Self::Binary { .. } => "BINARY",
            Self::Text => "TEXT",
            Self::UnicodeText => "UNICODE_TEXT",
            Self::Blob => "BLOB",
            Self::Clob => "CLOB",
            Self::NClob => "NCLOB",
            Self::Json => "JSON",
            Self::Uuid { .. } => "UUID",
            Self::RealVector { .. } => "REAL_VECTOR",
            Self::Array { .. } => "ARRAY",
            Self::Null => "NULL",
        }
    }

    /// Character or binary large object.
    #[must_use]
    pub const fn is_lob(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::UnicodeText | Self::Blob | Self::Clob | Self::NClob | Self::Json
        )
    }

    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Timestamp | Self::SecondDate
        )
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match render_ddl_type(self, TypeOptions::default()) {
            Ok(ddl) => f.write_str(&ddl),
            Err(_) => f.write_str(self.name()),
        }
    }
}

fn check_length(type_name: &str, length: u32, max: u32) -> Result<()> {
    if length == 0 {
        return Err(DialectError::invalid_type(format!(
            "{type_name} length must be positive"
        )));
    }
    if length > max {
        return Err(DialectError::invalid_type(format!(
            "{type_name} length {length} exceeds maximum {max}"
        )));
    }
    Ok(())
}
