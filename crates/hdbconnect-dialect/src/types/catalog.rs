//! Catalog type names (`SYS.TABLE_COLUMNS.DATA_TYPE_NAME`) to portable types.

use super::PortableType;

/// Result of a catalog type lookup.
///
/// Unknown names resolve to [`PortableType::Null`] with a warning so that
/// one exotic column never aborts reflection of the whole table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTypeLookup {
    pub ty: PortableType,
    pub warning: Option<String>,
}

fn length_of(length: Option<i64>) -> Option<u32> {
    length.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0)
}

/// Map a catalog type name plus its LENGTH / SCALE columns.
#[must_use]
pub fn catalog_name_to_type(
    name: &str,
    length: Option<i64>,
    scale: Option<i64>,
) -> CatalogTypeLookup {
    let len = length_of(length);
    let ty = match name.trim().to_ascii_uppercase().as_str() {
        "TINYINT" => PortableType::TinyInt,
        "SMALLINT" => PortableType::SmallInt,
        "INTEGER" | "INT" => PortableType::Integer,
        "BIGINT" => PortableType::BigInt,
        "DECIMAL" => PortableType::Decimal {
            precision: len,
            scale: scale.and_then(|s| u32::try_from(s).ok()),
        },
        "SMALLDECIMAL" => PortableType::SmallDecimal,
        "REAL" => PortableType::Real,
        "DOUBLE" | "FLOAT" => PortableType::Double,
        "BOOLEAN" => PortableType::Boolean,
        "DATE" | "DAYDATE" => PortableType::Date,
        "TIME" | "SECONDTIME" => PortableType::Time,
        "TIMESTAMP" | "LONGDATE" => PortableType::Timestamp,
        "SECONDDATE" => PortableType::SecondDate,
        "VARCHAR" => PortableType::VarChar { length: len },
        "NVARCHAR" | "SHORTTEXT" => PortableType::NVarChar { length: len },
        "ALPHANUM" => PortableType::AlphaNum { length: len },
        "CHAR" => PortableType::Char { length: len },
        "NCHAR" => PortableType::NChar { length: len },
        "VARBINARY" => PortableType::VarBinary { length: len },
        "BINARY" => PortableType::Binary { length: len },
        "BLOB" => PortableType::Blob,
        "CLOB" => PortableType::Clob,
        "NCLOB" => PortableType::NClob,
        "TEXT" | "BINTEXT" => PortableType::Text,
        "JSON" => PortableType::Json,
        "REAL_VECTOR" => PortableType::RealVector { length: len },
        _ => {
            return CatalogTypeLookup {
                ty: PortableType::Null,
                warning: Some(format!("did not recognize type '{name}'")),
            };
        }
    };
    CatalogTypeLookup { ty, warning: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str, length: Option<i64>, scale: Option<i64>) -> PortableType {
        let result = catalog_name_to_type(name, length, scale);
        assert!(result.warning.is_none(), "unexpected warning for {name}");
        result.ty
    }

    #[test]
    fn test_integers() {
        assert_eq!(lookup("TINYINT", Some(3), Some(0)), PortableType::TinyInt);
        assert_eq!(lookup("INTEGER", Some(10), Some(0)), PortableType::Integer);
        assert_eq!(lookup("BIGINT", None, None), PortableType::BigInt);
    }

    #[test]
    fn test_decimal_takes_length_and_scale() {
        assert_eq!(
            lookup("DECIMAL", Some(5), Some(4)),
            PortableType::Decimal {
                precision: Some(5),
                scale: Some(4)
            }
        );
    }

    #[test]
    fn test_character_lengths() {
        assert_eq!(
            lookup("NVARCHAR", Some(255), None),
            PortableType::NVarChar { length: Some(255) }
        );
        assert_eq!(
            lookup("VARCHAR", Some(10), None),
            PortableType::VarChar { length: Some(10) }
        );
        assert_eq!(
            lookup("ALPHANUM", Some(10), None),
            PortableType::AlphaNum { length: Some(10) }
        );
    }

    #[test]
    fn test_temporal_names() {
        assert_eq!(lookup("TIMESTAMP", None, None), PortableType::Timestamp);
        assert_eq!(lookup("LONGDATE", None, None), PortableType::Timestamp);
        assert_eq!(lookup("SECONDDATE", None, None), PortableType::SecondDate);
    }

    #[test]
    fn test_vector_without_dimension() {
        assert_eq!(
            lookup("REAL_VECTOR", Some(0), None),
            PortableType::RealVector { length: None }
        );
        assert_eq!(
            lookup("REAL_VECTOR", Some(3), None),
            PortableType::RealVector { length: Some(3) }
        );
    }

    #[test]
    fn test_unknown_type_degrades() {
        let result = catalog_name_to_type("ST_GEOMETRY", None, None);
        assert_eq!(result.ty, PortableType::Null);
        assert!(result.warning.unwrap().contains("ST_GEOMETRY"));
    }
}
