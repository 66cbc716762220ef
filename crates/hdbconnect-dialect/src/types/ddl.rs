//! DDL type names and literal rendering.

use super::{PortableType, TypeOptions, Value};
use crate::{DialectError, Result};

/// Render the column type used in CREATE / ALTER TABLE.
///
/// Character types always render as national (`NVARCHAR`, `NCLOB`) since
/// the client negotiates Unicode on the wire.
pub fn render_ddl_type(ty: &PortableType, options: TypeOptions) -> Result<String> {
    ty.validate().map_err(|e| {
        if matches!(ty, PortableType::Array { .. }) {
            DialectError::unsupported_feature("ARRAY columns")
        } else {
            e
        }
    })?;

    let ddl = match ty {
        PortableType::Decimal { precision, scale } => match (precision, scale) {
            (Some(p), Some(s)) => format!("DECIMAL({p}, {s})"),
            (Some(p), None) => format!("DECIMAL({p})"),
            _ => "DECIMAL".to_string(),
        },
        PortableType::Boolean if !options.native_boolean => "TINYINT".to_string(),
        PortableType::VarChar { length } | PortableType::NVarChar { length } => {
            let n = length.ok_or_else(|| {
                DialectError::unsupported_feature("VARCHAR columns require a length")
            })?;
            format!("NVARCHAR({n})")
        }
        PortableType::AlphaNum { length }
        | PortableType::Char { length }
        | PortableType::NChar { length }
        | PortableType::VarBinary { length }
        | PortableType::Binary { length }
        | PortableType::RealVector { length } => with_length(ty.name(), *length),
        PortableType::Text | PortableType::UnicodeText | PortableType::Json => {
            "NCLOB".to_string()
        }
        PortableType::Uuid { as_varbinary, .. } => {
            if *as_varbinary {
                "VARBINARY(16)".to_string()
            } else {
                "NVARCHAR(32)".to_string()
            }
        }
        PortableType::Null => {
            return Err(DialectError::unsupported_feature(
                "columns of unknown (NULL) type",
            ));
        }
        PortableType::Array { .. } => {
            return Err(DialectError::unsupported_feature("ARRAY columns"));
        }
        other => other.name().to_string(),
    };
    Ok(ddl)
}

fn with_length(name: &str, length: Option<u32>) -> String {
    length.map_or_else(|| name.to_string(), |n| format!("{name}({n})"))
}

/// Render `value` as an inline SQL literal of type `ty`.
///
/// Temporal literals use the engine's constructor functions because HANA
/// does not infer them from string format.
pub fn render_literal(ty: &PortableType, value: &Value, options: TypeOptions) -> Result<String> {
    let literal = match (ty, value) {
        (_, Value::Null) => "NULL".to_string(),
        (PortableType::Date, Value::Date(d)) => format!("TO_DATE('{}')", d.format("%Y-%m-%d")),
        (PortableType::Time, Value::Time(t)) => format!("TO_TIME('{}')", t.format("%H:%M:%S")),
        (PortableType::Timestamp, Value::Timestamp(ts)) => {
            format!("TO_TIMESTAMP('{}')", ts.format("%Y-%m-%d %H:%M:%S%.f"))
        }
        (PortableType::SecondDate, Value::Timestamp(ts)) => {
            format!("TO_SECONDDATE('{}')", ts.format("%Y-%m-%d %H:%M:%S"))
        }
        (PortableType::Date, Value::String(s)) => format!("TO_DATE({})", quote_string(s)),
        (PortableType::Time, Value::String(s)) => format!("TO_TIME({})", quote_string(s)),
        (PortableType::Timestamp, Value::String(s)) => {
            format!("TO_TIMESTAMP({})", quote_string(s))
        }
        (PortableType::SecondDate, Value::String(s)) => {
            format!("TO_SECONDDATE({})", quote_string(s))
        }
        (t, Value::Date(d)) if !t.is_temporal() => {
            format!("TO_DATE('{}')", d.format("%Y-%m-%d"))
        }
        (t, Value::Time(v)) if !t.is_temporal() => format!("TO_TIME('{}')", v.format("%H:%M:%S")),
        (t, Value::Timestamp(ts)) if !t.is_temporal() => {
            format!("TO_TIMESTAMP('{}')", ts.format("%Y-%m-%d %H:%M:%S%.f"))
        }
        (_, Value::Bool(b)) => render_bool(*b, options),
        (_, Value::Int(i)) => i.to_string(),
        (_, Value::Float(f)) if f.is_finite() => {
            let text = f.to_string();
            if text.contains(['.', 'e', 'E']) {
                text
            } else {
                format!("{text}.0")
            }
        }
        (_, Value::Decimal(d)) => d.to_string(),
        (_, Value::String(s)) => quote_string(s),
        (_, Value::Bytes(b)) => format!("X'{}'", hex::encode_upper(b)),
        (PortableType::Uuid { as_varbinary, .. }, Value::Uuid(u)) => {
            if *as_varbinary {
                format!("X'{}'", hex::encode_upper(u.as_bytes()))
            } else {
                format!("'{}'", u.simple())
            }
        }
        (_, Value::Uuid(u)) => format!("'{u}'"),
        (_, Value::Json(j)) => quote_string(&j.to_string()),
        (_, Value::Vector(v)) => {
            let parts: Vec<String> = v.iter().map(ToString::to_string).collect();
            format!("TO_REAL_VECTOR('[{}]')", parts.join(","))
        }
        (_, other) => {
            return Err(DialectError::unsupported_value(
                ty.name(),
                format!("cannot render {} value as a {} literal", other.kind(), ty.name()),
            ));
        }
    };
    Ok(literal)
}

pub(crate) fn render_bool(value: bool, options: TypeOptions) -> String {
    match (options.native_boolean, value) {
        (true, true) => "TRUE".to_string(),
        (true, false) => "FALSE".to_string(),
        (false, true) => "1".to_string(),
        (false, false) => "0".to_string(),
    }
}

pub(crate) fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    const NATIVE: TypeOptions = TypeOptions {
        native_boolean: true,
    };
    const LEGACY: TypeOptions = TypeOptions {
        native_boolean: false,
    };

    fn ddl(ty: &PortableType) -> String {
        render_ddl_type(ty, NATIVE).unwrap()
    }

    #[test]
    fn test_numeric_types() {
        assert_eq!(ddl(&PortableType::decimal(Some(10), Some(2)).unwrap()), "DECIMAL(10, 2)");
        assert_eq!(ddl(&PortableType::decimal(Some(10), None).unwrap()), "DECIMAL(10)");
        assert_eq!(ddl(&PortableType::decimal(None, None).unwrap()), "DECIMAL");
        assert_eq!(ddl(&PortableType::TinyInt), "TINYINT");
        assert_eq!(ddl(&PortableType::Double), "DOUBLE");
        assert_eq!(ddl(&PortableType::SmallDecimal), "SMALLDECIMAL");
    }

    #[test]
    fn test_boolean_modes() {
        assert_eq!(ddl(&PortableType::Boolean), "BOOLEAN");
        assert_eq!(
            render_ddl_type(&PortableType::Boolean, LEGACY).unwrap(),
            "TINYINT"
        );
    }

    #[test]
    fn test_character_types_are_national() {
        assert_eq!(ddl(&PortableType::varchar(50).unwrap()), "NVARCHAR(50)");
        assert_eq!(ddl(&PortableType::nvarchar(50).unwrap()), "NVARCHAR(50)");
        assert_eq!(ddl(&PortableType::Text), "NCLOB");
        assert_eq!(ddl(&PortableType::UnicodeText), "NCLOB");
        assert_eq!(ddl(&PortableType::Json), "NCLOB");
        assert_eq!(ddl(&PortableType::Clob), "CLOB");
        assert_eq!(ddl(&PortableType::Blob), "BLOB");
        assert_eq!(ddl(&PortableType::alphanum(10).unwrap()), "ALPHANUM(10)");
    }

    #[test]
    fn test_unbounded_varchar_rejected() {
        let err = render_ddl_type(&PortableType::VarChar { length: None }, NATIVE).unwrap_err();
        assert!(err.is_unsupported_feature());
    }

    #[test]
    fn test_array_and_null_rejected() {
        let array = PortableType::Array {
            item: Box::new(PortableType::Integer),
        };
        assert!(render_ddl_type(&array, NATIVE).unwrap_err().is_unsupported_feature());
        assert!(
            render_ddl_type(&PortableType::Null, NATIVE)
                .unwrap_err()
                .is_unsupported_feature()
        );
    }

    #[test]
    fn test_uuid_and_vector() {
        let as_string = PortableType::Uuid {
            as_uuid: true,
            as_varbinary: false,
        };
        let as_bytes = PortableType::Uuid {
            as_uuid: true,
            as_varbinary: true,
        };
        assert_eq!(ddl(&as_string), "NVARCHAR(32)");
        assert_eq!(ddl(&as_bytes), "VARBINARY(16)");
        assert_eq!(ddl(&PortableType::RealVector { length: None }), "REAL_VECTOR");
        assert_eq!(ddl(&PortableType::RealVector { length: Some(3) }), "REAL_VECTOR(3)");
    }

    #[test]
    fn test_temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let time = NaiveTime::from_hms_opt(12, 57, 18).unwrap();
        let ts = date.and_time(time);

        assert_eq!(
            render_literal(&PortableType::Date, &Value::Date(date), NATIVE).unwrap(),
            "TO_DATE('2024-03-01')"
        );
        assert_eq!(
            render_literal(&PortableType::Time, &Value::Time(time), NATIVE).unwrap(),
            "TO_TIME('12:57:18')"
        );
        assert_eq!(
            render_literal(&PortableType::Timestamp, &Value::Timestamp(ts), NATIVE).unwrap(),
            "TO_TIMESTAMP('2024-03-01 12:57:18')"
        );
        assert_eq!(
            render_literal(&PortableType::SecondDate, &Value::Timestamp(ts), NATIVE).unwrap(),
            "TO_SECONDDATE('2024-03-01 12:57:18')"
        );
    }

    #[test]
    fn test_scalar_literals() {
        let text = PortableType::nvarchar(20).unwrap();
        assert_eq!(
            render_literal(&text, &Value::from("it's"), NATIVE).unwrap(),
            "'it''s'"
        );
        assert_eq!(
            render_literal(&PortableType::Boolean, &Value::Bool(true), NATIVE).unwrap(),
            "TRUE"
        );
        assert_eq!(
            render_literal(&PortableType::Boolean, &Value::Bool(false), LEGACY).unwrap(),
            "0"
        );
        assert_eq!(
            render_literal(&PortableType::Double, &Value::Float(2.0), NATIVE).unwrap(),
            "2.0"
        );
        assert_eq!(
            render_literal(&PortableType::Blob, &Value::Bytes(vec![0xAB, 0x01]), NATIVE).unwrap(),
            "X'AB01'"
        );
        assert_eq!(
            render_literal(&PortableType::Integer, &Value::Null, NATIVE).unwrap(),
            "NULL"
        );
    }

    #[test]
    fn test_untyped_temporal_literal() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            render_literal(&PortableType::Null, &Value::Date(date), NATIVE).unwrap(),
            "TO_DATE('2024-03-01')"
        );
    }

    #[test]
    fn test_mismatched_temporal_literal() {
        let err = render_literal(
            &PortableType::Date,
            &Value::Time(NaiveTime::from_hms_opt(1, 2, 3).unwrap()),
            NATIVE,
        )
        .unwrap_err();
        assert!(err.is_unsupported_value());
    }
}
