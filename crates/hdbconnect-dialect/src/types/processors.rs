//! Bind and result processors.
//!
//! `bind_value` turns a host [`Value`] into the [`WireValue`] handed to the
//! driver; `parse_result` does the reverse for fetched cells. LOB columns
//! accept a string, a binary buffer or a streaming handle and always yield
//! a materialized value.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::{PortableType, TypeOptions, Value, WireValue};
use crate::{DialectError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const SECONDDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type BindFn = dyn Fn(Value) -> Result<WireValue> + Send + Sync;
type ResultFn = dyn Fn(WireValue) -> Result<Value> + Send + Sync;

/// Bind / result closure pair for one column type.
#[derive(Clone)]
pub struct TypeProcessors {
    bind: Arc<BindFn>,
    result: Arc<ResultFn>,
}

impl TypeProcessors {
    pub fn bind(&self, value: Value) -> Result<WireValue> {
        (self.bind)(value)
    }

    pub fn result(&self, value: WireValue) -> Result<Value> {
        (self.result)(value)
    }
}

impl fmt::Debug for TypeProcessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeProcessors").finish_non_exhaustive()
    }
}

/// Build the processor pair for `ty`.
#[must_use]
pub fn processors(ty: &PortableType, options: TypeOptions) -> TypeProcessors {
    let bind_ty = ty.clone();
    let result_ty = ty.clone();
    TypeProcessors {
        bind: Arc::new(move |value| bind_value(&bind_ty, value, options)),
        result: Arc::new(move |value| parse_result(&result_ty, value, options)),
    }
}

fn mismatch(ty: &PortableType, found: &str) -> DialectError {
    DialectError::unsupported_value(ty.name(), format!("unexpected {found} value"))
}

/// Host value -> driver value.
pub fn bind_value(ty: &PortableType, value: Value, options: TypeOptions) -> Result<WireValue> {
    if value.is_null() {
        return Ok(WireValue::Null);
    }

    match ty {
        PortableType::TinyInt => bind_integer(ty, value, 0, 255),
        PortableType::SmallInt => {
            bind_integer(ty, value, i64::from(i16::MIN), i64::from(i16::MAX))
        }
        PortableType::Integer => {
            bind_integer(ty, value, i64::from(i32::MIN), i64::from(i32::MAX))
        }
        PortableType::BigInt => bind_integer(ty, value, i64::MIN, i64::MAX),
        PortableType::Decimal { .. } | PortableType::SmallDecimal => match value {
            Value::Decimal(d) => Ok(WireValue::Decimal(d)),
            Value::Int(i) => Ok(WireValue::Decimal(BigDecimal::from(i))),
            Value::String(s) => parse_decimal(ty, &s).map(WireValue::Decimal),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Real | PortableType::Double => match value {
            Value::Float(f) => Ok(WireValue::Float(f)),
            Value::Int(i) => Ok(WireValue::Float(i as f64)),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Boolean => {
            let b = match value {
                Value::Bool(b) => b,
                Value::Int(0) => false,
                Value::Int(1) => true,
                other => return Err(mismatch(ty, other.kind())),
            };
            Ok(if options.native_boolean {
                WireValue::Bool(b)
            } else {
                WireValue::Int(i64::from(b))
            })
        }
        PortableType::Date => match value {
            Value::Date(d) => Ok(WireValue::String(d.format(DATE_FORMAT).to_string())),
            Value::Timestamp(ts) => Ok(WireValue::String(ts.date().format(DATE_FORMAT).to_string())),
            Value::String(s) => parse_date(ty, &s).map(|d| WireValue::String(d.format(DATE_FORMAT).to_string())),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Time => match value {
            Value::Time(t) => Ok(WireValue::String(t.format(TIME_FORMAT).to_string())),
            Value::String(s) => parse_time(ty, &s).map(|t| WireValue::String(t.format(TIME_FORMAT).to_string())),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Timestamp | PortableType::SecondDate => {
            let format = if matches!(ty, PortableType::SecondDate) {
                SECONDDATE_FORMAT
            } else {
                TIMESTAMP_FORMAT
            };
            let ts = match value {
                Value::Timestamp(ts) => ts,
                Value::Date(d) => d.and_time(NaiveTime::MIN),
                Value::String(s) => parse_timestamp(ty, &s)?,
                other => return Err(mismatch(ty, other.kind())),
            };
            Ok(WireValue::String(ts.format(format).to_string()))
        }
        PortableType::VarChar { .. }
        | PortableType::NVarChar { .. }
        | PortableType::AlphaNum { .. }
        | PortableType::Char { .. }
        | PortableType::NChar { .. }
        | PortableType::Text
        | PortableType::UnicodeText
        | PortableType::Clob
        | PortableType::NClob => match value {
            Value::String(s) => Ok(WireValue::String(s)),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Blob | PortableType::VarBinary { .. } | PortableType::Binary { .. } => {
            match value {
                Value::Bytes(b) => Ok(WireValue::Binary(b)),
                Value::String(s) => Ok(WireValue::Binary(s.into_bytes())),
                other => Err(mismatch(ty, other.kind())),
            }
        }
        PortableType::Json => match value {
            Value::Json(j) => Ok(WireValue::String(j.to_string())),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Uuid { as_varbinary, .. } => {
            let uuid = match value {
                Value::Uuid(u) => u,
                Value::String(s) => Uuid::parse_str(&s).map_err(|e| {
                    DialectError::unsupported_value(ty.name(), format!("invalid uuid '{s}': {e}"))
                })?,
                other => return Err(mismatch(ty, other.kind())),
            };
            Ok(if *as_varbinary {
                WireValue::Binary(uuid.as_bytes().to_vec())
            } else {
                WireValue::String(uuid.simple().to_string())
            })
        }
        PortableType::RealVector { length } => match value {
            Value::Vector(v) => {
                if let Some(n) = length
                    && v.len() != *n as usize
                {
                    return Err(DialectError::unsupported_value(
                        ty.name(),
                        format!("expected {n} dimensions, got {}", v.len()),
                    ));
                }
                Ok(WireValue::Binary(encode_fvecs(&v)))
            }
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Array { .. } => Err(DialectError::unsupported_feature("ARRAY values")),
        PortableType::Null => Ok(bind_untyped(value)),
    }
}

fn bind_integer(ty: &PortableType, value: Value, min: i64, max: i64) -> Result<WireValue> {
    let v = match value {
        Value::Int(i) => i,
        Value::Bool(b) => i64::from(b),
        other => return Err(mismatch(ty, other.kind())),
    };
    if v < min || v > max {
        return Err(DialectError::unsupported_value(
            ty.name(),
            format!("{v} is outside [{min}, {max}]"),
        ));
    }
    Ok(WireValue::Int(v))
}

/// Values without a declared column type pass through by shape.
fn bind_untyped(value: Value) -> WireValue {
    match value {
        Value::Null => WireValue::Null,
        Value::Bool(b) => WireValue::Bool(b),
        Value::Int(i) => WireValue::Int(i),
        Value::Float(f) => WireValue::Float(f),
        Value::Decimal(d) => WireValue::Decimal(d),
        Value::String(s) => WireValue::String(s),
        Value::Bytes(b) => WireValue::Binary(b),
        Value::Date(d) => WireValue::String(d.format(DATE_FORMAT).to_string()),
        Value::Time(t) => WireValue::String(t.format(TIME_FORMAT).to_string()),
        Value::Timestamp(ts) => WireValue::String(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::Uuid(u) => WireValue::String(u.hyphenated().to_string()),
        Value::Json(j) => WireValue::String(j.to_string()),
        Value::Vector(v) => WireValue::Binary(encode_fvecs(&v)),
    }
}

/// Driver value -> host value.
pub fn parse_result(ty: &PortableType, value: WireValue, _options: TypeOptions) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match ty {
        PortableType::TinyInt
        | PortableType::SmallInt
        | PortableType::Integer
        | PortableType::BigInt => match value {
            WireValue::Int(i) => Ok(Value::Int(i)),
            WireValue::Bool(b) => Ok(Value::Int(i64::from(b))),
            other => other
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| mismatch(ty, other.kind())),
        },
        PortableType::Decimal { .. } | PortableType::SmallDecimal => match value {
            WireValue::Decimal(d) => Ok(Value::Decimal(d)),
            WireValue::Int(i) => Ok(Value::Decimal(BigDecimal::from(i))),
            WireValue::String(s) => parse_decimal(ty, &s).map(Value::Decimal),
            WireValue::Float(f) => parse_decimal(ty, &f.to_string()).map(Value::Decimal),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Real | PortableType::Double => match value {
            WireValue::Float(f) => Ok(Value::Float(f)),
            WireValue::Int(i) => Ok(Value::Float(i as f64)),
            WireValue::Decimal(d) => d
                .to_string()
                .parse()
                .map(Value::Float)
                .map_err(|_| mismatch(ty, "decimal")),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Boolean => match value {
            WireValue::Bool(b) => Ok(Value::Bool(b)),
            WireValue::Int(i) => Ok(Value::Bool(i != 0)),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Date => match value {
            WireValue::String(s) => parse_date(ty, &s).map(Value::Date),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Time => match value {
            WireValue::String(s) => parse_time(ty, &s).map(Value::Time),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Timestamp | PortableType::SecondDate => match value {
            WireValue::String(s) => parse_timestamp(ty, &s).map(Value::Timestamp),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::VarChar { .. }
        | PortableType::NVarChar { .. }
        | PortableType::AlphaNum { .. }
        | PortableType::Char { .. }
        | PortableType::NChar { .. }
        | PortableType::Text
        | PortableType::UnicodeText
        | PortableType::Clob
        | PortableType::NClob => materialize_text(ty, value).map(Value::String),
        PortableType::Blob | PortableType::VarBinary { .. } | PortableType::Binary { .. } => {
            materialize_bytes(ty, value).map(Value::Bytes)
        }
        PortableType::Json => {
            let text = materialize_text(ty, value)?;
            serde_json::from_str(&text)
                .map(Value::Json)
                .map_err(|e| DialectError::unsupported_value(ty.name(), e.to_string()))
        }
        PortableType::Uuid {
            as_uuid,
            as_varbinary,
        } => {
            let uuid = if *as_varbinary {
                let bytes = materialize_bytes(ty, value)?;
                Uuid::from_slice(&bytes).map_err(|e| {
                    DialectError::unsupported_value(ty.name(), format!("expected 16 bytes: {e}"))
                })?
            } else {
                let text = materialize_text(ty, value)?;
                Uuid::parse_str(text.trim()).map_err(|e| {
                    DialectError::unsupported_value(ty.name(), format!("invalid uuid '{text}': {e}"))
                })?
            };
            Ok(if *as_uuid {
                Value::Uuid(uuid)
            } else {
                Value::String(uuid.hyphenated().to_string())
            })
        }
        PortableType::RealVector { .. } => match value {
            WireValue::Binary(b) => decode_fvecs(ty, &b).map(Value::Vector),
            WireValue::String(s) => serde_json::from_str::<Vec<f32>>(&s)
                .map(Value::Vector)
                .map_err(|e| DialectError::unsupported_value(ty.name(), e.to_string())),
            other => Err(mismatch(ty, other.kind())),
        },
        PortableType::Array { .. } => Err(DialectError::unsupported_feature("ARRAY values")),
        PortableType::Null => parse_untyped(ty, value),
    }
}

fn parse_untyped(ty: &PortableType, value: WireValue) -> Result<Value> {
    Ok(match value {
        WireValue::Null => Value::Null,
        WireValue::Bool(b) => Value::Bool(b),
        WireValue::Int(i) => Value::Int(i),
        WireValue::Float(f) => Value::Float(f),
        WireValue::Decimal(d) => Value::Decimal(d),
        WireValue::String(s) => Value::String(s),
        WireValue::Binary(b) => Value::Bytes(b),
        lob @ WireValue::Lob(_) => Value::Bytes(materialize_bytes(ty, lob)?),
    })
}

fn materialize_text(ty: &PortableType, value: WireValue) -> Result<String> {
    match value {
        WireValue::String(s) => Ok(s),
        WireValue::Binary(b) => String::from_utf8(b)
            .map_err(|e| DialectError::unsupported_value(ty.name(), e.to_string())),
        WireValue::Lob(lob) => lob
            .read_to_string()
            .map_err(|e| DialectError::unsupported_value(ty.name(), format!("LOB read failed: {e}"))),
        other => Err(mismatch(ty, other.kind())),
    }
}

fn materialize_bytes(ty: &PortableType, value: WireValue) -> Result<Vec<u8>> {
    match value {
        WireValue::Binary(b) => Ok(b),
        WireValue::String(s) => Ok(s.into_bytes()),
        WireValue::Lob(lob) => lob
            .read_to_end()
            .map_err(|e| DialectError::unsupported_value(ty.name(), format!("LOB read failed: {e}"))),
        other => Err(mismatch(ty, other.kind())),
    }
}

fn parse_decimal(ty: &PortableType, s: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(s.trim())
        .map_err(|e| DialectError::unsupported_value(ty.name(), format!("'{s}': {e}")))
}

fn parse_date(ty: &PortableType, s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| parse_datetime_str(s).map(|ts| ts.date()).ok_or(()))
        .map_err(|()| DialectError::unsupported_value(ty.name(), format!("invalid date '{s}'")))
}

fn parse_time(ty: &PortableType, s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
        .map_err(|e| DialectError::unsupported_value(ty.name(), format!("invalid time '{s}': {e}")))
}

fn parse_timestamp(ty: &PortableType, s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    parse_datetime_str(s)
        .or_else(|| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| DialectError::unsupported_value(ty.name(), format!("invalid timestamp '{s}'")))
}

/// Accepts both the space-separated HANA form and the `T`-separated form
/// the driver prints for LONGDATE / SECONDDATE.
fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// REAL_VECTOR binary layout: u32 LE dimension, then f32 LE components.
fn encode_fvecs(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + values.len() * 4);
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode_fvecs(ty: &PortableType, bytes: &[u8]) -> Result<Vec<f32>> {
    let invalid = || DialectError::unsupported_value(ty.name(), "truncated REAL_VECTOR payload");
    let (header, body) = bytes.split_first_chunk::<4>().ok_or_else(invalid)?;
    let dims = u32::from_le_bytes(*header) as usize;
    if body.len() != dims * 4 {
        return Err(invalid());
    }
    Ok(body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
