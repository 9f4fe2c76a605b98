//! Mapping between JSON values and SQLite parameters / result rows.

use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row, TypeInfo, ValueRef};

/// A row as plain key/value pairs, keyed by store column name.
pub type Record = serde_json::Map<String, Value>;

/// Builds positional arguments for a statement.
///
/// `bool` binds as INTEGER 0/1, integral numbers as `i64`, other numbers as
/// `f64`; arrays and objects are stored as their JSON text.
pub(crate) fn arguments<'q>(params: &[Value]) -> Result<SqliteArguments<'q>, sqlx::Error> {
    let mut args = SqliteArguments::default();
    for param in params {
        let res = match param {
            Value::Null => args.add(None::<i64>),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => args.add(i),
                None => args.add(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => args.add(s.clone()),
            Value::Array(_) | Value::Object(_) => args.add(param.to_string()),
        };
        res.map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

/// Decodes a row by the storage class of each value; no schema-driven coercion.
pub(crate) fn record_from_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(idx)?),
                "REAL" => {
                    let f = row.try_get::<f64, _>(idx)?;
                    Number::from_f64(f).map_or(Value::Null, Value::Number)
                }
                "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(idx)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
            }
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Serializes a typed payload into a `Record`; `None` fields are expected to be skipped.
pub(crate) fn to_record<T: serde::Serialize>(value: &T) -> Result<Record, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::de::Error::custom(format!(
            "expected an object payload, got {other}"
        ))),
    }
}
