//! Accepts the loosely-typed option objects used by existing call sites and
//! turns them into typed descriptions. Anything outside the supported shape is
//! rejected here instead of reaching the store.

use serde_json::Value;

use super::{Direction, FindMany, Lookup, Ordering, Predicate, UpsertArgs};
use crate::db::value::Record;
use crate::error::ShimError;

impl FindMany {
    /// Parses `{ "where": {..}, "orderBy": {..} | [{..}], "take": n }`.
    ///
    /// `null` (or a missing object) means "no options".
    pub fn from_json(options: &Value) -> Result<Self, ShimError> {
        let options = match options {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(ShimError::invalid(format!("options must be an object, got {other}"))),
        };

        let mut query = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "where" => query.predicates = parse_where(value)?,
                "orderBy" => query.order_by = parse_order_by(value)?,
                "take" => query.take = parse_take(value)?,
                other => {
                    return Err(ShimError::invalid(format!("unsupported option `{other}`")));
                }
            }
        }
        Ok(query)
    }
}

impl Lookup {
    /// Parses a `where` object that must carry exactly one column.
    pub fn from_json(where_: &Value) -> Result<Self, ShimError> {
        let Value::Object(map) = where_ else {
            return Err(ShimError::invalid("where must be an object"));
        };
        let mut entries = map.iter();
        let (Some((column, value)), None) = (entries.next(), entries.next()) else {
            return Err(ShimError::invalid(format!(
                "point lookup needs exactly one column in where, got {}",
                map.len()
            )));
        };
        if !is_scalar(value) || value.is_null() {
            return Err(ShimError::invalid(format!(
                "lookup value for `{column}` must be a non-null scalar"
            )));
        }
        Ok(Self::new(column.clone(), value.clone()))
    }
}

impl UpsertArgs {
    /// Parses `{ "where": {..}, "update": {..}, "create": {..} }`.
    pub fn from_json(args: &Value) -> Result<Self, ShimError> {
        let Value::Object(map) = args else {
            return Err(ShimError::invalid("upsert arguments must be an object"));
        };
        let lookup = Lookup::from_json(map.get("where").unwrap_or(&Value::Null))?;
        Ok(Self {
            lookup,
            update: object_or_empty(map.get("update"), "update")?,
            create: object_or_empty(map.get("create"), "create")?,
        })
    }
}

fn parse_where(value: &Value) -> Result<Vec<Predicate>, ShimError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        _ => return Err(ShimError::invalid("where must be an object")),
    };

    let mut predicates = Vec::with_capacity(map.len());
    for (column, value) in map {
        let predicate = match value {
            Value::Object(op) if is_not_null_marker(op) => Predicate::NotNull {
                column: column.clone(),
            },
            Value::Object(_) | Value::Array(_) => {
                return Err(ShimError::invalid(format!(
                    "unsupported filter on `{column}`: only equality and {{ \"not\": null }} are allowed"
                )));
            }
            scalar => Predicate::Eq {
                column: column.clone(),
                value: scalar.clone(),
            },
        };
        predicates.push(predicate);
    }
    Ok(predicates)
}

fn is_not_null_marker(op: &serde_json::Map<String, Value>) -> bool {
    op.len() == 1 && op.get("not").is_some_and(Value::is_null)
}

fn parse_order_by(value: &Value) -> Result<Vec<Ordering>, ShimError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .iter()
            .map(|(column, dir)| ordering(column, dir))
            .collect(),
        // Prisma-style list of single-key objects.
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_object().map(|m| (m.len(), m.iter().next())) {
                Some((1, Some((column, dir)))) => ordering(column, dir),
                _ => Err(ShimError::invalid(
                    "orderBy list entries must be single-key objects",
                )),
            })
            .collect(),
        _ => Err(ShimError::invalid("orderBy must be an object or a list")),
    }
}

fn ordering(column: &str, dir: &Value) -> Result<Ordering, ShimError> {
    let direction = match dir.as_str() {
        Some("asc") => Direction::Asc,
        Some("desc") => Direction::Desc,
        _ => {
            return Err(ShimError::invalid(format!(
                "orderBy direction for `{column}` must be \"asc\" or \"desc\", got {dir}"
            )));
        }
    };
    Ok(Ordering {
        column: column.to_string(),
        direction,
    })
}

fn parse_take(value: &Value) -> Result<Option<u64>, ShimError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ShimError::invalid(format!("take must be a non-negative integer, got {n}"))),
        other => Err(ShimError::invalid(format!(
            "take must be a non-negative integer, got {other}"
        ))),
    }
}

fn object_or_empty(value: Option<&Value>, field: &str) -> Result<Record, ShimError> {
    match value {
        None | Some(Value::Null) => Ok(Record::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ShimError::invalid(format!("{field} must be an object"))),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn where_maps_equality_null_and_not_null() {
        let query = FindMany::from_json(&json!({
            "where": { "currency": "AED", "category": null, "imageUrl": { "not": null } }
        }))
        .unwrap();
        assert_eq!(
            query.predicates,
            vec![
                Predicate::Eq {
                    column: "currency".into(),
                    value: json!("AED")
                },
                Predicate::Eq {
                    column: "category".into(),
                    value: Value::Null
                },
                Predicate::NotNull {
                    column: "imageUrl".into()
                },
            ]
        );
    }

    #[test]
    fn order_by_keeps_key_order_in_both_shapes() {
        let from_map = FindMany::from_json(&json!({ "orderBy": { "rate": "desc", "currency": "asc" } }))
            .unwrap();
        let from_list =
            FindMany::from_json(&json!({ "orderBy": [{ "rate": "desc" }, { "currency": "asc" }] }))
                .unwrap();
        let expected = FindMany::new()
            .order_by("rate", Direction::Desc)
            .order_by("currency", Direction::Asc);
        assert_eq!(from_map, expected);
        assert_eq!(from_list, expected);
    }

    #[test]
    fn rejects_unsupported_shapes() {
        for bad in [
            json!({ "where": { "rate": { "gt": 1 } } }),
            json!({ "where": { "id": [1, 2] } }),
            json!({ "where": { "rate": { "not": 3 } } }),
            json!({ "orderBy": { "rate": "up" } }),
            json!({ "take": -1 }),
            json!({ "take": "5" }),
            json!({ "include": { "reviews": true } }),
            json!([1]),
        ] {
            let err = FindMany::from_json(&bad).unwrap_err();
            assert!(matches!(err, ShimError::InvalidQuery(_)), "{bad} -> {err:?}");
        }
    }

    #[test]
    fn null_options_mean_no_filters() {
        assert_eq!(FindMany::from_json(&Value::Null).unwrap(), FindMany::default());
    }

    #[test]
    fn lookup_requires_exactly_one_key() {
        let lookup = Lookup::from_json(&json!({ "currency": "AED" })).unwrap();
        assert_eq!(lookup, Lookup::new("currency", "AED"));

        let err = Lookup::from_json(&json!({ "a": 1, "b": 2 })).unwrap_err();
        assert!(matches!(err, ShimError::InvalidQuery(msg) if msg.contains("got 2")));
        assert!(Lookup::from_json(&json!({})).is_err());
        assert!(Lookup::from_json(&json!({ "id": null })).is_err());
        assert!(Lookup::from_json(&json!({ "id": { "not": null } })).is_err());
    }

    #[test]
    fn upsert_args_default_missing_payloads() {
        let args = UpsertArgs::from_json(&json!({
            "where": { "externalId": "ext-1" },
            "create": { "name": "Acme" }
        }))
        .unwrap();
        assert_eq!(args.lookup, Lookup::new("externalId", "ext-1"));
        assert!(args.update.is_empty());
        assert_eq!(args.create["name"], "Acme");
    }
}
