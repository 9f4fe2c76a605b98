//! Statement generation. Every column name is resolved through
//! [`Table::column`] before it is written into SQL, so a statement only ever
//! contains the table's own identifiers.

use serde_json::Value;
use sqlx::sqlite::SqliteArguments;
use std::fmt::Write;

use super::{FindMany, Lookup, Predicate, UpsertArgs};
use crate::db::Table;
use crate::db::value::{Record, arguments};
use crate::error::ShimError;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub(crate) fn arguments<'q>(&self) -> Result<SqliteArguments<'q>, sqlx::Error> {
        arguments(&self.params)
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn find_many(table: Table, query: &FindMany) -> Result<Statement, ShimError> {
    let mut sql = format!("SELECT * FROM {}", quote(table.name()));
    let mut params = Vec::new();

    let mut clauses = Vec::with_capacity(query.predicates.len());
    for predicate in &query.predicates {
        match predicate {
            Predicate::Eq { column, value } => {
                let column = table.column(column)?;
                if value.is_null() {
                    continue;
                }
                clauses.push(format!("{} = ?", quote(column)));
                params.push(value.clone());
            }
            Predicate::NotNull { column } => {
                let column = table.column(column)?;
                clauses.push(format!("{} IS NOT NULL", quote(column)));
            }
        }
    }
    if !clauses.is_empty() {
        let _ = write!(sql, " WHERE {}", clauses.join(" AND "));
    }

    if !query.order_by.is_empty() {
        let terms = query
            .order_by
            .iter()
            .map(|o| -> Result<String, ShimError> {
                let column = table.column(&o.column)?;
                Ok(format!("{} {}", quote(column), o.direction.as_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let _ = write!(sql, " ORDER BY {}", terms.join(", "));
    }

    if let Some(take) = query.take {
        let _ = write!(sql, " LIMIT {take}");
    }

    Ok(Statement { sql, params })
}

pub fn find_unique(table: Table, lookup: &Lookup) -> Result<Statement, ShimError> {
    let column = table.column(&lookup.column)?;
    Ok(Statement {
        sql: format!(
            "SELECT * FROM {} WHERE {} = ? LIMIT 1",
            quote(table.name()),
            quote(column)
        ),
        params: vec![lookup.value.clone()],
    })
}

pub fn insert(table: Table, data: &Record) -> Result<Statement, ShimError> {
    let (columns, params) = columns_and_values(table, data)?;
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote(table.name()))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.name()),
            columns.join(", "),
            placeholders(columns.len())
        )
    };
    Ok(Statement { sql, params })
}

pub fn update(table: Table, lookup: &Lookup, data: &Record) -> Result<Statement, ShimError> {
    let key = table.column(&lookup.column)?;
    if data.is_empty() {
        return Err(ShimError::invalid(format!(
            "update on `{}` needs at least one column in data",
            table.name()
        )));
    }
    let (columns, mut params) = columns_and_values(table, data)?;
    let assignments = columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    params.push(lookup.value.clone());
    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {assignments} WHERE {} = ?",
            quote(table.name()),
            quote(key)
        ),
        params,
    })
}

/// `INSERT .. ON CONFLICT(natural key) DO UPDATE .. RETURNING *`.
///
/// The natural key is copied from the lookup into `create` when missing.
pub fn upsert(table: Table, args: &UpsertArgs) -> Result<Statement, ShimError> {
    let Some(natural_key) = table.natural_key() else {
        return Err(ShimError::invalid(format!(
            "table `{}` has no natural key to upsert on",
            table.name()
        )));
    };
    if args.lookup.column != natural_key {
        return Err(ShimError::invalid(format!(
            "upsert on `{}` must look up by `{natural_key}`, got `{}`",
            table.name(),
            args.lookup.column
        )));
    }

    let mut create = args.create.clone();
    match create.get(natural_key) {
        None | Some(Value::Null) => {
            create.insert(natural_key.to_string(), args.lookup.value.clone());
        }
        Some(v) if *v == args.lookup.value => {}
        Some(v) => {
            return Err(ShimError::invalid(format!(
                "create.{natural_key} ({v}) disagrees with where.{natural_key} ({})",
                args.lookup.value
            )));
        }
    }

    let (insert_columns, mut params) = columns_and_values(table, &create)?;
    let (update_columns, update_params) = columns_and_values(table, &args.update)?;

    let mut assignments: Vec<String> = update_columns.iter().map(|c| format!("{c} = ?")).collect();
    if let Some(updated_at) = table.updated_at_column()
        && !args.update.contains_key(updated_at)
    {
        assignments.push(format!("{} = CURRENT_TIMESTAMP", quote(updated_at)));
    }
    if assignments.is_empty() {
        // DO NOTHING would suppress RETURNING for the existing row.
        let key = quote(natural_key);
        assignments.push(format!("{key} = excluded.{key}"));
    }
    params.extend(update_params);

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO UPDATE SET {} RETURNING *",
            quote(table.name()),
            insert_columns.join(", "),
            placeholders(insert_columns.len()),
            quote(natural_key),
            assignments.join(", ")
        ),
        params,
    })
}

fn columns_and_values(table: Table, data: &Record) -> Result<(Vec<String>, Vec<Value>), ShimError> {
    let mut columns = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len());
    for (column, value) in data {
        columns.push(quote(table.column(column)?));
        values.push(value.clone());
    }
    Ok((columns, values))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
