//! Typed query descriptions and their translation into parameterized SQL.
//!
//! Layout:
//! - this file: the description types and their builders
//! - `parse.rs`: the JSON-shaped `{ where, orderBy, take }` input accepted by call sites
//! - `compile.rs`: validation against a `Table` and SQL generation

pub mod compile;
mod parse;

use serde_json::Value;

use crate::db::value::Record;

pub use compile::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = ?`. A null value emits no predicate at all.
    Eq { column: String, value: Value },
    /// `column IS NOT NULL`, no bound parameter.
    NotNull { column: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub column: String,
    pub direction: Direction,
}

/// Filter / order / limit description for `find_many`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindMany {
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<Ordering>,
    pub take: Option<u64>,
}

impl FindMany {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        self.predicates.push(Predicate::NotNull {
            column: column.into(),
        });
        self
    }

    /// Appends an ordering term; terms apply in the order they were added.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(Ordering {
            column: column.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }
}

/// Single-column point lookup used by `find_unique`, `update` and `upsert`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub column: String,
    pub value: Value,
}

impl Lookup {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertArgs {
    /// Must name the table's natural key.
    pub lookup: Lookup,
    /// Columns written when the natural key already exists.
    pub update: Record,
    /// Columns written when it does not; the natural key is filled from `lookup` if absent.
    pub create: Record,
}
