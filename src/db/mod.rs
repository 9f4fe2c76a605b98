//! Database module: connection actor, schema, tables and row mapping.
//!
//! Layout:
//! - `actor.rs`: the task that owns the single SQLite connection
//! - `models.rs`: typed rows and payloads for the natural-key tables
//! - `schema.rs`: SQL DDL applied on connect (SQLite)
//! - `tables.rs`: the fixed table set and its column metadata
//! - `value.rs`: JSON <-> SQLite parameter/row mapping

pub mod actor;
pub mod models;
pub mod schema;
pub mod tables;
pub mod value;

pub use actor::{DbActorHandle, ExecuteOutcome, spawn};
pub use models::{
    DbExchangeRate, DbSupplier, ExchangeRateCreate, ExchangeRatePatch, ExchangeRateUpsert,
    SupplierCreate, SupplierPatch, SupplierUpsert,
};
pub use schema::SQLITE_INIT;
pub use tables::{IdStrategy, Table};
pub use value::Record;
