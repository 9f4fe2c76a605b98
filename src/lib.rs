pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod shim;

pub use db::{Record, Table};
pub use error::ShimError;
pub use query::{Direction, FindMany, Lookup, UpsertArgs};
pub use shim::QueryShim;
