//! Maps EC schemas onto relational tables and keeps the mapping up to date
//! as schemas evolve.
//!
//! A [`Db`] owns a connection and the catalog persisted in the database.
//! [`Db::import_schemas`] diffs incoming schemas against the catalog,
//! validates the update, allocates tables and columns, and applies the
//! result in one transaction.

mod allocate;
mod apply;

mod catalog;
pub use catalog::Catalog;

mod config;
pub use config::{Config, Policy};

pub mod db;
pub use db::Db;

mod instance;
pub use instance::{Instance, InstanceKey};

pub mod relationship;

pub mod resolve;

mod transaction;

mod validate;
pub use validate::rules as validation_rules;

pub use ecmap_core::{driver, schema, stmt, Error, Result};
