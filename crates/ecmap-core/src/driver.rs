mod capability;
pub use capability::{Capability, StorageTypes};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::async_trait;

use std::{borrow::Cow, fmt::Debug};

/// A database backend the engine can open connections to.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Connection URL, used in log output.
    fn url(&self) -> Cow<'_, str>;

    /// Describes the driver's capability, which informs DDL generation.
    fn capability(&self) -> &'static Capability;

    /// Opens a connection to the database.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;
}

/// A single connection. Schema imports run on one connection inside one
/// transaction.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    fn capability(&self) -> &'static Capability;

    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}
