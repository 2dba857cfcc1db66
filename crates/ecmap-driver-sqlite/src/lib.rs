mod value;
pub(crate) use value::Value;

use rusqlite::{Connection as RusqliteConnection, ErrorCode};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use ecmap_core::{
    async_trait,
    driver::{
        operation::{DescribeTable, ExecSql, Operation, QuerySql, Transaction},
        Capability, Driver, Response,
    },
    stmt, Result,
};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(ecmap_core::Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(ecmap_core::err!(
                "connection URL does not have a `sqlite` scheme; url={}",
                url_str
            ));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn ecmap_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
    in_transaction: bool,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory()
            .map_err(ecmap_core::Error::driver_operation_failed)?;
        Self::init(connection)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection =
            RusqliteConnection::open(path).map_err(ecmap_core::Error::driver_operation_failed)?;
        Self::init(connection)
    }

    fn init(connection: RusqliteConnection) -> Result<Self> {
        // Foreign keys are off by default in SQLite
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        Ok(Self {
            connection,
            in_transaction: false,
        })
    }
}

#[async_trait]
impl ecmap_core::driver::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::DescribeTable(op) => self.describe_table(op),
            Operation::ExecSql(op) => self.exec_sql(op),
            Operation::QuerySql(op) => self.query_sql(op),
            Operation::Transaction(op) => self.transaction(op),
        }
    }
}

impl Connection {
    fn transaction(&mut self, op: Transaction) -> Result<Response> {
        let sql = match op {
            Transaction::Start if self.in_transaction => {
                return Err(ecmap_core::err!("a transaction is already in progress"));
            }
            Transaction::Start => "BEGIN",
            Transaction::Commit => "COMMIT",
            Transaction::Rollback => "ROLLBACK",
        };

        tracing::trace!(sql, "transaction");

        self.connection
            .execute_batch(sql)
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        self.in_transaction = op == Transaction::Start;
        Ok(Response::count(0))
    }

    fn exec_sql(&mut self, op: ExecSql) -> Result<Response> {
        tracing::debug!(sql = %op.sql, params = op.params.len(), "exec");

        let mut stmt = self
            .connection
            .prepare_cached(&op.sql)
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();

        let count = stmt
            .execute(rusqlite::params_from_iter(params.iter()))
            .map_err(map_step_error)?;

        Ok(Response::count(count as u64))
    }

    fn query_sql(&mut self, op: QuerySql) -> Result<Response> {
        tracing::debug!(sql = %op.sql, params = op.params.len(), "query");

        let mut stmt = self
            .connection
            .prepare_cached(&op.sql)
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        let width = stmt.column_count();
        if width != op.ret.len() {
            return Err(ecmap_core::err!(
                "query returns {} columns but {} types were given",
                width,
                op.ret.len()
            ));
        }

        let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(map_step_error)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut items = Vec::with_capacity(width);

                    for (index, ty) in op.ret.iter().enumerate() {
                        items.push(Value::from_sql(row, index, ty)?.into_inner());
                    }

                    ret.push(stmt::ValueRecord::from_vec(items));
                }
                Ok(None) => break,
                Err(err) => return Err(map_step_error(err)),
            }
        }

        Ok(Response::values(ret))
    }

    fn describe_table(&mut self, op: DescribeTable) -> Result<Response> {
        let mut stmt = self
            .connection
            .prepare("SELECT name, type FROM pragma_table_info(?1)")
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        let rows = stmt
            .query_map([&op.name], |row| {
                let name: String = row.get(0)?;
                let ty: String = row.get(1)?;
                Ok(stmt::ValueRecord::from_vec(vec![
                    stmt::Value::String(name),
                    stmt::Value::String(ty),
                ]))
            })
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        let columns = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(ecmap_core::Error::driver_operation_failed)?;

        Ok(Response::values(columns))
    }
}

/// Constraint failures surface when a statement is stepped.
fn map_step_error(err: rusqlite::Error) -> ecmap_core::Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            ecmap_core::Error::constraint_violation(message)
        }
        _ => ecmap_core::Error::driver_operation_failed(err),
    }
}
