use crate::{
    exec_log::ExecLog,
    logging_driver::{FailOn, LoggingDriver, OpsLog},
};
use ecmap::{Config, Db};
use ecmap_driver_sqlite::Sqlite;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

/// Per-test state: a database file in a temporary directory, plus the log
/// of operations sent to it through the engine.
///
/// Every handle opened by the test goes through a [`LoggingDriver`] sharing
/// the same log.
pub struct DbTest {
    dir: tempfile::TempDir,
    ops_log: OpsLog,
    fail_on: FailOn,
}

impl DbTest {
    pub fn new() -> Self {
        crate::init_tracing();

        Self {
            dir: tempfile::tempdir().expect("failed to create a temporary directory"),
            ops_log: Arc::new(Mutex::new(Vec::new())),
            fail_on: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("test.ecdb")
    }

    /// Opens the test database with the default configuration.
    pub async fn setup_db(&mut self) -> Db {
        self.setup_db_with(Config::default()).await
    }

    pub async fn setup_db_with(&mut self, config: Config) -> Db {
        self.try_setup_db(config).await.unwrap()
    }

    pub async fn try_setup_db(&mut self, config: Config) -> ecmap::Result<Db> {
        let driver = LoggingDriver::new(
            Box::new(Sqlite::open(self.path())),
            self.ops_log.clone(),
            self.fail_on.clone(),
        );

        let mut builder = Db::builder();
        builder.config(config);
        let db = builder.build(driver).await?;

        // Opening the database is not part of what tests assert on.
        self.log().clear();

        Ok(db)
    }

    pub fn log(&self) -> ExecLog {
        ExecLog::new(self.ops_log.clone())
    }

    /// Makes the next statement whose SQL contains `fragment` fail.
    pub fn fail_on(&self, fragment: &str) {
        *self.fail_on.lock().unwrap() = Some(fragment.to_string());
    }

    /// Runs SQL directly against the database file.
    pub fn exec_raw(&self, sql: &str) {
        let connection = rusqlite::Connection::open(self.path()).unwrap();
        connection.execute_batch(sql).unwrap();
    }

    /// Column names of `table`, read directly from the database file.
    pub fn raw_columns(&self, table: &str) -> Vec<String> {
        let connection = rusqlite::Connection::open(self.path()).unwrap();
        let mut stmt = connection
            .prepare(&format!("PRAGMA table_info(\"{table}\")"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    /// One column of every row of `table`, ordered by `Id`.
    pub fn raw_values(&self, table: &str, column: &str) -> Vec<rusqlite::types::Value> {
        let connection = rusqlite::Connection::open(self.path()).unwrap();
        let mut stmt = connection
            .prepare(&format!(
                "SELECT \"{column}\" FROM \"{table}\" ORDER BY \"Id\""
            ))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, rusqlite::types::Value>(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    pub fn table_exists(&self, table: &str) -> bool {
        !self.raw_columns(table).is_empty()
    }
}

impl Default for DbTest {
    fn default() -> Self {
        Self::new()
    }
}
