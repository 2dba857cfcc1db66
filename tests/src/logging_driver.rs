use ecmap_core::{
    async_trait,
    driver::{Capability, Connection, Driver, Operation, Response, Rows},
    Result,
};
use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};

/// Shared log of the operations that went through a [`LoggingDriver`].
pub type OpsLog = Arc<Mutex<Vec<DriverOp>>>;

/// SQL fragment that makes the next matching statement fail.
pub type FailOn = Arc<Mutex<Option<String>>>;

#[derive(Debug)]
pub struct LoggingDriver {
    inner: Box<dyn Driver>,

    ops_log: OpsLog,

    fail_on: FailOn,
}

impl LoggingDriver {
    pub fn new(driver: Box<dyn Driver>, ops_log: OpsLog, fail_on: FailOn) -> Self {
        Self {
            inner: driver,
            ops_log,
            fail_on,
        }
    }
}

#[async_trait]
impl Driver for LoggingDriver {
    fn url(&self) -> Cow<'_, str> {
        self.inner.url()
    }

    fn capability(&self) -> &'static Capability {
        self.inner.capability()
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        Ok(Box::new(LoggingConnection {
            inner: self.inner.connect().await?,
            ops_log: self.ops_log.clone(),
            fail_on: self.fail_on.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct DriverOp {
    pub operation: Operation,

    /// `None` when the operation failed.
    pub response: Option<Response>,
}

/// A connection wrapper that logs every operation and can inject a failure
#[derive(Debug)]
pub struct LoggingConnection {
    inner: Box<dyn Connection>,

    ops_log: OpsLog,

    fail_on: FailOn,
}

impl LoggingConnection {
    /// Takes the armed failure if `operation` matches it.
    fn should_fail(&self, operation: &Operation) -> bool {
        let Operation::ExecSql(exec) = operation else {
            return false;
        };

        let mut fail_on = self.fail_on.lock().expect("fail_on lock poisoned");
        match fail_on.as_deref() {
            Some(fragment) if exec.sql.contains(fragment) => {
                *fail_on = None;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Connection for LoggingConnection {
    fn capability(&self) -> &'static Capability {
        self.inner.capability()
    }

    async fn exec(&mut self, operation: Operation) -> Result<Response> {
        let logged = operation.clone();

        let result = if self.should_fail(&operation) {
            Err(ecmap_core::err!("injected failure"))
        } else {
            self.inner.exec(operation).await
        };

        let response = result.as_ref().ok().map(duplicate_response);

        self.ops_log
            .lock()
            .expect("Failed to acquire ops log lock")
            .push(DriverOp {
                operation: logged,
                response,
            });

        result
    }
}

fn duplicate_response(response: &Response) -> Response {
    let rows = match &response.rows {
        Rows::Count(count) => Rows::Count(*count),
        Rows::Values(values) => Rows::Values(values.clone()),
    };

    Response { rows }
}
