use crate::logging_driver::OpsLog;
use ecmap_core::driver::{operation::Transaction, Operation};

/// A view over the operations log for assertions
pub struct ExecLog {
    ops: OpsLog,
}

impl ExecLog {
    pub(crate) fn new(ops: OpsLog) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Check if any operation matches the given predicate
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .any(|op| predicate(&op.operation))
    }

    /// Count operations matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(&op.operation))
            .count()
    }

    /// SQL text of every executed statement, in order.
    pub fn exec_sql(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match &op.operation {
                Operation::ExecSql(exec) => Some(exec.sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_ddl(&self) -> bool {
        self.exec_sql()
            .iter()
            .any(|sql| sql.starts_with("CREATE ") || sql.starts_with("ALTER TABLE "))
    }

    pub fn has_transaction(&self, transaction: Transaction) -> bool {
        self.any(|op| matches!(op, Operation::Transaction(t) if *t == transaction))
    }

    /// Number of operations that returned an error.
    pub fn failures(&self) -> usize {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.response.is_none())
            .count()
    }

    pub fn clear(&mut self) {
        self.ops.lock().unwrap().clear();
    }
}
