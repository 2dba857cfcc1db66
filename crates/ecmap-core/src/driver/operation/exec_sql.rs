use super::Operation;

use crate::stmt;

#[derive(Debug, Clone)]
pub struct ExecSql {
    /// The serialized SQL statement
    pub sql: String,

    /// Positional parameters, bound as `?1`, `?2`, ...
    pub params: Vec<stmt::Value>,
}

impl ExecSql {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: vec![],
        }
    }

    /// Returns `true` when the statement changes the physical layout.
    pub fn is_ddl(&self) -> bool {
        let sql = self.sql.trim_start();
        ["CREATE ", "ALTER ", "DROP "]
            .iter()
            .any(|prefix| sql.starts_with(prefix))
    }
}

impl From<ExecSql> for Operation {
    fn from(value: ExecSql) -> Self {
        Self::ExecSql(value)
    }
}
