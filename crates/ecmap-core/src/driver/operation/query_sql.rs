use super::Operation;

use crate::stmt;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The serialized SQL query
    pub sql: String,

    /// Positional parameters, bound as `?1`, `?2`, ...
    pub params: Vec<stmt::Value>,

    /// The type of each returned column
    pub ret: Vec<stmt::Type>,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
