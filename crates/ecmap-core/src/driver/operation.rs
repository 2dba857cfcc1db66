mod describe_table;
pub use describe_table::{DescribeTable, TableColumnInfo};

mod exec_sql;
pub use exec_sql::ExecSql;

mod query_sql;
pub use query_sql::QuerySql;

mod transaction;
pub use transaction::Transaction;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Describe the columns of a physical table
    DescribeTable(DescribeTable),

    /// Execute a SQL statement that returns no rows
    ExecSql(ExecSql),

    /// Execute a SQL query
    QuerySql(QuerySql),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),
}

impl Operation {
    pub fn is_ddl(&self) -> bool {
        match self {
            Operation::ExecSql(op) => op.is_ddl(),
            _ => false,
        }
    }
}
