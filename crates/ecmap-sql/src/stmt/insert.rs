use super::{Statement, Value};

use ecmap_core::schema::db::{ColumnId, TableId};

/// Inserts one row.
#[derive(Debug, Clone)]
pub struct Insert {
    pub table: TableId,
    pub columns: Vec<ColumnId>,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn insert(table: TableId, row: impl IntoIterator<Item = (ColumnId, Value)>) -> Self {
        let (columns, values) = row.into_iter().unzip();
        Insert {
            table,
            columns,
            values,
        }
        .into()
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
