use super::{Expr, Statement};

use ecmap_core::schema::db::TableId;

#[derive(Debug, Clone)]
pub struct Delete {
    pub table: TableId,
    pub filter: Option<Expr>,
}

impl Statement {
    pub fn delete(table: TableId, filter: impl Into<Option<Expr>>) -> Self {
        Delete {
            table,
            filter: filter.into(),
        }
        .into()
    }
}

impl From<Delete> for Statement {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}
