use super::{Expr, Statement};

use ecmap_core::schema::db::{ColumnId, TableId};

#[derive(Debug, Clone)]
pub struct Select {
    pub table: TableId,
    pub columns: Vec<ColumnId>,
    pub filter: Option<Expr>,
    pub order_by: Option<ColumnId>,
}

impl Select {
    pub fn new(table: TableId, columns: impl IntoIterator<Item = ColumnId>) -> Select {
        Select {
            table,
            columns: columns.into_iter().collect(),
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Expr) -> Select {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: ColumnId) -> Select {
        self.order_by = Some(column);
        self
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}
