use super::{Expr, Statement};

use ecmap_core::schema::db::{ColumnId, TableId};

#[derive(Debug, Clone)]
pub struct Update {
    pub table: TableId,
    pub assignments: Vec<Assignment>,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub column: ColumnId,
    pub value: Expr,
}

impl Statement {
    pub fn update(
        table: TableId,
        assignments: impl IntoIterator<Item = (ColumnId, Expr)>,
        filter: impl Into<Option<Expr>>,
    ) -> Self {
        Update {
            table,
            assignments: assignments
                .into_iter()
                .map(|(column, value)| Assignment { column, value })
                .collect(),
            filter: filter.into(),
        }
        .into()
    }
}

impl From<Update> for Statement {
    fn from(value: Update) -> Self {
        Self::Update(value)
    }
}
