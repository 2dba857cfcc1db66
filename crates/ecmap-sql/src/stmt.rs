mod add_column;
pub use add_column::AddColumn;

mod column_def;
pub use column_def::ColumnDef;

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::{BinaryOp, Expr};

mod insert;
pub use insert::Insert;

mod select;
pub use select::Select;

mod update;
pub use update::{Assignment, Update};

pub use ecmap_core::stmt::*;

#[derive(Debug, Clone)]
pub enum Statement {
    AddColumn(AddColumn),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    Delete(Delete),
    Insert(Insert),
    Select(Select),
    Update(Update),
}

impl Statement {
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            Statement::AddColumn(_) | Statement::CreateIndex(_) | Statement::CreateTable(_)
        )
    }

    /// Returns the number of columns the statement returns, if it is a query.
    pub fn returning_len(&self) -> Option<usize> {
        match self {
            Statement::Select(select) => Some(select.columns.len()),
            _ => None,
        }
    }
}
