use super::Statement;

use ecmap_core::{
    driver::Capability,
    schema::db::{ColumnId, Index, TableId},
};

#[derive(Debug, Clone)]
pub struct CreateIndex {
    /// Name of the index
    pub name: String,

    /// Which table to index
    pub on: TableId,

    /// The columns to index
    pub columns: Vec<ColumnId>,

    /// When true, the index is unique
    pub unique: bool,

    /// Leave out rows with NULL in any indexed column.
    pub where_not_null: bool,
}

impl Statement {
    pub fn create_index(index: &Index, capability: &Capability) -> Self {
        CreateIndex {
            name: index.name.clone(),
            on: index.id.table,
            columns: index.columns.clone(),
            unique: index.unique,
            where_not_null: index.where_not_null && capability.partial_indices,
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
