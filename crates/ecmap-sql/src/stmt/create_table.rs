use super::{ColumnDef, Statement};

use ecmap_core::{
    driver::Capability,
    schema::db::{Table, TableId},
};

#[derive(Debug, Clone)]
pub struct CreateTable {
    /// Table being created
    pub table: TableId,

    /// Column definitions
    pub columns: Vec<ColumnDef>,
}

impl Statement {
    pub fn create_table(table: &Table, capability: &Capability) -> Self {
        CreateTable {
            table: table.id,
            columns: table
                .columns
                .iter()
                .map(|column| ColumnDef::from_schema(column, &capability.storage_types))
                .collect(),
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
