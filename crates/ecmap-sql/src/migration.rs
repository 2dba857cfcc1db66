use ecmap_core::{
    driver::Capability,
    schema::db::{ColumnsDiffItem, IndicesDiffItem, Schema, SchemaDiff, TablesDiffItem},
};

use crate::stmt::Statement;

/// A DDL statement bringing the database from one layout to the next,
/// paired with the layout it is serialized against.
pub struct MigrationStatement<'a> {
    statement: Statement,
    schema: &'a Schema,
}

impl<'a> MigrationStatement<'a> {
    /// Tables are created before columns are added, and columns before
    /// indices, so a statement never references an object that does not
    /// exist yet.
    pub fn from_diff(schema_diff: &SchemaDiff<'a>, capability: &Capability) -> Vec<Self> {
        let schema = schema_diff.next();
        let mut tables = vec![];
        let mut columns = vec![];
        let mut indices = vec![];

        for table in schema_diff.tables().iter() {
            match table {
                TablesDiffItem::CreateTable(table) => {
                    tables.push(Statement::create_table(table, capability));
                    for index in &table.indices {
                        indices.push(Statement::create_index(index, capability));
                    }
                }
                TablesDiffItem::AlterTable {
                    columns: columns_diff,
                    indices: indices_diff,
                    ..
                } => {
                    for item in columns_diff.iter() {
                        match item {
                            ColumnsDiffItem::AddColumn(column) => {
                                columns.push(Statement::add_column(column, capability));
                            }
                        }
                    }

                    for item in indices_diff.iter() {
                        match item {
                            IndicesDiffItem::CreateIndex(index) => {
                                indices.push(Statement::create_index(index, capability));
                            }
                        }
                    }
                }
            }
        }

        tables
            .into_iter()
            .chain(columns)
            .chain(indices)
            .map(|statement| MigrationStatement { statement, schema })
            .collect()
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }
}
