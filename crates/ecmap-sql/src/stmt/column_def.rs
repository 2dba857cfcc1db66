use ecmap_core::{
    driver,
    schema::{
        db::{self, Column, ForeignKey},
        ec::Collation,
    },
};

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,

    /// `None` declares the column without a type.
    pub ty: Option<db::Type>,

    pub primary_key: bool,
    pub not_null: bool,
    pub collation: Option<Collation>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub(crate) fn from_schema(column: &Column, storage_types: &driver::StorageTypes) -> ColumnDef {
        let ty = if column.is_shared() {
            storage_types.shared_column_type
        } else {
            column.storage_ty
        };

        ColumnDef {
            name: column.name.clone(),
            ty,
            primary_key: column.primary_key,
            not_null: !column.nullable && !column.primary_key,
            collation: column.collation,
            references: column.references.clone(),
        }
    }
}
