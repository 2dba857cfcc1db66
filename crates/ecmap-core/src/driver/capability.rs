use crate::schema::db;

#[derive(Debug)]
pub struct Capability {
    /// Column storage types used by the database
    pub storage_types: StorageTypes,

    /// Supports `REFERENCES` on a column added by `ALTER TABLE ... ADD COLUMN`.
    pub add_column_with_reference: bool,

    /// Supports `CREATE INDEX ... WHERE` partial indices.
    pub partial_indices: bool,
}

#[derive(Debug)]
pub struct StorageTypes {
    /// Storage type of shared ("data") columns. `None` declares the column
    /// without a type.
    pub shared_column_type: Option<db::Type>,

    /// Storage type for array and struct-array columns.
    pub array_type: db::Type,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        storage_types: StorageTypes::SQLITE,
        add_column_with_reference: true,
        partial_indices: true,
    };
}

impl StorageTypes {
    pub const SQLITE: StorageTypes = StorageTypes {
        shared_column_type: None,
        array_type: db::Type::Text,
    };
}
