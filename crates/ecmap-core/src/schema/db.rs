mod column;
pub use column::{Column, ColumnId, ColumnKind, ColumnsDiff, ColumnsDiffItem, ForeignKey};

mod index;
pub use index::{Index, IndexId, IndicesDiff, IndicesDiffItem};

mod schema;
pub use schema::{Schema, SchemaDiff};

mod table;
pub use table::{Table, TableId, TableKind, TablesDiff, TablesDiffItem};

mod ty;
pub use ty::Type;
