use super::{TableId, Type};
use crate::schema::ec::{Collation, ForeignKeyAction};

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Uniquely identifies the column in the layout.
    pub id: ColumnId,

    /// The name of the column in the database.
    pub name: String,

    pub kind: ColumnKind,

    /// The declared storage type. `None` declares the column without a
    /// type, which is how shared columns are created.
    pub storage_ty: Option<Type>,

    /// Whether or not the column is nullable
    pub nullable: bool,

    /// True for the `Id` column
    pub primary_key: bool,

    pub collation: Option<Collation>,

    /// Foreign key constraint declared on the column.
    pub references: Option<ForeignKey>,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

/// What a column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Instance id. In joined tables it also references the parent table.
    InstanceId,

    /// Class id of the row's class.
    ClassId,

    /// Column owned by a single property.
    Dedicated,

    /// Column of the table's shared pool. `slot` is zero based.
    Shared { slot: usize },

    /// Instance id of the related instance of an end-table relationship.
    ForeignKey,

    /// Relationship class id of an end-table relationship.
    RelClassId,

    SourceId,
    SourceClassId,
    TargetId,
    TargetClassId,

    /// Column of a table the engine did not create.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: ForeignKeyAction,
}

impl Column {
    pub fn is_shared(&self) -> bool {
        matches!(self.kind, ColumnKind::Shared { .. })
    }

    pub fn slot(&self) -> Option<usize> {
        match self.kind {
            ColumnKind::Shared { slot } => Some(slot),
            _ => None,
        }
    }
}

impl From<&Column> for ColumnId {
    fn from(value: &Column) -> Self {
        value.id
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({}/{})", self.table.0, self.index)
    }
}

/// Columns appended to an existing table. Columns are never dropped or
/// altered; `from` must be a prefix of `to`.
pub struct ColumnsDiff<'a> {
    items: Vec<ColumnsDiffItem<'a>>,
}

pub enum ColumnsDiffItem<'a> {
    AddColumn(&'a Column),
}

impl<'a> ColumnsDiff<'a> {
    pub fn from(from: &'a [Column], to: &'a [Column]) -> crate::Result<Self> {
        if to.len() < from.len() {
            return Err(crate::err!(
                "layout lost columns ({} -> {})",
                from.len(),
                to.len()
            ));
        }

        for (from, to) in from.iter().zip(to) {
            if from != to {
                return Err(crate::err!(
                    "column `{}` changed to `{}`; columns are append-only",
                    from.name,
                    to.name
                ));
            }
        }

        Ok(Self {
            items: to[from.len()..]
                .iter()
                .map(ColumnsDiffItem::AddColumn)
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ColumnsDiffItem<'a>> + '_ {
        self.items.iter()
    }
}
