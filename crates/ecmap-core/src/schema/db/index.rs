use super::{ColumnId, TableId};

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// Uniquely identifies the index within the layout
    pub id: IndexId,

    /// Index name is unique within the database
    pub name: String,

    /// Indexed columns, in order.
    pub columns: Vec<ColumnId>,

    /// When `true`, indexed entries are unique
    pub unique: bool,

    /// When `true`, rows with a NULL in any indexed column are left out.
    pub where_not_null: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct IndexId {
    pub table: TableId,
    pub index: usize,
}

impl fmt::Debug for IndexId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "IndexId({}/{})", self.table.0, self.index)
    }
}

/// Indices appended to an existing table.
pub struct IndicesDiff<'a> {
    items: Vec<IndicesDiffItem<'a>>,
}

pub enum IndicesDiffItem<'a> {
    CreateIndex(&'a Index),
}

impl<'a> IndicesDiff<'a> {
    pub fn from(from: &'a [Index], to: &'a [Index]) -> crate::Result<Self> {
        if to.len() < from.len() || from.iter().zip(to).any(|(from, to)| from != to) {
            return Err(crate::err!("indices are append-only"));
        }

        Ok(Self {
            items: to[from.len()..]
                .iter()
                .map(IndicesDiffItem::CreateIndex)
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &IndicesDiffItem<'a>> + '_ {
        self.items.iter()
    }
}
