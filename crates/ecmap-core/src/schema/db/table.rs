use super::{
    column::ColumnsDiff, index::IndicesDiff, Column, ColumnId, ColumnKind, Index, IndexId,
};

use serde::{Deserialize, Serialize};

use std::fmt;

/// A database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Uniquely identifies a table
    pub id: TableId,

    /// Name of the table
    pub name: String,

    pub kind: TableKind,

    /// Table this one is joined to by `Id`, for joined tables.
    pub parent: Option<TableId>,

    /// The table's columns
    pub columns: Vec<Column>,

    pub indices: Vec<Index>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Created by the engine.
    Primary,

    /// Continuation of a primary table, sharing its instance ids.
    Joined,

    /// Created outside the engine; never altered.
    Existing,
}

/// Uniquely identifies a table
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

impl Table {
    pub fn new(id: TableId, name: String, kind: TableKind) -> Self {
        Self {
            id,
            name,
            kind,
            parent: None,
            columns: vec![],
            indices: vec![],
        }
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        &self.columns[id.into().index]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_by_name(name).is_some()
    }

    pub fn instance_id_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.kind == ColumnKind::InstanceId)
    }

    pub fn class_id_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.kind == ColumnKind::ClassId)
    }

    /// Columns of the shared pool, in slot order.
    pub fn shared_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|column| column.is_shared())
    }

    pub fn index_by_name(&self, name: &str) -> Option<&Index> {
        self.indices.iter().find(|index| index.name == name)
    }

    /// Appends a column, assigning its id.
    pub fn push_column(&mut self, mut column: Column) -> ColumnId {
        let id = ColumnId {
            table: self.id,
            index: self.columns.len(),
        };
        column.id = id;
        self.columns.push(column);
        id
    }

    /// Appends an index, assigning its id.
    pub fn push_index(&mut self, mut index: Index) -> IndexId {
        let id = IndexId {
            table: self.id,
            index: self.indices.len(),
        };
        index.id = id;
        self.indices.push(index);
        id
    }

    pub fn is_existing(&self) -> bool {
        self.kind == TableKind::Existing
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}

/// Changes to the set of tables. Tables are only ever created or extended.
pub struct TablesDiff<'a> {
    items: Vec<TablesDiffItem<'a>>,
}

pub enum TablesDiffItem<'a> {
    CreateTable(&'a Table),
    AlterTable {
        from: &'a Table,
        to: &'a Table,
        columns: ColumnsDiff<'a>,
        indices: IndicesDiff<'a>,
    },
}

impl<'a> TablesDiff<'a> {
    pub fn from(from: &'a [Table], to: &'a [Table]) -> crate::Result<Self> {
        if to.len() < from.len() {
            return Err(crate::err!("layout lost tables; tables are never dropped"));
        }

        let mut items = vec![];

        for (from, to) in from.iter().zip(to) {
            if from.id != to.id || from.name != to.name || from.kind != to.kind {
                return Err(crate::err!(
                    "table `{}` changed identity to `{}`",
                    from.name,
                    to.name
                ));
            }

            if to.is_existing() {
                continue;
            }

            let columns = ColumnsDiff::from(&from.columns, &to.columns)?;
            let indices = IndicesDiff::from(&from.indices, &to.indices)?;
            if !columns.is_empty() || !indices.is_empty() {
                items.push(TablesDiffItem::AlterTable {
                    from,
                    to,
                    columns,
                    indices,
                });
            }
        }

        // Tables are appended in creation order, so parents precede the
        // tables joined to them.
        for to in &to[from.len()..] {
            if !to.is_existing() {
                items.push(TablesDiffItem::CreateTable(to));
            }
        }

        Ok(Self { items })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TablesDiffItem<'a>> + '_ {
        self.items.iter()
    }
}
