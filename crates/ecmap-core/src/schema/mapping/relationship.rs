use crate::schema::{
    db::{ColumnId, IndexId, TableId},
    ec::{End, ForeignKeyAction, QualifiedName},
};

use serde::{Deserialize, Serialize};

/// How relationship instances are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationshipMap {
    EndTable(EndTableMap),
    LinkTable(LinkTableMap),
}

/// Foreign key columns in the table of one end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndTableMap {
    /// End whose table holds the columns. The foreign key points at the
    /// other end's instance.
    pub host_end: End,

    pub host_table: TableId,

    pub foreign_key: ColumnId,

    pub rel_class_id: ColumnId,

    /// Navigation property owning the columns, if any.
    pub navigation: Option<(QualifiedName, String)>,

    /// `REFERENCES` action, when referential integrity is enforced.
    pub constraint: Option<ForeignKeyAction>,

    pub unique_index: Option<IndexId>,
}

/// A dedicated table of (source, target) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTableMap {
    pub table: TableId,
    pub source_id: ColumnId,
    pub source_class_id: ColumnId,
    pub target_id: ColumnId,
    pub target_class_id: ColumnId,
    pub allow_duplicates: bool,

    /// Unique index over (source id, target id).
    pub unique_index: Option<IndexId>,
}

impl RelationshipMap {
    pub fn is_end_table(&self) -> bool {
        matches!(self, RelationshipMap::EndTable(_))
    }

    pub fn as_end_table(&self) -> Option<&EndTableMap> {
        match self {
            RelationshipMap::EndTable(map) => Some(map),
            RelationshipMap::LinkTable(_) => None,
        }
    }

    pub fn as_link_table(&self) -> Option<&LinkTableMap> {
        match self {
            RelationshipMap::LinkTable(map) => Some(map),
            RelationshipMap::EndTable(_) => None,
        }
    }

    /// Table storing the relationship instances.
    pub fn table(&self) -> TableId {
        match self {
            RelationshipMap::EndTable(map) => map.host_table,
            RelationshipMap::LinkTable(map) => map.table,
        }
    }
}

impl EndTableMap {
    /// End the foreign key points at.
    pub fn referenced_end(&self) -> End {
        self.host_end.opposite()
    }
}
