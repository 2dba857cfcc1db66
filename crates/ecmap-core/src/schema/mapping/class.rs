use super::MapStrategy;
use crate::schema::{
    db::{ColumnId, TableId},
    ec::{PrimitiveType, QualifiedName},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a class is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMap {
    pub class: QualifiedName,

    /// Value stored in `ECClassId` columns. Never reused.
    pub id: i64,

    pub strategy: MapStrategy,

    /// Table holding the class's rows (the root table of a shared hierarchy).
    /// `None` when the class is not mapped and for foreign key relationships.
    pub table: Option<TableId>,

    /// Joined table receiving the properties this class introduces, when the
    /// class sits below a `JoinedTablePerDirectSubclass` level.
    pub joined_table: Option<TableId>,

    /// Properties introduced by this class use shared columns.
    pub share_own_properties: bool,

    /// Properties introduced by subclasses use shared columns.
    pub share_subclass_properties: bool,

    /// Direct subclasses get their own joined table.
    pub joined_table_per_direct_subclass: bool,

    /// Every visible property, inherited ones included.
    pub properties: IndexMap<String, PropertyMap>,
}

/// Where a property's values live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    pub name: String,

    /// Class that allocated the columns: the declaring class, or for an
    /// override the class whose declaration was first mapped.
    pub declared_by: QualifiedName,

    /// One entry per stored value.
    pub columns: Vec<PropertyColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyColumn {
    /// Access path of the stored value: `S1`, `P.X`, `Origin.Y`, `Parent.Id`.
    pub access: String,

    pub column: ColumnId,

    pub value: ColumnValue,
}

/// What kind of value a property column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnValue {
    Primitive(PrimitiveType),

    /// One coordinate of a point.
    Coordinate,

    /// JSON text holding an array.
    Array,

    /// Instance id of a navigation property's related instance.
    NavigationId,

    /// Relationship class id of a navigation property.
    NavigationRelClassId,
}

impl ClassMap {
    pub fn new(class: QualifiedName, id: i64, strategy: MapStrategy) -> Self {
        Self {
            class,
            id,
            strategy,
            table: None,
            joined_table: None,
            share_own_properties: false,
            share_subclass_properties: false,
            joined_table_per_direct_subclass: false,
            properties: IndexMap::new(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.table.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMap> {
        self.properties.get(name)
    }

    /// Table receiving properties this class introduces.
    pub fn property_table(&self) -> Option<TableId> {
        self.joined_table.or(self.table)
    }

    /// All tables a row of this class touches, root first.
    pub fn tables(&self) -> Vec<TableId> {
        self.table.into_iter().chain(self.joined_table).collect()
    }

    /// Columns of every property, by access path.
    pub fn columns(&self) -> impl Iterator<Item = &PropertyColumn> + '_ {
        self.properties
            .values()
            .flat_map(|property| property.columns.iter())
    }
}

impl PropertyMap {
    pub fn column_ids(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.columns.iter().map(|column| column.column)
    }
}
