mod class;
pub use class::{ClassMap, ColumnValue, PropertyColumn, PropertyMap};

mod pool;
pub use pool::{SharedPool, SlotClaim};

mod relationship;
pub use relationship::{EndTableMap, LinkTableMap, RelationshipMap};

mod strategy;
pub use strategy::{MapOptions, MapStrategy, Strategy};

use super::{db::TableId, ec::QualifiedName};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The mapping view: how every persisted class and relationship is stored.
///
/// This is the sole contract between schema import and instance access.
/// Entries are added as classes are imported and removed when classes are
/// deleted; the tables and columns they pointed at stay in the layout.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(with = "indexmap::map::serde_seq")]
    pub classes: IndexMap<QualifiedName, ClassMap>,

    #[serde(with = "indexmap::map::serde_seq")]
    pub relationships: IndexMap<QualifiedName, RelationshipMap>,

    /// Shared column pools, one per table that has one.
    pub pools: Vec<SharedPool>,

    /// Next `ECClassId` to hand out.
    pub next_class_id: i64,
}

impl Mapping {
    pub fn class(&self, name: &QualifiedName) -> Option<&ClassMap> {
        self.classes.get(name)
    }

    pub fn class_mut(&mut self, name: &QualifiedName) -> Option<&mut ClassMap> {
        self.classes.get_mut(name)
    }

    pub fn class_by_id(&self, id: i64) -> Option<&ClassMap> {
        self.classes.values().find(|class| class.id == id)
    }

    pub fn relationship(&self, name: &QualifiedName) -> Option<&RelationshipMap> {
        self.relationships.get(name)
    }

    pub fn pool(&self, table: TableId) -> Option<&SharedPool> {
        self.pools.iter().find(|pool| pool.table == table)
    }

    pub fn pool_mut(&mut self, table: TableId) -> Option<&mut SharedPool> {
        self.pools.iter_mut().find(|pool| pool.table == table)
    }

    /// Hands out a fresh class id.
    pub fn allocate_class_id(&mut self) -> i64 {
        self.next_class_id += 1;
        self.next_class_id
    }

    /// Classes whose rows live in `table`, either as root or joined table.
    pub fn classes_in_table(&self, table: TableId) -> impl Iterator<Item = &ClassMap> + '_ {
        self.classes
            .values()
            .filter(move |class| class.table == Some(table) || class.joined_table == Some(table))
    }
}
