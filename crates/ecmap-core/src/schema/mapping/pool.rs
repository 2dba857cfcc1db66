use crate::schema::{db::TableId, ec::QualifiedName};

use serde::{Deserialize, Serialize};

/// Bookkeeping of a table's shared column pool.
///
/// Slots are zero based; slot `n` is the column named `ps<n+1>`. The pool
/// only grows. Every property that ever used a slot leaves a claim behind,
/// which is retired (not removed) when the property or its class is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedPool {
    pub table: TableId,

    /// Columns created up front, from `SharedColumnCount`.
    pub fixed_count: Option<u32>,

    /// Number of slots (shared columns) in the table.
    pub size: usize,

    pub claims: Vec<SlotClaim>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotClaim {
    pub slot: usize,

    /// Class declaring the property.
    pub class: QualifiedName,

    /// Access path of the value stored in the slot, e.g. `S1` or `Origin.X`.
    pub property: String,

    /// Hierarchy of `class`, root first.
    pub lineage: Vec<QualifiedName>,

    pub retired: bool,
}

impl SharedPool {
    pub fn new(table: TableId, fixed_count: Option<u32>) -> Self {
        Self {
            table,
            fixed_count,
            size: 0,
            claims: vec![],
        }
    }

    /// Whether `slot` can be claimed by a class with `lineage`.
    pub fn is_available(&self, slot: usize, lineage: &[QualifiedName]) -> bool {
        self.claims
            .iter()
            .filter(|claim| claim.slot == slot)
            .all(|claim| !claim.retired && !same_line(&claim.lineage, lineage))
    }

    /// Lowest existing slot available to `lineage`.
    pub fn find_available(&self, lineage: &[QualifiedName]) -> Option<usize> {
        (0..self.size).find(|slot| self.is_available(*slot, lineage))
    }

    pub fn claim(
        &mut self,
        slot: usize,
        class: &QualifiedName,
        property: &str,
        lineage: &[QualifiedName],
    ) {
        self.claims.push(SlotClaim {
            slot,
            class: class.clone(),
            property: property.to_string(),
            lineage: lineage.to_vec(),
            retired: false,
        });
    }

    /// Retires the live claims of `class` whose property path is `property`
    /// or starts with `property.`. Returns the retired slots.
    pub fn retire(&mut self, class: &QualifiedName, property: &str) -> Vec<usize> {
        let mut slots = vec![];
        for claim in &mut self.claims {
            if !claim.retired && claim.class == *class && is_path_of(&claim.property, property) {
                claim.retired = true;
                slots.push(claim.slot);
            }
        }
        slots
    }

    /// Retires every live claim made by `class`.
    pub fn retire_class(&mut self, class: &QualifiedName) -> Vec<usize> {
        let mut slots = vec![];
        for claim in &mut self.claims {
            if !claim.retired && claim.class == *class {
                claim.retired = true;
                slots.push(claim.slot);
            }
        }
        slots
    }

    pub fn live_claims(&self) -> impl Iterator<Item = &SlotClaim> + '_ {
        self.claims.iter().filter(|claim| !claim.retired)
    }
}

/// True when one lineage is a prefix of the other, i.e. the classes are the
/// same or one derives from the other.
fn same_line(a: &[QualifiedName], b: &[QualifiedName]) -> bool {
    let len = a.len().min(b.len());
    a[..len] == b[..len]
}

fn is_path_of(path: &str, property: &str) -> bool {
    path == property
        || path
            .strip_prefix(property)
            .is_some_and(|rest| rest.starts_with('.'))
}
