use serde::{Deserialize, Serialize};

use std::fmt;

/// Resolved physical representation of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    NotMapped,
    OwnTable,
    SharedTable,
    ExistingTable,

    /// Relationship stored as a foreign key in the target end's table.
    ForeignKeyRelationshipInTargetTable,

    /// Relationship stored as a foreign key in the source end's table.
    ForeignKeyRelationshipInSourceTable,
}

/// Map strategy options. No option set is `None`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapOptions {
    /// Instances of the class cannot be inserted.
    pub readonly: bool,

    /// Properties of the class and its subclasses use shared columns.
    pub shared_columns: bool,

    /// Properties of subclasses use shared columns.
    pub shared_columns_for_subclasses: bool,
}

/// A resolved strategy with its options and polymorphism flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapStrategy {
    pub strategy: Strategy,
    pub options: MapOptions,
    pub polymorphic: bool,
}

impl Strategy {
    pub fn is_not_mapped(self) -> bool {
        self == Strategy::NotMapped
    }

    /// True for the two foreign key relationship strategies.
    pub fn is_end_table(self) -> bool {
        matches!(
            self,
            Strategy::ForeignKeyRelationshipInTargetTable
                | Strategy::ForeignKeyRelationshipInSourceTable
        )
    }
}

impl MapOptions {
    pub fn is_none(&self) -> bool {
        *self == MapOptions::default()
    }

    pub fn any_shared_columns(&self) -> bool {
        self.shared_columns || self.shared_columns_for_subclasses
    }
}

impl MapStrategy {
    pub const NOT_MAPPED: MapStrategy = MapStrategy::new(Strategy::NotMapped, false);

    pub const fn new(strategy: Strategy, polymorphic: bool) -> Self {
        Self {
            strategy,
            options: MapOptions {
                readonly: false,
                shared_columns: false,
                shared_columns_for_subclasses: false,
            },
            polymorphic,
        }
    }

    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_not_mapped(&self) -> bool {
        self.strategy.is_not_mapped()
    }

    /// True for a polymorphic `SharedTable`, i.e. table per hierarchy.
    pub fn is_table_per_hierarchy(&self) -> bool {
        self.strategy == Strategy::SharedTable && self.polymorphic
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = vec![];
        if self.readonly {
            names.push("Readonly");
        }
        if self.shared_columns {
            names.push("SharedColumns");
        }
        if self.shared_columns_for_subclasses {
            names.push("SharedColumnsForSubclasses");
        }

        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

impl fmt::Display for MapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.strategy)?;
        if self.polymorphic {
            f.write_str(" (polymorphic)")?;
        }
        if !self.options.is_none() {
            write!(f, " [{}]", self.options)?;
        }
        Ok(())
    }
}
