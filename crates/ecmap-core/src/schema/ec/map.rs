use crate::schema::mapping::MapOptions;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Mapping directives of a class, parsed from the ECDbMap custom attributes
/// (`ClassMap`, `ShareColumns`, `JoinedTablePerDirectSubclass`,
/// `DbIndexList`, `LinkTableRelationshipMap`, `ForeignKeyConstraint`).
///
/// The default value means "no mapping custom attribute present". Mapping
/// directives are fixed at first import.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDirectives {
    /// Explicitly requested strategy.
    pub strategy: Option<StrategyRequest>,

    /// Explicitly requested options.
    pub options: MapOptions,

    /// Explicit table name.
    pub table_name: Option<String>,

    /// Whether the strategy applies to subclasses (polymorphic). `None` uses
    /// the strategy's default: `TablePerHierarchy` is polymorphic, everything
    /// else is not.
    pub polymorphic: Option<bool>,

    /// Restrict column sharing to properties of subclasses.
    pub apply_to_subclasses_only: bool,

    /// Each direct subclass gets its own joined table.
    pub joined_table_per_direct_subclass: bool,

    /// Opt this class (and its subclasses) out of an inherited shared
    /// column policy.
    pub disable_shared_columns: bool,

    /// Number of shared columns created up front.
    pub shared_column_count: Option<u32>,

    /// Name of the instance id column of an existing table.
    pub instance_id_column: Option<String>,

    pub indexes: Vec<DbIndex>,

    /// Relationship classes only.
    pub link_table: Option<LinkTableDirectives>,

    /// Relationship classes only: enforce referential integrity.
    pub foreign_key: Option<ForeignKeyDirectives>,
}

/// A strategy as requested by a `ClassMap` custom attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyRequest {
    NotMapped,
    OwnTable,
    SharedTable,
    ExistingTable,

    /// Shorthand for polymorphic `SharedTable`.
    TablePerHierarchy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbIndex {
    /// Index name. Generated from the class and property names when absent.
    pub name: Option<String>,
    pub properties: Vec<String>,
    pub unique: bool,
    pub where_not_null: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTableDirectives {
    pub allow_duplicate_relationships: bool,
    pub source_column: Option<String>,
    pub target_column: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDirectives {
    pub on_delete: ForeignKeyAction,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    Restrict,
}

/// Mapping directives of a property (`PropertyMap` custom attribute).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMapDirectives {
    pub column_name: Option<String>,
    pub unique: bool,
    pub collation: Option<Collation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collation {
    Binary,
    NoCase,
    RTrim,
}

impl MapDirectives {
    pub fn is_empty(&self) -> bool {
        *self == MapDirectives::default()
    }

    pub fn not_mapped() -> Self {
        Self::strategy(StrategyRequest::NotMapped)
    }

    pub fn own_table() -> Self {
        Self::strategy(StrategyRequest::OwnTable)
    }

    pub fn table_per_hierarchy() -> Self {
        Self::strategy(StrategyRequest::TablePerHierarchy)
    }

    pub fn shared_table(table_name: impl Into<String>) -> Self {
        Self::strategy(StrategyRequest::SharedTable).table_name(table_name)
    }

    pub fn existing_table(table_name: impl Into<String>) -> Self {
        Self::strategy(StrategyRequest::ExistingTable).table_name(table_name)
    }

    pub fn strategy(strategy: StrategyRequest) -> Self {
        Self {
            strategy: Some(strategy),
            ..Self::default()
        }
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn polymorphic(mut self, polymorphic: bool) -> Self {
        self.polymorphic = Some(polymorphic);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.options.readonly = true;
        self
    }

    pub fn shared_columns(mut self) -> Self {
        self.options.shared_columns = true;
        self
    }

    pub fn shared_columns_for_subclasses(mut self) -> Self {
        self.options.shared_columns_for_subclasses = true;
        self
    }

    pub fn apply_to_subclasses_only(mut self) -> Self {
        self.apply_to_subclasses_only = true;
        self
    }

    pub fn joined_table_per_direct_subclass(mut self) -> Self {
        self.joined_table_per_direct_subclass = true;
        self
    }

    pub fn disable_shared_columns(mut self) -> Self {
        self.disable_shared_columns = true;
        self
    }

    pub fn shared_column_count(mut self, count: u32) -> Self {
        self.shared_column_count = Some(count);
        self
    }

    pub fn instance_id_column(mut self, column: impl Into<String>) -> Self {
        self.instance_id_column = Some(column.into());
        self
    }

    pub fn index(mut self, index: DbIndex) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn link_table(mut self, link_table: LinkTableDirectives) -> Self {
        self.link_table = Some(link_table);
        self
    }

    pub fn allow_duplicate_relationships(mut self) -> Self {
        self.link_table
            .get_or_insert_with(LinkTableDirectives::default)
            .allow_duplicate_relationships = true;
        self
    }

    pub fn foreign_key(mut self, on_delete: ForeignKeyAction) -> Self {
        self.foreign_key = Some(ForeignKeyDirectives { on_delete });
        self
    }

    /// True when the polymorphic flag resolves to `true` for `strategy`.
    pub fn is_polymorphic(&self) -> bool {
        self.polymorphic
            .unwrap_or(self.strategy == Some(StrategyRequest::TablePerHierarchy))
    }

    /// True when any column sharing option is requested.
    pub fn requests_shared_columns(&self) -> bool {
        self.options.shared_columns || self.options.shared_columns_for_subclasses
    }
}

impl DbIndex {
    pub fn new(properties: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: None,
            properties: properties.into_iter().map(Into::into).collect(),
            unique: false,
            where_not_null: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn where_not_null(mut self) -> Self {
        self.where_not_null = true;
        self
    }
}

impl fmt::Display for StrategyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::Restrict => "RESTRICT",
        })
    }
}

impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Collation::Binary => "BINARY",
            Collation::NoCase => "NOCASE",
            Collation::RTrim => "RTRIM",
        })
    }
}
