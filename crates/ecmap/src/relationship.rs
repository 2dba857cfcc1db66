use ecmap_core::schema::{
    ec::{ClassId, End, MapDirectives, Relationship, SchemaSet, StrategyRequest},
    mapping::Strategy,
};

/// How a relationship class is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Foreign key and relationship class id columns in the table of `host`.
    /// `unique` adds a unique index over the foreign key column.
    ForeignKey { host: End, unique: bool },

    /// A table of (source, target) pairs.
    LinkTable { allow_duplicates: bool },
}

/// Selections of a relationship class and of its base class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipRequest {
    pub selection: Selection,
    pub base: Option<Selection>,
}

impl Selection {
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Selection::ForeignKey { .. })
    }

    /// The end-table strategy, if the selection is a foreign key.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Selection::ForeignKey { host: End::Target, .. } => {
                Some(Strategy::ForeignKeyRelationshipInTargetTable)
            }
            Selection::ForeignKey { host: End::Source, .. } => {
                Some(Strategy::ForeignKeyRelationshipInSourceTable)
            }
            Selection::LinkTable { .. } => None,
        }
    }
}

/// Chooses the representation from the multiplicity upper bounds and the
/// directives of the root of the relationship hierarchy.
///
/// | source | target | directives                          | selection              |
/// |--------|--------|-------------------------------------|------------------------|
/// | N      | N      | any                                 | link table             |
/// | 1      | 1      | AllowDuplicateRelationships         | FK in source           |
/// | any    | any    | link table directive or table request | link table           |
/// | 1      | N      | none                                | FK in target           |
/// | N      | 1      | none                                | FK in source           |
/// | 1      | 1      | none                                | FK in target, unique   |
pub fn select(relationship: &Relationship, directives: &MapDirectives) -> Selection {
    let source_single = relationship.source.multiplicity.is_single();
    let target_single = relationship.target.multiplicity.is_single();

    let allow_duplicates = directives
        .link_table
        .as_ref()
        .is_some_and(|link_table| link_table.allow_duplicate_relationships);

    let requests_table = directives.link_table.is_some()
        || matches!(
            directives.strategy,
            Some(
                StrategyRequest::OwnTable
                    | StrategyRequest::SharedTable
                    | StrategyRequest::TablePerHierarchy
            )
        );

    match (source_single, target_single) {
        (false, false) => Selection::LinkTable { allow_duplicates },
        (true, true) if allow_duplicates => Selection::ForeignKey {
            host: End::Source,
            unique: false,
        },
        _ if requests_table => Selection::LinkTable { allow_duplicates },
        (true, false) => Selection::ForeignKey {
            host: End::Target,
            unique: false,
        },
        (false, true) => Selection::ForeignKey {
            host: End::Source,
            unique: false,
        },
        (true, true) => Selection::ForeignKey {
            host: End::Target,
            unique: true,
        },
    }
}

/// Selections for relationship class `id` and its base, using the
/// directives of the hierarchy root. `None` for other classes.
pub fn select_in(set: &SchemaSet<'_>, id: ClassId) -> Option<RelationshipRequest> {
    let relationship = set.entry(id).class.relationship()?;

    let root = set.ancestors(id).last().copied().unwrap_or(id);
    let directives = &set.entry(root).class.map;

    let base = set
        .parent(id)
        .and_then(|parent| set.entry(parent).class.relationship())
        .map(|base| select(base, directives));

    Some(RelationshipRequest {
        selection: select(relationship, directives),
        base,
    })
}
