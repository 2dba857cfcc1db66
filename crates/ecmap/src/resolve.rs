//! Map strategy resolution.
//!
//! A class's requested strategy is checked against an ordered list of rules.
//! The first rule that fails decides the error; the order is part of the
//! contract and can be inspected with [`rules`].

use crate::relationship::{RelationshipRequest, Selection};

use ecmap_core::{
    driver::operation::TableColumnInfo,
    schema::{
        ec::{Class, ClassType, QualifiedName, StrategyRequest},
        mapping::{MapOptions, MapStrategy, Strategy},
    },
    Error, Result,
};

use indexmap::IndexMap;

/// Physical tables named by mapping directives, as described by the
/// database. Names match case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct ExistingTables {
    tables: IndexMap<String, (String, Vec<TableColumnInfo>)>,
}

/// Input of [`resolve`].
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub name: &'a QualifiedName,

    pub class: &'a Class,

    /// Nearest base class with its resolved strategy.
    pub base: Option<(&'a Class, MapStrategy)>,

    /// Every ancestor, nearest first.
    pub ancestors: &'a [&'a Class],

    /// Selector outcome, for relationship classes.
    pub relationship: Option<RelationshipRequest>,

    pub existing_tables: &'a ExistingTables,
}

struct Rule {
    name: &'static str,
    check: fn(&Request<'_>) -> Result<()>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "strategy",
        check: check_strategy,
    },
    Rule {
        name: "table name",
        check: check_table_name,
    },
    Rule {
        name: "table existence",
        check: check_table_exists,
    },
    Rule {
        name: "hierarchy",
        check: check_hierarchy,
    },
    Rule {
        name: "struct in hierarchy",
        check: check_struct_in_hierarchy,
    },
    Rule {
        name: "custom attributes",
        check: check_custom_attributes,
    },
];

/// Names of the resolution rules, in evaluation order.
pub fn rules() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|rule| rule.name)
}

/// Resolves the strategy of `request.class`.
pub fn resolve(request: &Request<'_>) -> Result<MapStrategy> {
    for rule in RULES {
        if let Err(err) = (rule.check)(request) {
            tracing::debug!(
                class = %request.name,
                rule = rule.name,
                %err,
                "map strategy rejected"
            );
            return Err(err);
        }
    }

    let strategy = resolved(request);
    tracing::debug!(class = %request.name, %strategy, "map strategy resolved");
    Ok(strategy)
}

impl ExistingTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a described table. An empty description means the table
    /// does not exist and is ignored.
    pub fn insert(&mut self, name: impl Into<String>, columns: Vec<TableColumnInfo>) {
        if columns.is_empty() {
            return;
        }
        let name = name.into();
        self.tables.insert(name.to_ascii_lowercase(), (name, columns));
    }

    /// Columns of the table `name`.
    pub fn get(&self, name: &str) -> Option<&[TableColumnInfo]> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .map(|(_, columns)| &columns[..])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Request<'_> {
    fn err(&self, message: impl Into<String>) -> Error {
        Error::illegal_strategy_configuration(self.name.to_string(), message)
    }

    fn base_strategy(&self) -> Option<MapStrategy> {
        self.base.map(|(_, strategy)| strategy)
    }

    fn base_is_table_per_hierarchy(&self) -> bool {
        self.base_strategy()
            .is_some_and(|strategy| strategy.is_table_per_hierarchy())
    }

    fn is_relationship(&self) -> bool {
        self.class.class_type() == ClassType::Relationship
    }

    fn selection(&self) -> Option<Selection> {
        self.relationship.map(|relationship| relationship.selection)
    }

    /// The strategy the class asks for, explicitly or through its base,
    /// with its polymorphic flag.
    fn effective(&self) -> (Strategy, bool) {
        let map = &self.class.map;

        if let Some(request) = map.strategy {
            return match request {
                StrategyRequest::NotMapped => (Strategy::NotMapped, map.is_polymorphic()),
                StrategyRequest::OwnTable => (Strategy::OwnTable, map.is_polymorphic()),
                StrategyRequest::SharedTable => (Strategy::SharedTable, map.is_polymorphic()),
                StrategyRequest::ExistingTable => (Strategy::ExistingTable, map.is_polymorphic()),
                StrategyRequest::TablePerHierarchy => (Strategy::SharedTable, true),
            };
        }

        match self.base_strategy() {
            Some(base) if base.polymorphic => return (base.strategy, true),
            _ => {}
        }

        match self.selection().and_then(|selection| selection.strategy()) {
            Some(strategy) => (strategy, false),
            None => (Strategy::OwnTable, false),
        }
    }
}

fn describe(strategy: Strategy, polymorphic: bool) -> String {
    let polymorphism = if polymorphic {
        "polymorphic"
    } else {
        "non-polymorphic"
    };
    format!("MapStrategy {strategy}, {polymorphism}")
}

fn check_strategy(request: &Request<'_>) -> Result<()> {
    let map = &request.class.map;

    if matches!(
        request.class.class_type(),
        ClassType::Struct | ClassType::CustomAttribute
    ) {
        if let Some(strategy) = map.strategy.filter(|s| *s != StrategyRequest::NotMapped) {
            return Err(request.err(format!(
                "MapStrategy {strategy} is not supported on {}es. Only MapStrategy NotMapped is allowed.",
                request.class.class_type()
            )));
        }
        return Ok(());
    }

    if map.disable_shared_columns && map.strategy.is_some() {
        return Err(request.err("Option 'DisableSharedColumn' doesn't allow strategy to be set."));
    }

    let (strategy, polymorphic) = request.effective();

    if request.is_relationship() {
        match (strategy, polymorphic) {
            (Strategy::ExistingTable, _) => {
                return Err(request.err(
                    "MapStrategy ExistingTable is not supported on ECRelationshipClasses.",
                ))
            }
            (Strategy::SharedTable, false) => {
                return Err(request.err(
                    "MapStrategy SharedTable, non-polymorphic is not supported on ECRelationshipClasses.",
                ))
            }
            _ => {}
        }
    }

    let options = map.options;

    if strategy == Strategy::NotMapped && !options.is_none() {
        return Err(request.err("MapStrategy NotMapped doesn't allow options to be set."));
    }

    if matches!(strategy, Strategy::OwnTable | Strategy::ExistingTable)
        && options.any_shared_columns()
    {
        return Err(request.err(format!(
            "Options SharedColumns and SharedColumnsForSubclasses cannot be used with MapStrategy {strategy}."
        )));
    }

    if options.readonly && strategy != Strategy::ExistingTable {
        return Err(request.err("Option ReadOnly, can only be used with the Strategy ExistingTable"));
    }

    if strategy == Strategy::ExistingTable && polymorphic {
        return Err(request.err("MapStrategy ExistingTable cannot be polymorphic."));
    }

    Ok(())
}

fn check_table_name(request: &Request<'_>) -> Result<()> {
    if matches!(request.class.class_type(), ClassType::Struct | ClassType::CustomAttribute) {
        return Ok(());
    }

    let has_table_name = request.class.map.table_name.is_some();
    let (strategy, polymorphic) = request.effective();

    match strategy {
        Strategy::ExistingTable if !has_table_name => {
            Err(request.err("MapStrategy ExistingTable expects TableName to be set"))
        }
        Strategy::SharedTable if !polymorphic && !has_table_name => Err(request.err(
            "MapStrategy SharedTable, non-polymorphic expects TableName to be set.",
        )),
        Strategy::OwnTable if has_table_name => {
            Err(request.err("MapStrategy OwnTable doesn't allow TableName to be set."))
        }
        Strategy::SharedTable | Strategy::NotMapped if polymorphic && has_table_name => {
            Err(request.err(format!(
                "{} doesn't allow TableName to be set.",
                describe(strategy, polymorphic)
            )))
        }
        Strategy::NotMapped if has_table_name => Err(request.err(format!(
            "{} doesn't allow TableName to be set.",
            describe(strategy, polymorphic)
        ))),
        Strategy::ForeignKeyRelationshipInSourceTable
        | Strategy::ForeignKeyRelationshipInTargetTable
            if has_table_name =>
        {
            Err(request.err(format!(
                "MapStrategy {strategy} doesn't allow TableName to be set."
            )))
        }
        _ => Ok(()),
    }
}

fn check_table_exists(request: &Request<'_>) -> Result<()> {
    let (strategy, _) = request.effective();
    if strategy != Strategy::ExistingTable {
        return Ok(());
    }

    match &request.class.map.table_name {
        Some(table) if !request.existing_tables.contains(table) => Err(
            Error::unresolvable_table_reference(request.name.to_string(), table.clone()),
        ),
        _ => Ok(()),
    }
}

fn check_hierarchy(request: &Request<'_>) -> Result<()> {
    if let Some(relationship) = request.relationship {
        if let Some(base) = relationship.base {
            if base.is_foreign_key() != relationship.selection.is_foreign_key() {
                let (base_class, _) = request.base.unzip();
                return Err(request.err(format!(
                    "ECRelationshipClass must have the same mapping type (link table or foreign key) as its base class{}.",
                    base_class
                        .map(|class| format!(" {}", class.name))
                        .unwrap_or_default()
                )));
            }

            if request.class.map.link_table.is_some() {
                return Err(request.err(
                    "The LinkTableRelationshipMap custom attribute can only be applied to the root class of a relationship hierarchy.",
                ));
            }
        }
    }

    let Some((base, base_strategy)) = request.base else {
        return Ok(());
    };

    let explicit = request.class.map.strategy;

    if base_strategy.is_table_per_hierarchy() {
        return match explicit {
            None | Some(StrategyRequest::NotMapped) | Some(StrategyRequest::TablePerHierarchy) => {
                Ok(())
            }
            Some(StrategyRequest::SharedTable) if request.class.map.is_polymorphic() => Ok(()),
            Some(other) => Err(request.err(format!(
                "MapStrategy {other} on child class where base has SharedTable (polymorphic) is not supported."
            ))),
        };
    }

    if base_strategy.is_not_mapped() && base_strategy.polymorphic {
        return match explicit {
            None | Some(StrategyRequest::NotMapped) => Ok(()),
            Some(other) => Err(request.err(format!(
                "MapStrategy {other} is not allowed because base class {} has MapStrategy NotMapped (polymorphic).",
                base.name
            ))),
        };
    }

    if base_strategy.polymorphic && explicit.is_some() {
        return Err(request.err(
            "Polymorphic parent class (with any strategy) doesn't allow a child class to have it's own strategy.",
        ));
    }

    Ok(())
}

fn check_struct_in_hierarchy(request: &Request<'_>) -> Result<()> {
    if request.class.is_struct() {
        return Ok(());
    }

    match request.ancestors.iter().find(|ancestor| ancestor.is_struct()) {
        Some(ancestor) => Err(request.err(format!(
            "ECStructClass {} cannot be part of the inheritance hierarchy of {} {}.",
            ancestor.name,
            request.class.class_type(),
            request.class.name
        ))),
        None => Ok(()),
    }
}

fn check_custom_attributes(request: &Request<'_>) -> Result<()> {
    let map = &request.class.map;
    let (strategy, polymorphic) = request.effective();
    let table_per_hierarchy = strategy == Strategy::SharedTable && polymorphic;

    if map.joined_table_per_direct_subclass && !table_per_hierarchy {
        return Err(request.err(
            "JoinedTablePerDirectSubclass custom attribute requires MapStrategy SharedTable, polymorphic (TablePerHierarchy) to be in effect.",
        ));
    }

    if map.shared_column_count.is_some() {
        let inherited = request
            .base_strategy()
            .filter(|base| base.is_table_per_hierarchy())
            .map(|base| base.options)
            .unwrap_or_default();

        if !map.requests_shared_columns() && !inherited.any_shared_columns() {
            return Err(request.err(
                "SharedColumnCount can only be set together with Options SharedColumns or SharedColumnsForSubclasses.",
            ));
        }

        if request.base_is_table_per_hierarchy()
            && !request
                .base
                .is_some_and(|(base, _)| base.map.joined_table_per_direct_subclass)
        {
            return Err(request.err(
                "SharedColumnCount can only be set on the class that creates the table: the hierarchy root or a direct subclass of a class with JoinedTablePerDirectSubclass.",
            ));
        }
    }

    if let Some(selection) = request.selection() {
        if map.foreign_key.is_some() && !selection.is_foreign_key() {
            return Err(request.err(
                "The ForeignKeyConstraint custom attribute requires the ECRelationshipClass to be mapped to foreign key columns.",
            ));
        }

        let names_link_columns = map.link_table.as_ref().is_some_and(|link_table| {
            link_table.source_column.is_some() || link_table.target_column.is_some()
        });

        if names_link_columns && selection.is_foreign_key() {
            return Err(request.err(
                "The LinkTableRelationshipMap custom attribute specifies link table column names, but the ECRelationshipClass is mapped to foreign key columns.",
            ));
        }
    }

    if !map.indexes.is_empty() {
        let sealed = request.class.modifier == ecmap_core::schema::ec::Modifier::Sealed;
        if strategy == Strategy::ExistingTable || !(table_per_hierarchy || sealed) {
            return Err(request.err(
                "A user-defined index can only be defined on classes with MapStrategy 'TablePerHierarchy' or on sealed classes that don't have the MapStrategy 'ExistingTable'.",
            ));
        }
    }

    Ok(())
}

/// The outcome once every rule passed.
fn resolved(request: &Request<'_>) -> MapStrategy {
    if matches!(
        request.class.class_type(),
        ClassType::Struct | ClassType::CustomAttribute
    ) {
        return MapStrategy::NOT_MAPPED;
    }

    let map = &request.class.map;

    if let Some(base) = request.base_strategy() {
        if base.is_table_per_hierarchy() {
            if map.strategy == Some(StrategyRequest::NotMapped) {
                return MapStrategy::new(Strategy::NotMapped, true);
            }

            let options = MapOptions {
                readonly: false,
                shared_columns: base.options.shared_columns || map.options.shared_columns,
                shared_columns_for_subclasses: base.options.shared_columns_for_subclasses
                    || map.options.shared_columns_for_subclasses,
            };
            return MapStrategy::new(Strategy::SharedTable, true).with_options(options);
        }

        if base.polymorphic {
            return MapStrategy::new(base.strategy, true);
        }
    }

    if let Some(selection) = request.selection() {
        if let Some(strategy) = selection.strategy() {
            if map.strategy != Some(StrategyRequest::NotMapped) {
                return MapStrategy::new(strategy, false);
            }
        }
    }

    let (strategy, polymorphic) = request.effective();
    MapStrategy::new(strategy, polymorphic).with_options(map.options)
}
