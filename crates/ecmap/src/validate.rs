//! Compatibility validation of schema updates.
//!
//! A classified diff is accepted or rejected by checking the version rules
//! and then every change, in diff order, against an ordered list of rules.
//! The first failing rule decides the error.

use crate::{allocate::Report, catalog::Catalog, Config};

use ecmap_core::{
    schema::{
        ec::{
            diff::{Change, ChangeKind, ChangeState, Container, SchemaDiff},
            ClassType, Exceptions, Modifier, QualifiedName, Schema, SchemaSet,
        },
        mapping::RelationshipMap,
        Mapping,
    },
    Error, Result,
};

/// Schema holding the mapping custom attribute classes.
const MAP_SCHEMA: &str = "ECDbMap";

/// What a change is checked against: the persisted schemas with their
/// mapping, and the schemas as they will be after the import.
pub(crate) struct Context<'a, 'b> {
    pub(crate) previous: &'b SchemaSet<'a>,
    pub(crate) next: &'b SchemaSet<'a>,
    pub(crate) catalog: &'b Catalog,
}

struct Rule {
    name: &'static str,
    check: fn(&Context<'_, '_>, &Change) -> Result<()>,
}

const RULES: &[Rule] = &[
    Rule {
        name: "class flavor",
        check: check_flavor,
    },
    Rule {
        name: "base classes",
        check: check_base_classes,
    },
    Rule {
        name: "class modifier",
        check: check_modifier,
    },
    Rule {
        name: "map directives",
        check: check_map_directives,
    },
    Rule {
        name: "relationship",
        check: check_relationship,
    },
    Rule {
        name: "class deletion",
        check: check_class_deletion,
    },
    Rule {
        name: "property type",
        check: check_property_type,
    },
    Rule {
        name: "property map",
        check: check_property_map,
    },
    Rule {
        name: "property addition",
        check: check_property_addition,
    },
    Rule {
        name: "property deletion",
        check: check_property_deletion,
    },
    Rule {
        name: "enumeration",
        check: check_enumeration,
    },
    Rule {
        name: "kind of quantity",
        check: check_kind_of_quantity,
    },
    Rule {
        name: "property category",
        check: check_property_category,
    },
    Rule {
        name: "mapping custom attributes",
        check: check_map_custom_attributes,
    },
];

/// Names of the compatibility rules, in evaluation order.
pub fn rules() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|rule| rule.name)
}

/// Accepts or rejects `diff`.
pub(crate) fn validate(cx: &Context<'_, '_>, diff: &SchemaDiff, config: &Config) -> Result<()> {
    let Some(previous) = diff.previous_version else {
        return Ok(());
    };

    if diff.version < previous {
        return Err(Error::version_ordering_violation(
            &diff.schema,
            format!(
                "The version {} is lower than the persisted version {previous}.",
                diff.version
            ),
        ));
    }

    let major_increased = diff.version.major > previous.major;

    if major_increased && config.disallow_major_upgrade {
        return Err(Error::version_ordering_violation(
            &diff.schema,
            format!(
                "Major version upgrades are disallowed. Persisted version: {previous}, incoming version: {}.",
                diff.version
            ),
        ));
    }

    for change in diff.changes() {
        for rule in RULES {
            if let Err(err) = (rule.check)(cx, change) {
                tracing::debug!(
                    schema = %diff.schema,
                    rule = rule.name,
                    %change,
                    "schema change rejected"
                );
                return Err(err);
            }
        }
    }

    let structural = diff.has_structural_changes();

    if structural && !major_increased {
        return Err(Error::version_ordering_violation(
            &diff.schema,
            format!(
                "The schema contains structural changes, which require the major version to be incremented. Persisted version: {previous}, incoming version: {}.",
                diff.version
            ),
        ));
    }

    if !structural && major_increased {
        return Err(Error::version_ordering_violation(
            &diff.schema,
            format!(
                "The major version was incremented although the schema contains no structural changes. Persisted version: {previous}, incoming version: {}.",
                diff.version
            ),
        ));
    }

    Ok(())
}

/// Checks an allocation outcome against the configured policy.
pub(crate) fn check_policy(config: &Config, report: &Report) -> Result<()> {
    if !config.policy.is_changeset_merge_compatible() {
        return Ok(());
    }

    match report.claims_in_existing_tables.first() {
        Some(claim) => Err(Error::column_pool_exhaustion_policy_violation(
            format!("ECProperty {}.{}", claim.class, claim.property),
            format!(
                "Mapping the property requires a new shared column slot in existing table {}, which is not allowed for changeset merge compatible databases.",
                claim.table
            ),
        )),
        None => Ok(()),
    }
}

/// Checks the classes and relationships added by an import against the
/// schema policies declared in `cx.next`. The schema declaring a policy is
/// not bound by it.
pub(crate) fn check_schema_policies(cx: &Context<'_, '_>, mapping: &Mapping) -> Result<()> {
    for owner in cx.next.schemas() {
        let policies = &owner.policies;
        let bound = |schema: &Schema| schema.name != owner.name;

        if let Some(exceptions) = &policies.no_additional_root_entity_classes {
            for entry in cx.next.classes() {
                let is_new_root = entry.class.class_type() == ClassType::Entity
                    && entry.class.base_classes.is_empty()
                    && cx.previous.class(&entry.name).is_none();

                if is_new_root
                    && bound(entry.schema)
                    && !exceptions.contains(entry.schema, &[entry.class.name.as_str()])
                {
                    return Err(policy_violation(
                        "NoAdditionalRootEntityClasses",
                        format!("ECEntityClass {}", entry.name),
                        owner,
                    ));
                }
            }
        }

        for (name, map) in &mapping.relationships {
            if cx.previous.class(name).is_some() {
                continue;
            }
            let Some(schema) = cx.next.schema(&name.schema).filter(|schema| bound(*schema)) else {
                continue;
            };

            match map {
                RelationshipMap::LinkTable(_) => {
                    let Some(exceptions) = &policies.no_additional_link_tables else {
                        continue;
                    };
                    let is_root = cx
                        .next
                        .class(name)
                        .is_some_and(|class| class.base_classes.is_empty());

                    if is_root && !exceptions.contains(schema, &[name.name.as_str()]) {
                        return Err(policy_violation(
                            "NoAdditionalLinkTables",
                            format!("ECRelationshipClass {name}"),
                            owner,
                        ));
                    }
                }
                RelationshipMap::EndTable(end_table) if end_table.constraint.is_some() => {
                    let Some(exceptions) = &policies.no_additional_foreign_key_constraints else {
                        continue;
                    };

                    if !foreign_key_exempt(cx, exceptions, schema, name, &end_table.navigation) {
                        return Err(policy_violation(
                            "NoAdditionalForeignKeyConstraints",
                            format!("ECRelationshipClass {name}"),
                            owner,
                        ));
                    }
                }
                RelationshipMap::EndTable(_) => {}
            }
        }
    }

    Ok(())
}

/// A foreign key constraint is exempted through its navigation property
/// or, failing that, its relationship class.
fn foreign_key_exempt(
    cx: &Context<'_, '_>,
    exceptions: &Exceptions,
    schema: &Schema,
    relationship: &QualifiedName,
    navigation: &Option<(QualifiedName, String)>,
) -> bool {
    let by_navigation = navigation.as_ref().is_some_and(|(class, property)| {
        let path = [class.name.as_str(), property.as_str()];
        cx.next
            .schema(&class.schema)
            .is_some_and(|schema| exceptions.contains(schema, &path))
    });

    by_navigation || exceptions.contains(schema, &[relationship.name.as_str()])
}

fn policy_violation(policy: &'static str, item: String, owner: &Schema) -> Error {
    tracing::debug!(policy, %item, owner = %owner.name, "schema policy violated");
    Error::schema_policy_violation(policy, item, &owner.name)
}

fn structural(change: &Change, message: impl Into<String>) -> Result<()> {
    Err(Error::incompatible_structural_change(
        change.container.to_string(),
        message,
    ))
}

fn check_flavor(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match change.kind {
        ChangeKind::Flavor => {
            structural(change, "Changing the type of an ECClass is not supported.")
        }
        _ => Ok(()),
    }
}

fn check_base_classes(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match change.kind {
        ChangeKind::BaseClasses => structural(
            change,
            "Adding, removing or replacing base classes of an existing ECClass is not supported.",
        ),
        _ => Ok(()),
    }
}

fn check_modifier(cx: &Context<'_, '_>, change: &Change) -> Result<()> {
    let ChangeKind::Modifier { from, to } = change.kind else {
        return Ok(());
    };
    let Container::Class(name) = &change.container else {
        return Ok(());
    };

    if from == Modifier::Abstract {
        return structural(change, "The modifier of an abstract ECClass cannot be changed.");
    }

    if to == Modifier::Abstract {
        return structural(change, "An existing ECClass cannot be made abstract.");
    }

    let has_subclasses = cx
        .next
        .class_id(name)
        .is_some_and(|id| !cx.next.derived(id).is_empty());

    if to == Modifier::Sealed && has_subclasses {
        return structural(change, "An ECClass with subclasses cannot be sealed.");
    }

    Ok(())
}

fn check_map_directives(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match change.kind {
        ChangeKind::SharedColumnCount => Err(Error::column_pool_exhaustion_policy_violation(
            change.container.to_string(),
            "SharedColumnCount is fixed when the ECClass is first mapped and cannot be added, removed or modified.",
        )),
        ChangeKind::MapDirectives => Err(Error::immutable_metadata_change_rejected(
            change.container.to_string(),
            "ECDbMap custom attributes cannot be added, removed or modified after the ECClass was mapped.",
        )),
        _ => Ok(()),
    }
}

fn check_relationship(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    let message = match change.kind {
        ChangeKind::Strength => "Changing the strength of an ECRelationshipClass is not supported.",
        ChangeKind::StrengthDirection => {
            "Changing the strength direction of an ECRelationshipClass is not supported."
        }
        ChangeKind::Multiplicity => "Changing the multiplicity of a constraint is not supported.",
        ChangeKind::ConstraintPolymorphism => {
            "Changing the polymorphism of a constraint is not supported."
        }
        ChangeKind::ConstraintClasses => "Changing the constraint classes is not supported.",
        ChangeKind::AbstractConstraint => {
            "Changing the abstract constraint of a constraint is not supported."
        }
        _ => return Ok(()),
    };
    structural(change, message)
}

fn check_class_deletion(cx: &Context<'_, '_>, change: &Change) -> Result<()> {
    let (Container::Class(name), ChangeKind::Deleted) = (&change.container, &change.kind) else {
        return Ok(());
    };
    let Some(class) = cx.previous.class(name) else {
        return Ok(());
    };

    match class.class_type() {
        ClassType::Struct => {
            return structural(change, "Deleting an ECStructClass is not supported.");
        }
        ClassType::CustomAttribute => {
            return structural(change, "Deleting an ECCustomAttributeClass is not supported.");
        }
        ClassType::Relationship => {
            let end_table = cx
                .catalog
                .mapping
                .relationship(name)
                .is_some_and(|relationship| relationship.is_end_table());
            if end_table {
                return structural(
                    change,
                    "Deleting an ECRelationshipClass mapped to foreign key columns is not supported.",
                );
            }
        }
        ClassType::Entity => {}
    }

    let has_subclasses = cx
        .next
        .classes()
        .any(|entry| entry.class.base_classes.contains(name));
    if has_subclasses {
        return structural(
            change,
            "Deleting an ECClass that still has subclasses is not supported.",
        );
    }

    for entry in cx.next.classes() {
        let Some(relationship) = entry.class.relationship() else {
            continue;
        };

        let referenced = [&relationship.source, &relationship.target]
            .into_iter()
            .any(|constraint| {
                constraint.classes.contains(name)
                    || constraint.abstract_constraint.as_ref() == Some(name)
            });

        if referenced {
            return Err(Error::constraint_class_incompatible(
                change.container.to_string(),
                format!(
                    "The ECClass is a constraint class of ECRelationshipClass {}.",
                    entry.name
                ),
            ));
        }
    }

    Ok(())
}

fn check_property_type(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    let message = match change.kind {
        ChangeKind::PropertyKind => "Changing the kind of an ECProperty is not supported.",
        ChangeKind::ValueType if change.state == ChangeState::StructurallyChanged => {
            "Changing the type of an ECProperty is not supported."
        }
        ChangeKind::StructType => "Changing the struct type of an ECProperty is not supported.",
        ChangeKind::Occurs => {
            "Changing MinOccurs or MaxOccurs of an array ECProperty is not supported."
        }
        ChangeKind::Navigation => {
            "Changing the relationship or direction of a navigation ECProperty is not supported."
        }
        _ => return Ok(()),
    };
    structural(change, message)
}

fn check_property_map(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match change.kind {
        ChangeKind::PropertyMap => Err(Error::immutable_metadata_change_rejected(
            change.container.to_string(),
            "The PropertyMap custom attribute cannot be added, removed or modified.",
        )),
        _ => Ok(()),
    }
}

/// Struct members are expanded into the columns of every owner, which are
/// fixed at mapping time.
fn check_property_addition(cx: &Context<'_, '_>, change: &Change) -> Result<()> {
    let (Container::Property { class, .. }, ChangeKind::Added) = (&change.container, &change.kind)
    else {
        return Ok(());
    };

    if cx.previous.class(class).is_some_and(|class| class.is_struct()) {
        return structural(
            change,
            "Adding a property to an existing ECStructClass is not supported.",
        );
    }

    Ok(())
}

fn check_property_deletion(cx: &Context<'_, '_>, change: &Change) -> Result<()> {
    let (Container::Property { class, property }, ChangeKind::Deleted) =
        (&change.container, &change.kind)
    else {
        return Ok(());
    };
    let Some(id) = cx.previous.class_id(class) else {
        return Ok(());
    };

    if cx.previous.entry(id).class.is_struct() {
        return structural(change, "Deleting a property of an ECStructClass is not supported.");
    }

    if cx.previous.overridden(id, property).is_some() {
        return structural(change, "Deleting an overriding ECProperty is not supported.");
    }

    if let Some(next) = cx.next.class_id(class) {
        let overridden = cx
            .next
            .descendants(next)
            .into_iter()
            .any(|descendant| cx.next.entry(descendant).class.property(property).is_some());
        if overridden {
            return structural(
                change,
                "Deleting an ECProperty that is overridden in a subclass is not supported.",
            );
        }
    }

    let Some(property_map) = cx
        .catalog
        .mapping
        .class(class)
        .and_then(|class_map| class_map.property(property))
    else {
        return Ok(());
    };

    let shared = property_map
        .columns
        .iter()
        .all(|column| cx.catalog.layout.column(column.column).is_shared());

    if !shared {
        return structural(
            change,
            "Only ECProperties mapped to shared columns can be deleted.",
        );
    }

    Ok(())
}

fn check_enumeration(cx: &Context<'_, '_>, change: &Change) -> Result<()> {
    match (&change.container, &change.kind) {
        (Container::Enumeration(_), ChangeKind::Deleted) => {
            structural(change, "Deleting an ECEnumeration is not supported.")
        }
        (Container::Enumeration(_), ChangeKind::BackingType) => {
            structural(change, "Changing the backing type of an ECEnumeration is not supported.")
        }
        (
            Container::Enumeration(_),
            ChangeKind::IsStrict {
                from: false,
                to: true,
            },
        ) => structural(change, "A non-strict ECEnumeration cannot be made strict."),
        (
            Container::Enumerator { enumeration, .. },
            ChangeKind::Deleted | ChangeKind::EnumeratorValue,
        ) => {
            let strict = cx
                .previous
                .enumeration(enumeration)
                .is_some_and(|enumeration| enumeration.is_strict);

            if strict {
                structural(
                    change,
                    "Deleting an enumerator or changing its value is not supported for strict ECEnumerations.",
                )
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

fn check_kind_of_quantity(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match (&change.container, &change.kind) {
        (Container::KindOfQuantity(_), ChangeKind::Deleted) => {
            structural(change, "Deleting a KindOfQuantity is not supported.")
        }
        (Container::KindOfQuantity(_), ChangeKind::PersistenceUnit) => structural(
            change,
            "Changing the persistence unit of a KindOfQuantity is not supported.",
        ),
        _ => Ok(()),
    }
}

fn check_property_category(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    match (&change.container, &change.kind) {
        (Container::PropertyCategory(_), ChangeKind::Deleted) => {
            structural(change, "Deleting a PropertyCategory is not supported.")
        }
        _ => Ok(()),
    }
}

fn check_map_custom_attributes(_: &Context<'_, '_>, change: &Change) -> Result<()> {
    let Container::CustomAttribute { class, .. } = &change.container else {
        return Ok(());
    };

    if is_map_custom_attribute(class) {
        return Err(Error::immutable_metadata_change_rejected(
            change.container.to_string(),
            "ECDbMap custom attributes cannot be added, removed or modified.",
        ));
    }

    Ok(())
}

fn is_map_custom_attribute(class: &QualifiedName) -> bool {
    class.schema.eq_ignore_ascii_case(MAP_SCHEMA)
}
