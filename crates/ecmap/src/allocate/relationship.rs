use super::{column, Allocate};
use crate::relationship::{self, Selection};

use ecmap_core::{
    schema::{
        db::{ColumnKind, ForeignKey, TableId, Type},
        ec::{ClassId, End, PropertyKind, QualifiedName},
        mapping::{ColumnValue, EndTableMap, PropertyColumn, PropertyMap, RelationshipMap, Strategy},
    },
    Error, Result,
};

impl Allocate<'_, '_> {
    /// Tables holding instances of the classes at `end` of relationship
    /// `id`, mapped subclasses included when the constraint is polymorphic.
    pub(super) fn end_tables(&self, id: ClassId, end: End) -> Result<Vec<TableId>> {
        let set = self.set;
        let entry = set.entry(id);
        let Some(relationship) = entry.class.relationship() else {
            return Ok(vec![]);
        };

        let constraint = relationship.constraint(end);
        let mut tables = vec![];

        for name in &constraint.classes {
            let Some(class_id) = set.class_id(name) else {
                return Err(Error::invalid_schema(format!(
                    "constraint class {name} of {} does not exist",
                    entry.name
                )));
            };

            let mut classes = vec![class_id];
            if constraint.polymorphic {
                classes.extend(set.descendants(class_id));
            }

            for class_id in classes {
                let table = self
                    .mapping
                    .class(set.name(class_id))
                    .and_then(|class_map| class_map.table);

                if let Some(table) = table {
                    if !tables.contains(&table) {
                        tables.push(table);
                    }
                }
            }
        }

        if tables.is_empty() {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!("The {end} constraint classes of the ECRelationshipClass are not mapped to any table."),
            ));
        }

        Ok(tables)
    }

    /// The table of `end`, when the end maps to exactly one table.
    pub(super) fn single_end_table(&self, id: ClassId, end: End) -> Result<Option<TableId>> {
        let tables = self.end_tables(id, end)?;
        Ok(match tables[..] {
            [table] => Some(table),
            _ => None,
        })
    }

    /// Adds the foreign key columns of an end-table relationship to the
    /// table of its host end.
    pub(super) fn map_end_table(&mut self, id: ClassId) -> Result<()> {
        let set = self.set;
        let entry = set.entry(id);

        let Some(class_map) = self.mapping.class(&entry.name) else {
            return Ok(());
        };
        let strategy = class_map.strategy.strategy;
        if !strategy.is_end_table() || self.mapping.relationship(&entry.name).is_some() {
            return Ok(());
        }

        if !set.all_properties(id).is_empty() {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                "ECRelationshipClass mapped to foreign key columns cannot have properties.",
            ));
        }

        let host_end = if strategy == Strategy::ForeignKeyRelationshipInTargetTable {
            End::Target
        } else {
            End::Source
        };

        let host_table = match self.end_tables(id, host_end)?[..] {
            [table] => table,
            _ => {
                return Err(Error::illegal_strategy_configuration(
                    entry.name.to_string(),
                    format!("The {host_end} constraint classes of the ECRelationshipClass map to more than one table. Foreign key columns need a single table."),
                ))
            }
        };

        if self.layout.table(host_table).is_existing() {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!(
                    "Foreign key columns cannot be added to table {}, which was not created by ECDb.",
                    self.layout.table(host_table).name
                ),
            ));
        }

        if let Some(parent) = set.parent(id) {
            if let Some(RelationshipMap::EndTable(base)) =
                self.mapping.relationship(set.name(parent))
            {
                if base.host_table == host_table && base.host_end == host_end {
                    let base = base.clone();
                    self.mapping
                        .relationships
                        .insert(entry.name.clone(), RelationshipMap::EndTable(base));
                    return Ok(());
                }
            }
        }

        let root = set.ancestors(id).last().copied().unwrap_or(id);
        let foreign_key = entry
            .class
            .map
            .foreign_key
            .as_ref()
            .or(set.entry(root).class.map.foreign_key.as_ref())
            .map(|directive| directive.on_delete);

        let references = match foreign_key {
            Some(on_delete) => match self.single_end_table(id, host_end.opposite())? {
                Some(referenced) => Some(ForeignKey {
                    table: self.layout.table(referenced).name.clone(),
                    column: "Id".to_string(),
                    on_delete,
                }),
                None => {
                    return Err(Error::illegal_strategy_configuration(
                        entry.name.to_string(),
                        "The ForeignKeyConstraint custom attribute requires the referenced constraint classes to map to a single table.",
                    ))
                }
            },
            None => None,
        };

        let navigation = self.navigation_property(id, host_end);
        let (id_name, class_id_name) = match &navigation {
            Some((_, property)) => (format!("{property}Id"), format!("{property}RelECClassId")),
            None => (
                format!("ForeignECInstanceId_{}", entry.class.name),
                format!("ForeignECClassId_{}", entry.class.name),
            ),
        };

        let id_name = self.dedicated_column_name(host_table, &entry.class.name, &id_name);
        let mut foreign_key_column = column(id_name, ColumnKind::ForeignKey, Some(Type::Integer));
        foreign_key_column.references = references;
        let foreign_key_id = self.layout.table_mut(host_table).push_column(foreign_key_column);

        let class_id_name =
            self.dedicated_column_name(host_table, &entry.class.name, &class_id_name);
        let rel_class_id = self
            .layout
            .table_mut(host_table)
            .push_column(column(class_id_name, ColumnKind::RelClassId, Some(Type::Integer)));

        let unique = matches!(
            relationship::select_in(set, id).map(|request| request.selection),
            Some(Selection::ForeignKey { unique: true, .. })
        );

        let prefix = format!("{}_{}", entry.schema.alias, entry.class.name);
        let index = if unique {
            self.push_index(host_table, format!("uix_{prefix}_fk"), vec![foreign_key_id], true, true)
        } else {
            self.push_index(host_table, format!("ix_{prefix}_fk"), vec![foreign_key_id], false, false)
        };

        tracing::debug!(
            relationship = %entry.name,
            table = %self.layout.table(host_table).name,
            %host_end,
            "foreign key columns allocated"
        );

        self.mapping.relationships.insert(
            entry.name.clone(),
            RelationshipMap::EndTable(EndTableMap {
                host_end,
                host_table,
                foreign_key: foreign_key_id,
                rel_class_id,
                navigation,
                constraint: foreign_key,
                unique_index: unique.then_some(index),
            }),
        );

        Ok(())
    }

    /// First navigation property pointing at relationship `id` declared on
    /// the host end's classes or their relatives.
    fn navigation_property(&self, id: ClassId, host_end: End) -> Option<(QualifiedName, String)> {
        let set = self.set;
        let entry = set.entry(id);
        let constraint = entry.class.relationship()?.constraint(host_end);

        for name in &constraint.classes {
            let Some(class_id) = set.class_id(name) else {
                continue;
            };

            let mut classes = vec![class_id];
            classes.extend(set.descendants(class_id));

            for class_id in classes {
                for (property_name, (property, declaring)) in set.all_properties(class_id) {
                    match &property.kind {
                        PropertyKind::Navigation { relationship, .. }
                            if *relationship == entry.name =>
                        {
                            return Some((set.name(declaring).clone(), property_name.to_string()));
                        }
                        _ => {}
                    }
                }
            }
        }

        None
    }

    /// Binds navigation properties of class `id` to the foreign key columns
    /// of their relationship.
    pub(super) fn map_navigation_properties(&mut self, id: ClassId) -> Result<()> {
        let set = self.set;
        let name = set.name(id);

        let Some(class_map) = self.mapping.class(name) else {
            return Ok(());
        };
        if !class_map.is_mapped() {
            return Ok(());
        }

        let tables = class_map.tables();
        let mut added = vec![];

        for (property_name, (property, _)) in set.all_properties(id) {
            let PropertyKind::Navigation { relationship, .. } = &property.kind else {
                continue;
            };
            if class_map.property(property_name).is_some() {
                continue;
            }

            let end_table = match self.mapping.relationship(relationship) {
                Some(RelationshipMap::EndTable(end_table)) => end_table,
                _ => {
                    return Err(Error::illegal_strategy_configuration(
                        name.to_string(),
                        format!(
                            "Navigation property {property_name} requires ECRelationshipClass {relationship} to be mapped to foreign key columns."
                        ),
                    ))
                }
            };

            if !tables.contains(&end_table.host_table) {
                return Err(Error::illegal_strategy_configuration(
                    name.to_string(),
                    format!(
                        "Navigation property {property_name} must be defined on the foreign key end of ECRelationshipClass {relationship}."
                    ),
                ));
            }

            added.push(PropertyMap {
                name: property_name.to_string(),
                declared_by: name.clone(),
                columns: vec![
                    PropertyColumn {
                        access: format!("{property_name}.Id"),
                        column: end_table.foreign_key,
                        value: ColumnValue::NavigationId,
                    },
                    PropertyColumn {
                        access: format!("{property_name}.RelECClassId"),
                        column: end_table.rel_class_id,
                        value: ColumnValue::NavigationRelClassId,
                    },
                ],
            });
        }

        if let Some(class_map) = self.mapping.class_mut(name) {
            for property in added {
                class_map.properties.insert(property.name.clone(), property);
            }
        }

        Ok(())
    }
}
