use super::{Allocate, ClearedColumns};

use ecmap_core::schema::{ec::QualifiedName, mapping::ColumnValue, Mapping};

impl Allocate<'_, '_> {
    /// Drops the mappings of classes no longer in the schemas. Their tables
    /// and columns stay; their shared column claims are retired.
    pub(super) fn remove_deleted_classes(&mut self) {
        let set = self.set;

        let deleted: Vec<QualifiedName> = self
            .mapping
            .classes
            .keys()
            .filter(|name| set.class_id(name).is_none())
            .cloned()
            .collect();

        for name in deleted {
            let Some(class_map) = self.mapping.classes.shift_remove(&name) else {
                continue;
            };

            if let Some(relationship) = self.mapping.relationships.shift_remove(&name) {
                self.report
                    .deleted_relationships
                    .push((class_map.id, relationship));
            }

            for pool in &mut self.mapping.pools {
                pool.retire_class(&name);
            }

            tracing::debug!(class = %name, id = class_map.id, "class mapping removed");
            self.report.deleted_classes.push(class_map);
        }
    }

    /// Drops property mappings whose property is no longer visible on the
    /// class.
    pub(super) fn remove_hidden_properties(&mut self) {
        let set = self.set;
        let Mapping { classes, pools, .. } = &mut *self.mapping;

        for (name, class_map) in classes.iter_mut() {
            let Some(id) = set.class_id(name) else {
                continue;
            };

            let visible = set.all_properties(id);
            let hidden: Vec<String> = class_map
                .properties
                .keys()
                .filter(|property| !visible.contains_key(property.as_str()))
                .cloned()
                .collect();

            let mut cleared = vec![];

            for property in hidden {
                let Some(property_map) = class_map.properties.shift_remove(&property) else {
                    continue;
                };

                for column in &property_map.columns {
                    for pool in pools.iter_mut().filter(|pool| pool.table == column.column.table) {
                        pool.retire(&property_map.declared_by, &property_map.name);
                    }
                }

                // Navigation columns belong to the relationship.
                let navigation = property_map.columns.iter().any(|column| {
                    matches!(
                        column.value,
                        ColumnValue::NavigationId | ColumnValue::NavigationRelClassId
                    )
                });
                if !navigation {
                    cleared.extend(property_map.column_ids());
                }

                tracing::debug!(class = %name, property = %property, "property mapping removed");
            }

            if !cleared.is_empty() {
                self.report.cleared_columns.push(ClearedColumns {
                    class_id: class_map.id,
                    columns: cleared,
                });
            }
        }
    }
}
