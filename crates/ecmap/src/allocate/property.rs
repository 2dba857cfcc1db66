use super::{column, Allocate, SlotClaimed};

use ecmap_core::{
    schema::{
        db::{ColumnId, ColumnKind, TableId, Type},
        ec::{ClassId, PrimitiveType, Property, PropertyKind, QualifiedName, ValueType},
        mapping::{ColumnValue, PropertyColumn, PropertyMap, SharedPool, Strategy},
    },
    Error, Result,
};

/// Struct nesting deeper than this is treated as a cycle.
const MAX_STRUCT_DEPTH: usize = 32;

/// One stored value of a property before it gets a column.
struct Value {
    access: String,
    column: String,
    value: ColumnValue,
    ty: Type,
}

impl Allocate<'_, '_> {
    /// Maps the properties of class `id` that have no columns yet.
    pub(super) fn map_properties(&mut self, id: ClassId) -> Result<()> {
        let set = self.set;
        let name = set.name(id);

        let Some(class_map) = self.mapping.class(name) else {
            return Ok(());
        };
        let Some(table) = class_map.property_table() else {
            return Ok(());
        };

        let shared = class_map.share_own_properties;
        let strategy = class_map.strategy;
        let mapped: Vec<String> = class_map.properties.keys().cloned().collect();

        // Under a shared hierarchy, inherited properties keep the base's
        // columns.
        let inherited = set
            .parent(id)
            .and_then(|parent| self.mapping.class(set.name(parent)))
            .filter(|parent| strategy.is_table_per_hierarchy() && parent.table == class_map.table)
            .cloned();

        let mut added = vec![];

        for (property_name, (property, _)) in set.all_properties(id) {
            if property.is_navigation() || mapped.iter().any(|mapped| mapped == property_name) {
                continue;
            }

            if let Some(base) = inherited.as_ref().and_then(|base| base.property(property_name)) {
                added.push(base.clone());
                continue;
            }

            let columns = self.map_property(id, table, shared, strategy.strategy, property)?;
            added.push(PropertyMap {
                name: property_name.to_string(),
                declared_by: name.clone(),
                columns,
            });
        }

        if let Some(class_map) = self.mapping.class_mut(name) {
            for property in added {
                class_map.properties.insert(property.name.clone(), property);
            }
        }

        Ok(())
    }

    fn map_property(
        &mut self,
        id: ClassId,
        table: TableId,
        shared: bool,
        strategy: Strategy,
        property: &Property,
    ) -> Result<Vec<PropertyColumn>> {
        let set = self.set;
        let entry = set.entry(id);

        if property.map.column_name.is_some() && strategy != Strategy::ExistingTable {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!(
                    "PropertyMap ColumnName on property {} can only be set for classes with MapStrategy ExistingTable.",
                    property.name
                ),
            ));
        }

        if property.map.unique && shared {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!(
                    "Property {} cannot be unique because it is mapped to a shared column.",
                    property.name
                ),
            ));
        }

        let column_name = property.map.column_name.as_deref().unwrap_or(&property.name);
        let mut values = vec![];
        self.expand(&entry.name, &property.kind, &property.name, column_name, 0, &mut values)?;

        let existing = self.layout.table(table).is_existing();
        let lineage = set.lineage(id);
        let mut columns = vec![];

        for value in values {
            let column_id = if existing {
                self.existing_column(&entry.name, table, &value.column)?
            } else if shared {
                self.claim_shared_column(table, &entry.name, &lineage, &value.access)?
            } else {
                let name = self.dedicated_column_name(table, &entry.class.name, &value.column);
                let mut dedicated = column(name, ColumnKind::Dedicated, Some(value.ty));
                dedicated.collation = property.map.collation;
                self.layout.table_mut(table).push_column(dedicated)
            };

            columns.push(PropertyColumn {
                access: value.access,
                column: column_id,
                value: value.value,
            });
        }

        if property.map.unique && !existing && !columns.is_empty() {
            let index = format!(
                "uix_{}_{}_{}",
                entry.schema.alias, entry.class.name, property.name
            );
            self.push_index(
                table,
                index,
                columns.iter().map(|column| column.column).collect(),
                true,
                false,
            );
        }

        Ok(columns)
    }

    /// Expands a property into its stored values.
    fn expand(
        &self,
        class: &QualifiedName,
        kind: &PropertyKind,
        access: &str,
        column: &str,
        depth: usize,
        out: &mut Vec<Value>,
    ) -> Result<()> {
        let set = self.set;

        match kind {
            PropertyKind::Primitive(ty) => {
                let ty = self.primitive_type(class, ty)?;

                if ty.column_count() > 1 {
                    for coordinate in ["X", "Y", "Z"].into_iter().take(ty.column_count()) {
                        out.push(Value {
                            access: format!("{access}.{coordinate}"),
                            column: format!("{column}_{coordinate}"),
                            value: ColumnValue::Coordinate,
                            ty: Type::Real,
                        });
                    }
                } else {
                    out.push(Value {
                        access: access.to_string(),
                        column: column.to_string(),
                        value: ColumnValue::Primitive(ty),
                        ty: Type::from_primitive(ty),
                    });
                }
            }
            PropertyKind::PrimitiveArray { ty, .. } => {
                self.primitive_type(class, ty)?;
                out.push(self.array_value(access, column));
            }
            PropertyKind::StructArray { ty, .. } => {
                if set.class(ty).is_none() {
                    return Err(Error::invalid_schema(format!(
                        "struct class {ty} used by {class}.{access} does not exist"
                    )));
                }
                out.push(self.array_value(access, column));
            }
            PropertyKind::Struct(ty) => {
                let Some(struct_id) = set.class_id(ty) else {
                    return Err(Error::invalid_schema(format!(
                        "struct class {ty} used by {class}.{access} does not exist"
                    )));
                };

                if depth >= MAX_STRUCT_DEPTH {
                    return Err(Error::invalid_schema(format!(
                        "struct class {ty} contains itself"
                    )));
                }

                for (member, (property, _)) in set.all_properties(struct_id) {
                    self.expand(
                        class,
                        &property.kind,
                        &format!("{access}.{member}"),
                        &format!("{column}_{member}"),
                        depth + 1,
                        out,
                    )?;
                }
            }
            PropertyKind::Navigation { .. } => {}
        }

        Ok(())
    }

    fn array_value(&self, access: &str, column: &str) -> Value {
        Value {
            access: access.to_string(),
            column: column.to_string(),
            value: ColumnValue::Array,
            ty: self.capability.storage_types.array_type,
        }
    }

    fn primitive_type(&self, class: &QualifiedName, ty: &ValueType) -> Result<PrimitiveType> {
        match ty {
            ValueType::Primitive(ty) => Ok(*ty),
            ValueType::Enumeration(name) => self
                .set
                .enumeration(name)
                .map(|enumeration| enumeration.backing_type)
                .ok_or_else(|| {
                    Error::invalid_schema(format!(
                        "enumeration {name} used by {class} does not exist"
                    ))
                }),
        }
    }

    fn existing_column(
        &self,
        class: &QualifiedName,
        table: TableId,
        name: &str,
    ) -> Result<ColumnId> {
        let table = self.layout.table(table);
        table
            .column_by_name(name)
            .map(|column| column.id)
            .ok_or_else(|| {
                Error::illegal_strategy_configuration(
                    class.to_string(),
                    format!("Column {name} does not exist in table {}.", table.name),
                )
            })
    }

    /// `name`, else `<Class>_<name>`, else `<Class>_<name>_<n>`.
    pub(super) fn dedicated_column_name(&self, table: TableId, class: &str, name: &str) -> String {
        let table = self.layout.table(table);
        if !table.has_column(name) {
            return name.to_string();
        }

        let prefixed = format!("{class}_{name}");
        if !table.has_column(&prefixed) {
            return prefixed;
        }

        (1..)
            .map(|n| format!("{prefixed}_{n}"))
            .find(|candidate| !table.has_column(candidate))
            .unwrap_or(prefixed)
    }

    /// Claims the lowest slot of `table`'s pool available to `lineage`,
    /// growing the pool by one column when none is.
    fn claim_shared_column(
        &mut self,
        table: TableId,
        class: &QualifiedName,
        lineage: &[QualifiedName],
        access: &str,
    ) -> Result<ColumnId> {
        if self.mapping.pool(table).is_none() {
            self.mapping.pools.push(SharedPool::new(table, None));
        }

        let available = self
            .mapping
            .pool(table)
            .and_then(|pool| pool.find_available(lineage));

        let slot = match available {
            Some(slot) => slot,
            None => self.grow_pool(table),
        };

        if let Some(pool) = self.mapping.pool_mut(table) {
            pool.claim(slot, class, access, lineage);
        }

        if self.is_prior_table(table) {
            self.report.claims_in_existing_tables.push(SlotClaimed {
                table: self.layout.table(table).name.clone(),
                class: class.to_string(),
                property: access.to_string(),
            });
        }

        self.shared_column(table, slot)
    }

    /// Appends one shared column to `table` and returns its slot.
    pub(super) fn grow_pool(&mut self, table: TableId) -> usize {
        let slot = self.mapping.pool(table).map(|pool| pool.size).unwrap_or(0);

        let base = format!("ps{}", slot + 1);
        let existing = self.layout.table(table);
        let name = if existing.has_column(&base) {
            (1..)
                .map(|n| format!("{base}_{n}"))
                .find(|candidate| !existing.has_column(candidate))
                .unwrap_or(base)
        } else {
            base
        };

        let shared = column(
            name,
            ColumnKind::Shared { slot },
            self.capability.storage_types.shared_column_type,
        );
        self.layout.table_mut(table).push_column(shared);

        if let Some(pool) = self.mapping.pool_mut(table) {
            pool.size = slot + 1;
        }

        slot
    }

    pub(super) fn shared_column(&self, table: TableId, slot: usize) -> Result<ColumnId> {
        let table = self.layout.table(table);
        table
            .columns
            .iter()
            .find(|column| column.slot() == Some(slot))
            .map(|column| column.id)
            .ok_or_else(|| {
                ecmap_core::err!("table {} has no column for shared slot {slot}", table.name)
            })
    }
}
