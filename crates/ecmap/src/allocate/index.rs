use super::Allocate;

use ecmap_core::{
    schema::{
        db::{ColumnId, Index, IndexId, TableId},
        ec::ClassId,
        mapping::ColumnValue,
    },
    Error, Result,
};

impl Allocate<'_, '_> {
    /// Adds an index to `table`. Generated names that are taken get a
    /// `_<n>` suffix.
    pub(super) fn push_index(
        &mut self,
        table: TableId,
        name: String,
        columns: Vec<ColumnId>,
        unique: bool,
        where_not_null: bool,
    ) -> IndexId {
        let name = if self.layout.index_name_exists(&name) {
            (1..)
                .map(|n| format!("{name}_{n}"))
                .find(|candidate| !self.layout.index_name_exists(candidate))
                .unwrap_or(name)
        } else {
            name
        };

        let index = Index {
            id: IndexId { table, index: 0 },
            name,
            columns,
            unique,
            where_not_null: where_not_null && self.capability.partial_indices,
        };

        self.layout.table_mut(table).push_index(index)
    }

    /// Creates the user-defined indexes of class `id`.
    pub(super) fn map_indexes(&mut self, id: ClassId) -> Result<()> {
        let set = self.set;
        let entry = set.entry(id);

        let Some(class_map) = self.mapping.class(&entry.name) else {
            return Ok(());
        };
        if !class_map.is_mapped() {
            return Ok(());
        }

        let mut indexes = vec![];

        for index in &entry.class.map.indexes {
            let mut columns = vec![];

            for property in &index.properties {
                let Some(property_map) = class_map.property(property) else {
                    return Err(Error::illegal_strategy_configuration(
                        entry.name.to_string(),
                        format!("DbIndex references property {property}, which is not a mapped property of the class."),
                    ));
                };

                columns.extend(
                    property_map
                        .columns
                        .iter()
                        .filter(|column| column.value != ColumnValue::NavigationRelClassId)
                        .map(|column| column.column),
                );
            }

            let Some(table) = columns.first().map(|column| column.table) else {
                return Err(Error::illegal_strategy_configuration(
                    entry.name.to_string(),
                    "DbIndex must name at least one property.",
                ));
            };

            if columns.iter().any(|column| column.table != table) {
                return Err(Error::illegal_strategy_configuration(
                    entry.name.to_string(),
                    "DbIndex properties map to columns of more than one table.",
                ));
            }

            let name = match &index.name {
                Some(name) => {
                    if self.layout.index_name_exists(name) {
                        return Err(Error::illegal_strategy_configuration(
                            entry.name.to_string(),
                            format!("Index {name} already exists."),
                        ));
                    }
                    name.clone()
                }
                None => format!(
                    "ix_{}_{}_{}",
                    entry.schema.alias,
                    entry.class.name,
                    index.properties.join("_")
                ),
            };

            indexes.push((table, name, columns, index.unique, index.where_not_null));
        }

        for (table, name, columns, unique, where_not_null) in indexes {
            self.push_index(table, name, columns, unique, where_not_null);
        }

        Ok(())
    }
}
