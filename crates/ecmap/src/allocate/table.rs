use super::{column, Allocate};
use crate::{
    catalog::Catalog,
    relationship::{self, Selection},
    resolve::{self, Request},
};

use ecmap_core::{
    schema::{
        db::{ColumnId, ColumnKind, ForeignKey, TableId, TableKind, Type},
        ec::{Class, ClassId, End, ForeignKeyAction},
        mapping::{ClassMap, LinkTableMap, RelationshipMap, SharedPool, Strategy},
    },
    Error, Result,
};

impl Allocate<'_, '_> {
    /// Resolves the strategy of a class that has no mapping yet and assigns
    /// its tables.
    pub(super) fn map_class(&mut self, id: ClassId) -> Result<()> {
        let set = self.set;
        let entry = set.entry(id);
        let class = entry.class;

        let ancestors: Vec<&Class> = set
            .ancestors(id)
            .into_iter()
            .map(|ancestor| set.entry(ancestor).class)
            .collect();

        let parent = match set.parent(id) {
            Some(parent) => match self.mapping.class(set.name(parent)) {
                Some(parent_map) => Some((set.entry(parent).class, parent_map.clone())),
                None => {
                    return Err(Error::invalid_schema(format!(
                        "base class {} of {} is not mapped",
                        set.name(parent),
                        entry.name
                    )))
                }
            },
            None => None,
        };

        let strategy = resolve::resolve(&Request {
            name: &entry.name,
            class,
            base: parent.as_ref().map(|(class, map)| (*class, map.strategy)),
            ancestors: &ancestors,
            relationship: relationship::select_in(set, id),
            existing_tables: self.existing_tables,
        })?;

        let class_id = self.mapping.allocate_class_id();
        let mut map = ClassMap::new(entry.name.clone(), class_id, strategy);

        let tph_parent = parent
            .as_ref()
            .map(|(_, map)| map)
            .filter(|parent| parent.strategy.is_table_per_hierarchy() && parent.is_mapped());

        match strategy.strategy {
            Strategy::NotMapped
            | Strategy::ForeignKeyRelationshipInSourceTable
            | Strategy::ForeignKeyRelationshipInTargetTable => {}
            Strategy::SharedTable if strategy.polymorphic => match tph_parent {
                Some(parent) => self.join_hierarchy(id, parent, &mut map)?,
                None => self.create_hierarchy_root(id, &mut map)?,
            },
            Strategy::OwnTable => {
                let name = self.default_table_name(id);
                let table = self.create_table(name, TableKind::Primary, None);
                map.table = Some(table);

                if class.relationship().is_some() {
                    self.map_link_table(id, table)?;
                }
            }
            Strategy::SharedTable => self.map_shared_table(id, &mut map)?,
            Strategy::ExistingTable => self.map_existing_table(id, &mut map)?,
        }

        tracing::debug!(
            class = %entry.name,
            id = class_id,
            strategy = %map.strategy,
            table = ?map.table,
            "class mapped"
        );

        self.mapping.classes.insert(entry.name.clone(), map);
        self.new_classes.push(id);
        Ok(())
    }

    fn create_hierarchy_root(&mut self, id: ClassId, map: &mut ClassMap) -> Result<()> {
        let set = self.set;
        let class = set.entry(id).class;
        let directives = &class.map;

        let name = self.default_table_name(id);
        let table = self.create_table(name, TableKind::Primary, None);
        map.table = Some(table);
        map.share_own_properties =
            directives.options.shared_columns && !directives.apply_to_subclasses_only;
        map.share_subclass_properties = directives.requests_shared_columns();
        map.joined_table_per_direct_subclass = directives.joined_table_per_direct_subclass;

        if class.relationship().is_some() {
            self.map_link_table(id, table)?;
        }

        if let Some(count) = directives.shared_column_count {
            self.create_pool(table, Some(count));
        }

        Ok(())
    }

    fn join_hierarchy(&mut self, id: ClassId, parent: &ClassMap, map: &mut ClassMap) -> Result<()> {
        let set = self.set;
        let class = set.entry(id).class;
        let directives = &class.map;

        let Some(root) = parent.table else {
            return Err(Error::invalid_schema(format!(
                "base class {} has no table",
                parent.class
            )));
        };

        map.table = Some(root);

        if parent.joined_table_per_direct_subclass {
            let name = self.default_table_name(id);
            let joined = self.create_table(name, TableKind::Joined, Some(root));
            map.joined_table = Some(joined);

            if let Some(count) = directives.shared_column_count {
                self.create_pool(joined, Some(count));
            }
        } else {
            map.joined_table = parent.joined_table;
        }

        if directives.disable_shared_columns {
            map.share_own_properties = false;
            map.share_subclass_properties = false;
        } else {
            map.share_own_properties = parent.share_subclass_properties
                || (directives.options.shared_columns && !directives.apply_to_subclasses_only);
            map.share_subclass_properties =
                parent.share_subclass_properties || directives.requests_shared_columns();
        }
        map.joined_table_per_direct_subclass = directives.joined_table_per_direct_subclass;

        if class.relationship().is_some() {
            let base = self
                .mapping
                .relationship(&parent.class)
                .cloned()
                .ok_or_else(|| {
                    Error::invalid_schema(format!(
                        "base relationship {} of {} has no link table",
                        parent.class, map.class
                    ))
                })?;
            self.mapping.relationships.insert(map.class.clone(), base);
        }

        Ok(())
    }

    /// SharedTable, non-polymorphic: every class naming the table shares it.
    fn map_shared_table(&mut self, id: ClassId, map: &mut ClassMap) -> Result<()> {
        let set = self.set;
        let entry = set.entry(id);
        let Some(name) = entry.class.map.table_name.as_deref() else {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                "MapStrategy SharedTable, non-polymorphic expects TableName to be set.",
            ));
        };

        if Catalog::is_system_table(name) {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!("Table {name} is reserved for internal use."),
            ));
        }

        if let Some(table) = self.layout.table_by_name(name) {
            let conflict = table.kind != TableKind::Primary
                || self.mapping.classes_in_table(table.id).any(|other| {
                    other.strategy.strategy != Strategy::SharedTable || other.strategy.polymorphic
                });

            if conflict {
                return Err(Error::illegal_strategy_configuration(
                    entry.name.to_string(),
                    format!("Table {name} is already used by another ECClass for a different mapping type."),
                ));
            }

            map.table = Some(table.id);
            return Ok(());
        }

        if self.existing_tables.contains(name) {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!(
                    "Table {name} already exists in the database but was not created by ECDb. To map to it, the MapStrategy 'ExistingTable' is required."
                ),
            ));
        }

        map.table = Some(self.create_table(name.to_string(), TableKind::Primary, None));
        Ok(())
    }

    fn map_existing_table(&mut self, id: ClassId, map: &mut ClassMap) -> Result<()> {
        let set = self.set;
        let existing_tables = self.existing_tables;
        let entry = set.entry(id);
        let directives = &entry.class.map;

        let Some(name) = directives.table_name.as_deref() else {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                "MapStrategy ExistingTable expects TableName to be set",
            ));
        };

        if let Some(table) = self.layout.table_by_name(name) {
            if !table.is_existing() {
                return Err(Error::illegal_strategy_configuration(
                    entry.name.to_string(),
                    format!("Table {name} is already used by another ECClass for a different mapping type."),
                ));
            }
            map.table = Some(table.id);
            return Ok(());
        }

        let Some(columns) = existing_tables.get(name) else {
            return Err(Error::unresolvable_table_reference(
                entry.name.to_string(),
                name,
            ));
        };

        let id_column = directives.instance_id_column.as_deref().unwrap_or("Id");
        if !columns
            .iter()
            .any(|column| column.name.eq_ignore_ascii_case(id_column))
        {
            return Err(Error::illegal_strategy_configuration(
                entry.name.to_string(),
                format!("Table {name} has no instance id column '{id_column}'."),
            ));
        }

        let table = self.layout.push_table(name.to_string(), TableKind::Existing);
        for info in columns {
            let kind = if info.name.eq_ignore_ascii_case(id_column) {
                ColumnKind::InstanceId
            } else {
                ColumnKind::Existing
            };
            let mut existing = column(info.name.clone(), kind, declared_type(&info.declared_type));
            existing.nullable = kind != ColumnKind::InstanceId;
            self.layout.table_mut(table).push_column(existing);
        }

        map.table = Some(table);
        Ok(())
    }

    /// Adds the link columns and indexes of a link-table relationship to
    /// its freshly created table.
    fn map_link_table(&mut self, id: ClassId, table: TableId) -> Result<()> {
        let set = self.set;
        let entry = set.entry(id);
        let Some(relationship) = entry.class.relationship() else {
            return Ok(());
        };

        let selection = relationship::select_in(set, id).map(|request| request.selection);
        let allow_duplicates = match selection {
            Some(Selection::LinkTable { allow_duplicates }) => allow_duplicates,
            _ => false,
        };

        let root = set.ancestors(id).last().copied().unwrap_or(id);
        let link_directives = set.entry(root).class.map.link_table.clone().unwrap_or_default();

        let source_table = self.single_end_table(id, End::Source)?;
        let target_table = self.single_end_table(id, End::Target)?;

        let source_id = self.push_link_column(
            table,
            link_directives
                .source_column
                .clone()
                .unwrap_or_else(|| "SourceECInstanceId".to_string()),
            ColumnKind::SourceId,
            source_table,
        );
        let source_class_id =
            self.push_link_column(table, "SourceECClassId".to_string(), ColumnKind::SourceClassId, None);
        let target_id = self.push_link_column(
            table,
            link_directives
                .target_column
                .clone()
                .unwrap_or_else(|| "TargetECInstanceId".to_string()),
            ColumnKind::TargetId,
            target_table,
        );
        let target_class_id =
            self.push_link_column(table, "TargetECClassId".to_string(), ColumnKind::TargetClassId, None);

        let prefix = format!("{}_{}", entry.schema.alias, entry.class.name);
        let mut unique_index = None;

        if !allow_duplicates {
            unique_index = Some(self.push_index(
                table,
                format!("uix_{prefix}_sourcetarget"),
                vec![source_id, target_id],
                true,
                false,
            ));
        }

        let source_single = relationship.source.multiplicity.is_single();
        let target_single = relationship.target.multiplicity.is_single();

        self.push_index(
            table,
            format!("{}_{prefix}_source", if target_single && !allow_duplicates { "uix" } else { "ix" }),
            vec![source_id],
            target_single && !allow_duplicates,
            false,
        );
        self.push_index(
            table,
            format!("{}_{prefix}_target", if source_single && !allow_duplicates { "uix" } else { "ix" }),
            vec![target_id],
            source_single && !allow_duplicates,
            false,
        );

        self.mapping.relationships.insert(
            entry.name.clone(),
            RelationshipMap::LinkTable(LinkTableMap {
                table,
                source_id,
                source_class_id,
                target_id,
                target_class_id,
                allow_duplicates,
                unique_index,
            }),
        );

        Ok(())
    }

    fn push_link_column(
        &mut self,
        table: TableId,
        name: String,
        kind: ColumnKind,
        references: Option<TableId>,
    ) -> ColumnId {
        let mut link_column = column(name, kind, Some(Type::Integer));
        link_column.references = references.map(|referenced| ForeignKey {
            table: self.layout.table(referenced).name.clone(),
            column: "Id".to_string(),
            on_delete: ForeignKeyAction::Cascade,
        });
        self.layout.table_mut(table).push_column(link_column)
    }

    /// Creates a table with the system columns.
    pub(super) fn create_table(
        &mut self,
        name: String,
        kind: TableKind,
        parent: Option<TableId>,
    ) -> TableId {
        let references = parent.map(|parent| ForeignKey {
            table: self.layout.table(parent).name.clone(),
            column: "Id".to_string(),
            on_delete: ForeignKeyAction::Cascade,
        });

        let id = self.layout.push_table(name, kind);
        let table = self.layout.table_mut(id);
        table.parent = parent;

        let mut instance_id = column("Id", ColumnKind::InstanceId, Some(Type::Integer));
        instance_id.references = references;
        table.push_column(instance_id);
        table.push_column(column("ECClassId", ColumnKind::ClassId, Some(Type::Integer)));

        tracing::debug!(table = %table.name, ?kind, "table allocated");
        id
    }

    /// `<alias>_<Class>`, made unique among known tables and system tables.
    fn default_table_name(&self, id: ClassId) -> String {
        let entry = self.set.entry(id);
        let mut name = self
            .layout
            .unique_table_name(&format!("{}_{}", entry.schema.alias, entry.class.name));

        let mut n = 1;
        while Catalog::is_system_table(&name) || self.existing_tables.contains(&name) {
            name = self
                .layout
                .unique_table_name(&format!("{}_{}_{n}", entry.schema.alias, entry.class.name));
            n += 1;
        }
        name
    }

    /// Creates a pool with `count` columns up front.
    pub(super) fn create_pool(&mut self, table: TableId, count: Option<u32>) {
        if self.mapping.pool(table).is_none() {
            self.mapping.pools.push(SharedPool::new(table, count));
        }

        for _ in 0..count.unwrap_or(0) {
            self.grow_pool(table);
        }
    }
}

/// Storage type from a declared SQLite column type, by affinity.
fn declared_type(declared: &str) -> Option<Type> {
    let declared = declared.to_ascii_uppercase();

    if declared.is_empty() {
        None
    } else if declared.contains("INT") {
        Some(Type::Integer)
    } else if ["CHAR", "CLOB", "TEXT"].iter().any(|ty| declared.contains(ty)) {
        Some(Type::Text)
    } else if declared.contains("BLOB") {
        Some(Type::Blob)
    } else {
        Some(Type::Real)
    }
}
