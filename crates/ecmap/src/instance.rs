//! Instance access driven by the mapping view.
//!
//! Enough to store, read back and relate instances of mapped classes. Values
//! are addressed by property access path (`S1`, `Origin.X`, `Parent.Id`).

use crate::{
    catalog::{self, Catalog},
    transaction,
};

use ecmap_core::{
    driver::{
        operation::{ExecSql, QuerySql},
        Connection,
    },
    schema::{
        db::{self, ColumnId, TableId},
        ec::{End, PrimitiveType, QualifiedName},
        mapping::{ClassMap, ColumnValue, RelationshipMap},
    },
    stmt::{self, Value},
    Error, Result,
};
use ecmap_sql::{
    stmt::{Expr, Select},
    Serializer, Statement,
};

use indexmap::IndexMap;

/// A stored instance, as read back by [`Db::get`](crate::Db::get).
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class: QualifiedName,
    pub id: i64,

    /// Stored values by access path. Unset values read as `Value::Null`.
    pub values: IndexMap<String, Value>,
}

/// Identifies an instance taking part in a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceKey {
    pub class: QualifiedName,
    pub id: i64,
}

impl Instance {
    pub fn value(&self, access: &str) -> Option<&Value> {
        self.values.get(access)
    }
}

impl InstanceKey {
    pub fn new(class: QualifiedName, id: i64) -> Self {
        Self { class, id }
    }
}

pub(crate) async fn insert(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    class: &QualifiedName,
    values: IndexMap<String, Value>,
) -> Result<i64> {
    let class_map = insertable(catalog, class)?;
    let Some(root) = class_map.table else {
        return Err(Error::invalid_statement(format!(
            "ECClass {class} is not mapped to a table"
        )));
    };

    let mut columns: IndexMap<TableId, Vec<(ColumnId, Value)>> = IndexMap::new();
    for table in class_map.tables() {
        columns.insert(table, vec![]);
    }

    for (access, value) in values {
        let column = class_map
            .columns()
            .find(|column| column.access == access)
            .ok_or_else(|| {
                Error::invalid_statement(format!("ECClass {class} has no property value `{access}`"))
            })?;

        columns
            .entry(column.column.table)
            .or_default()
            .push((column.column, value));
    }

    transaction::start(connection).await?;
    let result = insert_rows(connection, catalog, class_map, root, columns).await;
    let id = transaction::finish(connection, result).await?;

    tracing::debug!(%class, id, "instance inserted");
    Ok(id)
}

/// Writes one row per table of the instance, root table first.
async fn insert_rows(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    class_map: &ClassMap,
    root: TableId,
    columns: IndexMap<TableId, Vec<(ColumnId, Value)>>,
) -> Result<i64> {
    let id = catalog::next_instance_id(connection, catalog.layout.table(root)).await?;

    for (table_id, mut row) in columns {
        let table = catalog.layout.table(table_id);

        let Some(id_column) = table.instance_id_column() else {
            return Err(Error::invalid_statement(format!(
                "table {} has no instance id column",
                table.name
            )));
        };
        row.insert(0, (id_column.id, Value::I64(id)));

        if let Some(class_id_column) = table.class_id_column() {
            row.insert(1, (class_id_column.id, Value::I64(class_map.id)));
        }

        exec(connection, &catalog.layout, Statement::insert(table_id, row)).await?;
    }

    Ok(id)
}

pub(crate) async fn get(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    class: &QualifiedName,
    id: i64,
) -> Result<Instance> {
    let class_map = mapped(catalog, class)?;
    let not_found = || Error::record_not_found(format!("ECClass {class}, id {id}"));

    let mut values = IndexMap::new();

    for table_id in class_map.tables() {
        let table = catalog.layout.table(table_id);
        let Some(id_column) = table.instance_id_column() else {
            continue;
        };

        let columns: Vec<_> = class_map
            .columns()
            .filter(|column| column.column.table == table_id)
            .collect();

        let mut filter = vec![Expr::eq(Expr::column(id_column.id), Expr::value(id))];
        if let Some(class_id_column) = table.class_id_column() {
            filter.push(Expr::in_list(
                Expr::column(class_id_column.id),
                class_ids(catalog, class),
            ));
        }

        let select = Select::new(
            table_id,
            std::iter::once(id_column.id).chain(columns.iter().map(|column| column.column)),
        )
        .filter(Expr::and(filter));

        let ret = std::iter::once(stmt::Type::I64)
            .chain(
                columns
                    .iter()
                    .map(|column| decode_type(&catalog.layout, column.column, &column.value)),
            )
            .collect();

        let rows = query(connection, &catalog.layout, select, ret).await?;
        let Some(row) = rows.into_iter().next() else {
            return Err(not_found());
        };

        for (column, value) in columns.iter().zip(row.into_vec().into_iter().skip(1)) {
            values.insert(column.access.clone(), value);
        }
    }

    if class_map.tables().is_empty() {
        return Err(not_found());
    }

    Ok(Instance {
        class: class.clone(),
        id,
        values,
    })
}

pub(crate) async fn delete(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    class: &QualifiedName,
    id: i64,
) -> Result<()> {
    let class_map = mapped(catalog, class)?;
    let Some(root) = class_map.table else {
        return Err(Error::invalid_statement(format!(
            "ECClass {class} is not mapped to a table"
        )));
    };

    let table = catalog.layout.table(root);
    let Some(id_column) = table.instance_id_column() else {
        return Err(Error::invalid_statement(format!(
            "table {} has no instance id column",
            table.name
        )));
    };

    let class_ids = class_ids(catalog, class);

    let mut filter = vec![Expr::eq(Expr::column(id_column.id), Expr::value(id))];
    if let Some(class_id_column) = table.class_id_column() {
        filter.push(Expr::in_list(
            Expr::column(class_id_column.id),
            class_ids.iter().copied(),
        ));
    }

    let detach = detach(catalog, class, &class_ids, id);

    transaction::start(connection).await?;
    let deleted = delete_rows(connection, &catalog.layout, detach, root, Expr::and(filter)).await;
    let result = match deleted {
        Ok(0) => Err(Error::record_not_found(format!("ECClass {class}, id {id}"))),
        result => result.map(|_| ()),
    };
    transaction::finish(connection, result).await?;

    tracing::debug!(%class, id, "instance deleted");
    Ok(())
}

/// Removes the relationship instances referencing a row, then the row.
/// Joined rows go with the root row through their foreign key.
async fn delete_rows(
    connection: &mut dyn Connection,
    layout: &db::Schema,
    detach: Vec<Statement>,
    root: TableId,
    filter: Expr,
) -> Result<u64> {
    for statement in detach {
        exec(connection, layout, statement).await?;
    }

    exec(connection, layout, Statement::delete(root, filter)).await
}

/// Statements removing the relationship instances that reference instance
/// `id` of `class`: link table rows on either end, and foreign keys held by
/// other rows.
fn detach(catalog: &Catalog, class: &QualifiedName, class_ids: &[i64], id: i64) -> Vec<Statement> {
    let set = catalog.schema_set();

    // The row may belong to `class`, a base of it or a subclass of it.
    let related: Vec<QualifiedName> = match set.class_id(class) {
        Some(class_id) => set
            .lineage(class_id)
            .into_iter()
            .chain(
                set.descendants(class_id)
                    .into_iter()
                    .map(|descendant| set.name(descendant).clone()),
            )
            .collect(),
        None => vec![class.clone()],
    };

    let mut ret = vec![];

    for (name, relationship_map) in &catalog.mapping.relationships {
        match relationship_map {
            RelationshipMap::LinkTable(link_table) => {
                let end = |instance: ColumnId, class: ColumnId| {
                    Expr::and([
                        Expr::eq(Expr::column(instance), Expr::value(id)),
                        Expr::in_list(Expr::column(class), class_ids.iter().copied()),
                    ])
                };

                ret.push(Statement::delete(
                    link_table.table,
                    Expr::or([
                        end(link_table.source_id, link_table.source_class_id),
                        end(link_table.target_id, link_table.target_class_id),
                    ]),
                ));
            }
            RelationshipMap::EndTable(end_table) => {
                let Some(relationship) = set.class(name).and_then(|class| class.relationship())
                else {
                    continue;
                };

                let referenced = relationship.constraint(end_table.referenced_end());
                if !referenced.classes.iter().any(|class| related.contains(class)) {
                    continue;
                }

                ret.push(Statement::update(
                    end_table.host_table,
                    [
                        (end_table.foreign_key, Expr::null()),
                        (end_table.rel_class_id, Expr::null()),
                    ],
                    Expr::eq(Expr::column(end_table.foreign_key), Expr::value(id)),
                ));
            }
        }
    }

    ret
}

/// Inserts an instance of relationship `relationship` between `source` and
/// `target`.
pub(crate) async fn relate(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    relationship: &QualifiedName,
    source: &InstanceKey,
    target: &InstanceKey,
) -> Result<()> {
    let Some(relationship_map) = catalog.mapping.relationship(relationship) else {
        return Err(Error::invalid_statement(format!(
            "{relationship} is not a mapped ECRelationshipClass"
        )));
    };
    let relationship_class = insertable(catalog, relationship)?;

    match relationship_map {
        RelationshipMap::EndTable(end_table) => {
            let (host, referenced) = match end_table.referenced_end() {
                End::Source => (target, source),
                End::Target => (source, target),
            };

            let table = catalog.layout.table(end_table.host_table);
            let Some(id_column) = table.instance_id_column() else {
                return Err(Error::invalid_statement(format!(
                    "table {} has no instance id column",
                    table.name
                )));
            };

            let count = exec(
                connection,
                &catalog.layout,
                Statement::update(
                    end_table.host_table,
                    [
                        (end_table.foreign_key, Expr::value(referenced.id)),
                        (end_table.rel_class_id, Expr::value(relationship_class.id)),
                    ],
                    Expr::and([
                        Expr::eq(Expr::column(id_column.id), Expr::value(host.id)),
                        Expr::is_null(Expr::column(end_table.foreign_key)),
                    ]),
                ),
            )
            .await?;

            if count == 0 {
                return Err(Error::constraint_violation(format!(
                    "instance {} of {} is already related through {relationship} or does not exist",
                    host.id, host.class
                )));
            }
        }
        RelationshipMap::LinkTable(link_table) => {
            let source_class = class_id(catalog, &source.class)?;
            let target_class = class_id(catalog, &target.class)?;

            let row = [
                (link_table.source_id, Value::I64(source.id)),
                (link_table.source_class_id, Value::I64(source_class)),
                (link_table.target_id, Value::I64(target.id)),
                (link_table.target_class_id, Value::I64(target_class)),
            ];

            transaction::start(connection).await?;
            let result = insert_link_row(
                connection,
                catalog,
                link_table.table,
                relationship_class.id,
                row,
            )
            .await;
            transaction::finish(connection, result).await?;
        }
    }

    tracing::debug!(%relationship, source = source.id, target = target.id, "relationship inserted");
    Ok(())
}

async fn insert_link_row(
    connection: &mut dyn Connection,
    catalog: &Catalog,
    table_id: TableId,
    relationship_class: i64,
    ends: [(ColumnId, Value); 4],
) -> Result<()> {
    let table = catalog.layout.table(table_id);
    let Some(id_column) = table.instance_id_column() else {
        return Err(Error::invalid_statement(format!(
            "table {} has no instance id column",
            table.name
        )));
    };

    let id = catalog::next_instance_id(connection, table).await?;

    let mut row = vec![(id_column.id, Value::I64(id))];
    if let Some(class_id_column) = table.class_id_column() {
        row.push((class_id_column.id, Value::I64(relationship_class)));
    }
    row.extend(ends);

    exec(connection, &catalog.layout, Statement::insert(table_id, row)).await?;
    Ok(())
}

fn mapped<'a>(catalog: &'a Catalog, class: &QualifiedName) -> Result<&'a ClassMap> {
    catalog
        .mapping
        .class(class)
        .filter(|class_map| class_map.is_mapped())
        .ok_or_else(|| Error::invalid_statement(format!("ECClass {class} is not mapped")))
}

/// The mapping of a class that may receive new instances.
fn insertable<'a>(catalog: &'a Catalog, class: &QualifiedName) -> Result<&'a ClassMap> {
    let set = catalog.schema_set();

    let Some(definition) = set.class(class) else {
        return Err(Error::invalid_statement(format!("ECClass {class} does not exist")));
    };

    if definition.is_abstract() {
        return Err(Error::invalid_statement(format!(
            "Cannot insert an instance of abstract ECClass {class}"
        )));
    }

    let Some(class_map) = catalog.mapping.class(class) else {
        return Err(Error::invalid_statement(format!("ECClass {class} is not mapped")));
    };

    if class_map.strategy.options.readonly {
        return Err(Error::invalid_statement(format!(
            "Cannot insert an instance of ECClass {class}, which is mapped read-only"
        )));
    }

    if class_map.strategy.is_not_mapped() {
        return Err(Error::invalid_statement(format!(
            "Cannot insert an instance of ECClass {class}, which is not mapped"
        )));
    }

    Ok(class_map)
}

fn class_id(catalog: &Catalog, class: &QualifiedName) -> Result<i64> {
    catalog
        .mapping
        .class(class)
        .map(|class_map| class_map.id)
        .ok_or_else(|| Error::invalid_statement(format!("ECClass {class} is not mapped")))
}

/// Class ids of `class` and its mapped subclasses.
fn class_ids(catalog: &Catalog, class: &QualifiedName) -> Vec<i64> {
    let set = catalog.schema_set();
    let mut names = vec![class.clone()];
    if let Some(id) = set.class_id(class) {
        names.extend(set.descendants(id).into_iter().map(|id| set.name(id).clone()));
    }

    names
        .iter()
        .filter_map(|name| catalog.mapping.class(name))
        .map(|class_map| class_map.id)
        .collect()
}

fn decode_type(layout: &db::Schema, column: ColumnId, value: &ColumnValue) -> stmt::Type {
    match value {
        ColumnValue::Primitive(PrimitiveType::Boolean) => stmt::Type::Bool,
        _ => layout
            .column(column)
            .storage_ty
            .map(db::Type::stmt_type)
            .unwrap_or(stmt::Type::Any),
    }
}

async fn exec(
    connection: &mut dyn Connection,
    layout: &db::Schema,
    statement: Statement,
) -> Result<u64> {
    let mut params = Vec::<Value>::new();
    let sql = Serializer::sqlite(layout).serialize(&statement, &mut params);
    connection
        .exec(ExecSql { sql, params }.into())
        .await?
        .rows
        .into_count()
}

async fn query(
    connection: &mut dyn Connection,
    layout: &db::Schema,
    select: Select,
    ret: Vec<stmt::Type>,
) -> Result<Vec<stmt::ValueRecord>> {
    let mut params = Vec::<Value>::new();
    let sql = Serializer::sqlite(layout).serialize(&select.into(), &mut params);
    connection
        .exec(QuerySql { sql, params, ret }.into())
        .await?
        .rows
        .into_values()
}
