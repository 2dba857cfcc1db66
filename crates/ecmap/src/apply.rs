//! Application of an accepted schema update.
//!
//! The layout diff becomes DDL, deletions become data statements, and the
//! catalog rows are rewritten. Everything runs in one transaction.

use crate::{
    allocate::{ClearedColumns, Report},
    catalog::Catalog,
    transaction,
};

use ecmap_core::{
    driver::{
        operation::ExecSql,
        Capability, Connection,
    },
    schema::{
        db::{self, ColumnId, TableId},
        mapping::{ClassMap, RelationshipMap},
    },
    stmt::Value,
    Result,
};
use ecmap_sql::{stmt::Expr, stmt::Select, MigrationStatement, Serializer, Statement};

use indexmap::IndexMap;

/// Writes the difference between `previous` and `next` to the database.
///
/// `schemas` names the schemas whose catalog rows are rewritten.
pub(crate) async fn apply(
    connection: &mut dyn Connection,
    previous: &Catalog,
    next: &Catalog,
    report: &Report,
    schemas: &[String],
) -> Result<()> {
    let statements = plan(
        previous,
        next,
        report,
        schemas,
        connection.capability(),
    )?;

    transaction::start(connection).await?;

    let result = exec_all(connection, statements).await;
    transaction::finish(connection, result).await
}

async fn exec_all(connection: &mut dyn Connection, statements: Vec<ExecSql>) -> Result<()> {
    for statement in statements {
        tracing::debug!(sql = %statement.sql, "schema update statement");
        connection.exec(statement.into()).await?;
    }
    Ok(())
}

/// The statements of an update, in execution order.
pub(crate) fn plan(
    previous: &Catalog,
    next: &Catalog,
    report: &Report,
    schemas: &[String],
    capability: &Capability,
) -> Result<Vec<ExecSql>> {
    let mut ret = vec![];

    let diff = db::SchemaDiff::from(&previous.layout, &next.layout)?;
    for migration in MigrationStatement::from_diff(&diff, capability) {
        let mut params = Vec::<Value>::new();
        let sql =
            Serializer::sqlite(migration.schema()).serialize(migration.statement(), &mut params);
        ret.push(ExecSql { sql, params });
    }

    let serializer = Serializer::sqlite(&next.layout);
    for statement in data_statements(next, report) {
        let mut params = Vec::<Value>::new();
        let sql = serializer.serialize(&statement, &mut params);
        ret.push(ExecSql { sql, params });
    }

    ret.extend(next.persist(schemas.iter().map(String::as_str))?);

    Ok(ret)
}

/// Row maintenance for deleted classes and properties.
fn data_statements(next: &Catalog, report: &Report) -> Vec<Statement> {
    let layout = &next.layout;
    let mut ret = vec![];

    // Relationship instances pointing at rows about to be purged go first.
    for class_map in &report.deleted_classes {
        for relationship in next.mapping.relationships.values() {
            ret.extend(detach(layout, relationship, class_map));
        }
    }

    for (class_id, relationship) in &report.deleted_relationships {
        if let RelationshipMap::EndTable(end_table) = relationship {
            if layout.table(end_table.host_table).is_existing() {
                continue;
            }
            ret.push(Statement::update(
                end_table.host_table,
                [
                    (end_table.foreign_key, Expr::null()),
                    (end_table.rel_class_id, Expr::null()),
                ],
                Expr::eq(Expr::column(end_table.rel_class_id), Expr::value(*class_id)),
            ));
        }
    }

    for class_map in &report.deleted_classes {
        // Joined tables first, then the table they hang off.
        for table in class_map.tables().into_iter().rev() {
            if let Some(filter) = class_filter(layout, table, class_map.id) {
                ret.push(Statement::delete(table, filter));
            }
        }
    }

    for cleared in &report.cleared_columns {
        ret.extend(clear(layout, cleared));
    }

    ret
}

/// Statements removing references to instances of `class_map` held by
/// `relationship`.
fn detach(
    layout: &db::Schema,
    relationship: &RelationshipMap,
    class_map: &ClassMap,
) -> Vec<Statement> {
    match relationship {
        RelationshipMap::LinkTable(link_table) => {
            vec![Statement::delete(
                link_table.table,
                Expr::or([
                    Expr::eq(Expr::column(link_table.source_class_id), Expr::value(class_map.id)),
                    Expr::eq(Expr::column(link_table.target_class_id), Expr::value(class_map.id)),
                ]),
            )]
        }
        RelationshipMap::EndTable(end_table) => {
            if layout.table(end_table.host_table).is_existing() {
                return vec![];
            }

            let mut ret = vec![];
            for table in class_map.table {
                let Some(id) = layout
                    .table(table)
                    .instance_id_column()
                    .map(|column| column.id)
                else {
                    continue;
                };
                let Some(filter) = class_filter(layout, table, class_map.id) else {
                    continue;
                };

                ret.push(Statement::update(
                    end_table.host_table,
                    [
                        (end_table.foreign_key, Expr::null()),
                        (end_table.rel_class_id, Expr::null()),
                    ],
                    Expr::in_subquery(
                        Expr::column(end_table.foreign_key),
                        Select::new(table, [id]).filter(filter),
                    ),
                ));
            }
            ret
        }
    }
}

/// Sets the columns of a deleted property to NULL in the rows of the class.
fn clear(layout: &db::Schema, cleared: &ClearedColumns) -> Vec<Statement> {
    let mut by_table: IndexMap<TableId, Vec<ColumnId>> = IndexMap::new();
    for column in &cleared.columns {
        by_table.entry(column.table).or_default().push(*column);
    }

    by_table
        .into_iter()
        .filter_map(|(table, columns)| {
            let filter = class_filter(layout, table, cleared.class_id)?;
            Some(Statement::update(
                table,
                columns.into_iter().map(|column| (column, Expr::null())),
                filter,
            ))
        })
        .collect()
}

/// `ECClassId = <class_id>` for tables the engine created.
fn class_filter(layout: &db::Schema, table: TableId, class_id: i64) -> Option<Expr> {
    let table = layout.table(table);
    if table.is_existing() {
        return None;
    }
    let column = table.class_id_column()?;
    Some(Expr::eq(Expr::column(column.id), Expr::value(class_id)))
}
