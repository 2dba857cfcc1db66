use ecmap_core::{
    driver::{
        operation::{ExecSql, QuerySql},
        Connection,
    },
    schema::{db, ec, Mapping},
    stmt::{self, Value},
    Error, Result,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// System table holding one row per imported schema.
pub(crate) const SCHEMA_TABLE: &str = "ec_Schema";

/// System table holding the layout and the mapping view.
pub(crate) const LAYOUT_TABLE: &str = "ec_Layout";

/// System table holding the instance id sequence.
pub(crate) const SEQUENCE_TABLE: &str = "ec_Sequence";

const INSTANCE_ID_SEQUENCE: &str = "ec_instanceidsequence";

/// Everything the engine knows about one database: the imported schemas,
/// the physical layout and the mapping between the two.
///
/// A catalog is loaded when a database is opened and is only replaced as a
/// whole, after an import committed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Catalog {
    pub(crate) schemas: IndexMap<String, ec::Schema>,
    pub(crate) layout: db::Schema,
    pub(crate) mapping: Mapping,
}

#[derive(Deserialize)]
struct LayoutRecord {
    layout: db::Schema,
    mapping: Mapping,
}

#[derive(Serialize)]
struct LayoutRecordRef<'a> {
    layout: &'a db::Schema,
    mapping: &'a Mapping,
}

impl Catalog {
    pub fn schemas(&self) -> impl ExactSizeIterator<Item = &ec::Schema> + '_ {
        self.schemas.values()
    }

    pub fn schema(&self, name: &str) -> Option<&ec::Schema> {
        self.schemas.get(name)
    }

    pub fn layout(&self) -> &db::Schema {
        &self.layout
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The persisted schemas as a set.
    pub fn schema_set(&self) -> ec::SchemaSet<'_> {
        ec::SchemaSet::new(self.schemas.values())
    }

    /// True for the names of the engine's own tables.
    pub fn is_system_table(name: &str) -> bool {
        [SCHEMA_TABLE, LAYOUT_TABLE, SEQUENCE_TABLE]
            .iter()
            .any(|table| table.eq_ignore_ascii_case(name))
    }

    /// Creates the system tables if needed and reads the catalog.
    pub(crate) async fn load(connection: &mut dyn Connection) -> Result<Catalog> {
        for sql in [
            format!(
                "CREATE TABLE IF NOT EXISTS \"{SCHEMA_TABLE}\" (\"Name\" TEXT PRIMARY KEY NOT NULL, \"Version\" TEXT NOT NULL, \"Json\" TEXT NOT NULL);"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS \"{LAYOUT_TABLE}\" (\"Id\" INTEGER PRIMARY KEY, \"Json\" TEXT NOT NULL);"
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS \"{SEQUENCE_TABLE}\" (\"Name\" TEXT PRIMARY KEY NOT NULL, \"Val\" INTEGER NOT NULL);"
            ),
            format!(
                "INSERT OR IGNORE INTO \"{SEQUENCE_TABLE}\" (\"Name\", \"Val\") VALUES ('{INSTANCE_ID_SEQUENCE}', 0);"
            ),
        ] {
            connection.exec(ExecSql::new(sql).into()).await?;
        }

        let mut catalog = Catalog::default();

        let rows = query_json(
            connection,
            format!("SELECT \"Json\" FROM \"{SCHEMA_TABLE}\" ORDER BY rowid;"),
        )
        .await?;

        for json in rows {
            let schema: ec::Schema = serde_json::from_str(&json)?;
            catalog.schemas.insert(schema.name.clone(), schema);
        }

        let rows = query_json(
            connection,
            format!("SELECT \"Json\" FROM \"{LAYOUT_TABLE}\" WHERE \"Id\" = 1;"),
        )
        .await?;

        if let Some(json) = rows.into_iter().next() {
            let record: LayoutRecord = serde_json::from_str(&json)?;
            catalog.layout = record.layout;
            catalog.mapping = record.mapping;
        } else if !catalog.schemas.is_empty() {
            return Err(Error::invalid_schema(format!(
                "`{LAYOUT_TABLE}` is missing although schemas are persisted"
            )));
        }

        tracing::debug!(
            schemas = catalog.schemas.len(),
            tables = catalog.layout.tables.len(),
            classes = catalog.mapping.classes.len(),
            "catalog loaded"
        );

        Ok(catalog)
    }

    /// Statements persisting `schemas` and the layout row. Upserting keeps a
    /// schema's row (and therefore its load order) stable across updates.
    pub(crate) fn persist<'a>(
        &self,
        schemas: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<ExecSql>> {
        let mut ret = vec![];

        for name in schemas {
            let Some(schema) = self.schemas.get(name) else {
                return Err(ecmap_core::err!("schema `{name}` is not part of the catalog"));
            };

            ret.push(ExecSql {
                sql: format!(
                    "INSERT INTO \"{SCHEMA_TABLE}\" (\"Name\", \"Version\", \"Json\") VALUES (?1, ?2, ?3) \
                     ON CONFLICT (\"Name\") DO UPDATE SET \"Version\" = excluded.\"Version\", \"Json\" = excluded.\"Json\";"
                ),
                params: vec![
                    Value::from(schema.name.as_str()),
                    Value::String(schema.version.to_string()),
                    Value::String(serde_json::to_string(schema)?),
                ],
            });
        }

        let record = LayoutRecordRef {
            layout: &self.layout,
            mapping: &self.mapping,
        };

        ret.push(ExecSql {
            sql: format!("INSERT OR REPLACE INTO \"{LAYOUT_TABLE}\" (\"Id\", \"Json\") VALUES (1, ?1);"),
            params: vec![Value::String(serde_json::to_string(&record)?)],
        });

        Ok(ret)
    }
}

/// Draws the next instance id for a row of `table`.
///
/// Ids come from one database-wide sequence, so an id is never handed out
/// twice, even after the instance holding it was deleted. The sequence skips
/// past ids already present in `table`, which matters for tables the engine
/// did not create.
pub(crate) async fn next_instance_id(
    connection: &mut dyn Connection,
    table: &db::Table,
) -> Result<i64> {
    let id = table
        .instance_id_column()
        .map(|column| column.name.as_str())
        .unwrap_or("Id");

    connection
        .exec(
            ExecSql {
                sql: format!(
                    "UPDATE \"{SEQUENCE_TABLE}\" SET \"Val\" = MAX(\"Val\", (SELECT COALESCE(MAX(\"{id}\"), 0) FROM \"{}\")) + 1 WHERE \"Name\" = ?1;",
                    table.name
                ),
                params: vec![Value::from(INSTANCE_ID_SEQUENCE)],
            }
            .into(),
        )
        .await?;

    let rows = connection
        .exec(
            QuerySql {
                sql: format!("SELECT \"Val\" FROM \"{SEQUENCE_TABLE}\" WHERE \"Name\" = ?1;"),
                params: vec![Value::from(INSTANCE_ID_SEQUENCE)],
                ret: vec![stmt::Type::I64],
            }
            .into(),
        )
        .await?
        .rows
        .into_values()?;

    rows.first()
        .and_then(|row| row.first())
        .and_then(Value::as_i64)
        .ok_or_else(|| ecmap_core::err!("the instance id sequence is missing"))
}

async fn query_json(connection: &mut dyn Connection, sql: String) -> Result<Vec<String>> {
    let rows = connection
        .exec(
            QuerySql {
                sql,
                params: vec![],
                ret: vec![stmt::Type::String],
            }
            .into(),
        )
        .await?
        .rows
        .into_values()?;

    rows.into_iter()
        .map(|row| match row.first() {
            Some(Value::String(json)) => Ok(json.clone()),
            other => Err(ecmap_core::err!("catalog row holds {other:?} instead of JSON text")),
        })
        .collect()
}
