mod builder;
pub use builder::Builder;

mod connect;

use crate::{
    allocate,
    apply,
    catalog::Catalog,
    instance::{self, Instance, InstanceKey},
    resolve::ExistingTables,
    validate, Config,
};

use ecmap_core::{
    driver::{
        operation::{DescribeTable, TableColumnInfo},
        Connection,
    },
    schema::{
        db,
        ec::{
            self,
            diff::{DiffContext, SchemaDiff},
            QualifiedName, SchemaSet,
        },
        Mapping,
    },
    stmt::Value,
    Error, Result,
};

use indexmap::IndexMap;

/// An open database.
///
/// The handle owns its connection and the catalog loaded from it. Schema
/// imports take `&mut self`, so at most one is in flight per handle.
#[derive(Debug)]
pub struct Db {
    connection: Box<dyn Connection>,
    catalog: Catalog,
    config: Config,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// How every imported class and relationship is stored.
    pub fn mapping(&self) -> &Mapping {
        &self.catalog.mapping
    }

    /// The physical tables the engine knows about.
    pub fn layout(&self) -> &db::Schema {
        &self.catalog.layout
    }

    /// Imports new schemas or new revisions of imported ones.
    ///
    /// Either every candidate is accepted and persisted, or nothing changes.
    pub async fn import_schemas(
        &mut self,
        candidates: impl IntoIterator<Item = ec::Schema>,
    ) -> Result<()> {
        let candidates: Vec<ec::Schema> = candidates.into_iter().collect();
        let names: Vec<String> = candidates.iter().map(|schema| schema.name.clone()).collect();

        match self.import(candidates).await {
            Ok(changed) if changed.is_empty() => {
                tracing::debug!(schemas = ?names, "schemas unchanged");
                Ok(())
            }
            Ok(changed) => {
                tracing::info!(
                    schemas = ?changed,
                    tables = self.catalog.layout.tables.len(),
                    classes = self.catalog.mapping.classes.len(),
                    "schemas imported"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(schemas = ?names, %err, "schema import rejected");
                Err(err)
            }
        }
    }

    async fn import(&mut self, candidates: Vec<ec::Schema>) -> Result<Vec<String>> {
        let mut schemas = self.catalog.schemas.clone();
        let mut names = vec![];

        for schema in candidates {
            if names.contains(&schema.name) {
                return Err(Error::invalid_schema(format!(
                    "ECSchema {} is imported more than once",
                    schema.name
                )));
            }
            names.push(schema.name.clone());
            schemas.insert(schema.name.clone(), schema);
        }

        let mut next = Catalog {
            schemas: IndexMap::new(),
            layout: self.catalog.layout.clone(),
            mapping: self.catalog.mapping.clone(),
        };

        let (report, changed) = {
            let previous_set = self.catalog.schema_set();
            let next_set = SchemaSet::new(schemas.values());
            let diff_cx = DiffContext::new(&previous_set, &next_set);
            let validate_cx = validate::Context {
                previous: &previous_set,
                next: &next_set,
                catalog: &self.catalog,
            };

            let mut changed = vec![];

            for name in &names {
                let Some(schema) = schemas.get(name) else {
                    continue;
                };

                let diff = SchemaDiff::from(&diff_cx, self.catalog.schema(name), schema);
                if diff.is_empty() {
                    continue;
                }

                tracing::debug!(
                    schema = %name,
                    previous = ?diff.previous_version,
                    version = %diff.version,
                    changes = diff.changes.len(),
                    "schema diff"
                );

                validate::validate(&validate_cx, &diff, &self.config)?;
                changed.push(name.clone());
            }

            if changed.is_empty() {
                return Ok(changed);
            }

            for name in &changed {
                if let Some(schema) = schemas.get(name) {
                    next_set.verify(schema)?;
                }
            }

            let existing_tables = describe_tables(&mut *self.connection, &next_set).await?;
            let capability = self.connection.capability();

            let report = allocate::allocate(&next_set, &mut next, &existing_tables, capability)?;
            validate::check_policy(&self.config, &report)?;
            validate::check_schema_policies(&validate_cx, &next.mapping)?;

            (report, changed)
        };

        next.schemas = schemas;

        apply::apply(&mut *self.connection, &self.catalog, &next, &report, &changed).await?;

        self.catalog = next;
        Ok(changed)
    }

    /// Inserts an instance of `class` and returns its id.
    pub async fn insert<K, V>(
        &mut self,
        class: &QualifiedName,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<i64>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let values = values
            .into_iter()
            .map(|(access, value)| (access.into(), value.into()))
            .collect();
        instance::insert(&mut *self.connection, &self.catalog, class, values).await
    }

    /// Reads an instance of `class` or one of its subclasses.
    pub async fn get(&mut self, class: &QualifiedName, id: i64) -> Result<Instance> {
        instance::get(&mut *self.connection, &self.catalog, class, id).await
    }

    pub async fn delete(&mut self, class: &QualifiedName, id: i64) -> Result<()> {
        instance::delete(&mut *self.connection, &self.catalog, class, id).await
    }

    /// Inserts an instance of `relationship` from `source` to `target`.
    pub async fn relate(
        &mut self,
        relationship: &QualifiedName,
        source: &InstanceKey,
        target: &InstanceKey,
    ) -> Result<()> {
        instance::relate(&mut *self.connection, &self.catalog, relationship, source, target).await
    }
}

/// Describes every table named by a mapping directive.
async fn describe_tables(
    connection: &mut dyn Connection,
    set: &SchemaSet<'_>,
) -> Result<ExistingTables> {
    let mut ret = ExistingTables::new();

    for entry in set.classes() {
        let Some(name) = &entry.class.map.table_name else {
            continue;
        };
        if ret.contains(name) {
            continue;
        }

        let rows = connection
            .exec(DescribeTable { name: name.clone() }.into())
            .await?
            .rows
            .into_values()?;

        let columns = rows
            .into_iter()
            .map(|row| match (row.first(), row.get(1)) {
                (Some(Value::String(name)), Some(Value::String(declared_type))) => {
                    Ok(TableColumnInfo {
                        name: name.clone(),
                        declared_type: declared_type.clone(),
                    })
                }
                other => Err(ecmap_core::err!("unexpected table description row {other:?}")),
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(table = %name, columns = columns.len(), "table described");
        ret.insert(name.clone(), columns);
    }

    Ok(ret)
}
