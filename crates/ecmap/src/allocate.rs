//! Table and column allocation.
//!
//! Allocation extends an existing layout and mapping in place. It never
//! removes a table or a column and never moves a property that is already
//! mapped, so running it again over the same schemas is a no-op.

mod delete;
mod index;
mod property;
mod relationship;
mod table;

use crate::{catalog::Catalog, resolve::ExistingTables};

use ecmap_core::{
    driver::Capability,
    schema::{
        db::{self, Column, ColumnId, ColumnKind, TableId},
        ec::{ClassId, ClassType, SchemaSet},
        mapping::{ClassMap, RelationshipMap},
        Mapping,
    },
    Result,
};

/// What an allocation run changed, beyond the layout and mapping themselves.
#[derive(Debug, Default)]
pub(crate) struct Report {
    /// Shared column slots claimed in tables that existed before the run.
    pub(crate) claims_in_existing_tables: Vec<SlotClaimed>,

    /// Mappings of classes no longer present in the schemas.
    pub(crate) deleted_classes: Vec<ClassMap>,

    /// Relationship mappings of deleted relationship classes, with the
    /// relationship's class id.
    pub(crate) deleted_relationships: Vec<(i64, RelationshipMap)>,

    /// Columns of deleted properties, per class still holding rows in them.
    pub(crate) cleared_columns: Vec<ClearedColumns>,
}

#[derive(Debug)]
pub(crate) struct SlotClaimed {
    pub(crate) table: String,
    pub(crate) class: String,
    pub(crate) property: String,
}

#[derive(Debug)]
pub(crate) struct ClearedColumns {
    pub(crate) class_id: i64,
    pub(crate) columns: Vec<ColumnId>,
}

/// State of one allocation run.
struct Allocate<'a, 'b> {
    set: &'b SchemaSet<'a>,

    layout: &'b mut db::Schema,

    mapping: &'b mut Mapping,

    existing_tables: &'b ExistingTables,

    capability: &'static Capability,

    /// Number of tables in the layout before this run.
    prior_tables: usize,

    /// Classes that received their mapping in this run.
    new_classes: Vec<ClassId>,

    report: Report,
}

/// Brings `catalog`'s layout and mapping up to date with `set`.
pub(crate) fn allocate(
    set: &SchemaSet<'_>,
    catalog: &mut Catalog,
    existing_tables: &ExistingTables,
    capability: &'static Capability,
) -> Result<Report> {
    let prior_tables = catalog.layout.tables.len();

    let mut allocate = Allocate {
        set,
        layout: &mut catalog.layout,
        mapping: &mut catalog.mapping,
        existing_tables,
        capability,
        prior_tables,
        new_classes: vec![],
        report: Report::default(),
    };

    allocate.remove_deleted_classes();
    allocate.remove_hidden_properties();

    let order = set.hierarchy_order();

    // Entities first, so that relationship ends are mapped before the
    // relationships referencing them.
    for &id in &order {
        let class = set.entry(id).class;
        if class.class_type() != ClassType::Relationship && allocate.is_new(id) {
            allocate.map_class(id)?;
        }
    }

    for &id in &order {
        let class = set.entry(id).class;
        if class.class_type() == ClassType::Relationship && allocate.is_new(id) {
            allocate.map_class(id)?;
        }
    }

    for &id in &order {
        allocate.map_properties(id)?;
    }

    for &id in &order {
        allocate.map_end_table(id)?;
    }

    for &id in &order {
        allocate.map_navigation_properties(id)?;
    }

    for id in allocate.new_classes.clone() {
        allocate.map_indexes(id)?;
    }

    tracing::debug!(
        tables = allocate.layout.tables.len() - prior_tables,
        classes = allocate.new_classes.len(),
        "allocation finished"
    );

    Ok(allocate.report)
}

impl Allocate<'_, '_> {
    fn is_new(&self, id: ClassId) -> bool {
        self.mapping.class(self.set.name(id)).is_none()
    }

    /// True for tables that existed before this run.
    fn is_prior_table(&self, table: TableId) -> bool {
        table.0 < self.prior_tables
    }
}

/// A column value for [`db::Table::push_column`], which assigns the id.
fn column(name: impl Into<String>, kind: ColumnKind, storage_ty: Option<db::Type>) -> Column {
    let system = matches!(kind, ColumnKind::InstanceId | ColumnKind::ClassId);

    Column {
        id: ColumnId {
            table: TableId(0),
            index: 0,
        },
        name: name.into(),
        kind,
        storage_ty,
        nullable: !system,
        primary_key: kind == ColumnKind::InstanceId,
        collation: None,
        references: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ExistingTables;

    use ecmap_core::{
        driver::operation::TableColumnInfo,
        schema::{
            db::TableKind,
            ec::{
                MapDirectives, Multiplicity, PrimitiveType, Schema, SchemaBuilder,
                StrengthDirection, Version,
            },
            mapping::{ColumnValue, Strategy},
        },
    };
    use pretty_assertions::assert_eq;

    fn schema(version: Version, f: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> Schema {
        f(Schema::builder("TestSchema", "ts", version)).build()
    }

    fn run(catalog: &mut Catalog, schema: &Schema) -> Result<Report> {
        run_with(catalog, schema, &ExistingTables::new())
    }

    fn run_with(
        catalog: &mut Catalog,
        schema: &Schema,
        existing: &ExistingTables,
    ) -> Result<Report> {
        let set = SchemaSet::new([schema]);
        allocate(&set, catalog, existing, &Capability::SQLITE)
    }

    fn column_names(catalog: &Catalog, table: &str) -> Vec<String> {
        catalog
            .layout
            .table_by_name(table)
            .unwrap()
            .columns
            .iter()
            .map(|column| column.name.clone())
            .collect()
    }

    fn property_columns(catalog: &Catalog, class: &str, property: &str) -> Vec<String> {
        let class = catalog
            .mapping
            .class(&ecmap_core::schema::ec::QualifiedName::new("TestSchema", class))
            .unwrap();
        class
            .property(property)
            .unwrap()
            .columns
            .iter()
            .map(|column| catalog.layout.column(column.column).name.clone())
            .collect()
    }

    fn koo_hierarchy(version: Version) -> Schema {
        schema(version, |s| {
            s.entity("Koo", |c| {
                c.abstract_class()
                    .map(
                        MapDirectives::table_per_hierarchy()
                            .shared_columns()
                            .apply_to_subclasses_only()
                            .shared_column_count(5),
                    )
                    .primitive("L1", PrimitiveType::Long)
                    .primitive("S1", PrimitiveType::String)
            })
            .entity("Foo", |c| {
                c.base("Koo")
                    .primitive("L2", PrimitiveType::Long)
                    .primitive("S2", PrimitiveType::String)
            })
        })
    }

    #[test]
    fn own_table_per_class() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.struct_class("Pt", |c| {
                c.primitive("X", PrimitiveType::Double)
                    .primitive("Y", PrimitiveType::Double)
            })
                .entity("Foo", |c| {
                    c.primitive("S1", PrimitiveType::String)
                        .primitive("P", PrimitiveType::Point3d)
                        .struct_property("Origin", "Pt")
                        .primitive_array("Tags", PrimitiveType::String)
                })
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &schema).unwrap();

        assert_eq!(
            column_names(&catalog, "ts_Foo"),
            vec!["Id", "ECClassId", "S1", "P_X", "P_Y", "P_Z", "Origin_X", "Origin_Y", "Tags"]
        );
        assert_eq!(property_columns(&catalog, "Foo", "Origin"), vec!["Origin_X", "Origin_Y"]);

        let foo = catalog.mapping.class(&schema.qualify("Foo")).unwrap();
        assert_eq!(foo.strategy.strategy, Strategy::OwnTable);
        assert_eq!(foo.property("Tags").unwrap().columns[0].value, ColumnValue::Array);

        let point = catalog.mapping.class(&schema.qualify("Pt")).unwrap();
        assert!(!point.is_mapped());
        assert_ne!(point.id, foo.id);
    }

    #[test]
    fn table_per_hierarchy_with_fixed_pool() {
        let mut catalog = Catalog::default();
        let schema = koo_hierarchy(Version::new(1, 0, 0));
        run(&mut catalog, &schema).unwrap();

        // 2 system columns, 5 pre-created shared columns and the dedicated
        // columns of Koo's own properties.
        assert_eq!(
            column_names(&catalog, "ts_Koo"),
            vec!["Id", "ECClassId", "ps1", "ps2", "ps3", "ps4", "ps5", "L1", "S1"]
        );
        assert_eq!(property_columns(&catalog, "Foo", "L1"), vec!["L1"]);
        assert_eq!(property_columns(&catalog, "Foo", "L2"), vec!["ps1"]);
        assert_eq!(property_columns(&catalog, "Foo", "S2"), vec!["ps2"]);
        assert!(catalog.layout.table_by_name("ts_Foo").is_none());
    }

    #[test]
    fn allocation_is_idempotent() {
        let mut catalog = Catalog::default();
        let schema = koo_hierarchy(Version::new(1, 0, 0));
        run(&mut catalog, &schema).unwrap();

        let before = catalog.clone();
        let report = run(&mut catalog, &schema).unwrap();
        assert_eq!(catalog, before);
        assert!(report.claims_in_existing_tables.is_empty());
    }

    #[test]
    fn siblings_share_slots_and_deleted_slots_are_not_reused() {
        let v1 = schema(Version::new(1, 0, 0), |s| {
            s.entity("Koo", |c| c.map(MapDirectives::table_per_hierarchy().shared_columns()))
                .entity("Foo", |c| c.base("Koo").primitive("S1", PrimitiveType::String))
                .entity("Boo", |c| c.base("Koo").primitive("B1", PrimitiveType::Long))
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &v1).unwrap();
        assert_eq!(property_columns(&catalog, "Foo", "S1"), vec!["ps1"]);
        assert_eq!(property_columns(&catalog, "Boo", "B1"), vec!["ps1"]);

        // Delete S1 from Foo
        let mut v2 = v1.with_version(Version::new(2, 0, 0));
        v2.class_mut("Foo").unwrap().properties.clear();
        let report = run(&mut catalog, &v2).unwrap();
        assert_eq!(report.cleared_columns.len(), 1);
        assert!(catalog
            .mapping
            .class(&v2.qualify("Foo"))
            .unwrap()
            .property("S1")
            .is_none());

        // Add it back: it gets a fresh slot
        let v3 = v1.with_version(Version::new(3, 0, 0));
        let report = run(&mut catalog, &v3).unwrap();
        assert_eq!(property_columns(&catalog, "Foo", "S1"), vec!["ps2"]);
        assert_eq!(report.claims_in_existing_tables.len(), 1);
        assert_eq!(catalog.mapping.pool(TableId(0)).unwrap().size, 2);
    }

    #[test]
    fn shared_slot_without_column_is_an_error() {
        let mut catalog = Catalog::default();
        run(&mut catalog, &koo_hierarchy(Version::new(1, 0, 0))).unwrap();

        // The pool still records its slots, but the layout lost the columns.
        for table in &mut catalog.layout.tables {
            for column in &mut table.columns {
                if column.slot().is_some() {
                    column.kind = ColumnKind::Dedicated;
                }
            }
        }

        let v2 = schema(Version::new(2, 0, 0), |s| {
            s.entity("Koo", |c| {
                c.abstract_class()
                    .map(
                        MapDirectives::table_per_hierarchy()
                            .shared_columns()
                            .apply_to_subclasses_only()
                            .shared_column_count(5),
                    )
                    .primitive("L1", PrimitiveType::Long)
                    .primitive("S1", PrimitiveType::String)
            })
            .entity("Foo", |c| {
                c.base("Koo")
                    .primitive("L2", PrimitiveType::Long)
                    .primitive("S2", PrimitiveType::String)
            })
            .entity("Zoo", |c| c.base("Koo").primitive("Z1", PrimitiveType::Long))
        });

        let err = run(&mut catalog, &v2).unwrap_err();
        assert!(err.to_string().contains("no column for shared slot"));
    }

    #[test]
    fn joined_table_per_direct_subclass() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Element", |c| {
                c.map(MapDirectives::table_per_hierarchy().joined_table_per_direct_subclass())
                    .primitive("Code", PrimitiveType::String)
            })
            .entity("Geometric", |c| {
                c.base("Element")
                    .map(MapDirectives::default().shared_columns().shared_column_count(2))
                    .primitive("Origin", PrimitiveType::Point2d)
            })
            .entity("Circle", |c| c.base("Geometric").primitive("Radius", PrimitiveType::Double))
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &schema).unwrap();

        let joined = catalog.layout.table_by_name("ts_Geometric").unwrap();
        assert_eq!(joined.kind, TableKind::Joined);
        assert_eq!(joined.parent, Some(catalog.layout.table_by_name("ts_Element").unwrap().id));
        assert_eq!(
            joined.columns[0].references.as_ref().unwrap().table,
            "ts_Element"
        );

        assert_eq!(
            column_names(&catalog, "ts_Geometric"),
            vec!["Id", "ECClassId", "ps1", "ps2", "ps3"]
        );
        assert_eq!(property_columns(&catalog, "Circle", "Code"), vec!["Code"]);
        assert_eq!(property_columns(&catalog, "Circle", "Origin"), vec!["ps1", "ps2"]);
        assert_eq!(property_columns(&catalog, "Circle", "Radius"), vec!["ps3"]);
    }

    #[test]
    fn existing_table_maps_to_described_columns() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Legacy", |c| {
                c.map(MapDirectives::existing_table("legacy").readonly())
                    .primitive("Name", PrimitiveType::String)
                    .primitive("Size", PrimitiveType::Long)
                    .column_name("sz")
            })
        });

        let mut existing = ExistingTables::new();
        existing.insert(
            "legacy",
            ["Id", "Name", "sz"]
                .iter()
                .map(|name| TableColumnInfo {
                    name: name.to_string(),
                    declared_type: String::new(),
                })
                .collect(),
        );

        let mut catalog = Catalog::default();
        run_with(&mut catalog, &schema, &existing).unwrap();

        let table = catalog.layout.table_by_name("legacy").unwrap();
        assert!(table.is_existing());
        assert!(table.class_id_column().is_none());
        assert_eq!(property_columns(&catalog, "Legacy", "Size"), vec!["sz"]);
    }

    #[test]
    fn existing_table_missing_column() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Legacy", |c| {
                c.map(MapDirectives::existing_table("legacy"))
                    .primitive("Missing", PrimitiveType::String)
            })
        });

        let mut existing = ExistingTables::new();
        existing.insert(
            "legacy",
            vec![TableColumnInfo {
                name: "Id".to_string(),
                declared_type: "INTEGER".to_string(),
            }],
        );

        let mut catalog = Catalog::default();
        let err = run_with(&mut catalog, &schema, &existing).unwrap_err();
        assert!(err.is_illegal_strategy_configuration());
    }

    #[test]
    fn end_table_relationship_uses_navigation_name() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Foo", |c| c)
                .entity("Goo", |c| {
                    c.navigation("Parent", "FooOwnsGoo", StrengthDirection::Backward)
                })
                .relationship("FooOwnsGoo", |r| {
                    r.source(Multiplicity::ZERO_ONE, "Foo")
                        .target(Multiplicity::ZERO_MANY, "Goo")
                })
                .relationship("OneFooHasOneGoo", |r| {
                    r.source(Multiplicity::ZERO_ONE, "Foo")
                        .target(Multiplicity::ZERO_ONE, "Goo")
                })
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &schema).unwrap();

        assert_eq!(
            column_names(&catalog, "ts_Goo"),
            vec![
                "Id",
                "ECClassId",
                "ParentId",
                "ParentRelECClassId",
                "ForeignECInstanceId_OneFooHasOneGoo",
                "ForeignECClassId_OneFooHasOneGoo"
            ]
        );
        assert_eq!(
            property_columns(&catalog, "Goo", "Parent"),
            vec!["ParentId", "ParentRelECClassId"]
        );

        let one_to_one = catalog
            .mapping
            .relationship(&schema.qualify("OneFooHasOneGoo"))
            .unwrap()
            .as_end_table()
            .unwrap();
        let index = catalog.layout.index(one_to_one.unique_index.unwrap());
        assert_eq!(index.name, "uix_ts_OneFooHasOneGoo_fk");
        assert!(index.unique);
    }

    #[test]
    fn link_table_columns_and_indexes() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Foo", |c| c)
                .entity("Goo", |c| c)
                .relationship("FooRefersToGoo", |r| {
                    r.source(Multiplicity::ZERO_MANY, "Foo")
                        .target(Multiplicity::ZERO_MANY, "Goo")
                        .primitive("Weight", PrimitiveType::Double)
                })
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &schema).unwrap();

        assert_eq!(
            column_names(&catalog, "ts_FooRefersToGoo"),
            vec![
                "Id",
                "ECClassId",
                "SourceECInstanceId",
                "SourceECClassId",
                "TargetECInstanceId",
                "TargetECClassId",
                "Weight"
            ]
        );

        let table = catalog.layout.table_by_name("ts_FooRefersToGoo").unwrap();
        let names: Vec<_> = table.indices.iter().map(|index| index.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "uix_ts_FooRefersToGoo_sourcetarget",
                "ix_ts_FooRefersToGoo_source",
                "ix_ts_FooRefersToGoo_target"
            ]
        );
    }

    #[test]
    fn unmapped_relationship_end_is_rejected() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Foo", |c| c.map(MapDirectives::not_mapped()))
                .entity("Goo", |c| c)
                .relationship("FooHasGoo", |r| {
                    r.source(Multiplicity::ZERO_ONE, "Foo")
                        .target(Multiplicity::ZERO_MANY, "Goo")
                        .map(MapDirectives::default().foreign_key(Default::default()))
                })
        });

        let mut catalog = Catalog::default();
        let err = run(&mut catalog, &schema).unwrap_err();
        assert!(err.is_illegal_strategy_configuration());
    }

    #[test]
    fn deleted_class_keeps_its_table() {
        let v1 = schema(Version::new(1, 0, 0), |s| {
            s.entity("Foo", |c| c.primitive("S1", PrimitiveType::String))
        });
        let mut catalog = Catalog::default();
        run(&mut catalog, &v1).unwrap();

        let v2 = schema(Version::new(2, 0, 0), |s| s);
        let report = run(&mut catalog, &v2).unwrap();
        assert_eq!(report.deleted_classes.len(), 1);
        assert!(catalog.layout.table_by_name("ts_Foo").is_some());

        // Re-adding the class maps it to a new table
        let v3 = v1.with_version(Version::new(3, 0, 0));
        run(&mut catalog, &v3).unwrap();
        let foo = catalog.mapping.class(&v3.qualify("Foo")).unwrap();
        assert_eq!(catalog.layout.table(foo.table.unwrap()).name, "ts_Foo_1");
    }

    #[test]
    fn user_defined_index() {
        let schema = schema(Version::new(1, 0, 0), |s| {
            s.entity("Foo", |c| {
                c.sealed()
                    .map(
                        MapDirectives::default()
                            .index(ecmap_core::schema::ec::DbIndex::new(["S1", "L1"]).unique()),
                    )
                    .primitive("S1", PrimitiveType::String)
                    .primitive("L1", PrimitiveType::Long)
            })
        });

        let mut catalog = Catalog::default();
        run(&mut catalog, &schema).unwrap();

        let table = catalog.layout.table_by_name("ts_Foo").unwrap();
        let index = table.index_by_name("ix_ts_Foo_S1_L1").unwrap();
        assert!(index.unique);
        assert_eq!(index.columns.len(), 2);
    }
}
