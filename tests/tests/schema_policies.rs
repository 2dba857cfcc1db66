use ecmap::schema::ec::{
    ForeignKeyAction, MapDirectives, Multiplicity, PrimitiveType, Schema, SchemaBuilder,
    StrengthDirection, Version,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_err_msg, assert_ok, test_schema, tests, DbTest};

fn schema(name: &str, alias: &str, version: (u32, u32, u32)) -> SchemaBuilder {
    Schema::builder(name, alias, Version::new(version.0, version.1, version.2))
}

fn opting_in(f: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> Schema {
    f(schema("OptingInSchema", "master", (1, 0, 0)))
        .entity("MasterA", |c| c.primitive("P1", PrimitiveType::String))
        .build()
}

async fn no_additional_root_entity_classes(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let pre = schema("Pre", "pre", (1, 0, 0))
        .entity("PreA", |c| c.primitive("P1", PrimitiveType::String))
        .build();
    assert_ok!(db.import_schemas([pre]).await);
    assert_ok!(
        db.import_schemas([opting_in(|s| s.no_additional_root_entity_classes([]))])
            .await
    );

    // Subclasses of existing classes are fine, in any schema.
    let s1 = schema("Schema1", "s1", (1, 0, 0))
        .reference("Pre")
        .reference("OptingInSchema")
        .entity("S1A", |c| c.base("Pre:PreA").primitive("P10", PrimitiveType::String))
        .entity("S1B", |c| {
            c.base("OptingInSchema:MasterA")
                .primitive("P10", PrimitiveType::String)
        })
        .struct_class("S1Struct", |c| c.primitive("P1", PrimitiveType::String))
        .build();
    assert_ok!(db.import_schemas([s1]).await);

    let s2 = schema("Schema2", "s2", (1, 0, 0))
        .entity("S2A", |c| c.primitive("P10", PrimitiveType::String))
        .build();
    let err = assert_err_msg!(
        db.import_schemas([s2]).await,
        "ECSchema import failed. ECEntityClass Schema2:S2A violates the schema policy NoAdditionalRootEntityClasses of ECSchema OptingInSchema."
    );
    assert!(err.is_schema_policy_violation());
    assert!(err.is_import_rejection());
    assert!(db.catalog().schema("Schema2").is_none());
    assert!(!test.table_exists("s2_S2A"));

    // Schemas imported before the policy may grow, but not by new roots.
    let pre_v2 = schema("Pre", "pre", (2, 0, 0))
        .entity("PreA", |c| {
            c.primitive("P1", PrimitiveType::String)
                .primitive("P3", PrimitiveType::String)
        })
        .build();
    assert_ok!(db.import_schemas([pre_v2.clone()]).await);

    let mut pre_v3 = pre_v2.with_version(Version::new(3, 0, 0));
    pre_v3.classes.extend(
        schema("Pre", "pre", (3, 0, 0))
            .entity("PreB", |c| c.primitive("P1", PrimitiveType::String))
            .build()
            .classes,
    );
    let err = assert_err!(db.import_schemas([pre_v3]).await);
    assert!(err.is_schema_policy_violation());
}

async fn root_entity_class_exceptions(_: &mut DbTest) {
    for (exception, accepted) in [
        ("Schema1:ClassB", true),
        ("schema1.classb", true),
        ("s1:ClassB", true),
        ("Schema1,ClassB", false),
        ("Schema2:ClassB", false),
        ("Schema1:ClassC", false),
    ] {
        let mut test = DbTest::new();
        let mut db = test.setup_db().await;

        let master = opting_in(|s| s.no_additional_root_entity_classes([exception]));
        let s1 = schema("Schema1", "s1", (1, 0, 0))
            .entity("ClassB", |c| c.primitive("P1", PrimitiveType::String))
            .build();

        let result = db.import_schemas([master, s1]).await;
        assert_eq!(result.is_ok(), accepted, "{exception}");
        assert_eq!(test.table_exists("s1_ClassB"), accepted, "{exception}");
    }
}

fn link_tables(relationships: &[&str]) -> Schema {
    let mut s1 = schema("Schema1", "s1", (1, 0, 0))
        .entity("A", |c| c.primitive("P1", PrimitiveType::String))
        .entity("B", |c| c.primitive("P1", PrimitiveType::String))
        .relationship("AOwnsB", |r| {
            r.source(Multiplicity::ZERO_ONE, "A")
                .target(Multiplicity::ZERO_MANY, "B")
        });
    for name in relationships {
        s1 = s1.relationship(name, |r| {
            r.source(Multiplicity::ZERO_MANY, "A")
                .target(Multiplicity::ZERO_MANY, "B")
        });
    }
    s1.build()
}

async fn no_additional_link_tables(_: &mut DbTest) {
    let master = || opting_in(|s| s.no_additional_link_tables(["Schema1:MyLinkTableRel"]));

    let mut test = DbTest::new();
    let mut db = test.setup_db().await;
    let s1 = link_tables(&["MyLinkTableRel", "MyLinkTableRel2"]);
    let err = assert_err!(db.import_schemas([master(), s1]).await);
    assert!(err.is_schema_policy_violation());
    assert!(err.to_string().contains("ECRelationshipClass Schema1:MyLinkTableRel2"));
    assert!(!test.table_exists("s1_MyLinkTableRel"));

    // The exempt link table and the foreign key relationship are accepted.
    let mut test = DbTest::new();
    let mut db = test.setup_db().await;
    assert_ok!(
        db.import_schemas([master(), link_tables(&["MyLinkTableRel"])])
            .await
    );
    assert!(test.table_exists("s1_MyLinkTableRel"));
    assert!(!test.table_exists("s1_AOwnsB"));
}

fn parent_child(version: (u32, u32, u32), constrained: bool, relationship: &str) -> Schema {
    let map = if constrained {
        MapDirectives::default().foreign_key(ForeignKeyAction::default())
    } else {
        MapDirectives::default()
    };

    schema("Schema1", "s1", version)
        .entity("Parent", |c| c.primitive("P1", PrimitiveType::String))
        .entity("Child", |c| {
            c.primitive("P1", PrimitiveType::String).navigation(
                "Parent",
                relationship,
                StrengthDirection::Backward,
            )
        })
        .relationship(relationship, |r| {
            r.map(map)
                .source(Multiplicity::ZERO_ONE, "Parent")
                .target(Multiplicity::ZERO_MANY, "Child")
        })
        .build()
}

async fn no_additional_foreign_key_constraints(_: &mut DbTest) {
    for (exceptions, constrained, accepted) in [
        (&[][..], false, true),
        (&[][..], true, false),
        (&["Schema1:Child.Parent"][..], true, true),
        (&["s1:ParentHasChild"][..], true, true),
        (&["Schema1:Parent.Child"][..], true, false),
    ] {
        let mut test = DbTest::new();
        let mut db = test.setup_db().await;

        let master =
            opting_in(|s| s.no_additional_foreign_key_constraints(exceptions.iter().copied()));
        assert_ok!(db.import_schemas([master]).await);

        let result = db
            .import_schemas([parent_child((1, 0, 0), constrained, "ParentHasChild")])
            .await;
        match result {
            Ok(_) => assert!(accepted, "{exceptions:?}"),
            Err(err) => {
                assert!(!accepted, "{exceptions:?}: {err}");
                assert!(err.is_schema_policy_violation());
            }
        }
    }
}

async fn system_property_names_are_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    for name in ["ECInstanceId", "ECClassId", "ID"] {
        let schema = test_schema((1, 0, 0))
            .entity("Foo", |c| c.primitive(name, PrimitiveType::Long))
            .build();

        let err = assert_err_msg!(
            db.import_schemas([schema]).await,
            format!("invalid schema: TestSchema:Foo.{name} collides with a system property")
        );
        assert!(err.is_import_rejection());
    }

    let schema = test_schema((1, 0, 0))
        .entity("Foo", |c| c)
        .relationship("FooHasFoo", |r| {
            r.source(Multiplicity::ZERO_MANY, "Foo")
                .target(Multiplicity::ZERO_MANY, "Foo")
                .primitive("SourceECInstanceId", PrimitiveType::Long)
        })
        .build();
    assert!(assert_err!(db.import_schemas([schema]).await).is_invalid_schema());

    assert!(db.catalog().schema("TestSchema").is_none());
    assert!(!test.table_exists("ts_Foo"));
}

tests!(
    no_additional_root_entity_classes,
    root_entity_class_exceptions,
    no_additional_link_tables,
    no_additional_foreign_key_constraints,
    system_property_names_are_rejected
);
