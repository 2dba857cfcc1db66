use ecmap::{
    driver::operation::Transaction,
    schema::ec::{MapDirectives, Multiplicity, PrimitiveType, QualifiedName, Schema, Version},
    stmt::Value,
    Config, Policy,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_err_msg, assert_ok, test_schema, tests, DbTest};

fn foo(version: (u32, u32, u32), map: MapDirectives, properties: &[&str]) -> Schema {
    test_schema(version)
        .entity("Foo", |mut c| {
            c = c.map(map);
            for property in properties {
                c = c.primitive(property, PrimitiveType::String);
            }
            c
        })
        .build()
}

fn shared() -> MapDirectives {
    MapDirectives::table_per_hierarchy().shared_columns()
}

async fn deleting_dedicated_column_property_is_rejected(_: &mut DbTest) {
    for policy in [Policy::Unrestricted, Policy::ChangesetMergeCompatible] {
        let mut test = DbTest::new();
        let mut db = test.setup_db_with(Config::new().policy(policy)).await;

        let v1 = foo((1, 0, 0), MapDirectives::own_table(), &["S1", "S2"]);
        assert_ok!(db.import_schemas([v1]).await);
        test.log().clear();

        let v2 = foo((2, 0, 0), MapDirectives::own_table(), &["S2"]);
        let err = assert_err_msg!(
            db.import_schemas([v2]).await,
            "ECSchema upgrade failed. ECProperty TestSchema:Foo.S1: Only ECProperties mapped to shared columns can be deleted."
        );
        assert!(err.is_incompatible_structural_change());
        assert!(err.is_import_rejection());

        // Rejected before anything reached the database.
        assert!(test.log().is_empty());
        assert_eq!(
            db.catalog().schema("TestSchema").map(|schema| schema.version),
            Some(Version::new(1, 0, 0))
        );
    }
}

async fn deleting_shared_column_property_clears_its_slot(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = foo((1, 0, 0), shared(), &["S1", "S2"]);
    let class = v1.qualify("Foo");

    assert_ok!(db.import_schemas([v1]).await);
    let old = assert_ok!(db.insert(&class, [("S1", "a"), ("S2", "b")]).await);
    assert_eq!(
        test.raw_values("ts_Foo", "ps1"),
        vec![rusqlite::types::Value::Text("a".to_string())]
    );

    assert_ok!(db.import_schemas([foo((2, 0, 0), shared(), &["S2"])]).await);

    // The slot keeps its column, but old rows no longer carry the value.
    assert_eq!(test.raw_columns("ts_Foo"), vec!["Id", "ECClassId", "ps1", "ps2"]);
    assert_eq!(
        test.raw_values("ts_Foo", "ps1"),
        vec![rusqlite::types::Value::Null]
    );
    let instance = assert_ok!(db.get(&class, old).await);
    assert_eq!(instance.value("S1"), None);
    assert_eq!(instance.value("S2"), Some(&Value::String("b".to_string())));

    // A replacement property of the same name gets a fresh slot.
    assert_ok!(db.import_schemas([foo((3, 0, 0), shared(), &["S2", "S1"])]).await);
    assert_eq!(
        test.raw_columns("ts_Foo"),
        vec!["Id", "ECClassId", "ps1", "ps2", "ps3"]
    );

    let new = assert_ok!(db.insert(&class, [("S1", "c")]).await);
    assert_eq!(
        assert_ok!(db.get(&class, new).await).value("S1"),
        Some(&Value::String("c".to_string()))
    );
    assert_eq!(
        assert_ok!(db.get(&class, old).await).value("S1"),
        Some(&Value::Null)
    );
}

async fn deleting_shared_column_property_under_strict_policy(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(Config::new().policy(Policy::ChangesetMergeCompatible))
        .await;

    assert_ok!(db.import_schemas([foo((1, 0, 0), shared(), &["S1", "S2"])]).await);
    assert_ok!(db.import_schemas([foo((2, 0, 0), shared(), &["S2"])]).await);

    // Re-adding needs a new slot in a table that already exists.
    let err = assert_err!(
        db.import_schemas([foo((3, 0, 0), shared(), &["S2", "S1"])])
            .await
    );
    assert!(err.is_column_pool_exhaustion_policy_violation());
}

/// `Koo` with subclasses given as (name, base, properties).
fn koo(version: (u32, u32, u32), subclasses: &[(&str, &str, &[&str])]) -> Schema {
    let mut schema = test_schema(version).entity("Koo", |c| c.abstract_class().map(shared()));
    for (name, base, properties) in subclasses {
        schema = schema.entity(name, |mut c| {
            c = c.base(base);
            for property in *properties {
                c = c.primitive(property, PrimitiveType::String);
            }
            c
        });
    }
    schema.build()
}

async fn new_subclasses_under_strict_policy(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(Config::new().policy(Policy::ChangesetMergeCompatible))
        .await;

    let foo = ("Foo", "Koo", &["S1"][..]);
    assert_ok!(db.import_schemas([koo((1, 0, 0), &[foo])]).await);
    assert_eq!(test.raw_columns("ts_Koo"), vec!["Id", "ECClassId", "ps1"]);

    // A subclass without properties needs no column.
    test.log().clear();
    let goo = ("Goo", "Koo", &[][..]);
    assert_ok!(db.import_schemas([koo((2, 0, 0), &[foo, goo])]).await);
    assert!(!test.log().has_ddl());

    let goo_name = QualifiedName::new("TestSchema", "Goo");
    let id = assert_ok!(db.insert(&goo_name, [] as [(&str, Value); 0]).await);
    assert_eq!(
        test.raw_values("ts_Koo", "Id"),
        vec![rusqlite::types::Value::Integer(id)]
    );
    assert_eq!(assert_ok!(db.get(&goo_name, id).await).id, id);

    // A subclass bringing a property claims a slot in the existing table,
    // even when the slot's column already exists.
    let hoo = ("Hoo", "Koo", &["H1"][..]);
    let err = assert_err!(db.import_schemas([koo((3, 0, 0), &[foo, goo, hoo])]).await);
    assert!(err.is_column_pool_exhaustion_policy_violation());
    assert!(err.is_import_rejection());
    assert_eq!(test.raw_columns("ts_Koo"), vec!["Id", "ECClassId", "ps1"]);
}

async fn base_class_change_is_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = test_schema((1, 0, 0))
        .entity("Foo", |c| c.primitive("S1", PrimitiveType::String))
        .entity("Goo", |c| c.primitive("S2", PrimitiveType::String))
        .build();
    assert_ok!(db.import_schemas([v1]).await);

    let v2 = test_schema((2, 0, 0))
        .entity("Foo", |c| c.primitive("S1", PrimitiveType::String))
        .entity("Goo", |c| c.base("Foo").primitive("S2", PrimitiveType::String))
        .build();

    let err = assert_err_msg!(
        db.import_schemas([v2]).await,
        "ECSchema upgrade failed. ECClass TestSchema:Goo: Adding, removing or replacing base classes of an existing ECClass is not supported."
    );
    assert!(err.is_incompatible_structural_change());
}

fn foo_has_goo(
    version: (u32, u32, u32),
    target_multiplicity: Multiplicity,
    target: &str,
) -> Schema {
    test_schema(version)
        .entity("Foo", |c| c)
        .entity("Goo", |c| c)
        .entity("Hoo", |c| c)
        .relationship("FooHasGoo", |r| {
            r.source(Multiplicity::ZERO_MANY, "Foo")
                .target(target_multiplicity, target)
        })
        .build()
}

async fn relationship_constraint_change_is_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    assert_ok!(
        db.import_schemas([foo_has_goo((1, 0, 0), Multiplicity::ZERO_MANY, "Goo")])
            .await
    );

    let err = assert_err_msg!(
        db.import_schemas([foo_has_goo((2, 0, 0), Multiplicity::ZERO_ONE, "Goo")])
            .await,
        "ECSchema upgrade failed. ECRelationshipConstraint TestSchema:FooHasGoo.Target: Changing the multiplicity of a constraint is not supported."
    );
    assert!(err.is_incompatible_structural_change());

    let err = assert_err!(
        db.import_schemas([foo_has_goo((2, 0, 0), Multiplicity::ZERO_MANY, "Hoo")])
            .await
    );
    assert!(err.is_incompatible_structural_change());
    assert!(err
        .to_string()
        .ends_with("Changing the constraint classes is not supported."));

    // Nothing about the relationship changed in the database.
    assert!(test.table_exists("ts_FooHasGoo"));
    assert_eq!(
        db.catalog().schema("TestSchema").map(|schema| schema.version),
        Some(Version::new(1, 0, 0))
    );
}

fn enumeration(version: (u32, u32, u32), backing_type: PrimitiveType, is_strict: bool) -> Schema {
    test_schema(version)
        .enumeration("Color", backing_type, is_strict, |e| {
            if backing_type == PrimitiveType::Integer {
                e.enumerator("Red", 1).enumerator("Green", 2)
            } else {
                e.enumerator("Red", "red").enumerator("Green", "green")
            }
        })
        .entity("Foo", |c| c.enumeration("Color", "Color"))
        .build()
}

async fn enumeration_strictness(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    assert_ok!(
        db.import_schemas([enumeration((1, 0, 0), PrimitiveType::Integer, true)])
            .await
    );

    // Strict to non-strict relaxes the enumeration.
    assert_ok!(
        db.import_schemas([enumeration((2, 0, 0), PrimitiveType::Integer, false)])
            .await
    );

    // The reverse is rejected.
    let err = assert_err!(
        db.import_schemas([enumeration((3, 0, 0), PrimitiveType::Integer, true)])
            .await
    );
    assert!(err.is_incompatible_structural_change());
    assert!(err
        .to_string()
        .ends_with("A non-strict ECEnumeration cannot be made strict."));
}

async fn enumeration_backing_type_is_fixed(_: &mut DbTest) {
    for (from, to) in [
        (PrimitiveType::Integer, PrimitiveType::String),
        (PrimitiveType::String, PrimitiveType::Integer),
    ] {
        let mut test = DbTest::new();
        let mut db = test.setup_db().await;

        assert_ok!(db.import_schemas([enumeration((1, 0, 0), from, false)]).await);
        let err = assert_err!(db.import_schemas([enumeration((2, 0, 0), to, false)]).await);
        assert!(err.is_incompatible_structural_change());
        assert!(err.to_string().contains("backing type"));
    }
}

async fn version_rules(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    assert_ok!(db.import_schemas([foo((1, 0, 1), MapDirectives::own_table(), &["S1"])]).await);

    // Lower version.
    let err = assert_err!(
        db.import_schemas([foo((1, 0, 0), MapDirectives::own_table(), &["S1"])])
            .await
    );
    assert!(err.is_version_ordering_violation());

    // Structural change without a major increment.
    let err = assert_err!(
        db.import_schemas([foo((1, 0, 2), MapDirectives::own_table(), &["S1", "S2"])])
            .await
    );
    assert!(err.is_version_ordering_violation());

    // Major increment without structural change.
    let err = assert_err!(
        db.import_schemas([foo((2, 0, 0), MapDirectives::own_table(), &["S1"])])
            .await
    );
    assert!(err.is_version_ordering_violation());

    // A new minor version with no changes only rewrites the catalog.
    test.log().clear();
    assert_ok!(db.import_schemas([foo((1, 0, 2), MapDirectives::own_table(), &["S1"])]).await);
    assert!(!test.log().has_ddl());
    assert_eq!(
        db.catalog().schema("TestSchema").map(|schema| schema.version),
        Some(Version::new(1, 0, 2))
    );
}

async fn disallowed_major_upgrade(test: &mut DbTest) {
    let mut db = test
        .setup_db_with(Config::new().disallow_major_upgrade(true))
        .await;

    assert_ok!(db.import_schemas([foo((1, 0, 0), MapDirectives::own_table(), &["S1"])]).await);

    let err = assert_err!(
        db.import_schemas([foo((2, 0, 0), MapDirectives::own_table(), &["S1", "S2"])])
            .await
    );
    assert!(err.is_version_ordering_violation());
    assert!(err.to_string().contains("Major version upgrades are disallowed"));
}

async fn deleted_constraint_class_is_reported_before_verification(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = test_schema((1, 0, 0))
        .entity("Foo", |c| c)
        .entity("Goo", |c| c)
        .relationship("FooHasGoo", |r| {
            r.source(Multiplicity::ZERO_MANY, "Foo")
                .target(Multiplicity::ZERO_MANY, "Goo")
        })
        .build();
    assert_ok!(db.import_schemas([v1.clone()]).await);

    let mut v2 = v1.with_version(Version::new(2, 0, 0));
    v2.classes.retain(|class| class.name != "Goo");

    let err = assert_err!(db.import_schemas([v2]).await);
    assert!(err.is_constraint_class_incompatible());
}

async fn failed_update_is_rolled_back(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = foo((1, 0, 0), MapDirectives::own_table(), &["S1"]);
    let v2 = foo((2, 0, 0), MapDirectives::own_table(), &["S1", "S2"]);

    assert_ok!(db.import_schemas([v1.clone()]).await);
    let catalog = db.catalog().clone();
    test.log().clear();

    test.fail_on("\"ec_Layout\"");
    assert_err!(db.import_schemas([v2.clone()]).await);

    let log = test.log();
    assert_eq!(log.failures(), 1);
    assert!(log.has_ddl());
    assert!(log.has_transaction(Transaction::Rollback));
    assert!(!log.has_transaction(Transaction::Commit));

    // Neither the database nor the handle saw the update.
    assert_eq!(test.raw_columns("ts_Foo"), vec!["Id", "ECClassId", "S1"]);
    assert_eq!(db.catalog(), &catalog);

    let reopened = test.setup_db().await;
    assert_eq!(reopened.catalog(), &catalog);
    drop(reopened);

    // The same update succeeds once the failure is gone.
    assert_ok!(db.import_schemas([v2]).await);
    assert_eq!(test.raw_columns("ts_Foo"), vec!["Id", "ECClassId", "S1", "S2"]);
}

async fn duplicate_candidates_are_rejected(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = foo((1, 0, 0), MapDirectives::own_table(), &["S1"]);

    let err = assert_err!(db.import_schemas([v1.clone(), v1]).await);
    assert!(err.is_invalid_schema());
    assert!(test.log().is_empty());
}

tests!(
    deleting_dedicated_column_property_is_rejected,
    deleting_shared_column_property_clears_its_slot,
    deleting_shared_column_property_under_strict_policy,
    enumeration_strictness,
    enumeration_backing_type_is_fixed,
    version_rules,
    disallowed_major_upgrade,
    deleted_constraint_class_is_reported_before_verification,
    failed_update_is_rolled_back,
    duplicate_candidates_are_rejected,
    new_subclasses_under_strict_policy,
    base_class_change_is_rejected,
    relationship_constraint_change_is_rejected
);
