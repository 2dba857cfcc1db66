use ecmap::{
    schema::{
        ec::{End, MapDirectives, Multiplicity, PrimitiveType, Schema, StrengthDirection},
        mapping::RelationshipMap,
    },
    stmt::Value,
    InstanceKey,
};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_ok, test_schema, tests, DbTest};

fn one_to_one() -> Schema {
    test_schema((1, 0, 0))
        .entity("Foo", |c| c.primitive("Name", PrimitiveType::String))
        .entity("Goo", |c| {
            c.primitive("Name", PrimitiveType::String).navigation(
                "Foo",
                "OneFooHasOneGoo",
                StrengthDirection::Backward,
            )
        })
        .relationship("OneFooHasOneGoo", |r| {
            r.source(Multiplicity::ZERO_ONE, "Foo")
                .target(Multiplicity::ZERO_ONE, "Goo")
        })
        .build()
}

fn many_to_many(directives: MapDirectives) -> Schema {
    test_schema((1, 0, 0))
        .entity("Foo", |c| c.primitive("Name", PrimitiveType::String))
        .entity("Goo", |c| c.primitive("Name", PrimitiveType::String))
        .relationship("FooHasGoo", |r| {
            r.map(directives)
                .source(Multiplicity::ZERO_MANY, "Foo")
                .target(Multiplicity::ZERO_MANY, "Goo")
        })
        .build()
}

async fn one_to_one_is_a_unique_foreign_key_in_target(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = one_to_one();
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let relationship = schema.qualify("OneFooHasOneGoo");
    let Some(RelationshipMap::EndTable(end_table)) = db.mapping().relationship(&relationship)
    else {
        panic!("expected foreign key columns");
    };
    assert_eq!(end_table.host_end, End::Target);
    assert!(end_table.unique_index.is_some());
    assert_eq!(db.layout().table(end_table.host_table).name, "ts_Goo");

    let foo = schema.qualify("Foo");
    let goo = schema.qualify("Goo");

    let foo1 = assert_ok!(db.insert(&foo, [("Name", "foo1")]).await);
    let goo1 = assert_ok!(db.insert(&goo, [("Name", "goo1")]).await);
    let goo2 = assert_ok!(db.insert(&goo, [("Name", "goo2")]).await);

    assert_ok!(
        db.relate(
            &relationship,
            &InstanceKey::new(foo.clone(), foo1),
            &InstanceKey::new(goo.clone(), goo1),
        )
        .await
    );

    let related = assert_ok!(db.get(&goo, goo1).await);
    assert_eq!(related.value("Foo.Id"), Some(&Value::I64(foo1)));

    // A second Goo for the same Foo violates the unique index.
    let err = assert_err!(
        db.relate(
            &relationship,
            &InstanceKey::new(foo.clone(), foo1),
            &InstanceKey::new(goo.clone(), goo2),
        )
        .await
    );
    assert!(err.is_constraint_violation());

    // So does relating the same pair again.
    let err = assert_err!(
        db.relate(
            &relationship,
            &InstanceKey::new(foo.clone(), foo1),
            &InstanceKey::new(goo.clone(), goo1),
        )
        .await
    );
    assert!(err.is_constraint_violation());

    let unrelated = assert_ok!(db.get(&goo, goo2).await);
    assert_eq!(unrelated.value("Foo.Id"), Some(&Value::Null));
}

async fn many_to_many_uses_a_link_table(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = many_to_many(MapDirectives::default());
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let relationship = schema.qualify("FooHasGoo");
    let link_table = db
        .mapping()
        .relationship(&relationship)
        .and_then(RelationshipMap::as_link_table)
        .cloned()
        .unwrap();
    assert!(!link_table.allow_duplicates);
    assert_eq!(
        test.raw_columns("ts_FooHasGoo"),
        vec![
            "Id",
            "ECClassId",
            "SourceECInstanceId",
            "SourceECClassId",
            "TargetECInstanceId",
            "TargetECClassId",
        ]
    );

    let foo = InstanceKey::new(
        schema.qualify("Foo"),
        assert_ok!(db.insert(&schema.qualify("Foo"), [("Name", "foo")]).await),
    );
    let goo = InstanceKey::new(
        schema.qualify("Goo"),
        assert_ok!(db.insert(&schema.qualify("Goo"), [("Name", "goo")]).await),
    );

    assert_ok!(db.relate(&relationship, &foo, &goo).await);
    let err = assert_err!(db.relate(&relationship, &foo, &goo).await);
    assert!(err.is_constraint_violation());

    assert_eq!(test.raw_values("ts_FooHasGoo", "SourceECInstanceId").len(), 1);
}

async fn link_table_allowing_duplicates(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = many_to_many(MapDirectives::default().allow_duplicate_relationships());
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let relationship = schema.qualify("FooHasGoo");
    let foo = InstanceKey::new(
        schema.qualify("Foo"),
        assert_ok!(db.insert(&schema.qualify("Foo"), [("Name", "foo")]).await),
    );
    let goo = InstanceKey::new(
        schema.qualify("Goo"),
        assert_ok!(db.insert(&schema.qualify("Goo"), [("Name", "goo")]).await),
    );

    assert_ok!(db.relate(&relationship, &foo, &goo).await);
    assert_ok!(db.relate(&relationship, &foo, &goo).await);

    assert_eq!(test.raw_values("ts_FooHasGoo", "SourceECInstanceId").len(), 2);
}

async fn deleting_a_class_removes_its_link_rows(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let v1 = test_schema((1, 0, 0))
        .entity("Base", |c| c.map(MapDirectives::table_per_hierarchy()))
        .entity("Foo", |c| c.base("Base"))
        .entity("Goo", |c| c.base("Base"))
        .entity("Hoo", |c| c)
        .relationship("BaseHasHoo", |r| {
            r.source(Multiplicity::ZERO_MANY, "Base")
                .target(Multiplicity::ZERO_MANY, "Hoo")
        })
        .build();
    assert_ok!(db.import_schemas([v1.clone()]).await);

    let relationship = v1.qualify("BaseHasHoo");
    let hoo = InstanceKey::new(
        v1.qualify("Hoo"),
        assert_ok!(db.insert(&v1.qualify("Hoo"), Vec::<(&str, Value)>::new()).await),
    );
    let foo = InstanceKey::new(
        v1.qualify("Foo"),
        assert_ok!(db.insert(&v1.qualify("Foo"), Vec::<(&str, Value)>::new()).await),
    );
    let goo = InstanceKey::new(
        v1.qualify("Goo"),
        assert_ok!(db.insert(&v1.qualify("Goo"), Vec::<(&str, Value)>::new()).await),
    );
    assert_ok!(db.relate(&relationship, &foo, &hoo).await);
    assert_ok!(db.relate(&relationship, &goo, &hoo).await);

    let mut v2 = v1.with_version(ecmap::schema::ec::Version::new(2, 0, 0));
    v2.classes.retain(|class| class.name != "Goo");
    assert_ok!(db.import_schemas([v2]).await);

    // The table and its columns stay; Goo's rows and links are gone.
    assert!(test.table_exists("ts_Base"));
    assert_eq!(test.raw_values("ts_Base", "Id").len(), 1);
    assert_eq!(
        test.raw_values("ts_BaseHasHoo", "SourceECInstanceId"),
        vec![rusqlite::types::Value::Integer(foo.id)]
    );
    assert!(db.mapping().class(&v1.qualify("Goo")).is_none());
}

async fn deleting_an_instance_detaches_its_relationships(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = one_to_one();
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let relationship = schema.qualify("OneFooHasOneGoo");
    let foo = schema.qualify("Foo");
    let goo = schema.qualify("Goo");

    let foo1 = assert_ok!(db.insert(&foo, [("Name", "foo1")]).await);
    let goo1 = assert_ok!(db.insert(&goo, [("Name", "goo1")]).await);
    assert_ok!(
        db.relate(
            &relationship,
            &InstanceKey::new(foo.clone(), foo1),
            &InstanceKey::new(goo.clone(), goo1),
        )
        .await
    );

    test.log().clear();
    assert_ok!(db.delete(&foo, foo1).await);
    assert!(test
        .log()
        .has_transaction(ecmap::driver::operation::Transaction::Commit));

    // The id of a deleted instance is never handed out again.
    let foo2 = assert_ok!(db.insert(&foo, [("Name", "foo2")]).await);
    assert_ne!(foo2, foo1);

    let goo1 = assert_ok!(db.get(&goo, goo1).await);
    assert_eq!(goo1.value("Foo.Id"), Some(&Value::Null));

    // The freed end can be related again.
    assert_ok!(
        db.relate(
            &relationship,
            &InstanceKey::new(foo.clone(), foo2),
            &InstanceKey::new(goo.clone(), goo1.id),
        )
        .await
    );
}

async fn deleting_an_instance_removes_its_link_rows(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = many_to_many(MapDirectives::default());
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let relationship = schema.qualify("FooHasGoo");
    let foo = InstanceKey::new(
        schema.qualify("Foo"),
        assert_ok!(db.insert(&schema.qualify("Foo"), [("Name", "foo")]).await),
    );
    let goo1 = InstanceKey::new(
        schema.qualify("Goo"),
        assert_ok!(db.insert(&schema.qualify("Goo"), [("Name", "goo1")]).await),
    );
    let goo2 = InstanceKey::new(
        schema.qualify("Goo"),
        assert_ok!(db.insert(&schema.qualify("Goo"), [("Name", "goo2")]).await),
    );
    assert_ok!(db.relate(&relationship, &foo, &goo1).await);
    assert_ok!(db.relate(&relationship, &foo, &goo2).await);

    assert_ok!(db.delete(&goo1.class, goo1.id).await);

    assert_eq!(
        test.raw_values("ts_FooHasGoo", "TargetECInstanceId"),
        vec![rusqlite::types::Value::Integer(goo2.id)]
    );

    // Instance and link ids come from one sequence.
    let link_ids = test.raw_values("ts_FooHasGoo", "Id");
    assert!(!link_ids.contains(&rusqlite::types::Value::Integer(foo.id)));
    assert!(!link_ids.contains(&rusqlite::types::Value::Integer(goo2.id)));
}

tests!(
    one_to_one_is_a_unique_foreign_key_in_target,
    deleting_an_instance_detaches_its_relationships,
    deleting_an_instance_removes_its_link_rows,
    many_to_many_uses_a_link_table,
    link_table_allowing_duplicates,
    deleting_a_class_removes_its_link_rows
);
