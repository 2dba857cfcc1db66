use ecmap::schema::ec::{MapDirectives, PrimitiveType, Schema};
use ecmap::stmt::Value;
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_ok, test_schema, tests, DbTest};

fn koo_hierarchy(version: (u32, u32, u32)) -> Schema {
    test_schema(version)
        .entity("Koo", |c| {
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
        .build()
}

async fn table_per_hierarchy_with_shared_columns(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = koo_hierarchy((1, 0, 0));
    assert_ok!(db.import_schemas([schema.clone()]).await);

    // 2 system columns, 5 shared columns, and the dedicated L1 and S1.
    let columns = test.raw_columns("ts_Koo");
    assert_eq!(columns.len(), 9);
    assert!(!test.table_exists("ts_Foo"));

    let err = assert_err!(
        db.insert(&schema.qualify("Koo"), [("L1", Value::from(1_i64))])
            .await
    );
    assert!(err.is_invalid_statement());
    assert!(err.to_string().contains("abstract"));

    let id = assert_ok!(
        db.insert(
            &schema.qualify("Foo"),
            [
                ("L1", Value::from(1_i64)),
                ("S1", Value::from("one")),
                ("L2", Value::from(2_i64)),
                ("S2", Value::from("two")),
            ],
        )
        .await
    );

    // Foo's own properties live in the shared pool.
    assert_eq!(
        test.raw_values("ts_Koo", "ps1"),
        vec![rusqlite::types::Value::Integer(2)]
    );
    assert_eq!(
        test.raw_values("ts_Koo", "ps2"),
        vec![rusqlite::types::Value::Text("two".to_string())]
    );

    let foo = assert_ok!(db.get(&schema.qualify("Foo"), id).await);
    assert_eq!(foo.value("L1"), Some(&Value::I64(1)));
    assert_eq!(foo.value("S1"), Some(&Value::String("one".to_string())));
    assert_eq!(foo.value("L2"), Some(&Value::I64(2)));
    assert_eq!(foo.value("S2"), Some(&Value::String("two".to_string())));

    // Reading through the base class finds the subclass row.
    let koo = assert_ok!(db.get(&schema.qualify("Koo"), id).await);
    assert_eq!(koo.value("S1"), Some(&Value::String("one".to_string())));
}

async fn reimport_of_same_schema_is_a_no_op(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = koo_hierarchy((1, 0, 0));
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let mapping = db.mapping().clone();
    let layout = db.layout().clone();
    test.log().clear();

    assert_ok!(db.import_schemas([schema]).await);

    assert!(test.log().is_empty());
    assert_eq!(db.mapping(), &mapping);
    assert_eq!(db.layout(), &layout);
}

async fn catalog_survives_reopening(test: &mut DbTest) {
    let schema = koo_hierarchy((1, 0, 0));

    let id = {
        let mut db = test.setup_db().await;
        assert_ok!(db.import_schemas([schema.clone()]).await);
        assert_ok!(
            db.insert(&schema.qualify("Foo"), [("S2", Value::from("kept"))])
                .await
        )
    };

    let mut db = test.setup_db().await;
    assert_eq!(db.catalog().schema("TestSchema"), Some(&schema));
    assert!(db.mapping().class(&schema.qualify("Foo")).is_some());

    let foo = assert_ok!(db.get(&schema.qualify("Foo"), id).await);
    assert_eq!(foo.value("S2"), Some(&Value::String("kept".to_string())));

    // The persisted mapping is reused, not recomputed into new DDL.
    assert_ok!(db.import_schemas([schema]).await);
    assert!(!test.log().has_ddl());
}

async fn first_import_creates_tables_in_one_transaction(test: &mut DbTest) {
    use ecmap::driver::operation::Transaction;

    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .struct_class("Pt", |c| {
            c.primitive("X", PrimitiveType::Double)
                .primitive("Y", PrimitiveType::Double)
        })
        .entity("Foo", |c| {
            c.primitive("S1", PrimitiveType::String)
                .primitive("P", PrimitiveType::Point3d)
                .struct_property("Origin", "Pt")
        })
        .build();

    assert_ok!(db.import_schemas([schema.clone()]).await);

    let log = test.log();
    assert!(log.has_transaction(Transaction::Start));
    assert!(log.has_transaction(Transaction::Commit));
    assert!(!log.has_transaction(Transaction::Rollback));

    assert_eq!(
        test.raw_columns("ts_Foo"),
        vec!["Id", "ECClassId", "S1", "P_X", "P_Y", "P_Z", "Origin_X", "Origin_Y"]
    );

    let id = assert_ok!(
        db.insert(
            &schema.qualify("Foo"),
            [
                ("P.X", Value::from(1.5)),
                ("Origin.Y", Value::from(-2.0)),
            ],
        )
        .await
    );
    let foo = assert_ok!(db.get(&schema.qualify("Foo"), id).await);
    assert_eq!(foo.value("P.X"), Some(&Value::F64(1.5)));
    assert_eq!(foo.value("Origin.Y"), Some(&Value::F64(-2.0)));
    assert_eq!(foo.value("S1"), Some(&Value::Null));

    let err = assert_err!(
        db.insert(&schema.qualify("Foo"), [("Nope", Value::from(1_i64))])
            .await
    );
    assert!(err.is_invalid_statement());
}

async fn delete_instance(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = koo_hierarchy((1, 0, 0));
    assert_ok!(db.import_schemas([schema.clone()]).await);

    let foo = schema.qualify("Foo");
    let id = assert_ok!(db.insert(&foo, [("S2", Value::from("x"))]).await);

    assert_ok!(db.delete(&foo, id).await);
    assert!(assert_err!(db.get(&foo, id).await).is_record_not_found());
    assert!(assert_err!(db.delete(&foo, id).await).is_record_not_found());
}

async fn joined_table_per_direct_subclass(test: &mut DbTest) {
    use ecmap::driver::operation::Transaction;
    use rusqlite::types::Value as Raw;

    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .entity("Element", |c| {
            c.map(MapDirectives::table_per_hierarchy().joined_table_per_direct_subclass())
                .primitive("Code", PrimitiveType::String)
        })
        .entity("Geometric", |c| {
            c.base("Element")
                .map(MapDirectives::default().shared_columns().shared_column_count(2))
                .primitive("Size", PrimitiveType::Long)
        })
        .entity("Circle", |c| {
            c.base("Geometric")
                .primitive("Radius", PrimitiveType::Double)
        })
        .build();
    assert_ok!(db.import_schemas([schema.clone()]).await);

    assert_eq!(test.raw_columns("ts_Element"), vec!["Id", "ECClassId", "Code"]);
    assert_eq!(
        test.raw_columns("ts_Geometric"),
        vec!["Id", "ECClassId", "ps1", "ps2"]
    );
    assert!(!test.table_exists("ts_Circle"));

    test.log().clear();
    let circle = schema.qualify("Circle");
    let id = assert_ok!(
        db.insert(
            &circle,
            [
                ("Code", Value::from("c-1")),
                ("Size", Value::from(3_i64)),
                ("Radius", Value::from(2.5_f64)),
            ],
        )
        .await
    );

    // One row per table, written together.
    assert!(test.log().has_transaction(Transaction::Commit));
    assert_eq!(test.raw_values("ts_Element", "Id"), vec![Raw::Integer(id)]);
    assert_eq!(test.raw_values("ts_Geometric", "Id"), vec![Raw::Integer(id)]);
    assert_eq!(
        test.raw_values("ts_Element", "Code"),
        vec![Raw::Text("c-1".to_string())]
    );
    assert_eq!(test.raw_values("ts_Geometric", "ps2"), vec![Raw::Real(2.5)]);

    let instance = assert_ok!(db.get(&circle, id).await);
    assert_eq!(instance.value("Code"), Some(&Value::String("c-1".to_string())));
    assert_eq!(instance.value("Size"), Some(&Value::I64(3)));
    assert_eq!(instance.value("Radius"), Some(&Value::F64(2.5)));

    let element = assert_ok!(db.get(&schema.qualify("Element"), id).await);
    assert_eq!(element.value("Code"), Some(&Value::String("c-1".to_string())));

    // The joined row goes with the root row.
    assert_ok!(db.delete(&circle, id).await);
    assert!(test.raw_values("ts_Element", "Id").is_empty());
    assert!(test.raw_values("ts_Geometric", "Id").is_empty());
}

async fn referenced_schemas_imported_together(test: &mut DbTest) {
    let mut db = test.setup_db().await;

    let base = Schema::builder("BaseSchema", "bs", ecmap::schema::ec::Version::new(1, 0, 0))
        .entity("Element", |c| {
            c.map(MapDirectives::table_per_hierarchy().shared_columns_for_subclasses())
                .primitive("Code", PrimitiveType::String)
        })
        .build();
    let domain = test_schema((1, 0, 0))
        .reference("BaseSchema")
        .entity("Widget", |c| {
            c.base("BaseSchema:Element")
                .primitive("Size", PrimitiveType::Long)
        })
        .build();

    assert_ok!(db.import_schemas([base.clone(), domain.clone()]).await);
    assert_eq!(db.catalog().schemas().len(), 2);

    // The subclass from the other schema lives in the base's table.
    assert_eq!(
        test.raw_columns("bs_Element"),
        vec!["Id", "ECClassId", "Code", "ps1"]
    );
    assert!(!test.table_exists("ts_Widget"));

    let widget = domain.qualify("Widget");
    let id = assert_ok!(
        db.insert(
            &widget,
            [("Code", Value::from("w-1")), ("Size", Value::from(3_i64))]
        )
        .await
    );

    let element = assert_ok!(db.get(&base.qualify("Element"), id).await);
    assert_eq!(element.value("Code"), Some(&Value::String("w-1".to_string())));
    assert_eq!(element.value("Size"), None);
    assert_eq!(
        assert_ok!(db.get(&widget, id).await).value("Size"),
        Some(&Value::I64(3))
    );
}

tests!(
    table_per_hierarchy_with_shared_columns,
    joined_table_per_direct_subclass,
    referenced_schemas_imported_together,
    reimport_of_same_schema_is_a_no_op,
    catalog_survives_reopening,
    first_import_creates_tables_in_one_transaction,
    delete_instance
);
