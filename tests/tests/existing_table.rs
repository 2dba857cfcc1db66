use ecmap::schema::ec::{MapDirectives, PrimitiveType, StrategyRequest};
use ecmap::stmt::Value;
use tests::{assert_err, assert_ok, test_schema, tests, DbTest};

async fn existing_table_requires_table_name(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .entity("Foo", |c| {
            c.map(MapDirectives::strategy(StrategyRequest::ExistingTable))
                .primitive("Name", PrimitiveType::String)
        })
        .build();

    let err = assert_err!(db.import_schemas([schema]).await);
    assert!(err.is_illegal_strategy_configuration());
    assert!(err
        .to_string()
        .ends_with("MapStrategy ExistingTable expects TableName to be set"));

    // Nothing was written.
    assert!(!test.log().has_ddl());
    assert!(db.catalog().schema("TestSchema").is_none());
}

async fn existing_table_must_preexist(test: &mut DbTest) {
    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .entity("Foo", |c| {
            c.map(MapDirectives::existing_table("NonExistingTable"))
                .primitive("Name", PrimitiveType::String)
        })
        .build();

    let err = assert_err!(db.import_schemas([schema]).await);
    assert!(err.is_unresolvable_table_reference());
    assert!(err
        .to_string()
        .contains("MapStrategy ExistingTable expects table specified by TableName to preexist"));
    assert!(db.catalog().schema("TestSchema").is_none());
}

async fn existing_table_is_mapped_but_not_altered(test: &mut DbTest) {
    test.exec_raw(
        "CREATE TABLE legacy_foo (Id INTEGER PRIMARY KEY, Name TEXT);
         INSERT INTO legacy_foo (Id, Name) VALUES (7, 'seven');",
    );

    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .entity("Foo", |c| {
            c.map(MapDirectives::existing_table("legacy_foo"))
                .primitive("Name", PrimitiveType::String)
        })
        .build();

    assert_ok!(db.import_schemas([schema.clone()]).await);

    assert_eq!(test.raw_columns("legacy_foo"), vec!["Id", "Name"]);
    assert!(!test.log().has_ddl());

    let foo = assert_ok!(db.get(&schema.qualify("Foo"), 7).await);
    assert_eq!(foo.value("Name"), Some(&Value::String("seven".to_string())));
}

async fn existing_table_property_needs_a_column(test: &mut DbTest) {
    test.exec_raw("CREATE TABLE legacy_foo (Id INTEGER PRIMARY KEY, Name TEXT);");

    let mut db = test.setup_db().await;
    let schema = test_schema((1, 0, 0))
        .entity("Foo", |c| {
            c.map(MapDirectives::existing_table("legacy_foo"))
                .primitive("Missing", PrimitiveType::String)
        })
        .build();

    let err = assert_err!(db.import_schemas([schema]).await);
    assert!(err.is_illegal_strategy_configuration());
    assert!(err.to_string().contains("Column Missing does not exist"));
}

tests!(
    existing_table_requires_table_name,
    existing_table_must_preexist,
    existing_table_is_mapped_but_not_altered,
    existing_table_property_needs_a_column
);
