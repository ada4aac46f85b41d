//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    clinic_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR DB should return a value"));

    for table in [
        "clinic",
        "user",
        "medicine",
        "medicine_bill",
        "medicine_bill_item",
        "audit_log",
        "notification",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    clinic_db::run_migrations(&db).await.unwrap();
    clinic_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn negative_stock_is_rejected_by_the_schema() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clinic_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE medicine SET clinic_id = 'c', name = 'x', \
             unit_price_minor = 100, stock_quantity = -1",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "stock_quantity must not go below zero");
}

#[tokio::test]
async fn unknown_role_is_rejected_by_the_schema() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clinic_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE user SET email = 'x@example.com', full_name = 'X', \
             role = 'superuser', password_hash = 'h'",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err());
}
