//! Runs against a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use database_layer::PgTableStore;
use serde_json::json;
use tracking_engine::TableStore;
use uuid::Uuid;

async fn store() -> PgTableStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgTableStore::connect(&url, 2).await.expect("connect")
}

#[tokio::test]
#[ignore]
async fn pg_store_round_trip() {
    let store = store().await;
    let table = format!("test.{}", Uuid::new_v4());
    let headers = vec!["Order #".to_string(), "Status".to_string()];

    store.ensure_table(&table, &headers).await.unwrap();
    store.ensure_table(&table, &headers).await.unwrap();

    let numeric = store
        .append_row(&table, vec![json!(9876), json!("pending")])
        .await
        .unwrap();
    store
        .append_row(&table, vec![json!("9877"), json!("pending")])
        .await
        .unwrap();

    let found = store.find_rows(&table, 0, "9876").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, numeric);

    store
        .update_row(&table, numeric, vec![json!(9876), json!("processing")])
        .await
        .unwrap();
    assert!(store.delete_row(&table, numeric).await.unwrap());
    assert!(!store.delete_row(&table, numeric).await.unwrap());

    let snapshot = store.read_table(&table).await.unwrap().unwrap();
    assert_eq!(snapshot.headers, headers);
    assert_eq!(snapshot.rows.len(), 1);
    assert!(store.table_names().await.unwrap().contains(&table));
}

#[tokio::test]
#[ignore]
async fn pg_store_append_requires_table() {
    let store = store().await;
    let result = store
        .append_row(&format!("missing.{}", Uuid::new_v4()), vec![json!("x")])
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore]
async fn pg_pool_health_and_close() {
    let store = store().await;
    assert!(store.database().is_healthy().await);

    store.database().close().await;
    assert!(!store.database().is_healthy().await);
}
