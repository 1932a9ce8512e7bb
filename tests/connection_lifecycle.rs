//! Connection manager behavior under concurrent use.

mod helpers;

use std::sync::Arc;

use bucket_store::{ConnectionManager, StoreError};
use helpers::sqlite_file_url;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connect_opens_one_pool() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_file_url(&dir.path().join("scan.db"));
    let manager = Arc::new(ConnectionManager::new());

    let handles = (0..16).map(|_| {
        let manager = Arc::clone(&manager);
        let url = url.clone();
        tokio::spawn(async move { manager.connect(&url, true).await })
    });

    let databases: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().expect("connect"))
        .collect();

    assert_eq!(manager.connections_opened(), 1);
    assert_eq!(manager.migrations_run(), 1);
    assert!(databases.iter().all(|db| Arc::ptr_eq(db, &databases[0])));

    manager.disconnect().await;
}

#[tokio::test]
async fn test_unreachable_database_is_connection_error() {
    let manager = ConnectionManager::new();
    let result = manager
        .connect("sqlite:/nonexistent-dir/for/sure/scan.db", true)
        .await;

    assert!(matches!(result, Err(StoreError::Connection(_))));
    assert!(!manager.is_connected().await);
    assert_eq!(manager.migrations_run(), 0);
}

#[tokio::test]
async fn test_unsupported_scheme_is_rejected() {
    let manager = ConnectionManager::new();
    let result = manager.connect("mysql://localhost/buckets", false).await;
    assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_operations_after_disconnect_fail() {
    let manager = ConnectionManager::new();
    let db = manager.connect("sqlite::memory:", true).await.unwrap();
    manager.disconnect().await;

    let result = db.count_buckets().await;
    assert!(matches!(
        result,
        Err(StoreError::Sql(sqlx::Error::PoolClosed))
    ));
}

#[tokio::test]
async fn test_connect_creates_missing_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.db");
    let manager = ConnectionManager::new();

    let db = manager
        .connect(&format!("sqlite:{}", path.display()), true)
        .await
        .expect("connect to a new file");

    assert!(path.exists());
    assert_eq!(db.count_buckets().await.unwrap(), 0);
    manager.disconnect().await;
}

#[tokio::test]
async fn test_failed_migration_leaves_manager_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("scan.db").display());

    // A pre-existing bucket_objects table without bucket_id breaks the index.
    let setup = ConnectionManager::new();
    let db = setup.connect(&url, false).await.unwrap();
    sqlx::query("CREATE TABLE bucket_objects (id INTEGER PRIMARY KEY, object_key TEXT)")
        .execute(db.pool())
        .await
        .unwrap();
    setup.disconnect().await;

    let manager = ConnectionManager::new();
    let result = manager.connect(&url, true).await;

    assert!(matches!(result, Err(StoreError::Migration(_))));
    assert!(!manager.is_connected().await);
    assert_eq!(manager.connections_opened(), 1);
    assert_eq!(manager.migrations_run(), 0);
    assert!(matches!(
        manager.handle().await,
        Err(StoreError::NotConnected)
    ));

    let db = setup.connect(&url, false).await.unwrap();
    sqlx::query("DROP TABLE bucket_objects")
        .execute(db.pool())
        .await
        .unwrap();
    setup.disconnect().await;

    let db = manager.connect(&url, true).await.expect("second setup");
    assert_eq!(manager.connections_opened(), 2);
    assert_eq!(manager.migrations_run(), 1);
    assert_eq!(db.count_objects().await.unwrap(), 0);
    manager.disconnect().await;
}
