//! The process-wide connect / store_bucket / disconnect functions.
//!
//! Everything runs in one test because the default manager is shared by the
//! whole test binary.

use bucket_store::{
    connect, default_manager, disconnect, store_bucket, Bucket, BucketExistence, BucketObject,
    StoreError, StoreOutcome,
};

#[tokio::test]
async fn test_global_lifecycle() {
    let bucket = Bucket::new("my-test-bucket", BucketExistence::Exists).with_objects(vec![
        BucketObject::new("a.txt", 10),
        BucketObject::new("b.txt", 20),
    ]);

    assert!(matches!(
        store_bucket(&bucket).await,
        Err(StoreError::NotConnected)
    ));
    assert!(!disconnect().await);

    connect("sqlite::memory:", true).await.unwrap();
    connect("sqlite::memory:", true).await.unwrap();
    assert_eq!(default_manager().connections_opened(), 1);
    assert_eq!(default_manager().migrations_run(), 1);

    let outcome = store_bucket(&bucket).await.unwrap();
    assert!(matches!(
        outcome,
        StoreOutcome::Stored {
            objects_written: 2,
            ..
        }
    ));

    let db = default_manager().handle().await.unwrap();
    let loaded = db.load_bucket("my-test-bucket").await.unwrap().unwrap();
    assert_eq!(loaded.objects.len(), 2);
    assert_eq!(loaded.total_size(), 30);

    assert!(disconnect().await);
    assert!(matches!(
        store_bucket(&bucket).await,
        Err(StoreError::NotConnected)
    ));
}
