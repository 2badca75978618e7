//! Timing decorator tests: one sample per call, results untouched.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{idle_aggregator, MemoryStorage};
use metered_kv::{MeteredStorage, Storage, StorageError};

#[tokio::test]
async fn test_sample_count_matches_call_count() {
    let (metrics, handle) = idle_aggregator();
    let storage = MeteredStorage::new(MemoryStorage::default(), metrics.clone());

    storage.set("a", "1", None).await.unwrap();
    storage.set("b", "2", Some(Duration::from_secs(30))).await.unwrap();
    storage.get("a").await.unwrap();
    let _ = storage.get("missing").await;
    storage.inner().fail_next(redis::ErrorKind::IoError, "connection refused");
    let _ = storage.set("c", "3", None).await;
    storage.get("b").await.unwrap();

    assert_eq!(metrics.len(), 6);

    let batch = metrics.drain();
    let ops: Vec<&str> = batch.samples.iter().map(|s| s.operation.as_str()).collect();
    assert_eq!(ops, vec!["Set", "Set", "Get", "Get", "Set", "Get"]);
    assert_eq!(batch.error_count(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_success_passes_value_through() {
    let (metrics, handle) = idle_aggregator();
    let storage = MeteredStorage::new(MemoryStorage::default(), metrics.clone());

    assert_eq!(storage.set("greeting", "hello", None).await.unwrap(), "OK");
    assert_eq!(storage.get("greeting").await.unwrap(), "hello");

    let batch = metrics.drain();
    assert!(batch.samples.iter().all(|s| s.is_success()));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_not_found_is_returned_unchanged() {
    let (metrics, handle) = idle_aggregator();
    let storage = MeteredStorage::new(MemoryStorage::default(), metrics.clone());

    let err = storage.get("nope").await.unwrap_err();
    assert!(matches!(&err, StorageError::NotFound { key } if key == "nope"));

    let batch = metrics.drain();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.samples[0].operation, "Get");
    assert_eq!(batch.samples[0].error.as_deref(), Some(err.to_string().as_str()));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_backend_error_is_returned_unchanged() {
    let (metrics, handle) = idle_aggregator();
    let storage = MeteredStorage::new(MemoryStorage::default(), metrics.clone());

    storage.inner().fail_next(redis::ErrorKind::IoError, "connection refused");
    let err = storage.get("a").await.unwrap_err();

    match err {
        StorageError::Redis(e) => {
            assert_eq!(e.kind(), redis::ErrorKind::IoError);
            assert!(e.to_string().contains("connection refused"));
        }
        other => panic!("expected Redis error, got {other:?}"),
    }
    assert_eq!(metrics.len(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_expiration_forwarded_as_given() {
    let (metrics, handle) = idle_aggregator();
    let storage = MeteredStorage::new(MemoryStorage::default(), metrics);

    storage.set("k", "v", Some(Duration::ZERO)).await.unwrap();
    assert_eq!(*storage.inner().last_expiration.lock(), Some(Some(Duration::ZERO)));

    storage.set("k", "v", Some(Duration::from_secs(5))).await.unwrap();
    assert_eq!(
        *storage.inner().last_expiration.lock(),
        Some(Some(Duration::from_secs(5)))
    );

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_each_record_once() {
    let (metrics, handle) = idle_aggregator();
    let storage = Arc::new(MeteredStorage::new(MemoryStorage::default(), metrics.clone()));

    let mut tasks = Vec::new();
    for i in 0..50 {
        let storage = storage.clone();
        tasks.push(tokio::spawn(async move {
            let key = format!("key:{i}");
            storage.set(&key, "v", None).await.unwrap();
            storage.get(&key).await.unwrap();
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    assert_eq!(metrics.len(), 100);

    handle.shutdown().await;
}
