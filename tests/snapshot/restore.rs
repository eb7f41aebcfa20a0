//! Restore a captured topology into an empty cluster.

use pulsar_admin::memory::InMemoryDirectory;
use pulsar_client::memory::InMemoryBroker;
use pulsar_snapshot::commands::capture::capture_snapshot;
use pulsar_snapshot::commands::restore::restore_snapshot;
use snapshot_store::FilesystemStore;
use tempfile::TempDir;

use crate::fixtures::{capture_config, source_directory, EVENTS, ORDERS, UNDERSCORED};

async fn captured_store(dir: &TempDir) -> FilesystemStore {
    let store = FilesystemStore::new(dir.path());
    capture_snapshot(
        &source_directory(),
        &InMemoryBroker::new(),
        &store,
        capture_config(),
    )
    .await
    .unwrap();
    store
}

#[tokio::test(start_paused = true)]
async fn test_restore_into_empty_cluster() {
    let dir = TempDir::new().unwrap();
    let store = captured_store(&dir).await;
    let target = InMemoryDirectory::new();

    let report = restore_snapshot(&target, &store, vec!["standalone".to_string()])
        .await
        .unwrap();
    assert_eq!(report.tenants.created, 1);
    assert_eq!(report.namespaces.created, 1);
    assert_eq!(report.topics.created, 4);
    assert_eq!(report.failed(), 0);

    assert_eq!(target.tenants(), vec!["t"]);
    assert_eq!(target.namespaces(), vec!["t/ns"]);
    let created = target.created_topics();
    assert_eq!(created[0], EVENTS);
    assert!(created.contains(&ORDERS.to_string()));
    assert!(created.contains(&UNDERSCORED.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_restore_twice_reports_existing() {
    let dir = TempDir::new().unwrap();
    let store = captured_store(&dir).await;
    let target = InMemoryDirectory::new();
    let clusters = vec!["standalone".to_string()];

    restore_snapshot(&target, &store, clusters.clone())
        .await
        .unwrap();
    let second = restore_snapshot(&target, &store, clusters).await.unwrap();
    assert_eq!(second.tenants.existing, 1);
    assert_eq!(second.namespaces.existing, 1);
    assert_eq!(second.topics.existing, 4);
    assert_eq!(second.topics.created, 0);
    assert_eq!(target.created_topics().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_entity_does_not_stop_restore() {
    let dir = TempDir::new().unwrap();
    let store = captured_store(&dir).await;
    let target = InMemoryDirectory::new().fail_name(ORDERS);

    let report = restore_snapshot(&target, &store, vec!["standalone".to_string()])
        .await
        .unwrap();
    assert_eq!(report.topics.created, 3);
    assert_eq!(report.topics.failed, 1);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_missing_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path().join("absent"));
    let result = restore_snapshot(&InMemoryDirectory::new(), &store, Vec::new()).await;
    assert!(result.is_err());
}
