//! Capture into a snapshot directory, then replay into another broker.

use base64::Engine;
use pulsar_client::memory::InMemoryBroker;
use pulsar_snapshot::commands::capture::capture_snapshot;
use pulsar_snapshot::commands::replay::replay_snapshot;
use pulsar_types::{CapturedMessage, Payload, TopicMessageSet};
use snapshot_store::{FilesystemStore, SnapshotStore};
use tempfile::TempDir;

use crate::fixtures::{
    capture_config, orders_messages, raw, source_directory, BINARY_PAYLOAD, EVENTS, ORDERS,
    UNDERSCORED,
};

const EVENTS_SHARD_0: &str = "persistent://t/ns/events-partition-0";
const EVENTS_SHARD_1: &str = "persistent://t/ns/events-partition-1";

fn source_broker() -> InMemoryBroker {
    let broker = InMemoryBroker::new();
    broker.seed(ORDERS, orders_messages());
    broker.seed(UNDERSCORED, [raw(b"underscored", 1_700_000_000_010)]);
    broker.create_partitioned(EVENTS, 2);
    broker.seed(EVENTS_SHARD_1, [raw(b"event b", 1_700_000_000_021)]);
    broker.seed(EVENTS_SHARD_0, [raw(b"event a", 1_700_000_000_020)]);
    broker
}

#[tokio::test(start_paused = true)]
async fn test_capture_writes_topology_and_records() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());

    let summary = capture_snapshot(&source_directory(), &source_broker(), &store, capture_config())
        .await
        .unwrap();
    assert_eq!(summary.tenants, 1);
    assert_eq!(summary.namespaces, 1);
    assert_eq!(summary.topics, 4);
    assert_eq!(summary.captured_topics, 4);
    assert_eq!(summary.skipped_topics, 0);
    assert_eq!(summary.messages, 7);
    assert_eq!(summary.binary_messages, 1);

    let topics = std::fs::read_to_string(dir.path().join("topics.txt")).unwrap();
    assert_eq!(
        topics.lines().collect::<Vec<_>>(),
        vec![
            EVENTS,
            "persistent://t/ns/__change_events",
            UNDERSCORED,
            ORDERS,
        ]
    );
    let all_topics = store.read_all_topics().unwrap();
    assert!(all_topics.contains(&"persistent://t/ns/events-partition-0".to_string()));
    assert!(all_topics.contains(&EVENTS.to_string()));

    let content = std::fs::read_to_string(store.messages_path(ORDERS)).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 4);
    for record in &records[..3] {
        assert_eq!(record["binary_encoded"], false);
        assert_eq!(record["properties"], serde_json::json!({"k": "v"}));
    }
    assert_eq!(records[0]["content"], "order one");
    assert_eq!(records[0]["event_timestamp"], 1_699_999_999_000i64);
    assert_eq!(records[0]["partition_key"], "customer-1");
    assert_eq!(records[2]["content"], "order three \u{2713}");

    let binary = &records[3];
    assert_eq!(binary["binary_encoded"], true);
    assert_eq!(
        binary["content"],
        base64::engine::general_purpose::STANDARD.encode(BINARY_PAYLOAD)
    );
    assert_eq!(binary["properties"], serde_json::json!({"k": "v"}));
    assert_eq!(binary["publish_timestamp"], 1_700_000_000_004i64);
}

#[tokio::test(start_paused = true)]
async fn test_replay_reproduces_messages() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());
    capture_snapshot(&source_directory(), &source_broker(), &store, capture_config())
        .await
        .unwrap();

    let target = InMemoryBroker::new();
    let summary = replay_snapshot(&target, &store).await.unwrap();
    assert_eq!(summary.topics, 3);
    assert_eq!(summary.replayed, 7);
    assert_eq!(summary.failed, 0);
    assert_eq!(target.open_publishers(), 0);

    let original = orders_messages();
    let replayed = target.messages(ORDERS);
    assert_eq!(replayed.len(), 4);
    for (before, after) in original.iter().zip(&replayed) {
        assert_eq!(after.payload, before.payload);
        assert_eq!(after.properties, before.properties);
        assert_eq!(after.event_timestamp, before.event_timestamp);
        assert_eq!(after.partition_key, before.partition_key);
    }
    assert_eq!(replayed[3].payload, BINARY_PAYLOAD.to_vec());

    // Underscores in topic names survive the file mapping
    assert_eq!(target.messages(UNDERSCORED).len(), 1);
    assert_eq!(target.messages(EVENTS).len(), 2);
    assert!(target.messages("persistent://t/ns/my/topic").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_topic_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());
    let broker = source_broker();
    broker.fail_open(UNDERSCORED);

    // Left behind by an earlier capture into the same directory
    let mut stale = TopicMessageSet::new(UNDERSCORED);
    stale.push(CapturedMessage::from(raw(b"stale", 1)));
    store.write_messages(&stale).await.unwrap();

    let summary = capture_snapshot(&source_directory(), &broker, &store, capture_config())
        .await
        .unwrap();
    assert_eq!(summary.captured_topics, 3);
    assert_eq!(summary.skipped_topics, 1);
    assert!(!store.messages_path(UNDERSCORED).exists());
    assert!(store.read_messages(UNDERSCORED).await.unwrap().is_none());
    assert_eq!(store.read_messages(ORDERS).await.unwrap().unwrap().len(), 4);
    assert_eq!(broker.open_readers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_capture_respects_message_bound() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());
    let mut config = capture_config();
    config.max_messages = 2;

    let summary = capture_snapshot(&source_directory(), &source_broker(), &store, config)
        .await
        .unwrap();
    assert_eq!(summary.messages, 5);

    let orders = store.read_messages(ORDERS).await.unwrap().unwrap();
    assert_eq!(orders.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_is_stable() {
    let directory = source_directory();
    let first = pulsar_snapshot::commands::discover_topology(&directory).await;
    let second = pulsar_snapshot::commands::discover_topology(&directory).await;
    assert_eq!(first.topology, second.topology);
    assert!(first.topology.validate().is_empty());
    assert!(first.topics.is_partitioned(EVENTS));
}

#[tokio::test(start_paused = true)]
async fn test_partitioned_topic_is_captured_from_its_shards() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());
    let broker = source_broker();

    let summary = capture_snapshot(&source_directory(), &broker, &store, capture_config())
        .await
        .unwrap();
    assert_eq!(summary.skipped_topics, 0);
    assert_eq!(broker.open_readers(), 0);

    let events = store.read_messages(EVENTS).await.unwrap().unwrap();
    let payloads: Vec<&Payload> = events.messages.iter().map(|m| &m.payload).collect();
    assert_eq!(
        payloads,
        vec![
            &Payload::Text("event a".to_string()),
            &Payload::Text("event b".to_string())
        ]
    );
    assert!(store.read_messages(EVENTS_SHARD_0).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_replay_into_partitioned_topic_spreads_over_shards() {
    let dir = TempDir::new().unwrap();
    let store = FilesystemStore::new(dir.path());
    capture_snapshot(&source_directory(), &source_broker(), &store, capture_config())
        .await
        .unwrap();

    let target = InMemoryBroker::new();
    target.create_partitioned(EVENTS, 2);
    replay_snapshot(&target, &store).await.unwrap();

    assert!(target.messages(EVENTS).is_empty());
    assert_eq!(target.messages(EVENTS_SHARD_0).len(), 1);
    assert_eq!(target.messages(EVENTS_SHARD_1).len(), 1);
}
