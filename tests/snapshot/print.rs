//! Printing live topics.

use pulsar_client::memory::InMemoryBroker;
use pulsar_snapshot::commands::check_connection;
use pulsar_snapshot::commands::print::print_all;

use crate::fixtures::{capture_config, orders_messages, source_directory, EVENTS, ORDERS};

#[tokio::test(start_paused = true)]
async fn test_print_all_topics() {
    let broker = InMemoryBroker::new();
    broker.seed(ORDERS, orders_messages());

    let mut out = Vec::new();
    let total = print_all(&source_directory(), &broker, capture_config(), &mut out)
        .await
        .unwrap();
    assert_eq!(total, 4);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!("=== TOPIC: {ORDERS} ===")));
    assert!(text.contains(&format!("Total messages read from {ORDERS}: 4")));
    assert!(text.contains(&format!("Total messages read from {EVENTS}: 0")));
    assert!(text.contains("Content: order one"));
    assert!(text.contains("Partition key: customer-1"));
    assert!(text.contains("(Content is base64-encoded binary data)"));
    assert!(text.contains("  No messages found"));
    assert!(text.trim_end().ends_with("Printing completed."));

    // Partitioned topics are printed before plain ones
    let events_at = text.find(&format!("=== TOPIC: {EVENTS}")).unwrap();
    let orders_at = text.find(&format!("=== TOPIC: {ORDERS}")).unwrap();
    assert!(events_at < orders_at);
}

#[tokio::test(start_paused = true)]
async fn test_print_skips_unreadable_topic() {
    let broker = InMemoryBroker::new();
    broker.seed(ORDERS, orders_messages());
    broker.fail_open(ORDERS);

    let mut out = Vec::new();
    let total = print_all(&source_directory(), &broker, capture_config(), &mut out)
        .await
        .unwrap();
    assert_eq!(total, 0);
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains(&format!("=== TOPIC: {ORDERS} ===")));
}

#[tokio::test]
async fn test_check_connection_lists_clusters() {
    let clusters = check_connection(&source_directory()).await.unwrap();
    assert_eq!(clusters, vec!["standalone"]);
}
