//! Shared cluster fixtures.

use pulsar_admin::memory::InMemoryDirectory;
use pulsar_admin::TopicSource;
use pulsar_snapshot_source::CaptureConfig;
use pulsar_types::RawMessage;
use std::collections::BTreeMap;
use std::time::Duration;

pub const ORDERS: &str = "persistent://t/ns/orders";
pub const EVENTS: &str = "persistent://t/ns/events";
pub const UNDERSCORED: &str = "persistent://t/ns/my_topic";

pub const BINARY_PAYLOAD: [u8; 5] = [0xff, 0xfe, 0x00, 0x01, 0x80];

pub fn capture_config() -> CaptureConfig {
    CaptureConfig {
        max_messages: 1000,
        read_timeout: Duration::from_millis(200),
    }
}

pub fn raw(payload: &[u8], publish_timestamp: i64) -> RawMessage {
    RawMessage {
        payload: payload.to_vec(),
        properties: BTreeMap::from([("k".to_string(), "v".to_string())]),
        publish_timestamp,
        event_timestamp: 0,
        partition_key: None,
    }
}

/// The orders scenario: three text messages and one binary message.
pub fn orders_messages() -> Vec<RawMessage> {
    vec![
        RawMessage {
            event_timestamp: 1_699_999_999_000,
            partition_key: Some("customer-1".to_string()),
            ..raw(b"order one", 1_700_000_000_001)
        },
        raw(b"order two", 1_700_000_000_002),
        raw("order three \u{2713}".as_bytes(), 1_700_000_000_003),
        raw(&BINARY_PAYLOAD, 1_700_000_000_004),
    ]
}

/// Tenant `t` with namespace `t/ns` holding `orders`, `my_topic` and the
/// two-partition topic `events`, as the admin API lists them.
pub fn source_directory() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_cluster("standalone")
        .with_tenant("t")
        .with_namespace("t/ns")
        .with_listing(
            "t/ns",
            TopicSource::Persistent,
            &[
                ORDERS,
                UNDERSCORED,
                "persistent://t/ns/events-partition-0",
                "persistent://t/ns/events-partition-1",
            ],
        )
        .with_listing("t/ns", TopicSource::Partitioned, &[EVENTS])
        .with_listing(
            "t/ns",
            TopicSource::System,
            &[ORDERS, UNDERSCORED, "persistent://t/ns/__change_events"],
        )
}
