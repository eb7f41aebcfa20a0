//! Message types.
//!
//! [`RawMessage`] and [`OutboundMessage`] are what the data-plane client reads
//! and sends. [`CapturedMessage`] is the snapshot view of a read message, with
//! the payload split into text or binary. [`MessageRecord`] is its on-disk
//! JSON form.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// A message as read from a topic, before any payload decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Application properties attached by the producer
    pub properties: BTreeMap<String, String>,
    /// Broker publish time in milliseconds since epoch
    pub publish_timestamp: i64,
    /// Producer event time in milliseconds since epoch, 0 when not set
    pub event_timestamp: i64,
    /// Partition (routing) key, if any
    pub partition_key: Option<String>,
}

/// A message to be sent to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutboundMessage {
    pub payload: Vec<u8>,
    pub properties: BTreeMap<String, String>,
    /// Event time in milliseconds since epoch
    pub event_timestamp: Option<i64>,
    pub partition_key: Option<String>,
}

impl OutboundMessage {
    /// Create a message with only a payload.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Default::default()
        }
    }
}

/// Message payload variants.
///
/// A payload is text when it decodes as UTF-8 and binary otherwise. Binary
/// payloads are stored as base64 on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Valid UTF-8 payload
    Text(String),
    /// Payload that failed UTF-8 decoding
    Binary(Vec<u8>),
}

impl Payload {
    /// Classify raw bytes as text or binary.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Payload::Text(text),
            Err(e) => Payload::Binary(e.into_bytes()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.into_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    /// Encode into the text-safe `(content, binary_encoded)` pair.
    pub fn encode(&self) -> (String, bool) {
        match self {
            Payload::Text(text) => (text.clone(), false),
            Payload::Binary(bytes) => (
                base64::engine::general_purpose::STANDARD.encode(bytes),
                true,
            ),
        }
    }

    /// Reverse [`Payload::encode`].
    pub fn decode(content: &str, binary_encoded: bool) -> Result<Self> {
        if binary_encoded {
            let bytes = base64::engine::general_purpose::STANDARD.decode(content)?;
            Ok(Payload::Binary(bytes))
        } else {
            Ok(Payload::Text(content.to_string()))
        }
    }
}

/// A captured message with its original delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    pub payload: Payload,
    pub properties: BTreeMap<String, String>,
    pub publish_timestamp: i64,
    /// 0 when the producer did not set an event time
    pub event_timestamp: i64,
    pub partition_key: Option<String>,
}

impl CapturedMessage {
    /// Build the message that republishes this one.
    ///
    /// The event time is omitted when it was never set.
    pub fn to_outbound(&self) -> OutboundMessage {
        OutboundMessage {
            payload: self.payload.as_bytes().to_vec(),
            properties: self.properties.clone(),
            event_timestamp: (self.event_timestamp > 0).then_some(self.event_timestamp),
            partition_key: self.partition_key.clone(),
        }
    }

    pub fn to_record(&self) -> MessageRecord {
        let (content, binary_encoded) = self.payload.encode();
        MessageRecord {
            content,
            binary_encoded,
            properties: self.properties.clone(),
            publish_timestamp: self.publish_timestamp,
            event_timestamp: self.event_timestamp,
            partition_key: self.partition_key.clone(),
        }
    }
}

impl From<RawMessage> for CapturedMessage {
    fn from(raw: RawMessage) -> Self {
        Self {
            payload: Payload::from_bytes(raw.payload),
            properties: raw.properties,
            publish_timestamp: raw.publish_timestamp,
            event_timestamp: raw.event_timestamp,
            partition_key: raw.partition_key.filter(|key| !key.is_empty()),
        }
    }
}

/// On-disk representation of a captured message.
///
/// # File Format
///
/// ```json
/// {
///   "content": "aGVsbG8=",
///   "binary_encoded": true,
///   "properties": { "k": "v" },
///   "publish_timestamp": 1700000000000,
///   "event_timestamp": 0,
///   "partition_key": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub content: String,
    #[serde(default)]
    pub binary_encoded: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub publish_timestamp: i64,
    #[serde(default)]
    pub event_timestamp: i64,
    #[serde(default)]
    pub partition_key: Option<String>,
}

impl MessageRecord {
    /// Convert back into a captured message, decoding base64 content.
    ///
    /// An empty partition key is treated as absent.
    pub fn into_captured(self) -> Result<CapturedMessage> {
        Ok(CapturedMessage {
            payload: Payload::decode(&self.content, self.binary_encoded)?,
            properties: self.properties,
            publish_timestamp: self.publish_timestamp,
            event_timestamp: self.event_timestamp,
            partition_key: self.partition_key.filter(|key| !key.is_empty()),
        })
    }
}

/// Ordered messages captured from one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageSet {
    pub topic: String,
    pub messages: Vec<CapturedMessage>,
}

impl TopicMessageSet {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            messages: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: CapturedMessage) {
        self.messages.push(message);
    }

    pub fn binary_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.payload.is_binary())
            .count()
    }

    pub fn to_records(&self) -> Vec<MessageRecord> {
        self.messages.iter().map(CapturedMessage::to_record).collect()
    }

    pub fn from_records(topic: impl Into<String>, records: Vec<MessageRecord>) -> Result<Self> {
        let messages = records
            .into_iter()
            .map(MessageRecord::into_captured)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            topic: topic.into(),
            messages,
        })
    }
}
