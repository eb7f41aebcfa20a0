//! Shared types for pulsar-snapshot.
//!
//! These types are used by the admin client, the data-plane client, the
//! capture/replay engines and the snapshot store:
//!
//! - [`Payload`] / [`CapturedMessage`] / [`TopicMessageSet`] - captured messages
//! - [`MessageRecord`] - the on-disk form of a captured message
//! - [`RawMessage`] / [`OutboundMessage`] - what the data plane reads and sends
//! - [`TopicName`] and partition-shard helpers
//! - [`ClusterTopology`] - tenants, namespaces and canonical topics

pub mod error;
pub mod message;
pub mod topic;
pub mod topology;

pub use error::{Result, TypesError};
pub use message::{
    CapturedMessage, MessageRecord, OutboundMessage, Payload, RawMessage, TopicMessageSet,
};
pub use topic::{
    is_partition_shard, partition_name, partition_parent, snapshot_file_stem, TopicDomain,
    TopicName,
};
pub use topology::{ClusterTopology, TopologyViolation};
