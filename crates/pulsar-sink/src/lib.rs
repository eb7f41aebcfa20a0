//! Writing a snapshot back into a cluster.
//!
//! - [`TopologyRestorer`] recreates tenants, namespaces and topics
//! - [`MessageReplay`] republishes captured messages with their metadata

mod replay;
mod restore;

pub use replay::{MessageReplay, ReplayReport};
pub use restore::{EntityCounts, RestoreReport, TopologyRestorer};
