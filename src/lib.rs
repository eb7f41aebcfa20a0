//! pulsar-snapshot library
//!
//! Snapshot, restore and load-test tooling for Apache Pulsar clusters.
//!
//! # Features
//!
//! - Capture: tenants, namespaces, canonical topics and a bounded sample of
//!   every topic's messages into a snapshot directory
//! - Restore and replay: recreate the topology and republish the captured
//!   messages with their original metadata
//! - Inspection: list tenants, namespaces and topics of a live cluster
//! - Load testing: publish synthetic `emailSend` events at a fixed rate
//!
//! # CLI Usage
//!
//! ```bash
//! # Capture a cluster into ./pulsar_capture
//! pulsar-snapshot capture --admin-url http://localhost:8080
//!
//! # Recreate the topology and replay the messages elsewhere
//! pulsar-snapshot restore --admin-url http://other:8080
//! pulsar-snapshot replay --admin-url http://other:8080
//!
//! # Publish 10,000 events at 1,000/s
//! pulsar-snapshot publish persistent://eventbus/org-1/post-ingestion-495 \
//!   --count 10000 --rate 1000
//! ```

use clap::Parser;
use std::path::PathBuf;

pub mod commands;
pub mod config;

pub use config::AppConfig;

/// Cluster connection options.
#[derive(Parser, Clone, Debug)]
pub struct ClusterOpts {
    /// Admin REST API URL [default: http://localhost:8080]
    #[arg(long, env = "PULSAR_ADMIN_URL")]
    pub admin_url: Option<String>,

    /// Broker service URL (derived from the admin URL when unset)
    #[arg(long, env = "PULSAR_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Authentication token (skips OAuth)
    #[arg(long, env = "PULSAR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// pulsarctl-style context file
    #[arg(long, env = "PULSAR_CONTEXT_FILE")]
    pub context_file: Option<PathBuf>,

    /// Context to use from the context file (defaults to its current context)
    #[arg(long)]
    pub context: Option<String>,

    /// Timeout for admin and token requests, in seconds
    #[arg(long, default_value = "10")]
    pub request_timeout_secs: u64,
}

/// Snapshot directory and capture bounds.
#[derive(Parser, Clone, Debug)]
pub struct SnapshotOpts {
    /// Directory holding the snapshot
    #[arg(long, env = "PULSAR_SNAPSHOT_DIR", default_value = "pulsar_capture")]
    pub snapshot_dir: PathBuf,

    /// Maximum messages captured per topic
    #[arg(long, default_value = "1000")]
    pub max_messages: usize,

    /// How long to wait for each next message (e.g. "5s", "500ms")
    #[arg(long, default_value = "5s")]
    pub read_timeout: String,
}

/// Resources that bulk operations leave alone, and tenant settings used on
/// restore.
#[derive(Parser, Clone, Debug)]
pub struct SystemResourceOpts {
    /// Tenants never deleted (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "pulsar,public")]
    pub system_tenants: Vec<String>,

    /// Namespaces never deleted (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "public/default,public/functions,pulsar/system"
    )]
    pub system_namespaces: Vec<String>,

    /// Clusters restored tenants are allowed on (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "standalone")]
    pub allowed_clusters: Vec<String>,
}

impl SnapshotOpts {
    pub fn capture_config(&self) -> anyhow::Result<pulsar_snapshot_source::CaptureConfig> {
        Ok(pulsar_snapshot_source::CaptureConfig {
            max_messages: self.max_messages,
            read_timeout: config::parse_duration(&self.read_timeout)?,
        })
    }
}

impl SystemResourceOpts {
    pub fn is_system_tenant(&self, tenant: &str) -> bool {
        self.system_tenants.iter().any(|t| t == tenant)
    }

    pub fn is_system_namespace(&self, namespace: &str) -> bool {
        self.system_namespaces.iter().any(|ns| ns == namespace)
    }
}
