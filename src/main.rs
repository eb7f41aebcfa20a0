//! Command-line interface for pulsar-snapshot
//!
//! # Usage Examples
//!
//! ## Snapshot
//! ```bash
//! # Capture tenants, namespaces, topics and up to 1000 messages per topic
//! pulsar-snapshot capture --admin-url http://localhost:8080 --snapshot-dir ./pulsar_capture
//!
//! # Recreate the topology, then republish the captured messages
//! pulsar-snapshot restore --admin-url http://target:8080 --allowed-clusters standalone
//! pulsar-snapshot replay --admin-url http://target:8080
//!
//! # Remove every non-system topic, namespace and tenant
//! pulsar-snapshot delete-all --admin-url http://target:8080
//! ```
//!
//! ## Inspection
//! ```bash
//! pulsar-snapshot inspect --context-file ~/.config/pulsar/config
//! pulsar-snapshot inspect topics --tenant eventbus --namespace org-1
//! pulsar-snapshot print --max-messages 10
//! ```
//!
//! ## Load Testing
//! ```bash
//! pulsar-snapshot publish persistent://eventbus/org-1/post-ingestion-495 \
//!   --count 100000 --rate 2000 --campaign-start 1000 --campaign-count 20
//! pulsar-snapshot sample
//! pulsar-snapshot ranges --test-topic persistent://eventbus/org-1/post-ingestion-495
//! ```

use clap::{Parser, Subcommand};
use loadtest_populate_pulsar::PublishArgs;
use pulsar_snapshot::commands::{self, inspect::InspectOptions, inspect::InspectTarget};
use pulsar_snapshot::{ClusterOpts, SnapshotOpts, SystemResourceOpts};

#[derive(Parser)]
#[command(name = "pulsar-snapshot")]
#[command(about = "Capture, restore, replay and load-test Apache Pulsar clusters")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture tenants, namespaces, topics and messages into the snapshot directory
    Capture {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        snapshot: SnapshotOpts,
    },

    /// Recreate tenants, namespaces and topics from the snapshot
    Restore {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        snapshot: SnapshotOpts,

        #[command(flatten)]
        system: SystemResourceOpts,
    },

    /// Republish the captured messages with their original metadata
    Replay {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        snapshot: SnapshotOpts,
    },

    /// Delete ALL non-system topics, namespaces and tenants
    DeleteAll {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        system: SystemResourceOpts,

        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Print the messages of every topic
    Print {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        snapshot: SnapshotOpts,
    },

    /// List tenants, namespaces and topics
    Inspect {
        /// What to list
        #[arg(value_enum, default_value = "all")]
        target: InspectTarget,

        #[command(flatten)]
        cluster: ClusterOpts,

        /// Specific tenant to inspect
        #[arg(long)]
        tenant: Option<String>,

        /// Specific namespace to inspect (requires --tenant)
        #[arg(long)]
        namespace: Option<String>,

        /// Limit for topics when listing across namespaces
        #[arg(long, default_value = "50")]
        topics_limit: usize,
    },

    /// Publish synthetic emailSend events at a fixed rate
    Publish {
        #[command(flatten)]
        cluster: ClusterOpts,

        #[command(flatten)]
        args: PublishArgs,
    },

    /// Generate and print a sample emailSend event
    Sample {
        /// Project ID of the sample event
        #[arg(long, default_value = "1")]
        project_id: u64,

        /// Random seed for a reproducible event
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the generator's ID ranges and test topic parsing
    Ranges {
        /// Topic name to extract a project ID from
        #[arg(long)]
        test_topic: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { cluster, snapshot } => commands::capture::run(cluster, snapshot).await,
        Commands::Restore {
            cluster,
            snapshot,
            system,
        } => commands::restore::run(cluster, snapshot, system).await,
        Commands::Replay { cluster, snapshot } => commands::replay::run(cluster, snapshot).await,
        Commands::DeleteAll {
            cluster,
            system,
            yes,
        } => commands::delete::run(cluster, system, yes).await,
        Commands::Print { cluster, snapshot } => commands::print::run(cluster, snapshot).await,
        Commands::Inspect {
            target,
            cluster,
            tenant,
            namespace,
            topics_limit,
        } => {
            let options = InspectOptions {
                target,
                tenant,
                namespace,
                topics_limit,
            };
            commands::inspect::run(cluster, options).await
        }
        Commands::Publish { cluster, args } => commands::publish::run(cluster, args).await,
        Commands::Sample { project_id, seed } => commands::generate::run_sample(project_id, seed),
        Commands::Ranges { test_topic } => commands::generate::run_ranges(test_topic.as_deref()),
    }
}
