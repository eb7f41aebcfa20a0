//! Publish: synthetic events at a fixed rate.

use loadtest_generator::{resolve_project_id, CampaignSelection, EventGenerator, EventPools};
use loadtest_populate_pulsar::{PublishArgs, SyntheticPublisher};
use tokio::sync::broadcast;
use tracing::info;

use crate::{AppConfig, ClusterOpts};

/// Set up a shutdown handler that fires on Ctrl+C.
fn setup_shutdown_handler() -> broadcast::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install CTRL+C signal handler: {e}");
            return;
        }
        info!("Received interrupt signal (Ctrl+C)");
        let _ = shutdown_tx.send(());
    });

    shutdown_rx
}

/// Build the event generator for a publish run from its arguments.
pub fn build_generator(args: &PublishArgs) -> anyhow::Result<EventGenerator> {
    let project = resolve_project_id(&args.topic, args.project_id, !args.no_auto_detect);

    let selection = args.campaign_selection()?;
    if let CampaignSelection::Range { start, count } = selection {
        info!(
            "Generated campaign range: {start} to {}",
            start.saturating_add(count.saturating_sub(1))
        );
    }

    let pools = EventPools::default().with_campaign_ids(selection.campaign_ids());
    Ok(EventGenerator::new(project.id, pools, args.seed)?)
}

pub async fn run(cluster: ClusterOpts, args: PublishArgs) -> anyhow::Result<()> {
    let mut generator = build_generator(&args)?;
    let pools = generator.pools();
    info!("Project ID: {}", generator.project_id());
    info!(
        "Campaign IDs: {:?} ({} campaigns)",
        pools.campaign_ids,
        pools.campaign_ids.len()
    );
    info!(
        "Template IDs: {:?} ({} templates)",
        pools.template_ids,
        pools.template_ids.len()
    );

    let mut config = AppConfig::load(&cluster)?;
    config.authenticate().await;
    let broker = config.connect_broker().await?;

    let shutdown = setup_shutdown_handler();
    let metrics = SyntheticPublisher::new(&broker)
        .publish(&args.topic, args.count, args.rate, &mut generator, shutdown)
        .await?;

    if metrics.messages_failed > 0 {
        tracing::warn!("{} messages failed to publish", metrics.messages_failed);
    }
    Ok(())
}
