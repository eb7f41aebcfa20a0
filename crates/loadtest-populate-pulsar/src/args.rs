//! CLI argument definitions for the synthetic publisher.

use clap::Args;
use loadtest_generator::{CampaignSelection, GeneratorError};

/// Arguments of the `publish` command.
#[derive(Args, Clone, Debug)]
pub struct PublishArgs {
    /// Topic to publish to
    pub topic: String,

    /// Number of messages to send
    #[arg(long, default_value = "1000")]
    pub count: u64,

    /// Messages per second
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u32).range(1..))]
    pub rate: u32,

    /// Project ID for messages (auto-detected from the topic if not set)
    #[arg(long)]
    pub project_id: Option<u64>,

    /// Disable auto-detection of the project ID from the topic
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Specific campaign IDs to randomly distribute (comma-separated)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub campaign_ids: Option<Vec<u64>>,

    /// Starting campaign ID for range generation
    #[arg(long)]
    pub campaign_start: Option<u64>,

    /// Number of campaign IDs to generate (use with --campaign-start)
    #[arg(long)]
    pub campaign_count: Option<u64>,

    /// Random seed for reproducible events (entropy when unset)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl PublishArgs {
    pub fn campaign_selection(&self) -> Result<CampaignSelection, GeneratorError> {
        CampaignSelection::from_args(
            self.campaign_ids.clone(),
            self.campaign_start,
            self.campaign_count,
        )
    }
}
