//! Campaign id selection.

use crate::generator::{GeneratorError, DEFAULT_CAMPAIGN_IDS};

/// Largest campaign id range a selection may ask for. The range is
/// materialized as the generator's id pool.
pub const MAX_CAMPAIGN_COUNT: u64 = 100_000;

/// `count` consecutive campaign ids starting at `start`.
pub fn campaign_range(start: u64, count: u64) -> Vec<u64> {
    (start..start.saturating_add(count)).collect()
}

/// How the campaign id pool is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignSelection {
    /// The built-in pool
    Default,
    /// An explicit list of ids
    List(Vec<u64>),
    /// `count` consecutive ids from `start`
    Range { start: u64, count: u64 },
}

impl CampaignSelection {
    /// Build a selection from the publish command's campaign options.
    ///
    /// A list and a range are mutually exclusive. A range needs both its
    /// start and its count, and at most [`MAX_CAMPAIGN_COUNT`] ids.
    pub fn from_args(
        ids: Option<Vec<u64>>,
        start: Option<u64>,
        count: Option<u64>,
    ) -> Result<Self, GeneratorError> {
        match (ids, start, count) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err(GeneratorError::ConflictingCampaignArgs)
            }
            (Some(ids), None, None) if ids.is_empty() => {
                Err(GeneratorError::EmptyPool("campaign id"))
            }
            (Some(ids), None, None) => Ok(CampaignSelection::List(ids)),
            (None, Some(_), None) => Err(GeneratorError::CampaignStartWithoutCount),
            (None, None, Some(_)) => Err(GeneratorError::CampaignCountWithoutStart),
            (None, Some(_), Some(0)) => Err(GeneratorError::EmptyPool("campaign id")),
            (None, Some(_), Some(count)) if count > MAX_CAMPAIGN_COUNT => {
                Err(GeneratorError::CampaignCountTooLarge {
                    count,
                    max: MAX_CAMPAIGN_COUNT,
                })
            }
            (None, Some(start), Some(count)) => Ok(CampaignSelection::Range { start, count }),
            (None, None, None) => Ok(CampaignSelection::Default),
        }
    }

    pub fn campaign_ids(&self) -> Vec<u64> {
        match self {
            CampaignSelection::Default => DEFAULT_CAMPAIGN_IDS.to_vec(),
            CampaignSelection::List(ids) => ids.clone(),
            CampaignSelection::Range { start, count } => campaign_range(*start, *count),
        }
    }
}
