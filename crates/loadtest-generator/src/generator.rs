//! Event generator.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::event::{
    EmailSendDiff, EmailSendEvent, EsContext, EventData, EventMetadata, EventPayload,
    EventSource, ItblInternal, Telemetry,
};

pub const DEFAULT_CAMPAIGN_IDS: [u64; 5] = [1, 2, 3, 4, 5];
pub const USER_DOMAINS: [&str; 3] = ["@test.com", "@iterable.com", "@example.com"];
pub const USER_PREFIXES: [&str; 8] = [
    "user", "test", "john", "jane", "alex", "sam", "chris", "taylor",
];

/// Error type for generator operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("The {0} pool is empty")]
    EmptyPool(&'static str),

    #[error("--campaign-start requires --campaign-count")]
    CampaignStartWithoutCount,

    #[error("--campaign-count requires --campaign-start")]
    CampaignCountWithoutStart,

    #[error("Cannot use both --campaign-ids and --campaign-start/--campaign-count")]
    ConflictingCampaignArgs,

    #[error("--campaign-count {count} exceeds the maximum of {max}")]
    CampaignCountTooLarge { count: u64, max: u64 },
}

/// Value pools events draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPools {
    pub campaign_ids: Vec<u64>,
    pub template_ids: Vec<u32>,
    pub user_prefixes: Vec<String>,
    pub user_domains: Vec<String>,
}

impl Default for EventPools {
    fn default() -> Self {
        Self {
            campaign_ids: DEFAULT_CAMPAIGN_IDS.to_vec(),
            template_ids: (10..=20).collect(),
            user_prefixes: USER_PREFIXES.iter().map(|s| s.to_string()).collect(),
            user_domains: USER_DOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EventPools {
    pub fn with_campaign_ids(mut self, campaign_ids: Vec<u64>) -> Self {
        self.campaign_ids = campaign_ids;
        self
    }

    fn validate(&self) -> Result<(), GeneratorError> {
        if self.campaign_ids.is_empty() {
            return Err(GeneratorError::EmptyPool("campaign id"));
        }
        if self.template_ids.is_empty() {
            return Err(GeneratorError::EmptyPool("template id"));
        }
        if self.user_prefixes.is_empty() {
            return Err(GeneratorError::EmptyPool("user prefix"));
        }
        if self.user_domains.is_empty() {
            return Err(GeneratorError::EmptyPool("user domain"));
        }
        Ok(())
    }
}

/// Generates `emailSend` events for one project.
///
/// With a seed the sequence of random choices is reproducible; timestamps
/// still come from the clock unless [`EventGenerator::generate_at`] is used.
pub struct EventGenerator {
    rng: StdRng,
    pools: EventPools,
    project_id: u64,
}

impl EventGenerator {
    pub fn new(project_id: u64, pools: EventPools, seed: Option<u64>) -> Result<Self, GeneratorError> {
        pools.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            pools,
            project_id,
        })
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn pools(&self) -> &EventPools {
        &self.pools
    }

    /// Random user key like `alex+4821@example.com`.
    pub fn user_key(&mut self) -> String {
        let prefix = pick(&mut self.rng, &self.pools.user_prefixes);
        let suffix = self.rng.gen_range(1..=9999);
        let domain = pick(&mut self.rng, &self.pools.user_domains);
        format!("{prefix}+{suffix}{domain}")
    }

    fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Uuid::from_bytes(bytes)
    }

    pub fn generate(&mut self) -> EmailSendEvent {
        self.generate_at(Utc::now())
    }

    /// Generate an event stamped with `now`.
    pub fn generate_at(&mut self, now: DateTime<Utc>) -> EmailSendEvent {
        let event_id = self.uuid().to_string();
        let user_key = self.user_key();
        let message_id = self.uuid().simple().to_string();
        let document_id = self.uuid().simple().to_string();
        let unconverted_document_id = self.uuid().simple().to_string();
        let template_id = *pick(&mut self.rng, &self.pools.template_ids);
        let campaign_id = *pick(&mut self.rng, &self.pools.campaign_ids);

        let iso = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        let millis = now.format("%Y-%m-%d %H:%M:%S%.3fZ").to_string();
        let document_time = now.format("%Y-%m-%d %H:%M:%S +00:00").to_string();

        EmailSendEvent {
            event_id: event_id.clone(),
            correlation_id: event_id,
            created_at: iso.clone(),
            payload_version: 1,
            payload_type: "UpdateEvent".to_string(),
            payload: EventPayload {
                project_id: self.project_id,
                user_key: user_key.clone(),
                doc_type: "emailSend".to_string(),
                metadata: EventMetadata {
                    telemetry: Telemetry {
                        ingest_request_time: iso.clone(),
                        ingest_start_time: millis,
                        ingest_finish_time: iso,
                    },
                    es_context: EsContext {
                        document_id,
                        unconverted_document_id,
                        created_at: document_time.clone(),
                        updated_at: document_time.clone(),
                    },
                    source: EventSource {
                        action: "NoOp".to_string(),
                    },
                },
                data: EventData {
                    data: serde_json::Map::new(),
                    diff: EmailSendDiff {
                        template_id,
                        campaign_id,
                        email: user_key,
                        message_id,
                        itbl_internal: ItblInternal {
                            document_created_at: document_time.clone(),
                            document_updated_at: document_time.clone(),
                        },
                        created_at: document_time,
                    },
                },
            },
        }
    }
}

// Pools are validated non-empty at construction.
fn pick<'a, T>(rng: &mut StdRng, pool: &'a [T]) -> &'a T {
    pool.choose(rng).unwrap_or(&pool[0])
}
