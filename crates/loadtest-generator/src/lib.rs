//! Synthetic event generator for Pulsar load testing.
//!
//! This crate produces `emailSend` update events shaped like the ones an
//! ingestion pipeline consumes, plus the helpers that pick their identity:
//!
//! ```text
//! topic name ──► resolve_project_id ──┐
//!                                     ▼
//! CampaignSelection ──► EventPools ──► EventGenerator ──► EmailSendEvent (JSON)
//! ```
//!
//! # Example
//!
//! ```rust
//! use loadtest_generator::{EventGenerator, EventPools};
//!
//! let mut generator = EventGenerator::new(495, EventPools::default(), Some(42)).unwrap();
//! let event = generator.generate();
//! assert_eq!(event.payload.project_id, 495);
//! ```

pub mod campaign;
pub mod event;
pub mod generator;
pub mod project;

pub use campaign::{campaign_range, CampaignSelection, MAX_CAMPAIGN_COUNT};
pub use event::EmailSendEvent;
pub use generator::{EventGenerator, EventPools, GeneratorError};
pub use project::{
    extract_project_id, resolve_project_id, ProjectIdSource, ResolvedProjectId,
    DEFAULT_PROJECT_ID,
};
