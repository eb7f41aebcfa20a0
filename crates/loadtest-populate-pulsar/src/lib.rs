//! Synthetic event publisher for Pulsar load testing.
//!
//! [`SyntheticPublisher`] drives an [`loadtest_generator::EventGenerator`]
//! into one topic at a fixed rate. Sends are fire-and-forget in batches of
//! at most [`MAX_BATCH_SIZE`], with a sleep after each batch so the
//! throughput stays at the requested rate:
//!
//! ```text
//! EventGenerator ──► batch of send_async ──► sleep(budget - elapsed) ──┐
//!        ▲                                                             │
//!        └─────────────────────── until count or Ctrl+C ◄──────────────┘
//!                                        │
//!                                        ▼
//!                                 flush + close
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use loadtest_generator::{EventGenerator, EventPools};
//! use loadtest_populate_pulsar::SyntheticPublisher;
//!
//! let (_tx, shutdown) = tokio::sync::broadcast::channel(1);
//! let mut generator = EventGenerator::new(495, EventPools::default(), None)?;
//! let metrics = SyntheticPublisher::new(&broker)
//!     .publish("persistent://eventbus/org-1/post-ingestion-495", 10_000, 1000, &mut generator, shutdown)
//!     .await?;
//! println!("Sent {} messages in {:?}", metrics.messages_sent, metrics.duration);
//! ```

pub mod args;
pub mod error;
pub mod populator;

pub use args::PublishArgs;
pub use error::{PopulateError, Result};
pub use populator::{
    batch_budget, batch_size, PublishMetrics, SyntheticPublisher, MAX_BATCH_SIZE,
    PROGRESS_INTERVAL,
};
