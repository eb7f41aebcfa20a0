//! Pulsar admin REST client.
//!
//! This crate talks to the `admin/v2` control plane of a Pulsar cluster:
//!
//! - [`DirectoryClient`] - enumeration and idempotent create/delete calls
//! - [`HttpDirectoryClient`] - the reqwest-backed implementation
//! - [`TopicReconciler`] - merges the overlapping topic listings into one
//!   canonical, partition-aware set
//! - [`oauth`] - client-credentials token acquisition
//! - [`memory::InMemoryDirectory`] - an in-process directory for tests

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod oauth;
pub mod reconcile;

pub use client::{CreateOutcome, DirectoryClient, TopicSource};
pub use error::{AdminError, Result};
pub use http::HttpDirectoryClient;
pub use reconcile::{TopicReconciler, TopicSet};
