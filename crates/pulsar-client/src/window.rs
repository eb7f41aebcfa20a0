//! Bounded window of unsettled asynchronous sends.
//!
//! Both publishers enqueue into a batching producer and keep the receipts
//! here. A receipt only resolves once the batch holding its message has been
//! pushed out, so every drain sends the partial batch before awaiting.

use async_trait::async_trait;
use pulsar_types::OutboundMessage;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use crate::error::{ClientError, Result};
use crate::FlushOutcome;

/// Resolves once the broker accepted or rejected one message.
pub(crate) type Receipt =
    Pin<Box<dyn Future<Output = std::result::Result<(), String>> + Send + 'static>>;

/// A producer that groups enqueued messages into batches.
#[async_trait]
pub(crate) trait BatchSink: Send {
    async fn enqueue(&mut self, message: OutboundMessage) -> std::result::Result<Receipt, String>;

    /// Push out the partially filled batch, if any.
    async fn send_batch(&mut self) -> std::result::Result<(), String>;
}

pub(crate) struct SendWindow {
    topic: String,
    pending: VecDeque<Receipt>,
    max_in_flight: usize,
    outcome: FlushOutcome,
}

impl SendWindow {
    pub(crate) fn new(topic: &str, max_in_flight: usize) -> Self {
        Self {
            topic: topic.to_string(),
            pending: VecDeque::new(),
            max_in_flight: max_in_flight.max(1),
            outcome: FlushOutcome::default(),
        }
    }

    pub(crate) fn unsettled(&self) -> usize {
        self.pending.len()
    }

    /// Enqueue one message, draining the window first when it is full.
    pub(crate) async fn send_async<S: BatchSink + ?Sized>(
        &mut self,
        sink: &mut S,
        message: OutboundMessage,
    ) -> Result<()> {
        if self.pending.len() >= self.max_in_flight {
            if let Err(reason) = self.drain(sink).await {
                let abandoned = self.pending.len() as u64;
                self.pending.clear();
                self.outcome.failed += abandoned;
                tracing::warn!(
                    "Failed to push out batch on {}: {reason} ({abandoned} sends failed)",
                    self.topic
                );
            }
        }

        let receipt = sink
            .enqueue(message)
            .await
            .map_err(|reason| ClientError::Send {
                topic: self.topic.clone(),
                reason,
            })?;
        self.pending.push_back(receipt);
        Ok(())
    }

    /// Push out the partial batch and settle every pending receipt.
    ///
    /// When the batch cannot be pushed out the error carries what was
    /// settled so far and how many receipts were abandoned.
    pub(crate) async fn flush<S: BatchSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<FlushOutcome> {
        match self.drain(sink).await {
            Ok(()) => Ok(std::mem::take(&mut self.outcome)),
            Err(reason) => {
                let unsettled = self.pending.len() as u64;
                self.pending.clear();
                Err(ClientError::Flush {
                    topic: self.topic.clone(),
                    reason,
                    settled: std::mem::take(&mut self.outcome),
                    unsettled,
                })
            }
        }
    }

    async fn drain<S: BatchSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> std::result::Result<(), String> {
        sink.send_batch().await?;
        while let Some(receipt) = self.pending.pop_front() {
            match receipt.await {
                Ok(()) => self.outcome.delivered += 1,
                Err(e) => {
                    tracing::debug!("Async send to {} failed: {e}", self.topic);
                    self.outcome.failed += 1;
                }
            }
        }
        Ok(())
    }
}
