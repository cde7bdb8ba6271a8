//! Request/reply correlation
//!
//! The [`CorrelationBroker`] sends a request to a queue and waits on a reply
//! queue for the message carrying the request's correlation token. Concurrent
//! requests sharing one reply queue each receive only their own reply.

mod broker;

pub use broker::{CorrelationBroker, PendingRequest};

use serde::Deserialize;

/// How correlation tokens are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrategy {
    /// The token becomes the request's message id; replies echo it back
    #[default]
    MessageId,
    /// Monotonic per-broker counter
    Counter,
    /// Random UUID v4
    Random,
}
