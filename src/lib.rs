//! In-process messaging provider
//!
//! `courier` provides point-to-point queues and publish/subscribe topics for
//! code running inside one tokio runtime: competing consumers, selector
//! receive with deadlines, queue browsing, durable subscriptions,
//! request/reply correlation and listener dispatch.
//!
//! Start with [`provider::Provider`].

pub mod core;
pub mod correlation;
pub mod delivery;
pub mod message;
pub mod notifications;
pub mod provider;
pub mod queue;
pub mod registry;
pub mod store;
pub mod topic;

pub use provider::error::{ProviderError, ProviderResult};
pub use provider::{MessageProducer, Provider};
