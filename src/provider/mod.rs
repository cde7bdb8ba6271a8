//! Provider context
//!
//! A [`Provider`] owns everything one messaging provider instance needs: its
//! configuration, the destination registry, the delivery dispatcher, the
//! correlation broker, notifications and the optional message store. There
//! are no process globals; create one with [`Provider::new`] inside a tokio
//! runtime and tear it down with [`Provider::shutdown`].
//!
//! ```rust,no_run
//! use courier::core::config::ProviderConfig;
//! use courier::message::{Message, Selector};
//! use courier::provider::Provider;
//! use std::time::Duration;
//!
//! # async fn run() -> courier::provider::error::ProviderResult<()> {
//! let provider = Provider::new(ProviderConfig::default())?;
//! let queue = provider.queue("LoanRequestQ")?;
//!
//! let producer = provider.create_producer();
//! producer.send(&queue, Message::text("hello"))?;
//!
//! let received = queue.receive(&Selector::All, Duration::from_secs(1)).await?;
//! assert!(received.is_some());
//!
//! provider.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod context;
pub mod error;
mod metadata;
mod producer;

pub use context::Provider;
pub use metadata::{ProviderMetadata, SUPPORTED_PROPERTIES};
pub use producer::MessageProducer;

#[cfg(test)]
mod tests;
