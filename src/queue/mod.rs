//! Point-to-point queues
//!
//! A [`Queue`] is an ordered mailbox with competing consumers: every message
//! sent to it is removed by exactly one consumer, either an explicit
//! [`Queue::receive`] / [`QueueReceiver::receive`] or a message listener
//! installed on a [`QueueReceiver`].
//!
//! ```text
//!  MessageProducer ──send──▶ ┌───┬───┬───┬───┐ ──take──▶ QueueReceiver (listener)
//!                            │ 1 │ 2 │ 3 │...│ ──take──▶ QueueReceiver (receive)
//!  MessageProducer ──send──▶ └───┴───┴───┴───┘ ──peek──▶ QueueBrowser
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use courier::core::config::ProviderConfig;
//! use courier::delivery::Deadline;
//! use courier::message::{Message, Selector};
//! use courier::provider::Provider;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::new(ProviderConfig::default())?;
//! let queue = provider.queue("LoanRequestQ")?;
//!
//! queue.send(Message::text("hello"))?;
//!
//! let receiver = queue.create_receiver(Selector::All)?;
//! if let Some(message) = receiver.receive(Deadline::after(Duration::from_secs(1))).await? {
//!     println!("Received: {:?}", message.payload());
//! }
//! # Ok(())
//! # }
//! ```

mod browser;
mod destination;
mod receiver;

pub use browser::QueueBrowser;
pub use destination::{Queue, QueueStats};
pub use receiver::QueueReceiver;

#[cfg(test)]
mod tests;
