//! Publish/subscribe topics
//!
//! Publishing to a [`Topic`] places one shared copy of the message in the
//! mailbox of every matching subscription. Subscriptions are either
//! non-durable, existing only while a [`TopicSubscriber`] is attached, or
//! durable, keeping a backlog while detached until explicitly removed with
//! [`Topic::unsubscribe`].
//!
//! ```text
//!                      ┌──▶ Borrower1 (durable, detached)  [m1 m2 m3]
//!  publish(m3) ──▶ Topic ─▶ Borrower2 (durable, active)    [m3]      ──▶ listener
//!                      └──▶ chat-ab12 (non-durable, no-local)
//! ```
//!
//! Subscription lifecycle: `Detached → Active → Detached → Removed`.

mod destination;
mod subscriber;
mod subscription;

pub use destination::Topic;
pub use subscriber::TopicSubscriber;
pub use subscription::{SubscriptionOptions, SubscriptionStatus};

#[cfg(test)]
mod tests;
