//! Delivery engine
//!
//! Mailboxes hold the messages of a queue or topic subscription, bindings
//! decide whether a consumer receives explicitly or through a listener, and
//! the [`Dispatcher`] runs listener tasks and reports their failures.

pub(crate) mod binding;
mod deadline;
pub(crate) mod dispatcher;
mod listener;
pub(crate) mod mailbox;

pub use deadline::Deadline;
pub use dispatcher::{Dispatcher, RedeliveryPolicy};
pub use listener::{ListenerError, MessageListener};

#[cfg(test)]
pub(crate) mod testing;
