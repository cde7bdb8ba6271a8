//! Topic subscriptions

use crate::delivery::dispatcher::ListenerHandle;
use crate::delivery::mailbox::Mailbox;
use crate::message::{Message, Selector};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// A subscriber is attached and consuming
    Active,
    /// Durable subscription with no subscriber attached; its backlog grows
    Detached,
}

/// Parameters for [`Topic::subscribe_with`](crate::topic::Topic::subscribe_with)
#[derive(Debug, Clone)]
pub struct SubscriptionOptions {
    pub subscriber_id: String,
    pub durable: bool,
    pub selector: Selector,
    /// Producer whose own publications this subscription never receives
    pub no_local: Option<String>,
}

impl SubscriptionOptions {
    pub fn new(subscriber_id: impl Into<String>) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            durable: false,
            selector: Selector::All,
            no_local: None,
        }
    }

    pub fn durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn no_local(mut self, producer_id: impl Into<String>) -> Self {
        self.no_local = Some(producer_id.into());
        self
    }
}

#[derive(Debug)]
pub(crate) struct Subscription {
    pub durable: bool,
    pub selector: Selector,
    pub no_local: Option<String>,
    pub mailbox: Arc<Mailbox>,
    pub active: bool,
    /// Listener of a dropped subscriber that may still be inside a delivery
    pub stopping_listener: Option<ListenerHandle>,
}

impl Subscription {
    pub fn new(options: &SubscriptionOptions, mailbox_name: String) -> Self {
        Self {
            durable: options.durable,
            selector: options.selector.clone(),
            no_local: options.no_local.clone(),
            mailbox: Arc::new(Mailbox::new(mailbox_name)),
            active: true,
            stopping_listener: None,
        }
    }

    /// Detached durable subscription rebuilt from a stored backlog
    pub fn restored(mailbox_name: String) -> Self {
        Self {
            durable: true,
            selector: Selector::All,
            no_local: None,
            mailbox: Arc::new(Mailbox::new(mailbox_name)),
            active: false,
            stopping_listener: None,
        }
    }

    pub fn status(&self) -> SubscriptionStatus {
        if self.active {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Detached
        }
    }

    /// A previous subscriber's listener is still running on the mailbox
    pub fn listener_draining(&self) -> bool {
        self.stopping_listener
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Whether a published message belongs in this subscription
    pub fn wants(&self, message: &Message) -> bool {
        if !(self.active || self.durable) {
            return false;
        }
        if let (Some(own), Some(producer)) = (&self.no_local, message.producer_id()) {
            if own == producer {
                return false;
            }
        }
        self.selector.matches(message)
    }
}
