//! Topic destination

use crate::core::sync::lock_mutex;
use crate::delivery::dispatcher::ListenerHandle;
use crate::delivery::Dispatcher;
use crate::message::{Message, Selector};
use crate::notifications::api::{
    DestinationEvent, DestinationEventType, ProviderEvent, SubscriptionEvent,
    SubscriptionEventType,
};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::store::durable_key;
use crate::topic::subscription::Subscription;
use crate::topic::{SubscriptionOptions, SubscriptionStatus, TopicSubscriber};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub struct Topic {
    name: String,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    dispatcher: Arc<Dispatcher>,
    max_durable_backlog: Option<usize>,
}

impl Topic {
    pub(crate) fn new(
        name: impl Into<String>,
        dispatcher: Arc<Dispatcher>,
        max_durable_backlog: Option<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            subscriptions: Mutex::new(HashMap::new()),
            dispatcher,
            max_durable_backlog,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn subscriptions(&self) -> ProviderResult<MutexGuard<'_, HashMap<String, Subscription>>> {
        lock_mutex(self.subscriptions.lock(), "topic subscriptions")
    }

    /// Deliver one shared copy to every matching subscription
    ///
    /// Returns the number of subscriptions that received the message. Never
    /// waits for subscribers; a full detached durable backlog drops its
    /// oldest message instead.
    pub fn publish(&self, message: Message) -> ProviderResult<usize> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }

        let shared = Arc::new(message);
        let mut evicted = Vec::new();
        let mut delivered = 0;
        {
            let subscriptions = self.subscriptions()?;
            for (subscriber_id, subscription) in subscriptions.iter() {
                if !subscription.wants(&shared) {
                    continue;
                }
                let bound = if subscription.active {
                    None
                } else {
                    self.max_durable_backlog
                };
                if let Some(dropped) = subscription
                    .mailbox
                    .push_bounded(Arc::clone(&shared), bound)?
                {
                    evicted.push((subscriber_id.clone(), dropped));
                }
                delivered += 1;
            }
        }

        log::trace!(
            "Topic '{}' <- {} ({} subscription(s))",
            self.name,
            shared.id(),
            delivered
        );
        for (subscriber_id, dropped) in evicted {
            log::warn!(
                "Durable backlog of '{}' on topic '{}' is full; dropped {}",
                subscriber_id,
                self.name,
                dropped.id()
            );
            self.dispatcher
                .notify(ProviderEvent::Destination(DestinationEvent::for_subscription(
                    DestinationEventType::BacklogEvicted,
                    self.name.clone(),
                    subscriber_id,
                    1,
                )));
        }
        Ok(delivered)
    }

    pub fn subscribe(
        self: &Arc<Self>,
        subscriber_id: impl Into<String>,
        durable: bool,
        selector: Selector,
    ) -> ProviderResult<TopicSubscriber> {
        self.subscribe_with(
            SubscriptionOptions::new(subscriber_id)
                .durable(durable)
                .selector(selector),
        )
    }

    /// Create a subscription, or reattach a detached durable one
    ///
    /// A reattached durable subscription keeps its backlog; the new selector
    /// and no-local setting apply to messages published from now on. Reattach
    /// fails with `DuplicateSubscription` until the listener task of a dropped
    /// subscriber has exited; [`TopicSubscriber::close`] waits for it.
    pub fn subscribe_with(
        self: &Arc<Self>,
        options: SubscriptionOptions,
    ) -> ProviderResult<TopicSubscriber> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }

        let (mailbox, reattached) = {
            let mut subscriptions = self.subscriptions()?;
            match subscriptions.get_mut(&options.subscriber_id) {
                Some(existing)
                    if existing.active || !options.durable || existing.listener_draining() =>
                {
                    return Err(ProviderError::DuplicateSubscription {
                        topic: self.name.clone(),
                        subscriber_id: options.subscriber_id,
                    });
                }
                Some(existing) => {
                    existing.active = true;
                    existing.stopping_listener = None;
                    existing.selector = options.selector.clone();
                    existing.no_local = options.no_local.clone();
                    (Arc::clone(&existing.mailbox), true)
                }
                None => {
                    let subscription = Subscription::new(
                        &options,
                        durable_key(&self.name, &options.subscriber_id),
                    );
                    let mailbox = Arc::clone(&subscription.mailbox);
                    subscriptions.insert(options.subscriber_id.clone(), subscription);
                    (mailbox, false)
                }
            }
        };

        log::debug!(
            "{} {} subscription '{}' on topic '{}'",
            if reattached { "Reattached" } else { "Created" },
            if options.durable { "durable" } else { "non-durable" },
            options.subscriber_id,
            self.name
        );
        self.dispatcher
            .notify(ProviderEvent::Subscription(SubscriptionEvent::new(
                SubscriptionEventType::Attached,
                self.name.clone(),
                options.subscriber_id.clone(),
                options.durable,
            )));

        Ok(TopicSubscriber::new(
            Arc::clone(self),
            options.subscriber_id,
            options.durable,
            mailbox,
            Arc::clone(&self.dispatcher),
        ))
    }

    /// Remove a detached durable subscription and discard its backlog
    pub fn unsubscribe(&self, subscriber_id: &str) -> ProviderResult<()> {
        let removed = {
            let mut subscriptions = self.subscriptions()?;
            match subscriptions.get(subscriber_id) {
                None => {
                    return Err(ProviderError::SubscriptionNotFound {
                        topic: self.name.clone(),
                        subscriber_id: subscriber_id.to_string(),
                    })
                }
                Some(subscription) if subscription.active => {
                    return Err(ProviderError::SubscriptionActive {
                        topic: self.name.clone(),
                        subscriber_id: subscriber_id.to_string(),
                    })
                }
                Some(_) => subscriptions.remove(subscriber_id),
            }
        };

        if let Some(subscription) = removed {
            subscription.mailbox.close();
            let discarded = subscription.mailbox.drain_all()?.len();
            log::debug!(
                "Removed durable subscription '{}' on topic '{}', discarded {} message(s)",
                subscriber_id,
                self.name,
                discarded
            );
            self.notify_subscription(SubscriptionEventType::Removed, subscriber_id, true);
        }
        Ok(())
    }

    /// Called when a subscriber closes or is dropped
    ///
    /// `stopping_listener` is the listener of a dropped subscriber; a durable
    /// subscription keeps it until the task exits.
    pub(crate) fn detach(
        &self,
        subscriber_id: &str,
        stopping_listener: Option<ListenerHandle>,
    ) -> ProviderResult<()> {
        let outcome = {
            let mut subscriptions = self.subscriptions()?;
            match subscriptions.get_mut(subscriber_id) {
                Some(subscription) if subscription.active && subscription.durable => {
                    subscription.active = false;
                    subscription.stopping_listener = stopping_listener;
                    Some(SubscriptionEventType::Detached)
                }
                Some(subscription) if subscription.active => {
                    subscription.mailbox.close();
                    subscriptions.remove(subscriber_id);
                    Some(SubscriptionEventType::Removed)
                }
                _ => None,
            }
        };

        if let Some(event_type) = outcome {
            let durable = event_type == SubscriptionEventType::Detached;
            log::debug!(
                "Subscriber '{}' left topic '{}' ({:?})",
                subscriber_id,
                self.name,
                event_type
            );
            self.notify_subscription(event_type, subscriber_id, durable);
        }
        Ok(())
    }

    fn notify_subscription(
        &self,
        event_type: SubscriptionEventType,
        subscriber_id: &str,
        durable: bool,
    ) {
        self.dispatcher
            .notify(ProviderEvent::Subscription(SubscriptionEvent::new(
                event_type,
                self.name.clone(),
                subscriber_id.to_string(),
                durable,
            )));
    }

    /// Current state of a subscription; `None` once removed or never created
    pub fn subscription_status(
        &self,
        subscriber_id: &str,
    ) -> ProviderResult<Option<SubscriptionStatus>> {
        Ok(self
            .subscriptions()?
            .get(subscriber_id)
            .map(Subscription::status))
    }

    /// Messages waiting in a subscription's mailbox
    pub fn backlog_len(&self, subscriber_id: &str) -> ProviderResult<Option<usize>> {
        let subscriptions = self.subscriptions()?;
        match subscriptions.get(subscriber_id) {
            Some(subscription) => Ok(Some(subscription.mailbox.len()?)),
            None => Ok(None),
        }
    }

    pub fn subscriber_ids(&self) -> ProviderResult<Vec<String>> {
        let mut ids: Vec<String> = self.subscriptions()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions().map(|s| s.len()).unwrap_or(0)
    }

    /// Recreate a detached durable subscription from persisted messages
    pub(crate) fn restore_durable(
        &self,
        subscriber_id: &str,
        backlog: Vec<Message>,
    ) -> ProviderResult<usize> {
        let mut subscriptions = self.subscriptions()?;
        let subscription = subscriptions
            .entry(subscriber_id.to_string())
            .or_insert_with(|| Subscription::restored(durable_key(&self.name, subscriber_id)));

        let count = backlog.len();
        for message in backlog {
            subscription.mailbox.push(Arc::new(message))?;
        }
        Ok(count)
    }

    /// Remove and return the remaining messages of every durable subscription
    pub(crate) fn drain_durable_backlogs(
        &self,
    ) -> ProviderResult<Vec<(String, Vec<Arc<Message>>)>> {
        let subscriptions = self.subscriptions()?;
        let mut backlogs = Vec::new();
        for (subscriber_id, subscription) in subscriptions.iter() {
            if subscription.durable {
                backlogs.push((subscriber_id.clone(), subscription.mailbox.drain_all()?));
            }
        }
        backlogs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(backlogs)
    }

    pub(crate) fn close(&self) {
        if let Ok(subscriptions) = self.subscriptions() {
            for subscription in subscriptions.values() {
                subscription.mailbox.close();
            }
        }
    }
}
