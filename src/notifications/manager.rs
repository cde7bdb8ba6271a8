//! NotificationManager implementation

use crate::notifications::error::NotificationError;
use crate::notifications::event::{EventFilter, ProviderEvent};
use crate::notifications::statistics::SubscriberStatistics;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

struct SubscriberInfo {
    filter: EventFilter,
    source: String,
    sender: UnboundedSender<ProviderEvent>,
    statistics: SubscriberStatistics,
}

/// Fans provider events out to filtered subscribers
///
/// Publishing never blocks: each subscriber owns an unbounded channel, and
/// subscribers whose receiver was dropped are removed on the next publish.
#[derive(Default)]
pub struct NotificationManager {
    subscribers: HashMap<String, SubscriberInfo>,
}

impl fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.subscribers.keys().collect();
        ids.sort();
        f.debug_struct("NotificationManager")
            .field("subscribers", &ids)
            .finish()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        subscriber_id: String,
        filter: EventFilter,
        source: String,
    ) -> UnboundedReceiver<ProviderEvent> {
        let (sender, receiver) = unbounded_channel();

        let subscriber_info = SubscriberInfo {
            filter,
            source: source.clone(),
            sender,
            statistics: SubscriberStatistics::new(),
        };

        if let Some(existing) = self
            .subscribers
            .insert(subscriber_id.clone(), subscriber_info)
        {
            log::warn!(
                "Subscriber '{}' replaced existing subscription (source: {} -> {})",
                subscriber_id,
                existing.source,
                source
            );
        }

        receiver
    }

    pub fn unsubscribe(&mut self, subscriber_id: &str) -> bool {
        self.subscribers.remove(subscriber_id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscriber(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains_key(subscriber_id)
    }

    pub fn subscriber_statistics(&self, subscriber_id: &str) -> Option<&SubscriberStatistics> {
        self.subscribers
            .get(subscriber_id)
            .map(|info| &info.statistics)
    }

    pub fn publish(&mut self, event: ProviderEvent) -> Result<(), NotificationError> {
        let mut failed_subscribers = Vec::new();

        for (subscriber_id, subscriber_info) in &self.subscribers {
            if !subscriber_info.filter.accepts(&event) {
                subscriber_info.statistics.record_event_dropped();
                continue;
            }

            if subscriber_info.sender.send(event.clone()).is_err() {
                failed_subscribers.push(subscriber_id.clone());
            } else {
                subscriber_info.statistics.record_event_sent();
            }
        }

        for subscriber_id in &failed_subscribers {
            self.subscribers.remove(subscriber_id);
        }

        if !failed_subscribers.is_empty() {
            return Err(NotificationError::PublishFailed {
                event_type: event.category().to_string(),
                failed_subscribers,
            });
        }

        Ok(())
    }
}
