//! Topic consumer binding

use crate::delivery::binding::Binding;
use crate::delivery::dispatcher::ListenerHandle;
use crate::delivery::mailbox::Mailbox;
use crate::delivery::{Deadline, Dispatcher, MessageListener};
use crate::message::{Message, Selector};
use crate::provider::error::ProviderResult;
use crate::store::durable_key;
use crate::topic::Topic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Attached subscriber of a topic
///
/// Closing or dropping the subscriber detaches it: a non-durable
/// subscription disappears with it, a durable one keeps collecting messages
/// until the same subscriber id attaches again.
#[derive(Debug)]
pub struct TopicSubscriber {
    topic: Arc<Topic>,
    subscriber_id: String,
    durable: bool,
    binding: Binding,
    detached: AtomicBool,
}

impl TopicSubscriber {
    pub(crate) fn new(
        topic: Arc<Topic>,
        subscriber_id: String,
        durable: bool,
        mailbox: Arc<Mailbox>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let binding = Binding::new(
            durable_key(topic.name(), &subscriber_id),
            mailbox,
            Selector::All,
            dispatcher,
        );
        Self {
            topic,
            subscriber_id,
            durable,
            binding,
            detached: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> &Arc<Topic> {
        &self.topic
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub async fn receive(
        &self,
        deadline: impl Into<Deadline>,
    ) -> ProviderResult<Option<Arc<Message>>> {
        self.binding.receive(deadline.into()).await
    }

    pub async fn set_listener<L>(&self, listener: L) -> ProviderResult<()>
    where
        L: MessageListener + 'static,
    {
        self.binding.set_listener(Arc::new(listener)).await
    }

    pub async fn set_shared_listener(
        &self,
        listener: Arc<dyn MessageListener>,
    ) -> ProviderResult<()> {
        self.binding.set_listener(listener).await
    }

    pub async fn clear_listener(&self) -> ProviderResult<bool> {
        self.binding.clear_listener().await
    }

    pub fn has_listener(&self) -> bool {
        self.binding.has_listener()
    }

    /// Stop the listener, then detach from the topic
    pub async fn close(self) -> ProviderResult<()> {
        self.binding.clear_listener().await?;
        self.detach(None)
    }

    fn detach(&self, stopping_listener: Option<ListenerHandle>) -> ProviderResult<()> {
        if self.detached.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.topic.detach(&self.subscriber_id, stopping_listener)
    }
}

impl Drop for TopicSubscriber {
    fn drop(&mut self) {
        let stopping_listener = self.binding.take_listener();
        if let Err(e) = self.detach(stopping_listener) {
            log::error!(
                "Failed to detach '{}' from topic '{}': {}",
                self.subscriber_id,
                self.topic.name(),
                e
            );
        }
    }
}
