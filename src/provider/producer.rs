//! Message producers

use crate::message::{Message, MessageId};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::provider::Provider;
use crate::queue::Queue;
use crate::registry::{DestinationKind, DestinationRef};
use crate::topic::Topic;
use std::sync::{Arc, Weak};

/// Sends messages on behalf of one producer identity
///
/// Every message sent through a producer carries its id, which no-local
/// subscriptions use to skip their own publications. A producer does not
/// keep its provider alive.
#[derive(Debug, Clone)]
pub struct MessageProducer {
    provider: Weak<Provider>,
    producer_id: String,
}

impl MessageProducer {
    pub(crate) fn new(provider: Weak<Provider>, producer_id: String) -> Self {
        Self {
            provider,
            producer_id,
        }
    }

    pub fn id(&self) -> &str {
        &self.producer_id
    }

    fn provider(&self) -> ProviderResult<Arc<Provider>> {
        self.provider.upgrade().ok_or(ProviderError::ProviderClosed)
    }

    fn stamp(&self, mut message: Message) -> Message {
        message.stamp_producer(&self.producer_id);
        message
    }

    pub fn send(&self, queue: &Queue, message: Message) -> ProviderResult<MessageId> {
        queue.send(self.stamp(message))
    }

    /// Publish to a topic; returns the number of subscriptions reached
    pub fn publish(&self, topic: &Topic, message: Message) -> ProviderResult<usize> {
        topic.publish(self.stamp(message))
    }

    /// Send to a destination named by reference, resolving it through the provider
    pub fn send_to(&self, destination: &DestinationRef, message: Message) -> ProviderResult<()> {
        let provider = self.provider()?;
        match destination.kind() {
            DestinationKind::Queue => {
                let queue = provider.queue(destination.name())?;
                self.send(&queue, message)?;
            }
            DestinationKind::Topic => {
                let topic = provider.topic(destination.name())?;
                self.publish(&topic, message)?;
            }
        }
        Ok(())
    }

    /// Send `reply` to the request's reply-to destination
    ///
    /// The reply is correlated to the request unless it already carries a
    /// correlation id.
    pub fn reply(&self, request: &Message, mut reply: Message) -> ProviderResult<()> {
        let reply_to = request
            .reply_to()
            .ok_or_else(|| ProviderError::MissingReplyTo {
                message_id: request.id().to_string(),
            })?;
        let correlation_id = request
            .correlation_id()
            .unwrap_or_else(|| request.id().as_str());
        reply.set_correlation_if_absent(correlation_id);

        log::trace!("Replying to {} via {}", request.id(), reply_to);
        self.send_to(reply_to, reply)
    }
}
