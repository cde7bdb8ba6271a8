//! Queue destination

use crate::delivery::mailbox::Mailbox;
use crate::delivery::{Deadline, Dispatcher};
use crate::message::{Message, MessageId, Selector};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::queue::{QueueBrowser, QueueReceiver};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Memory usage statistics for one queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueStats {
    pub total_messages: usize,
    pub total_bytes: usize,
    /// Memory used by message headers and payloads
    pub message_data_bytes: usize,
    /// Memory used by `Arc` and mailbox slots
    pub overhead_bytes: usize,
    pub consumers: usize,
}

#[derive(Debug)]
pub struct Queue {
    name: String,
    mailbox: Arc<Mailbox>,
    dispatcher: Arc<Dispatcher>,
    consumers: AtomicUsize,
}

impl Queue {
    pub(crate) fn new(name: impl Into<String>, dispatcher: Arc<Dispatcher>) -> Self {
        let name = name.into();
        Self {
            mailbox: Arc::new(Mailbox::new(name.clone())),
            name,
            dispatcher,
            consumers: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a message to the tail of the queue
    pub fn send(&self, message: Message) -> ProviderResult<MessageId> {
        let id = message.id().clone();
        self.enqueue(Arc::new(message))?;
        Ok(id)
    }

    pub(crate) fn enqueue(&self, message: Arc<Message>) -> ProviderResult<()> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }
        log::trace!("Queue '{}' <- {}", self.name, message.id());
        self.mailbox.push(message)
    }

    /// Put previously persisted messages back, ahead of nothing else
    pub(crate) fn restore(&self, backlog: Vec<Message>) -> ProviderResult<usize> {
        let count = backlog.len();
        for message in backlog {
            self.mailbox.push(Arc::new(message))?;
        }
        Ok(count)
    }

    /// Remove the first message matching `selector`, waiting until the deadline
    pub async fn receive(
        &self,
        selector: &Selector,
        deadline: impl Into<Deadline>,
    ) -> ProviderResult<Option<Arc<Message>>> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }
        self.mailbox.take(selector, deadline.into()).await
    }

    /// Snapshot of the messages currently queued, none of them removed
    pub fn browse(&self) -> ProviderResult<QueueBrowser> {
        Ok(QueueBrowser::new(self.name.clone(), self.mailbox.snapshot()?))
    }

    /// Create a consumer binding that only takes messages matching `selector`
    pub fn create_receiver(self: &Arc<Self>, selector: Selector) -> ProviderResult<QueueReceiver> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }
        self.consumers.fetch_add(1, Ordering::Relaxed);
        Ok(QueueReceiver::new(
            Arc::clone(self),
            Arc::clone(&self.mailbox),
            selector,
            Arc::clone(&self.dispatcher),
        ))
    }

    pub(crate) fn release_consumer(&self) {
        self.consumers
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(1))
            })
            .ok();
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.mailbox.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calculate memory usage statistics for this queue
    pub fn stats(&self) -> ProviderResult<QueueStats> {
        let messages = self.mailbox.snapshot()?;
        let message_data_bytes: usize = messages.iter().map(|m| m.approximate_size()).sum();
        let overhead_bytes = messages.len() * mem::size_of::<Arc<Message>>();

        Ok(QueueStats {
            total_messages: messages.len(),
            total_bytes: message_data_bytes + overhead_bytes,
            message_data_bytes,
            overhead_bytes,
            consumers: self.consumer_count(),
        })
    }

    pub(crate) fn close(&self) {
        self.mailbox.close();
    }

    /// Remove and return everything still queued
    pub(crate) fn drain(&self) -> ProviderResult<Vec<Arc<Message>>> {
        self.mailbox.drain_all()
    }
}
