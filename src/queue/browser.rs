//! Non-destructive queue browsing

use crate::message::Message;
use std::sync::Arc;

/// Point-in-time view of a queue
///
/// The snapshot is taken when the browser is created; messages sent or
/// consumed afterwards do not change it. [`QueueBrowser::iter`] can be called
/// any number of times and always starts from the oldest message.
#[derive(Debug, Clone)]
pub struct QueueBrowser {
    queue: String,
    messages: Vec<Arc<Message>>,
}

impl QueueBrowser {
    pub(crate) fn new(queue: String, messages: Vec<Arc<Message>>) -> Self {
        Self { queue, messages }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Message>> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a QueueBrowser {
    type Item = &'a Arc<Message>;
    type IntoIter = std::slice::Iter<'a, Arc<Message>>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
