//! Queue consumer binding

use crate::delivery::binding::Binding;
use crate::delivery::mailbox::Mailbox;
use crate::delivery::{Deadline, Dispatcher, MessageListener};
use crate::message::{Message, Selector};
use crate::provider::error::ProviderResult;
use crate::queue::Queue;
use std::sync::Arc;

/// Consumer handle competing with every other consumer of its queue
///
/// A receiver either receives explicitly or has a listener, never both at
/// once. Dropping the receiver stops its listener.
///
/// ```rust,no_run
/// # use courier::delivery::{Deadline, ListenerError};
/// # use courier::message::{Message, Selector};
/// # use courier::queue::Queue;
/// # use std::sync::Arc;
/// # async fn example(queue: Arc<Queue>) -> Result<(), Box<dyn std::error::Error>> {
/// let receiver = queue.create_receiver(Selector::All)?;
/// receiver
///     .set_listener(|message: Arc<Message>| -> Result<(), ListenerError> {
///         println!("Loan request {}", message.id());
///         Ok(())
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueueReceiver {
    queue: Arc<Queue>,
    binding: Binding,
}

impl QueueReceiver {
    pub(crate) fn new(
        queue: Arc<Queue>,
        mailbox: Arc<Mailbox>,
        selector: Selector,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let binding = Binding::new(queue.name().to_string(), mailbox, selector, dispatcher);
        Self { queue, binding }
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub fn selector(&self) -> &Selector {
        self.binding.selector()
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

    /// Install a listener that is shared with other bindings
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

    /// Stop the listener and wait for it to finish its current message
    pub async fn close(self) -> ProviderResult<()> {
        self.binding.clear_listener().await.map(|_| ())
    }
}

impl Drop for QueueReceiver {
    fn drop(&mut self) {
        self.binding.signal_stop();
        self.queue.release_consumer();
    }
}
