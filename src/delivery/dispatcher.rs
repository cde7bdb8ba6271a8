//! Listener dispatch
//!
//! Each installed listener gets its own tokio task that takes one message at
//! a time from its mailbox and awaits the listener before taking the next,
//! so invocations for one listener never overlap.

use crate::core::config::ProviderConfig;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::sync::lock_mutex;
use crate::delivery::mailbox::Mailbox;
use crate::delivery::{Deadline, MessageListener};
use crate::message::{Message, Selector};
use crate::notifications::api::{
    publish_event, DeliveryEvent, DeliveryEventType, NotificationManager, ProviderEvent,
};
use crate::provider::error::{ProviderError, ProviderResult};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What happens to a message whose listener failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeliveryPolicy {
    pub enabled: bool,
    pub max_redeliveries: u32,
}

impl Default for RedeliveryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_redeliveries: 3,
        }
    }
}

impl RedeliveryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            enabled: config.redeliver_on_listener_failure,
            max_redeliveries: config.max_redeliveries,
        }
    }
}

/// Stop signal for one listener task
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    stop_tx: watch::Sender<bool>,
}

impl ListenerHandle {
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.stop_tx.is_closed()
    }

    /// Signal the task and wait until it has finished its current message
    pub async fn stop(self) {
        self.signal_stop();
        // The task holds the only receiver
        self.stop_tx.closed().await;
    }
}

/// Delivery context shared by every destination of one provider
#[derive(Debug)]
pub struct Dispatcher {
    redelivery: RedeliveryPolicy,
    shutdown: Arc<ShutdownCoordinator>,
    notifications: Arc<Mutex<NotificationManager>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(
        redelivery: RedeliveryPolicy,
        shutdown: Arc<ShutdownCoordinator>,
        notifications: Arc<Mutex<NotificationManager>>,
    ) -> Self {
        Self {
            redelivery,
            shutdown,
            notifications,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn redelivery(&self) -> &RedeliveryPolicy {
        &self.redelivery
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    pub fn notify(&self, event: ProviderEvent) {
        publish_event(&self.notifications, event);
    }

    /// Number of listener tasks that have not finished
    pub fn active_listeners(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().filter(|t| !t.is_finished()).count())
            .unwrap_or(0)
    }

    pub(crate) fn spawn_listener(
        self: &Arc<Self>,
        consumer: String,
        mailbox: Arc<Mailbox>,
        selector: Selector,
        listener: Arc<dyn MessageListener>,
    ) -> ProviderResult<ListenerHandle> {
        if self.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let shutdown_rx = self.shutdown.subscribe();
        let dispatcher = Arc::clone(self);

        log::debug!("Starting message listener on '{}'", consumer);
        let task = tokio::spawn(async move {
            dispatcher
                .run_listener(consumer, mailbox, selector, listener, stop_rx, shutdown_rx)
                .await;
        });

        let mut tasks = lock_mutex(self.tasks.lock(), "listener tasks")?;
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);

        Ok(ListenerHandle { stop_tx })
    }

    async fn run_listener(
        &self,
        consumer: String,
        mailbox: Arc<Mailbox>,
        selector: Selector,
        listener: Arc<dyn MessageListener>,
        mut stop_rx: watch::Receiver<bool>,
        mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
    ) {
        loop {
            if self.is_closed() {
                break;
            }

            let message = tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = shutdown_rx.recv() => break,
                taken = mailbox.take(&selector, Deadline::Never) => match taken {
                    Ok(Some(message)) => message,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("Listener on '{}' stopped: {}", consumer, e);
                        break;
                    }
                },
            };

            self.deliver(&consumer, &mailbox, listener.as_ref(), message)
                .await;
        }
        log::debug!("Message listener on '{}' stopped", consumer);
    }

    async fn deliver(
        &self,
        consumer: &str,
        mailbox: &Mailbox,
        listener: &dyn MessageListener,
        message: Arc<Message>,
    ) {
        log::trace!("Delivering {} to listener on '{}'", message.id(), consumer);

        let outcome = AssertUnwindSafe(listener.on_message(Arc::clone(&message)))
            .catch_unwind()
            .await;
        let reason = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("listener panicked: {}", panic_message(panic.as_ref())),
        };

        log::warn!(
            "Listener on '{}' failed for message {} (delivery {}): {}",
            consumer,
            message.id(),
            message.delivery_count(),
            reason
        );
        self.notify(ProviderEvent::Delivery(DeliveryEvent::with_reason(
            DeliveryEventType::ListenerFailed,
            consumer.to_string(),
            message.id().to_string(),
            message.delivery_count(),
            reason,
        )));

        if !self.redelivery.enabled {
            return;
        }

        if message.delivery_count() > self.redelivery.max_redeliveries {
            log::warn!(
                "Giving up on message {} for '{}' after {} deliveries",
                message.id(),
                consumer,
                message.delivery_count()
            );
            self.notify(ProviderEvent::Delivery(DeliveryEvent::new(
                DeliveryEventType::RedeliveryExhausted,
                consumer.to_string(),
                message.id().to_string(),
                message.delivery_count(),
            )));
            return;
        }

        let again = Arc::new(message.redelivery());
        let delivery_count = again.delivery_count();
        match mailbox.push_front(again) {
            Ok(()) => self.notify(ProviderEvent::Delivery(DeliveryEvent::new(
                DeliveryEventType::Redelivered,
                consumer.to_string(),
                message.id().to_string(),
                delivery_count,
            ))),
            Err(e) => log::error!("Redelivery of {} failed: {}", message.id(), e),
        }
    }

    /// Wait for every listener task to finish, aborting those still running
    /// when `grace` runs out; returns how many were aborted
    pub async fn drain(&self, grace: Duration) -> usize {
        let tasks: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => return 0,
        };
        if tasks.is_empty() {
            return 0;
        }

        log::debug!("Waiting up to {:?} for {} listener task(s)", grace, tasks.len());
        let deadline = tokio::time::Instant::now() + grace;
        let mut aborted = 0;
        for mut task in tasks {
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                task.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            log::warn!("Aborted {} listener task(s) after shutdown grace period", aborted);
        }
        aborted
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
