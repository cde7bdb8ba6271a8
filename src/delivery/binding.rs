//! Consumer bindings
//!
//! A binding is the part of a `QueueReceiver` or `TopicSubscriber` that owns
//! the consumption mode: explicit receives, or one listener task. The two
//! never mix on the same binding.

use crate::core::sync::lock_mutex;
use crate::delivery::dispatcher::{Dispatcher, ListenerHandle};
use crate::delivery::mailbox::Mailbox;
use crate::delivery::{Deadline, MessageListener};
use crate::message::{Message, Selector};
use crate::provider::error::{ProviderError, ProviderResult};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
enum Mode {
    Idle,
    Receiving(usize),
    Listening(ListenerHandle),
}

#[derive(Debug)]
pub(crate) struct Binding {
    consumer: String,
    mailbox: Arc<Mailbox>,
    selector: Selector,
    mode: Mutex<Mode>,
    dispatcher: Arc<Dispatcher>,
}

/// Leaves receiving mode when a receive finishes or its future is dropped
struct ReceiveGuard<'a> {
    mode: &'a Mutex<Mode>,
}

impl Drop for ReceiveGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut mode) = self.mode.lock() {
            if let Mode::Receiving(count) = *mode {
                *mode = if count > 1 {
                    Mode::Receiving(count - 1)
                } else {
                    Mode::Idle
                };
            }
        }
    }
}

impl Binding {
    pub fn new(
        consumer: impl Into<String>,
        mailbox: Arc<Mailbox>,
        selector: Selector,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            mailbox,
            selector,
            mode: Mutex::new(Mode::Idle),
            dispatcher,
        }
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub async fn receive(&self, deadline: Deadline) -> ProviderResult<Option<Arc<Message>>> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }

        {
            let mut mode = lock_mutex(self.mode.lock(), "consumer binding")?;
            *mode = match &*mode {
                Mode::Listening(_) => {
                    return Err(ProviderError::InvalidConsumerState {
                        message: format!(
                            "'{}' has a message listener; clear it before calling receive",
                            self.consumer
                        ),
                    })
                }
                Mode::Idle => Mode::Receiving(1),
                Mode::Receiving(count) => Mode::Receiving(count + 1),
            };
        }
        let _guard = ReceiveGuard { mode: &self.mode };

        log::trace!("Receive on '{}' waiting until {:?}", self.consumer, deadline);
        self.mailbox.take(&self.selector, deadline).await
    }

    /// Install a listener, stopping any listener already installed
    pub async fn set_listener(&self, listener: Arc<dyn MessageListener>) -> ProviderResult<()> {
        if self.dispatcher.is_closed() {
            return Err(ProviderError::ProviderClosed);
        }

        let previous = {
            let mut mode = lock_mutex(self.mode.lock(), "consumer binding")?;
            match std::mem::replace(&mut *mode, Mode::Idle) {
                Mode::Receiving(count) => {
                    *mode = Mode::Receiving(count);
                    return Err(self.receive_in_flight());
                }
                Mode::Listening(handle) => Some(handle),
                Mode::Idle => None,
            }
        };
        if let Some(handle) = previous {
            log::debug!("Replacing message listener on '{}'", self.consumer);
            handle.stop().await;
        }

        let mut mode = lock_mutex(self.mode.lock(), "consumer binding")?;
        if matches!(*mode, Mode::Receiving(_)) {
            return Err(self.receive_in_flight());
        }
        let handle = self.dispatcher.spawn_listener(
            self.consumer.clone(),
            Arc::clone(&self.mailbox),
            self.selector.clone(),
            listener,
        )?;
        *mode = Mode::Listening(handle);
        Ok(())
    }

    /// Stop the listener, if any; returns whether one was installed
    pub async fn clear_listener(&self) -> ProviderResult<bool> {
        let previous = {
            let mut mode = lock_mutex(self.mode.lock(), "consumer binding")?;
            match std::mem::replace(&mut *mode, Mode::Idle) {
                Mode::Listening(handle) => Some(handle),
                other => {
                    *mode = other;
                    None
                }
            }
        };

        match previous {
            Some(handle) => {
                handle.stop().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn has_listener(&self) -> bool {
        self.mode
            .lock()
            .map(|mode| matches!(*mode, Mode::Listening(_)))
            .unwrap_or(false)
    }

    /// Leave listening mode, signalling the task and handing back its handle
    /// so the caller can tell when the task has exited
    pub fn take_listener(&self) -> Option<ListenerHandle> {
        let mut mode = self.mode.lock().ok()?;
        match std::mem::replace(&mut *mode, Mode::Idle) {
            Mode::Listening(handle) => {
                handle.signal_stop();
                Some(handle)
            }
            other => {
                *mode = other;
                None
            }
        }
    }

    /// Ask the listener task to stop without waiting for it
    pub fn signal_stop(&self) {
        if let Ok(mode) = self.mode.lock() {
            if let Mode::Listening(handle) = &*mode {
                handle.signal_stop();
            }
        }
    }

    fn receive_in_flight(&self) -> ProviderError {
        ProviderError::InvalidConsumerState {
            message: format!(
                "'{}' has a receive in progress; a listener cannot be set",
                self.consumer
            ),
        }
    }
}
