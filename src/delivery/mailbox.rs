//! Ordered per-destination delivery queue
//!
//! Every queue and every topic subscription owns one mailbox. Explicit
//! receives and listener dispatch tasks both take messages from it, so the
//! exactly-once removal rule lives in one place: a message leaves the
//! mailbox under its lock and is handed to exactly one taker.

use crate::core::sync::lock_mutex;
use crate::delivery::Deadline;
use crate::message::{Message, Selector};
use crate::provider::error::ProviderResult;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio::time::timeout_at;

#[derive(Debug)]
pub(crate) struct Mailbox {
    name: String,
    messages: Mutex<VecDeque<Arc<Message>>>,
    arrivals: Notify,
    closed: AtomicBool,
}

impl Mailbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(VecDeque::new()),
            arrivals: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn messages(&self) -> ProviderResult<MutexGuard<'_, VecDeque<Arc<Message>>>> {
        lock_mutex(self.messages.lock(), "mailbox")
    }

    pub fn push(&self, message: Arc<Message>) -> ProviderResult<()> {
        self.push_bounded(message, None).map(|_| ())
    }

    /// Append, evicting the oldest message when `bound` would be exceeded
    pub fn push_bounded(
        &self,
        message: Arc<Message>,
        bound: Option<usize>,
    ) -> ProviderResult<Option<Arc<Message>>> {
        let evicted = {
            let mut messages = self.messages()?;
            messages.push_back(message);
            match bound {
                Some(bound) if messages.len() > bound => messages.pop_front(),
                _ => None,
            }
        };
        if let Some(oldest) = &evicted {
            log::debug!("Mailbox '{}' full, evicted {}", self.name, oldest.id());
        }
        self.arrivals.notify_waiters();
        Ok(evicted)
    }

    /// Put a message back at the head, ahead of everything queued
    pub fn push_front(&self, message: Arc<Message>) -> ProviderResult<()> {
        self.messages()?.push_front(message);
        self.arrivals.notify_waiters();
        Ok(())
    }

    /// Remove the first message the selector accepts, without waiting
    pub fn try_take(&self, selector: &Selector) -> ProviderResult<Option<Arc<Message>>> {
        let mut messages = self.messages()?;
        let position = messages.iter().position(|m| selector.matches(m));
        Ok(position.and_then(|i| messages.remove(i)))
    }

    /// Wait for a matching message until the deadline passes
    ///
    /// Cancel safe: a message is only removed in the same step that returns
    /// it. A closed mailbox still hands out what it holds, then `None`.
    pub async fn take(
        &self,
        selector: &Selector,
        deadline: Deadline,
    ) -> ProviderResult<Option<Arc<Message>>> {
        loop {
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            // Register before looking so a push between the check and the await is not missed
            notified.as_mut().enable();

            if let Some(message) = self.try_take(selector)? {
                return Ok(Some(message));
            }
            if self.is_closed() {
                return Ok(None);
            }

            match deadline {
                Deadline::Never => notified.await,
                Deadline::At(at) => {
                    if timeout_at(at, notified).await.is_err() {
                        return self.try_take(selector);
                    }
                }
            }
        }
    }

    /// Messages currently held, oldest first, without removing them
    pub fn snapshot(&self) -> ProviderResult<Vec<Arc<Message>>> {
        Ok(self.messages()?.iter().cloned().collect())
    }

    pub fn len(&self) -> ProviderResult<usize> {
        Ok(self.messages()?.len())
    }

    pub fn drain_all(&self) -> ProviderResult<Vec<Arc<Message>>> {
        Ok(self.messages()?.drain(..).collect())
    }

    pub fn close(&self) {
        log::trace!("Closing mailbox '{}'", self.name);
        self.closed.store(true, Ordering::Release);
        self.arrivals.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
