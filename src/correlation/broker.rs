//! Correlation broker

use crate::core::sync::lock_mutex;
use crate::correlation::CorrelationStrategy;
use crate::delivery::Deadline;
use crate::message::{Message, MessageId, Selector};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::queue::Queue;
use crate::registry::DestinationRef;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// An outstanding request waiting for its reply
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub correlation_id: String,
    pub deadline: Deadline,
    pub sent_at: SystemTime,
}

#[derive(Debug)]
pub struct CorrelationBroker {
    strategy: CorrelationStrategy,
    default_timeout: Duration,
    counter: AtomicU64,
    pending: Mutex<HashMap<String, PendingRequest>>,
}

/// Drops the pending entry on reply, timeout or cancellation
struct PendingGuard<'a> {
    pending: &'a Mutex<HashMap<String, PendingRequest>>,
    token: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&self.token);
        }
    }
}

impl CorrelationBroker {
    pub fn new(strategy: CorrelationStrategy, default_timeout: Duration) -> Self {
        Self {
            strategy,
            default_timeout,
            counter: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn strategy(&self) -> CorrelationStrategy {
        self.strategy
    }

    /// Deadline for a request started now, from the configured reply timeout
    pub fn default_deadline(&self) -> Deadline {
        Deadline::after(self.default_timeout)
    }

    fn next_token(&self) -> String {
        match self.strategy {
            CorrelationStrategy::MessageId => MessageId::new().to_string(),
            CorrelationStrategy::Counter => {
                format!("corr-{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1)
            }
            CorrelationStrategy::Random => uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Reserve a token no outstanding request is using
    fn register(&self, deadline: Deadline) -> ProviderResult<PendingGuard<'_>> {
        let mut pending = lock_mutex(self.pending.lock(), "pending requests")?;
        let token = loop {
            let token = self.next_token();
            if !pending.contains_key(&token) {
                break token;
            }
        };
        pending.insert(
            token.clone(),
            PendingRequest {
                correlation_id: token.clone(),
                deadline,
                sent_at: SystemTime::now(),
            },
        );
        Ok(PendingGuard {
            pending: &self.pending,
            token,
        })
    }

    /// Track a request under the correlation id its builder chose
    fn rekey(&self, guard: &mut PendingGuard<'_>, correlation_id: &str) -> ProviderResult<()> {
        let mut pending = lock_mutex(self.pending.lock(), "pending requests")?;
        if pending.contains_key(correlation_id) {
            return Err(ProviderError::CorrelationInUse {
                correlation_id: correlation_id.to_string(),
            });
        }
        if let Some(mut entry) = pending.remove(&guard.token) {
            entry.correlation_id = correlation_id.to_string();
            pending.insert(correlation_id.to_string(), entry);
        }
        guard.token = correlation_id.to_string();
        Ok(())
    }

    /// Send a request and wait for the reply carrying its correlation token
    ///
    /// `build` receives the token and returns the request. The broker sets
    /// the request's correlation id and reply-to queue when `build` left them
    /// unset. A correlation id supplied by `build` must not belong to another
    /// outstanding request (`CorrelationInUse`). Returns `Ok(None)` when no
    /// reply arrives before `deadline`.
    pub async fn request_reply<F>(
        &self,
        request_queue: &Queue,
        reply_queue: &Queue,
        build: F,
        deadline: impl Into<Deadline>,
    ) -> ProviderResult<Option<Arc<Message>>>
    where
        F: FnOnce(&str) -> Message,
    {
        let deadline = deadline.into();
        let mut guard = self.register(deadline)?;
        let token = guard.token.clone();

        let mut request = build(&token);
        if self.strategy == CorrelationStrategy::MessageId {
            request.assign_id(MessageId::from_token(&token));
        }
        request.set_correlation_if_absent(&token);
        request.set_reply_to_if_absent(DestinationRef::queue(reply_queue.name()));
        let correlation_id = request.correlation_id().unwrap_or(token.as_str()).to_string();
        if correlation_id != token {
            self.rekey(&mut guard, &correlation_id)?;
        }
        let selector = Selector::correlation_id(correlation_id.as_str());

        log::debug!(
            "Request {} -> '{}', awaiting reply on '{}'",
            correlation_id,
            request_queue.name(),
            reply_queue.name()
        );
        request_queue.send(request)?;

        let reply = reply_queue.receive(&selector, deadline).await?;
        if reply.is_none() {
            log::debug!("Request {} timed out waiting for a reply", correlation_id);
        }
        drop(guard);
        Ok(reply)
    }

    /// Snapshot of requests still waiting for replies
    pub fn outstanding(&self) -> Vec<PendingRequest> {
        self.pending
            .lock()
            .map(|pending| pending.values().cloned().collect())
            .unwrap_or_default()
    }
}
