//! Message listeners

use crate::message::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Failure reported by a listener for one message
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Asynchronous message callback
///
/// A listener is invoked for one message at a time, in mailbox order. An
/// `Err` or a panic is reported through the provider's notifications and
/// never stops dispatch.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message(&self, message: Arc<Message>) -> Result<(), ListenerError>;
}

#[async_trait]
impl<F> MessageListener for F
where
    F: Fn(Arc<Message>) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    async fn on_message(&self, message: Arc<Message>) -> Result<(), ListenerError> {
        (self)(message)
    }
}
