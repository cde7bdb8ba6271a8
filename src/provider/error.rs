//! Provider Error Types

use crate::core::config::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::registry::DestinationKind;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Destination not found: {name}")]
    NameNotFound { name: String },

    #[error("Destination '{name}' is not a {expected}")]
    DestinationKindMismatch {
        name: String,
        expected: DestinationKind,
    },

    #[error("Subscription '{subscriber_id}' on topic '{topic}' is already active")]
    DuplicateSubscription { topic: String, subscriber_id: String },

    #[error("Subscription '{subscriber_id}' on topic '{topic}' is still active")]
    SubscriptionActive { topic: String, subscriber_id: String },

    #[error("Subscription '{subscriber_id}' not found on topic '{topic}'")]
    SubscriptionNotFound { topic: String, subscriber_id: String },

    #[error("Invalid consumer state: {message}")]
    InvalidConsumerState { message: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Correlation id '{correlation_id}' belongs to an outstanding request")]
    CorrelationInUse { correlation_id: String },

    #[error("Message {message_id} has no reply-to destination")]
    MissingReplyTo { message_id: String },

    #[error("Provider is closed")]
    ProviderClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Internal provider error: {message}")]
    Internal { message: String },
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ContextualError for ProviderError {
    fn is_user_actionable(&self) -> bool {
        !matches!(
            self,
            ProviderError::Store(_) | ProviderError::Internal { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}
