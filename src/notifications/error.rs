//! Error types for the notification system

use std::fmt;

#[derive(Debug, Clone)]
pub enum NotificationError {
    /// Subscribers whose receivers were dropped; they have been unsubscribed
    PublishFailed {
        event_type: String,
        failed_subscribers: Vec<String>,
    },
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::PublishFailed {
                event_type,
                failed_subscribers,
            } => {
                write!(
                    f,
                    "Failed to publish {} event to {} subscribers: {:?}",
                    event_type,
                    failed_subscribers.len(),
                    failed_subscribers
                )
            }
        }
    }
}

impl std::error::Error for NotificationError {}
