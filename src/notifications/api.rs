//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules. Each [`Provider`](crate::provider::Provider) owns one
//! [`NotificationManager`]; obtain a receiver with
//! [`Provider::events`](crate::provider::Provider::events).

use std::sync::Mutex;

pub use crate::notifications::error::NotificationError;
pub use crate::notifications::event::{
    DeliveryEvent, DeliveryEventType, DestinationEvent, DestinationEventType, EventFilter,
    ProviderEvent, SubscriptionEvent, SubscriptionEventType, SystemEvent, SystemEventType,
};
pub use crate::notifications::manager::NotificationManager;
pub use crate::notifications::statistics::SubscriberStatistics;

/// Receiving half handed to notification subscribers
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<ProviderEvent>;

/// Publish an event through a shared manager
///
/// Failures only mean a subscriber went away; they are logged and dropped so
/// that delivery paths never fail because of a notification.
pub(crate) fn publish_event(manager: &Mutex<NotificationManager>, event: ProviderEvent) {
    log::trace!("Publishing {} event", event.category());
    match manager.lock() {
        Ok(mut manager) => {
            if let Err(e) = manager.publish(event) {
                log::debug!("Notification delivery incomplete: {e}");
            }
        }
        Err(_) => log::error!("Notification manager lock poisoned; event dropped"),
    }
}
