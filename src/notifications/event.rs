//! Event types for the notification system

use std::time::SystemTime;

#[derive(Clone, Debug, PartialEq)]
pub enum DestinationEventType {
    Created,
    BacklogRestored,
    BacklogEvicted,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeliveryEventType {
    ListenerFailed,
    Redelivered,
    RedeliveryExhausted,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubscriptionEventType {
    Attached,
    Detached,
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SystemEventType {
    Shutdown,
    ShutdownTimeout,
    PersistFailed,
}

#[derive(Clone, Debug)]
pub struct DestinationEvent {
    pub event_type: DestinationEventType,
    pub timestamp: SystemTime,
    pub destination: String,
    /// Durable subscription the event concerns, for topic backlogs
    pub subscriber_id: Option<String>,
    pub count: Option<usize>,
}

impl DestinationEvent {
    pub fn new(event_type: DestinationEventType, destination: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            destination,
            subscriber_id: None,
            count: None,
        }
    }

    pub fn for_subscription(
        event_type: DestinationEventType,
        destination: String,
        subscriber_id: String,
        count: usize,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            destination,
            subscriber_id: Some(subscriber_id),
            count: Some(count),
        }
    }

    pub fn with_count(event_type: DestinationEventType, destination: String, count: usize) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            destination,
            subscriber_id: None,
            count: Some(count),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeliveryEvent {
    pub event_type: DeliveryEventType,
    pub timestamp: SystemTime,
    /// Name of the consumer binding, e.g. `LoanRequestQ` or `RateTopic::Borrower1`
    pub consumer: String,
    pub message_id: String,
    pub delivery_count: u32,
    pub reason: Option<String>,
}

impl DeliveryEvent {
    pub fn new(
        event_type: DeliveryEventType,
        consumer: String,
        message_id: String,
        delivery_count: u32,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            consumer,
            message_id,
            delivery_count,
            reason: None,
        }
    }

    pub fn with_reason(
        event_type: DeliveryEventType,
        consumer: String,
        message_id: String,
        delivery_count: u32,
        reason: String,
    ) -> Self {
        Self {
            reason: Some(reason),
            ..Self::new(event_type, consumer, message_id, delivery_count)
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubscriptionEvent {
    pub event_type: SubscriptionEventType,
    pub timestamp: SystemTime,
    pub topic: String,
    pub subscriber_id: String,
    pub durable: bool,
}

impl SubscriptionEvent {
    pub fn new(
        event_type: SubscriptionEventType,
        topic: String,
        subscriber_id: String,
        durable: bool,
    ) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            topic,
            subscriber_id,
            durable,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

/// Unified event enum that encompasses all provider events
#[derive(Clone, Debug)]
pub enum ProviderEvent {
    Destination(DestinationEvent),
    Delivery(DeliveryEvent),
    Subscription(SubscriptionEvent),
    System(SystemEvent),
}

impl ProviderEvent {
    pub fn category(&self) -> &'static str {
        match self {
            ProviderEvent::Destination(_) => "Destination",
            ProviderEvent::Delivery(_) => "Delivery",
            ProviderEvent::Subscription(_) => "Subscription",
            ProviderEvent::System(_) => "System",
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq)]
pub enum EventFilter {
    DestinationOnly,
    DeliveryOnly,
    SubscriptionOnly,
    SystemOnly,
    DeliveryAndSystem,
    All,
}

impl EventFilter {
    pub fn accepts(&self, event: &ProviderEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::DestinationOnly => matches!(event, ProviderEvent::Destination(_)),
            EventFilter::DeliveryOnly => matches!(event, ProviderEvent::Delivery(_)),
            EventFilter::SubscriptionOnly => matches!(event, ProviderEvent::Subscription(_)),
            EventFilter::SystemOnly => matches!(event, ProviderEvent::System(_)),
            EventFilter::DeliveryAndSystem => {
                matches!(event, ProviderEvent::Delivery(_) | ProviderEvent::System(_))
            }
        }
    }
}
