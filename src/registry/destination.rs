//! Destination handles

use crate::queue::Queue;
use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    Queue,
    Topic,
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationKind::Queue => write!(f, "queue"),
            DestinationKind::Topic => write!(f, "topic"),
        }
    }
}

/// Serializable reference to a destination, carried in `reply_to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationRef {
    kind: DestinationKind,
    name: String,
}

impl DestinationRef {
    pub fn new(kind: DestinationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn queue(name: impl Into<String>) -> Self {
        Self::new(DestinationKind::Queue, name)
    }

    pub fn topic(name: impl Into<String>) -> Self {
        Self::new(DestinationKind::Topic, name)
    }

    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DestinationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.kind, self.name)
    }
}

/// A registered queue or topic
#[derive(Debug, Clone)]
pub enum Destination {
    Queue(Arc<Queue>),
    Topic(Arc<Topic>),
}

impl Destination {
    pub fn kind(&self) -> DestinationKind {
        match self {
            Destination::Queue(_) => DestinationKind::Queue,
            Destination::Topic(_) => DestinationKind::Topic,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Destination::Queue(queue) => queue.name(),
            Destination::Topic(topic) => topic.name(),
        }
    }

    pub fn to_ref(&self) -> DestinationRef {
        DestinationRef::new(self.kind(), self.name())
    }

    pub fn as_queue(&self) -> Option<&Arc<Queue>> {
        match self {
            Destination::Queue(queue) => Some(queue),
            Destination::Topic(_) => None,
        }
    }

    pub fn as_topic(&self) -> Option<&Arc<Topic>> {
        match self {
            Destination::Topic(topic) => Some(topic),
            Destination::Queue(_) => None,
        }
    }
}
