//! Message envelope
//!
//! A [`Message`] carries a payload, string headers and the envelope metadata
//! used for routing replies: a correlation id and a reply-to destination.
//!
//! Messages are built by value and become shared, read-only `Arc<Message>`
//! values once sent. The id is assigned at creation and is unique for the
//! life of the process.
//!
//! ```rust
//! use courier::message::{Message, Payload};
//! use courier::registry::DestinationRef;
//!
//! let request = Message::new(Payload::map([("Salary", 50000.0), ("Loan Amount", 120000.0)]))
//!     .with_reply_to(DestinationRef::queue("LoanResponseQ"))
//!     .with_header("region", "west");
//!
//! let reply = Message::reply_to_request(&request, "Accepted!");
//! assert_eq!(reply.correlation_id(), Some(request.id().as_str()));
//! ```

mod payload;
mod selector;

pub use payload::{MapValue, Payload};
pub use selector::Selector;

use crate::registry::DestinationRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Process-unique message identifier of the form `ID:<uuid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(format!("ID:{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_token(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Envelope metadata of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    id: MessageId,
    correlation_id: Option<String>,
    reply_to: Option<DestinationRef>,
    producer_id: Option<String>,
    timestamp: SystemTime,
    delivery_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    header: MessageHeader,
    properties: BTreeMap<String, String>,
    payload: Payload,
}

impl Message {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            header: MessageHeader {
                id: MessageId::new(),
                correlation_id: None,
                reply_to: None,
                producer_id: None,
                timestamp: SystemTime::now(),
                delivery_count: 1,
            },
            properties: BTreeMap::new(),
            payload: payload.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Payload::Empty)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Payload::Text(text.into()))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Payload::Bytes(bytes.into()))
    }

    /// Build a reply carrying the request's correlation id, or its message id
    /// when the request had none
    pub fn reply_to_request(request: &Message, payload: impl Into<Payload>) -> Self {
        let correlation_id = request
            .correlation_id()
            .map(str::to_string)
            .unwrap_or_else(|| request.id().as_str().to_string());
        Self::new(payload).with_correlation_id(correlation_id)
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.header.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: DestinationRef) -> Self {
        self.header.reply_to = Some(reply_to);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.header.id
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.header.correlation_id.as_deref()
    }

    pub fn reply_to(&self) -> Option<&DestinationRef> {
        self.header.reply_to.as_ref()
    }

    /// Producer that sent the message, when sent through a `MessageProducer`
    pub fn producer_id(&self) -> Option<&str> {
        self.header.producer_id.as_deref()
    }

    pub fn timestamp(&self) -> SystemTime {
        self.header.timestamp
    }

    /// Number of times this message has been handed to a consumer
    pub fn delivery_count(&self) -> u32 {
        self.header.delivery_count
    }

    pub fn is_redelivered(&self) -> bool {
        self.header.delivery_count > 1
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub(crate) fn stamp_producer(&mut self, producer_id: &str) {
        self.header.producer_id = Some(producer_id.to_string());
    }

    /// Replace the id before the message is first sent
    pub(crate) fn assign_id(&mut self, id: MessageId) {
        self.header.id = id;
    }

    pub(crate) fn set_correlation_if_absent(&mut self, correlation_id: &str) {
        if self.header.correlation_id.is_none() {
            self.header.correlation_id = Some(correlation_id.to_string());
        }
    }

    pub(crate) fn set_reply_to_if_absent(&mut self, reply_to: DestinationRef) {
        if self.header.reply_to.is_none() {
            self.header.reply_to = Some(reply_to);
        }
    }

    /// Copy of this message marked for another delivery attempt
    pub(crate) fn redelivery(&self) -> Self {
        let mut copy = self.clone();
        copy.header.delivery_count += 1;
        copy
    }

    /// Approximate heap footprint, used for destination statistics
    pub fn approximate_size(&self) -> usize {
        let header_size = std::mem::size_of::<MessageHeader>()
            + self.header.id.as_str().len()
            + self.header.correlation_id.as_ref().map_or(0, String::len)
            + self.header.producer_id.as_ref().map_or(0, String::len)
            + self.header.reply_to.as_ref().map_or(0, |r| r.name().len());
        let properties_size: usize = self
            .properties
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum();

        header_size + properties_size + self.payload.approximate_size()
    }
}
