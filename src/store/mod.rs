//! Message persistence
//!
//! The provider keeps messages in memory while running. A [`MessageStore`]
//! is consulted at two points only: when a queue or topic is created its
//! saved backlog is restored, and at shutdown the remaining queue backlogs
//! and durable subscription backlogs are written back.
//!
//! Keys are queue names, or `<topic>::<subscriber_id>` for durable
//! subscriptions (see [`durable_key`]).

mod file;
mod memory;

pub use file::JsonLinesStore;
pub use memory::MemoryStore;

use crate::message::Message;
use std::path::PathBuf;

const DURABLE_KEY_SEPARATOR: &str = "::";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed stored message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned: {what}")]
    Poisoned { what: String },
}

/// Persistence collaborator used at startup and shutdown
pub trait MessageStore: Send + Sync {
    /// Append one message to the backlog stored under `key`
    fn append(&self, key: &str, message: &Message) -> Result<(), StoreError>;

    /// Saved backlog under `key`, oldest first; empty when nothing is stored
    fn load_backlog(&self, key: &str) -> Result<Vec<Message>, StoreError>;

    fn clear(&self, key: &str) -> Result<(), StoreError>;

    /// Every key with a stored backlog
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Store key of a durable subscription backlog
pub fn durable_key(topic: &str, subscriber_id: &str) -> String {
    format!("{topic}{DURABLE_KEY_SEPARATOR}{subscriber_id}")
}

/// Split a durable subscription key into topic and subscriber id
pub fn parse_durable_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(DURABLE_KEY_SEPARATOR)
}
