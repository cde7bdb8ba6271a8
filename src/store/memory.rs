//! In-memory message store

use super::{MessageStore, StoreError};
use crate::message::Message;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Store that keeps backlogs for the life of the value
///
/// Sharing one `Arc<MemoryStore>` between two provider instances lets tests
/// simulate a restart without touching the file system.
#[derive(Debug, Default)]
pub struct MemoryStore {
    backlogs: Mutex<HashMap<String, Vec<Message>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn backlogs(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Message>>>, StoreError> {
        self.backlogs.lock().map_err(|_| StoreError::Poisoned {
            what: "memory store".to_string(),
        })
    }
}

impl MessageStore for MemoryStore {
    fn append(&self, key: &str, message: &Message) -> Result<(), StoreError> {
        self.backlogs()?
            .entry(key.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    fn load_backlog(&self, key: &str) -> Result<Vec<Message>, StoreError> {
        Ok(self.backlogs()?.get(key).cloned().unwrap_or_default())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.backlogs()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .backlogs()?
            .iter()
            .filter(|(_, backlog)| !backlog.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
