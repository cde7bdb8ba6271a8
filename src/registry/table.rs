//! Name table

use crate::core::sync::{read_lock, write_lock};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::queue::Queue;
use crate::registry::{Destination, DestinationKind};
use crate::topic::Topic;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Resolves logical names to destinations
pub trait NamingContext {
    fn resolve(&self, name: &str) -> ProviderResult<Destination>;

    fn resolve_queue(&self, name: &str) -> ProviderResult<Arc<Queue>> {
        match self.resolve(name)? {
            Destination::Queue(queue) => Ok(queue),
            Destination::Topic(_) => Err(ProviderError::DestinationKindMismatch {
                name: name.to_string(),
                expected: DestinationKind::Queue,
            }),
        }
    }

    fn resolve_topic(&self, name: &str) -> ProviderResult<Arc<Topic>> {
        match self.resolve(name)? {
            Destination::Topic(topic) => Ok(topic),
            Destination::Queue(_) => Err(ProviderError::DestinationKindMismatch {
                name: name.to_string(),
                expected: DestinationKind::Topic,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct DestinationRegistry {
    destinations: RwLock<HashMap<String, Destination>>,
    aliases: HashMap<String, String>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: HashMap<String, String>) -> Self {
        Self {
            destinations: RwLock::new(HashMap::new()),
            aliases,
        }
    }

    /// Physical name behind a possibly aliased name
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn lookup(&self, name: &str) -> ProviderResult<Option<Destination>> {
        let name = self.canonical_name(name);
        Ok(read_lock(self.destinations.read(), "destination registry")?
            .get(name)
            .cloned())
    }

    /// Return the queue under `name`, creating it with `create` on first use
    ///
    /// Creation runs under the registry write lock, so concurrent callers
    /// all observe the same queue.
    pub fn queue_or_create<F>(&self, name: &str, create: F) -> ProviderResult<Arc<Queue>>
    where
        F: FnOnce(&str) -> ProviderResult<Arc<Queue>>,
    {
        let destination = self.get_or_create(name, DestinationKind::Queue, |name| {
            create(name).map(Destination::Queue)
        })?;
        match destination {
            Destination::Queue(queue) => Ok(queue),
            Destination::Topic(_) => Err(self.mismatch(name, DestinationKind::Queue)),
        }
    }

    pub fn topic_or_create<F>(&self, name: &str, create: F) -> ProviderResult<Arc<Topic>>
    where
        F: FnOnce(&str) -> ProviderResult<Arc<Topic>>,
    {
        let destination = self.get_or_create(name, DestinationKind::Topic, |name| {
            create(name).map(Destination::Topic)
        })?;
        match destination {
            Destination::Topic(topic) => Ok(topic),
            Destination::Queue(_) => Err(self.mismatch(name, DestinationKind::Topic)),
        }
    }

    fn get_or_create<F>(
        &self,
        name: &str,
        kind: DestinationKind,
        create: F,
    ) -> ProviderResult<Destination>
    where
        F: FnOnce(&str) -> ProviderResult<Destination>,
    {
        let name = self.canonical_name(name);
        if let Some(existing) = self.lookup(name)? {
            return Ok(existing);
        }

        let mut destinations = write_lock(self.destinations.write(), "destination registry")?;
        if let Some(existing) = destinations.get(name) {
            return Ok(existing.clone());
        }
        let destination = create(name)?;
        log::debug!("Registered {} '{}'", kind, name);
        destinations.insert(name.to_string(), destination.clone());
        Ok(destination)
    }

    fn mismatch(&self, name: &str, expected: DestinationKind) -> ProviderError {
        ProviderError::DestinationKindMismatch {
            name: self.canonical_name(name).to_string(),
            expected,
        }
    }

    /// Every registered destination, sorted by name
    pub fn destinations(&self) -> ProviderResult<Vec<Destination>> {
        let mut all: Vec<Destination> =
            read_lock(self.destinations.read(), "destination registry")?
                .values()
                .cloned()
                .collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    pub fn len(&self) -> usize {
        self.destinations.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&self) -> ProviderResult<()> {
        write_lock(self.destinations.write(), "destination registry")?.clear();
        Ok(())
    }
}

impl NamingContext for DestinationRegistry {
    fn resolve(&self, name: &str) -> ProviderResult<Destination> {
        self.lookup(name)?
            .ok_or_else(|| ProviderError::NameNotFound {
                name: name.to_string(),
            })
    }
}
