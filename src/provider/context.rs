//! Provider lifecycle

use crate::core::config::ProviderConfig;
use crate::core::error_handling::log_error_with_context;
use crate::core::retry::{retry_async, RetryPolicy};
use crate::core::shutdown::ShutdownCoordinator;
use crate::correlation::CorrelationBroker;
use crate::delivery::{Dispatcher, RedeliveryPolicy};
use crate::message::Message;
use crate::notifications::api::{
    publish_event, DestinationEvent, DestinationEventType, EventFilter, EventReceiver,
    NotificationManager, ProviderEvent, SystemEvent, SystemEventType,
};
use crate::provider::error::{ProviderError, ProviderResult};
use crate::provider::{MessageProducer, ProviderMetadata};
use crate::queue::Queue;
use crate::registry::{Destination, DestinationRef, DestinationRegistry, NamingContext};
use crate::store::{durable_key, parse_durable_key, JsonLinesStore, MessageStore, StoreError};
use crate::topic::Topic;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Backlog of one store key, captured at shutdown
type Backlog = (String, Vec<Arc<Message>>);

pub struct Provider {
    config: ProviderConfig,
    registry: DestinationRegistry,
    store: Option<Arc<dyn MessageStore>>,
    shutdown: Arc<ShutdownCoordinator>,
    notifications: Arc<Mutex<NotificationManager>>,
    dispatcher: Arc<Dispatcher>,
    broker: Arc<CorrelationBroker>,
    producer_seq: AtomicU64,
    this: Weak<Provider>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.config.provider_name)
            .field("destinations", &self.registry.len())
            .field("persistent", &self.store.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Provider {
    /// Create a provider, backed by a JSON lines store when `store_dir` is set
    pub fn new(config: ProviderConfig) -> ProviderResult<Arc<Self>> {
        let store: Option<Arc<dyn MessageStore>> = match &config.store_dir {
            Some(dir) => Some(Arc::new(JsonLinesStore::open(dir)?)),
            None => None,
        };
        Self::build(config, store)
    }

    /// Create a provider that restores from and persists to `store`
    pub fn with_store(
        config: ProviderConfig,
        store: Arc<dyn MessageStore>,
    ) -> ProviderResult<Arc<Self>> {
        Self::build(config, Some(store))
    }

    fn build(
        config: ProviderConfig,
        store: Option<Arc<dyn MessageStore>>,
    ) -> ProviderResult<Arc<Self>> {
        config.validate()?;

        let shutdown = Arc::new(ShutdownCoordinator::new());
        let notifications = Arc::new(Mutex::new(NotificationManager::new()));
        let dispatcher = Arc::new(Dispatcher::new(
            RedeliveryPolicy::from_config(&config),
            Arc::clone(&shutdown),
            Arc::clone(&notifications),
        ));
        let broker = Arc::new(CorrelationBroker::new(
            config.correlation_strategy,
            config.request_timeout(),
        ));
        let registry = DestinationRegistry::with_aliases(config.aliases.clone());

        let provider = Arc::new_cyclic(|this| Self {
            config,
            registry,
            store,
            shutdown,
            notifications,
            dispatcher,
            broker,
            producer_seq: AtomicU64::new(0),
            this: this.clone(),
        });

        for name in &provider.config.queues {
            provider.create_queue(name)?;
        }
        for name in &provider.config.topics {
            provider.create_topic(name)?;
        }

        log::info!(
            "Provider '{}' started with {} destination(s){}",
            provider.config.provider_name,
            provider.registry.len(),
            if provider.store.is_some() {
                ", persistence enabled"
            } else {
                ""
            }
        );
        Ok(provider)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    fn ensure_open(&self) -> ProviderResult<()> {
        if self.is_closed() {
            Err(ProviderError::ProviderClosed)
        } else {
            Ok(())
        }
    }

    fn notify(&self, event: ProviderEvent) {
        publish_event(&self.notifications, event);
    }

    /// Look up a queue, creating it when `auto_create_destinations` is on
    pub fn queue(&self, name: &str) -> ProviderResult<Arc<Queue>> {
        if self.config.auto_create_destinations {
            self.create_queue(name)
        } else {
            self.ensure_open()?;
            self.registry.resolve_queue(name)
        }
    }

    /// Look up a topic, creating it when `auto_create_destinations` is on
    pub fn topic(&self, name: &str) -> ProviderResult<Arc<Topic>> {
        if self.config.auto_create_destinations {
            self.create_topic(name)
        } else {
            self.ensure_open()?;
            self.registry.resolve_topic(name)
        }
    }

    /// Create a queue, or return the existing one of the same name
    pub fn create_queue(&self, name: &str) -> ProviderResult<Arc<Queue>> {
        self.ensure_open()?;
        self.registry
            .queue_or_create(name, |name| self.build_queue(name))
    }

    /// Create a topic, or return the existing one of the same name
    pub fn create_topic(&self, name: &str) -> ProviderResult<Arc<Topic>> {
        self.ensure_open()?;
        self.registry
            .topic_or_create(name, |name| self.build_topic(name))
    }

    fn build_queue(&self, name: &str) -> ProviderResult<Arc<Queue>> {
        let queue = Arc::new(Queue::new(name, Arc::clone(&self.dispatcher)));

        if let Some(store) = &self.store {
            let backlog = store.load_backlog(name)?;
            if !backlog.is_empty() {
                let restored = queue.restore(backlog)?;
                log::info!("Restored {} message(s) to queue '{}'", restored, name);
                self.notify(ProviderEvent::Destination(DestinationEvent::with_count(
                    DestinationEventType::BacklogRestored,
                    name.to_string(),
                    restored,
                )));
            }
        }

        self.notify(ProviderEvent::Destination(DestinationEvent::new(
            DestinationEventType::Created,
            name.to_string(),
        )));
        Ok(queue)
    }

    fn build_topic(&self, name: &str) -> ProviderResult<Arc<Topic>> {
        let topic = Arc::new(Topic::new(
            name,
            Arc::clone(&self.dispatcher),
            self.config.max_durable_backlog,
        ));

        if let Some(store) = &self.store {
            for key in store.keys()? {
                let Some((topic_name, subscriber_id)) = parse_durable_key(&key) else {
                    continue;
                };
                if topic_name != name {
                    continue;
                }
                let restored = topic.restore_durable(subscriber_id, store.load_backlog(&key)?)?;
                log::info!(
                    "Restored durable subscription '{}' on topic '{}' with {} message(s)",
                    subscriber_id,
                    name,
                    restored
                );
                self.notify(ProviderEvent::Destination(DestinationEvent::for_subscription(
                    DestinationEventType::BacklogRestored,
                    name.to_string(),
                    subscriber_id.to_string(),
                    restored,
                )));
            }
        }

        self.notify(ProviderEvent::Destination(DestinationEvent::new(
            DestinationEventType::Created,
            name.to_string(),
        )));
        Ok(topic)
    }

    /// Every registered destination
    pub fn destinations(&self) -> ProviderResult<Vec<DestinationRef>> {
        Ok(self
            .registry
            .destinations()?
            .iter()
            .map(Destination::to_ref)
            .collect())
    }

    /// Listener tasks still running
    pub fn active_listeners(&self) -> usize {
        self.dispatcher.active_listeners()
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Producer with a generated id
    pub fn create_producer(&self) -> MessageProducer {
        let seq = self.producer_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.create_producer_with_id(format!("{}-producer-{}", self.config.provider_name, seq))
    }

    /// Producer with a caller-chosen id, e.g. a chat user name used for no-local filtering
    pub fn create_producer_with_id(&self, producer_id: impl Into<String>) -> MessageProducer {
        MessageProducer::new(self.this.clone(), producer_id.into())
    }

    pub fn correlation_broker(&self) -> Arc<CorrelationBroker> {
        Arc::clone(&self.broker)
    }

    /// Send a request built by `build` and wait for its reply with the
    /// configured request timeout
    ///
    /// Returns `Ok(None)` when no reply arrives in time.
    pub async fn request_reply<F>(
        &self,
        request_queue: &str,
        reply_queue: &str,
        build: F,
    ) -> ProviderResult<Option<Arc<Message>>>
    where
        F: FnOnce(&str) -> Message,
    {
        let request_queue = self.queue(request_queue)?;
        let reply_queue = self.queue(reply_queue)?;
        self.broker
            .request_reply(
                &request_queue,
                &reply_queue,
                build,
                self.broker.default_deadline(),
            )
            .await
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata::new(&self.config.provider_name)
    }

    /// Subscribe to provider notifications
    pub fn events(&self, subscriber_id: impl Into<String>, filter: EventFilter) -> EventReceiver {
        let source = format!("provider:{}", self.config.provider_name);
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(subscriber_id.into(), filter, source)
    }

    /// Shut the provider down
    ///
    /// New sends, receives and subscriptions fail with `ProviderClosed` from
    /// the moment this is called. Listener tasks get `shutdown_grace` to
    /// finish their current message; blocked receivers wake and return
    /// `Ok(None)`. Remaining backlogs are written to the store. Calling it
    /// again is a no-op.
    pub async fn shutdown(&self) -> ProviderResult<()> {
        if !self.shutdown.trigger_shutdown() {
            log::debug!(
                "Provider '{}' is already shut down",
                self.config.provider_name
            );
            return Ok(());
        }
        log::info!("Shutting down provider '{}'", self.config.provider_name);

        let aborted = self.dispatcher.drain(self.config.shutdown_grace()).await;
        if aborted > 0 {
            self.notify(ProviderEvent::System(SystemEvent::with_message(
                SystemEventType::ShutdownTimeout,
                format!("{} listener task(s) aborted", aborted),
            )));
        }

        let destinations = self.registry.destinations()?;
        for destination in &destinations {
            match destination {
                Destination::Queue(queue) => queue.close(),
                Destination::Topic(topic) => topic.close(),
            }
        }

        if let Some(store) = &self.store {
            let backlogs = Self::collect_backlogs(&destinations)?;
            if let Err(e) = Self::persist(store.as_ref(), &destinations, &backlogs).await {
                let error = ProviderError::from(e);
                log_error_with_context(&error, "Persisting backlogs at shutdown");
                self.notify(ProviderEvent::System(SystemEvent::with_message(
                    SystemEventType::PersistFailed,
                    error.to_string(),
                )));
            }
        }

        self.notify(ProviderEvent::System(SystemEvent::with_message(
            SystemEventType::Shutdown,
            self.config.provider_name.clone(),
        )));
        self.registry.clear()?;
        log::info!("Provider '{}' stopped", self.config.provider_name);
        Ok(())
    }

    fn collect_backlogs(destinations: &[Destination]) -> ProviderResult<Vec<Backlog>> {
        let mut backlogs = Vec::new();
        for destination in destinations {
            match destination {
                Destination::Queue(queue) => {
                    backlogs.push((queue.name().to_string(), queue.drain()?));
                }
                Destination::Topic(topic) => {
                    for (subscriber_id, messages) in topic.drain_durable_backlogs()? {
                        backlogs.push((durable_key(topic.name(), &subscriber_id), messages));
                    }
                }
            }
        }
        Ok(backlogs)
    }

    /// Replace the stored backlog of every destination this provider owns
    ///
    /// Keys of destinations this provider never opened are left alone.
    async fn persist(
        store: &dyn MessageStore,
        destinations: &[Destination],
        backlogs: &[Backlog],
    ) -> Result<(), StoreError> {
        let owned = |key: &str| {
            let name = parse_durable_key(key).map_or(key, |(topic, _)| topic);
            destinations.iter().any(|d| d.name() == name)
        };
        let policy = RetryPolicy::default();

        let stale: Vec<String> =
            retry_async("list stored backlogs", policy.clone(), move || async move {
                store.keys()
            })
            .await?
            .into_iter()
            .filter(|key| owned(key))
            .collect();
        for key in &stale {
            retry_async("clear stored backlog", policy.clone(), move || async move {
                store.clear(key)
            })
            .await?;
        }

        let mut written = 0;
        for (key, messages) in backlogs {
            for message in messages {
                retry_async("append to stored backlog", policy.clone(), move || async move {
                    store.append(key, message)
                })
                .await?;
                written += 1;
            }
        }

        log::info!(
            "Persisted {} message(s) across {} backlog(s)",
            written,
            backlogs.iter().filter(|(_, m)| !m.is_empty()).count()
        );
        Ok(())
    }
}

impl NamingContext for Provider {
    fn resolve(&self, name: &str) -> ProviderResult<Destination> {
        self.ensure_open()?;
        self.registry.resolve(name)
    }
}
