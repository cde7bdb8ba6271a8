//! Standalone delivery context for unit tests

use crate::core::shutdown::ShutdownCoordinator;
use crate::delivery::{Dispatcher, RedeliveryPolicy};
use crate::message::Message;
use crate::notifications::api::{EventFilter, EventReceiver, NotificationManager};
use crate::queue::Queue;
use crate::topic::Topic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) struct Harness {
    pub shutdown: Arc<ShutdownCoordinator>,
    pub notifications: Arc<Mutex<NotificationManager>>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_redelivery(RedeliveryPolicy::default())
    }

    pub fn with_redelivery(redelivery: RedeliveryPolicy) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let notifications = Arc::new(Mutex::new(NotificationManager::new()));
        let dispatcher = Arc::new(Dispatcher::new(
            redelivery,
            Arc::clone(&shutdown),
            Arc::clone(&notifications),
        ));
        Self {
            shutdown,
            notifications,
            dispatcher,
        }
    }

    pub fn queue(&self, name: &str) -> Arc<Queue> {
        Arc::new(Queue::new(name, Arc::clone(&self.dispatcher)))
    }

    pub fn topic(&self, name: &str) -> Arc<Topic> {
        self.topic_with_backlog(name, None)
    }

    pub fn topic_with_backlog(&self, name: &str, max_durable_backlog: Option<usize>) -> Arc<Topic> {
        Arc::new(Topic::new(
            name,
            Arc::clone(&self.dispatcher),
            max_durable_backlog,
        ))
    }

    pub fn events(&self, filter: EventFilter) -> EventReceiver {
        self.notifications
            .lock()
            .unwrap()
            .subscribe("test".to_string(), filter, "test:harness".to_string())
    }
}

pub(crate) fn text_of(message: &Message) -> String {
    message.payload().as_text().unwrap_or_default().to_string()
}

/// Poll `condition` until it holds, failing the test after five seconds
pub(crate) async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}
