//! Tests for backlog restore and persistence

#[cfg(test)]
mod tests {
    use crate::message::{Message, Selector};
    use crate::notifications::api::{DestinationEventType, EventFilter, ProviderEvent};
    use crate::provider::tests::loan_config;
    use crate::provider::Provider;
    use crate::store::{JsonLinesStore, MemoryStore, MessageStore};
    use crate::topic::SubscriptionStatus;
    use std::sync::Arc;
    use std::time::Duration;

    async fn texts(queue: &crate::queue::Queue) -> Vec<String> {
        let mut texts = Vec::new();
        while let Some(message) = queue.receive(&Selector::All, Duration::ZERO).await.unwrap() {
            texts.push(message.payload().as_text().unwrap_or_default().to_string());
        }
        texts
    }

    #[tokio::test]
    async fn test_backlogs_survive_restart() {
        let store = Arc::new(MemoryStore::new());

        let provider = Provider::with_store(loan_config(), store.clone()).unwrap();
        let queue = provider.queue("LoanRequestQ").unwrap();
        queue.send(Message::text("first")).unwrap();
        queue.send(Message::text("second")).unwrap();

        let topic = provider.topic("RateTopic").unwrap();
        let subscriber = topic.subscribe("Borrower1", true, Selector::All).unwrap();
        subscriber.close().await.unwrap();
        topic.publish(Message::text("5.5")).unwrap();
        provider.shutdown().await.unwrap();

        assert_eq!(
            store.keys().unwrap(),
            vec!["LoanRequestQ".to_string(), "RateTopic::Borrower1".to_string()]
        );

        let restarted = Provider::with_store(loan_config(), store.clone()).unwrap();
        let queue = restarted.queue("LoanRequestQ").unwrap();
        assert_eq!(texts(&queue).await, vec!["first", "second"]);

        let topic = restarted.topic("RateTopic").unwrap();
        assert_eq!(
            topic.subscription_status("Borrower1").unwrap(),
            Some(SubscriptionStatus::Detached)
        );
        let subscriber = topic.subscribe("Borrower1", true, Selector::All).unwrap();
        let rate = subscriber.receive(Duration::ZERO).await.unwrap().unwrap();
        assert_eq!(rate.payload().as_text(), Some("5.5"));
        subscriber.close().await.unwrap();

        restarted.shutdown().await.unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_raises_events() {
        let store = Arc::new(MemoryStore::new());
        store.append("LoanRequestQ", &Message::text("saved")).unwrap();

        let config = crate::core::config::ProviderConfig {
            queues: Vec::new(),
            topics: Vec::new(),
            auto_create_destinations: true,
            ..loan_config()
        };
        let provider = Provider::with_store(config, store).unwrap();
        let mut events = provider.events("watcher", EventFilter::DestinationOnly);

        provider.queue("LoanRequestQ").unwrap();

        let types: Vec<DestinationEventType> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|event| match event {
                ProviderEvent::Destination(event) => Some(event.event_type),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![DestinationEventType::BacklogRestored, DestinationEventType::Created]
        );
    }

    #[tokio::test]
    async fn test_unowned_keys_are_left_alone() {
        let store = Arc::new(MemoryStore::new());
        store.append("Elsewhere", &Message::text("keep")).unwrap();
        store
            .append("OtherTopic::Someone", &Message::text("keep"))
            .unwrap();

        let provider = Provider::with_store(loan_config(), store.clone()).unwrap();
        provider.shutdown().await.unwrap();

        assert_eq!(
            store.keys().unwrap(),
            vec!["Elsewhere".to_string(), "OtherTopic::Someone".to_string()]
        );
    }

    #[tokio::test]
    async fn test_removed_durable_subscription_is_cleared() {
        let store = Arc::new(MemoryStore::new());
        store
            .append("RateTopic::Borrower1", &Message::text("5.5"))
            .unwrap();

        let provider = Provider::with_store(loan_config(), store.clone()).unwrap();
        provider
            .topic("RateTopic")
            .unwrap()
            .unsubscribe("Borrower1")
            .unwrap();
        provider.shutdown().await.unwrap();

        assert!(store.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_dir_enables_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::core::config::ProviderConfig {
            store_dir: Some(dir.path().to_path_buf()),
            ..loan_config()
        };

        let provider = Provider::new(config.clone()).unwrap();
        provider
            .queue("LoanResponseQ")
            .unwrap()
            .send(Message::text("Declined"))
            .unwrap();
        provider.shutdown().await.unwrap();

        let store = JsonLinesStore::open(dir.path()).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["LoanResponseQ".to_string()]);

        let restarted = Provider::new(config).unwrap();
        let queue = restarted.queue("LoanResponseQ").unwrap();
        assert_eq!(texts(&queue).await, vec!["Declined"]);
    }
}
