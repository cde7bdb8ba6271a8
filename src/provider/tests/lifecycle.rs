//! Tests for destination lookup and shutdown

#[cfg(test)]
mod tests {
    use crate::core::config::ProviderConfig;
    use crate::delivery::{Deadline, ListenerError};
    use crate::message::{Message, Selector};
    use crate::notifications::api::{
        DestinationEventType, EventFilter, ProviderEvent, SystemEventType,
    };
    use crate::provider::error::ProviderError;
    use crate::provider::tests::loan_config;
    use crate::provider::Provider;
    use crate::registry::{DestinationKind, DestinationRef, NamingContext};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_configured_destinations_exist_at_startup() {
        let provider = Provider::new(loan_config()).unwrap();

        assert_eq!(
            provider.destinations().unwrap(),
            vec![
                DestinationRef::queue("LoanRequestQ"),
                DestinationRef::queue("LoanResponseQ"),
                DestinationRef::topic("RateTopic"),
            ]
        );
        assert!(provider.queue("LoanRequestQ").is_ok());
        assert!(provider.topic("RateTopic").is_ok());
    }

    #[tokio::test]
    async fn test_unknown_name_without_auto_create() {
        let provider = Provider::new(loan_config()).unwrap();

        match provider.queue("Nowhere") {
            Err(ProviderError::NameNotFound { name }) => assert_eq!(name, "Nowhere"),
            other => panic!("Expected NameNotFound, got {:?}", other),
        }
        assert!(matches!(
            provider.resolve("Nowhere"),
            Err(ProviderError::NameNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_auto_create_returns_same_destination() {
        let provider = Provider::new(ProviderConfig::default()).unwrap();

        let first = provider.queue("Orders").unwrap();
        let second = provider.queue("Orders").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        match provider.topic("Orders") {
            Err(ProviderError::DestinationKindMismatch { name, expected }) => {
                assert_eq!(name, "Orders");
                assert_eq!(expected, DestinationKind::Topic);
            }
            other => panic!("Expected DestinationKindMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aliases_resolve_through_naming_context() {
        let config = ProviderConfig {
            aliases: HashMap::from([("jms/LoanRequest".to_string(), "LoanRequestQ".to_string())]),
            ..loan_config()
        };
        let provider = Provider::new(config).unwrap();

        let by_alias = provider.resolve_queue("jms/LoanRequest").unwrap();
        let by_name = provider.queue("LoanRequestQ").unwrap();
        assert!(Arc::ptr_eq(&by_alias, &by_name));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ProviderConfig {
            queues: vec!["Orders".to_string()],
            topics: vec!["Orders".to_string()],
            ..ProviderConfig::default()
        };

        assert!(matches!(
            Provider::new(config),
            Err(ProviderError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_created_events_for_lazy_destinations() {
        let provider = Provider::new(ProviderConfig::default()).unwrap();
        let mut events = provider.events("watcher", EventFilter::DestinationOnly);

        provider.queue("Lazy").unwrap();
        provider.queue("Lazy").unwrap();

        match events.try_recv() {
            Ok(ProviderEvent::Destination(event)) => {
                assert_eq!(event.event_type, DestinationEventType::Created);
                assert_eq!(event.destination, "Lazy");
            }
            other => panic!("Expected Created event, got {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_metadata_uses_provider_name() {
        let provider = Provider::new(loan_config()).unwrap();
        let metadata = provider.metadata();

        assert_eq!(metadata.provider_name, "loans");
        assert!(metadata.supports_property("JMSXProducerID"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_wakes_receivers_and_rejects_work() {
        let provider = Provider::new(loan_config()).unwrap();
        let queue = provider.queue("LoanResponseQ").unwrap();
        let topic = provider.topic("RateTopic").unwrap();
        let mut events = provider.events("watcher", EventFilter::SystemOnly);

        let waiting = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.receive(&Selector::All, Deadline::Never).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        provider.shutdown().await.unwrap();

        let woken = tokio::time::timeout(Duration::from_secs(2), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(woken.unwrap().is_none());

        assert!(provider.is_closed());
        assert!(matches!(
            queue.send(Message::text("late")),
            Err(ProviderError::ProviderClosed)
        ));
        assert!(matches!(
            topic.publish(Message::text("late")),
            Err(ProviderError::ProviderClosed)
        ));
        assert!(matches!(
            queue.receive(&Selector::All, Duration::ZERO).await,
            Err(ProviderError::ProviderClosed)
        ));
        assert!(matches!(
            provider.queue("LoanResponseQ"),
            Err(ProviderError::ProviderClosed)
        ));
        assert!(provider.destinations().unwrap().is_empty());

        match events.try_recv() {
            Ok(ProviderEvent::System(event)) => {
                assert_eq!(event.event_type, SystemEventType::Shutdown);
            }
            other => panic!("Expected Shutdown event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let provider = Provider::new(loan_config()).unwrap();
        let mut events = provider.events("watcher", EventFilter::SystemOnly);

        provider.shutdown().await.unwrap();
        provider.shutdown().await.unwrap();

        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_stops_listeners() {
        let provider = Provider::new(loan_config()).unwrap();
        let queue = provider.queue("LoanRequestQ").unwrap();
        let receiver = queue.create_receiver(Selector::All).unwrap();
        receiver
            .set_listener(|_message: Arc<Message>| -> Result<(), ListenerError> { Ok(()) })
            .await
            .unwrap();

        assert_eq!(provider.active_listeners(), 1);

        provider.shutdown().await.unwrap();

        assert_eq!(provider.active_listeners(), 0);
    }
}
