//! Tests for producers and reply routing

#[cfg(test)]
mod tests {
    use crate::core::config::ProviderConfig;
    use crate::correlation::CorrelationStrategy;
    use crate::message::{MapValue, Message, Payload, Selector};
    use crate::provider::error::ProviderError;
    use crate::provider::tests::loan_config;
    use crate::provider::Provider;
    use crate::registry::DestinationRef;
    use crate::topic::SubscriptionOptions;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_producer_stamps_its_id() {
        let provider = Provider::new(loan_config()).unwrap();
        let queue = provider.queue("LoanRequestQ").unwrap();
        let producer = provider.create_producer();

        producer.send(&queue, Message::text("hello")).unwrap();
        let received = queue
            .receive(&Selector::All, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(received.producer_id(), Some(producer.id()));
        assert!(producer.id().starts_with("loans-producer-"));
    }

    #[tokio::test]
    async fn test_generated_producer_ids_are_distinct() {
        let provider = Provider::new(loan_config()).unwrap();

        let first = provider.create_producer();
        let second = provider.create_producer();
        assert_ne!(first.id(), second.id());
        assert_eq!(provider.create_producer_with_id("alice").id(), "alice");
    }

    #[tokio::test]
    async fn test_no_local_skips_own_publications() {
        let provider = Provider::new(loan_config()).unwrap();
        let topic = provider.topic("RateTopic").unwrap();
        let alice = provider.create_producer_with_id("alice");
        let bob = provider.create_producer_with_id("bob");

        let subscriber = topic
            .subscribe_with(SubscriptionOptions::new("alice-chat").no_local("alice"))
            .unwrap();

        assert_eq!(alice.publish(&topic, Message::text("mine")).unwrap(), 0);
        assert_eq!(bob.publish(&topic, Message::text("theirs")).unwrap(), 1);

        let received = subscriber.receive(Duration::ZERO).await.unwrap().unwrap();
        assert_eq!(received.payload().as_text(), Some("theirs"));
        assert!(subscriber.receive(Duration::ZERO).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_to_resolves_reference() {
        let provider = Provider::new(loan_config()).unwrap();
        let producer = provider.create_producer();

        producer
            .send_to(&DestinationRef::queue("LoanResponseQ"), Message::text("a"))
            .unwrap();
        assert_eq!(provider.queue("LoanResponseQ").unwrap().len(), 1);

        assert!(matches!(
            producer.send_to(&DestinationRef::topic("LoanResponseQ"), Message::text("b")),
            Err(ProviderError::DestinationKindMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_reply_routes_to_reply_to_with_correlation() {
        let provider = Provider::new(loan_config()).unwrap();
        let producer = provider.create_producer();
        let request = Message::empty().with_reply_to(DestinationRef::queue("LoanResponseQ"));

        producer.reply(&request, Message::text("Accepted!")).unwrap();

        let reply = provider
            .queue("LoanResponseQ")
            .unwrap()
            .receive(&Selector::correlation_id(request.id().as_str()), Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.payload().as_text(), Some("Accepted!"));
    }

    #[tokio::test]
    async fn test_reply_without_reply_to_fails() {
        let provider = Provider::new(loan_config()).unwrap();
        let producer = provider.create_producer();
        let request = Message::empty();

        match producer.reply(&request, Message::text("Declined")) {
            Err(ProviderError::MissingReplyTo { message_id }) => {
                assert_eq!(message_id, request.id().as_str());
            }
            other => panic!("Expected MissingReplyTo, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_producer_outliving_provider() {
        let provider = Provider::new(loan_config()).unwrap();
        let producer = provider.create_producer();
        drop(provider);

        assert!(matches!(
            producer.send_to(&DestinationRef::queue("LoanRequestQ"), Message::empty()),
            Err(ProviderError::ProviderClosed)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_request_reply_through_provider() {
        let config = ProviderConfig {
            correlation_strategy: CorrelationStrategy::Counter,
            request_timeout_ms: 2_000,
            ..loan_config()
        };
        let provider = Provider::new(config).unwrap();

        let responder = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                let requests = provider.queue("LoanRequestQ").unwrap();
                let producer = provider.create_producer();
                let request = requests
                    .receive(&Selector::All, Duration::from_secs(2))
                    .await
                    .unwrap()
                    .unwrap();
                let salary = request.payload().get("Salary").and_then(MapValue::as_f64);
                let text = if salary == Some(50000.0) { "Accepted!" } else { "Declined" };
                producer
                    .reply(&request, Message::reply_to_request(&request, text))
                    .unwrap();
            })
        };

        let reply = provider
            .request_reply("LoanRequestQ", "LoanResponseQ", |_| {
                Message::new(Payload::map([("Salary", 50000.0), ("Loan Amount", 120000.0)]))
            })
            .await
            .unwrap()
            .unwrap();

        responder.await.unwrap();
        assert_eq!(reply.payload().as_text(), Some("Accepted!"));
        assert_eq!(reply.correlation_id(), Some("corr-1"));
        assert!(provider.correlation_broker().outstanding().is_empty());
    }
}
