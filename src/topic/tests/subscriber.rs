//! Tests for topic subscriber bindings

#[cfg(test)]
mod tests {
    use crate::delivery::testing::{text_of, wait_for, Harness};
    use crate::delivery::{ListenerError, MessageListener};
    use crate::message::{Message, Selector};
    use crate::provider::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Holds each message for a while and records overlapping invocations
    struct SlowBorrower {
        heard: Arc<Mutex<Vec<String>>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MessageListener for SlowBorrower {
        async fn on_message(&self, message: Arc<Message>) -> Result<(), ListenerError> {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.heard.lock().unwrap().push(text_of(&message));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_listener_receives_publications() {
        let harness = Harness::new();
        let topic = harness.topic("RateTopic");
        let heard = Arc::new(Mutex::new(Vec::new()));

        let subscriber = topic.subscribe("Borrower1", true, Selector::All).unwrap();
        let sink = Arc::clone(&heard);
        subscriber
            .set_listener(move |m: Arc<Message>| -> Result<(), ListenerError> {
                sink.lock().unwrap().push(text_of(&m));
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            subscriber.receive(Duration::ZERO).await,
            Err(ProviderError::InvalidConsumerState { .. })
        ));

        for rate in ["5.5", "6.8"] {
            topic.publish(Message::text(rate)).unwrap();
        }
        wait_for(|| heard.lock().unwrap().len() == 2).await;
        assert_eq!(*heard.lock().unwrap(), vec!["5.5", "6.8"]);

        subscriber.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_closing_non_durable_ends_pending_receive() {
        let harness = Harness::new();
        let topic = harness.topic("Chat");
        let subscriber = Arc::new(topic.subscribe("viewer", false, Selector::All).unwrap());

        let waiting = {
            let subscriber = Arc::clone(&subscriber);
            tokio::spawn(async move { subscriber.receive(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        topic.detach("viewer", None).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_durable_listener_leaves_backlog_after_close() {
        let harness = Harness::new();
        let topic = harness.topic("RateTopic");
        let heard = Arc::new(Mutex::new(Vec::new()));

        let subscriber = topic.subscribe("Borrower1", true, Selector::All).unwrap();
        let sink = Arc::clone(&heard);
        subscriber
            .set_listener(move |m: Arc<Message>| -> Result<(), ListenerError> {
                sink.lock().unwrap().push(text_of(&m));
                Ok(())
            })
            .await
            .unwrap();
        topic.publish(Message::text("5.5")).unwrap();
        wait_for(|| heard.lock().unwrap().len() == 1).await;

        subscriber.close().await.unwrap();
        topic.publish(Message::text("6.8")).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(heard.lock().unwrap().len(), 1);
        assert_eq!(topic.backlog_len("Borrower1").unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_publish_and_subscribe_fail_after_shutdown() {
        let harness = Harness::new();
        let topic = harness.topic("RateTopic");
        harness.shutdown.trigger_shutdown();

        assert!(matches!(
            topic.publish(Message::text("6.8")),
            Err(ProviderError::ProviderClosed)
        ));
        assert!(matches!(
            topic.subscribe("Borrower1", true, Selector::All),
            Err(ProviderError::ProviderClosed)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reattach_waits_for_dropped_listener() {
        let harness = Harness::new();
        let topic = harness.topic("RateTopic");
        let heard = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let borrower = || SlowBorrower {
            heard: Arc::clone(&heard),
            in_flight: Arc::clone(&in_flight),
            max_in_flight: Arc::clone(&max_in_flight),
        };

        let subscriber = topic.subscribe("Borrower1", true, Selector::All).unwrap();
        subscriber.set_listener(borrower()).await.unwrap();
        topic.publish(Message::text("5.5")).unwrap();
        wait_for(|| in_flight.load(Ordering::SeqCst) == 1).await;
        drop(subscriber);

        assert!(matches!(
            topic.subscribe("Borrower1", true, Selector::All),
            Err(ProviderError::DuplicateSubscription { .. })
        ));

        let subscriber = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match topic.subscribe("Borrower1", true, Selector::All) {
                    Ok(subscriber) => break subscriber,
                    Err(ProviderError::DuplicateSubscription { .. }) => {
                        tokio::time::sleep(Duration::from_millis(5)).await
                    }
                    Err(e) => panic!("Unexpected error: {e}"),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(*heard.lock().unwrap(), vec!["5.5"]);

        subscriber.set_listener(borrower()).await.unwrap();
        topic.publish(Message::text("6.8")).unwrap();
        wait_for(|| heard.lock().unwrap().len() == 2).await;

        assert_eq!(*heard.lock().unwrap(), vec!["5.5", "6.8"]);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        subscriber.close().await.unwrap();
    }
}
