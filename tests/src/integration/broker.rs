//! # Broker Scenarios
//!
//! `EventsBroker` used from several tasks at once, the way controllers of
//! consecutive screens use it during a transition.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use futures::future::join_all;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;
    use vas_bus::{async_handler, handler, BrokerError, EventsBroker};

    #[derive(Debug, Clone, PartialEq)]
    struct FrameRendered(u32);

    #[derive(Debug, Clone)]
    struct ExportRequested;

    #[tokio::test]
    async fn test_concurrent_subscribe_and_publish() {
        let broker = EventsBroker::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let broker = broker.clone();
            let delivered = Arc::clone(&delivered);
            tokio::spawn(async move {
                let counter = Arc::clone(&delivered);
                let token = broker.subscribe(handler(move |_: &FrameRendered| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }));
                tokio::task::yield_now().await;
                token
            })
        });
        let tokens: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(broker.subscriber_count::<FrameRendered>(), 8);
        assert_eq!(broker.publish(&FrameRendered(1)), 8);
        assert_eq!(delivered.load(Ordering::SeqCst), 8);

        for token in &tokens {
            assert!(broker.unsubscribe_token(token));
        }
        assert_eq!(broker.publish(&FrameRendered(2)), 0);
    }

    #[tokio::test]
    async fn test_async_failures_are_reported_not_fatal() {
        let broker = EventsBroker::new();
        let completed = Arc::new(AtomicUsize::new(0));

        broker.subscribe_async(async_handler(|_: Arc<ExportRequested>| async {
            anyhow::bail!("disk full")
        }));
        let counter = Arc::clone(&completed);
        broker.subscribe_async(async_handler(move |_: Arc<ExportRequested>| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        let err = broker.publish_async(ExportRequested).await.unwrap_err();
        let BrokerError::HandlerFailures { failures, .. } = &err;
        assert_eq!(failures.len(), 1);
        assert!(err.to_string().contains("1 of 2"));
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(broker.handler_failures(), 1);
    }

    #[tokio::test]
    async fn test_stream_sees_only_later_events() {
        let broker = EventsBroker::new();
        broker.publish(&FrameRendered(0));

        let mut frames = broker.stream::<FrameRendered>();
        let publisher = broker.clone();
        tokio::spawn(async move {
            for n in 1..=3 {
                publisher.publish(&FrameRendered(n));
                tokio::task::yield_now().await;
            }
        });

        let received: Vec<FrameRendered> = timeout(
            Duration::from_secs(5),
            (&mut frames).take(3).collect::<Vec<_>>(),
        )
        .await
        .unwrap();
        assert_eq!(
            received,
            vec![FrameRendered(1), FrameRendered(2), FrameRendered(3)]
        );

        drop(frames);
        assert_eq!(broker.subscriber_count::<FrameRendered>(), 0);
    }
}
