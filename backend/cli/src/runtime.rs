//! Runtime wiring: fetch loop -> dispatcher -> consumers.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use pollcast_channels::{CursorStore, FetchLoop, FloodControl, FloodPolicy, TelegramBotApi, UpdateDumper};
use pollcast_commands::build_default_router;
use pollcast_config::Settings;
use pollcast_core::{Consumer, Dispatcher, SharedUpdate, Transport};
use pollcast_logging::{BotEvent, BotEventLogger};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Build the Telegram-backed pipeline from settings and run it until Ctrl-C
/// or a fatal fetch error.
pub async fn run_bot(settings: &Settings) -> Result<()> {
    let transport: Arc<dyn Transport> =
        Arc::new(TelegramBotApi::new(settings.token()).with_base_url(settings.base_url()));
    let fetch_loop = FetchLoop::new(Arc::clone(&transport), CursorStore::new(settings.cursor_path()))
        .with_poll_timeout(settings.poll_timeout());

    let policy = FloodPolicy {
        period_secs: settings.flood_period_secs(),
        threshold: settings.flood_threshold(),
    };
    let consumers: Vec<Box<dyn Consumer>> = vec![
        Box::new(UpdateDumper::new()),
        Box::new(build_default_router(Arc::clone(&transport)).context("Failed to register commands")?),
        Box::new(FloodControl::new(Arc::clone(&transport), policy).context("Invalid flood control policy")?),
    ];

    run_pipeline(fetch_loop, consumers, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C; only a fatal error will stop the bot");
        std::future::pending::<()>().await;
    }
}

/// Run the pipeline until `shutdown` resolves or the fetch loop fails.
///
/// Either way the inlet is closed, the dispatcher drains, and every consumer
/// is awaited before returning. A fetch loop failure is returned as the error.
pub async fn run_pipeline<F>(
    fetch_loop: FetchLoop,
    consumers: Vec<Box<dyn Consumer>>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let dispatcher = Arc::new(Dispatcher::<SharedUpdate>::new(0));
    let inlet = dispatcher
        .take_inlet()
        .context("Dispatcher inlet already taken")?;

    // Subscribe everyone before the first update can arrive.
    let mut consumer_tasks = JoinSet::new();
    for mut consumer in consumers {
        let subscription = dispatcher.open_subscription(consumer.capacity());
        info!(consumer = consumer.name(), capacity = consumer.capacity(), "Consumer subscribed");
        consumer_tasks.spawn(async move {
            let name = consumer.name().to_string();
            if let Err(e) = consumer.run(subscription).await {
                error!(consumer = %name, error = %format_args!("{e:#}"), "Consumer failed");
                BotEventLogger::log_event(
                    "runtime",
                    BotEvent::ConsumerError {
                        consumer: name.clone(),
                        error_msg: format!("{e:#}"),
                    },
                );
            }
            name
        });
    }

    let dispatch_task = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.run().await }
    });
    let mut fetch_task = tokio::spawn(async move { fetch_loop.run(inlet).await });

    let finished = tokio::select! {
        joined = &mut fetch_task => Some(joined),
        () = shutdown => None,
    };
    let outcome = match finished {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(e).context("Fetch loop task panicked"),
        None => {
            info!("Shutdown requested");
            fetch_task.abort();
            let _ = fetch_task.await;
            Ok(())
        }
    };

    // The inlet went away with the fetch task: the dispatcher drains and
    // releases every outlet.
    dispatch_task
        .await
        .context("Dispatcher task panicked")?
        .context("Dispatcher failed")?;

    while let Some(joined) = consumer_tasks.join_next().await {
        match joined {
            Ok(name) => debug!(consumer = %name, "Consumer finished"),
            Err(e) => error!(error = %e, "Consumer task panicked"),
        }
    }

    match &outcome {
        Ok(()) => info!("Bot stopped"),
        Err(e) => error!(error = %format_args!("{e:#}"), "Bot stopped on fatal error"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pollcast_core::{MockTransport, OutgoingMessage, Subscription, TransportError, Update};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recorder {
        seen: Arc<Mutex<Vec<i64>>>,
        capacity: usize,
    }

    #[async_trait]
    impl Consumer for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn capacity(&self) -> usize {
            self.capacity
        }

        async fn run(&mut self, mut subscription: Subscription<SharedUpdate>) -> Result<()> {
            while let Some(update) = subscription.recv().await {
                self.seen.lock().unwrap().push(update.update_id);
            }
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Consumer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn run(&mut self, _subscription: Subscription<SharedUpdate>) -> Result<()> {
            anyhow::bail!("gave up immediately")
        }
    }

    /// Never answers a long poll.
    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn fetch_updates(
            &self,
            _since: Option<i64>,
            _timeout: Duration,
        ) -> Result<Vec<Update>, TransportError> {
            std::future::pending().await
        }

        async fn send_notification(&self, _message: &OutgoingMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn command_update(id: i64, chat: i64) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "from": {"id": 5, "first_name": "Ann"},
                "chat": {"id": chat, "type": "private"},
                "date": 1_700_000_000,
                "text": "/help",
                "entities": [{"type": "bot_command", "offset": 0, "length": 5}]
            }
        }))
        .unwrap()
    }

    fn recorder(capacity: usize) -> (Box<dyn Consumer>, Arc<Mutex<Vec<i64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let consumer = Recorder {
            seen: Arc::clone(&seen),
            capacity,
        };
        (Box::new(consumer), seen)
    }

    #[tokio::test]
    async fn fatal_fetch_error_drains_and_stops_every_consumer() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(
            MockTransport::new()
                .with_batch(vec![command_update(1, 10), command_update(2, 10)])
                .with_batch(vec![command_update(3, 11)]),
        );
        let fetch_loop = FetchLoop::new(
            transport.clone(),
            CursorStore::new(dir.path().join("last_update_id")),
        );

        let (fast, fast_seen) = recorder(0);
        let (buffered, buffered_seen) = recorder(16);
        let router = build_default_router(transport.clone()).unwrap();
        let consumers: Vec<Box<dyn Consumer>> =
            vec![fast, buffered, Box::new(Broken), Box::new(router)];

        let err = run_pipeline(fetch_loop, consumers, std::future::pending())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("mock script exhausted"));
        assert_eq!(*fast_seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(*buffered_seen.lock().unwrap(), vec![1, 2, 3]);
        // One /help reply per update.
        let chats: Vec<i64> = transport.sent().iter().map(|m| m.chat_id).collect();
        assert_eq!(chats, vec![10, 10, 11]);
        let cursor = CursorStore::new(dir.path().join("last_update_id"));
        assert_eq!(cursor.load().await, Some(3));
    }

    #[tokio::test]
    async fn shutdown_signal_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let fetch_loop = FetchLoop::new(
            Arc::new(Stalled),
            CursorStore::new(dir.path().join("last_update_id")),
        );
        let (consumer, seen) = recorder(0);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_pipeline(fetch_loop, vec![consumer], tokio::time::sleep(Duration::from_millis(20))),
        )
        .await
        .expect("pipeline should stop after shutdown");

        assert!(result.is_ok());
        assert!(seen.lock().unwrap().is_empty());
    }
}
