//! Poll timers for running console views.
//!
//! Two periodic tasks exist per running view:
//! - Metrics polling (every `metrics_interval_ms`, min [`METRICS_POLL_MIN_MS`]):
//!   calls `get_instance_metrics` and feeds the view's sample window.
//! - Status refresh (every `status_interval_ms`, min [`STATUS_POLL_MIN_MS`]):
//!   calls `get_instance_info` to track the running flag, and while the tunnel
//!   is enabled also fetches the public endpoints.
//!
//! Both are spawned from `mod.rs`'s `handle_action` dispatcher and hand their
//! shutdown sender plus `JoinHandle` back to the TEA layer in a `...Started`
//! message, so the owning view can stop them on transition or close.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cwarden_core::prelude::*;
use cwarden_core::types::{InstanceStatus, MetricsPoint, TunnelEndpoint};
use cwarden_gateway::{BackendCommand, CommandSender};

use crate::message::Message;
use crate::session::ViewId;

/// Minimum metrics polling interval to keep call volume sane.
pub(super) const METRICS_POLL_MIN_MS: u64 = 250;

/// Minimum status refresh interval. Status is the coarse timer; it never
/// needs to outrun the metrics tick.
pub(super) const STATUS_POLL_MIN_MS: u64 = 1000;

/// Spawn the periodic metrics polling task for a view.
///
/// Creates the shutdown channel outside the spawned task so both the sender
/// and the `JoinHandle` can be packaged into `MetricsPollingStarted`. The TEA
/// layer can then signal the task to stop, or abort it outright.
///
/// The loop runs until the shutdown channel receives `true` or `msg_tx`
/// closes. Transient poll failures are reported as `MetricsSampleFailed` and
/// the timer keeps ticking; the next tick retries.
pub(super) fn spawn_metrics_polling(
    view_id: ViewId,
    instance_id: String,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
    metrics_interval_ms: u64,
) {
    let interval = Duration::from_millis(metrics_interval_ms.max(METRICS_POLL_MIN_MS));

    // Create the shutdown channel outside the task so both ends are available
    // before the task starts running.
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    // Arc is required because Message derives Clone and watch::Sender does not impl Clone.
    let shutdown_tx = Arc::new(shutdown_tx);

    // The JoinHandle only exists after `tokio::spawn` returns, but the task
    // sends it inside its first message. The Arc<Mutex<Option<>>> slot is the
    // rendezvous: the caller fills it synchronously after spawn, before the
    // task's first `.await` runs.
    let task_handle_slot: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));
    let task_handle_slot_for_msg = task_handle_slot.clone();

    let join_handle = tokio::spawn(async move {
        // Hand the controls to TEA before the first tick.
        if msg_tx
            .send(Message::MetricsPollingStarted {
                view_id,
                shutdown_tx,
                task_handle: task_handle_slot_for_msg,
            })
            .await
            .is_err()
        {
            // Channel closed, engine is shutting down.
            return;
        }

        let mut tick = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let command = BackendCommand::GetInstanceMetrics { id: instance_id.clone() };
                    match sender.call(command).await {
                        Ok(value) => match serde_json::from_value::<MetricsPoint>(value) {
                            Ok(point) => {
                                if msg_tx
                                    .send(Message::MetricsSampled { view_id, point })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!("Malformed metrics payload for view {}: {}", view_id, e);
                            }
                        },
                        Err(e) => {
                            if msg_tx
                                .send(Message::MetricsSampleFailed {
                                    view_id,
                                    error: e.to_string(),
                                })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                    }
                }

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("Metrics polling stopped for view {}", view_id);
                        break;
                    }
                }
            }
        }
    });

    // Synchronously store the JoinHandle in the slot. The task hasn't run yet
    // (tokio tasks don't run until the current thread yields to the runtime),
    // so the slot is populated before the first `.await` inside the task.
    if let Ok(mut slot) = task_handle_slot.lock() {
        *slot = Some(join_handle);
    };
}

/// Spawn the periodic status refresh task for a view.
///
/// Each tick fetches the instance's running/tunnel flags. While the tunnel is
/// enabled the tick also fetches the public endpoints; endpoint failures are
/// swallowed (stale endpoints beat flapping ones), while status failures are
/// reported and retried on the next tick.
pub(super) fn spawn_status_polling(
    view_id: ViewId,
    instance_id: String,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
    status_interval_ms: u64,
) {
    let interval = Duration::from_millis(status_interval_ms.max(STATUS_POLL_MIN_MS));

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let task_handle_slot: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));
    let task_handle_slot_for_msg = task_handle_slot.clone();

    let join_handle = tokio::spawn(async move {
        if msg_tx
            .send(Message::StatusPollingStarted {
                view_id,
                shutdown_tx,
                task_handle: task_handle_slot_for_msg,
            })
            .await
            .is_err()
        {
            return;
        }

        let mut tick = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let command = BackendCommand::GetInstanceInfo { id: instance_id.clone() };
                    let status = match sender.call(command).await {
                        Ok(value) => match serde_json::from_value::<InstanceStatus>(value) {
                            Ok(status) => status,
                            Err(e) => {
                                debug!("Malformed status payload for view {}: {}", view_id, e);
                                continue;
                            }
                        },
                        Err(e) => {
                            if msg_tx
                                .send(Message::StatusRefreshFailed {
                                    view_id,
                                    error: e.to_string(),
                                })
                                .await
                                .is_err()
                            {
                                break;
                            }
                            continue;
                        }
                    };

                    let tunnel_enabled = status.tunnel_enabled;
                    if msg_tx
                        .send(Message::StatusRefreshed { view_id, status })
                        .await
                        .is_err()
                    {
                        break;
                    }

                    if tunnel_enabled {
                        let command = BackendCommand::GetTunnelEndpoints {
                            id: instance_id.clone(),
                        };
                        match sender.call(command).await {
                            Ok(value) => {
                                match serde_json::from_value::<Vec<TunnelEndpoint>>(value) {
                                    Ok(endpoints) => {
                                        if msg_tx
                                            .send(Message::EndpointsLoaded { view_id, endpoints })
                                            .await
                                            .is_err()
                                        {
                                            break;
                                        }
                                    }
                                    Err(e) => {
                                        debug!(
                                            "Malformed endpoints payload for view {}: {}",
                                            view_id, e
                                        );
                                    }
                                }
                            }
                            Err(e) => {
                                debug!("Endpoint fetch failed for view {}: {}", view_id, e);
                            }
                        }
                    }
                }

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("Status polling stopped for view {}", view_id);
                        break;
                    }
                }
            }
        }
    });

    if let Ok(mut slot) = task_handle_slot.lock() {
        *slot = Some(join_handle);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_minimums_are_sane() {
        assert!(METRICS_POLL_MIN_MS >= 100);
        assert!(STATUS_POLL_MIN_MS >= METRICS_POLL_MIN_MS);
    }

    #[tokio::test]
    async fn test_metrics_polling_announces_controls_first() {
        let (msg_tx, mut msg_rx) = mpsc::channel(8);
        let sender = CommandSender::new_for_test();

        spawn_metrics_polling(7, "abc".to_string(), sender, msg_tx, 1000);

        let first = msg_rx.recv().await.expect("started message");
        match first {
            Message::MetricsPollingStarted {
                view_id,
                shutdown_tx,
                task_handle,
            } => {
                assert_eq!(view_id, 7);
                // The rendezvous slot was filled synchronously at spawn time.
                let task = task_handle.lock().unwrap().take().expect("join handle");
                let _ = shutdown_tx.send(true);
                task.abort();
            }
            other => panic!("expected started message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_polling_stops_on_shutdown_signal() {
        let (msg_tx, mut msg_rx) = mpsc::channel(8);
        let sender = CommandSender::new_for_test();

        spawn_status_polling(3, "abc".to_string(), sender, msg_tx, 60_000);

        let (shutdown_tx, task) = match msg_rx.recv().await.expect("started message") {
            Message::StatusPollingStarted {
                shutdown_tx,
                task_handle,
                ..
            } => (shutdown_tx, task_handle.lock().unwrap().take().unwrap()),
            other => panic!("expected started message, got {:?}", other),
        };

        shutdown_tx.send(true).expect("signal shutdown");
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task exits after shutdown")
            .expect("task does not panic");
    }
}
