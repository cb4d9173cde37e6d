//! One-shot backend calls spawned from the action dispatcher.
//!
//! Every helper here follows the same shape: spawn a detached task, make the
//! call through [`CommandSender`], and report the outcome back to the TEA
//! layer as a message. Helpers never touch `AppState` directly; stale results
//! are filtered by the handlers, not here.

use std::time::Duration;

use tokio::sync::mpsc;

use cwarden_core::prelude::*;
use cwarden_core::types::{GlobalConfig, InstanceStatus, InstanceSummary};
use cwarden_gateway::{BackendCommand, CommandResponse, CommandSender};

use crate::handler::LifecycleOp;
use crate::message::Message;
use crate::session::ViewId;

/// Creation downloads the server jar before answering. Allow minutes.
pub(super) const CREATE_TIMEOUT_SECS: u64 = 300;

/// Fetch the instance summary list for the dashboard.
///
/// Sends `InstancesLoaded` on success, `InstancesLoadFailed` on call failure
/// or a malformed payload.
pub(super) fn spawn_instances_fetch(sender: CommandSender, msg_tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match sender.call(BackendCommand::ListInstances).await {
            Ok(value) => match serde_json::from_value::<Vec<InstanceSummary>>(value) {
                Ok(instances) => {
                    let _ = msg_tx.send(Message::InstancesLoaded { instances }).await;
                }
                Err(e) => {
                    let _ = msg_tx
                        .send(Message::InstancesLoadFailed {
                            error: format!("Malformed instance list: {e}"),
                        })
                        .await;
                }
            },
            Err(e) => {
                let _ = msg_tx
                    .send(Message::InstancesLoadFailed {
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    });
}

/// Fetch the persisted global configuration at startup.
pub(super) fn spawn_config_fetch(sender: CommandSender, msg_tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match sender.call(BackendCommand::GetConfig).await {
            Ok(value) => match serde_json::from_value::<GlobalConfig>(value) {
                Ok(config) => {
                    let _ = msg_tx.send(Message::ConfigLoaded { config }).await;
                }
                Err(e) => {
                    let _ = msg_tx
                        .send(Message::ConfigLoadFailed {
                            error: format!("Malformed config payload: {e}"),
                        })
                        .await;
                }
            },
            Err(e) => {
                let _ = msg_tx
                    .send(Message::ConfigLoadFailed {
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    });
}

/// Bring a freshly opened console view online.
///
/// One task runs the steps in order: fetch the backlog, register the log
/// subscription, then refresh the instance status once. Because the
/// subscription is only issued after the backlog message has been enqueued,
/// no live line can precede the backlog in the message channel. The trailing
/// status refresh keeps the running and tunnel flags current even for views
/// that open without a status timer.
///
/// A failed backlog fetch still proceeds to the subscription step so the
/// view at least receives live lines.
pub(super) fn spawn_session_open(
    view_id: ViewId,
    instance_id: String,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        let backlog = sender
            .call(BackendCommand::GetInstanceLogs {
                id: instance_id.clone(),
            })
            .await;
        let backlog_msg = match backlog {
            Ok(value) => match serde_json::from_value::<Vec<String>>(value) {
                Ok(lines) => Message::BacklogLoaded { view_id, lines },
                Err(e) => Message::BacklogLoadFailed {
                    view_id,
                    error: format!("Malformed backlog payload: {e}"),
                },
            },
            Err(e) => Message::BacklogLoadFailed {
                view_id,
                error: e.to_string(),
            },
        };
        if msg_tx.send(backlog_msg).await.is_err() {
            return;
        }

        match sender
            .call(BackendCommand::SubscribeLogs {
                id: instance_id.clone(),
            })
            .await
        {
            Ok(_) => {
                let _ = msg_tx
                    .send(Message::LogsSubscribed {
                        view_id,
                        instance_id: instance_id.clone(),
                    })
                    .await;
            }
            Err(e) => {
                let _ = msg_tx
                    .send(Message::LogsSubscribeFailed {
                        view_id,
                        error: e.to_string(),
                    })
                    .await;
            }
        }

        match sender
            .call(BackendCommand::GetInstanceInfo { id: instance_id })
            .await
        {
            Ok(value) => match serde_json::from_value::<InstanceStatus>(value) {
                Ok(status) => {
                    let _ = msg_tx.send(Message::StatusRefreshed { view_id, status }).await;
                }
                Err(e) => {
                    debug!("Malformed status payload for view {}: {}", view_id, e);
                }
            },
            Err(e) => {
                let _ = msg_tx
                    .send(Message::StatusRefreshFailed {
                        view_id,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    });
}

/// Cancel the backend-side log subscription for a closed view.
///
/// Fire-and-forget: the view is already gone, so there is nobody to tell
/// about a failure. A missed unsubscribe only costs the backend some pushes
/// that the handlers will drop anyway.
pub(super) fn spawn_unsubscribe(instance_id: String, sender: CommandSender) {
    tokio::spawn(async move {
        if let Err(e) = sender
            .send_fire_and_forget(BackendCommand::UnsubscribeLogs {
                id: instance_id.clone(),
            })
            .await
        {
            debug!("Unsubscribe for {} not delivered: {}", instance_id, e);
        }
    });
}

/// Send a process-control verb for an instance.
///
/// No follow-up message: the resulting state change arrives as an
/// instances-updated push, which refreshes the dashboard. Remote refusals
/// are only logged.
pub(super) fn spawn_lifecycle(instance_id: String, op: LifecycleOp, sender: CommandSender) {
    tokio::spawn(async move {
        let command = match op {
            LifecycleOp::Start => BackendCommand::StartInstance {
                id: instance_id.clone(),
            },
            LifecycleOp::Stop => BackendCommand::StopInstance {
                id: instance_id.clone(),
            },
            LifecycleOp::Restart => BackendCommand::RestartInstance {
                id: instance_id.clone(),
            },
            LifecycleOp::Kill => BackendCommand::KillInstance {
                id: instance_id.clone(),
            },
        };
        if let Err(e) = sender.call(command).await {
            warn!("{} for instance {} failed: {}", op.as_str(), instance_id, e);
        }
    });
}

/// Submit one console command line to a running instance.
///
/// Success produces no message; the command's output comes back through the
/// log subscription. Failure is reported so the view can post a notice.
pub(super) fn spawn_send_command(
    view_id: ViewId,
    instance_id: String,
    command: String,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        if let Err(e) = sender
            .call(BackendCommand::SendCommand {
                id: instance_id,
                command,
            })
            .await
        {
            let _ = msg_tx
                .send(Message::CommandRejected {
                    view_id,
                    error: e.to_string(),
                })
                .await;
        }
    });
}

/// Fetch one option list for a wizard chain field.
///
/// The generation stamp travels out and back unchanged; the wizard handler
/// uses it to discard resolutions for selections that have since changed.
pub(super) fn spawn_options_fetch(
    field: usize,
    generation: u64,
    command: BackendCommand,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        match sender.call(command).await {
            Ok(value) => match serde_json::from_value::<Vec<String>>(value) {
                Ok(options) => {
                    let _ = msg_tx
                        .send(Message::WizardOptionsLoaded {
                            field,
                            generation,
                            options,
                        })
                        .await;
                }
                Err(e) => {
                    let _ = msg_tx
                        .send(Message::WizardOptionsLoadFailed {
                            field,
                            generation,
                            error: format!("Malformed version list: {e}"),
                        })
                        .await;
                }
            },
            Err(e) => {
                let _ = msg_tx
                    .send(Message::WizardOptionsLoadFailed {
                        field,
                        generation,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    });
}

/// Create an instance from the wizard selections.
///
/// Uses a long timeout ([`CREATE_TIMEOUT_SECS`]) because the backend
/// downloads the server jar before acknowledging.
pub(super) fn spawn_create(
    command: BackendCommand,
    sender: CommandSender,
    msg_tx: mpsc::Sender<Message>,
) {
    tokio::spawn(async move {
        let result = sender
            .send_with_timeout(command, Duration::from_secs(CREATE_TIMEOUT_SECS))
            .await
            .and_then(CommandResponse::into_result);
        match result {
            Ok(_) => {
                let _ = msg_tx.send(Message::CreateCompleted).await;
            }
            Err(e) => {
                let _ = msg_tx
                    .send(Message::CreateFailed {
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    });
}

/// Persist a theme choice via the backend.
///
/// The local theme was already applied optimistically; other windows learn
/// about the change from the resulting broadcast. Failures are only logged.
pub(super) fn spawn_set_theme(theme: String, sender: CommandSender) {
    tokio::spawn(async move {
        if let Err(e) = sender
            .call(BackendCommand::SetTheme {
                theme: theme.clone(),
            })
            .await
        {
            warn!("Theme '{}' was not persisted: {}", theme, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Read the next outgoing frame, answer it through the tracker, and
    /// return the frame's method name.
    async fn answer_next(
        sender: &CommandSender,
        wire: &mut mpsc::Receiver<String>,
        result: serde_json::Value,
    ) -> String {
        let frame = wire.recv().await.expect("outgoing frame");
        let parsed: serde_json::Value = serde_json::from_str(&frame).expect("frame is JSON");
        let id = parsed["id"].as_u64().expect("frame has id");
        let matched = sender
            .tracker()
            .handle_response(id, Some(result), None)
            .await;
        assert!(matched, "response should match a pending request");
        parsed["method"].as_str().expect("frame has method").to_string()
    }

    #[tokio::test]
    async fn test_session_open_loads_backlog_before_subscribing() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        spawn_session_open(4, "abc".to_string(), sender.clone(), msg_tx);

        let method = answer_next(&sender, &mut wire, json!(["one", "two"])).await;
        assert_eq!(method, "get_instance_logs");
        match msg_rx.recv().await.expect("backlog message") {
            Message::BacklogLoaded { view_id, lines } => {
                assert_eq!(view_id, 4);
                assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
            }
            other => panic!("expected backlog first, got {:?}", other),
        }

        let method = answer_next(&sender, &mut wire, json!(null)).await;
        assert_eq!(method, "subscribe_instance_logs");
        match msg_rx.recv().await.expect("subscribed message") {
            Message::LogsSubscribed {
                view_id,
                instance_id,
            } => {
                assert_eq!(view_id, 4);
                assert_eq!(instance_id, "abc");
            }
            other => panic!("expected subscription confirmation, got {:?}", other),
        }

        let method = answer_next(
            &sender,
            &mut wire,
            json!({"running": true, "tunnel_enabled": false}),
        )
        .await;
        assert_eq!(method, "get_instance_info");
        match msg_rx.recv().await.expect("status message") {
            Message::StatusRefreshed { view_id, status } => {
                assert_eq!(view_id, 4);
                assert!(status.running);
            }
            other => panic!("expected status refresh, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_session_open_subscribes_even_after_backlog_failure() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        spawn_session_open(9, "abc".to_string(), sender.clone(), msg_tx);

        // Backlog comes back as a non-array payload.
        let method = answer_next(&sender, &mut wire, json!(42)).await;
        assert_eq!(method, "get_instance_logs");
        assert!(matches!(
            msg_rx.recv().await,
            Some(Message::BacklogLoadFailed { view_id: 9, .. })
        ));

        let method = answer_next(&sender, &mut wire, json!(null)).await;
        assert_eq!(method, "subscribe_instance_logs");
        assert!(matches!(
            msg_rx.recv().await,
            Some(Message::LogsSubscribed { view_id: 9, .. })
        ));
    }

    #[tokio::test]
    async fn test_instances_fetch_reports_malformed_payload() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        spawn_instances_fetch(sender.clone(), msg_tx);

        let method = answer_next(&sender, &mut wire, json!({"not": "a list"})).await;
        assert_eq!(method, "list_instances");
        assert!(matches!(
            msg_rx.recv().await,
            Some(Message::InstancesLoadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_options_fetch_carries_the_generation_stamp() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        spawn_options_fetch(
            1,
            7,
            BackendCommand::VanillaVersions,
            sender.clone(),
            msg_tx,
        );

        let method = answer_next(&sender, &mut wire, json!(["1.21.4", "1.21.3"])).await;
        assert_eq!(method, "get_vanilla_versions");
        match msg_rx.recv().await.expect("options message") {
            Message::WizardOptionsLoaded {
                field,
                generation,
                options,
            } => {
                assert_eq!(field, 1);
                assert_eq!(generation, 7);
                assert_eq!(options, vec!["1.21.4".to_string(), "1.21.3".to_string()]);
            }
            other => panic!("expected options, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_command_failure_reports_rejection() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        spawn_send_command(
            2,
            "abc".to_string(),
            "whitelist add steve".to_string(),
            sender.clone(),
            msg_tx,
        );

        let frame = wire.recv().await.expect("outgoing frame");
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["method"], "send_instance_command");
        assert_eq!(parsed["params"]["command"], "whitelist add steve");
        let id = parsed["id"].as_u64().unwrap();
        sender
            .tracker()
            .handle_response(id, None, Some(json!("instance is not running")))
            .await;

        match msg_rx.recv().await.expect("rejection message") {
            Message::CommandRejected { view_id, error } => {
                assert_eq!(view_id, 2);
                assert!(error.contains("instance is not running"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_ops_map_to_backend_methods() {
        let cases = [
            (LifecycleOp::Start, "start_instance"),
            (LifecycleOp::Stop, "stop_instance"),
            (LifecycleOp::Restart, "restart_instance"),
            (LifecycleOp::Kill, "kill_instance"),
        ];
        for (op, expected_method) in cases {
            let (sender, mut wire) = CommandSender::new_for_test_with_wire();
            spawn_lifecycle("abc".to_string(), op, sender.clone());
            let method = answer_next(&sender, &mut wire, json!(null)).await;
            assert_eq!(method, expected_method);
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_is_untracked() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();

        spawn_unsubscribe("abc".to_string(), sender.clone());

        let frame = wire.recv().await.expect("outgoing frame");
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["method"], "unsubscribe_instance_logs");
        assert_eq!(sender.tracker().pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_reports_backend_error() {
        let (sender, mut wire) = CommandSender::new_for_test_with_wire();
        let (msg_tx, mut msg_rx) = mpsc::channel(8);

        let command = BackendCommand::CreateInstance {
            name: "smp".to_string(),
            software: "paper".to_string(),
            version: "1.21.4".to_string(),
            loader: None,
            custom_jar_path: None,
        };
        spawn_create(command, sender.clone(), msg_tx);

        let frame = wire.recv().await.expect("outgoing frame");
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["method"], "create_instance");
        let id = parsed["id"].as_u64().unwrap();
        sender
            .tracker()
            .handle_response(id, None, Some(json!("name already taken")))
            .await;

        match msg_rx.recv().await.expect("failure message") {
            Message::CreateFailed { error } => assert!(error.contains("name already taken")),
            other => panic!("expected create failure, got {:?}", other),
        }
    }
}
