//! Console view handlers: lifecycle, logs, metrics, status, input

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use cwarden_core::prelude::*;
use cwarden_core::types::{InstanceStatus, MetricsPoint, TunnelEndpoint};

use crate::session::ViewId;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

// ─────────────────────────────────────────────────────────
// View Lifecycle
// ─────────────────────────────────────────────────────────

/// Open a console view for an instance, or focus the one already open.
pub fn handle_open(state: &mut AppState, instance_id: &str) -> UpdateResult {
    let Some(summary) = state.find_instance(instance_id).cloned() else {
        warn!("Cannot open console for unknown instance {}", instance_id);
        return UpdateResult::none();
    };

    if let Some(existing) = state.session_manager.find_by_instance(instance_id) {
        state.session_manager.select_by_id(existing);
        return UpdateResult::none();
    }

    let policy = state.settings.metrics.eviction_policy();
    let view_id = match state.session_manager.open_view(&summary, policy) {
        Ok(id) => id,
        Err(e) => {
            warn!("Failed to open console: {}", e);
            state.instances_error = Some(e.to_string());
            return UpdateResult::none();
        }
    };

    UpdateResult::action(UpdateAction::OpenSession {
        view_id,
        instance_id: summary.id,
        running: summary.running,
    })
}

/// Close a console view.
///
/// The handle leaves the registry first, so a second close (or any late
/// callback) finds nothing and does nothing. Timers are stopped here; the
/// backend-side log subscription is cancelled via the returned action.
pub fn handle_close(state: &mut AppState, view_id: ViewId) -> UpdateResult {
    let Some(mut handle) = state.session_manager.remove_view(view_id) else {
        debug!("Close for view {} which is already gone", view_id);
        return UpdateResult::none();
    };

    handle.stop_all_tasks();

    if handle.session.subscribed {
        UpdateResult::action(UpdateAction::UnsubscribeLogs {
            instance_id: handle.session.instance_id.clone(),
        })
    } else {
        UpdateResult::none()
    }
}

// ─────────────────────────────────────────────────────────
// Logs
// ─────────────────────────────────────────────────────────

pub fn handle_backlog_loaded(
    state: &mut AppState,
    view_id: ViewId,
    lines: Vec<String>,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        debug!("Backlog for closed view {}", view_id);
        return UpdateResult::none();
    };
    handle.session.apply_backlog(lines);
    UpdateResult::none()
}

pub fn handle_backlog_load_failed(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        warn!("Backlog fetch failed for view {}: {}", view_id, error);
        handle
            .session
            .push_notice(format!("Could not load console history: {}", error));
    }
    UpdateResult::none()
}

pub fn handle_logs_subscribed(
    state: &mut AppState,
    view_id: ViewId,
    instance_id: String,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        // View closed while the subscribe call was in flight. Close ran with
        // `subscribed` still false, so the cancellation happens here instead.
        debug!("Subscription confirmed for closed view {}", view_id);
        return UpdateResult::action(UpdateAction::UnsubscribeLogs { instance_id });
    };
    handle.session.subscribed = true;
    UpdateResult::none()
}

pub fn handle_logs_subscribe_failed(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        warn!("Log subscription failed for view {}: {}", view_id, error);
        handle
            .session
            .push_notice(format!("Live log stream unavailable: {}", error));
    }
    UpdateResult::none()
}

/// Route one pushed console line to the view watching its instance.
/// Lines with no open view are dropped.
pub fn handle_log_line(state: &mut AppState, instance_id: &str, line: String) -> UpdateResult {
    let Some(view_id) = state.session_manager.find_by_instance(instance_id) else {
        debug!("Dropping log line for unwatched instance {}", instance_id);
        return UpdateResult::none();
    };
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        handle.session.push_log(line);
    }
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────
// Metrics & Status
// ─────────────────────────────────────────────────────────

pub fn handle_metrics_sampled(
    state: &mut AppState,
    view_id: ViewId,
    point: MetricsPoint,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        debug!("Metrics sample for closed view {}", view_id);
        return UpdateResult::none();
    };
    // A tick can land between the stop transition and the task abort.
    if !handle.session.running {
        debug!("Dropping metrics sample for stopped view {}", view_id);
        return UpdateResult::none();
    }
    handle.session.push_sample(&point);
    UpdateResult::none()
}

pub fn handle_metrics_sample_failed(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        debug!("Metrics poll failed for view {}: {}", view_id, error);
        handle
            .session
            .push_notice(format!("Metrics unavailable: {}", error));
    }
    UpdateResult::none()
}

/// Apply a periodic status reading, driving the running-flag transitions.
pub fn handle_status_refreshed(
    state: &mut AppState,
    view_id: ViewId,
    status: InstanceStatus,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        debug!("Status for closed view {}", view_id);
        return UpdateResult::none();
    };

    handle.session.tunnel_enabled = status.tunnel_enabled;

    let was_running = handle.session.running;
    if was_running && !status.running {
        debug!("View {} instance stopped", view_id);
        handle.session.running = false;
        handle.session.metrics.clear();
        handle.session.endpoints.clear();
        handle.stop_all_tasks();

        // Keep the dashboard row consistent without waiting for a push.
        let instance_id = handle.session.instance_id.clone();
        if let Some(row) = state.instances.iter_mut().find(|i| i.id == instance_id) {
            row.running = false;
        }
        return UpdateResult::none();
    }

    if !was_running && status.running {
        debug!("View {} instance started", view_id);
        handle.session.running = true;
        handle.session.metrics.clear();
        // Replace whatever timers may still exist with a fresh pair.
        handle.stop_all_tasks();
        let instance_id = handle.session.instance_id.clone();
        if let Some(row) = state.instances.iter_mut().find(|i| i.id == instance_id) {
            row.running = true;
        }
        return UpdateResult::action(UpdateAction::StartSessionTimers {
            sessions: vec![(view_id, instance_id)],
        });
    }

    UpdateResult::none()
}

pub fn handle_status_refresh_failed(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    if state.session_manager.get(view_id).is_some() {
        // Transient; the timer keeps running and the next tick may recover.
        debug!("Status refresh failed for view {}: {}", view_id, error);
    }
    UpdateResult::none()
}

pub fn handle_endpoints_loaded(
    state: &mut AppState,
    view_id: ViewId,
    endpoints: Vec<TunnelEndpoint>,
) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        handle.session.endpoints = endpoints;
    }
    UpdateResult::none()
}

pub fn handle_endpoints_load_failed(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    // Stale endpoints stay visible; the next status tick retries anyway.
    debug!("Endpoint fetch failed for view {}: {}", view_id, error);
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────
// Polling Task Registration
// ─────────────────────────────────────────────────────────

/// Store the metrics polling task's controls on its view.
///
/// If the view closed before this message was processed, the freshly started
/// task is shut down on the spot instead of leaking.
pub fn handle_metrics_polling_started(
    state: &mut AppState,
    view_id: ViewId,
    shutdown_tx: Arc<watch::Sender<bool>>,
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        stop_orphan_task(view_id, &shutdown_tx, &task_handle);
        return UpdateResult::none();
    };

    handle.stop_metrics_task();
    handle.metrics_shutdown_tx = Some(shutdown_tx);
    handle.metrics_task = take_task(&task_handle);
    UpdateResult::none()
}

/// Store the status refresh task's controls on its view.
pub fn handle_status_polling_started(
    state: &mut AppState,
    view_id: ViewId,
    shutdown_tx: Arc<watch::Sender<bool>>,
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        stop_orphan_task(view_id, &shutdown_tx, &task_handle);
        return UpdateResult::none();
    };

    handle.stop_status_task();
    handle.status_shutdown_tx = Some(shutdown_tx);
    handle.status_task = take_task(&task_handle);
    UpdateResult::none()
}

fn take_task(task_handle: &Arc<Mutex<Option<JoinHandle<()>>>>) -> Option<JoinHandle<()>> {
    task_handle.lock().ok().and_then(|mut slot| slot.take())
}

fn stop_orphan_task(
    view_id: ViewId,
    shutdown_tx: &Arc<watch::Sender<bool>>,
    task_handle: &Arc<Mutex<Option<JoinHandle<()>>>>,
) {
    debug!("Polling task started for closed view {}, stopping it", view_id);
    let _ = shutdown_tx.send(true);
    if let Some(task) = take_task(task_handle) {
        task.abort();
    }
}

// ─────────────────────────────────────────────────────────
// Console Input
// ─────────────────────────────────────────────────────────

pub fn handle_input_changed(state: &mut AppState, view_id: ViewId, text: String) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        handle.session.input = text;
    }
    UpdateResult::none()
}

/// Submit the input line as a server command.
///
/// Whitespace-only input is ignored entirely. Otherwise the line joins the
/// history, the input clears, and the command goes out.
pub fn handle_submit_command(state: &mut AppState, view_id: ViewId) -> UpdateResult {
    let Some(handle) = state.session_manager.get_mut(view_id) else {
        return UpdateResult::none();
    };

    let text = handle.session.input.clone();
    if !handle.session.history.submit(&text) {
        return UpdateResult::none();
    }
    handle.session.input.clear();

    UpdateResult::action(UpdateAction::SendCommand {
        view_id,
        instance_id: handle.session.instance_id.clone(),
        command: text,
    })
}

pub fn handle_command_rejected(
    state: &mut AppState,
    view_id: ViewId,
    error: String,
) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        warn!("Command rejected for view {}: {}", view_id, error);
        handle
            .session
            .push_notice(format!("Command failed: {}", error));
    }
    UpdateResult::none()
}

pub fn handle_history_previous(state: &mut AppState, view_id: ViewId) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        let current = handle.session.input.clone();
        if let Some(text) = handle.session.history.previous(&current) {
            handle.session.input = text;
        }
    }
    UpdateResult::none()
}

pub fn handle_history_next(state: &mut AppState, view_id: ViewId) -> UpdateResult {
    if let Some(handle) = state.session_manager.get_mut(view_id) {
        if let Some(text) = handle.session.history.next() {
            handle.session.input = text;
        }
    }
    UpdateResult::none()
}
