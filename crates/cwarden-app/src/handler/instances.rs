//! Instance summary list and lifecycle command handlers

use cwarden_core::prelude::*;
use cwarden_core::types::InstanceSummary;

use crate::state::AppState;

use super::{LifecycleOp, UpdateAction, UpdateResult};

/// Kick off a summary fetch unless one is already in flight.
pub fn handle_refresh(state: &mut AppState) -> UpdateResult {
    if state.instances_loading {
        return UpdateResult::none();
    }
    state.instances_loading = true;
    UpdateResult::action(UpdateAction::FetchInstances)
}

/// Store fresh summaries and reconcile every open console view with them.
pub fn handle_loaded(state: &mut AppState, instances: Vec<InstanceSummary>) -> UpdateResult {
    state.instances_loading = false;
    state.instances_error = None;

    let starts = sync_sessions(state, &instances);
    state.instances = instances;

    if starts.is_empty() {
        UpdateResult::none()
    } else {
        UpdateResult::action(UpdateAction::StartSessionTimers { sessions: starts })
    }
}

pub fn handle_load_failed(state: &mut AppState, error: String) -> UpdateResult {
    warn!("Instance list fetch failed: {}", error);
    state.instances_loading = false;
    state.instances_error = Some(error);
    UpdateResult::none()
}

/// Route a lifecycle verb to the backend.
///
/// Fire-and-forget: the resulting state change comes back as an
/// `instances-updated` push, not as a response.
pub fn handle_lifecycle(
    state: &mut AppState,
    instance_id: String,
    op: LifecycleOp,
) -> UpdateResult {
    if state.find_instance(&instance_id).is_none() {
        warn!("Ignoring {} for unknown instance {}", op.as_str(), instance_id);
        return UpdateResult::none();
    }
    UpdateResult::action(UpdateAction::Lifecycle { instance_id, op })
}

/// Apply fresh summary rows to the open sessions.
///
/// Views whose instance stopped lose their timers and sample window here,
/// synchronously. Views whose instance started are collected for the caller
/// to start timers for. A view whose instance vanished is treated as stopped.
fn sync_sessions(
    state: &mut AppState,
    instances: &[InstanceSummary],
) -> Vec<(crate::session::ViewId, String)> {
    let mut starts = Vec::new();

    for handle in state.session_manager.handles_mut() {
        let session = &mut handle.session;
        let row = instances.iter().find(|i| i.id == session.instance_id);

        match row {
            Some(row) => {
                session.instance_name = row.name.clone();
                session.tunnel_enabled = row.tunnel_enabled;

                if session.running && !row.running {
                    debug!("Instance {} stopped, tearing down timers", row.id);
                    session.running = false;
                    session.metrics.clear();
                    session.endpoints.clear();
                    handle.stop_all_tasks();
                } else if !session.running && row.running {
                    debug!("Instance {} started, scheduling timers", row.id);
                    session.running = true;
                    session.metrics.clear();
                    starts.push((session.view_id, session.instance_id.clone()));
                }
            }
            None => {
                if session.running || handle.has_metrics_task() || handle.has_status_task() {
                    warn!(
                        "Instance {} disappeared from the summary list",
                        handle.session.instance_id
                    );
                    handle.session.running = false;
                    handle.session.metrics.clear();
                    handle.session.endpoints.clear();
                    handle.session.push_notice("Instance no longer exists");
                    handle.stop_all_tasks();
                }
            }
        }
    }

    starts
}
