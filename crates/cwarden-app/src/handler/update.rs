//! Main update function - the TEA reducer

use cwarden_core::prelude::*;

use crate::message::Message;
use crate::state::AppState;

use super::{console, create, instances, theme, UpdateResult};

/// Process a message and return the next step.
///
/// Pure state transition: all I/O happens in the actions layer, driven by the
/// returned `UpdateResult`.
pub fn update(state: &mut AppState, msg: Message) -> UpdateResult {
    match msg {
        Message::Quit => {
            state.request_quit();
            UpdateResult::none()
        }

        Message::BackendDisconnected => handle_backend_disconnected(state),

        // Backend pushes
        Message::InstancesChanged => UpdateResult::message(Message::RefreshInstances),
        Message::LogLineArrived { instance_id, line } => {
            console::handle_log_line(state, &instance_id, line)
        }
        Message::ThemeBroadcast { theme } => theme::handle_theme_broadcast(state, theme),

        // Dashboard
        Message::RefreshInstances => instances::handle_refresh(state),
        Message::InstancesLoaded { instances } => instances::handle_loaded(state, instances),
        Message::InstancesLoadFailed { error } => instances::handle_load_failed(state, error),
        Message::StartInstance { instance_id } => {
            instances::handle_lifecycle(state, instance_id, super::LifecycleOp::Start)
        }
        Message::StopInstance { instance_id } => {
            instances::handle_lifecycle(state, instance_id, super::LifecycleOp::Stop)
        }
        Message::RestartInstance { instance_id } => {
            instances::handle_lifecycle(state, instance_id, super::LifecycleOp::Restart)
        }
        Message::KillInstance { instance_id } => {
            instances::handle_lifecycle(state, instance_id, super::LifecycleOp::Kill)
        }

        // Theme & global config
        Message::ConfigLoaded { config } => theme::handle_config_loaded(state, config),
        Message::ConfigLoadFailed { error } => theme::handle_config_load_failed(state, error),
        Message::SetTheme { theme } => theme::handle_set_theme(state, theme),

        // Console views
        Message::OpenConsole { instance_id } => console::handle_open(state, &instance_id),
        Message::CloseConsole { view_id } => console::handle_close(state, view_id),
        Message::NextView => {
            state.session_manager.select_next();
            UpdateResult::none()
        }
        Message::PreviousView => {
            state.session_manager.select_previous();
            UpdateResult::none()
        }
        Message::BacklogLoaded { view_id, lines } => {
            console::handle_backlog_loaded(state, view_id, lines)
        }
        Message::BacklogLoadFailed { view_id, error } => {
            console::handle_backlog_load_failed(state, view_id, error)
        }
        Message::LogsSubscribed {
            view_id,
            instance_id,
        } => console::handle_logs_subscribed(state, view_id, instance_id),
        Message::LogsSubscribeFailed { view_id, error } => {
            console::handle_logs_subscribe_failed(state, view_id, error)
        }
        Message::MetricsSampled { view_id, point } => {
            console::handle_metrics_sampled(state, view_id, point)
        }
        Message::MetricsSampleFailed { view_id, error } => {
            console::handle_metrics_sample_failed(state, view_id, error)
        }
        Message::StatusRefreshed { view_id, status } => {
            console::handle_status_refreshed(state, view_id, status)
        }
        Message::StatusRefreshFailed { view_id, error } => {
            console::handle_status_refresh_failed(state, view_id, error)
        }
        Message::EndpointsLoaded { view_id, endpoints } => {
            console::handle_endpoints_loaded(state, view_id, endpoints)
        }
        Message::EndpointsLoadFailed { view_id, error } => {
            console::handle_endpoints_load_failed(state, view_id, error)
        }
        Message::MetricsPollingStarted {
            view_id,
            shutdown_tx,
            task_handle,
        } => console::handle_metrics_polling_started(state, view_id, shutdown_tx, task_handle),
        Message::StatusPollingStarted {
            view_id,
            shutdown_tx,
            task_handle,
        } => console::handle_status_polling_started(state, view_id, shutdown_tx, task_handle),

        // Console input
        Message::InputChanged { view_id, text } => {
            console::handle_input_changed(state, view_id, text)
        }
        Message::SubmitCommand { view_id } => console::handle_submit_command(state, view_id),
        Message::CommandRejected { view_id, error } => {
            console::handle_command_rejected(state, view_id, error)
        }
        Message::HistoryPrevious { view_id } => console::handle_history_previous(state, view_id),
        Message::HistoryNext { view_id } => console::handle_history_next(state, view_id),

        // Create wizard
        Message::OpenCreateWizard => create::handle_open(state),
        Message::CloseCreateWizard => create::handle_close(state),
        Message::WizardFieldSelected { field, value } => {
            create::handle_field_selected(state, field, value)
        }
        Message::WizardNameChanged { name } => create::handle_name_changed(state, name),
        Message::WizardJarPathChanged { path } => create::handle_jar_path_changed(state, path),
        Message::WizardOptionsLoaded {
            field,
            generation,
            options,
        } => create::handle_options_loaded(state, field, generation, options),
        Message::WizardOptionsLoadFailed {
            field,
            generation,
            error,
        } => create::handle_options_load_failed(state, field, generation, error),
        Message::SubmitCreate => create::handle_submit(state),
        Message::CreateCompleted => create::handle_completed(state),
        Message::CreateFailed { error } => create::handle_failed(state, error),
    }
}

/// The reader task saw EOF; nothing more will arrive and nothing can be sent.
///
/// Every polling task is stopped and the application winds down. Reconnecting
/// is a restart, not a runtime transition.
fn handle_backend_disconnected(state: &mut AppState) -> UpdateResult {
    warn!("Backend connection lost, shutting down");
    state.connected = false;
    for handle in state.session_manager.handles_mut() {
        handle.stop_all_tasks();
    }
    state.request_quit();
    UpdateResult::none()
}
