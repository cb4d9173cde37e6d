//! Action handlers: UpdateAction dispatch and background task spawning

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::message::Message;
use crate::UpdateAction;
use cwarden_gateway::CommandSender;

pub(super) mod fetch;
pub(super) mod polling;

/// Execute an action by spawning background tasks.
///
/// Called from the event loop after `update()` returns an action. All tasks
/// are detached; they communicate with the TEA layer exclusively through
/// `msg_tx`, and the ones the views must be able to stop (the poll timers)
/// send their controls back in a `...Started` message.
pub fn handle_action(
    action: UpdateAction,
    msg_tx: mpsc::Sender<Message>,
    sender: CommandSender,
    settings: &Settings,
) {
    match action {
        UpdateAction::FetchInstances => {
            fetch::spawn_instances_fetch(sender, msg_tx);
        }

        UpdateAction::FetchConfig => {
            fetch::spawn_config_fetch(sender, msg_tx);
        }

        UpdateAction::OpenSession {
            view_id,
            instance_id,
            running,
        } => {
            fetch::spawn_session_open(view_id, instance_id.clone(), sender.clone(), msg_tx.clone());
            // Poll timers only exist while the instance runs. For a stopped
            // instance they start later, from the running transition.
            if running {
                polling::spawn_metrics_polling(
                    view_id,
                    instance_id.clone(),
                    sender.clone(),
                    msg_tx.clone(),
                    settings.polling.metrics_interval_ms,
                );
                polling::spawn_status_polling(
                    view_id,
                    instance_id,
                    sender,
                    msg_tx,
                    settings.polling.status_interval_ms,
                );
            }
        }

        UpdateAction::UnsubscribeLogs { instance_id } => {
            fetch::spawn_unsubscribe(instance_id, sender);
        }

        UpdateAction::StartSessionTimers { sessions } => {
            for (view_id, instance_id) in sessions {
                polling::spawn_metrics_polling(
                    view_id,
                    instance_id.clone(),
                    sender.clone(),
                    msg_tx.clone(),
                    settings.polling.metrics_interval_ms,
                );
                polling::spawn_status_polling(
                    view_id,
                    instance_id,
                    sender.clone(),
                    msg_tx.clone(),
                    settings.polling.status_interval_ms,
                );
            }
        }

        UpdateAction::Lifecycle { instance_id, op } => {
            fetch::spawn_lifecycle(instance_id, op, sender);
        }

        UpdateAction::SendCommand {
            view_id,
            instance_id,
            command,
        } => {
            fetch::spawn_send_command(view_id, instance_id, command, sender, msg_tx);
        }

        UpdateAction::FetchWizardOptions { fetches } => {
            for (field, generation, command) in fetches {
                fetch::spawn_options_fetch(
                    field,
                    generation,
                    command,
                    sender.clone(),
                    msg_tx.clone(),
                );
            }
        }

        UpdateAction::CreateInstance { command } => {
            fetch::spawn_create(command, sender, msg_tx);
        }

        UpdateAction::PersistTheme { theme } => {
            fetch::spawn_set_theme(theme, sender);
        }
    }
}
