//! Message processing: the TEA update loop plus action dispatch

use tokio::sync::mpsc;

use crate::handler;
use crate::message::Message;
use crate::state::AppState;
use cwarden_gateway::CommandSender;

use super::actions::handle_action;

/// Process one message through the TEA update function.
///
/// Follow-up messages returned by `update()` are processed in the same call,
/// so a push like `InstancesChanged` flows straight into the refresh it
/// triggers. Actions are dispatched to the background task spawners as they
/// appear, in the order the updates produced them.
pub fn process_message(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    sender: &CommandSender,
) {
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone(), sender.clone(), &state.settings);
        }

        msg = result.message;
    }
}
