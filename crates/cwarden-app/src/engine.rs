//! Engine - shared orchestration state for the control panel runners
//!
//! The Engine owns everything the event loop needs: the TEA state, the
//! message channel, the backend connection with its command sender, and the
//! bridge task that converts backend pushes into messages.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cwarden_core::prelude::*;
use cwarden_core::BackendMessage;
use cwarden_gateway::{BackendConnection, CommandSender};

use crate::actions::handle_action;
use crate::config::Settings;
use crate::message::Message;
use crate::process;
use crate::signals;
use crate::state::AppState;
use crate::UpdateAction;

/// Orchestration engine for Craft Warden.
///
/// Encapsulates the shared wiring between runners:
/// - TEA state management
/// - Message channel
/// - Backend connection and command sender
/// - Push-to-message bridging
/// - Signal handling
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, bridge, runners).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    /// The runner's event loop drains messages from here.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Socket to the backend daemon
    connection: BackendConnection,

    /// Shared command sender for all background calls
    sender: CommandSender,

    /// Task converting backend pushes into messages
    bridge_task: JoinHandle<()>,
}

impl Engine {
    /// Connect to the backend and assemble the engine.
    ///
    /// Performs all shared initialization:
    /// - Creates the message channel (capacity 256)
    /// - Opens the backend socket at `settings.backend.address`
    /// - Spawns the signal handler
    /// - Spawns the push-to-message bridge
    pub async fn connect(settings: Settings) -> Result<Self> {
        let address = settings.backend.address.clone();

        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (event_tx, event_rx) = mpsc::channel::<BackendMessage>(64);

        let connection = BackendConnection::connect(&address, event_tx).await?;
        let sender = connection.command_sender();

        signals::spawn_signal_handler(msg_tx.clone());
        let bridge_task = spawn_event_bridge(event_rx, msg_tx.clone());

        Ok(Self {
            state: AppState::with_settings(settings),
            msg_tx,
            msg_rx,
            connection,
            sender,
            bridge_task,
        })
    }

    /// Kick off the startup fetches: global config and the instance list.
    pub fn bootstrap(&mut self) {
        handle_action(
            UpdateAction::FetchConfig,
            self.msg_tx.clone(),
            self.sender.clone(),
            &self.state.settings,
        );
        self.process_message(Message::RefreshInstances);
    }

    /// Process a single message through the TEA update cycle.
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(&mut self.state, msg, &self.msg_tx, &self.sender);
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Get a clone of the backend command sender.
    pub fn command_sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Address of the backend this engine talks to.
    pub fn backend_address(&self) -> &str {
        self.connection.address()
    }

    /// Initiate shutdown: stop view timers, the bridge, and the connection.
    pub async fn shutdown(&mut self) {
        info!("Shutting down");

        for mut handle in self.state.session_manager.drain_all() {
            handle.stop_all_tasks();
        }

        self.bridge_task.abort();
        self.connection.close().await;
    }
}

/// Convert backend pushes into TEA messages.
///
/// When the event channel closes (backend EOF or connection teardown) the
/// bridge reports `BackendDisconnected` so the update loop can wind down.
fn spawn_event_bridge(
    mut event_rx: mpsc::Receiver<BackendMessage>,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let msg = match event {
                BackendMessage::InstancesChanged => Message::InstancesChanged,
                BackendMessage::InstanceLog(log) => Message::LogLineArrived {
                    instance_id: log.id,
                    line: log.line,
                },
                BackendMessage::ThemeChanged(theme) => Message::ThemeBroadcast { theme },
                BackendMessage::Response { id, .. } => {
                    // Responses are routed to the tracker by the connection;
                    // one arriving here means it had no pending request.
                    debug!("Ignoring stray response #{}", id);
                    continue;
                }
                BackendMessage::UnknownEvent { event, .. } => {
                    debug!("Ignoring unknown backend event '{}'", event);
                    continue;
                }
            };
            if msg_tx.send(msg).await.is_err() {
                return;
            }
        }

        debug!("Event channel closed, reporting disconnect");
        let _ = msg_tx.send(Message::BackendDisconnected).await;
    })
}
