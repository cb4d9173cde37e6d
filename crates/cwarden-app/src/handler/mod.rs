//! Handler module - TEA update function and message handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `instances`: Summary list and lifecycle commands
//! - `console`: Console view open/close, logs, metrics, status, input
//! - `create`: Create-instance wizard handlers
//! - `theme`: Theme and global config handlers

pub(crate) mod console;
pub(crate) mod create;
pub(crate) mod instances;
pub(crate) mod theme;
pub(crate) mod update;

use cwarden_gateway::BackendCommand;

use crate::message::Message;
use crate::session::ViewId;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Fetch the instance summary list
    FetchInstances,

    /// Fetch the persisted global configuration (startup)
    FetchConfig,

    /// Bring a freshly opened console view online: load the backlog, then
    /// register the log subscription, and start poll timers when running
    OpenSession {
        view_id: ViewId,
        instance_id: String,
        running: bool,
    },

    /// Cancel the backend-side log subscription for an instance
    UnsubscribeLogs { instance_id: String },

    /// Start the poll timers for views whose instance became running.
    /// Contains (view_id, instance_id) pairs.
    StartSessionTimers { sessions: Vec<(ViewId, String)> },

    /// Send a lifecycle command (fire-and-forget)
    Lifecycle {
        instance_id: String,
        op: LifecycleOp,
    },

    /// Submit one console command line
    SendCommand {
        view_id: ViewId,
        instance_id: String,
        command: String,
    },

    /// Fetch option lists for wizard chain fields.
    /// Contains (field index, generation, backend call) triples.
    FetchWizardOptions {
        fetches: Vec<(usize, u64, BackendCommand)>,
    },

    /// Create an instance from the wizard selections
    CreateInstance { command: BackendCommand },

    /// Persist a theme choice via the backend
    PersistTheme { theme: String },
}

/// Process-control verb for one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start,
    Stop,
    Restart,
    Kill,
}

impl LifecycleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Start => "start",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Restart => "restart",
            LifecycleOp::Kill => "kill",
        }
    }
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
