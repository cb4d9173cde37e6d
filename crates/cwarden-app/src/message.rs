//! Message types for the application (TEA pattern)

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use cwarden_core::types::{GlobalConfig, InstanceStatus, InstanceSummary, MetricsPoint, TunnelEndpoint};

use crate::session::ViewId;

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Request to quit (signal handler, window close)
    Quit,

    /// The backend connection dropped; no further pushes will arrive
    BackendDisconnected,

    // ─────────────────────────────────────────────────────────
    // Backend Pushes
    // ─────────────────────────────────────────────────────────
    /// The instance list changed server-side; refetch the summaries
    InstancesChanged,

    /// One console line for a subscribed instance
    LogLineArrived { instance_id: String, line: String },

    /// Theme changed, possibly from another window
    ThemeBroadcast { theme: String },

    // ─────────────────────────────────────────────────────────
    // Dashboard
    // ─────────────────────────────────────────────────────────
    /// Fetch the instance summary list
    RefreshInstances,

    /// Summary fetch succeeded
    InstancesLoaded { instances: Vec<InstanceSummary> },

    /// Summary fetch failed
    InstancesLoadFailed { error: String },

    /// Start an instance (fire-and-forget)
    StartInstance { instance_id: String },

    /// Request a graceful stop (fire-and-forget)
    StopInstance { instance_id: String },

    /// Restart an instance (fire-and-forget)
    RestartInstance { instance_id: String },

    /// Force-kill an instance process (fire-and-forget)
    KillInstance { instance_id: String },

    // ─────────────────────────────────────────────────────────
    // Theme & Global Config
    // ─────────────────────────────────────────────────────────
    /// Persisted configuration fetched at startup
    ConfigLoaded { config: GlobalConfig },

    /// Startup config fetch failed; defaults stay in place
    ConfigLoadFailed { error: String },

    /// User picked a theme; persist it via the backend
    SetTheme { theme: String },

    // ─────────────────────────────────────────────────────────
    // Console Views
    // ─────────────────────────────────────────────────────────
    /// Open (or focus) the console view for an instance
    OpenConsole { instance_id: String },

    /// Close a console view and release everything it owns
    CloseConsole { view_id: ViewId },

    /// Focus the next console view
    NextView,

    /// Focus the previous console view
    PreviousView,

    /// Backlog call came back for a view
    BacklogLoaded { view_id: ViewId, lines: Vec<String> },

    /// Backlog call failed
    BacklogLoadFailed { view_id: ViewId, error: String },

    /// Log subscription registered with the backend
    LogsSubscribed {
        view_id: ViewId,
        instance_id: String,
    },

    /// Log subscription was rejected
    LogsSubscribeFailed { view_id: ViewId, error: String },

    /// One metrics reading arrived for a view
    MetricsSampled { view_id: ViewId, point: MetricsPoint },

    /// A metrics poll failed; the timer keeps running
    MetricsSampleFailed { view_id: ViewId, error: String },

    /// Periodic status refresh came back
    StatusRefreshed { view_id: ViewId, status: InstanceStatus },

    /// A status refresh failed; the timer keeps running
    StatusRefreshFailed { view_id: ViewId, error: String },

    /// Tunnel endpoints fetched for a view
    EndpointsLoaded {
        view_id: ViewId,
        endpoints: Vec<TunnelEndpoint>,
    },

    /// Tunnel endpoint fetch failed
    EndpointsLoadFailed { view_id: ViewId, error: String },

    /// Metrics polling task started; carries its controls.
    ///
    /// `shutdown_tx` is wrapped in `Arc` because `Message` must be `Clone`.
    /// `task_handle` is filled by the spawner right after `tokio::spawn`.
    MetricsPollingStarted {
        view_id: ViewId,
        shutdown_tx: Arc<watch::Sender<bool>>,
        task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    },

    /// Status polling task started; carries its controls
    StatusPollingStarted {
        view_id: ViewId,
        shutdown_tx: Arc<watch::Sender<bool>>,
        task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    },

    // ─────────────────────────────────────────────────────────
    // Console Input
    // ─────────────────────────────────────────────────────────
    /// Console input line edited
    InputChanged { view_id: ViewId, text: String },

    /// Submit the current input line as a server command
    SubmitCommand { view_id: ViewId },

    /// The backend rejected a submitted command
    CommandRejected { view_id: ViewId, error: String },

    /// Recall an older history entry into the input
    HistoryPrevious { view_id: ViewId },

    /// Walk history back toward the draft
    HistoryNext { view_id: ViewId },

    // ─────────────────────────────────────────────────────────
    // Create Wizard
    // ─────────────────────────────────────────────────────────
    /// Open the create-instance dialog
    OpenCreateWizard,

    /// Close the dialog, abandoning any selections
    CloseCreateWizard,

    /// A chain dropdown value was chosen
    WizardFieldSelected { field: usize, value: String },

    /// Name input edited
    WizardNameChanged { name: String },

    /// Jar path input edited (custom software only)
    WizardJarPathChanged { path: String },

    /// Option fetch resolved for a chain field
    WizardOptionsLoaded {
        field: usize,
        generation: u64,
        options: Vec<String>,
    },

    /// Option fetch failed for a chain field
    WizardOptionsLoadFailed {
        field: usize,
        generation: u64,
        error: String,
    },

    /// Submit the wizard
    SubmitCreate,

    /// The backend created the instance
    CreateCompleted,

    /// The create call failed; the dialog stays open
    CreateFailed { error: String },
}
