//! Command building and request tracking for backend communication
//!
//! This module provides:
//! - Request ID tracking for matching responses
//! - Command building for the line-delimited JSON request format
//! - Timeout handling for stalled calls

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, RwLock};

use cwarden_core::prelude::*;

/// Global request ID counter
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID
pub fn next_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A pending request awaiting response
struct PendingRequest {
    /// Channel to send the response
    response_tx: oneshot::Sender<CommandResponse>,
    /// When this request was created
    created_at: Instant,
    /// Description for logging
    #[allow(dead_code)]
    description: String,
}

/// Response from a command
#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub id: u64,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn from_backend_response(id: u64, result: Option<Value>, error: Option<Value>) -> Self {
        Self {
            id,
            success: error.is_none(),
            result,
            error: error.map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }
    }

    /// Create a success response
    pub fn success(id: u64, result: Option<Value>) -> Self {
        Self {
            id,
            success: true,
            result,
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Convert into the call result, mapping a backend-reported failure
    /// to [`Error::Remote`]
    pub fn into_result(self) -> Result<Value> {
        if self.success {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(Error::remote(
                self.error.unwrap_or_else(|| "unknown backend error".to_string()),
            ))
        }
    }
}

/// Tracks pending requests and matches responses
pub struct RequestTracker {
    /// Map of request ID to pending request
    pending: Arc<RwLock<HashMap<u64, PendingRequest>>>,
    /// Default timeout for requests
    #[allow(dead_code)]
    default_timeout: Duration,
}

impl RequestTracker {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            default_timeout,
        }
    }

    /// Register a new pending request
    /// Returns (request_id, receiver for response)
    pub async fn register(&self, description: &str) -> (u64, oneshot::Receiver<CommandResponse>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();

        let pending = PendingRequest {
            response_tx: tx,
            created_at: Instant::now(),
            description: description.to_string(),
        };

        self.pending.write().await.insert(id, pending);

        (id, rx)
    }

    /// Handle an incoming response from the backend
    /// Returns true if the response was matched to a pending request
    pub async fn handle_response(
        &self,
        id: u64,
        result: Option<Value>,
        error: Option<Value>,
    ) -> bool {
        if let Some(pending) = self.pending.write().await.remove(&id) {
            let response = CommandResponse::from_backend_response(id, result, error);
            let _ = pending.response_tx.send(response);
            true
        } else {
            false
        }
    }

    /// Cancel all pending requests (e.g., on disconnect)
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.write().await;
        for (id, req) in pending.drain() {
            let _ = req.response_tx.send(CommandResponse {
                id,
                success: false,
                result: None,
                error: Some("Request cancelled".to_string()),
            });
        }
    }

    /// Remove stale requests that have timed out
    pub async fn cleanup_stale(&self, timeout: Duration) -> Vec<u64> {
        let mut pending = self.pending.write().await;
        let now = Instant::now();

        let stale: Vec<u64> = pending
            .iter()
            .filter(|(_, req)| now.duration_since(req.created_at) > timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(req) = pending.remove(id) {
                let _ = req.response_tx.send(CommandResponse {
                    id: *id,
                    success: false,
                    result: None,
                    error: Some("Request timed out".to_string()),
                });
            }
        }

        stale
    }

    /// Get the number of pending requests
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

/// Backend command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// List all configured instances
    ListInstances,
    /// Get running/tunnel state for one instance
    GetInstanceInfo { id: String },
    /// Get the full console backlog for one instance
    GetInstanceLogs { id: String },
    /// Get the current resource reading for one instance
    GetInstanceMetrics { id: String },
    /// Get public tunnel endpoints for one instance
    GetTunnelEndpoints { id: String },
    /// Get the persisted global configuration
    GetConfig,
    /// Start an instance
    StartInstance { id: String },
    /// Request a graceful stop
    StopInstance { id: String },
    /// Restart an instance
    RestartInstance { id: String },
    /// Force-kill an instance process
    KillInstance { id: String },
    /// Submit one console command line to an instance
    SendCommand { id: String, command: String },
    /// Create a new instance from the wizard selections
    CreateInstance {
        name: String,
        software: String,
        version: String,
        loader: Option<String>,
        custom_jar_path: Option<String>,
    },
    /// Start receiving `instance-log` events for an instance
    SubscribeLogs { id: String },
    /// Stop receiving `instance-log` events for an instance
    UnsubscribeLogs { id: String },
    /// Persist a new theme (backend broadcasts `theme-changed`)
    SetTheme { theme: String },
    /// Available vanilla versions
    VanillaVersions,
    /// Available Paper versions
    PaperVersions,
    /// Available Purpur versions
    PurpurVersions,
    /// Game versions supported by Fabric
    FabricGameVersions,
    /// Fabric loader versions
    FabricLoaderVersions,
    /// Game versions with a Forge build
    ForgeMcVersions,
    /// Forge builds for one game version
    ForgeVersions { mc_version: String },
    /// Game versions with a NeoForge build
    NeoforgeMcVersions,
    /// NeoForge builds for one game version
    NeoforgeVersions { mc_version: String },
}

impl BackendCommand {
    /// Build the JSON request line
    pub fn build(&self, id: u64) -> String {
        let (method, params) = match self {
            BackendCommand::ListInstances => ("list_instances", json!({})),
            BackendCommand::GetInstanceInfo { id } => ("get_instance_info", json!({ "id": id })),
            BackendCommand::GetInstanceLogs { id } => ("get_instance_logs", json!({ "id": id })),
            BackendCommand::GetInstanceMetrics { id } => {
                ("get_instance_metrics", json!({ "id": id }))
            }
            BackendCommand::GetTunnelEndpoints { id } => {
                ("get_tunnel_endpoints", json!({ "id": id }))
            }
            BackendCommand::GetConfig => ("get_config", json!({})),
            BackendCommand::StartInstance { id } => ("start_instance", json!({ "id": id })),
            BackendCommand::StopInstance { id } => ("stop_instance", json!({ "id": id })),
            BackendCommand::RestartInstance { id } => ("restart_instance", json!({ "id": id })),
            BackendCommand::KillInstance { id } => ("kill_instance", json!({ "id": id })),
            BackendCommand::SendCommand { id, command } => (
                "send_instance_command",
                json!({ "id": id, "command": command }),
            ),
            BackendCommand::CreateInstance {
                name,
                software,
                version,
                loader,
                custom_jar_path,
            } => (
                "create_instance",
                json!({
                    "name": name,
                    "software": software,
                    "version": version,
                    "loader": loader,
                    "custom_jar_path": custom_jar_path,
                }),
            ),
            BackendCommand::SubscribeLogs { id } => ("subscribe_instance_logs", json!({ "id": id })),
            BackendCommand::UnsubscribeLogs { id } => {
                ("unsubscribe_instance_logs", json!({ "id": id }))
            }
            BackendCommand::SetTheme { theme } => ("set_theme", json!({ "theme": theme })),
            BackendCommand::VanillaVersions => ("get_vanilla_versions", json!({})),
            BackendCommand::PaperVersions => ("get_paper_versions", json!({})),
            BackendCommand::PurpurVersions => ("get_purpur_versions", json!({})),
            BackendCommand::FabricGameVersions => ("get_fabric_game_versions", json!({})),
            BackendCommand::FabricLoaderVersions => ("get_fabric_loader_versions", json!({})),
            BackendCommand::ForgeMcVersions => ("get_forge_mc_versions", json!({})),
            BackendCommand::ForgeVersions { mc_version } => {
                ("get_forge_versions", json!({ "mc_version": mc_version }))
            }
            BackendCommand::NeoforgeMcVersions => ("get_neoforge_mc_versions", json!({})),
            BackendCommand::NeoforgeVersions { mc_version } => {
                ("get_neoforge_versions", json!({ "mc_version": mc_version }))
            }
        };

        json!({
            "id": id,
            "method": method,
            "params": params,
        })
        .to_string()
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            BackendCommand::ListInstances => "list instances",
            BackendCommand::GetInstanceInfo { .. } => "get instance info",
            BackendCommand::GetInstanceLogs { .. } => "get instance logs",
            BackendCommand::GetInstanceMetrics { .. } => "get instance metrics",
            BackendCommand::GetTunnelEndpoints { .. } => "get tunnel endpoints",
            BackendCommand::GetConfig => "get config",
            BackendCommand::StartInstance { .. } => "start instance",
            BackendCommand::StopInstance { .. } => "stop instance",
            BackendCommand::RestartInstance { .. } => "restart instance",
            BackendCommand::KillInstance { .. } => "kill instance",
            BackendCommand::SendCommand { .. } => "send console command",
            BackendCommand::CreateInstance { .. } => "create instance",
            BackendCommand::SubscribeLogs { .. } => "subscribe instance logs",
            BackendCommand::UnsubscribeLogs { .. } => "unsubscribe instance logs",
            BackendCommand::SetTheme { .. } => "set theme",
            BackendCommand::VanillaVersions => "get vanilla versions",
            BackendCommand::PaperVersions => "get paper versions",
            BackendCommand::PurpurVersions => "get purpur versions",
            BackendCommand::FabricGameVersions => "get fabric game versions",
            BackendCommand::FabricLoaderVersions => "get fabric loader versions",
            BackendCommand::ForgeMcVersions => "get forge game versions",
            BackendCommand::ForgeVersions { .. } => "get forge builds",
            BackendCommand::NeoforgeMcVersions => "get neoforge game versions",
            BackendCommand::NeoforgeVersions { .. } => "get neoforge builds",
        }
    }
}

/// Sends commands to the backend socket with request tracking
#[derive(Clone)]
pub struct CommandSender {
    /// Channel to the connection's writer task
    out_tx: mpsc::Sender<String>,
    /// Request tracker for response matching
    tracker: Arc<RequestTracker>,
}

impl std::fmt::Debug for CommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSender")
            .field("out_tx", &"<channel>")
            .field("tracker", &"<tracker>")
            .finish()
    }
}

impl CommandSender {
    pub fn new(out_tx: mpsc::Sender<String>, tracker: Arc<RequestTracker>) -> Self {
        Self { out_tx, tracker }
    }

    /// Create a CommandSender for testing (uses a dummy channel)
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self {
            out_tx: tx,
            tracker: Arc::new(RequestTracker::default()),
        }
    }

    /// Create a CommandSender plus the receiving end of its wire, for tests
    /// that want to inspect outgoing frames
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn new_for_test_with_wire() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(32);
        let sender = Self {
            out_tx: tx,
            tracker: Arc::new(RequestTracker::default()),
        };
        (sender, rx)
    }

    /// Send a command and wait for response
    pub async fn send(&self, command: BackendCommand) -> Result<CommandResponse> {
        self.send_with_timeout(command, Duration::from_secs(15))
            .await
    }

    /// Send a command with custom timeout
    pub async fn send_with_timeout(
        &self,
        command: BackendCommand,
        timeout: Duration,
    ) -> Result<CommandResponse> {
        // Register the pending request
        let (id, response_rx) = self.tracker.register(command.description()).await;

        // Build and send the JSON line
        let json = command.build(id);

        debug!("Sending command #{}: {}", id, command.description());

        self.out_tx
            .send(json)
            .await
            .map_err(|_| Error::channel_send("backend writer"))?;

        // Wait for response with timeout
        match tokio::time::timeout(timeout, response_rx).await {
            Ok(Ok(response)) => {
                debug!("Command #{} completed: success={}", id, response.success);
                Ok(response)
            }
            Ok(Err(_)) => {
                // Channel closed (request was cancelled)
                Err(Error::ChannelClosed)
            }
            Err(_) => {
                // Timeout - cleanup the pending request
                self.tracker.cleanup_stale(Duration::ZERO).await;
                Err(Error::timeout(timeout.as_secs()))
            }
        }
    }

    /// Send a command and unwrap the result payload
    pub async fn call(&self, command: BackendCommand) -> Result<Value> {
        self.send(command).await?.into_result()
    }

    /// Send a fire-and-forget command (no response expected)
    pub async fn send_fire_and_forget(&self, command: BackendCommand) -> Result<()> {
        let id = next_request_id();
        let json = command.build(id);

        debug!("Sending fire-and-forget #{}: {}", id, command.description());

        self.out_tx
            .send(json)
            .await
            .map_err(|_| Error::channel_send("backend writer"))
    }

    /// Get the request tracker (for response handling)
    pub fn tracker(&self) -> &Arc<RequestTracker> {
        &self.tracker
    }
}
