//! Backend event definitions

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────
// Event Structs
// ─────────────────────────────────────────────────────────

/// One log line pushed for a subscribed instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceLogEvent {
    pub id: String,
    pub line: String,
}

// ─────────────────────────────────────────────────────────
// BackendMessage Enum
// ─────────────────────────────────────────────────────────

/// Fully typed backend message
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// The instance set (or any instance's lifecycle state) changed
    InstancesChanged,

    /// A new console line for a subscribed instance
    InstanceLog(InstanceLogEvent),

    /// The persisted theme changed (carries the new theme name)
    ThemeChanged(String),

    // Responses
    Response {
        id: serde_json::Value,
        result: Option<serde_json::Value>,
        error: Option<serde_json::Value>,
    },

    // Fallback for unknown events
    UnknownEvent {
        event: String,
        params: serde_json::Value,
    },
}

impl BackendMessage {
    /// Get the instance ID if this message relates to an instance
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            BackendMessage::InstanceLog(e) => Some(&e.id),
            _ => None,
        }
    }

    /// Check if this is an error message
    pub fn is_error(&self) -> bool {
        match self {
            BackendMessage::Response { error, .. } => error.is_some(),
            _ => false,
        }
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self {
            BackendMessage::InstancesChanged => "Instances changed".to_string(),
            BackendMessage::InstanceLog(log) => {
                format!("[{}] {}", log.id, log.line)
            }
            BackendMessage::ThemeChanged(theme) => {
                format!("Theme changed: {}", theme)
            }
            BackendMessage::Response { id, error, .. } => {
                if error.is_some() {
                    format!("Response #{}: error", id)
                } else {
                    format!("Response #{}: ok", id)
                }
            }
            BackendMessage::UnknownEvent { event, .. } => {
                format!("Event: {}", event)
            }
        }
    }
}
