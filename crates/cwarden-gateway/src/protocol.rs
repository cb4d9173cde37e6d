//! Wire protocol handling for the backend connection
//!
//! The backend speaks newline-delimited JSON. Each line is either a response
//! to a call we made (`{"id":1,"result":...}` / `{"id":1,"error":"..."}`) or
//! an unsolicited event (`{"event":"instance-log","params":{...}}`).

use serde::{Deserialize, Serialize};

use cwarden_core::events::BackendMessage;

/// A raw backend message (before parsing into typed events)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMessage {
    /// A response to a request we sent
    Response {
        id: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<serde_json::Value>,
    },
    /// An event from the backend (unsolicited)
    Event {
        event: String,
        #[serde(default)]
        params: serde_json::Value,
    },
}

#[allow(dead_code)]
impl RawMessage {
    /// Parse a JSON string into a RawMessage
    pub fn parse(json: &str) -> Option<Self> {
        serde_json::from_str(json.trim()).ok()
    }

    /// Check if this is an event
    pub fn is_event(&self) -> bool {
        matches!(self, RawMessage::Event { .. })
    }

    /// Get the event name if this is an event
    pub fn event_name(&self) -> Option<&str> {
        match self {
            RawMessage::Event { event, .. } => Some(event),
            _ => None,
        }
    }

    /// Get a human-readable summary of this message
    pub fn summary(&self) -> String {
        match self {
            RawMessage::Response { id, error, .. } => {
                if error.is_some() {
                    format!("Response #{}: error", id)
                } else {
                    format!("Response #{}: ok", id)
                }
            }
            RawMessage::Event { event, .. } => {
                format!("Event: {}", event)
            }
        }
    }
}

/// Parses one line from the backend socket.
///
/// # Arguments
/// * `line` - Line from the backend (leading/trailing whitespace tolerated)
///
/// # Returns
/// * `Some(BackendMessage)` if the line is a valid protocol message
/// * `None` if parsing fails
pub fn parse_backend_message(line: &str) -> Option<BackendMessage> {
    let raw = RawMessage::parse(line)?;
    match raw {
        RawMessage::Event { event, params } => Some(parse_event(&event, params)),
        RawMessage::Response { id, result, error } => {
            Some(BackendMessage::Response { id, result, error })
        }
    }
}

/// Parse an event by name and parameters
fn parse_event(event: &str, params: serde_json::Value) -> BackendMessage {
    match event {
        "instances-updated" => BackendMessage::InstancesChanged,
        "instance-log" => serde_json::from_value(params.clone())
            .map(BackendMessage::InstanceLog)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "theme-changed" => serde_json::from_value(params.clone())
            .map(BackendMessage::ThemeChanged)
            .unwrap_or_else(|_| unknown_event(event, params)),
        _ => unknown_event(event, params),
    }
}

/// Create an unknown event fallback
fn unknown_event(event: &str, params: serde_json::Value) -> BackendMessage {
    BackendMessage::UnknownEvent {
        event: event.to_string(),
        params,
    }
}
