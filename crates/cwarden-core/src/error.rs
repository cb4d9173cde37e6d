//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Connection/Transport Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to connect to backend at {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    #[error("Backend call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // ─────────────────────────────────────────────────────────────
    // Backend Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Backend protocol error: {message}")]
    Protocol { message: String },

    /// A request/response call the backend answered with an error.
    /// Always transient: surfaced inline and retried on the next
    /// natural trigger, never in a loop.
    #[error("Backend call failed: {message}")]
    Remote { message: String },

    // ─────────────────────────────────────────────────────────────
    // Controller Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Subscription setup failed: {message}")]
    Subscription { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    /// Local input rejected before any backend call is made
    #[error("Validation error: {message}")]
    Validation { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn connect(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connect {
            address: address.into(),
            reason: reason.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription {
            message: message.into(),
        }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. }
                | Error::Protocol { .. }
                | Error::Timeout { .. }
                | Error::ChannelSend { .. }
                | Error::Subscription { .. }
                | Error::Validation { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connect { .. } | Error::ChannelClosed)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::remote("instance not found");
        assert_eq!(err.to_string(), "Backend call failed: instance not found");

        let err = Error::connect("127.0.0.1:46600", "connection refused");
        assert!(err.to_string().contains("127.0.0.1:46600"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::connect("127.0.0.1:1", "refused").is_fatal());
        assert!(Error::ChannelClosed.is_fatal());
        assert!(!Error::remote("test").is_fatal());
        assert!(!Error::validation("empty name").is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::remote("test").is_recoverable());
        assert!(Error::protocol("bad frame").is_recoverable());
        assert!(Error::timeout(15).is_recoverable());
        assert!(Error::subscription("no log channel").is_recoverable());
        assert!(!Error::ChannelClosed.is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::connect("addr", "reason");
        let _ = Error::channel_send("test");
        let _ = Error::timeout(5);
        let _ = Error::protocol("test");
        let _ = Error::remote("test");
        let _ = Error::subscription("test");
        let _ = Error::session("test");
        let _ = Error::validation("test");
        let _ = Error::config("test");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout(15);
        assert_eq!(err.to_string(), "Backend call timed out after 15s");
    }

    #[test]
    fn test_validation_error_stays_local() {
        // Validation failures block submits without reaching the backend,
        // so they must never be classified fatal.
        let err = Error::validation("name already exists");
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }
}
