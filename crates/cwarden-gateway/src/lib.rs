//! # cwarden-gateway - Backend Communication
//!
//! Manages the socket connection to the game-server backend, request/response
//! matching, and parsing of unsolicited push events.
//!
//! Depends on [`cwarden_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Connection Management
//! - [`BackendConnection`] - Open and manage the line-delimited JSON socket
//! - [`CommandSender`] - Send tracked calls to the backend
//! - [`RequestTracker`] - Track pending request/response pairs
//!
//! ### Commands
//! - [`BackendCommand`] - Every callable backend method, with its wire format
//! - [`CommandResponse`] - Matched response with success/error payload
//!
//! ### Protocol Parsing
//! - [`parse_backend_message()`] - Parse one line of backend output

pub mod commands;
pub mod connection;
pub mod protocol;

// Public API re-exports
pub use commands::{
    next_request_id, BackendCommand, CommandResponse, CommandSender, RequestTracker,
};
pub use connection::BackendConnection;
/// Re-exported from `cwarden_core` for convenience. Canonical import: `cwarden_core::BackendMessage`.
pub use cwarden_core::BackendMessage;
pub use protocol::parse_backend_message;
