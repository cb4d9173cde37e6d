//! cwarden-app - Application state and orchestration for Craft Warden
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management, the Engine abstraction for shared orchestration, configuration
//! loading, console sessions with their poll timers, and the create-instance
//! wizard with its dependent-field fetch chain.

pub mod actions;
pub mod chain;
pub mod config;
pub mod engine;
pub mod handler;
pub mod history;
pub mod message;
pub mod process;
pub mod session;
pub mod session_manager;
pub mod signals;
pub mod state;
pub mod wizard;

// Re-export primary types
pub use chain::{FieldChain, FieldDef, FieldPhase, FieldPlan, FetchDirective};
pub use engine::Engine;
pub use handler::{LifecycleOp, UpdateAction, UpdateResult};
pub use history::CommandHistory;
pub use message::Message;
pub use session::{ConsoleSession, SessionHandle, ViewId};
pub use session_manager::{SessionManager, MAX_VIEWS};
pub use state::AppState;
pub use wizard::CreateWizard;

// Re-export gateway types for runners
pub use cwarden_gateway::{BackendCommand, CommandSender};
