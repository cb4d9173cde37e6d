//! # cwarden-core - Core Domain Types
//!
//! Foundation crate for Craft Warden. Provides domain types, error handling,
//! and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`InstanceSummary`] - One row of the instance summary list
//! - [`InstanceStatus`] - Running/tunnel flags for a single instance
//! - [`MetricsPoint`] - One metrics reading in wire shape
//! - [`TunnelEndpoint`] - Public tunnel endpoint metadata
//! - [`SoftwareKind`] - Server software family (vanilla, papermc, ...)
//! - [`GlobalConfig`] - Backend-persisted global configuration (theme)
//!
//! ### Backend Events (`events`)
//! - [`BackendMessage`] - Typed push message from the backend
//! - [`InstanceLogEvent`] - One console line for a subscribed instance
//!
//! ### Console Buffers (`buffer`, `metrics`)
//! - [`AppendBuffer`] - Append-only console line store with a scroll revision
//! - [`Sample`] / [`SampleWindow`] - Display-ready metrics and their window
//! - [`EvictionPolicy`] - Age or count retention for a sample window
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use cwarden_core::prelude::*;
//! ```

pub mod buffer;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod types;

/// Prelude for common imports used throughout all Craft Warden crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use buffer::AppendBuffer;
pub use error::{Error, Result, ResultExt};
pub use events::{BackendMessage, InstanceLogEvent};
pub use metrics::{EvictionPolicy, Sample, SampleWindow};
pub use types::{
    GlobalConfig, InstanceStatus, InstanceSummary, MetricsPoint, Notice, SoftwareKind,
    TunnelEndpoint, DEFAULT_THEME,
};
