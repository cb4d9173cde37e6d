//! Per-view console session state for an open instance panel

mod handle;
#[allow(clippy::module_inception)]
mod session;

pub use handle::SessionHandle;
pub use session::ConsoleSession;

// ViewId and next_view_id live here in mod.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a console view
pub type ViewId = u64;

static VIEW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique view ID
pub fn next_view_id() -> ViewId {
    VIEW_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
