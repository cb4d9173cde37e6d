//! Theme and global configuration handlers
//!
//! The backend owns the persisted theme. Local picks apply immediately for
//! responsiveness and are confirmed by the `theme-changed` broadcast, which
//! also carries picks made from other windows.

use cwarden_core::prelude::*;
use cwarden_core::types::GlobalConfig;

use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

/// Seed state from the persisted configuration at startup.
pub fn handle_config_loaded(state: &mut AppState, config: GlobalConfig) -> UpdateResult {
    debug!("Loaded global config, theme = {}", config.theme);
    state.theme = config.theme;
    UpdateResult::none()
}

pub fn handle_config_load_failed(_state: &mut AppState, error: String) -> UpdateResult {
    warn!("Global config fetch failed, keeping defaults: {}", error);
    UpdateResult::none()
}

/// User picked a theme: apply now, persist via the backend.
pub fn handle_set_theme(state: &mut AppState, theme: String) -> UpdateResult {
    if state.theme == theme {
        return UpdateResult::none();
    }
    state.theme = theme.clone();
    UpdateResult::action(UpdateAction::PersistTheme { theme })
}

/// A `theme-changed` broadcast arrived, possibly from another window.
pub fn handle_theme_broadcast(state: &mut AppState, theme: String) -> UpdateResult {
    state.theme = theme;
    UpdateResult::none()
}
