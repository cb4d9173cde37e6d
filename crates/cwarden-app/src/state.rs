//! Application state (TEA pattern)

use cwarden_core::types::{InstanceSummary, DEFAULT_THEME};

use crate::config::Settings;
use crate::session_manager::SessionManager;
use crate::wizard::CreateWizard;

/// All application state
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration
    pub settings: Settings,

    /// Open console views and their tasks
    pub session_manager: SessionManager,

    /// Instance summary rows, as last fetched
    pub instances: Vec<InstanceSummary>,
    /// True while a summary fetch is in flight
    pub instances_loading: bool,
    /// Last summary fetch failure
    pub instances_error: Option<String>,

    /// Current UI theme name
    pub theme: String,

    /// Create-instance dialog, when open
    pub wizard: Option<CreateWizard>,

    /// False once the backend link has dropped
    pub connected: bool,

    should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            session_manager: SessionManager::new(),
            instances: Vec::new(),
            instances_loading: false,
            instances_error: None,
            theme: DEFAULT_THEME.to_string(),
            wizard: None,
            connected: true,
            should_quit: false,
        }
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Summary row for an instance, if the last fetch had it.
    pub fn find_instance(&self, instance_id: &str) -> Option<&InstanceSummary> {
        self.instances.iter().find(|i| i.id == instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = AppState::new();
        assert!(!state.should_quit());
        assert!(state.connected);
        assert!(state.instances.is_empty());
        assert_eq!(state.theme, "dark");
        assert!(state.wizard.is_none());
    }

    #[test]
    fn test_find_instance() {
        let mut state = AppState::new();
        state.instances.push(InstanceSummary {
            id: "abc".to_string(),
            name: "lobby".to_string(),
            software: "vanilla".to_string(),
            version: "1.20.4".to_string(),
            running: false,
            tunnel_enabled: false,
        });

        assert!(state.find_instance("abc").is_some());
        assert!(state.find_instance("zzz").is_none());
    }
}
