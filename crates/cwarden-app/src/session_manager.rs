//! Manages the open console views

use std::collections::HashMap;

use cwarden_core::metrics::EvictionPolicy;
use cwarden_core::prelude::*;
use cwarden_core::types::InstanceSummary;

use super::session::{next_view_id, ConsoleSession, SessionHandle, ViewId};

/// Maximum number of concurrently open console views
pub const MAX_VIEWS: usize = 9;

/// Owns every open console view and its background tasks
#[derive(Debug)]
pub struct SessionManager {
    /// All session handles indexed by view ID
    sessions: HashMap<ViewId, SessionHandle>,

    /// Order of view IDs (for tab ordering)
    view_order: Vec<ViewId>,

    /// Currently selected/focused view
    selected_index: usize,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            view_order: Vec::new(),
            selected_index: 0,
        }
    }

    /// Open a console view for an instance.
    ///
    /// An instance gets at most one view; opening it again focuses the
    /// existing view and returns its ID.
    pub fn open_view(
        &mut self,
        instance: &InstanceSummary,
        policy: EvictionPolicy,
    ) -> Result<ViewId> {
        if let Some(existing) = self.find_by_instance(&instance.id) {
            self.select_by_id(existing);
            return Ok(existing);
        }

        if self.sessions.len() >= MAX_VIEWS {
            return Err(Error::session(format!(
                "Maximum of {} open consoles reached",
                MAX_VIEWS
            )));
        }

        let view_id = next_view_id();
        let session = ConsoleSession::new(view_id, instance, policy);
        self.sessions.insert(view_id, SessionHandle::new(session));
        self.view_order.push(view_id);

        // Focus the newly opened view
        self.selected_index = self.view_order.len() - 1;
        Ok(view_id)
    }

    /// Remove a view, handing its handle back for teardown.
    pub fn remove_view(&mut self, view_id: ViewId) -> Option<SessionHandle> {
        let handle = self.sessions.remove(&view_id)?;
        self.view_order.retain(|id| *id != view_id);
        if self.selected_index >= self.view_order.len() && !self.view_order.is_empty() {
            self.selected_index = self.view_order.len() - 1;
        }
        Some(handle)
    }

    pub fn get(&self, view_id: ViewId) -> Option<&SessionHandle> {
        self.sessions.get(&view_id)
    }

    pub fn get_mut(&mut self, view_id: ViewId) -> Option<&mut SessionHandle> {
        self.sessions.get_mut(&view_id)
    }

    /// View watching this instance, if one is open.
    pub fn find_by_instance(&self, instance_id: &str) -> Option<ViewId> {
        self.sessions
            .values()
            .find(|h| h.session.instance_id == instance_id)
            .map(|h| h.session.view_id)
    }

    pub fn selected_id(&self) -> Option<ViewId> {
        self.view_order.get(self.selected_index).copied()
    }

    pub fn selected(&self) -> Option<&SessionHandle> {
        self.selected_id().and_then(|id| self.get(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut SessionHandle> {
        let id = self.selected_id()?;
        self.get_mut(id)
    }

    pub fn select_by_id(&mut self, view_id: ViewId) -> bool {
        match self.view_order.iter().position(|id| *id == view_id) {
            Some(index) => {
                self.selected_index = index;
                true
            }
            None => false,
        }
    }

    pub fn select_next(&mut self) {
        if !self.view_order.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.view_order.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.view_order.is_empty() {
            self.selected_index =
                (self.selected_index + self.view_order.len() - 1) % self.view_order.len();
        }
    }

    /// View IDs in tab order.
    pub fn view_ids(&self) -> Vec<ViewId> {
        self.view_order.clone()
    }

    /// Iterate every handle, order unspecified.
    pub fn handles_mut(&mut self) -> impl Iterator<Item = &mut SessionHandle> {
        self.sessions.values_mut()
    }

    /// Take every handle out for shutdown teardown.
    pub fn drain_all(&mut self) -> Vec<SessionHandle> {
        self.view_order.clear();
        self.selected_index = 0;
        self.sessions.drain().map(|(_, handle)| handle).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
