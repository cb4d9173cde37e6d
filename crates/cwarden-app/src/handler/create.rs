//! Create-instance wizard handlers

use cwarden_core::prelude::*;

use crate::chain::FetchDirective;
use crate::message::Message;
use crate::state::AppState;
use crate::wizard::CreateWizard;

use super::{UpdateAction, UpdateResult};

/// Map chain directives to one fetch action, dropping unfetchable ones.
fn fetch_action(directives: Vec<FetchDirective>) -> UpdateResult {
    let fetches: Vec<_> = directives
        .iter()
        .filter_map(|d| CreateWizard::fetch_command(d).map(|cmd| (d.index, d.generation, cmd)))
        .collect();

    if fetches.is_empty() {
        UpdateResult::none()
    } else {
        UpdateResult::action(UpdateAction::FetchWizardOptions { fetches })
    }
}

pub fn handle_open(state: &mut AppState) -> UpdateResult {
    if state.wizard.is_some() {
        return UpdateResult::none();
    }
    let (wizard, directives) = CreateWizard::new();
    state.wizard = Some(wizard);
    fetch_action(directives)
}

/// Drop the dialog. In-flight option fetches resolve against a missing
/// wizard and evaporate.
pub fn handle_close(state: &mut AppState) -> UpdateResult {
    state.wizard = None;
    UpdateResult::none()
}

pub fn handle_field_selected(state: &mut AppState, field: usize, value: String) -> UpdateResult {
    let Some(wizard) = state.wizard.as_mut() else {
        return UpdateResult::none();
    };
    let directives = wizard.select(field, value);
    fetch_action(directives)
}

pub fn handle_name_changed(state: &mut AppState, name: String) -> UpdateResult {
    if let Some(wizard) = state.wizard.as_mut() {
        wizard.name = name;
    }
    UpdateResult::none()
}

pub fn handle_jar_path_changed(state: &mut AppState, path: String) -> UpdateResult {
    if let Some(wizard) = state.wizard.as_mut() {
        wizard.custom_jar_path = path;
    }
    UpdateResult::none()
}

pub fn handle_options_loaded(
    state: &mut AppState,
    field: usize,
    generation: u64,
    options: Vec<String>,
) -> UpdateResult {
    let Some(wizard) = state.wizard.as_mut() else {
        debug!("Options arrived after the wizard closed");
        return UpdateResult::none();
    };
    if !wizard.resolve(field, generation, Ok(options)) {
        debug!("Dropped stale options for wizard field {}", field);
    }
    UpdateResult::none()
}

pub fn handle_options_load_failed(
    state: &mut AppState,
    field: usize,
    generation: u64,
    error: String,
) -> UpdateResult {
    let Some(wizard) = state.wizard.as_mut() else {
        return UpdateResult::none();
    };
    if wizard.resolve(field, generation, Err(error.clone())) {
        warn!("Option fetch failed for wizard field {}: {}", field, error);
    }
    UpdateResult::none()
}

pub fn handle_submit(state: &mut AppState) -> UpdateResult {
    let Some(wizard) = state.wizard.as_mut() else {
        return UpdateResult::none();
    };
    if wizard.submitting {
        return UpdateResult::none();
    }

    if let Err(reason) = wizard.validate() {
        wizard.error = Some(reason);
        return UpdateResult::none();
    }
    let Some(command) = wizard.create_command() else {
        return UpdateResult::none();
    };

    wizard.submitting = true;
    wizard.error = None;
    UpdateResult::action(UpdateAction::CreateInstance { command })
}

/// The backend created the instance: close the dialog and refresh the list
/// without waiting for the push.
pub fn handle_completed(state: &mut AppState) -> UpdateResult {
    state.wizard = None;
    UpdateResult::message(Message::RefreshInstances)
}

pub fn handle_failed(state: &mut AppState, error: String) -> UpdateResult {
    if let Some(wizard) = state.wizard.as_mut() {
        warn!("Create instance failed: {}", error);
        wizard.submitting = false;
        wizard.error = Some(error);
    }
    UpdateResult::none()
}
