//! User settings commands.

use std::sync::PoisonError;

use crate::config::{self, UserSettings};
use crate::error::AppError;
use crate::state::AppState;

pub(crate) fn get_user_settings_inner(state: &AppState) -> Result<UserSettings, AppError> {
    Ok(state
        .settings
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone())
}

/// Replace the settings and write them to the settings file, when there is
/// one. Invalid settings are rejected and the current ones kept.
pub(crate) fn save_user_settings_inner(
    state: &AppState,
    settings: UserSettings,
) -> Result<UserSettings, AppError> {
    match &state.settings_path {
        Some(path) => config::save(&settings, path)?,
        None => tracing::warn!("no settings directory; settings are kept for this session only"),
    }
    *state.settings.write().unwrap_or_else(PoisonError::into_inner) = settings.clone();
    Ok(settings)
}
