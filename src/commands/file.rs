//! Project lifecycle command handlers.
//!
//! # Error contract
//! Every fallible path returns `Result<_, AppError>`. No `unwrap()` or
//! `expect()` calls are present outside of `#[cfg(test)]`.

use std::path::{Path, PathBuf};
use std::sync::PoisonError;

use crate::error::AppError;
use crate::project::serialization;
use crate::state::AppState;

use super::project::{get_project_snapshot_inner, ProjectSnapshot};
use super::{read_project, write_project};

// ── new_project ───────────────────────────────────────────────────────────────

/// Replace the open project with a fresh one carrying a new uuid.
pub(crate) fn new_project_inner(
    state: &AppState,
    name: Option<String>,
) -> Result<ProjectSnapshot, AppError> {
    let mut project = state.fresh_project();
    project.set_name(name.filter(|n| !n.trim().is_empty()));
    project.set_uuid(Some(uuid::Uuid::new_v4().to_string()));
    project.set_not_dirty();

    *write_project(&state.project)? = project;
    *state
        .project_file
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
    tracing::info!("created a new project");
    get_project_snapshot_inner(state)
}

// ── open_project ──────────────────────────────────────────────────────────────

/// Load the project file at `path` and make it the open project.
///
/// The open project is only replaced once the file has been read.
pub(crate) fn open_project_inner(state: &AppState, path: &str) -> Result<ProjectSnapshot, AppError> {
    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(AppError::FileNotFound);
    }
    let (json, model_contents) = serialization::load(&path)?;

    let mut project = state.fresh_project();
    project.set_from_json(&json, &model_contents);
    if project.name().is_none() {
        project.set_name(name_from_file(&path));
    }
    project.set_not_dirty();

    *write_project(&state.project)? = project;
    remember(state, path);
    get_project_snapshot_inner(state)
}

// ── save_project ──────────────────────────────────────────────────────────────

/// Save the open project to `path`, or to the file it came from.
pub(crate) fn save_project_inner(
    state: &AppState,
    path: Option<&str>,
) -> Result<ProjectSnapshot, AppError> {
    let path = match path {
        Some(path) => PathBuf::from(path),
        None => state
            .project_file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                AppError::InvalidArgument("the project has not been saved before".to_string())
            })?,
    };

    {
        let mut project = write_project(&state.project)?;
        if project.name().is_none() {
            project.set_name(name_from_file(&path));
        }
    }
    {
        let project = read_project(&state.project)?;
        serialization::save(&project, &path)?;
        project.set_not_dirty();
    }
    remember(state, path);
    get_project_snapshot_inner(state)
}

// ── close_project ─────────────────────────────────────────────────────────────

/// Drop the open project, leaving an empty unsaved one.
pub(crate) fn close_project_inner(state: &AppState) -> Result<ProjectSnapshot, AppError> {
    *write_project(&state.project)? = state.fresh_project();
    *state
        .project_file
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
    get_project_snapshot_inner(state)
}

fn name_from_file(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Record `path` as the open project's file and in the recent list.
fn remember(state: &AppState, path: PathBuf) {
    {
        let mut settings = state.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.remember_project(&path);
        if let Some(settings_path) = &state.settings_path {
            if let Err(e) = crate::config::save(&settings, settings_path) {
                tracing::warn!("cannot update recent projects: {e}");
            }
        }
    }
    *state
        .project_file
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
