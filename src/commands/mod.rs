//! Command handlers behind the host request loop.
//!
//! Sub-modules are grouped by concern:
//! - [`file`]: new / open / save / close project
//! - [`project`]: lightweight project state queries
//! - [`properties`]: reading and editing page properties, validation
//! - [`settings`]: user settings
//! - [`tools`]: external tool commands and the console
//!
//! Every handler has a testable `_inner` function; [`dispatch`] maps a
//! command name and its JSON arguments onto them.

pub mod file;
pub mod project;
pub mod properties;
pub mod settings;
pub mod tools;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::project::Project;
use crate::state::AppState;

/// Run `command` against `state`.
///
/// Returns [`AppError::UnknownCommand`] for names no handler claims.
pub async fn dispatch(state: &AppState, command: &str, args: Value) -> Result<Value, AppError> {
    tracing::debug!("dispatching {command}");
    match command {
        "new-project" => to_result(file::new_project_inner(
            state,
            optional_arg::<String>(&args, "name")?,
        )?),
        "open-project" => to_result(file::open_project_inner(state, &required_arg::<String>(
            &args, "path",
        )?)?),
        "save-project" => to_result(file::save_project_inner(
            state,
            optional_arg::<String>(&args, "path")?.as_deref(),
        )?),
        "close-project" => to_result(file::close_project_inner(state)?),

        "get-project-snapshot" => to_result(project::get_project_snapshot_inner(state)?),
        "get-project-contents" => project::get_project_contents_inner(&state.project),
        "is-dirty" => to_result(project::is_dirty_inner(&state.project)?),

        "get-page-schema" => to_result(properties::get_page_schema_inner(
            &state.project,
            &required_arg::<String>(&args, "page")?,
        )?),
        "get-property" => properties::get_property_inner(
            &state.project,
            &required_arg::<String>(&args, "page")?,
            &required_arg::<String>(&args, "key")?,
        ),
        "set-property" => {
            properties::set_property_inner(
                &state.project,
                &required_arg::<String>(&args, "page")?,
                &required_arg::<String>(&args, "key")?,
                args.get("value").cloned().unwrap_or(Value::Null),
            )?;
            Ok(Value::Null)
        }
        "add-list-item" => properties::add_list_item_inner(
            &state.project,
            &required_arg::<String>(&args, "page")?,
            &required_arg::<String>(&args, "key")?,
            required_arg(&args, "item")?,
        ),
        "remove-list-item" => properties::remove_list_item_inner(
            &state.project,
            &required_arg::<String>(&args, "page")?,
            &required_arg::<String>(&args, "key")?,
            &required_arg::<String>(&args, "itemKey")?,
        ),
        "get-model-content" => to_result(properties::get_model_content_inner(&state.project)?),
        "set-model-content" => {
            properties::set_model_content_inner(
                &state.project,
                &required_arg::<String>(&args, "text")?,
            )?;
            Ok(Value::Null)
        }
        "validate-page" => to_result(properties::validate_page_inner(
            &state.project,
            &required_arg::<String>(&args, "page")?,
            optional_arg::<String>(&args, "flow")?.as_deref(),
        )?),

        "get-user-settings" => to_result(settings::get_user_settings_inner(state)?),
        "save-user-settings" => {
            to_result(settings::save_user_settings_inner(state, required_arg(&args, "settings")?)?)
        }

        "get-console-lines" => to_result(state.console.lines()),
        "clear-console" => {
            state.console.clear();
            Ok(Value::Null)
        }
        "kubectl-verify-connection" | "helm-list-all-namespaces" | "do-push-image" => {
            tools::run_tool_inner(state, command, args).await
        }

        other => Err(AppError::UnknownCommand(other.to_string())),
    }
}

// ── Lock helpers ──────────────────────────────────────────────────────────────

pub(crate) fn read_project(
    project_lock: &RwLock<Project>,
) -> Result<RwLockReadGuard<'_, Project>, AppError> {
    project_lock
        .read()
        .map_err(|e| AppError::Io(format!("project lock poisoned: {e}")))
}

pub(crate) fn write_project(
    project_lock: &RwLock<Project>,
) -> Result<RwLockWriteGuard<'_, Project>, AppError> {
    project_lock
        .write()
        .map_err(|e| AppError::Io(format!("project lock poisoned: {e}")))
}

// ── Argument helpers ──────────────────────────────────────────────────────────

/// Deserialize `args[name]`; a missing or null argument is an error.
pub(crate) fn required_arg<T: DeserializeOwned>(args: &Value, name: &str) -> Result<T, AppError> {
    optional_arg(args, name)?
        .ok_or_else(|| AppError::InvalidArgument(format!("missing argument {name}")))
}

/// Deserialize `args[name]` when present and not null.
pub(crate) fn optional_arg<T: DeserializeOwned>(
    args: &Value,
    name: &str,
) -> Result<Option<T>, AppError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AppError::InvalidArgument(format!("argument {name}: {e}"))),
    }
}

fn to_result<T: Serialize>(value: T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Io(format!("cannot serialize result: {e}")))
}
