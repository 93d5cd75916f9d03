//! Project state query commands.
//!
//! [`get_project_snapshot_inner`] returns a lightweight view of the open
//! project for the host's title bar. The queries acquire only read locks and
//! are safe to run concurrently with each other.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::project::Project;
use crate::state::AppState;

use super::read_project;

/// Serializable snapshot of the open project sent to the host.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project_name: Option<String>,
    pub project_uuid: Option<String>,
    /// Where the project was last loaded from or saved to.
    pub project_file: Option<String>,
    pub is_dirty: bool,
}

/// Acquires a READ lock on the project and returns a [`ProjectSnapshot`].
pub(crate) fn get_project_snapshot_inner(state: &AppState) -> Result<ProjectSnapshot, AppError> {
    let project_file = state
        .project_file
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned());
    let project = read_project(&state.project)?;
    Ok(ProjectSnapshot {
        project_name: project.name().map(str::to_string),
        project_uuid: project.uuid().map(str::to_string),
        project_file,
        is_dirty: project.is_dirty(),
    })
}

/// The JSON that saving would write to the project file.
pub(crate) fn get_project_contents_inner(
    project_lock: &RwLock<Project>,
) -> Result<Value, AppError> {
    Ok(read_project(project_lock)?.get_project_contents())
}

pub(crate) fn is_dirty_inner(project_lock: &RwLock<Project>) -> Result<bool, AppError> {
    Ok(read_project(project_lock)?.is_dirty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn snapshot_of_default_project() {
        let state = AppState::default();
        let snap = get_project_snapshot_inner(&state).expect("snapshot should not fail");
        assert!(snap.project_name.is_none());
        assert!(snap.project_uuid.is_none());
        assert!(snap.project_file.is_none());
        assert!(!snap.is_dirty);
    }

    #[test]
    fn snapshot_reflects_name_file_and_dirty_state() {
        let state = AppState::default();
        {
            let mut p = state.project.write().expect("write lock");
            p.set_name(Some("My Project".to_string()));
            p.image.image_tag.set_value("x:1");
        }
        *state.project_file.write().expect("write") = Some(PathBuf::from("/work/my.json"));
        let snap = get_project_snapshot_inner(&state).expect("snapshot should not fail");
        assert_eq!(snap.project_name.as_deref(), Some("My Project"));
        assert_eq!(snap.project_file.as_deref(), Some("/work/my.json"));
        assert!(snap.is_dirty);
    }

    #[test]
    fn contents_and_dirty_flag_track_the_project() {
        let state = AppState::default();
        assert!(!is_dirty_inner(&state.project).expect("dirty"));
        assert_eq!(get_project_contents_inner(&state.project).expect("contents"), json!({}));

        state
            .project
            .read()
            .expect("read lock")
            .settings
            .target_domain_location
            .set_value("pv");
        assert!(is_dirty_inner(&state.project).expect("dirty"));
        assert_eq!(
            get_project_contents_inner(&state.project).expect("contents"),
            json!({"settings": {"targetDomainLocation": "pv"}})
        );
    }

    #[test]
    fn project_snapshot_serializes_camel_case() {
        let snap = ProjectSnapshot {
            project_name: Some("Test".to_string()),
            project_uuid: Some("u1".to_string()),
            project_file: None,
            is_dirty: true,
        };
        let value = serde_json::to_value(&snap).expect("serialize");
        assert!(value.get("projectName").is_some(), "expected camelCase projectName");
        assert!(value.get("projectUuid").is_some(), "expected camelCase projectUuid");
        assert_eq!(value["isDirty"], json!(true));
    }
}
