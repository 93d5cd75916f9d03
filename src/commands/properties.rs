//! Reading and editing page properties.
//!
//! Pages are addressed by their project key (`image`, `k8sDomain`, ...) and
//! properties by their field key within the page.

use std::sync::RwLock;

use serde_json::Value;

use crate::error::AppError;
use crate::models::ConfigPage;
use crate::project::Project;
use crate::properties::group::FieldSchema;
use crate::properties::{ListProperty, Property, Record};
use crate::validation::ValidationReport;

use super::read_project;

fn page<'a>(project: &'a Project, name: &str) -> Result<&'a dyn ConfigPage, AppError> {
    project
        .page(name)
        .ok_or_else(|| AppError::NotFound(format!("no page named {name}")))
}

fn field<'a>(project: &'a Project, page_name: &str, key: &str) -> Result<&'a dyn Property, AppError> {
    page(project, page_name)?
        .group()
        .get(key)
        .ok_or_else(|| AppError::NotFound(format!("no property {page_name}.{key}")))
}

fn list<'a>(project: &'a Project, page_name: &str, key: &str) -> Result<&'a ListProperty, AppError> {
    field(project, page_name, key)?
        .as_list()
        .ok_or_else(|| AppError::InvalidArgument(format!("{page_name}.{key} is not a list")))
}

pub(crate) fn get_page_schema_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
) -> Result<Vec<FieldSchema>, AppError> {
    let project = read_project(project_lock)?;
    Ok(page(&project, page_name)?.group().schema())
}

pub(crate) fn get_property_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
    key: &str,
) -> Result<Value, AppError> {
    let project = read_project(project_lock)?;
    Ok(field(&project, page_name, key)?.value_json())
}

/// Property handles share their state, so a read lock is enough to edit.
pub(crate) fn set_property_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
    key: &str,
    value: Value,
) -> Result<(), AppError> {
    let project = read_project(project_lock)?;
    field(&project, page_name, key)?.set_value_json(value)?;
    tracing::debug!("set {page_name}.{key}");
    Ok(())
}

/// Append a row; returns the stored row including a generated key.
pub(crate) fn add_list_item_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
    key: &str,
    item: Record,
) -> Result<Value, AppError> {
    let project = read_project(project_lock)?;
    let row = list(&project, page_name, key)?.add_item(item)?;
    Ok(Value::Object(row))
}

/// Remove the row whose primary key is `item_key`; returns the removed row.
pub(crate) fn remove_list_item_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
    key: &str,
    item_key: &str,
) -> Result<Value, AppError> {
    let project = read_project(project_lock)?;
    let list = list(&project, page_name, key)?;
    if list.primary_key().is_none() {
        return Err(AppError::InvalidArgument(format!(
            "{page_name}.{key} has no primary key"
        )));
    }
    Ok(Value::Object(list.remove_by_key(item_key)?))
}

pub(crate) fn get_model_content_inner(project_lock: &RwLock<Project>) -> Result<String, AppError> {
    Ok(read_project(project_lock)?.model.model_content())
}

/// Replace the model text; dependent properties (domain uid, secrets)
/// follow it.
pub(crate) fn set_model_content_inner(
    project_lock: &RwLock<Project>,
    text: &str,
) -> Result<(), AppError> {
    read_project(project_lock)?.model.set_model_content(text);
    Ok(())
}

pub(crate) fn validate_page_inner(
    project_lock: &RwLock<Project>,
    page_name: &str,
    flow: Option<&str>,
) -> Result<ValidationReport, AppError> {
    let project = read_project(project_lock)?;
    let report = project.validate_page(page_name, flow.unwrap_or(page_name))?;
    if report.has_errors() {
        tracing::info!("{} fields of {page_name} failed validation", report.error_count());
    }
    Ok(report)
}
