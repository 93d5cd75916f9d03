//! Upgrades project files written by older releases before they are read.

use serde_json::{Map, Value};

use crate::util;

/// Rewrite older layouts in place:
///
/// - `kubectl.extraPathDirectories` moved to `settings.extraPathDirectories`
///   and gained a `uid` per row.
/// - `k8sDomain.clusters` used to be keyed by cluster name; it is now keyed
///   by uid with the name stored in the row.
pub fn convert_old_project_format(project: &mut Value) {
    move_extra_path_directories(project);
    rekey_clusters(project);
}

fn move_extra_path_directories(project: &mut Value) {
    let Some(old) = project
        .get_mut("kubectl")
        .and_then(Value::as_object_mut)
        .and_then(|kubectl| kubectl.remove("extraPathDirectories"))
    else {
        return;
    };
    let Some(root) = project.as_object_mut() else {
        return;
    };

    let settings = root
        .entry("settings")
        .or_insert_with(|| Value::Object(Map::new()));
    if !settings.is_object() {
        *settings = Value::Object(Map::new());
    }
    let Some(settings) = settings.as_object_mut() else {
        return;
    };
    let directories = settings
        .entry("extraPathDirectories")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !directories.is_array() {
        *directories = Value::Array(Vec::new());
    }
    let Some(directories) = directories.as_array_mut() else {
        return;
    };

    let moved = old.as_array().map(Vec::as_slice).unwrap_or_default();
    for entry in moved {
        let mut row = Map::new();
        row.insert("uid".to_string(), Value::String(util::short_uid()));
        row.insert(
            "value".to_string(),
            entry.get("value").cloned().unwrap_or(Value::Null),
        );
        directories.push(Value::Object(row));
    }
    tracing::info!(
        "moved {} extra path directories from kubectl to settings",
        moved.len()
    );
}

fn rekey_clusters(project: &mut Value) {
    let Some(clusters) = project
        .get_mut("k8sDomain")
        .and_then(|domain| domain.get_mut("clusters"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    // Old rows are recognized only by the missing name.
    let mut rekeyed = Map::new();
    for (name, cluster) in clusters.iter() {
        if cluster.get("name").is_some_and(|n| !n.is_null()) {
            break;
        }
        let mut cluster = cluster.as_object().cloned().unwrap_or_default();
        cluster.insert("name".to_string(), Value::String(name.clone()));
        rekeyed.insert(util::short_uid(), Value::Object(cluster));
    }
    if !rekeyed.is_empty() {
        tracing::info!("re-keyed {} clusters by uid", rekeyed.len());
        *clusters = rekeyed;
    }
}
