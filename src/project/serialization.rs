//! Atomic save and tolerant load for project files.
//!
//! # Save
//! 1. Build the project JSON and the model contents from the [`Project`].
//! 2. Write each model and variables file next to the project file, then the
//!    project JSON itself. Every file goes to `<target>.tmp` first and is
//!    renamed over the target, so a failed save leaves the old file intact.
//!
//! # Load
//! 1. Read and parse the project JSON; it must be an object.
//! 2. Read the model and variables files it names. Missing files are logged
//!    and skipped so the project still opens.

use std::path::Path;

use serde::Deserialize as _;
use serde_json::{Map, Value};

use super::types::ProjectFile;
use crate::error::AppError;
use crate::models::ModelContents;
use crate::project::Project;
use crate::validation::value_text;

/// Save `project` to `path` along with its model files.
pub fn save(project: &Project, path: &Path) -> Result<(), AppError> {
    // Writing the JSON first assigns default model file names.
    let json = project.get_project_contents();
    let contents = project.get_model_contents();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    for (file, text) in &contents.models {
        write_atomic(&dir.join(file), text.as_bytes())?;
    }
    for (file, variables) in &contents.properties {
        write_atomic(&dir.join(file), format_properties(variables).as_bytes())?;
    }

    let text = serde_json::to_string_pretty(&json)
        .map_err(|e| AppError::ProjectSave(format!("cannot serialize project: {e}")))?;
    write_atomic(path, text.as_bytes())?;
    tracing::info!("saved project to {}", path.display());
    Ok(())
}

/// Load the project JSON at `path` and the model files it references.
pub fn load(path: &Path) -> Result<(Value, ModelContents), AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::ProjectLoad(format!("cannot open {}: {e}", path.display())))?;
    let json: Value = serde_json::from_str(&text)
        .map_err(|e| AppError::ProjectLoad(format!("cannot parse {}: {e}", path.display())))?;
    if !json.is_object() {
        return Err(AppError::ProjectLoad(format!(
            "{} does not contain a JSON object",
            path.display()
        )));
    }
    let refs = ProjectFile::deserialize(&json)
        .map_err(|e| AppError::ProjectLoad(format!("malformed project file: {e}")))?
        .model;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut contents = ModelContents::default();
    for file in refs.model_files {
        if let Some(text) = read_optional(&dir.join(&file)) {
            contents.models.insert(file, text);
        }
    }
    for file in refs.properties_files {
        if let Some(text) = read_optional(&dir.join(&file)) {
            contents.properties.insert(file, parse_properties(&text));
        }
    }
    tracing::info!(
        "loaded project {} with {} model files",
        path.display(),
        contents.models.len()
    );
    Ok((json, contents))
}

fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("skipping model file {}: {e}", path.display());
            None
        }
    }
}

/// Write `bytes` to `<path>.tmp` and rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::ProjectSave(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    if let Err(e) = std::fs::write(&tmp_path, bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::ProjectSave(format!(
            "cannot write {}: {e}",
            tmp_path.display()
        )));
    }
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        AppError::ProjectSave(format!("rename to {} failed: {e}", path.display()))
    })
}

/// Parse `name=value` lines. Blank lines and `#`/`!` comments are skipped;
/// a line without `=` or `:` is a name with an empty value.
pub fn parse_properties(text: &str) -> Map<String, Value> {
    let mut variables = Map::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (name, value) = match line.find(['=', ':']) {
            Some(at) => (line[..at].trim(), line[at + 1..].trim()),
            None => (line, ""),
        };
        if !name.is_empty() {
            variables.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    variables
}

/// Inverse of [`parse_properties`], one `name=value` line per variable.
pub fn format_properties(variables: &Map<String, Value>) -> String {
    variables
        .iter()
        .map(|(name, value)| format!("{name}={}\n", value_text(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn properties_parse_in_file_order() {
        let parsed = parse_properties(
            "# credentials\nDB_USER = scott\n\n! legacy comment\nDB_URL=jdbc:oracle:thin:@db:1521/x\nEMPTY\n",
        );
        let names: Vec<&String> = parsed.keys().collect();
        assert_eq!(names, vec!["DB_USER", "DB_URL", "EMPTY"]);
        assert_eq!(parsed["DB_USER"], "scott");
        assert_eq!(parsed["DB_URL"], "jdbc:oracle:thin:@db:1521/x");
        assert_eq!(parsed["EMPTY"], "");
    }

    #[test]
    fn properties_format_one_per_line() {
        let mut variables = Map::new();
        variables.insert("PORT".to_string(), json!(7001));
        variables.insert("HOST".to_string(), json!("db"));
        assert_eq!(format_properties(&variables), "PORT=7001\nHOST=db\n");
    }

    #[test]
    fn save_writes_project_and_model_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shop.json");
        let mut project = Project::default();
        project.set_name(Some("shop".to_string()));
        project.model.set_model_content("topology:\n  Name: shop\n");

        save(&project, &path).expect("save");

        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(saved["name"], "shop");
        assert_eq!(saved["model"]["modelFiles"], json!(["shop-models/model.yaml"]));
        let model = std::fs::read_to_string(dir.path().join("shop-models/model.yaml"))
            .expect("model file");
        assert_eq!(model, "topology:\n  Name: shop\n");
        assert!(!dir.path().join("shop.json.tmp").exists());
    }

    #[test]
    fn load_reads_referenced_files_and_skips_missing_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("m")).expect("mkdir");
        std::fs::write(dir.path().join("m/model.yaml"), "domainInfo: {}\n").expect("write");
        std::fs::write(dir.path().join("m/vars.properties"), "A=1\n").expect("write");
        let path = dir.path().join("p.json");
        std::fs::write(
            &path,
            json!({"model": {
                "modelFiles": ["m/model.yaml", "m/gone.yaml"],
                "propertiesFiles": ["m/vars.properties"]
            }})
            .to_string(),
        )
        .expect("write");

        let (json, contents) = load(&path).expect("load");
        assert!(json.get("model").is_some());
        assert_eq!(contents.models.len(), 1);
        assert_eq!(contents.models["m/model.yaml"], "domainInfo: {}\n");
        assert_eq!(contents.properties["m/vars.properties"]["A"], "1");
    }

    #[test]
    fn load_rejects_non_object_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("p.json");
        std::fs::write(&path, "[1, 2]").expect("write");
        assert!(matches!(load(&path), Err(AppError::ProjectLoad(_))));
    }

    #[test]
    fn load_fails_gracefully_on_missing_file() {
        let result = load(Path::new("/nonexistent/path/project.json"));
        assert!(matches!(result, Err(AppError::ProjectLoad(_))));
    }
}
