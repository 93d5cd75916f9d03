//! Typed views of the project file.
//!
//! The pages read the project JSON themselves; these types only pick out the
//! parts the file layer needs before the pages are loaded.

use serde::Deserialize;

/// Files the `model` section points at, relative to the project file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelFileRefs {
    pub model_files: Vec<String>,
    pub properties_files: Vec<String>,
    pub archive_files: Vec<String>,
}

/// Top level of a project file. Every other section is ignored here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub name: Option<String>,
    pub uuid: Option<String>,
    pub model: ModelFileRefs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_refs_are_picked_out() {
        let file: ProjectFile = serde_json::from_value(json!({
            "name": "shop",
            "model": {"modelFiles": ["shop-models/model.yaml"], "targetDomainType": "WLS"},
            "image": {"imageTag": "shop:1"}
        }))
        .expect("parse");
        assert_eq!(file.name.as_deref(), Some("shop"));
        assert!(file.uuid.is_none());
        assert_eq!(file.model.model_files, vec!["shop-models/model.yaml"]);
        assert!(file.model.properties_files.is_empty());
    }

    #[test]
    fn empty_object_gives_defaults() {
        let file: ProjectFile = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(file, ProjectFile::default());
    }
}
