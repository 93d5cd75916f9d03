//! The WebLogic Deploy Tooling model: file locations, model text,
//! variables and the secret / property tokens found in the text.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::ConfigPage;
use crate::observable::Signal;
use crate::properties::{ArrayProperty, ListProperty, PropertyGroup, Record};
use crate::validation::{self, ValidationError, ValidationReport};

pub const DEFAULT_DOMAIN_NAME: &str = "base_domain";

/// Secret name the operator reserves for the administrator credentials.
pub const ADMIN_SECRET_NAME: &str = "__weblogic-credentials__";

const ID: &str = "[A-Za-z0-9_.-]*";

static PROPERTY_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        "@@PROP:(@@ENV:(?P<envvar>{ID})@@)?(?P<name>{ID})@@"
    ))
    .ok()
});

static SECRET_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        "@@SECRET:(@@ENV:(?P<envvar>{ID})@@)?(?P<name>{ID}):(?P<field>{ID})@@"
    ))
    .ok()
});

/// Model files and variable files as stored next to the project file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelContents {
    /// Model file path → YAML text.
    #[serde(default)]
    pub models: BTreeMap<String, String>,
    /// Variable file path → `{name: value}`.
    #[serde(default)]
    pub properties: BTreeMap<String, Map<String, Value>>,
}

impl ModelContents {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.properties.is_empty()
    }
}

/// A secret referenced by `@@SECRET:...@@` tokens, with the fields used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSecret {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
    /// Field names in order of first use, e.g. `username`, `password`.
    pub fields: Vec<String>,
}

/// A variable referenced by `@@PROP:...@@` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyReference {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
    pub reference_count: usize,
}

/// The key a token resolves to once `@@ENV:X@@` is substituted, so
/// `@@ENV:DOMAIN_UID@@-db` and `mydomain-db` name the same thing.
fn token_key(env_var: Option<&str>, name: &str) -> String {
    match env_var {
        Some(env) if name.starts_with('-') => format!("{env}{name}"),
        Some(env) => format!("{env}-{name}"),
        None => name.to_string(),
    }
}

fn domain_name_in(text: &str) -> Option<String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    let name = yaml
        .get("topology")
        .and_then(|topology| topology.get("Name"))
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or(DEFAULT_DOMAIN_NAME);
    Some(name.to_string())
}

/// Secrets referenced by `@@SECRET:...@@` tokens in `text`, in order of
/// first reference. The administrator secret is skipped unless
/// `include_admin_credentials` is set.
pub fn scan_secrets(text: &str, include_admin_credentials: bool) -> Vec<ModelSecret> {
    let Some(pattern) = SECRET_TOKEN.as_ref() else {
        return Vec::new();
    };
    let mut found: Vec<(String, ModelSecret)> = Vec::new();
    for caps in pattern.captures_iter(text) {
        let name = caps.name("name").map_or("", |m| m.as_str());
        if name == ADMIN_SECRET_NAME && !include_admin_credentials {
            tracing::debug!("skipping secret {name}");
            continue;
        }
        let env_var = caps.name("envvar").map(|m| m.as_str().to_string());
        let field = caps.name("field").map_or("", |m| m.as_str()).to_string();
        let key = token_key(env_var.as_deref(), name);
        let index = match found.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                found.push((
                    key,
                    ModelSecret {
                        name: name.to_string(),
                        env_var,
                        fields: Vec::new(),
                    },
                ));
                found.len() - 1
            }
        };
        let secret = &mut found[index].1;
        if !secret.fields.contains(&field) {
            secret.fields.push(field);
        }
    }
    found.into_iter().map(|(_, secret)| secret).collect()
}

pub(crate) fn overrides_in(properties: &ListProperty) -> Map<String, Value> {
    properties
        .records()
        .into_iter()
        .filter_map(|row| {
            let name = validation::value_text(row.get("Name")?);
            let value = row.get("Override")?;
            (!name.is_empty() && !validation::value_text(value).is_empty())
                .then(|| (name, value.clone()))
        })
        .collect()
}

pub(crate) fn set_override(properties: &ListProperty, name: &str, value: Value) {
    let index = properties
        .records()
        .iter()
        .position(|row| row.get("Name").map(validation::value_text).as_deref() == Some(name));
    let updated = index.map(|i| properties.update_at(i, "Override", value.clone()));
    if !matches!(updated, Some(Ok(()))) {
        tracing::warn!("no model property {name} to set its override value to {value}");
    }
}

pub struct WdtModelPage {
    pub model_files: ArrayProperty,
    pub properties_files: ArrayProperty,
    pub archive_files: ArrayProperty,
    /// `topology.Name` of the model, or `base_domain`.
    pub domain_name: Signal<Value>,
    /// Text of the first model file.
    model_content: Signal<String>,
    /// Variables of the first properties file; the `Override` column holds
    /// the values written to the domain's config map.
    pub properties: ListProperty,
    model_file_contents: RwLock<BTreeMap<String, String>>,
    model_text_changed: AtomicBool,
    project_file_prefix: RwLock<Option<String>>,
    group: PropertyGroup,
}

impl Default for WdtModelPage {
    fn default() -> Self {
        Self::new()
    }
}

impl WdtModelPage {
    pub fn new() -> Self {
        let page = Self {
            model_files: ArrayProperty::empty(),
            properties_files: ArrayProperty::empty(),
            archive_files: ArrayProperty::empty(),
            domain_name: Signal::new(json!(DEFAULT_DOMAIN_NAME)),
            model_content: Signal::new(String::new()),
            properties: ListProperty::new(&["uid", "Name", "Value", "Override"]).keyed_by("uid"),
            model_file_contents: RwLock::new(BTreeMap::new()),
            model_text_changed: AtomicBool::new(false),
            project_file_prefix: RwLock::new(None),
            group: PropertyGroup::new("model"),
        };
        let group = PropertyGroup::new("model")
            .field("modelFiles", &page.model_files)
            .field("propertiesFiles", &page.properties_files)
            .field("archiveFiles", &page.archive_files);
        Self { group, ..page }
    }

    pub fn model_content(&self) -> String {
        self.model_content.get()
    }

    /// Signal notified whenever the model text changes.
    pub fn model_content_signal(&self) -> Signal<String> {
        self.model_content.clone()
    }

    /// Replace the text of the first model file.
    ///
    /// The domain name is re-read from the text; text that does not parse
    /// leaves it unchanged.
    pub fn set_model_content(&self, text: &str) {
        if self.model_content.get() == text {
            return;
        }
        if let Some(file) = self.model_files.first() {
            self.model_file_contents
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(file, text.to_string());
        }
        if let Some(name) = domain_name_in(text) {
            self.domain_name.set(Value::String(name));
        }
        self.model_text_changed.store(true, Ordering::Relaxed);
        self.model_content.set(text.to_string());
    }

    /// Default model files are named after the project.
    pub fn set_project_file_prefix(&self, prefix: Option<&str>) {
        *self
            .project_file_prefix
            .write()
            .unwrap_or_else(PoisonError::into_inner) =
            prefix.filter(|p| !p.is_empty()).map(str::to_string);
    }

    fn default_model_directory(&self) -> String {
        match self
            .project_file_prefix
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
        {
            Some(prefix) => format!("{prefix}-models"),
            None => "models".to_string(),
        }
    }

    pub fn default_model_file(&self) -> String {
        format!("{}/model.yaml", self.default_model_directory())
    }

    pub fn default_properties_file(&self) -> String {
        format!("{}/variables.properties", self.default_model_directory())
    }

    pub fn default_archive_file(&self) -> String {
        format!("{}/archive.zip", self.default_model_directory())
    }

    /// Load model text and variables for the file names already read from
    /// the project file.
    pub fn set_model_contents(&self, contents: &ModelContents) {
        *self
            .model_file_contents
            .write()
            .unwrap_or_else(PoisonError::into_inner) = contents.models.clone();
        let current = self
            .model_files
            .first()
            .and_then(|file| contents.models.get(&file).cloned())
            .unwrap_or_default();
        self.set_model_content(&current);

        let variables = self
            .properties_files
            .first()
            .and_then(|file| contents.properties.get(&file))
            .cloned()
            .unwrap_or_default();
        let rows: Vec<Record> = variables
            .into_iter()
            .enumerate()
            .map(|(uid, (name, value))| {
                let mut row = Record::new();
                row.insert("uid".to_string(), json!(uid));
                row.insert("Name".to_string(), Value::String(name));
                row.insert("Value".to_string(), value);
                row
            })
            .collect();
        self.properties.reset_default(rows);
    }

    /// Model text and variables to write next to the project file.
    pub fn get_model_contents(&self) -> ModelContents {
        let mut contents = ModelContents {
            models: self
                .model_file_contents
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            properties: BTreeMap::new(),
        };
        if let Some(file) = self.properties_files.first() {
            contents.properties.insert(file, self.model_properties());
        }
        contents
    }

    /// Variables as `{Name: Value}`.
    pub fn model_properties(&self) -> Map<String, Value> {
        self.properties
            .records()
            .into_iter()
            .filter_map(|row| {
                let name = validation::value_text(row.get("Name")?);
                let value = row.get("Value").cloned().unwrap_or(Value::Null);
                (!name.is_empty()).then_some((name, value))
            })
            .collect()
    }

    /// Variables whose `Override` is set, as `{Name: Override}`.
    pub fn property_overrides(&self) -> Map<String, Value> {
        overrides_in(&self.properties)
    }

    pub fn set_property_override_value(&self, name: &str, value: Value) {
        set_override(&self.properties, name, value);
    }

    /// Variables referenced from the model text with their use counts, in
    /// order of first reference.
    pub fn property_references(&self) -> Vec<PropertyReference> {
        let Some(pattern) = PROPERTY_TOKEN.as_ref() else {
            return Vec::new();
        };
        let text = self.model_content.get();
        let mut found: Vec<(String, PropertyReference)> = Vec::new();
        for caps in pattern.captures_iter(&text) {
            let name = caps.name("name").map_or("", |m| m.as_str());
            let env_var = caps.name("envvar").map(|m| m.as_str().to_string());
            let key = token_key(env_var.as_deref(), name);
            match found.iter_mut().find(|(k, _)| *k == key) {
                Some((_, reference)) => reference.reference_count += 1,
                None => found.push((
                    key,
                    PropertyReference {
                        name: name.to_string(),
                        env_var,
                        reference_count: 1,
                    },
                )),
            }
        }
        found.into_iter().map(|(_, reference)| reference).collect()
    }

    /// Secrets referenced from the model text. See [`scan_secrets`].
    pub fn secrets(&self, include_admin_credentials: bool) -> Vec<ModelSecret> {
        scan_secrets(&self.model_content.get(), include_admin_credentials)
    }

    /// Check that the model text is present and is valid YAML.
    pub fn validate_model(&self) -> Result<(), ValidationError> {
        let text = self.model_content.get();
        if let Some(message) = validation::required_message(&Value::String(text.clone())) {
            return Err(ValidationError::new(message));
        }
        serde_yaml::from_str::<serde_yaml::Value>(&text)
            .map(|_| ())
            .map_err(|e| ValidationError::new(e.to_string()))
    }
}

impl ConfigPage for WdtModelPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    /// Model text or variables without a file get the default file names
    /// before the file lists are written.
    fn write_to(&self, json: &mut Map<String, Value>) {
        let text = self.model_content.get();
        if !text.is_empty() && self.model_files.value().is_empty() {
            let file = self.default_model_file();
            self.model_files.set_value([file.clone()]);
            self.model_file_contents
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(file, text);
        }
        if !self.properties.is_empty() && self.properties_files.value().is_empty() {
            self.properties_files.set_value([self.default_properties_file()]);
        }
        self.group.write_to(json);
    }

    fn is_changed(&self) -> bool {
        let mut changed = self.group.is_changed();
        if self.properties.has_value() {
            tracing::debug!("model properties have changed");
            changed = true;
        }
        if self.model_text_changed.load(Ordering::Relaxed) {
            tracing::debug!("model text has changed");
            changed = true;
        }
        changed
    }

    fn set_not_changed(&self) {
        self.group.set_not_changed();
        self.properties.set_not_changed();
        self.model_text_changed.store(false, Ordering::Relaxed);
    }

    fn validate(&self, report: &mut ValidationReport) {
        report.add_field("model.modelContent", self.validate_model());
        self.group.validate(self.required_fields(), report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"
domainInfo:
  AdminUserName: '@@SECRET:__weblogic-credentials__:username@@'
  AdminPassword: '@@SECRET:__weblogic-credentials__:password@@'
topology:
  Name: orders
  ListenPort: '@@PROP:AdminPort@@'
resources:
  JDBCSystemResource:
    myds:
      JdbcResource:
        JDBCDriverParams:
          URL: '@@PROP:JDBC.myds.URL@@'
          PasswordEncrypted: '@@SECRET:@@ENV:DOMAIN_UID@@-jdbc-myds:password@@'
          Properties:
            user:
              Value: '@@SECRET:DOMAIN_UID-jdbc-myds:username@@'
    other:
      JdbcResource:
        JDBCDriverParams:
          URL: '@@PROP:JDBC.myds.URL@@'
"#;

    fn contents() -> ModelContents {
        let mut contents = ModelContents::default();
        contents
            .models
            .insert("orders-models/model.yaml".to_string(), MODEL.to_string());
        let mut vars = Map::new();
        vars.insert("AdminPort".to_string(), json!("7001"));
        vars.insert("JDBC.myds.URL".to_string(), json!("jdbc:mysql://db/orders"));
        contents
            .properties
            .insert("orders-models/variables.properties".to_string(), vars);
        contents
    }

    fn loaded() -> WdtModelPage {
        let page = WdtModelPage::new();
        page.read_from(&json!({"model": {
            "modelFiles": ["orders-models/model.yaml"],
            "propertiesFiles": ["orders-models/variables.properties"]
        }}));
        page.set_model_contents(&contents());
        page.set_not_changed();
        page
    }

    #[test]
    fn domain_name_tracks_the_model_text() {
        let page = WdtModelPage::new();
        assert_eq!(page.domain_name.get(), json!("base_domain"));
        page.set_model_content("topology:\n  Name: orders\n");
        assert_eq!(page.domain_name.get(), json!("orders"));
        page.set_model_content("topology: [unclosed");
        assert_eq!(page.domain_name.get(), json!("orders"));
        page.set_model_content("topology:\n  AdminServerName: admin\n");
        assert_eq!(page.domain_name.get(), json!("base_domain"));
        assert!(page.is_changed());
    }

    #[test]
    fn loading_contents_then_rebaselining_is_clean() {
        let page = loaded();
        assert_eq!(page.domain_name.get(), json!("orders"));
        assert_eq!(page.model_properties()["AdminPort"], json!("7001"));
        assert!(!page.is_changed());
        assert_eq!(page.get_model_contents(), contents());
    }

    #[test]
    fn secrets_are_merged_by_resolved_name() {
        let page = loaded();
        let secrets = page.secrets(false);
        assert_eq!(
            secrets,
            vec![ModelSecret {
                name: "-jdbc-myds".to_string(),
                env_var: Some("DOMAIN_UID".to_string()),
                fields: vec!["password".to_string(), "username".to_string()],
            }]
        );
        let with_admin = page.secrets(true);
        assert_eq!(with_admin[0].name, ADMIN_SECRET_NAME);
        assert_eq!(with_admin[0].fields, vec!["username", "password"]);
    }

    #[test]
    fn property_references_are_counted() {
        let page = loaded();
        let refs = page.property_references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].name, "AdminPort");
        assert_eq!(refs[1].name, "JDBC.myds.URL");
        assert_eq!(refs[1].reference_count, 2);
    }

    #[test]
    fn overrides_mark_the_model_changed() {
        let page = loaded();
        page.set_property_override_value("AdminPort", json!("8001"));
        page.set_property_override_value("Missing", json!("x"));
        assert!(page.is_changed());
        assert_eq!(Value::Object(page.property_overrides()), json!({"AdminPort": "8001"}));
    }

    #[test]
    fn new_model_text_gets_default_file_names() {
        let page = WdtModelPage::new();
        page.set_project_file_prefix(Some("orders"));
        page.set_model_content("topology:\n  Name: orders\n");
        let mut json = Map::new();
        page.write_to(&mut json);
        assert_eq!(json["model"]["modelFiles"], json!(["orders-models/model.yaml"]));
        assert_eq!(
            page.get_model_contents().models["orders-models/model.yaml"],
            "topology:\n  Name: orders\n"
        );

        let unnamed = WdtModelPage::new();
        assert_eq!(unnamed.default_properties_file(), "models/variables.properties");
    }

    #[test]
    fn validation_requires_parsable_text() {
        let page = WdtModelPage::new();
        let mut report = ValidationReport::new("validate model");
        page.validate(&mut report);
        assert_eq!(report.fields[0].field_name, "model.modelContent");

        page.set_model_content("topology: [unclosed");
        assert!(page.validate_model().is_err());
        page.set_model_content("topology:\n  Name: ok\n");
        assert!(page.validate_model().is_ok());
    }
}
