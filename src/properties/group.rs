//! Explicit schema binding one page's properties to `json[<name>]`.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Property, PropertyKind};
use crate::validation::ValidationReport;

/// Top-level project key listing the dotted paths of masked credentials.
pub const CREDENTIAL_PATHS: &str = "credentialPaths";

struct GroupField {
    key: String,
    property: Box<dyn Property>,
}

/// Describes one field of a group, for hosts that render pages generically.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub key: String,
    pub kind: PropertyKind,
    pub credential: bool,
}

/// A named collection of properties persisted together.
pub struct PropertyGroup {
    name: String,
    fields: Vec<GroupField>,
}

impl PropertyGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Register `property` under `key`.
    pub fn field<P>(mut self, key: &str, property: &P) -> Self
    where
        P: Property + Clone + 'static,
    {
        debug_assert!(
            self.get(key).is_none(),
            "field {key} registered twice in group {}",
            self.name
        );
        self.fields.push(GroupField {
            key: key.to_string(),
            property: Box::new(property.clone()),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&dyn Property> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.property.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn schema(&self) -> Vec<FieldSchema> {
        self.fields
            .iter()
            .map(|f| FieldSchema {
                key: f.key.clone(),
                kind: f.property.kind(),
                credential: f.property.is_credential(),
            })
            .collect()
    }

    /// Load every registered field from `json[name]`. Fields that are
    /// missing (or a fragment that is not an object) reset to their
    /// defaults.
    pub fn read_from(&self, json: &Value) {
        let fragment = match json.get(&self.name) {
            Some(Value::Object(map)) => Some(map),
            Some(Value::Null) | None => None,
            Some(_) => {
                tracing::warn!("project section {} is not an object; using defaults", self.name);
                None
            }
        };
        for field in &self.fields {
            match fragment.and_then(|m| m.get(&field.key)) {
                Some(value) => field.property.set_persisted_value(value),
                None => field.property.clear(),
            }
        }
    }

    /// Write every field that differs from its declared default into
    /// `json[name]`, and the paths of masked credentials into
    /// `json.credentialPaths`. Nothing is written for a group at its
    /// defaults.
    pub fn write_to(&self, json: &mut Map<String, Value>) {
        let mut contents = Map::new();
        let mut credential_paths = Vec::new();
        for field in &self.fields {
            if field.property.is_credential() {
                if field.property.persisted_value().is_some() {
                    credential_paths.push(format!("{}.{}", self.name, field.key));
                }
                continue;
            }
            let (value, masked) = field.property.masked_persisted_value();
            credential_paths.extend(
                masked
                    .into_iter()
                    .map(|path| format!("{}.{}.{path}", self.name, field.key)),
            );
            if let Some(value) = value {
                contents.insert(field.key.clone(), value);
            }
        }

        if !contents.is_empty() {
            match json.get_mut(&self.name) {
                Some(Value::Object(existing)) => existing.extend(contents),
                _ => {
                    json.insert(self.name.clone(), Value::Object(contents));
                }
            }
        }
        record_credential_paths(json, credential_paths);
    }

    pub fn is_changed(&self) -> bool {
        let mut changed = false;
        for field in &self.fields {
            if field.property.has_value() {
                tracing::debug!("is_changed: {} {}", self.name, field.key);
                changed = true;
            }
        }
        changed
    }

    pub fn set_not_changed(&self) {
        for field in &self.fields {
            field.property.set_not_changed();
        }
    }

    /// Validate every field; keys listed in `required` must also be
    /// non-empty.
    pub fn validate(&self, required: &[&str], report: &mut ValidationReport) {
        for field in &self.fields {
            let path = format!("{}.{}", self.name, field.key);
            let is_required = required.contains(&field.key.as_str());
            field.property.validate_into(&path, is_required, report);
        }
    }
}

/// Append `paths` to the project's `credentialPaths` array.
pub fn record_credential_paths(json: &mut Map<String, Value>, paths: Vec<String>) {
    if paths.is_empty() {
        return;
    }
    let entry = json
        .entry(CREDENTIAL_PATHS)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    if let Value::Array(existing) = entry {
        existing.extend(paths.into_iter().map(Value::String));
    }
}
