//! Record-list properties (tables on the configuration pages).

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};

use super::compare::{is_blank, trimmed, values_equal};
use super::{Property, PropertyError, PropertyKind};
use crate::observable::{Signal, SubscriptionId};
use crate::util;
use crate::validation::{self, ValidationReport, Validator};

/// One row of a list property.
pub type Record = Map<String, Value>;

#[derive(Clone, Default)]
struct ListConfig {
    keys: Vec<String>,
    primary_key: Option<String>,
    persist_by_key: bool,
    credential_fields: Vec<String>,
    field_validators: Vec<(String, Vec<Validator>)>,
}

struct ListState {
    records: Signal<Vec<Record>>,
    default: RwLock<Vec<Record>>,
    baseline: RwLock<Option<Vec<Record>>>,
}

/// An ordered list of records restricted to a declared set of keys.
///
/// With a primary key, key values are unique and missing keys are generated
/// on insert. With [`persist_by_key`](Self::persist_by_key) the list is
/// written as an object keyed by primary key holding only the fields that
/// differ from the matching default record.
#[derive(Clone)]
pub struct ListProperty {
    config: Arc<ListConfig>,
    state: Arc<ListState>,
}

impl ListProperty {
    pub fn new(keys: &[&str]) -> Self {
        debug_assert!(!keys.is_empty(), "a list property needs at least one key");
        Self {
            config: Arc::new(ListConfig {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                ..ListConfig::default()
            }),
            state: Arc::new(ListState {
                records: Signal::new(Vec::new()),
                default: RwLock::new(Vec::new()),
                baseline: RwLock::new(None),
            }),
        }
    }

    /// Declare `primary_key` as the unique row key. It does not count as
    /// data when deciding whether a row is empty.
    pub fn keyed_by(mut self, primary_key: &str) -> Self {
        Arc::make_mut(&mut self.config).primary_key = Some(primary_key.to_string());
        self
    }

    /// Key the list by `primary_key` and persist it as an object keyed by
    /// that field.
    pub fn persist_by_key(mut self, primary_key: &str) -> Self {
        let config = Arc::make_mut(&mut self.config);
        config.primary_key = Some(primary_key.to_string());
        config.persist_by_key = true;
        self
    }

    /// Fields holding secrets; they are never written to the project file.
    pub fn with_credential_fields(mut self, fields: &[&str]) -> Self {
        Arc::make_mut(&mut self.config).credential_fields =
            fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_field_validators(mut self, field: &str, validators: Vec<Validator>) -> Self {
        Arc::make_mut(&mut self.config)
            .field_validators
            .push((field.to_string(), validators));
        self
    }

    pub fn with_default_value(self, records: Vec<Record>) -> Self {
        self.reset_default(records);
        self
    }

    /// Replace the declared default and reset the list to it.
    pub fn reset_default(&self, records: Vec<Record>) {
        let records: Vec<Record> = records.iter().map(|r| self.project(r)).collect();
        *self
            .state
            .default
            .write()
            .unwrap_or_else(PoisonError::into_inner) = records.clone();
        *self
            .state
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.state.records.set(records);
    }

    pub fn keys(&self) -> &[String] {
        &self.config.keys
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.config.primary_key.as_deref()
    }

    /// Every row as stored, including rows without data.
    pub fn records(&self) -> Vec<Record> {
        self.state.records.get()
    }

    pub fn len(&self) -> usize {
        self.state.records.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The rows that carry data, trimmed and restricted to declared keys.
    pub fn value(&self) -> Vec<Record> {
        self.extract(&self.records())
    }

    /// Replace all rows, generating missing primary keys. Fails if two rows
    /// share a primary key.
    pub fn set_value(&self, records: Vec<Record>) -> Result<(), PropertyError> {
        let mut records: Vec<Record> = records.iter().map(|r| self.project(r)).collect();
        if let Some(pk) = self.primary_key() {
            let mut seen = std::collections::HashSet::new();
            for record in &mut records {
                let key = match key_of(record, pk) {
                    Some(key) => key,
                    None => {
                        let key = util::short_uid();
                        record.insert(pk.to_string(), Value::String(key.clone()));
                        key
                    }
                };
                if !seen.insert(key.clone()) {
                    return Err(PropertyError::DuplicateKey { key });
                }
            }
        }
        self.state.records.set(records);
        Ok(())
    }

    /// Append a row, generating its primary key when missing. Returns the
    /// stored row.
    pub fn add_item(&self, record: Record) -> Result<Record, PropertyError> {
        let mut record = self.project(&record);
        if let Some(pk) = self.primary_key() {
            let key = match key_of(&record, pk) {
                Some(key) => key,
                None => {
                    let key = util::short_uid();
                    record.insert(pk.to_string(), Value::String(key.clone()));
                    key
                }
            };
            if self.find_by_key(&key).is_some() {
                return Err(PropertyError::DuplicateKey { key });
            }
        }
        self.state.records.update(|rows| rows.push(record.clone()));
        Ok(record)
    }

    pub fn find_by_key(&self, key: &str) -> Option<Record> {
        let pk = self.primary_key()?;
        self.records()
            .into_iter()
            .find(|r| key_of(r, pk).as_deref() == Some(key))
    }

    fn position_of(&self, key: &str) -> Result<usize, PropertyError> {
        let not_found = || PropertyError::KeyNotFound {
            key: key.to_string(),
        };
        let pk = self.primary_key().ok_or_else(not_found)?;
        self.records()
            .iter()
            .position(|r| key_of(r, pk).as_deref() == Some(key))
            .ok_or_else(not_found)
    }

    pub fn remove_by_key(&self, key: &str) -> Result<Record, PropertyError> {
        let index = self.position_of(key)?;
        self.remove_at(index)
    }

    pub fn remove_at(&self, index: usize) -> Result<Record, PropertyError> {
        let mut rows = self.records();
        if index >= rows.len() {
            return Err(PropertyError::IndexOutOfRange { index });
        }
        let removed = rows.remove(index);
        self.state.records.set(rows);
        Ok(removed)
    }

    /// Set one field of the row with primary key `key`.
    pub fn update_item(&self, key: &str, field: &str, value: Value) -> Result<(), PropertyError> {
        let index = self.position_of(key)?;
        self.update_at(index, field, value)
    }

    pub fn update_at(&self, index: usize, field: &str, value: Value) -> Result<(), PropertyError> {
        if !self.config.keys.iter().any(|k| k == field) {
            return Err(PropertyError::UnknownField {
                field: field.to_string(),
            });
        }
        let mut rows = self.records();
        if index >= rows.len() {
            return Err(PropertyError::IndexOutOfRange { index });
        }
        if self.primary_key() == Some(field) {
            let new_key = validation::value_text(&value);
            let clash = rows.iter().enumerate().any(|(i, r)| {
                i != index && key_of(r, field).as_deref() == Some(new_key.as_str())
            });
            if clash {
                return Err(PropertyError::DuplicateKey { key: new_key });
            }
        }
        rows[index].insert(field.to_string(), value);
        self.state.records.set(rows);
        Ok(())
    }

    pub fn declared_default(&self) -> Vec<Record> {
        self.state
            .default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn default_value(&self) -> Vec<Record> {
        let baseline = self
            .state
            .baseline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        baseline.unwrap_or_else(|| self.extract(&self.declared_default()))
    }

    pub fn has_value(&self) -> bool {
        !values_equal(&to_json(self.value()), &to_json(self.default_value()))
    }

    pub fn set_not_changed(&self) {
        if self.has_value() {
            *self
                .state
                .baseline
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(self.value());
        }
    }

    pub fn clear(&self) {
        *self
            .state
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.state.records.set(self.declared_default());
    }

    pub fn observable(&self) -> Signal<Vec<Record>> {
        self.state.records.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Vec<Record>) + Send + Sync + 'static,
    {
        self.state.records.subscribe(callback)
    }

    // ── internals ────────────────────────────────────────────────────────────

    /// Keep only the declared keys of `record`.
    fn project(&self, record: &Record) -> Record {
        self.config
            .keys
            .iter()
            .filter_map(|k| record.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }

    fn is_data_key(&self, key: &str) -> bool {
        self.primary_key() != Some(key)
    }

    fn extract(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .map(|r| {
                r.iter()
                    .filter(|(k, v)| self.config.keys.contains(k) && !v.is_null())
                    .map(|(k, v)| (k.clone(), trimmed(v.clone())))
                    .collect::<Record>()
            })
            .filter(|r| r.iter().any(|(k, v)| self.is_data_key(k) && !is_blank(v)))
            .collect()
    }

    fn differs_from_declared(&self) -> bool {
        !values_equal(
            &to_json(self.value()),
            &to_json(self.extract(&self.declared_default())),
        )
    }

    /// Fields of `record` that differ from the default row with the same key.
    fn changes(&self, record: &Record, pk: &str, defaults: &[Record]) -> Record {
        let key = key_of(record, pk);
        let matching = defaults
            .iter()
            .find(|d| key.is_some() && key_of(d, pk) == key);
        let null = Value::Null;
        record
            .iter()
            .filter(|(k, _)| k.as_str() != pk)
            .filter(|(k, v)| {
                let default = matching.and_then(|d| d.get(k.as_str())).unwrap_or(&null);
                !values_equal(v, default)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Changed rows keyed by primary key. A default row that is no longer
    /// present is written as `key: null` so that it stays deleted on reload.
    fn per_key_value(&self, pk: &str) -> Record {
        let defaults = self.declared_default();
        let rows = self.value();
        let mut result = Record::new();
        for record in &rows {
            let Some(key) = key_of(record, pk) else {
                continue;
            };
            let changes = self.changes(record, pk, &defaults);
            if !changes.is_empty() {
                result.insert(key, Value::Object(changes));
            }
        }
        for key in defaults.iter().filter_map(|d| key_of(d, pk)) {
            let present = rows.iter().any(|r| key_of(r, pk).as_deref() == Some(key.as_str()));
            if !present {
                result.insert(key, Value::Null);
            }
        }
        result
    }

    /// Rebuild rows from an object keyed by primary key, overlaying each
    /// entry on the default row with the same key. Default rows the object
    /// does not mention keep their place after the loaded ones; a `null`
    /// entry removes the default row with that key.
    fn merge_by_key(&self, pk: &str, entries: &Map<String, Value>) -> Vec<Record> {
        let defaults = self.declared_default();
        if entries.is_empty() {
            return defaults;
        }
        let mut merged: Vec<Record> = Vec::new();
        for (key, fields) in entries {
            let Some(fields) = fields.as_object() else {
                if fields.is_null() {
                    continue;
                }
                tracing::warn!("list entry {key} is not an object; keeping the key only");
                let mut record = Record::new();
                record.insert(pk.to_string(), Value::String(key.clone()));
                merged.push(record);
                continue;
            };
            let mut record = defaults
                .iter()
                .find(|d| key_of(d, pk).as_deref() == Some(key.as_str()))
                .cloned()
                .unwrap_or_default();
            record.insert(pk.to_string(), Value::String(key.clone()));
            for k in self.config.keys.iter().filter(|k| k.as_str() != pk) {
                match fields.get(k) {
                    Some(Value::String(s)) if s.is_empty() => {}
                    Some(v) => {
                        record.insert(k.clone(), v.clone());
                    }
                    None => {}
                }
            }
            merged.push(record);
        }

        for default in defaults {
            let mentioned = key_of(&default, pk)
                .map(|k| entries.contains_key(&k))
                .unwrap_or(false);
            if !mentioned {
                merged.push(default);
            }
        }
        merged
    }

    fn record_baseline(&self) {
        *self
            .state
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.value());
    }
}

impl Property for ListProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::List
    }

    fn value_json(&self) -> Value {
        to_json(self.records())
    }

    fn set_value_json(&self, value: Value) -> Result<(), PropertyError> {
        match value {
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => Ok(map),
                        other => Err(PropertyError::InvalidValue(format!(
                            "expected a record, got {other}"
                        ))),
                    })
                    .collect::<Result<Vec<Record>, _>>()?;
                self.set_value(records)
            }
            other => Err(PropertyError::InvalidValue(format!(
                "expected a list of records, got {other}"
            ))),
        }
    }

    fn has_value(&self) -> bool {
        ListProperty::has_value(self)
    }

    fn as_list(&self) -> Option<&ListProperty> {
        Some(self)
    }

    fn persisted_value(&self) -> Option<Value> {
        if !self.differs_from_declared() {
            return None;
        }
        match (self.config.persist_by_key, self.primary_key()) {
            (true, Some(pk)) => {
                let entries = self.per_key_value(pk);
                (!entries.is_empty()).then_some(Value::Object(entries))
            }
            _ => Some(to_json(self.value())),
        }
    }

    fn set_persisted_value(&self, value: &Value) {
        match value {
            Value::Array(_) => {
                if let Err(e) = self.set_value_json(value.clone()) {
                    tracing::warn!("ignoring persisted list value: {e}");
                    self.clear();
                    return;
                }
            }
            Value::Object(entries) if self.config.persist_by_key => {
                if let Some(pk) = self.config.primary_key.clone() {
                    let merged = self.merge_by_key(&pk, entries);
                    self.state.records.set(merged);
                }
            }
            other => {
                if !other.is_null() {
                    tracing::warn!("ignoring persisted list value of unexpected shape");
                }
                self.clear();
                return;
            }
        }
        self.record_baseline();
    }

    fn clear(&self) {
        ListProperty::clear(self)
    }

    fn set_not_changed(&self) {
        ListProperty::set_not_changed(self)
    }

    fn masked_persisted_value(&self) -> (Option<Value>, Vec<String>) {
        let value = self.persisted_value();
        if self.config.credential_fields.is_empty() {
            return (value, Vec::new());
        }
        let mut paths = Vec::new();
        let masked = value.map(|value| match value {
            Value::Object(mut entries) => {
                for (key, fields) in entries.iter_mut() {
                    if let Some(fields) = fields.as_object_mut() {
                        mask_fields(fields, &self.config.credential_fields, key, &mut paths);
                    }
                }
                Value::Object(entries)
            }
            Value::Array(mut rows) => {
                for (index, row) in rows.iter_mut().enumerate() {
                    if let Some(fields) = row.as_object_mut() {
                        let id = self
                            .primary_key()
                            .and_then(|pk| key_of(fields, pk))
                            .unwrap_or_else(|| index.to_string());
                        mask_fields(fields, &self.config.credential_fields, &id, &mut paths);
                    }
                }
                Value::Array(rows)
            }
            other => other,
        });
        (masked, paths)
    }

    fn validate_into(&self, path: &str, required: bool, report: &mut ValidationReport) {
        if required {
            report.add_field(
                path,
                validation::validate_field(&[], &to_json(self.value()), true),
            );
        }
        for (index, record) in self.value().iter().enumerate() {
            let id = self
                .primary_key()
                .and_then(|pk| key_of(record, pk))
                .unwrap_or_else(|| index.to_string());
            for (field, validators) in &self.config.field_validators {
                let value = record.get(field).cloned().unwrap_or(Value::Null);
                report.add_field(
                    format!("{path}.{id}.{field}"),
                    validation::validate_field(validators, &value, false),
                );
            }
        }
    }
}

fn mask_fields(fields: &mut Record, credentials: &[String], id: &str, paths: &mut Vec<String>) {
    for credential in credentials {
        if let Some(value) = fields.remove(credential) {
            if !is_blank(&value) {
                paths.push(format!("{id}.{credential}"));
            }
        }
    }
}

/// The primary key value of `record` as text, if it has a non-blank one.
fn key_of(record: &Record, pk: &str) -> Option<String> {
    record
        .get(pk)
        .filter(|v| !is_blank(v))
        .map(validation::value_text)
}

fn to_json(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}
