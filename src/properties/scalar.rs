//! Single-valued properties.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::compare::{trimmed, values_equal};
use super::{Property, PropertyError, PropertyKind};
use crate::observable::{Signal, SubscriptionId};
use crate::validation::{self, ValidationError, ValidationReport, Validator};

enum DefaultSource {
    Constant(Value),
    /// Recomputed from other signals; the property follows it until an
    /// explicit value is set.
    Computed(Signal<Value>),
}

struct ScalarInner {
    observable: Signal<Value>,
    default: DefaultSource,
    explicit: RwLock<Option<Value>>,
    baseline: RwLock<Option<Value>>,
    credential: AtomicBool,
    validators: RwLock<Vec<Validator>>,
}

/// A property holding one string, number or boolean.
#[derive(Clone)]
pub struct ScalarProperty {
    inner: Arc<ScalarInner>,
}

impl ScalarProperty {
    fn with_default(default: DefaultSource) -> Self {
        let initial = match &default {
            DefaultSource::Constant(v) => v.clone(),
            DefaultSource::Computed(signal) => signal.get(),
        };
        let property = Self {
            inner: Arc::new(ScalarInner {
                observable: Signal::new(initial),
                default,
                explicit: RwLock::new(None),
                baseline: RwLock::new(None),
                credential: AtomicBool::new(false),
                validators: RwLock::new(Vec::new()),
            }),
        };

        if let DefaultSource::Computed(signal) = &property.inner.default {
            let weak = Arc::downgrade(&property.inner);
            signal.subscribe(move |computed| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let following = inner
                    .explicit
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_none();
                if following {
                    inner.observable.set(computed.clone());
                }
            });
        }
        property
    }

    /// A property whose default is a constant.
    pub fn new(default: impl Into<Value>) -> Self {
        Self::with_default(DefaultSource::Constant(default.into()))
    }

    /// A property whose default is the empty string.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// A property whose default fills `${1}`, `${2}`, ... in `pattern` with
    /// the current values of `sources`.
    pub fn template(pattern: &str, sources: &[Signal<Value>]) -> Self {
        let pattern = pattern.to_string();
        Self::computed(sources, move |values| {
            let filled = values.iter().enumerate().fold(pattern.clone(), |acc, (i, v)| {
                acc.replace(&format!("${{{}}}", i + 1), &validation::value_text(v))
            });
            Value::String(filled)
        })
    }

    /// A property whose default is computed from `sources` by `compute`.
    pub fn computed<F>(sources: &[Signal<Value>], compute: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::with_default(DefaultSource::Computed(Signal::computed(sources, compute)))
    }

    /// Mark this property as holding a secret. Credentials are never written
    /// to the project file.
    pub fn as_credential(self) -> Self {
        self.inner.credential.store(true, Ordering::Relaxed);
        self
    }

    pub fn with_validators(self, validators: Vec<Validator>) -> Self {
        self.add_validators(validators);
        self
    }

    pub fn add_validators(&self, validators: Vec<Validator>) {
        self.inner
            .validators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(validators);
    }

    /// The current value; strings are trimmed.
    pub fn value(&self) -> Value {
        trimmed(self.inner.observable.get())
    }

    /// The current value as text (`null` is empty).
    pub fn text(&self) -> String {
        validation::value_text(&self.value())
    }

    /// Booleans, and the strings `"true"` / `"false"`.
    pub fn as_bool(&self) -> bool {
        match self.value() {
            Value::Bool(b) => b,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.value() {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Set an explicit value. For a computed default, setting `null` goes
    /// back to following the computed value.
    pub fn set_value(&self, value: impl Into<Value>) {
        let value = value.into();
        if let DefaultSource::Computed(signal) = &self.inner.default {
            let mut explicit = self
                .inner
                .explicit
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if value.is_null() {
                *explicit = None;
                drop(explicit);
                self.inner.observable.set(signal.get());
                return;
            }
            *explicit = Some(value.clone());
        }
        self.inner.observable.set(value);
    }

    /// The default a fresh project starts with.
    pub fn declared_default(&self) -> Value {
        match &self.inner.default {
            DefaultSource::Constant(v) => v.clone(),
            DefaultSource::Computed(signal) => signal.get(),
        }
    }

    /// The value `has_value()` compares against: the recorded baseline, or
    /// the declared default.
    pub fn default_value(&self) -> Value {
        self.inner
            .baseline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.declared_default())
    }

    pub fn has_value(&self) -> bool {
        !values_equal(&self.value(), &self.default_value())
    }

    pub fn set_not_changed(&self) {
        if self.has_value() {
            *self
                .inner
                .baseline
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(self.value());
        }
    }

    pub fn clear(&self) {
        *self
            .inner
            .explicit
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .inner
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.observable.set(self.declared_default());
    }

    pub fn is_credential(&self) -> bool {
        self.inner.credential.load(Ordering::Relaxed)
    }

    /// Run the validators against the current value.
    pub fn validate(&self, required: bool) -> Result<(), ValidationError> {
        let validators = self
            .inner
            .validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        validation::validate_field(&validators, &self.value(), required)
    }

    /// The signal carrying the (untrimmed) value, for use as a source of
    /// other computed values.
    pub fn observable(&self) -> Signal<Value> {
        self.inner.observable.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.observable.subscribe(callback)
    }

    fn differs_from_declared(&self) -> bool {
        !values_equal(&self.value(), &self.declared_default())
    }
}

impl Property for ScalarProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Scalar
    }

    fn value_json(&self) -> Value {
        self.value()
    }

    fn set_value_json(&self, value: Value) -> Result<(), PropertyError> {
        if value.is_array() || value.is_object() {
            return Err(PropertyError::InvalidValue(
                "expected a string, number or boolean".to_string(),
            ));
        }
        self.set_value(value);
        Ok(())
    }

    fn has_value(&self) -> bool {
        ScalarProperty::has_value(self)
    }

    fn persisted_value(&self) -> Option<Value> {
        self.differs_from_declared().then(|| self.value())
    }

    fn set_persisted_value(&self, value: &Value) {
        if value.is_array() || value.is_object() {
            tracing::warn!("ignoring non-scalar persisted value {value}");
            self.clear();
            return;
        }
        self.set_value(value.clone());
        *self
            .inner
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(self.value());
    }

    fn clear(&self) {
        ScalarProperty::clear(self)
    }

    fn set_not_changed(&self) {
        ScalarProperty::set_not_changed(self)
    }

    fn is_credential(&self) -> bool {
        ScalarProperty::is_credential(self)
    }

    fn validate_into(&self, path: &str, required: bool, report: &mut ValidationReport) {
        report.add_field(path, self.validate(required));
    }
}

impl fmt::Debug for ScalarProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ScalarProperty");
        if self.is_credential() {
            s.field("value", &"***");
        } else {
            s.field("value", &self.value());
        }
        s.field("has_value", &self.has_value()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_property_has_no_value() {
        let p = ScalarProperty::new("mii");
        assert!(!p.has_value());
        assert_eq!(p.value(), json!("mii"));
        assert_eq!(p.persisted_value(), None);
    }

    #[test]
    fn set_not_changed_makes_the_value_the_new_baseline() {
        let p = ScalarProperty::new("mii");
        p.set_value("pv");
        assert!(p.has_value());

        p.set_not_changed();
        assert!(!p.has_value());
        assert_eq!(p.value(), json!("pv"));
        assert_eq!(p.default_value(), json!("pv"));
        // Persistence still compares against the declared default.
        assert_eq!(p.persisted_value(), Some(json!("pv")));
    }

    #[test]
    fn clear_restores_declared_default_and_drops_baseline() {
        let p = ScalarProperty::new(5);
        p.set_persisted_value(&json!(7));
        assert!(!p.has_value());
        p.clear();
        assert_eq!(p.value(), json!(5));
        assert_eq!(p.default_value(), json!(5));
        assert!(!p.has_value());
    }

    #[test]
    fn strings_are_trimmed_and_blank_equals_null() {
        let p = ScalarProperty::empty();
        p.set_value("  ");
        assert!(!p.has_value());
        p.set_value(Value::Null);
        assert!(!p.has_value());
        p.set_value("  x ");
        assert_eq!(p.value(), json!("x"));
        assert_eq!(p.text(), "x");
    }

    #[test]
    fn template_default_follows_sources_until_set() {
        let provider = ScalarProperty::new("traefik");
        let namespace = ScalarProperty::template("${1}-ns", &[provider.observable()]);
        assert_eq!(namespace.value(), json!("traefik-ns"));
        assert!(!namespace.has_value());

        provider.set_value("nginx");
        assert_eq!(namespace.value(), json!("nginx-ns"));
        assert!(!namespace.has_value());

        namespace.set_value("custom");
        provider.set_value("voyager");
        assert_eq!(namespace.value(), json!("custom"));
        assert!(namespace.has_value());

        namespace.clear();
        assert_eq!(namespace.value(), json!("voyager-ns"));
    }

    #[test]
    fn template_with_several_sources() {
        let home = Signal::new(json!("/u01"));
        let name = Signal::new(json!("base_domain"));
        let path = ScalarProperty::template("${1}/domains/${2}", &[home.clone(), name.clone()]);
        assert_eq!(path.text(), "/u01/domains/base_domain");
        home.set(json!("/shared"));
        name.set(json!("mydomain"));
        assert_eq!(path.text(), "/shared/domains/mydomain");
    }

    #[test]
    fn setting_null_resumes_following_the_computed_default() {
        let flag = ScalarProperty::new(false);
        let group = ScalarProperty::computed(&[flag.observable()], |v| {
            let name = if v[0] == json!(true) { "root" } else { "oracle" };
            json!(name)
        });
        group.set_value("staff");
        flag.set_value(true);
        assert_eq!(group.text(), "staff");
        group.set_value(Value::Null);
        assert_eq!(group.text(), "root");
    }

    #[test]
    fn set_persisted_value_records_baseline() {
        let p = ScalarProperty::new("mii");
        p.set_persisted_value(&json!("pv"));
        assert_eq!(p.value(), json!("pv"));
        assert!(!p.has_value());
        p.set_value("wlsonly");
        assert!(p.has_value());
    }

    #[test]
    fn malformed_persisted_value_falls_back_to_default() {
        let p = ScalarProperty::new("mii");
        p.set_value("pv");
        p.set_persisted_value(&json!({"nested": true}));
        assert_eq!(p.value(), json!("mii"));
        assert!(p.set_value_json(json!([1])).is_err());
    }

    #[test]
    fn validation_runs_registered_validators() {
        let p = ScalarProperty::empty().with_validators(validation::k8s_name());
        assert!(p.validate(false).is_ok());
        assert!(p.validate(true).is_err());
        p.set_value("Not_Valid");
        assert!(p.validate(false).is_err());
        p.set_value("valid-name");
        assert!(p.validate(true).is_ok());
    }

    #[test]
    fn credential_flag_and_debug_masking() {
        let p = ScalarProperty::empty().as_credential();
        p.set_value("hunter2");
        assert!(p.is_credential());
        assert!(!format!("{p:?}").contains("hunter2"));
    }

    #[test]
    fn typed_accessors() {
        assert!(ScalarProperty::new(true).as_bool());
        assert!(ScalarProperty::new("TRUE").as_bool());
        assert_eq!(ScalarProperty::new(31001).as_i64(), Some(31001));
        assert_eq!(ScalarProperty::new("9200").as_i64(), Some(9200));
    }

    #[test]
    fn subscribers_see_changes() {
        use std::sync::Mutex;
        let p = ScalarProperty::new("a");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        p.subscribe(move |v| sink.lock().unwrap().push(v.clone()));
        p.set_value("b");
        p.set_value("b");
        assert_eq!(*seen.lock().unwrap(), vec![json!("b")]);
    }
}
