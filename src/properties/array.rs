//! String-list properties edited as comma-separated text.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::{Property, PropertyError, PropertyKind};
use crate::observable::{Signal, SubscriptionId};
use crate::validation::{self, ValidationReport};

struct ArrayInner {
    observable: Signal<Vec<String>>,
    default: Vec<String>,
    baseline: RwLock<Option<Vec<String>>>,
}

/// A property whose value is a list of strings.
///
/// Its text form separates elements with `", "`; text input also accepts
/// `;` and whitespace as separators, and elements may be quoted with `'`,
/// `"` or `` ` `` to keep separators inside them.
#[derive(Clone)]
pub struct ArrayProperty {
    inner: Arc<ArrayInner>,
}

impl ArrayProperty {
    pub fn new<I, S>(default: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default: Vec<String> = default.into_iter().map(Into::into).collect();
        Self {
            inner: Arc::new(ArrayInner {
                observable: Signal::new(default.clone()),
                default,
                baseline: RwLock::new(None),
            }),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn value(&self) -> Vec<String> {
        self.inner.observable.get()
    }

    pub fn first(&self) -> Option<String> {
        self.value().into_iter().next()
    }

    pub fn set_value<I, S>(&self, value: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value: Vec<String> = value
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self.inner.observable.set(value);
    }

    /// The comma-separated text form.
    pub fn text(&self) -> String {
        array_to_string(&self.value())
    }

    /// Replace the value by parsing free-form text.
    pub fn set_text(&self, text: &str) {
        self.set_value(string_to_array(text));
    }

    pub fn declared_default(&self) -> Vec<String> {
        self.inner.default.clone()
    }

    pub fn default_value(&self) -> Vec<String> {
        self.inner
            .baseline
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.declared_default())
    }

    pub fn has_value(&self) -> bool {
        self.value() != self.default_value()
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
            .baseline
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.observable.set(self.declared_default());
    }

    pub fn observable(&self) -> Signal<Vec<String>> {
        self.inner.observable.clone()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Vec<String>) + Send + Sync + 'static,
    {
        self.inner.observable.subscribe(callback)
    }

    fn from_json(value: &Value) -> Result<Vec<String>, PropertyError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(string_to_array(s)),
            Value::Array(items) => Ok(items.iter().map(validation::value_text).collect()),
            other => Err(PropertyError::InvalidValue(format!(
                "expected a list of strings, got {other}"
            ))),
        }
    }
}

impl Property for ArrayProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Array
    }

    fn value_json(&self) -> Value {
        Value::from(self.value())
    }

    fn set_value_json(&self, value: Value) -> Result<(), PropertyError> {
        let items = Self::from_json(&value)?;
        self.set_value(items);
        Ok(())
    }

    fn has_value(&self) -> bool {
        ArrayProperty::has_value(self)
    }

    fn persisted_value(&self) -> Option<Value> {
        let value = self.value();
        (value != self.inner.default).then(|| Value::from(value))
    }

    fn set_persisted_value(&self, value: &Value) {
        match Self::from_json(value) {
            Ok(items) => {
                self.set_value(items);
                *self
                    .inner
                    .baseline
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(self.value());
            }
            Err(e) => {
                tracing::warn!("ignoring persisted list value: {e}");
                self.clear();
            }
        }
    }

    fn clear(&self) {
        ArrayProperty::clear(self)
    }

    fn set_not_changed(&self) {
        ArrayProperty::set_not_changed(self)
    }

    fn validate_into(&self, path: &str, required: bool, report: &mut ValidationReport) {
        report.add_field(
            path,
            validation::validate_field(&[], &self.value_json(), required),
        );
    }
}

fn escape(element: &str) -> String {
    if element.chars().any(|c| c == ',' || c == ';' || c.is_whitespace()) {
        format!("\"{element}\"")
    } else {
        element.to_string()
    }
}

/// Join elements with `", "`, quoting elements that contain separators.
pub fn array_to_string(items: &[String]) -> String {
    items.iter().map(|s| escape(s)).collect::<Vec<_>>().join(", ")
}

/// Split free-form text into elements.
///
/// Separators are `,`, `;` and whitespace. A quote character (`'`, `"` or
/// `` ` ``) starts an element that runs to the matching quote or the end of
/// the text.
pub fn string_to_array(text: &str) -> Vec<String> {
    fn flush(result: &mut Vec<String>, token: &mut String) {
        if !token.is_empty() {
            result.push(std::mem::take(token));
        }
    }

    let mut result = Vec::new();
    let mut token = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                flush(&mut result, &mut token);
                let quoted: String = chars.by_ref().take_while(|&q| q != c).collect();
                let quoted = quoted.trim();
                if !quoted.is_empty() {
                    result.push(quoted.to_string());
                }
            }
            ',' | ';' => flush(&mut result, &mut token),
            c if c.is_whitespace() => flush(&mut result, &mut token),
            c => token.push(c),
        }
    }
    flush(&mut result, &mut token);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_separators() {
        assert_eq!(
            string_to_array("a, b;c\td\n e"),
            vec!["a", "b", "c", "d", "e"]
        );
        assert!(string_to_array("  ,; ").is_empty());
    }

    #[test]
    fn quoted_elements_keep_separators() {
        assert_eq!(
            string_to_array(r#"one "two words" 'a,b' `x;y`"#),
            vec!["one", "two words", "a,b", "x;y"]
        );
        assert_eq!(string_to_array("\"unterminated value"), vec!["unterminated value"]);
    }

    #[test]
    fn text_form_quotes_where_needed() {
        let items = vec!["plain".to_string(), "has space".to_string()];
        let text = array_to_string(&items);
        assert_eq!(text, "plain, \"has space\"");
        assert_eq!(string_to_array(&text), items);
    }

    #[test]
    fn has_value_tracks_default_and_baseline() {
        let p = ArrayProperty::new(["default"]);
        assert!(!p.has_value());
        p.set_text("default other");
        assert!(p.has_value());
        p.set_not_changed();
        assert!(!p.has_value());
        assert_eq!(p.persisted_value(), Some(json!(["default", "other"])));
        p.clear();
        assert_eq!(p.value(), vec!["default"]);
        assert_eq!(p.persisted_value(), None);
    }

    #[test]
    fn persisted_value_accepts_arrays_and_strings() {
        let p = ArrayProperty::empty();
        p.set_persisted_value(&json!(["~/.kube/config"]));
        assert_eq!(p.value(), vec!["~/.kube/config"]);
        assert!(!p.has_value());

        p.set_persisted_value(&json!("a;b"));
        assert_eq!(p.value(), vec!["a", "b"]);

        p.set_persisted_value(&json!({"bad": 1}));
        assert!(p.value().is_empty());
    }

    #[test]
    fn first_element() {
        let p = ArrayProperty::new(["models/model.yaml", "models/extra.yaml"]);
        assert_eq!(p.first().as_deref(), Some("models/model.yaml"));
        assert_eq!(ArrayProperty::empty().first(), None);
    }
}
