//! Field validators and the report a host renders before an action runs.
//!
//! Validators only run on explicit validation requests; loading a project
//! never validates.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// A single check applied to a (non-empty) field value.
pub type Validator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// The first failure reported for one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Render a JSON value the way validators see it.
///
/// Strings are trimmed, `null` becomes empty, everything else uses its JSON
/// text (so the port `31001` validates as `"31001"`).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Run `validators` against `value`.
///
/// Empty values are only checked when `required` is set, in which case the
/// emptiness itself is the failure. Returns the first failing message.
pub fn validate_field(
    validators: &[Validator],
    value: &Value,
    required: bool,
) -> Result<(), ValidationError> {
    if required {
        if let Some(message) = required_message(value) {
            return Err(ValidationError::new(message));
        }
    }
    let text = value_text(value);
    if text.is_empty() {
        return Ok(());
    }
    for validator in validators {
        validator(&text).map_err(ValidationError::new)?;
    }
    Ok(())
}

/// The message used when a required field has no value, if it has none.
pub fn required_message(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => Some("value is not defined"),
        Value::String(s) if s.trim().is_empty() => Some("value is empty"),
        Value::Array(a) if a.is_empty() => Some("list is empty"),
        _ => None,
    }
}

// ── Built-in validators ───────────────────────────────────────────────────────

const HOST: &str = r"(?:(?:[a-zA-Z0-9]+|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])(?:(?:[.](?:[a-zA-Z0-9]+|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]))+)?)";
const NAME_COMPONENT: &str = r"(?:(?:[a-z0-9]+)(?:(?:[._]|__|[-]?)(?:[a-z0-9]+))*)";
const TAG: &str = r"[\w][\w.-]{0,127}";
const DIGEST: &str = r"[A-Za-z][A-Za-z0-9]*(?:(?:[-_+.][A-Za-z][A-Za-z0-9]*)*)[:][0-9A-Fa-f]{32,}";

static IMAGE_REFERENCE: Lazy<Option<Regex>> = Lazy::new(|| {
    let host_and_port = format!(r"(?:{HOST}(?:[:][0-9]{{1,5}})?)");
    let name = format!(r"(?:(?:{host_and_port})[/])?{NAME_COMPONENT}(?:[/]{NAME_COMPONENT})*");
    compile(&format!(r"^(?:{name})(?:(?:[:](?:{TAG}))|(?:[@](?:{DIGEST})))?$"))
});

static HOST_NAME: Lazy<Option<Regex>> = Lazy::new(|| compile(&format!("^{HOST}$")));

static K8S_NAME: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^[a-z0-9](?:[-a-z0-9]{0,61}[a-z0-9])?$"));

static EMAIL_ADDRESS: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(concat!(
        r##"^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*"##,
        r##"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"##,
        r"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
        r"|\[(?:(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.){3}",
        r"(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\])$",
    ))
});

static INGRESS_PATH: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^/\S*$"));

static JAVA_MEMORY: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^[1-9]\d*[kKmMgG]?$"));

static K8S_MEMORY: Lazy<Option<Regex>> = Lazy::new(|| compile(r"^[1-9]\d*(?:[EPTGMK]i?)?$"));

static K8S_CPU: Lazy<[Option<Regex>; 3]> = Lazy::new(|| {
    [
        compile(r"^[1-9]\d*[Mm]?$"),
        compile(r"^\d+(?:\.\d{1,3})?$"),
        compile(r"^0\.\d{1,3}$"),
    ]
});

/// A pattern that fails to compile is logged and then skipped by its
/// validator.
fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| tracing::error!("invalid validator pattern {pattern}: {e}"))
        .ok()
}

fn matches(regex: &Option<Regex>, value: &str) -> bool {
    regex.as_ref().map_or(true, |re| re.is_match(value))
}

fn pattern(regex: &'static Lazy<Option<Regex>>, what: &'static str) -> Validator {
    Arc::new(move |value: &str| {
        if matches(regex, value) {
            Ok(())
        } else {
            Err(format!("{value} is not a valid {what}"))
        }
    })
}

fn max_length(max: usize) -> Validator {
    Arc::new(move |value: &str| {
        let len = value.chars().count();
        if len <= max {
            Ok(())
        } else {
            Err(format!("value must be at most {max} characters long, got {len}"))
        }
    })
}

pub fn image_reference() -> Vec<Validator> {
    vec![pattern(&IMAGE_REFERENCE, "image reference"), max_length(255)]
}

pub fn k8s_name() -> Vec<Validator> {
    vec![pattern(&K8S_NAME, "Kubernetes name")]
}

pub fn host_name() -> Vec<Validator> {
    vec![pattern(&HOST_NAME, "host name"), max_length(63)]
}

pub fn email_address() -> Vec<Validator> {
    vec![pattern(&EMAIL_ADDRESS, "e-mail address"), max_length(320)]
}

pub fn ingress_path() -> Vec<Validator> {
    vec![pattern(&INGRESS_PATH, "ingress path")]
}

pub fn java_memory() -> Vec<Validator> {
    vec![pattern(&JAVA_MEMORY, "Java heap size")]
}

pub fn k8s_memory() -> Vec<Validator> {
    vec![pattern(&K8S_MEMORY, "Kubernetes memory quantity")]
}

pub fn k8s_cpu() -> Vec<Validator> {
    vec![Arc::new(|value: &str| {
        if K8S_CPU.iter().any(|re| matches(re, value)) {
            Ok(())
        } else {
            Err(format!("{value} is not a valid Kubernetes CPU quantity"))
        }
    })]
}

pub fn port_number() -> Vec<Validator> {
    vec![Arc::new(|value: &str| match value.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(()),
        _ => Err(format!("{value} is not a port number between 1 and 65535")),
    })]
}

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    /// Dotted path of the field, e.g. `image.imageTag`.
    pub field_name: String,
    pub errors: Vec<String>,
}

/// Collected field errors for one user action.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub flow_name: String,
    pub fields: Vec<FieldErrors>,
}

impl ValidationReport {
    pub fn new(flow_name: impl Into<String>) -> Self {
        Self {
            flow_name: flow_name.into(),
            fields: Vec::new(),
        }
    }

    /// Record `result` for `field_name`; successes are ignored.
    pub fn add_field(&mut self, field_name: impl Into<String>, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            let field_name = field_name.into();
            match self.fields.iter_mut().find(|f| f.field_name == field_name) {
                Some(existing) => existing.errors.push(e.message),
                None => self.fields.push(FieldErrors {
                    field_name,
                    errors: vec![e.message],
                }),
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.fields.len()
    }

    /// One line per failing field, used for `AppError::Validation`.
    pub fn summary(&self) -> String {
        let lines: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.field_name, f.errors.join("; ")))
            .collect();
        format!(
            "{} validation failed for {} field(s): {}",
            self.flow_name,
            self.error_count(),
            lines.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(validators: &[Validator], value: &str) -> bool {
        validate_field(validators, &json!(value), false).is_ok()
    }

    #[test]
    fn k8s_names() {
        let v = k8s_name();
        assert!(check(&v, "weblogic-operator-ns"));
        assert!(check(&v, "a"));
        assert!(!check(&v, "Upper"));
        assert!(!check(&v, "-leading"));
        assert!(!check(&v, "trailing-"));
        assert!(!check(&v, &"a".repeat(64)));
    }

    #[test]
    fn image_references() {
        let v = image_reference();
        assert!(check(&v, "container-registry.oracle.com/middleware/weblogic:12.2.1.4"));
        assert!(check(&v, "localhost:5000/app"));
        assert!(check(&v, "busybox"));
        assert!(!check(&v, "Bad Image"));
        assert!(!check(&v, "repo:"));
    }

    #[test]
    fn host_names_are_limited_to_63_characters() {
        let v = host_name();
        assert!(check(&v, "elasticsearch.default.svc.cluster.local"));
        assert!(!check(&v, "under_score"));
        assert!(!check(&v, &"a".repeat(64)));
    }

    #[test]
    fn email_addresses() {
        let v = email_address();
        assert!(check(&v, "someone@example.com"));
        assert!(!check(&v, "not-an-address"));
    }

    #[test]
    fn port_numbers_accept_numbers_and_strings() {
        let v = port_number();
        assert!(validate_field(&v, &json!(31001), false).is_ok());
        assert!(check(&v, "80"));
        assert!(!check(&v, "0"));
        assert!(!check(&v, "65536"));
        assert!(!check(&v, "http"));
    }

    #[test]
    fn memory_and_cpu_quantities() {
        assert!(check(&java_memory(), "256m"));
        assert!(!check(&java_memory(), "0m"));
        assert!(check(&k8s_memory(), "512Mi"));
        assert!(!check(&k8s_memory(), "512MB"));
        assert!(check(&k8s_cpu(), "500m"));
        assert!(check(&k8s_cpu(), "0.5"));
        assert!(check(&k8s_cpu(), "2"));
        assert!(!check(&k8s_cpu(), "0.5555"));
    }

    #[test]
    fn ingress_paths_start_with_a_slash() {
        assert!(check(&ingress_path(), "/console"));
        assert!(!check(&ingress_path(), "console"));
    }

    #[test]
    fn empty_values_only_fail_when_required() {
        let v = k8s_name();
        assert!(validate_field(&v, &json!(""), false).is_ok());
        assert!(validate_field(&v, &Value::Null, false).is_ok());

        let err = validate_field(&v, &json!("  "), true).expect_err("required");
        assert_eq!(err.message, "value is empty");
        let err = validate_field(&v, &Value::Null, true).expect_err("required");
        assert_eq!(err.message, "value is not defined");
    }

    #[test]
    fn first_failure_is_reported() {
        let v = host_name();
        let err = validate_field(&v, &json!("bad_host"), false).expect_err("invalid");
        assert!(err.message.contains("host name"), "got: {}", err.message);
    }

    #[test]
    fn report_groups_errors_by_field() {
        let mut report = ValidationReport::new("Deploy Operator");
        report.add_field("wko.k8sNamespace", Ok(()));
        assert!(!report.has_errors());

        report.add_field("wko.k8sNamespace", Err(ValidationError::new("bad")));
        report.add_field("wko.k8sNamespace", Err(ValidationError::new("worse")));
        report.add_field("wko.operatorImage", Err(ValidationError::new("missing")));

        assert!(report.has_errors());
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.fields[0].errors, vec!["bad", "worse"]);
        assert!(report.summary().contains("2 field(s)"));
    }
}
