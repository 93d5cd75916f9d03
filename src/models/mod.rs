//! The configuration pages of a project.
//!
//! Each page is a struct of property handles plus the [`PropertyGroup`]
//! that persists them under the page's key in the project file. Hosts edit
//! the handles; the project only talks to pages through [`ConfigPage`].

pub mod image;
pub mod ingress;
pub mod k8s_domain;
pub mod kubectl;
pub mod settings;
pub mod verrazzano;
pub mod wdt_model;
pub mod wko;

pub use image::ImagePage;
pub use ingress::IngressPage;
pub use k8s_domain::K8sDomainPage;
pub use kubectl::KubectlPage;
pub use settings::SettingsPage;
pub use verrazzano::{VzApplicationPage, VzComponentPage, VzInstallPage};
pub use wdt_model::{ModelContents, WdtModelPage};
pub use wko::WkoPage;

use serde_json::{Map, Value};

use crate::executor::{self, CommandExecutor};
use crate::properties::{PropertyGroup, Record};
use crate::validation::ValidationReport;

pub trait ConfigPage: Send + Sync {
    fn group(&self) -> &PropertyGroup;

    /// Fields that must be non-empty when the page is validated.
    fn required_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn name(&self) -> &str {
        self.group().name()
    }

    fn read_from(&self, json: &Value) {
        self.group().read_from(json);
    }

    fn write_to(&self, json: &mut Map<String, Value>) {
        self.group().write_to(json);
    }

    fn is_changed(&self) -> bool {
        self.group().is_changed()
    }

    fn set_not_changed(&self) {
        self.group().set_not_changed();
    }

    fn validate(&self, report: &mut ValidationReport) {
        self.group().validate(self.required_fields(), report);
    }
}

/// Defaults that depend on the host machine, looked up once per session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostDefaults {
    pub java_home: Option<String>,
    pub oracle_home: Option<String>,
    pub kube_config: Vec<String>,
    pub kubectl_path: Option<String>,
    pub helm_path: Option<String>,
    pub docker_path: Option<String>,
    pub podman_path: Option<String>,
    pub openssl_path: Option<String>,
    pub latest_wko_version: Option<String>,
    pub https_proxy_url: Option<String>,
    pub bypass_proxy_hosts: Option<String>,
    pub image_tool_script: Option<String>,
}

impl HostDefaults {
    /// Ask `executor` for every host default. Lookups that fail leave the
    /// default empty.
    pub async fn resolve(executor: &dyn CommandExecutor) -> Self {
        let q = move |command: &'static str| {
            executor::query_string(executor, command, Value::Null)
        };
        let kube_config = match executor.invoke("get-kube-config", Value::Null).await {
            Ok(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Ok(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("get-kube-config failed: {e}");
                Vec::new()
            }
        };
        Self {
            java_home: q("get-java-home").await,
            oracle_home: q("get-oracle-home").await,
            kube_config,
            kubectl_path: q("get-kubectl-file-path").await,
            helm_path: q("get-helm-file-path").await,
            docker_path: q("get-docker-file-path").await,
            podman_path: q("get-podman-file-path").await,
            openssl_path: q("get-openssl-file-path").await,
            latest_wko_version: q("get-latest-wko-version-number").await,
            https_proxy_url: q("get-https-proxy-url").await,
            bypass_proxy_hosts: q("get-bypass-proxy-hosts").await,
            image_tool_script: q("get-image-tool-shell-script-location").await,
        }
    }
}

pub(crate) fn text_or_empty(value: &Option<String>) -> Value {
    Value::String(value.clone().unwrap_or_default())
}

/// Build a list row from `(field, value)` pairs.
pub fn record<V: Into<Value>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> Record {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::StaticExecutor;
    use serde_json::json;

    #[tokio::test]
    async fn host_defaults_collect_what_the_executor_knows() {
        let executor = StaticExecutor::new()
            .with_response("get-java-home", json!("/usr/lib/jvm/jdk-17"))
            .with_response("get-kube-config", json!(["/home/me/.kube/config"]))
            .with_response("get-docker-file-path", json!("/usr/bin/docker"))
            .with_response("get-latest-wko-version-number", Value::Null)
            .with_response("get-https-proxy-url", json!("http://proxy:80"));
        let defaults = HostDefaults::resolve(&executor).await;
        assert_eq!(defaults.java_home.as_deref(), Some("/usr/lib/jvm/jdk-17"));
        assert_eq!(defaults.kube_config, vec!["/home/me/.kube/config"]);
        assert_eq!(defaults.docker_path.as_deref(), Some("/usr/bin/docker"));
        assert_eq!(defaults.oracle_home, None);
        assert_eq!(defaults.latest_wko_version, None);
        assert_eq!(defaults.https_proxy_url.as_deref(), Some("http://proxy:80"));
        assert_eq!(defaults.image_tool_script, None);
    }

    #[test]
    fn record_builds_rows_in_order() {
        let row = record([("uid", "a1"), ("name", "FOO")]);
        assert_eq!(Value::Object(row), json!({"uid": "a1", "name": "FOO"}));
    }
}
