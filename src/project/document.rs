//! The in-memory project: every configuration page plus session state.

use serde_json::{Map, Value};

use super::migration;
use crate::error::AppError;
use crate::models::{
    ConfigPage, HostDefaults, ImagePage, IngressPage, K8sDomainPage, KubectlPage, ModelContents,
    SettingsPage, VzApplicationPage, VzComponentPage, VzInstallPage, WdtModelPage, WkoPage,
};
use crate::observable::Signal;
use crate::properties::CREDENTIAL_PATHS;
use crate::validation::ValidationReport;

/// Keys of the pages, in the order they are read, written and validated.
pub const PAGE_NAMES: [&str; 10] = [
    "model",
    "image",
    "kubectl",
    "k8sDomain",
    "wko",
    "settings",
    "ingress",
    "vzInstall",
    "vzComponent",
    "vzApplication",
];

/// Shown for proxy and tool settings the host could not resolve.
pub const NOT_SET: &str = "not set";

pub struct Project {
    name: Option<String>,
    uuid: Option<String>,
    /// Results of inspecting the model (clusters, default secret
    /// usernames); carried through load and save untouched.
    domain_info: Option<Map<String, Value>>,
    /// Top-level sections no page reads, written back unchanged.
    other_sections: Map<String, Value>,

    pub model: WdtModelPage,
    pub settings: SettingsPage,
    pub wko: WkoPage,
    pub image: ImagePage,
    pub kubectl: KubectlPage,
    pub k8s_domain: K8sDomainPage,
    pub ingress: IngressPage,
    pub vz_install: VzInstallPage,
    pub vz_component: VzComponentPage,
    pub vz_application: VzApplicationPage,

    pub https_proxy_url: String,
    pub bypass_proxy_hosts: String,
    pub image_tool_script: String,
    /// Notified after every load so dependents can refresh derived state.
    post_open: Signal<()>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(&HostDefaults::default())
    }
}

impl Project {
    pub fn new(defaults: &HostDefaults) -> Self {
        let model = WdtModelPage::new();
        let settings = SettingsPage::new(defaults);
        let wko = WkoPage::new(defaults);
        let image = ImagePage::new(&settings, &wko, &model);
        let kubectl = KubectlPage::new(defaults);
        let k8s_domain = K8sDomainPage::new(&model, &image);
        let ingress = IngressPage::new(defaults);
        let vz_component = VzComponentPage::new(&k8s_domain);
        let vz_application = VzApplicationPage::new(&k8s_domain);
        Self {
            name: None,
            uuid: None,
            domain_info: None,
            other_sections: Map::new(),
            model,
            settings,
            wko,
            image,
            kubectl,
            k8s_domain,
            ingress,
            vz_install: VzInstallPage::new(),
            vz_component,
            vz_application,
            https_proxy_url: or_not_set(&defaults.https_proxy_url),
            bypass_proxy_hosts: or_not_set(&defaults.bypass_proxy_hosts),
            image_tool_script: or_not_set(&defaults.image_tool_script),
            post_open: Signal::new(()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name also prefixes default model file names.
    pub fn set_name(&mut self, name: Option<String>) {
        self.model.set_project_file_prefix(name.as_deref());
        self.name = name;
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    pub fn set_uuid(&mut self, uuid: Option<String>) {
        self.uuid = uuid;
    }

    pub fn domain_info(&self) -> Option<&Map<String, Value>> {
        self.domain_info.as_ref()
    }

    /// Record the cluster list reported by model inspection.
    pub fn update_cluster_data(&mut self, clusters: Value) {
        self.domain_info_mut().insert("clusters".to_string(), clusters);
    }

    /// Record `{secretName: defaultUsername}` for each inspected secret.
    pub fn update_default_secret_usernames(&mut self, secrets: &Value) {
        let usernames: Vec<Value> = secrets
            .get("secrets")
            .and_then(Value::as_array)
            .map(|secrets| {
                secrets
                    .iter()
                    .map(|secret| {
                        let name = secret
                            .get("name")
                            .map(crate::validation::value_text)
                            .unwrap_or_default();
                        let username = secret
                            .get("keys")
                            .and_then(Value::as_array)
                            .and_then(|keys| {
                                keys.iter()
                                    .rev()
                                    .find(|k| k.get("key") == Some(&Value::from("username")))
                            })
                            .and_then(|k| k.get("defaultValue"))
                            .cloned()
                            .unwrap_or(Value::Null);
                        let mut entry = Map::new();
                        entry.insert(name, username);
                        Value::Object(entry)
                    })
                    .collect()
            })
            .unwrap_or_default();
        self.domain_info_mut()
            .insert("defaultSecretUsernames".to_string(), Value::Array(usernames));
    }

    fn domain_info_mut(&mut self) -> &mut Map<String, Value> {
        self.domain_info.get_or_insert_with(Map::new)
    }

    pub fn pages(&self) -> [&dyn ConfigPage; 10] {
        [
            &self.model,
            &self.image,
            &self.kubectl,
            &self.k8s_domain,
            &self.wko,
            &self.settings,
            &self.ingress,
            &self.vz_install,
            &self.vz_component,
            &self.vz_application,
        ]
    }

    pub fn page(&self, name: &str) -> Option<&dyn ConfigPage> {
        self.pages().into_iter().find(|p| p.name() == name)
    }

    /// Load a project file and its model files. Old layouts are migrated
    /// first; anything missing or malformed falls back to defaults.
    pub fn set_from_json(&mut self, project: &Value, model_contents: &ModelContents) {
        self.domain_info = project.get("domainInfo").and_then(Value::as_object).cloned();
        let text = |key: &str| project.get(key).and_then(Value::as_str).map(str::to_string);
        self.set_name(text("name"));
        self.set_uuid(text("uuid"));

        let mut project = project.clone();
        migration::convert_old_project_format(&mut project);
        self.other_sections = project
            .as_object()
            .map(|sections| {
                sections
                    .iter()
                    .filter(|(key, _)| !is_known_section(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for page in self.pages() {
            page.read_from(&project);
        }
        self.model.set_model_contents(model_contents);
        self.k8s_domain.load_property_override_values(&project);
        tracing::debug!(
            "project {} loaded",
            self.name.as_deref().unwrap_or("(unnamed)")
        );
        self.post_open.notify();
    }

    /// The JSON written to the project file.
    pub fn get_project_contents(&self) -> Value {
        let mut contents = Map::new();
        if let Some(name) = &self.name {
            contents.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(uuid) = &self.uuid {
            contents.insert("uuid".to_string(), Value::String(uuid.clone()));
        }
        for page in self.pages() {
            page.write_to(&mut contents);
        }
        for (key, value) in &self.other_sections {
            contents.insert(key.clone(), value.clone());
        }
        if let Some(info) = &self.domain_info {
            contents.insert("domainInfo".to_string(), Value::Object(info.clone()));
        }
        Value::Object(contents)
    }

    pub fn get_model_contents(&self) -> ModelContents {
        self.model.get_model_contents()
    }

    /// `true` when any page has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        let mut dirty = false;
        for page in self.pages() {
            if page.is_changed() {
                dirty = true;
            }
        }
        dirty
    }

    pub fn set_not_dirty(&self) {
        for page in self.pages() {
            page.set_not_changed();
        }
    }

    pub fn post_open_signal(&self) -> Signal<()> {
        self.post_open.clone()
    }

    /// Validate one page for a user action named `flow`.
    pub fn validate_page(&self, name: &str, flow: &str) -> Result<ValidationReport, AppError> {
        let page = self
            .page(name)
            .ok_or_else(|| AppError::NotFound(format!("no page named {name}")))?;
        let mut report = ValidationReport::new(flow);
        page.validate(&mut report);
        Ok(report)
    }
}

fn or_not_set(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_SET.to_string())
}

fn is_known_section(key: &str) -> bool {
    matches!(key, "name" | "uuid" | "domainInfo" | CREDENTIAL_PATHS) || PAGE_NAMES.contains(&key)
}
