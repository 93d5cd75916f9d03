//! The operator `Domain` resource: identity, pull secrets, clusters,
//! secrets referenced by the model and server tuning.

use serde_json::{json, Map, Value};

use super::wdt_model::{self, ModelSecret};
use super::{ConfigPage, ImagePage, WdtModelPage};
use crate::observable::WeakSignal;
use crate::properties::{ArrayProperty, ListProperty, PropertyGroup, Record, ScalarProperty};
use crate::util;
use crate::validation::{self, value_text};

/// Fields of one `clusters` row.
pub const CLUSTER_KEYS: &[&str] = &[
    "uid",
    "name",
    "maxServers",
    "replicas",
    "minHeap",
    "maxHeap",
    "cpuRequest",
    "cpuLimit",
    "memoryRequest",
    "memoryLimit",
    "disableDebugStdout",
    "disableFan",
    "useUrandom",
    "additionalArguments",
];

/// Environment variable the operator sets to the domain uid.
const DOMAIN_UID_VAR: &str = "DOMAIN_UID";

pub struct K8sDomainPage {
    pub uid: ScalarProperty,
    pub kubernetes_namespace: ScalarProperty,
    /// The image page's `domainHomePath`; persisted there.
    pub domain_home: ScalarProperty,
    /// The image page's `targetDomainType`; persisted there.
    pub domain_type: ScalarProperty,
    pub domain_persistent_volume_name: ScalarProperty,
    pub domain_persistent_volume_mount_path: ScalarProperty,
    pub domain_persistent_volume_claim_name: ScalarProperty,
    pub domain_persistent_volume_log_home_enabled: ScalarProperty,
    pub domain_persistent_volume_log_home: ScalarProperty,
    pub image_registry_pull_require_authentication: ScalarProperty,
    pub image_registry_use_existing_pull_secret: ScalarProperty,
    pub image_registry_pull_secret_name: ScalarProperty,
    pub image_registry_pull_user: ScalarProperty,
    pub image_registry_pull_password: ScalarProperty,
    pub image_registry_pull_email: ScalarProperty,
    pub image_pull_policy: ScalarProperty,
    pub image_model_home: ScalarProperty,
    pub image_wdt_install_home: ScalarProperty,
    pub aux_image_registry_pull_require_authentication: ScalarProperty,
    pub aux_image_registry_use_existing_pull_secret: ScalarProperty,
    pub aux_image_registry_pull_secret_name: ScalarProperty,
    pub aux_image_registry_pull_user: ScalarProperty,
    pub aux_image_registry_pull_password: ScalarProperty,
    pub aux_image_registry_pull_email: ScalarProperty,
    pub aux_image_pull_policy: ScalarProperty,
    pub aux_image_source_model_home: ScalarProperty,
    pub aux_image_source_wdt_install_home: ScalarProperty,
    pub clusters: ListProperty,
    pub model_config_map_name: ScalarProperty,
    pub credentials_secret_name: ScalarProperty,
    pub credentials_user_name: ScalarProperty,
    pub credentials_password: ScalarProperty,
    pub runtime_secret_name: ScalarProperty,
    pub runtime_secret_value: ScalarProperty,
    pub introspector_job_active_deadline_seconds: ScalarProperty,
    /// One row per secret referenced by the model; rebuilt whenever the
    /// model text or the uid changes.
    pub secrets: ListProperty,
    pub replicas: ScalarProperty,
    pub minimum_heap_size: ScalarProperty,
    pub maximum_heap_size: ScalarProperty,
    pub disable_debug_stdout: ScalarProperty,
    pub use_urandom: ScalarProperty,
    pub disable_fan: ScalarProperty,
    pub additional_arguments: ArrayProperty,
    pub cpu_request: ScalarProperty,
    pub cpu_limit: ScalarProperty,
    pub memory_request: ScalarProperty,
    pub memory_limit: ScalarProperty,
    pub domain_node_selector: ListProperty,
    model_properties: ListProperty,
    group: PropertyGroup,
}

fn k8s_name() -> ScalarProperty {
    ScalarProperty::empty().with_validators(validation::k8s_name())
}

fn email() -> ScalarProperty {
    ScalarProperty::empty().with_validators(validation::email_address())
}

/// Rebuilds the `secrets` list from the model's secret tokens.
#[derive(Clone)]
struct SecretsUpdater {
    uid: WeakSignal<Value>,
    model_text: WeakSignal<String>,
    secrets: ListProperty,
}

impl SecretsUpdater {
    fn update(&self) {
        let (Some(uid), Some(text)) = (self.uid.upgrade(), self.model_text.upgrade()) else {
            return;
        };
        let uid = value_text(&uid.get());
        let existing = self.secrets.records();
        let rows: Vec<Record> = wdt_model::scan_secrets(&text.get(), false)
            .iter()
            .map(|secret| secret_row(secret, &uid, &existing))
            .collect();
        if let Err(e) = self.secrets.set_value(rows) {
            tracing::warn!("cannot update domain secrets: {e}");
        }
    }
}

/// Resolve a model secret to a list row. The row uid is a hash of the
/// unresolved name so it survives uid changes; credentials already
/// entered for that uid are kept.
fn secret_row(secret: &ModelSecret, domain_uid: &str, existing: &[Record]) -> Record {
    let (key, name) = match secret.env_var.as_deref() {
        Some(env) => {
            let resolved = if env == DOMAIN_UID_VAR {
                format!("{domain_uid}{}", secret.name)
            } else {
                tracing::warn!(
                    "secret {} refers to unexpected environment variable {env}",
                    secret.name
                );
                format!("{env}{}", secret.name)
            };
            (format!("{env}{}", secret.name), resolved)
        }
        None => (secret.name.clone(), secret.name.clone()),
    };
    let row_uid = util::stable_uid(&key);
    let previous = existing
        .iter()
        .find(|r| r.get("uid").map(value_text).as_deref() == Some(row_uid.as_str()));

    let mut row = Record::new();
    row.insert("uid".to_string(), json!(row_uid));
    row.insert("name".to_string(), json!(name));
    for field in ["username", "password"] {
        let kept = previous
            .and_then(|r| r.get(field))
            .filter(|v| !value_text(v).is_empty())
            .cloned();
        match kept {
            Some(value) => {
                row.insert(field.to_string(), value);
            }
            None if secret.fields.iter().any(|f| f == field) => {
                row.insert(field.to_string(), json!(""));
            }
            None => {}
        }
    }
    row
}

impl K8sDomainPage {
    pub fn new(model: &WdtModelPage, image: &ImagePage) -> Self {
        let uid = ScalarProperty::computed(&[model.domain_name.clone()], |v| {
            json!(util::to_legal_k8s_name(&value_text(&v[0])))
        })
        .with_validators(validation::k8s_name());
        let from_uid = |pattern: &str| {
            ScalarProperty::template(pattern, &[uid.observable()])
                .with_validators(validation::k8s_name())
        };

        let page = Self {
            kubernetes_namespace: from_uid("${1}-ns"),
            domain_home: image.domain_home_path.clone(),
            domain_type: image.target_domain_type.clone(),
            domain_persistent_volume_name: ScalarProperty::new("weblogic-domain-storage-volume"),
            domain_persistent_volume_mount_path: ScalarProperty::new("/shared"),
            domain_persistent_volume_claim_name: ScalarProperty::empty(),
            domain_persistent_volume_log_home_enabled: ScalarProperty::new(false),
            domain_persistent_volume_log_home: ScalarProperty::template(
                "/shared/logs/${1}",
                &[uid.observable()],
            ),
            image_registry_pull_require_authentication: ScalarProperty::new(false),
            image_registry_use_existing_pull_secret: ScalarProperty::new(true),
            image_registry_pull_secret_name: k8s_name(),
            image_registry_pull_user: ScalarProperty::empty().as_credential(),
            image_registry_pull_password: ScalarProperty::empty().as_credential(),
            image_registry_pull_email: email(),
            image_pull_policy: ScalarProperty::new("IfNotPresent"),
            image_model_home: ScalarProperty::new("/u01/wdt/models"),
            image_wdt_install_home: ScalarProperty::new("/u01/wdt/weblogic-deploy"),
            aux_image_registry_pull_require_authentication: ScalarProperty::new(false),
            aux_image_registry_use_existing_pull_secret: ScalarProperty::new(true),
            aux_image_registry_pull_secret_name: k8s_name(),
            aux_image_registry_pull_user: ScalarProperty::empty().as_credential(),
            aux_image_registry_pull_password: ScalarProperty::empty().as_credential(),
            aux_image_registry_pull_email: email(),
            aux_image_pull_policy: ScalarProperty::new("IfNotPresent"),
            aux_image_source_model_home: ScalarProperty::new("/auxiliary/models"),
            aux_image_source_wdt_install_home: ScalarProperty::new("/auxiliary/weblogic-deploy"),
            clusters: ListProperty::new(CLUSTER_KEYS)
                .persist_by_key("uid")
                .with_field_validators("minHeap", validation::java_memory())
                .with_field_validators("maxHeap", validation::java_memory())
                .with_field_validators("cpuRequest", validation::k8s_cpu())
                .with_field_validators("cpuLimit", validation::k8s_cpu())
                .with_field_validators("memoryRequest", validation::k8s_memory())
                .with_field_validators("memoryLimit", validation::k8s_memory()),
            model_config_map_name: from_uid("${1}-config-map"),
            credentials_secret_name: from_uid("${1}-weblogic-credentials"),
            credentials_user_name: ScalarProperty::empty().as_credential(),
            credentials_password: ScalarProperty::empty().as_credential(),
            runtime_secret_name: from_uid("${1}-runtime-encryption-secret"),
            runtime_secret_value: ScalarProperty::new(uuid::Uuid::new_v4().to_string())
                .as_credential(),
            introspector_job_active_deadline_seconds: ScalarProperty::new(900),
            secrets: ListProperty::new(&["uid", "name", "username", "password"])
                .persist_by_key("uid")
                .with_credential_fields(&["username", "password"]),
            replicas: ScalarProperty::new(2),
            minimum_heap_size: ScalarProperty::new("64m")
                .with_validators(validation::java_memory()),
            maximum_heap_size: ScalarProperty::new("256m")
                .with_validators(validation::java_memory()),
            disable_debug_stdout: ScalarProperty::new(true),
            use_urandom: ScalarProperty::new(true),
            disable_fan: ScalarProperty::new(false),
            additional_arguments: ArrayProperty::empty(),
            cpu_request: ScalarProperty::empty().with_validators(validation::k8s_cpu()),
            cpu_limit: ScalarProperty::empty().with_validators(validation::k8s_cpu()),
            memory_request: ScalarProperty::empty().with_validators(validation::k8s_memory()),
            memory_limit: ScalarProperty::empty().with_validators(validation::k8s_memory()),
            domain_node_selector: ListProperty::new(&["uid", "name", "value"]).keyed_by("uid"),
            model_properties: model.properties.clone(),
            uid,
            group: PropertyGroup::new("k8sDomain"),
        };

        let updater = SecretsUpdater {
            uid: page.uid.observable().downgrade(),
            model_text: model.model_content_signal().downgrade(),
            secrets: page.secrets.clone(),
        };
        updater.update();
        let on_uid = updater.clone();
        page.uid.subscribe(move |_| on_uid.update());
        model
            .model_content_signal()
            .subscribe(move |_| updater.update());

        let group = PropertyGroup::new("k8sDomain")
            .field("uid", &page.uid)
            .field("kubernetesNamespace", &page.kubernetes_namespace)
            .field("domainPersistentVolumeName", &page.domain_persistent_volume_name)
            .field(
                "domainPersistentVolumeMountPath",
                &page.domain_persistent_volume_mount_path,
            )
            .field(
                "domainPersistentVolumeClaimName",
                &page.domain_persistent_volume_claim_name,
            )
            .field(
                "domainPersistentVolumeLogHomeEnabled",
                &page.domain_persistent_volume_log_home_enabled,
            )
            .field(
                "domainPersistentVolumeLogHome",
                &page.domain_persistent_volume_log_home,
            )
            .field(
                "imageRegistryPullRequireAuthentication",
                &page.image_registry_pull_require_authentication,
            )
            .field(
                "imageRegistryUseExistingPullSecret",
                &page.image_registry_use_existing_pull_secret,
            )
            .field("imageRegistryPullSecretName", &page.image_registry_pull_secret_name)
            .field("imageRegistryPullUser", &page.image_registry_pull_user)
            .field("imageRegistryPullPassword", &page.image_registry_pull_password)
            .field("imageRegistryPullEmail", &page.image_registry_pull_email)
            .field("imagePullPolicy", &page.image_pull_policy)
            .field("imageModelHome", &page.image_model_home)
            .field("imageWDTInstallHome", &page.image_wdt_install_home)
            .field(
                "auxImageRegistryPullRequireAuthentication",
                &page.aux_image_registry_pull_require_authentication,
            )
            .field(
                "auxImageRegistryUseExistingPullSecret",
                &page.aux_image_registry_use_existing_pull_secret,
            )
            .field(
                "auxImageRegistryPullSecretName",
                &page.aux_image_registry_pull_secret_name,
            )
            .field("auxImageRegistryPullUser", &page.aux_image_registry_pull_user)
            .field(
                "auxImageRegistryPullPassword",
                &page.aux_image_registry_pull_password,
            )
            .field("auxImageRegistryPullEmail", &page.aux_image_registry_pull_email)
            .field("auxImagePullPolicy", &page.aux_image_pull_policy)
            .field("auxImageSourceModelHome", &page.aux_image_source_model_home)
            .field(
                "auxImageSourceWDTInstallHome",
                &page.aux_image_source_wdt_install_home,
            )
            .field("clusters", &page.clusters)
            .field("modelConfigMapName", &page.model_config_map_name)
            .field("credentialsSecretName", &page.credentials_secret_name)
            .field("credentialsUserName", &page.credentials_user_name)
            .field("credentialsPassword", &page.credentials_password)
            .field("runtimeSecretName", &page.runtime_secret_name)
            .field("runtimeSecretValue", &page.runtime_secret_value)
            .field(
                "introspectorJobActiveDeadlineSeconds",
                &page.introspector_job_active_deadline_seconds,
            )
            .field("secrets", &page.secrets)
            .field("replicas", &page.replicas)
            .field("minimumHeapSize", &page.minimum_heap_size)
            .field("maximumHeapSize", &page.maximum_heap_size)
            .field("disableDebugStdout", &page.disable_debug_stdout)
            .field("useUrandom", &page.use_urandom)
            .field("disableFan", &page.disable_fan)
            .field("additionalArguments", &page.additional_arguments)
            .field("cpuRequest", &page.cpu_request)
            .field("cpuLimit", &page.cpu_limit)
            .field("memoryRequest", &page.memory_request)
            .field("memoryLimit", &page.memory_limit)
            .field("domainNodeSelector", &page.domain_node_selector);
        Self { group, ..page }
    }

    /// Copy `k8sDomain.modelConfigMap` from a project file into the
    /// `Override` column of the model variables.
    pub fn load_property_override_values(&self, json: &Value) {
        let Some(overrides) = json
            .get("k8sDomain")
            .and_then(|d| d.get("modelConfigMap"))
            .and_then(Value::as_object)
        else {
            return;
        };
        for (name, value) in overrides {
            wdt_model::set_override(&self.model_properties, name, value.clone());
        }
    }

    /// Add or update the row for a cluster discovered in the model. An
    /// existing row keeps its replica count unless it exceeds `max_servers`.
    pub fn set_cluster_row(&self, name: &str, max_servers: i64) {
        let rows = self.clusters.records();
        let found = rows
            .iter()
            .position(|r| r.get("name").map(value_text).as_deref() == Some(name));
        let result = match found {
            Some(index) => {
                let replicas = rows[index].get("replicas").and_then(Value::as_i64);
                let update = self
                    .clusters
                    .update_at(index, "maxServers", json!(max_servers));
                match replicas {
                    Some(r) if r <= max_servers => update,
                    _ => update.and_then(|()| {
                        self.clusters.update_at(index, "replicas", json!(max_servers))
                    }),
                }
            }
            None => {
                let mut row = Record::new();
                row.insert("name".to_string(), json!(name));
                row.insert("maxServers".to_string(), json!(max_servers));
                row.insert("replicas".to_string(), json!(max_servers));
                self.clusters.add_item(row).map(|_| ())
            }
        };
        if let Err(e) = result {
            tracing::warn!("cannot update cluster {name}: {e}");
        }
    }

    /// Apply the results of preparing the model for the operator: cluster
    /// sizes and default secret values.
    pub fn load_prepare_model_results(&self, results: &Value) {
        if let Some(clusters) = results
            .get("domain")
            .and_then(|d| d.get("clusters"))
            .and_then(Value::as_array)
        {
            for cluster in clusters {
                let name = cluster.get("clusterName").map(value_text).unwrap_or_default();
                let replicas = cluster.get("replicas").and_then(Value::as_i64).unwrap_or(0);
                if !name.is_empty() {
                    self.set_cluster_row(&name, replicas);
                }
            }
        }

        let Some(secrets) = results.get("secrets").and_then(Value::as_array) else {
            tracing::debug!("prepared model has no secrets");
            return;
        };
        let domain_uid = self.uid.text();
        for secret in secrets {
            let name = secret.get("name").map(value_text).unwrap_or_default();
            let qualified = format!("{domain_uid}-{name}");
            let Some(row_key) = self.secrets.records().iter().find_map(|r| {
                let row_name = r.get("name").map(value_text)?;
                (row_name == qualified || row_name == name)
                    .then(|| r.get("uid").map(value_text))
                    .flatten()
            }) else {
                tracing::warn!("prepared model secret {name} is not in the secrets list");
                continue;
            };
            let keys = secret.get("keys").and_then(Value::as_array);
            for key in keys.into_iter().flatten() {
                let field = key.get("key").map(value_text).unwrap_or_default();
                let Some(default) = key.get("defaultValue").filter(|v| !value_text(v).is_empty())
                else {
                    continue;
                };
                if let Err(e) = self.secrets.update_item(&row_key, &field, default.clone()) {
                    tracing::warn!("cannot set {field} of secret {name}: {e}");
                }
            }
        }
    }
}

impl ConfigPage for K8sDomainPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["uid", "kubernetesNamespace"]
    }

    /// Variable overrides are written as `modelConfigMap`.
    fn write_to(&self, json: &mut Map<String, Value>) {
        self.group.write_to(json);
        let overrides = wdt_model::overrides_in(&self.model_properties);
        if overrides.is_empty() {
            return;
        }
        match json.get_mut("k8sDomain") {
            Some(Value::Object(section)) => {
                section.insert("modelConfigMap".to_string(), Value::Object(overrides));
            }
            _ => {
                let mut section = Map::new();
                section.insert("modelConfigMap".to_string(), Value::Object(overrides));
                json.insert("k8sDomain".to_string(), Value::Object(section));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HostDefaults, ModelContents, SettingsPage, WkoPage};
    use crate::properties::CREDENTIAL_PATHS;
    use crate::validation::ValidationReport;

    struct Pages {
        _settings: SettingsPage,
        _wko: WkoPage,
        model: WdtModelPage,
        _image: ImagePage,
        domain: K8sDomainPage,
    }

    fn pages() -> Pages {
        let defaults = HostDefaults::default();
        let settings = SettingsPage::new(&defaults);
        let wko = WkoPage::new(&defaults);
        let model = WdtModelPage::new();
        let image = ImagePage::new(&settings, &wko, &model);
        let domain = K8sDomainPage::new(&model, &image);
        Pages {
            _settings: settings,
            _wko: wko,
            model,
            _image: image,
            domain,
        }
    }

    const MODEL: &str = "topology:\n  Name: Orders_Domain\nresources:\n  JDBCSystemResource:\n    myds:\n      JdbcResource:\n        JDBCDriverParams:\n          PasswordEncrypted: '@@SECRET:@@ENV:DOMAIN_UID@@-jdbc-myds:password@@'\n          Properties:\n            user:\n              Value: '@@SECRET:@@ENV:DOMAIN_UID@@-jdbc-myds:username@@'\n";

    #[test]
    fn names_derive_from_the_domain_uid() {
        let p = pages();
        assert_eq!(p.domain.uid.text(), "base-domain");
        assert_eq!(p.domain.kubernetes_namespace.text(), "base-domain-ns");
        p.model.set_model_content("topology:\n  Name: Orders_Domain\n");
        assert_eq!(p.domain.uid.text(), "orders-domain");
        assert_eq!(p.domain.model_config_map_name.text(), "orders-domain-config-map");
        assert_eq!(
            p.domain.credentials_secret_name.text(),
            "orders-domain-weblogic-credentials"
        );
        assert_eq!(
            p.domain.runtime_secret_name.text(),
            "orders-domain-runtime-encryption-secret"
        );
        assert_eq!(
            p.domain.domain_persistent_volume_log_home.text(),
            "/shared/logs/orders-domain"
        );
        assert!(!p.domain.is_changed());
    }

    #[test]
    fn secrets_follow_the_model_and_uid() {
        let p = pages();
        assert!(p.domain.secrets.is_empty());
        p.model.set_model_content(MODEL);
        let rows = p.domain.secrets.records();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("orders-domain-jdbc-myds"));
        let row_uid = value_text(&rows[0]["uid"]);
        assert_eq!(row_uid, util::stable_uid("DOMAIN_UID-jdbc-myds"));

        p.domain
            .secrets
            .update_item(&row_uid, "username", json!("scott"))
            .expect("set username");
        p.domain.uid.set_value("orders");
        let rows = p.domain.secrets.records();
        assert_eq!(rows[0]["name"], json!("orders-jdbc-myds"));
        assert_eq!(rows[0]["username"], json!("scott"));
        assert_eq!(rows[0]["password"], json!(""));
    }

    #[test]
    fn secret_credentials_are_masked_on_write() {
        let p = pages();
        p.model.set_model_content(MODEL);
        let row_uid = value_text(&p.domain.secrets.records()[0]["uid"]);
        p.domain
            .secrets
            .update_item(&row_uid, "password", json!("tiger"))
            .expect("set password");
        let mut json = Map::new();
        p.domain.write_to(&mut json);
        assert_eq!(
            json["k8sDomain"]["secrets"][row_uid.as_str()],
            json!({"name": "orders-domain-jdbc-myds"})
        );
        assert_eq!(
            json[CREDENTIAL_PATHS],
            json!([format!("k8sDomain.secrets.{row_uid}.password")])
        );
        assert!(!Value::Object(json).to_string().contains("tiger"));
    }

    #[test]
    fn runtime_secret_is_generated_and_hidden() {
        let p = pages();
        assert_eq!(p.domain.runtime_secret_value.text().len(), 36);
        let mut json = Map::new();
        p.domain.write_to(&mut json);
        assert!(json.is_empty());
    }

    #[test]
    fn overrides_round_trip_through_the_config_map() {
        let p = pages();
        let mut contents = ModelContents::default();
        let mut vars = Map::new();
        vars.insert("AdminPort".to_string(), json!("7001"));
        contents
            .properties
            .insert("models/variables.properties".to_string(), vars);
        p.model.read_from(&json!({"model": {"propertiesFiles": ["models/variables.properties"]}}));
        p.model.set_model_contents(&contents);

        let project = json!({"k8sDomain": {"modelConfigMap": {"AdminPort": "8001"}}});
        p.domain.load_property_override_values(&project);
        assert_eq!(p.model.property_overrides()["AdminPort"], json!("8001"));

        let mut json = Map::new();
        p.domain.write_to(&mut json);
        assert_eq!(json["k8sDomain"]["modelConfigMap"], json!({"AdminPort": "8001"}));
    }

    #[test]
    fn cluster_rows_from_prepared_model() {
        let p = pages();
        p.domain.load_prepare_model_results(&json!({
            "domain": {"clusters": [{"clusterName": "cluster-1", "replicas": 4}]}
        }));
        let row = &p.domain.clusters.records()[0];
        assert_eq!(row["maxServers"], json!(4));
        assert_eq!(row["replicas"], json!(4));

        p.domain
            .clusters
            .update_at(0, "replicas", json!(2))
            .expect("set replicas");
        p.domain.set_cluster_row("cluster-1", 3);
        let row = &p.domain.clusters.records()[0];
        assert_eq!(row["maxServers"], json!(3));
        assert_eq!(row["replicas"], json!(2));

        p.domain.set_cluster_row("cluster-1", 1);
        assert_eq!(p.domain.clusters.records()[0]["replicas"], json!(1));
    }

    #[test]
    fn prepared_model_fills_default_usernames() {
        let p = pages();
        p.model.set_model_content(MODEL);
        p.domain.load_prepare_model_results(&json!({
            "secrets": [{
                "name": "jdbc-myds",
                "keys": [{"key": "username", "defaultValue": "scott"}, {"key": "password"}]
            }]
        }));
        assert_eq!(p.domain.secrets.records()[0]["username"], json!("scott"));
    }

    #[test]
    fn heap_sizes_are_validated() {
        let p = pages();
        p.domain.maximum_heap_size.set_value("lots");
        p.domain.cpu_limit.set_value("500m");
        let mut report = ValidationReport::new("deploy domain");
        p.domain.validate(&mut report);
        let names: Vec<&str> = report.fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["k8sDomain.maximumHeapSize"]);
    }
}
