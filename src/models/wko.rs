//! WebLogic Kubernetes Operator installation options.

use super::{text_or_empty, ConfigPage, HostDefaults};
use crate::properties::{ArrayProperty, ListProperty, PropertyGroup, ScalarProperty};
use crate::util;
use crate::validation;

pub struct WkoPage {
    pub wko_deploy_name: ScalarProperty,
    pub k8s_namespace: ScalarProperty,
    pub k8s_service_account: ScalarProperty,
    pub version_tag: ScalarProperty,
    pub operator_image: ScalarProperty,
    pub operator_image_pull_requires_authentication: ScalarProperty,
    pub operator_image_pull_secret_name: ScalarProperty,
    pub operator_image_pull_use_existing_secret: ScalarProperty,
    pub operator_image_pull_registry_email_address: ScalarProperty,
    pub operator_image_pull_registry_username: ScalarProperty,
    pub operator_image_pull_registry_password: ScalarProperty,
    /// `LabelSelector`, `List`, `RegExp` or `Dedicated`.
    pub operator_domain_namespace_selection_strategy: ScalarProperty,
    pub operator_domain_namespace_selector: ScalarProperty,
    pub operator_domain_namespaces_list: ArrayProperty,
    pub operator_domain_namespace_regex: ScalarProperty,
    pub operator_image_pull_policy: ScalarProperty,
    pub enable_cluster_role_binding: ScalarProperty,
    pub external_rest_enabled: ScalarProperty,
    pub external_rest_https_port: ScalarProperty,
    pub external_rest_identity_secret: ScalarProperty,
    pub elk_integration_enabled: ScalarProperty,
    pub log_stash_image: ScalarProperty,
    pub elastic_search_host: ScalarProperty,
    pub elastic_search_port: ScalarProperty,
    pub java_logging_level: ScalarProperty,
    pub java_logging_file_size_limit: ScalarProperty,
    pub java_logging_file_count: ScalarProperty,
    pub node_selector: ListProperty,
    pub helm_timeout_minutes: ScalarProperty,
    /// Version found on the cluster, if the operator is installed.
    pub installed_version: ScalarProperty,
    group: PropertyGroup,
}

impl WkoPage {
    pub fn new(defaults: &HostDefaults) -> Self {
        let page = Self {
            wko_deploy_name: ScalarProperty::new("weblogic-operator"),
            k8s_namespace: ScalarProperty::new("weblogic-operator-ns")
                .with_validators(validation::k8s_name()),
            k8s_service_account: ScalarProperty::new("weblogic-operator-sa")
                .with_validators(validation::k8s_name()),
            version_tag: ScalarProperty::new(text_or_empty(&defaults.latest_wko_version)),
            operator_image: ScalarProperty::empty().with_validators(validation::image_reference()),
            operator_image_pull_requires_authentication: ScalarProperty::new(false),
            operator_image_pull_secret_name: ScalarProperty::empty()
                .with_validators(validation::k8s_name()),
            operator_image_pull_use_existing_secret: ScalarProperty::new(true),
            operator_image_pull_registry_email_address: ScalarProperty::empty()
                .with_validators(validation::email_address()),
            operator_image_pull_registry_username: ScalarProperty::empty().as_credential(),
            operator_image_pull_registry_password: ScalarProperty::empty().as_credential(),
            operator_domain_namespace_selection_strategy: ScalarProperty::new("LabelSelector"),
            operator_domain_namespace_selector: ScalarProperty::new("weblogic-operator=enabled"),
            operator_domain_namespaces_list: ArrayProperty::new(["default"]),
            operator_domain_namespace_regex: ScalarProperty::empty(),
            operator_image_pull_policy: ScalarProperty::new("IfNotPresent"),
            enable_cluster_role_binding: ScalarProperty::new(false),
            external_rest_enabled: ScalarProperty::new(false),
            external_rest_https_port: ScalarProperty::new(31001)
                .with_validators(validation::port_number()),
            external_rest_identity_secret: ScalarProperty::empty()
                .with_validators(validation::k8s_name()),
            elk_integration_enabled: ScalarProperty::new(false),
            log_stash_image: ScalarProperty::new("logstash:6.6.0")
                .with_validators(validation::image_reference()),
            elastic_search_host: ScalarProperty::new("elasticsearch.default.svc.cluster.local")
                .with_validators(validation::host_name()),
            elastic_search_port: ScalarProperty::new(9200)
                .with_validators(validation::port_number()),
            java_logging_level: ScalarProperty::new("INFO"),
            java_logging_file_size_limit: ScalarProperty::new(20_000_000),
            java_logging_file_count: ScalarProperty::new(10),
            node_selector: ListProperty::new(&["uid", "name", "value"]).keyed_by("uid"),
            helm_timeout_minutes: ScalarProperty::new(5),
            installed_version: ScalarProperty::empty(),
            group: PropertyGroup::new("wko"),
        };
        let group = PropertyGroup::new("wko")
            .field("wkoDeployName", &page.wko_deploy_name)
            .field("k8sNamespace", &page.k8s_namespace)
            .field("k8sServiceAccount", &page.k8s_service_account)
            .field("versionTag", &page.version_tag)
            .field("operatorImage", &page.operator_image)
            .field(
                "operatorImagePullRequiresAuthentication",
                &page.operator_image_pull_requires_authentication,
            )
            .field("operatorImagePullSecretName", &page.operator_image_pull_secret_name)
            .field(
                "operatorImagePullUseExistingSecret",
                &page.operator_image_pull_use_existing_secret,
            )
            .field(
                "operatorImagePullRegistryEmailAddress",
                &page.operator_image_pull_registry_email_address,
            )
            .field(
                "operatorImagePullRegistryUsername",
                &page.operator_image_pull_registry_username,
            )
            .field(
                "operatorImagePullRegistryPassword",
                &page.operator_image_pull_registry_password,
            )
            .field(
                "operatorDomainNamespaceSelectionStrategy",
                &page.operator_domain_namespace_selection_strategy,
            )
            .field(
                "operatorDomainNamespaceSelector",
                &page.operator_domain_namespace_selector,
            )
            .field(
                "operatorDomainNamespacesList",
                &page.operator_domain_namespaces_list,
            )
            .field("operatorDomainNamespaceRegex", &page.operator_domain_namespace_regex)
            .field("operatorImagePullPolicy", &page.operator_image_pull_policy)
            .field("enableClusterRoleBinding", &page.enable_cluster_role_binding)
            .field("externalRestEnabled", &page.external_rest_enabled)
            .field("externalRestHttpsPort", &page.external_rest_https_port)
            .field("externalRestIdentitySecret", &page.external_rest_identity_secret)
            .field("elkIntegrationEnabled", &page.elk_integration_enabled)
            .field("logStashImage", &page.log_stash_image)
            .field("elasticSearchHost", &page.elastic_search_host)
            .field("elasticSearchPort", &page.elastic_search_port)
            .field("javaLoggingLevel", &page.java_logging_level)
            .field("javaLoggingFileSizeLimit", &page.java_logging_file_size_limit)
            .field("javaLoggingFileCount", &page.java_logging_file_count)
            .field("nodeSelector", &page.node_selector)
            .field("helmTimeoutMinutes", &page.helm_timeout_minutes)
            .field("installedVersion", &page.installed_version);
        Self { group, ..page }
    }

    /// Registry host of the operator image; never persisted.
    pub fn operator_image_pull_registry_address(&self) -> Option<String> {
        util::registry_address(&self.operator_image.text())
    }

    /// Whether the installed operator is at least `version`. `false` when
    /// no operator is installed.
    pub fn installed_version_at_least(&self, version: &str) -> bool {
        let installed = self.installed_version.text();
        !installed.is_empty() && util::compare_versions(&installed, version).is_ge()
    }
}

impl ConfigPage for WkoPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["wkoDeployName", "k8sNamespace", "k8sServiceAccount", "operatorImage"]
    }
}
