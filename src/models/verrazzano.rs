//! Verrazzano pages: installation, the domain component and the
//! application that deploys it.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{ConfigPage, K8sDomainPage};
use crate::properties::{ArrayProperty, ListProperty, PropertyGroup, ScalarProperty};
use crate::validation;

/// Fields of one `components` row of the application.
pub const COMPONENT_KEYS: &[&str] = &[
    "name",
    "ingressTraitEnabled",
    "ingressTraitSecretName",
    "ingressTraitRules",
    "manualScalerTraitEnabled",
    "manualScalerTraitReplicaCount",
    "metricsTraitEnabled",
    "metricsTraitHttpPort",
    "metricsTraitHttpPath",
    "metricsTraitSecretName",
    "metricsTraitDeploymentName",
    "loggingTraitEnabled",
    "loggingTraitImage",
    "loggingTraitConfiguration",
];

pub struct VzInstallPage {
    pub version_tag: ScalarProperty,
    pub installation_name: ScalarProperty,
    /// `dev`, `prod` or `managed-cluster`.
    pub installation_profile: ScalarProperty,
    pub actual_installed_version: ScalarProperty,
    pub install_jaeger: ScalarProperty,
    pub istio_sampling_rate: ScalarProperty,
    group: PropertyGroup,
}

impl VzInstallPage {
    pub fn new() -> Self {
        let page = Self {
            version_tag: ScalarProperty::empty(),
            installation_name: ScalarProperty::new("example-verrazzano"),
            installation_profile: ScalarProperty::new("dev"),
            actual_installed_version: ScalarProperty::empty(),
            install_jaeger: ScalarProperty::new(false),
            istio_sampling_rate: ScalarProperty::new(1),
            group: PropertyGroup::new("vzInstall"),
        };
        let group = PropertyGroup::new("vzInstall")
            .field("versionTag", &page.version_tag)
            .field("installationName", &page.installation_name)
            .field("installationProfile", &page.installation_profile)
            .field("actualInstalledVersion", &page.actual_installed_version)
            .field("installJaeger", &page.install_jaeger)
            .field("istioSamplingRate", &page.istio_sampling_rate);
        Self { group, ..page }
    }
}

impl Default for VzInstallPage {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPage for VzInstallPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }
}

pub struct VzComponentPage {
    /// Defaults to the domain uid.
    pub component_name: ScalarProperty,
    group: PropertyGroup,
}

impl VzComponentPage {
    pub fn new(domain: &K8sDomainPage) -> Self {
        let component_name = ScalarProperty::template("${1}", &[domain.uid.observable()])
            .with_validators(validation::k8s_name());
        let group = PropertyGroup::new("vzComponent").field("componentName", &component_name);
        Self {
            component_name,
            group,
        }
    }
}

impl ConfigPage for VzComponentPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["componentName"]
    }
}

pub struct VzApplicationPage {
    pub application_name: ScalarProperty,
    pub application_version: ScalarProperty,
    pub application_description: ScalarProperty,
    pub use_multi_cluster_application: ScalarProperty,
    pub create_project: ScalarProperty,
    /// Defaults to the application name.
    pub project_name: ScalarProperty,
    pub placement_clusters: ArrayProperty,
    pub secrets: ArrayProperty,
    pub components: ListProperty,
    /// Set when a component's traits were edited outside the list.
    component_changed: AtomicBool,
    group: PropertyGroup,
}

impl VzApplicationPage {
    pub fn new(domain: &K8sDomainPage) -> Self {
        let application_name = ScalarProperty::template("${1}-app", &[domain.uid.observable()])
            .with_validators(validation::k8s_name());
        let project_name = ScalarProperty::template("${1}", &[application_name.observable()])
            .with_validators(validation::k8s_name());

        let page = Self {
            application_name,
            application_version: ScalarProperty::empty(),
            application_description: ScalarProperty::empty(),
            use_multi_cluster_application: ScalarProperty::new(false),
            create_project: ScalarProperty::new(false),
            project_name,
            placement_clusters: ArrayProperty::new(["local"]),
            secrets: ArrayProperty::empty(),
            components: ListProperty::new(COMPONENT_KEYS).persist_by_key("name"),
            component_changed: AtomicBool::new(false),
            group: PropertyGroup::new("vzApplication"),
        };
        let group = PropertyGroup::new("vzApplication")
            .field("applicationName", &page.application_name)
            .field("applicationVersion", &page.application_version)
            .field("applicationDescription", &page.application_description)
            .field("useMultiClusterApplication", &page.use_multi_cluster_application)
            .field("createProject", &page.create_project)
            .field("projectName", &page.project_name)
            .field("placementClusters", &page.placement_clusters)
            .field("secrets", &page.secrets)
            .field("components", &page.components);
        Self { group, ..page }
    }

    /// Mark the page changed until the next save.
    pub fn component_changed(&self) {
        self.component_changed.store(true, Ordering::Relaxed);
    }
}

impl ConfigPage for VzApplicationPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["applicationName"]
    }

    fn is_changed(&self) -> bool {
        self.component_changed.load(Ordering::Relaxed) || self.group.is_changed()
    }

    fn set_not_changed(&self) {
        self.component_changed.store(false, Ordering::Relaxed);
        self.group.set_not_changed();
    }
}
