//! Cluster access: kubectl, helm and kubeconfig.

use serde_json::{json, Value};

use super::{text_or_empty, ConfigPage, HostDefaults};
use crate::properties::{ArrayProperty, PropertyGroup, ScalarProperty};

pub struct KubectlPage {
    /// `OKE`, `AKS`, `EKS`, `OpenShift`, ...
    pub k8s_flavor: ScalarProperty,
    pub kube_config: ArrayProperty,
    pub executable_file_path: ScalarProperty,
    pub kube_config_context_to_use: ScalarProperty,
    pub helm_executable_file_path: ScalarProperty,
    group: PropertyGroup,
}

impl KubectlPage {
    pub fn new(defaults: &HostDefaults) -> Self {
        let page = Self {
            k8s_flavor: ScalarProperty::new("OKE"),
            kube_config: ArrayProperty::new(defaults.kube_config.clone()),
            executable_file_path: ScalarProperty::new(text_or_empty(&defaults.kubectl_path)),
            kube_config_context_to_use: ScalarProperty::empty(),
            helm_executable_file_path: ScalarProperty::new(text_or_empty(&defaults.helm_path)),
            group: PropertyGroup::new("kubectl"),
        };
        let group = PropertyGroup::new("kubectl")
            .field("k8sFlavor", &page.k8s_flavor)
            .field("kubeConfig", &page.kube_config)
            .field("executableFilePath", &page.executable_file_path)
            .field("kubeConfigContextToUse", &page.kube_config_context_to_use)
            .field("helmExecutableFilePath", &page.helm_executable_file_path);
        Self { group, ..page }
    }

    /// Arguments understood by `kubectl-verify-connection`.
    pub fn connection_args(&self) -> Value {
        json!({
            "kubectlExePath": self.executable_file_path.text(),
            "kubeConfig": self.kube_config.value(),
            "kubeContext": self.kube_config_context_to_use.text(),
        })
    }

    /// Arguments understood by `helm-list-all-namespaces`.
    pub fn helm_args(&self) -> Value {
        json!({
            "helmExePath": self.helm_executable_file_path.text(),
            "kubeConfig": self.kube_config.value(),
            "kubeContext": self.kube_config_context_to_use.text(),
        })
    }
}

impl ConfigPage for KubectlPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["executableFilePath"]
    }
}
