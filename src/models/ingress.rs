//! Ingress controller installation and routes.

use super::{text_or_empty, ConfigPage, HostDefaults};
use crate::properties::{ListProperty, PropertyGroup, ScalarProperty};
use crate::validation;

/// Fields of one `ingressRoutes` row.
pub const INGRESS_ROUTE_KEYS: &[&str] = &[
    "uid",
    "name",
    "virtualHost",
    "targetServiceNameSpace",
    "targetService",
    "targetPort",
    "path",
    "annotations",
    "accessPoint",
    "tlsOption",
    "markedForDeletion",
    "isConsoleService",
];

pub struct IngressPage {
    pub install_ingress_controller: ScalarProperty,
    /// `traefik`, `nginx` or `voyager`.
    pub ingress_controller_provider: ScalarProperty,
    pub ingress_controller_namespace: ScalarProperty,
    /// The helm release name.
    pub ingress_controller_name: ScalarProperty,
    pub ingress_tls_cert_file: ScalarProperty,
    pub ingress_tls_key_file: ScalarProperty,
    pub docker_reg_secret_name: ScalarProperty,
    pub docker_reg_secret_user_id: ScalarProperty,
    pub docker_reg_secret_user_pwd: ScalarProperty,
    pub docker_reg_secret_user_email: ScalarProperty,
    pub create_docker_reg_secret: ScalarProperty,
    pub specify_docker_reg_secret: ScalarProperty,
    pub specify_ingress_tls_secret: ScalarProperty,
    pub helm_timeout_minutes: ScalarProperty,
    pub ingress_service_type: ScalarProperty,
    pub ingress_routes: ListProperty,
    pub openssl_executable_file_path: ScalarProperty,
    pub voyager_provider: ScalarProperty,
    pub create_tls_secret: ScalarProperty,
    pub ingress_tls_secret_name: ScalarProperty,
    pub allow_nginx_ssl_pass_through: ScalarProperty,
    pub generate_tls_files: ScalarProperty,
    pub ingress_tls_subject: ScalarProperty,
    group: PropertyGroup,
}

impl IngressPage {
    pub fn new(defaults: &HostDefaults) -> Self {
        let provider = ScalarProperty::new("traefik");
        let page = Self {
            install_ingress_controller: ScalarProperty::new(false),
            ingress_controller_namespace: ScalarProperty::template(
                "${1}-ns",
                &[provider.observable()],
            )
            .with_validators(validation::k8s_name()),
            ingress_controller_name: ScalarProperty::template(
                "${1}-operator",
                &[provider.observable()],
            )
            .with_validators(validation::k8s_name()),
            ingress_controller_provider: provider,
            ingress_tls_cert_file: ScalarProperty::empty(),
            ingress_tls_key_file: ScalarProperty::empty(),
            docker_reg_secret_name: ScalarProperty::new("dockerhub")
                .with_validators(validation::k8s_name()),
            docker_reg_secret_user_id: ScalarProperty::empty().as_credential(),
            docker_reg_secret_user_pwd: ScalarProperty::empty().as_credential(),
            docker_reg_secret_user_email: ScalarProperty::empty()
                .with_validators(validation::email_address()),
            create_docker_reg_secret: ScalarProperty::new(false),
            specify_docker_reg_secret: ScalarProperty::new(false),
            specify_ingress_tls_secret: ScalarProperty::new(false),
            helm_timeout_minutes: ScalarProperty::new(5),
            ingress_service_type: ScalarProperty::new("LoadBalancer"),
            ingress_routes: ListProperty::new(INGRESS_ROUTE_KEYS)
                .persist_by_key("uid")
                .with_field_validators("name", validation::k8s_name())
                .with_field_validators("virtualHost", validation::host_name())
                .with_field_validators("targetPort", validation::port_number())
                .with_field_validators("path", validation::ingress_path()),
            openssl_executable_file_path: ScalarProperty::new(text_or_empty(
                &defaults.openssl_path,
            )),
            voyager_provider: ScalarProperty::new("OKE"),
            create_tls_secret: ScalarProperty::new(false),
            ingress_tls_secret_name: ScalarProperty::empty()
                .with_validators(validation::k8s_name()),
            allow_nginx_ssl_pass_through: ScalarProperty::new(false),
            generate_tls_files: ScalarProperty::new(false),
            ingress_tls_subject: ScalarProperty::empty(),
            group: PropertyGroup::new("ingress"),
        };
        let group = PropertyGroup::new("ingress")
            .field("installIngressController", &page.install_ingress_controller)
            .field("ingressControllerProvider", &page.ingress_controller_provider)
            .field("ingressControllerNamespace", &page.ingress_controller_namespace)
            .field("ingressControllerName", &page.ingress_controller_name)
            .field("ingressTLSCertFile", &page.ingress_tls_cert_file)
            .field("ingressTLSKeyFile", &page.ingress_tls_key_file)
            .field("dockerRegSecretName", &page.docker_reg_secret_name)
            .field("dockerRegSecretUserId", &page.docker_reg_secret_user_id)
            .field("dockerRegSecretUserPwd", &page.docker_reg_secret_user_pwd)
            .field("dockerRegSecretUserEmail", &page.docker_reg_secret_user_email)
            .field("createDockerRegSecret", &page.create_docker_reg_secret)
            .field("specifyDockerRegSecret", &page.specify_docker_reg_secret)
            .field("specifyIngressTLSSecret", &page.specify_ingress_tls_secret)
            .field("helmTimeoutMinutes", &page.helm_timeout_minutes)
            .field("ingressServiceType", &page.ingress_service_type)
            .field("ingressRoutes", &page.ingress_routes)
            .field("opensslExecutableFilePath", &page.openssl_executable_file_path)
            .field("voyagerProvider", &page.voyager_provider)
            .field("createTLSSecret", &page.create_tls_secret)
            .field("ingressTLSSecretName", &page.ingress_tls_secret_name)
            .field("allowNginxSSLPassThrough", &page.allow_nginx_ssl_pass_through)
            .field("generateTLSFiles", &page.generate_tls_files)
            .field("ingressTLSSubject", &page.ingress_tls_subject);
        Self { group, ..page }
    }

    pub fn routes_configured(&self) -> bool {
        !self.ingress_routes.is_empty()
    }

    /// The voyager cloud-provider name for the selected Kubernetes flavor.
    pub fn voyager_provider_mapped_value(&self) -> Option<&'static str> {
        match self.voyager_provider.text().as_str() {
            "OKE" | "K8S" | "KND" => Some("baremetal"),
            "AKS" => Some("aks"),
            "AWS" => Some("aws"),
            "GKE" => Some("gke"),
            "MKB" => Some("minikube"),
            _ => None,
        }
    }
}

impl ConfigPage for IngressPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["ingressControllerProvider", "ingressControllerNamespace", "ingressControllerName"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;
    use crate::validation::ValidationReport;
    use serde_json::{json, Map, Value};

    fn page() -> IngressPage {
        IngressPage::new(&HostDefaults::default())
    }

    #[test]
    fn namespace_and_release_follow_the_provider() {
        let page = page();
        assert_eq!(page.ingress_controller_namespace.text(), "traefik-ns");
        assert_eq!(page.ingress_controller_name.text(), "traefik-operator");
        page.ingress_controller_provider.set_value("nginx");
        assert_eq!(page.ingress_controller_namespace.text(), "nginx-ns");
        assert_eq!(page.ingress_controller_name.text(), "nginx-operator");
    }

    #[test]
    fn routes_persist_by_uid_and_reload() {
        let page = page();
        page.ingress_routes
            .add_item(
                json!({
                    "uid": "r1",
                    "name": "console",
                    "targetService": "sample-domain1-admin-server",
                    "targetPort": 7001,
                    "path": "/console",
                    "annotations": {"kubernetes.io/ingress.class": "nginx"},
                    "isConsoleService": true
                })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            )
            .expect("add");
        assert!(page.routes_configured());

        let mut json = Map::new();
        page.write_to(&mut json);
        let routes = &json["ingress"]["ingressRoutes"];
        assert_eq!(routes["r1"]["targetPort"], json!(7001));
        assert!(routes["r1"].get("uid").is_none());

        let fresh = IngressPage::new(&HostDefaults::default());
        fresh.read_from(&Value::Object(json));
        let route = fresh.ingress_routes.find_by_key("r1").expect("route r1");
        assert_eq!(route["annotations"], json!({"kubernetes.io/ingress.class": "nginx"}));
        assert!(!fresh.is_changed());
    }

    #[test]
    fn route_fields_are_validated() {
        let page = page();
        page.ingress_routes
            .add_item(record([
                ("uid", json!("r1")),
                ("name", json!("Bad Name")),
                ("targetPort", json!(99999)),
                ("path", json!("/ok")),
            ]))
            .expect("add");
        let mut report = ValidationReport::new("add routes");
        page.validate(&mut report);
        let names: Vec<&str> = report.fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ingress.ingressRoutes.r1.name", "ingress.ingressRoutes.r1.targetPort"]
        );
    }

    #[test]
    fn voyager_provider_mapping() {
        let page = page();
        assert_eq!(page.voyager_provider_mapped_value(), Some("baremetal"));
        page.voyager_provider.set_value("MKB");
        assert_eq!(page.voyager_provider_mapped_value(), Some("minikube"));
        page.voyager_provider.set_value("???");
        assert_eq!(page.voyager_provider_mapped_value(), None);
    }
}
