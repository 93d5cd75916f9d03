//! Project-wide settings: where the domain goes and which local tools build
//! it.

use serde_json::Value;

use super::{text_or_empty, ConfigPage, HostDefaults};
use crate::properties::{ListProperty, PropertyGroup, ScalarProperty};
use crate::validation;

pub struct SettingsPage {
    pub extra_path_directories: ListProperty,
    pub extra_environment_variables: ListProperty,
    pub credential_store_policy: ScalarProperty,
    /// `mii`, `dii` or `pv`.
    pub target_domain_location: ScalarProperty,
    pub wdt_target_type: ScalarProperty,
    pub java_home: ScalarProperty,
    pub oracle_home: ScalarProperty,
    /// `docker` or `podman`.
    pub builder_type: ScalarProperty,
    pub builder_executable_file_path: ScalarProperty,
    pub image_target_architecture: ScalarProperty,
    group: PropertyGroup,
}

impl SettingsPage {
    pub fn new(defaults: &HostDefaults) -> Self {
        let builder_type = ScalarProperty::new("docker");
        let docker = text_or_empty(&defaults.docker_path);
        let podman = text_or_empty(&defaults.podman_path);
        let builder_executable_file_path =
            ScalarProperty::computed(&[builder_type.observable()], move |v| {
                match validation::value_text(&v[0]).as_str() {
                    "docker" => docker.clone(),
                    "podman" => podman.clone(),
                    _ => Value::String(String::new()),
                }
            });

        let page = Self {
            extra_path_directories: ListProperty::new(&["uid", "value"]).keyed_by("uid"),
            extra_environment_variables: ListProperty::new(&["uid", "name", "value"])
                .keyed_by("uid"),
            credential_store_policy: ScalarProperty::new("passphrase"),
            target_domain_location: ScalarProperty::new("mii"),
            wdt_target_type: ScalarProperty::new("wko"),
            java_home: ScalarProperty::new(text_or_empty(&defaults.java_home)),
            oracle_home: ScalarProperty::new(text_or_empty(&defaults.oracle_home)),
            builder_type,
            builder_executable_file_path,
            image_target_architecture: ScalarProperty::new("amd64"),
            group: PropertyGroup::new("settings"),
        };
        let group = PropertyGroup::new("settings")
            .field("extraPathDirectories", &page.extra_path_directories)
            .field("extraEnvironmentVariables", &page.extra_environment_variables)
            .field("credentialStorePolicy", &page.credential_store_policy)
            .field("targetDomainLocation", &page.target_domain_location)
            .field("wdtTargetType", &page.wdt_target_type)
            .field("javaHome", &page.java_home)
            .field("oracleHome", &page.oracle_home)
            .field("builderType", &page.builder_type)
            .field("builderExecutableFilePath", &page.builder_executable_file_path)
            .field("imageTargetArchitecture", &page.image_target_architecture);
        Self { group, ..page }
    }

    /// A domain home on a persistent volume rather than in an image.
    pub fn targets_persistent_volume(&self) -> bool {
        self.target_domain_location.text() == "pv"
    }

    /// The non-empty extra `PATH` entries, in order.
    pub fn path_directories(&self) -> Vec<String> {
        self.extra_path_directories
            .value()
            .iter()
            .filter_map(|row| row.get("value"))
            .map(validation::value_text)
            .filter(|dir| !dir.is_empty())
            .collect()
    }

    /// Extra environment variables as `(name, value)` pairs; rows without a
    /// name are skipped.
    pub fn environment_variables(&self) -> Vec<(String, String)> {
        self.extra_environment_variables
            .value()
            .iter()
            .filter_map(|row| {
                let name = row.get("name").map(validation::value_text)?;
                let value = row.get("value").map(validation::value_text).unwrap_or_default();
                (!name.is_empty()).then_some((name, value))
            })
            .collect()
    }
}

impl ConfigPage for SettingsPage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["javaHome", "builderExecutableFilePath"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;
    use crate::validation::ValidationReport;
    use serde_json::{json, Map};

    fn page() -> SettingsPage {
        SettingsPage::new(&HostDefaults {
            java_home: Some("/jdk".to_string()),
            docker_path: Some("/usr/bin/docker".to_string()),
            podman_path: Some("/usr/bin/podman".to_string()),
            ..HostDefaults::default()
        })
    }

    #[test]
    fn defaults_are_not_persisted() {
        let page = page();
        assert_eq!(page.target_domain_location.text(), "mii");
        assert_eq!(page.java_home.text(), "/jdk");
        assert!(!page.is_changed());
        let mut json = Map::new();
        page.write_to(&mut json);
        assert!(json.is_empty());
    }

    #[test]
    fn builder_path_follows_builder_type() {
        let page = page();
        assert_eq!(page.builder_executable_file_path.text(), "/usr/bin/docker");
        page.builder_type.set_value("podman");
        assert_eq!(page.builder_executable_file_path.text(), "/usr/bin/podman");
        assert!(!page.builder_executable_file_path.has_value());
        page.builder_type.set_value("buildah");
        assert_eq!(page.builder_executable_file_path.text(), "");
    }

    #[test]
    fn target_location_is_persisted_when_changed() {
        let page = page();
        page.target_domain_location.set_value("pv");
        assert!(page.targets_persistent_volume());
        let mut json = Map::new();
        page.write_to(&mut json);
        assert_eq!(
            Value::Object(json),
            json!({"settings": {"targetDomainLocation": "pv"}})
        );
    }

    #[test]
    fn extra_paths_and_variables() {
        let page = page();
        page.extra_path_directories
            .add_item(record([("value", "/opt/tools/bin")]))
            .expect("add");
        page.extra_path_directories
            .add_item(record([("value", "")]))
            .expect("add");
        page.extra_environment_variables
            .add_item(record([("name", "HTTPS_PROXY"), ("value", "http://proxy:80")]))
            .expect("add");
        page.extra_environment_variables
            .add_item(record([("name", ""), ("value", "orphan")]))
            .expect("add");
        assert_eq!(page.path_directories(), vec!["/opt/tools/bin"]);
        assert_eq!(
            page.environment_variables(),
            vec![("HTTPS_PROXY".to_string(), "http://proxy:80".to_string())]
        );
    }

    #[test]
    fn validation_requires_java_home() {
        let page = SettingsPage::new(&HostDefaults::default());
        let mut report = ValidationReport::new("create image");
        page.validate(&mut report);
        let names: Vec<&str> = report.fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["settings.javaHome", "settings.builderExecutableFilePath"]
        );
    }
}
