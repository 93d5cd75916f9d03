//! Primary and auxiliary image build options.

use serde_json::{json, Value};

use super::{ConfigPage, SettingsPage, WdtModelPage, WkoPage};
use crate::observable::Signal;
use crate::properties::{ArrayProperty, PropertyGroup, ScalarProperty};
use crate::util;
use crate::validation;

/// Operator release from which a persistent-volume domain may be JRF.
const JRF_ON_PV_OPERATOR_VERSION: &str = "4.1.0";

pub struct ImagePage {
    pub image_tag: ScalarProperty,
    pub create_primary_image: ScalarProperty,
    /// Kept so old project files load; no longer used.
    pub create_custom_image_for_pv: ScalarProperty,
    pub image_registry_push_require_authentication: ScalarProperty,
    pub image_registry_push_credentials_reference: ScalarProperty,
    pub use_custom_base_image: ScalarProperty,
    pub base_image: ScalarProperty,
    pub base_image_pull_requires_authentication: ScalarProperty,
    pub base_image_pull_credentials_reference: ScalarProperty,
    pub base_image_inspected: ScalarProperty,
    pub custom_base_image_contents: ArrayProperty,
    pub jdk_installer: ScalarProperty,
    pub jdk_installer_version: ScalarProperty,
    pub oracle_installer_type: ScalarProperty,
    pub oracle_installer: ScalarProperty,
    pub oracle_installer_version: ScalarProperty,
    pub use_latest_wdt_version: ScalarProperty,
    pub wdt_installer: ScalarProperty,
    pub wdt_installer_version: ScalarProperty,
    pub apply_oracle_patches: ScalarProperty,
    pub opatch_bug_number: ScalarProperty,
    pub oracle_support_user_name: ScalarProperty,
    pub oracle_support_password: ScalarProperty,
    pub oracle_patch_options: ScalarProperty,
    pub oracle_patches_to_apply: ArrayProperty,
    pub use_aux_image: ScalarProperty,
    pub target_domain_type: ScalarProperty,
    pub domain_home_path: ScalarProperty,
    pub model_home_path: ScalarProperty,
    pub wdt_home_path: ScalarProperty,
    pub target_open_shift: ScalarProperty,
    pub file_owner: ScalarProperty,
    pub file_group: ScalarProperty,
    pub always_pull_base_image: ScalarProperty,
    pub builder_network_name: ScalarProperty,
    pub extend_build: ScalarProperty,
    pub additional_build_commands_file: ScalarProperty,
    pub additional_build_files: ArrayProperty,

    pub aux_image_tag: ScalarProperty,
    pub create_aux_image: ScalarProperty,
    pub aux_default_base_image_pull_requires_authentication: ScalarProperty,
    pub aux_default_base_image_pull_credentials_reference: ScalarProperty,
    pub aux_image_registry_push_require_authentication: ScalarProperty,
    pub aux_image_registry_push_credentials_reference: ScalarProperty,
    pub aux_use_custom_base_image: ScalarProperty,
    pub aux_base_image: ScalarProperty,
    pub aux_base_image_pull_requires_authentication: ScalarProperty,
    pub aux_base_image_pull_credentials_reference: ScalarProperty,
    pub aux_target_open_shift: ScalarProperty,
    pub aux_file_owner: ScalarProperty,
    pub aux_file_group: ScalarProperty,
    pub aux_always_pull_base_image: ScalarProperty,
    pub aux_builder_network_name: ScalarProperty,
    pub aux_extend_build: ScalarProperty,
    pub aux_additional_build_commands_file: ScalarProperty,
    pub aux_additional_build_files: ArrayProperty,
    /// Source of the `domainHomePath` default; owned here because computed
    /// signals only hold their sources weakly.
    default_domain_home: Signal<Value>,
    group: PropertyGroup,
}

fn group_name_for(open_shift: &ScalarProperty) -> ScalarProperty {
    ScalarProperty::computed(&[open_shift.observable()], |v| {
        let name = if v[0] == json!(true) || v[0] == json!("true") {
            "root"
        } else {
            "oracle"
        };
        json!(name)
    })
}

fn image_reference() -> ScalarProperty {
    ScalarProperty::empty().with_validators(validation::image_reference())
}

impl ImagePage {
    pub fn new(settings: &SettingsPage, wko: &WkoPage, model: &WdtModelPage) -> Self {
        let use_aux_image = ScalarProperty::new(true);

        let target_domain_type = ScalarProperty::computed(
            &[
                settings.target_domain_location.observable(),
                wko.installed_version.observable(),
                use_aux_image.observable(),
            ],
            |v| {
                let on_pv = validation::value_text(&v[0]) == "pv";
                let installed = validation::value_text(&v[1]);
                let new_operator = installed.is_empty()
                    || util::compare_versions(&installed, JRF_ON_PV_OPERATOR_VERSION).is_ge();
                let aux = v[2] == json!(true) || v[2] == json!("true");
                let domain_type = if on_pv && new_operator && aux { "JRF" } else { "WLS" };
                json!(domain_type)
            },
        );

        let default_domain_home =
            Signal::computed(&[settings.target_domain_location.observable()], |v| {
                let home = if validation::value_text(&v[0]) == "pv" {
                    "/shared"
                } else {
                    "/u01"
                };
                json!(home)
            });
        let domain_home_path = ScalarProperty::template(
            "${1}/domains/${2}",
            &[default_domain_home.clone(), model.domain_name.clone()],
        );

        let target_open_shift = ScalarProperty::new(false);
        let file_group = group_name_for(&target_open_shift);
        let aux_target_open_shift = ScalarProperty::new(false);
        let aux_file_group = group_name_for(&aux_target_open_shift);

        let page = Self {
            image_tag: image_reference(),
            create_primary_image: ScalarProperty::new(false),
            create_custom_image_for_pv: ScalarProperty::new(false),
            image_registry_push_require_authentication: ScalarProperty::new(true),
            image_registry_push_credentials_reference: ScalarProperty::empty(),
            use_custom_base_image: ScalarProperty::new(false),
            base_image: image_reference(),
            base_image_pull_requires_authentication: ScalarProperty::new(false),
            base_image_pull_credentials_reference: ScalarProperty::empty(),
            base_image_inspected: ScalarProperty::new(false),
            custom_base_image_contents: ArrayProperty::empty(),
            jdk_installer: ScalarProperty::empty(),
            jdk_installer_version: ScalarProperty::empty(),
            oracle_installer_type: ScalarProperty::new("WLS"),
            oracle_installer: ScalarProperty::empty(),
            oracle_installer_version: ScalarProperty::empty(),
            use_latest_wdt_version: ScalarProperty::new(true),
            wdt_installer: ScalarProperty::empty(),
            wdt_installer_version: ScalarProperty::empty(),
            apply_oracle_patches: ScalarProperty::new(true),
            opatch_bug_number: ScalarProperty::empty(),
            oracle_support_user_name: ScalarProperty::empty().as_credential(),
            oracle_support_password: ScalarProperty::empty().as_credential(),
            oracle_patch_options: ScalarProperty::new("recommended"),
            oracle_patches_to_apply: ArrayProperty::empty(),
            use_aux_image,
            target_domain_type,
            domain_home_path,
            model_home_path: ScalarProperty::new("/u01/wdt/models"),
            wdt_home_path: ScalarProperty::new("/u01/wdt"),
            target_open_shift,
            file_owner: ScalarProperty::new("oracle"),
            file_group,
            always_pull_base_image: ScalarProperty::new(false),
            builder_network_name: ScalarProperty::empty(),
            extend_build: ScalarProperty::new(false),
            additional_build_commands_file: ScalarProperty::empty(),
            additional_build_files: ArrayProperty::empty(),

            aux_image_tag: image_reference(),
            create_aux_image: ScalarProperty::new(true),
            aux_default_base_image_pull_requires_authentication: ScalarProperty::new(true),
            aux_default_base_image_pull_credentials_reference: ScalarProperty::empty(),
            aux_image_registry_push_require_authentication: ScalarProperty::new(true),
            aux_image_registry_push_credentials_reference: ScalarProperty::empty(),
            aux_use_custom_base_image: ScalarProperty::new(false),
            aux_base_image: image_reference(),
            aux_base_image_pull_requires_authentication: ScalarProperty::new(false),
            aux_base_image_pull_credentials_reference: ScalarProperty::empty(),
            aux_target_open_shift,
            aux_file_owner: ScalarProperty::new("oracle"),
            aux_file_group,
            aux_always_pull_base_image: ScalarProperty::new(false),
            aux_builder_network_name: ScalarProperty::empty(),
            aux_extend_build: ScalarProperty::new(false),
            aux_additional_build_commands_file: ScalarProperty::empty(),
            aux_additional_build_files: ArrayProperty::empty(),
            default_domain_home,
            group: PropertyGroup::new("image"),
        };

        // A new base image invalidates the previous inspection. On load the
        // base image is read before the inspection fields, which restores
        // them afterwards.
        let inspected = page.base_image_inspected.clone();
        let contents = page.custom_base_image_contents.clone();
        page.base_image.subscribe(move |_| {
            inspected.set_value(false);
            contents.set_value(Vec::<String>::new());
        });

        let group = PropertyGroup::new("image")
            .field("imageTag", &page.image_tag)
            .field("createPrimaryImage", &page.create_primary_image)
            .field("createCustomImageForPV", &page.create_custom_image_for_pv)
            .field(
                "imageRegistryPushRequireAuthentication",
                &page.image_registry_push_require_authentication,
            )
            .field(
                "imageRegistryPushCredentialsReference",
                &page.image_registry_push_credentials_reference,
            )
            .field("useCustomBaseImage", &page.use_custom_base_image)
            .field("baseImage", &page.base_image)
            .field(
                "baseImagePullRequiresAuthentication",
                &page.base_image_pull_requires_authentication,
            )
            .field(
                "baseImagePullCredentialsReference",
                &page.base_image_pull_credentials_reference,
            )
            .field("baseImageInspected", &page.base_image_inspected)
            .field("customBaseImageContents", &page.custom_base_image_contents)
            .field("jdkInstaller", &page.jdk_installer)
            .field("jdkInstallerVersion", &page.jdk_installer_version)
            .field("oracleInstallerType", &page.oracle_installer_type)
            .field("oracleInstaller", &page.oracle_installer)
            .field("oracleInstallerVersion", &page.oracle_installer_version)
            .field("useLatestWdtVersion", &page.use_latest_wdt_version)
            .field("wdtInstaller", &page.wdt_installer)
            .field("wdtInstallerVersion", &page.wdt_installer_version)
            .field("applyOraclePatches", &page.apply_oracle_patches)
            .field("opatchBugNumber", &page.opatch_bug_number)
            .field("oracleSupportUserName", &page.oracle_support_user_name)
            .field("oracleSupportPassword", &page.oracle_support_password)
            .field("oraclePatchOptions", &page.oracle_patch_options)
            .field("oraclePatchesToApply", &page.oracle_patches_to_apply)
            .field("useAuxImage", &page.use_aux_image)
            .field("targetDomainType", &page.target_domain_type)
            .field("domainHomePath", &page.domain_home_path)
            .field("modelHomePath", &page.model_home_path)
            .field("wdtHomePath", &page.wdt_home_path)
            .field("targetOpenShift", &page.target_open_shift)
            .field("fileOwner", &page.file_owner)
            .field("fileGroup", &page.file_group)
            .field("alwaysPullBaseImage", &page.always_pull_base_image)
            .field("builderNetworkName", &page.builder_network_name)
            .field("extendBuild", &page.extend_build)
            .field("additionalBuildCommandsFile", &page.additional_build_commands_file)
            .field("additionalBuildFiles", &page.additional_build_files)
            .field("auxImageTag", &page.aux_image_tag)
            .field("createAuxImage", &page.create_aux_image)
            .field(
                "auxDefaultBaseImagePullRequiresAuthentication",
                &page.aux_default_base_image_pull_requires_authentication,
            )
            .field(
                "auxDefaultBaseImagePullCredentialsReference",
                &page.aux_default_base_image_pull_credentials_reference,
            )
            .field(
                "auxImageRegistryPushRequireAuthentication",
                &page.aux_image_registry_push_require_authentication,
            )
            .field(
                "auxImageRegistryPushCredentialsReference",
                &page.aux_image_registry_push_credentials_reference,
            )
            .field("auxUseCustomBaseImage", &page.aux_use_custom_base_image)
            .field("auxBaseImage", &page.aux_base_image)
            .field(
                "auxBaseImagePullRequiresAuthentication",
                &page.aux_base_image_pull_requires_authentication,
            )
            .field(
                "auxBaseImagePullCredentialsReference",
                &page.aux_base_image_pull_credentials_reference,
            )
            .field("auxTargetOpenShift", &page.aux_target_open_shift)
            .field("auxFileOwner", &page.aux_file_owner)
            .field("auxFileGroup", &page.aux_file_group)
            .field("auxAlwaysPullBaseImage", &page.aux_always_pull_base_image)
            .field("auxBuilderNetworkName", &page.aux_builder_network_name)
            .field("auxExtendBuild", &page.aux_extend_build)
            .field(
                "auxAdditionalBuildCommandsFile",
                &page.aux_additional_build_commands_file,
            )
            .field("auxAdditionalBuildFiles", &page.aux_additional_build_files);
        Self { group, ..page }
    }

    /// Record the result of inspecting the custom base image: which of
    /// `javaHome` / `oracleHome` it already provides.
    pub fn set_base_image_contents(&self, inspection: &Value) {
        let Some(found) = inspection.as_object() else {
            return;
        };
        let contents: Vec<&str> = ["javaHome", "oracleHome"]
            .into_iter()
            .filter(|key| found.contains_key(*key))
            .collect();
        self.custom_base_image_contents.set_value(contents);
        self.base_image_inspected.set_value(true);
    }

    /// The custom base image already contains a JDK. Ignored unless a
    /// custom base image is in use.
    pub fn base_image_contents_includes_java(&self) -> bool {
        self.use_custom_base_image.as_bool()
            && self
                .custom_base_image_contents
                .value()
                .iter()
                .any(|c| c == "javaHome")
    }

    pub fn base_image_contents_includes_middleware(&self) -> bool {
        self.use_custom_base_image.as_bool()
            && self
                .custom_base_image_contents
                .value()
                .iter()
                .any(|c| c == "oracleHome")
    }

    /// `/shared` for a domain on a persistent volume, `/u01` otherwise.
    pub fn default_domain_home(&self) -> String {
        validation::value_text(&self.default_domain_home.get())
    }

    pub fn image_registry_address(&self) -> Option<String> {
        util::registry_address(&self.image_tag.text())
    }

    pub fn base_image_registry_address(&self) -> Option<String> {
        util::registry_address(&self.base_image.text())
    }

    pub fn aux_image_registry_address(&self) -> Option<String> {
        util::registry_address(&self.aux_image_tag.text())
    }

    pub fn aux_base_image_registry_address(&self) -> Option<String> {
        util::registry_address(&self.aux_base_image.text())
    }

    /// Arguments understood by `do-push-image`.
    pub fn push_args(&self, settings: &SettingsPage) -> Value {
        json!({
            "builderExePath": settings.builder_executable_file_path.text(),
            "imageTag": self.image_tag.text(),
        })
    }
}

impl ConfigPage for ImagePage {
    fn group(&self) -> &PropertyGroup {
        &self.group
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["imageTag"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HostDefaults;
    use serde_json::Map;

    struct Pages {
        settings: SettingsPage,
        wko: WkoPage,
        model: WdtModelPage,
        image: ImagePage,
    }

    fn pages() -> Pages {
        let defaults = HostDefaults::default();
        let settings = SettingsPage::new(&defaults);
        let wko = WkoPage::new(&defaults);
        let model = WdtModelPage::new();
        let image = ImagePage::new(&settings, &wko, &model);
        Pages {
            settings,
            wko,
            model,
            image,
        }
    }

    #[test]
    fn domain_home_follows_location_and_domain_name() {
        let p = pages();
        assert_eq!(p.image.domain_home_path.text(), "/u01/domains/base_domain");
        p.settings.target_domain_location.set_value("pv");
        assert_eq!(p.image.domain_home_path.text(), "/shared/domains/base_domain");
        p.model.set_model_content("topology:\n  Name: mydomain\n");
        assert_eq!(p.image.domain_home_path.text(), "/shared/domains/mydomain");
        assert!(!p.image.domain_home_path.has_value());
    }

    #[test]
    fn domain_type_depends_on_location_operator_and_aux_image() {
        let p = pages();
        assert_eq!(p.image.target_domain_type.text(), "WLS");
        p.settings.target_domain_location.set_value("pv");
        assert_eq!(p.image.target_domain_type.text(), "JRF");
        p.wko.installed_version.set_value("4.0.9");
        assert_eq!(p.image.target_domain_type.text(), "WLS");
        p.wko.installed_version.set_value("4.1.0");
        assert_eq!(p.image.target_domain_type.text(), "JRF");
        p.image.use_aux_image.set_value(false);
        assert_eq!(p.image.target_domain_type.text(), "WLS");
    }

    #[test]
    fn file_group_follows_open_shift() {
        let p = pages();
        assert_eq!(p.image.file_group.text(), "oracle");
        p.image.target_open_shift.set_value(true);
        assert_eq!(p.image.file_group.text(), "root");
        assert_eq!(p.image.aux_file_group.text(), "oracle");
    }

    #[test]
    fn changing_the_base_image_resets_inspection() {
        let p = pages();
        p.image.use_custom_base_image.set_value(true);
        p.image.base_image.set_value("container-registry.oracle.com/middleware/weblogic:14.1.1.0");
        p.image
            .set_base_image_contents(&json!({"javaHome": "/u01/jdk", "oracleHome": "/u01/oracle"}));
        assert!(p.image.base_image_contents_includes_java());
        assert!(p.image.base_image_contents_includes_middleware());

        p.image.base_image.set_value("ghcr.io/acme/weblogic:12.2.1.4");
        assert!(!p.image.base_image_inspected.as_bool());
        assert!(p.image.custom_base_image_contents.value().is_empty());
        assert_eq!(p.image.base_image_registry_address().as_deref(), Some("ghcr.io"));
    }

    #[test]
    fn inspection_survives_project_reload() {
        let p = pages();
        p.image.base_image.set_value("ghcr.io/acme/weblogic:12.2.1.4");
        p.image.set_base_image_contents(&json!({"javaHome": "/u01/jdk"}));
        let mut json = Map::new();
        p.image.write_to(&mut json);

        let q = pages();
        q.image.read_from(&Value::Object(json));
        assert!(q.image.base_image_inspected.as_bool());
        assert_eq!(q.image.custom_base_image_contents.value(), vec!["javaHome"]);
        assert!(!q.image.is_changed());
    }

    #[test]
    fn support_credentials_are_not_written() {
        let p = pages();
        p.image.oracle_support_user_name.set_value("me@example.com");
        p.image.oracle_support_password.set_value("pw");
        let mut json = Map::new();
        p.image.write_to(&mut json);
        assert!(json.get("image").is_none());
        assert_eq!(
            json[crate::properties::CREDENTIAL_PATHS],
            json!(["image.oracleSupportUserName", "image.oracleSupportPassword"])
        );
    }

    #[test]
    fn push_args_use_the_builder_path() {
        let p = pages();
        p.settings.builder_executable_file_path.set_value("/usr/bin/podman");
        p.image.image_tag.set_value("phx.ocir.io/tenancy/app:1.0");
        assert_eq!(
            p.image.push_args(&p.settings),
            json!({"builderExePath": "/usr/bin/podman", "imageTag": "phx.ocir.io/tenancy/app:1.0"})
        );
    }
}
