//! User settings persisted as TOML in the OS config directory.
//!
//! ```toml
//! log_level = "debug"
//! command_timeout_secs = 300
//! recent_projects = ["/home/me/wkt/demo.wktproj"]
//!
//! [tools]
//! kubectl = "/usr/local/bin/kubectl"
//! latest_wko_version = "4.2.1"
//! ```
//!
//! A missing file yields the defaults. A file that cannot be parsed is
//! logged and replaced by the defaults; it is only overwritten on the next
//! explicit save.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of entries kept in [`UserSettings::recent_projects`].
pub const MAX_RECENT_PROJECTS: usize = 10;

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// `[tools]`: explicit locations that win over `PATH` lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ToolPaths {
    pub kubectl: Option<PathBuf>,
    pub helm: Option<PathBuf>,
    pub docker: Option<PathBuf>,
    pub podman: Option<PathBuf>,
    pub openssl: Option<PathBuf>,
    pub image_tool_script: Option<PathBuf>,
    /// Reported by `get-latest-wko-version-number`; nothing is fetched from
    /// the network.
    pub latest_wko_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct UserSettings {
    /// Most-recently-used project files, newest first.
    pub recent_projects: VecDeque<PathBuf>,
    /// Used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
    pub command_timeout_secs: u64,
    pub tools: ToolPaths,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            recent_projects: VecDeque::new(),
            log_level: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            tools: ToolPaths::default(),
        }
    }
}

impl UserSettings {
    /// Move `path` to the front of the recent list, dropping duplicates and
    /// the oldest entries beyond [`MAX_RECENT_PROJECTS`].
    pub fn remember_project(&mut self, path: &Path) {
        self.recent_projects.retain(|p| p != path);
        self.recent_projects.push_front(path.to_path_buf());
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }

    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.command_timeout_secs)
    }
}

/// `<config dir>/wktui/settings.toml`, when the OS reports a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wktui").join("settings.toml"))
}

/// Parse settings from TOML text and check them.
pub fn parse(toml_str: &str) -> Result<UserSettings, AppError> {
    let settings: UserSettings =
        toml::from_str(toml_str).map_err(|e| AppError::Settings(e.to_string()))?;
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &UserSettings) -> Result<(), AppError> {
    if settings.command_timeout_secs == 0 {
        return Err(AppError::Settings(
            "command_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if let Some(level) = &settings.log_level {
        if tracing_subscriber::EnvFilter::try_new(level).is_err() {
            return Err(AppError::Settings(format!("invalid log_level {level:?}")));
        }
    }
    Ok(())
}

/// Load settings from `path`. Missing or unreadable files fall back to the
/// defaults.
pub fn load(path: &Path) -> UserSettings {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return UserSettings::default(),
        Err(e) => {
            tracing::warn!("cannot read settings {}: {e}; using defaults", path.display());
            return UserSettings::default();
        }
    };
    parse(&text).unwrap_or_else(|e| {
        tracing::warn!("ignoring settings {}: {e}", path.display());
        UserSettings::default()
    })
}

/// Write settings to `path`, creating the parent directory.
pub fn save(settings: &UserSettings, path: &Path) -> Result<(), AppError> {
    validate(settings)?;
    let text = toml::to_string(settings).map_err(|e| AppError::Settings(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Settings(format!("cannot create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, text)
        .map_err(|e| AppError::Settings(format!("cannot write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse("").expect("empty TOML is valid");
        assert_eq!(settings, UserSettings::default());
        assert_eq!(settings.command_timeout_secs, 300);
    }

    #[test]
    fn tool_paths_are_read_from_their_table() {
        let settings = parse(
            r#"
log_level = "debug"

[tools]
kubectl = "/opt/bin/kubectl"
latest_wko_version = "4.2.1"
"#,
        )
        .expect("valid");
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.tools.kubectl, Some(PathBuf::from("/opt/bin/kubectl")));
        assert_eq!(settings.tools.latest_wko_version.as_deref(), Some("4.2.1"));
        assert!(settings.tools.helm.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = parse("command_timeout_secs = 0");
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn malformed_toml_is_a_settings_error() {
        assert!(matches!(parse("tools = 3"), Err(AppError::Settings(_))));
    }

    #[test]
    fn recent_projects_are_deduplicated_and_capped() {
        let mut settings = UserSettings::default();
        for i in 0..12 {
            settings.remember_project(Path::new(&format!("/p/{i}.json")));
        }
        settings.remember_project(Path::new("/p/5.json"));
        assert_eq!(settings.recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(settings.recent_projects[0], PathBuf::from("/p/5.json"));
        assert_eq!(
            settings.recent_projects.iter().filter(|p| p.ends_with("5.json")).count(),
            1
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.toml");
        let mut settings = UserSettings::default();
        settings.remember_project(Path::new("/work/demo.json"));
        settings.tools.docker = Some(PathBuf::from("/usr/bin/docker"));
        save(&settings, &path).expect("save");
        assert_eq!(load(&path), settings);
    }

    #[test]
    fn corrupt_or_missing_files_load_as_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(load(&dir.path().join("absent.toml")), UserSettings::default());

        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "this is = = not toml").expect("write");
        assert_eq!(load(&path), UserSettings::default());
    }
}
