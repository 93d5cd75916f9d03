//! Application state shared by every command handler.
//!
//! [`AppState`] is built once in [`crate::run`] and handed to the command
//! dispatcher. The project and settings sit behind [`RwLock`]s so read
//! commands do not block each other.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::config::UserSettings;
use crate::executor::{CommandExecutor, StaticExecutor};
use crate::models::HostDefaults;
use crate::project::Project;

/// Lines kept in the console before the oldest are dropped.
pub const MAX_CONSOLE_LINES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    Out,
    Err,
}

/// One line of external tool output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleLine {
    pub text: String,
    pub kind: ConsoleKind,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

/// Output of external tools, newest last.
#[derive(Debug, Default)]
pub struct Console {
    lines: RwLock<VecDeque<ConsoleLine>>,
}

impl Console {
    /// Append every line of `text`.
    pub fn append(&self, text: &str, kind: ConsoleKind) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        for line in text.lines() {
            lines.push_back(ConsoleLine {
                text: line.to_string(),
                kind,
                timestamp: timestamp.clone(),
            });
        }
        while lines.len() > MAX_CONSOLE_LINES {
            lines.pop_front();
        }
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Root application state.
pub struct AppState {
    /// The open project.
    pub project: RwLock<Project>,
    /// Where the open project was last loaded from or saved to.
    pub project_file: RwLock<Option<PathBuf>>,
    pub settings: RwLock<UserSettings>,
    /// `None` when the OS reports no config directory; settings then live
    /// only for the session.
    pub settings_path: Option<PathBuf>,
    pub console: Console,
    pub executor: Arc<dyn CommandExecutor>,
    /// Looked up once at startup and reused for every new project.
    pub host_defaults: HostDefaults,
}

impl AppState {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        host_defaults: HostDefaults,
        settings: UserSettings,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            project: RwLock::new(Project::new(&host_defaults)),
            project_file: RwLock::new(None),
            settings: RwLock::new(settings),
            settings_path,
            console: Console::default(),
            executor,
            host_defaults,
        }
    }

    /// A project with this session's host defaults and nothing loaded.
    pub fn fresh_project(&self) -> Project {
        Project::new(&self.host_defaults)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Arc::new(StaticExecutor::new()),
            HostDefaults::default(),
            UserSettings::default(),
            None,
        )
    }
}
