pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod models;
pub mod observable;
pub mod project;
pub mod properties;
pub mod state;
pub mod util;
pub mod validation;

use std::sync::Arc;

use error::AppError;
use executor::{CommandExecutor, ProcessExecutor};
use models::HostDefaults;
use state::AppState;

/// WKT UI library entry point.
///
/// Loads user settings, resolves host defaults through the process executor
/// and serves host requests on stdin/stdout until stdin closes.
pub fn run() -> Result<(), AppError> {
    let settings_path = config::default_settings_path();
    let settings = settings_path
        .as_deref()
        .map(config::load)
        .unwrap_or_default();

    // ── Tracing setup ───────────────────────────────────────────────────────
    //
    // Logs are written to a rolling-never (single) file in the OS data dir:
    //   Linux    ~/.local/share/wktui/wktui.log
    //   macOS    ~/Library/Application Support/wktui/wktui.log
    //   Windows  %LOCALAPPDATA%\wktui\wktui.log
    //
    // The level comes from RUST_LOG, then the settings file, then INFO.
    // stdout carries responses, so nothing is logged there.
    let log_dir = dirs::data_local_dir().unwrap_or_default().join("wktui");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::never(&log_dir, "wktui.log");
    let (non_blocking, _tracing_guard) = tracing_appender::non_blocking(file_appender);

    let fallback_level = settings.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_level)),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    tracing::info!("WKT UI starting");
    if let Some(path) = &settings_path {
        tracing::debug!("user settings at {}", path.display());
    }

    // ── Application state and request loop ──────────────────────────────────
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessExecutor::new(
            settings.tools.clone(),
            settings.command_timeout(),
        ));
        let host_defaults = HostDefaults::resolve(executor.as_ref()).await;
        let state = AppState::new(executor, host_defaults, settings, settings_path);

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        host::serve(&state, stdin, tokio::io::stdout()).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A full request cycle against the default state, without touching the
    /// real machine.
    #[tokio::test]
    async fn serves_requests_against_a_fresh_state() {
        let state = AppState::default();
        let mut output = Vec::new();
        host::serve(
            &state,
            "{\"id\": 1, \"command\": \"get-project-snapshot\"}\n".as_bytes(),
            &mut output,
        )
        .await
        .expect("serve");
        let response: serde_json::Value =
            serde_json::from_slice(&output).expect("one json line");
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"]["isDirty"], json!(false));
    }
}
