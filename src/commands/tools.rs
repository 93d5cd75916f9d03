//! External tool commands.
//!
//! Arguments the host leaves out are filled from the open project (tool
//! paths, kubeconfig, image tag). Tool output is echoed to the console;
//! failures come back as `{isSuccess: false, reason}` results, not errors.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::executor::ToolOutcome;
use crate::project::Project;
use crate::state::{AppState, ConsoleKind};

use super::read_project;

/// Forward `command` to the executor and echo its output.
pub(crate) async fn run_tool_inner(
    state: &AppState,
    command: &str,
    args: Value,
) -> Result<Value, AppError> {
    // The project lock is released before the tool runs.
    let args = {
        let project = read_project(&state.project)?;
        check_preconditions(&project, command)?;
        with_defaults(args, project_args(&project, command))
    };

    let executor = Arc::clone(&state.executor);
    let result = executor.invoke(command, args).await?;

    match serde_json::from_value::<ToolOutcome>(result.clone()) {
        Ok(outcome) => {
            if !outcome.output.is_empty() {
                state.console.append(&outcome.output, ConsoleKind::Out);
            }
            if !outcome.is_success {
                let reason = outcome.reason.as_deref().unwrap_or("unknown failure");
                tracing::warn!("{command} failed: {reason}");
                state
                    .console
                    .append(&format!("{command} failed: {reason}"), ConsoleKind::Err);
            }
        }
        Err(e) => tracing::warn!("{command} returned an unexpected result: {e}"),
    }
    Ok(result)
}

fn check_preconditions(project: &Project, command: &str) -> Result<(), AppError> {
    if command != "do-push-image" {
        return Ok(());
    }
    let report = project.validate_page("image", "push image")?;
    if report.has_errors() {
        return Err(AppError::Validation(report));
    }
    Ok(())
}

fn project_args(project: &Project, command: &str) -> Value {
    match command {
        "kubectl-verify-connection" => project.kubectl.connection_args(),
        "helm-list-all-namespaces" => project.kubectl.helm_args(),
        "do-push-image" => project.image.push_args(&project.settings),
        _ => Value::Null,
    }
}

/// `args` with every key missing (or null) filled from `defaults`.
fn with_defaults(args: Value, defaults: Value) -> Value {
    let mut merged = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(defaults) = defaults {
        for (key, value) in defaults {
            let missing = merged.get(&key).map_or(true, Value::is_null);
            if missing {
                merged.insert(key, value);
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserSettings;
    use crate::executor::StaticExecutor;
    use crate::models::HostDefaults;
    use serde_json::json;

    fn state_with(executor: Arc<StaticExecutor>) -> AppState {
        AppState::new(
            executor,
            HostDefaults {
                kubectl_path: Some("/usr/bin/kubectl".to_string()),
                ..HostDefaults::default()
            },
            UserSettings::default(),
            None,
        )
    }

    #[test]
    fn host_arguments_win_over_project_defaults() {
        let merged = with_defaults(
            json!({"kubeContext": "prod", "kubectlExePath": null}),
            json!({"kubeContext": "", "kubectlExePath": "/usr/bin/kubectl"}),
        );
        assert_eq!(
            merged,
            json!({"kubeContext": "prod", "kubectlExePath": "/usr/bin/kubectl"})
        );
    }

    #[tokio::test]
    async fn successful_output_is_echoed_to_the_console() {
        let executor = Arc::new(StaticExecutor::new().with_response(
            "kubectl-verify-connection",
            ToolOutcome::success("Client Version: v1.29\nServer Version: v1.28").into_value(),
        ));
        let state = state_with(Arc::clone(&executor));

        let result = run_tool_inner(&state, "kubectl-verify-connection", json!({}))
            .await
            .expect("run");
        assert_eq!(result["isSuccess"], json!(true));

        let lines: Vec<String> = state.console.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(lines, vec!["Client Version: v1.29", "Server Version: v1.28"]);
        let calls = executor.calls();
        assert_eq!(calls[0].1["kubectlExePath"], "/usr/bin/kubectl");
    }

    #[tokio::test]
    async fn failures_are_results_with_a_console_error_line() {
        let executor = Arc::new(StaticExecutor::new().with_response(
            "helm-list-all-namespaces",
            ToolOutcome::failure("no helm executable is configured").into_value(),
        ));
        let state = state_with(executor);

        let result = run_tool_inner(&state, "helm-list-all-namespaces", Value::Null)
            .await
            .expect("run");
        assert_eq!(result["isSuccess"], json!(false));
        let lines = state.console.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, ConsoleKind::Err);
        assert!(lines[0].text.contains("no helm executable"));
    }

    #[tokio::test]
    async fn push_requires_a_valid_image_page() {
        let executor = Arc::new(
            StaticExecutor::new()
                .with_response("do-push-image", ToolOutcome::success("pushed").into_value()),
        );
        let state = state_with(Arc::clone(&executor));

        let result = run_tool_inner(&state, "do-push-image", json!({})).await;
        match result {
            Err(AppError::Validation(report)) => {
                assert_eq!(report.fields[0].field_name, "image.imageTag");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        assert!(executor.calls().is_empty());

        state
            .project
            .read()
            .expect("read lock")
            .image
            .image_tag
            .set_value("ghcr.io/acme/shop:1.0");
        run_tool_inner(&state, "do-push-image", json!({})).await.expect("push");
        assert_eq!(executor.calls()[0].1["imageTag"], "ghcr.io/acme/shop:1.0");
    }
}
