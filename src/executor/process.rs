//! Answers executor commands from the local machine.
//!
//! Environment lookups read process variables, tool lookups honour the
//! `[tools]` overrides of the user settings and fall back to `PATH`, and
//! tool commands spawn the tool with a timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use super::{CommandExecutor, ToolOutcome};
use crate::config::ToolPaths;
use crate::error::AppError;

#[derive(Debug)]
struct Output {
    stdout: String,
    stderr: String,
    status: i32,
}

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    tools: ToolPaths,
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(tools: ToolPaths, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    fn tool_path(&self, configured: Option<&PathBuf>, name: &str) -> Value {
        configured
            .cloned()
            .or_else(|| find_in_path(name))
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .unwrap_or(Value::Null)
    }

    async fn run(
        &self,
        program: &str,
        args: &[String],
        envs: &[(String, OsString)],
    ) -> Result<Output, AppError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .envs(envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("running {program} {}", args.join(" "));
        let child = command
            .spawn()
            .map_err(|e| AppError::Tool(format!("cannot start {program}: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::Tool(format!("{program} timed out after {:?}", self.timeout)))?
            .map_err(|e| AppError::Tool(format!("{program} failed: {e}")))?;

        Ok(Output {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }

    /// Run a tool and fold every failure into a [`ToolOutcome`].
    async fn run_tool(
        &self,
        program: Option<String>,
        what: &str,
        args: Vec<String>,
        envs: Vec<(String, OsString)>,
    ) -> (ToolOutcome, Option<Output>) {
        let Some(program) = program else {
            return (ToolOutcome::failure(format!("no {what} executable is configured")), None);
        };
        match self.run(&program, &args, &envs).await {
            Ok(out) if out.status == 0 => (ToolOutcome::success(out.stdout.trim()), Some(out)),
            Ok(out) => {
                let reason = format!("{} (exit code {})", output_diagnostic(&out), out.status);
                tracing::warn!("{what} failed: {reason}");
                let mut outcome = ToolOutcome::failure(reason);
                outcome.output = out.stdout.trim().to_string();
                (outcome, Some(out))
            }
            Err(e) => {
                tracing::warn!("{what} failed: {e}");
                (ToolOutcome::failure(e.to_string()), None)
            }
        }
    }

    async fn verify_kubectl_connection(&self, args: &Value) -> ToolOutcome {
        let program = arg_string(args, "kubectlExePath")
            .or_else(|| self.default_tool(&self.tools.kubectl, "kubectl"));
        let mut cli = vec!["version".to_string(), "-o".to_string(), "json".to_string()];
        if let Some(context) = arg_string(args, "kubeContext") {
            cli.push(format!("--context={context}"));
        }
        let (outcome, _) = self.run_tool(program, "kubectl", cli, kube_env(args)).await;
        outcome
    }

    async fn list_helm_releases(&self, args: &Value) -> ToolOutcome {
        let program = arg_string(args, "helmExePath")
            .or_else(|| self.default_tool(&self.tools.helm, "helm"));
        let mut cli = vec![
            "list".to_string(),
            "--all-namespaces".to_string(),
            "-o".to_string(),
            "json".to_string(),
        ];
        if let Some(context) = arg_string(args, "kubeContext") {
            cli.push(format!("--kube-context={context}"));
        }
        let (outcome, output) = self.run_tool(program, "helm", cli, kube_env(args)).await;
        match output {
            Some(out) if outcome.is_success => match serde_json::from_str::<Value>(&out.stdout) {
                Ok(releases) => outcome.with_data(releases),
                Err(e) => ToolOutcome::failure(format!("cannot parse helm output: {e}")),
            },
            _ => outcome,
        }
    }

    async fn push_image(&self, args: &Value) -> ToolOutcome {
        let Some(tag) = arg_string(args, "imageTag") else {
            return ToolOutcome::failure("no image tag was given");
        };
        let program = arg_string(args, "builderExePath")
            .or_else(|| self.default_tool(&self.tools.docker, "docker"));
        let (outcome, _) = self
            .run_tool(program, "image push", vec!["push".to_string(), tag], Vec::new())
            .await;
        outcome
    }

    fn default_tool(&self, configured: &Option<PathBuf>, name: &str) -> Option<String> {
        match self.tool_path(configured.as_ref(), name) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError> {
        let result = match command {
            "get-java-home" => env_value(&["JAVA_HOME"]),
            "get-oracle-home" => env_value(&["ORACLE_HOME"]),
            "get-https-proxy-url" => env_value(&["HTTPS_PROXY", "https_proxy"]),
            "get-bypass-proxy-hosts" => env_value(&["NO_PROXY", "no_proxy"]),
            "get-image-tool-shell-script-location" => {
                self.tool_path(self.tools.image_tool_script.as_ref(), image_tool_script_name())
            }
            "get-kubectl-file-path" => self.tool_path(self.tools.kubectl.as_ref(), "kubectl"),
            "get-helm-file-path" => self.tool_path(self.tools.helm.as_ref(), "helm"),
            "get-docker-file-path" => self.tool_path(self.tools.docker.as_ref(), "docker"),
            "get-podman-file-path" => self.tool_path(self.tools.podman.as_ref(), "podman"),
            "get-openssl-file-path" => self.tool_path(self.tools.openssl.as_ref(), "openssl"),
            "get-kube-config" => Value::from(kube_config_files()),
            "get-latest-wko-version-number" => self
                .tools
                .latest_wko_version
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
            "kubectl-verify-connection" => self.verify_kubectl_connection(&args).await.into_value(),
            "helm-list-all-namespaces" => self.list_helm_releases(&args).await.into_value(),
            "do-push-image" => self.push_image(&args).await.into_value(),
            other => return Err(AppError::UnknownCommand(other.to_string())),
        };
        Ok(result)
    }
}

fn env_value(names: &[&str]) -> Value {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

fn image_tool_script_name() -> &'static str {
    if cfg!(windows) {
        "imagetool.cmd"
    } else {
        "imagetool.sh"
    }
}

/// Search `PATH` for `name` (with `.exe` appended on Windows).
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in(std::env::split_paths(&path), name)
}

fn find_in(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    let file_name = if cfg!(windows) && Path::new(name).extension().is_none() {
        format!("{name}.exe")
    } else {
        name.to_string()
    };
    dirs.into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// `KUBECONFIG` entries, or `~/.kube/config` when it exists.
fn kube_config_files() -> Vec<String> {
    if let Some(value) = std::env::var_os("KUBECONFIG") {
        let files: Vec<String> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if !files.is_empty() {
            return files;
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .filter(|p| p.is_file())
        .map(|p| vec![p.to_string_lossy().into_owned()])
        .unwrap_or_default()
}

fn arg_string(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `KUBECONFIG` from the `kubeConfig` argument (string or list of files),
/// plus any `env` object entries.
fn kube_env(args: &Value) -> Vec<(String, OsString)> {
    let mut envs = Vec::new();
    let files: Vec<PathBuf> = match args.get("kubeConfig") {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![PathBuf::from(s.trim())],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .collect(),
        _ => Vec::new(),
    };
    if !files.is_empty() {
        match std::env::join_paths(files) {
            Ok(joined) => envs.push(("KUBECONFIG".to_string(), joined)),
            Err(e) => tracing::warn!("ignoring kubeConfig argument: {e}"),
        }
    }
    if let Some(Value::Object(extra)) = args.get("env") {
        for (name, value) in extra {
            if let Some(value) = value.as_str() {
                envs.push((name.clone(), OsString::from(value)));
            }
        }
    }
    envs
}

fn output_diagnostic(out: &Output) -> String {
    let stderr = out.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = out.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    "no output".to_string()
}
