//! The seam between the project model and the host machine.
//!
//! Everything that needs the environment, the file system outside the
//! project or an external tool goes through [`CommandExecutor::invoke`]
//! with a command name and a JSON argument object. [`ProcessExecutor`]
//! answers from the real machine; [`StaticExecutor`] answers from canned
//! responses and records every call.
//!
//! Tool commands (`kubectl-verify-connection`, `helm-list-all-namespaces`,
//! `do-push-image`) do not fail with an error when the tool fails: they
//! return a [`ToolOutcome`] object with `isSuccess: false` and a `reason`.

pub mod canned;
pub mod process;

pub use canned::StaticExecutor;
pub use process::ProcessExecutor;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError>;
}

/// Result object of an external tool command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Combined tool output, echoed to the console by the command layer.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Command-specific payload (e.g. the parsed helm release list).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl ToolOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            is_success: true,
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            is_success: false,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Invoke `command` and read the result as an optional string. Errors and
/// non-string results are logged and treated as absent.
pub async fn query_string(
    executor: &dyn CommandExecutor,
    command: &str,
    args: Value,
) -> Option<String> {
    match executor.invoke(command, args).await {
        Ok(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Ok(Value::String(_)) | Ok(Value::Null) => None,
        Ok(other) => {
            tracing::warn!("{command} returned a non-string result {other}");
            None
        }
        Err(e) => {
            tracing::warn!("{command} failed: {e}");
            None
        }
    }
}
