//! Newline-delimited JSON request loop between a host UI and the commands.
//!
//! Each input line is a request `{"id": 7, "command": "is-dirty", "args": {}}`.
//! Each answer is one output line: `{"id": 7, "result": ...}` on success or
//! `{"id": 7, "error": {"kind": ..., "message": ...}}` on failure. Requests
//! are handled one at a time, in order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    command: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<AppError>,
}

impl Response {
    fn new(id: Value, outcome: Result<Value, AppError>) -> Self {
        match outcome {
            Ok(result) => Self {
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

/// Serve requests from `input` until it is closed.
pub async fn serve<R, W>(state: &AppState, input: R, mut output: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let outcome = commands::dispatch(state, &request.command, request.args).await;
                if let Err(e) = &outcome {
                    tracing::warn!("{} failed: {e}", request.command);
                }
                Response::new(request.id, outcome)
            }
            Err(e) => {
                tracing::warn!("malformed request: {e}");
                Response::new(
                    Value::Null,
                    Err(AppError::InvalidArgument(format!("malformed request: {e}"))),
                )
            }
        };
        let mut text = serde_json::to_string(&response)
            .map_err(|e| AppError::Io(format!("cannot serialize response: {e}")))?;
        text.push('\n');
        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }
    tracing::info!("host closed the request stream");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(state: &AppState, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve(state, input.as_bytes(), &mut output)
            .await
            .expect("serve");
        String::from_utf8(output)
            .expect("utf-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_each_request_with_its_id() {
        let state = AppState::default();
        let input = concat!(
            r#"{"id": 1, "command": "set-property", "args": {"page": "image", "key": "imageTag", "value": "a:1"}}"#,
            "\n\n",
            r#"{"id": "two", "command": "is-dirty"}"#,
            "\n"
        );
        let responses = run(&state, input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], json!({"id": 1, "result": null}));
        assert_eq!(responses[1], json!({"id": "two", "result": true}));
    }

    #[tokio::test]
    async fn errors_carry_kind_and_message() {
        let state = AppState::default();
        let responses = run(
            &state,
            "{\"id\": 3, \"command\": \"launch-rocket\"}\nnot json\n",
        )
        .await;
        assert_eq!(
            responses[0],
            json!({"id": 3, "error": {"kind": "UnknownCommand", "message": "launch-rocket"}})
        );
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["kind"], "InvalidArgument");
    }
}
