//! An executor that answers from a fixed table.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use serde_json::Value;

use super::CommandExecutor;
use crate::error::AppError;

/// Returns the registered response for each command and records every
/// call. Unregistered commands fail with [`AppError::UnknownCommand`].
#[derive(Debug, Default)]
pub struct StaticExecutor {
    responses: RwLock<HashMap<String, Value>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, command: &str, response: Value) -> Self {
        self.set_response(command, response);
        self
    }

    pub fn set_response(&self, command: &str, response: Value) {
        self.responses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(command.to_string(), response);
    }

    /// Every `(command, args)` pair received so far, oldest first.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl CommandExecutor for StaticExecutor {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((command.to_string(), args));
        self.responses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command)
            .cloned()
            .ok_or_else(|| AppError::UnknownCommand(command.to_string()))
    }
}
