//! Application-level error type returned by every command handler.
//!
//! `AppError` is serialized to `{ kind, message }` JSON payloads so the
//! host process can pattern-match on a stable `kind` string.

use crate::properties::PropertyError;
use crate::validation::ValidationReport;

/// Top-level error returned by command handlers and the external command
/// executor.
///
/// Serialized with serde's adjacently-tagged representation:
/// `{ "kind": "<variant>", "message": "<human-readable text>" }`
#[derive(Debug, thiserror::Error, serde::Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    /// A required file path does not exist on disk.
    #[error("file not found")]
    FileNotFound,

    /// A generic I/O error; the inner [`std::io::Error`] is converted to a
    /// string at the system boundary so it remains serializable.
    #[error("{0}")]
    Io(String),

    /// The project file could not be loaded or parsed.
    #[error("{0}")]
    ProjectLoad(String),

    /// The project file could not be written.
    #[error("{0}")]
    ProjectSave(String),

    /// A requested page, property or list entry was not found.
    #[error("{0}")]
    NotFound(String),

    /// A command received arguments it cannot use.
    #[error("{0}")]
    InvalidArgument(String),

    /// The command name is not handled by the dispatcher or executor.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Pre-flight validation failed before an action was started. The
    /// message is the full report, one entry per failing field.
    #[error("{}", .0.summary())]
    Validation(ValidationReport),

    /// A property operation was rejected (duplicate key, missing entry).
    #[error("{0}")]
    Property(String),

    /// An external tool could not be started or did not finish.
    #[error("{0}")]
    Tool(String),

    /// The user settings file could not be read or written.
    #[error("{0}")]
    Settings(String),
}

impl From<std::io::Error> for AppError {
    /// Convert an [`std::io::Error`] into an [`AppError::Io`].
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    /// JSON errors surface as invalid arguments: they only arise when a
    /// host-supplied payload does not have the expected shape.
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<PropertyError> for AppError {
    fn from(e: PropertyError) -> Self {
        Self::Property(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_serializes_to_kind_message() {
        let err = AppError::Io("disk full".to_string());
        let value = serde_json::to_value(&err).expect("serialize AppError::Io");
        assert_eq!(value["kind"], "Io");
        assert_eq!(value["message"], "disk full");
    }

    #[test]
    fn project_load_error_serializes_to_kind_message() {
        let err = AppError::ProjectLoad("invalid JSON".to_string());
        let value = serde_json::to_value(&err).expect("serialize AppError::ProjectLoad");
        assert_eq!(value["kind"], "ProjectLoad");
        assert_eq!(value["message"], "invalid JSON");
    }

    #[test]
    fn file_not_found_serializes_with_kind() {
        let err = AppError::FileNotFound;
        let value = serde_json::to_value(&err).expect("serialize AppError::FileNotFound");
        assert_eq!(value["kind"], "FileNotFound");
    }

    #[test]
    fn unknown_command_display_names_the_command() {
        let err = AppError::UnknownCommand("do-magic".to_string());
        assert_eq!(err.to_string(), "unknown command: do-magic");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "UnknownCommand");
        assert_eq!(value["message"], "do-magic");
    }

    #[test]
    fn from_property_error_produces_property_variant() {
        let err = AppError::from(PropertyError::DuplicateKey {
            key: "abc".to_string(),
        });
        assert!(matches!(err, AppError::Property(_)));
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "Property");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app_err = AppError::from(io_err);
        assert!(matches!(app_err, AppError::Io(_)));
        let value = serde_json::to_value(&app_err).expect("serialize");
        assert_eq!(value["kind"], "Io");
    }

    #[test]
    fn from_json_error_produces_invalid_argument() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err = AppError::from(json_err);
        assert!(matches!(app_err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn validation_error_carries_the_report() {
        let mut report = ValidationReport::new("push image");
        report.add_field(
            "image.imageTag",
            Err(crate::validation::ValidationError::new("value is empty")),
        );
        let err = AppError::Validation(report);
        assert!(err.to_string().contains("image.imageTag: value is empty"));

        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "Validation");
        assert_eq!(value["message"]["flowName"], "push image");
        assert_eq!(value["message"]["fields"][0]["fieldName"], "image.imageTag");
        assert_eq!(value["message"]["fields"][0]["errors"][0], "value is empty");
    }

    #[test]
    fn app_error_display_is_human_readable() {
        assert_eq!(AppError::FileNotFound.to_string(), "file not found");
        assert_eq!(
            AppError::ProjectSave("write failed".to_string()).to_string(),
            "write failed"
        );
    }
}
