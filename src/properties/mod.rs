//! Observable properties with default tracking, and the groups that persist
//! them.
//!
//! - [`scalar`]: one string / number / boolean value with a constant or
//!   computed default
//! - [`array`]: a list of strings edited as comma-separated text
//! - [`list`]: an ordered list of records, optionally keyed and persisted
//!   by primary key
//! - [`group`]: the explicit schema that reads / writes one page's
//!   properties under `json[<group name>]`
//!
//! Every property tracks two reference points: its *declared* default (what a
//! fresh project starts with, and what persistence compares against) and its
//! *baseline* (the value recorded by the last load or save). `has_value()`
//! compares the current value against the baseline, falling back to the
//! declared default when no baseline has been recorded.

pub mod array;
pub mod compare;
pub mod group;
pub mod list;
pub mod scalar;

use serde::Serialize;
use serde_json::Value;

use crate::validation::ValidationReport;

pub use array::ArrayProperty;
pub use compare::values_equal;
pub use group::{PropertyGroup, CREDENTIAL_PATHS};
pub use list::{ListProperty, Record};
pub use scalar::ScalarProperty;

/// Errors raised by property mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("an entry with key {key} already exists")]
    DuplicateKey { key: String },

    #[error("no entry with key {key}")]
    KeyNotFound { key: String },

    #[error("no entry at index {index}")]
    IndexOutOfRange { index: usize },

    #[error("{field} is not a field of this list")]
    UnknownField { field: String },

    #[error("{0}")]
    InvalidValue(String),
}

/// The shape of a property, reported in a group's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Scalar,
    Array,
    List,
}

/// Operations shared by every property kind.
///
/// Property handles are cheap clones of shared state, so a group can hold
/// its own boxed handle while the page struct keeps a typed one.
pub trait Property: Send + Sync {
    fn kind(&self) -> PropertyKind;

    /// The current value as JSON.
    fn value_json(&self) -> Value;

    /// Replace the current value from JSON supplied by a host.
    fn set_value_json(&self, value: Value) -> Result<(), PropertyError>;

    /// `true` when the value differs from the baseline (or the declared
    /// default when nothing has been recorded yet).
    fn has_value(&self) -> bool;

    /// The value to write to the project file, or `None` when the value is
    /// at its declared default and should be omitted.
    fn persisted_value(&self) -> Option<Value>;

    /// Load a value read from a project file; it also becomes the baseline.
    /// Values of the wrong shape reset the property to its default.
    fn set_persisted_value(&self, value: &Value);

    /// Reset to the declared default and forget the baseline.
    fn clear(&self);

    /// Record the current value as the baseline.
    fn set_not_changed(&self);

    fn is_credential(&self) -> bool {
        false
    }

    /// The list behind this property, for row-level edits.
    fn as_list(&self) -> Option<&ListProperty> {
        None
    }

    /// The persisted value with credential fields removed, plus the
    /// relative paths of the removed fields.
    fn masked_persisted_value(&self) -> (Option<Value>, Vec<String>) {
        (self.persisted_value(), Vec::new())
    }

    /// Run validators and record failures under `path`.
    fn validate_into(&self, path: &str, required: bool, report: &mut ValidationReport);
}
