//! Project files and the in-memory project.
//!
//! A project is a JSON file plus the WDT model and variables files it
//! references by relative path. This module provides:
//!
//! - [`document`]: the [`Project`] with all configuration pages
//! - [`migration`]: upgrades of older project layouts
//! - [`types`]: typed views of the project file
//! - [`serialization`]: atomic save and tolerant load

pub mod document;
pub mod migration;
pub mod serialization;
pub mod types;

pub use document::{Project, NOT_SET, PAGE_NAMES};
