// src/config/mod.rs

//! Configuration loading and validation for taskgate.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Ship the built-in task catalogue (`defaults.rs`).
//! - Deep-merge user overrides over it (`merge.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate task references, tool settings and acyclicity (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod merge;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_defaults, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ConfigSection, CoverageSection, CoverageThresholds, RawConfigFile, TaskConfig,
    TaskKind,
};
