// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::config::defaults::DEFAULT_CONFIG;
use crate::config::merge::merge_tables;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path, merged over the built-in
/// catalogue.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (task references, cycles, etc.). Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(?path, "read config file");
    load_from_str(&contents)
}

/// Parse a TOML document and merge it over the built-in catalogue.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let mut base: Table = toml::from_str(DEFAULT_CONFIG)?;
    let overlay: Table = toml::from_str(contents)?;
    merge_tables(&mut base, overlay);

    let raw: RawConfigFile = Value::Table(base).try_into()?;
    Ok(raw)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML and deep-merges it over the built-in catalogue.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown `after` / `target` references,
///   - cyclic task dependencies,
///   - thresholds and regexes that cannot be used.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// The built-in catalogue on its own, validated.
pub fn load_defaults() -> Result<ConfigFile> {
    load_from_str("")?.try_into()
}

/// Name of the config file looked up in the project root.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Taskgate.toml")
}
