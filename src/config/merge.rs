// src/config/merge.rs

//! Deep merge of configuration documents.
//!
//! Override rules:
//! - tables merge key by key, recursively;
//! - every other value (arrays included) fully replaces the base value.
//!   Arrays never append, so `files = ["src/**/*.js"]` in a user file is the
//!   complete pattern set for that task.

use toml::{Table, Value};

/// Merge `overlay` into `base` in place.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                merge_tables(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
