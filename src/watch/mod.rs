// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling include/exclude glob patterns (`patterns`), also used to
//!   resolve the file set of every pipeline.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning matching changes into repeated invocations of a target task
//!   (`trigger`), optionally skipping changes that leave content unchanged.
//!
//! It does **not** know how tasks execute; the caller supplies the
//! invocation.

pub mod hash;
pub mod patterns;
pub mod trigger;
pub mod watcher;

pub use hash::{compute_file_hash, ContentHashes};
pub use patterns::{collect_matching_files, PatternSet};
pub use trigger::WatchTrigger;
pub use watcher::{spawn_watcher, ChangeSource, ChangeSubscription, NotifyChangeSource, WatcherHandle};
