// src/watch/hash.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per changed path.
///
/// Lets a watch task ignore change notifications that did not alter the
/// file (editors that touch on save, `git checkout` of identical content).
#[derive(Debug, Default)]
pub struct ContentHashes {
    seen: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` differs from the last time it was seen, recording the
    /// new hash. Unreadable (e.g. deleted) files always count as changed.
    pub fn changed(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let hash = match compute_file_hash(fs, path) {
            Ok(h) => h,
            Err(err) => {
                debug!(?path, error = %err, "could not hash changed path; treating as changed");
                self.seen.remove(path);
                return true;
            }
        };

        match self.seen.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(?path, "content hash unchanged");
                false
            }
            _ => true,
        }
    }
}
