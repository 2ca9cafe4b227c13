// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled include/exclude glob patterns.
///
/// Patterns are relative to the project root; a leading `!` turns a pattern
/// into an exclusion, so
///
/// ```toml
/// files = ["public/js/**/*.js", "!public/js/vendor/**"]
/// ```
///
/// matches every client script outside `vendor/`. `*` never crosses a `/`;
/// use `**` for that.
#[derive(Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl PatternSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let (excludes, includes): (Vec<&String>, Vec<&String>) =
            patterns.iter().partition(|p| p.starts_with('!'));

        let include = build_globset(includes.iter().map(|p| p.as_str()))
            .context("building include globset")?;

        let exclude = if excludes.is_empty() {
            None
        } else {
            Some(
                build_globset(excludes.iter().map(|p| &p[1..]))
                    .context("building exclude globset")?,
            )
        };

        Ok(Self {
            patterns: patterns.to_vec(),
            include,
            exclude,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the given path (relative to the project root, with
    /// forward slashes), e.g. `"lib/foo/bar.js"`, is selected.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

fn build_globset<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` selected by `set`, sorted.
///
/// Directories named in `ignore_dirs` are never descended into.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    set: &PatternSet,
    ignore_dirs: &[String],
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                let ignored = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| ignore_dirs.iter().any(|d| d == n));
                if !ignored {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if set.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
