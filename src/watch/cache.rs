// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::hash::compute_file_hash;

/// Content hashes of inputs as of their last compile.
///
/// Editors often emit several change events for one save, or touch a file
/// without changing it; comparing hashes lets the runtime skip those.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    /// Hash `path` and remember it.
    pub fn record(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<String> {
        let hash = compute_file_hash(fs, path)?;
        self.hashes.insert(path.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Re-hash `path`; true when it differs from (or had no) recorded hash.
    /// The new hash is recorded either way.
    pub fn has_changed(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<bool> {
        let previous = self.hashes.get(path).cloned();
        let current = self.record(fs, path)?;
        let changed = previous.as_deref() != Some(current.as_str());
        if !changed {
            debug!(path = %path.display(), "content unchanged");
        }
        Ok(changed)
    }

    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!(path = %path.display(), "invalidated cached hash");
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
