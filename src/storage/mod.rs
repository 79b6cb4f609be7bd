// src/storage/mod.rs

//! Object storage abstraction.
//!
//! The compile pipeline uploads rendered emails and their images through an
//! [`ObjectStore`]. Objects are keyed by `<prefix><file name>` and addressed
//! by the public URL from [`StorageSettings::public_url`].
//!
//! - [`S3ObjectStore`] talks to the configured S3 bucket.
//! - [`MemoryObjectStore`] keeps everything in memory (tests).
//!
//! Uploads are attempted once. Callers log and skip failures.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};

use crate::config::StorageSettings;
use crate::fs::FileSystem;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub mod s3;

pub use s3::S3ObjectStore;

pub trait ObjectStore: Send + Sync + Debug {
    /// Upload a local file under its object key and return its public URL.
    fn upload<'a>(&'a self, local: &'a Path) -> BoxFuture<'a, Result<String>>;

    /// Whether an object with this file name already exists.
    fn exists<'a>(&'a self, file_name: &'a str) -> BoxFuture<'a, Result<bool>>;

    fn public_url(&self, file_name: &str) -> String;
}

pub(crate) fn file_name_of(local: &Path) -> Result<&str> {
    local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("cannot derive an object name from {:?}", local))
}

/// In-memory store. Cloning shares the same objects.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    storage: StorageSettings,
    fs: Arc<dyn FileSystem>,
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    pub fn new(storage: StorageSettings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            storage,
            fs,
            objects: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Pretend an object already exists.
    pub fn insert(&self, file_name: &str, contents: impl Into<Vec<u8>>) {
        self.lock().insert(self.key(file_name), contents.into());
    }

    /// Object keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.lock().get(&self.key(file_name)).cloned()
    }

    fn key(&self, file_name: &str) -> String {
        format!("{}{}", self.storage.prefix, file_name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload<'a>(&'a self, local: &'a Path) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let name = file_name_of(local)?;
            let bytes = self
                .fs
                .read(local)
                .with_context(|| format!("uploading {:?}", local))?;
            self.lock().insert(self.key(name), bytes);
            Ok(self.public_url(name))
        })
    }

    fn exists<'a>(&'a self, file_name: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move { Ok(self.lock().contains_key(&self.key(file_name))) })
    }

    fn public_url(&self, file_name: &str) -> String {
        self.storage.public_url(file_name)
    }
}
