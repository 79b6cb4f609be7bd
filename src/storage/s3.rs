// src/storage/s3.rs

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore as _, PutOptions, PutPayload};
use tracing::debug;

use super::{BoxFuture, ObjectStore, file_name_of};
use crate::config::StorageSettings;
use crate::fs::FileSystem;

/// Uploads to the configured S3 bucket with the resolved credentials.
pub struct S3ObjectStore {
    storage: StorageSettings,
    client: AmazonS3,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.storage.bucket)
            .field("region", &self.storage.region)
            .field("prefix", &self.storage.prefix)
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    /// Build a client for `storage`. Credentials must be resolved.
    pub fn new(storage: StorageSettings, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let credentials = storage
            .credentials
            .clone()
            .ok_or_else(|| anyhow!("no credentials for bucket {}", storage.bucket))?;

        let client = AmazonS3Builder::new()
            .with_bucket_name(&storage.bucket)
            .with_region(&storage.region)
            .with_access_key_id(&credentials.access_key_id)
            .with_secret_access_key(&credentials.secret_access_key)
            .build()
            .with_context(|| format!("configuring S3 bucket {}", storage.bucket))?;

        Ok(Self { storage, client, fs })
    }

    fn location(&self, file_name: &str) -> ObjectPath {
        ObjectPath::from(object_key(&self.storage.prefix, file_name))
    }
}

impl ObjectStore for S3ObjectStore {
    fn upload<'a>(&'a self, local: &'a Path) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let name = file_name_of(local)?;
            let bytes = self
                .fs
                .read(local)
                .with_context(|| format!("reading {:?} for upload", local))?;

            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type(local).into());
            let opts = PutOptions {
                attributes,
                ..Default::default()
            };

            let location = self.location(name);
            self.client
                .put_opts(&location, PutPayload::from(bytes), opts)
                .await
                .with_context(|| format!("uploading {:?} to s3://{}/{}", local, self.storage.bucket, location))?;
            debug!(from = %local.display(), key = %location, "uploaded object");
            Ok(self.public_url(name))
        })
    }

    fn exists<'a>(&'a self, file_name: &'a str) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            match self.client.head(&self.location(file_name)).await {
                Ok(_) => Ok(true),
                Err(object_store::Error::NotFound { .. }) => Ok(false),
                Err(e) => Err(anyhow!(e).context(format!("checking {file_name} in {}", self.storage.bucket))),
            }
        })
    }

    fn public_url(&self, file_name: &str) -> String {
        self.storage.public_url(file_name)
    }
}

fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}{file_name}")
}

/// MIME type sent with an upload, so browsers render emails and images.
fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
