// src/compile/assets.rs

//! Image handling for templated markup: find local `<mj-image src>` values,
//! upload them and point the markup at the public URLs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::fs::path_utils::normalize;
use crate::storage::ObjectStore;

static MJ_IMAGE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<mj-image\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid mj-image regex")
});

/// `src` values of every `<mj-image>` that points at a local file, in
/// document order without duplicates.
pub fn local_image_sources(markup: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in MJ_IMAGE_SRC.captures_iter(markup) {
        let Some(src) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };
        if is_local(src) && !out.iter().any(|s| s == src) {
            out.push(src.to_string());
        }
    }
    out
}

fn is_local(src: &str) -> bool {
    let src = src.trim();
    !(src.is_empty()
        || src.starts_with("http:")
        || src.starts_with("https:")
        || src.starts_with("//")
        || src.starts_with("data:")
        || src.starts_with("cid:")
        || src.contains("{{"))
}

/// Local image paths resolve against the directory of the input file.
pub fn resolve_image(input: &Path, src: &str) -> PathBuf {
    let dir = input.parent().unwrap_or(Path::new("/"));
    normalize(&dir.join(src.trim()))
}

/// Upload every local image and rewrite its `src`.
///
/// An image that already exists in the store is reused unless `force` is
/// set; a failed existence check counts as "missing". Missing local files
/// and failed uploads are logged and leave the `src` untouched.
pub async fn upload_and_rewrite(
    fs: &dyn FileSystem,
    store: &dyn ObjectStore,
    force: bool,
    input: &Path,
    markup: String,
) -> String {
    let mut markup = markup;

    for src in local_image_sources(&markup) {
        let local = resolve_image(input, &src);
        if !fs.is_file(&local) {
            warn!(input = %input.display(), image = %local.display(), "image not found");
            continue;
        }
        let Some(name) = local.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let already_there = if force {
            false
        } else {
            store.exists(name).await.unwrap_or_else(|e| {
                debug!(image = name, error = %e, "existence check failed, uploading");
                false
            })
        };

        let url = if already_there {
            debug!(image = name, "image already uploaded, reusing");
            store.public_url(name)
        } else {
            match store.upload(&local).await {
                Ok(url) => url,
                Err(e) => {
                    warn!(input = %input.display(), image = %local.display(), error = %e, "image upload failed");
                    continue;
                }
            }
        };

        markup = markup
            .replace(&format!("\"{src}\""), &format!("\"{url}\""))
            .replace(&format!("'{src}'"), &format!("'{url}'"));
    }

    markup
}

/// Without uploads, only report local images that don't exist.
pub fn warn_missing_images(fs: &dyn FileSystem, input: &Path, markup: &str) {
    for src in local_image_sources(markup) {
        let local = resolve_image(input, &src);
        if !fs.is_file(&local) {
            warn!(input = %input.display(), image = %local.display(), "image not found");
        }
    }
}
