#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mailbuild::config::Settings;
use mailbuild::fs::FileSystem;
use mailbuild::fs::mock::MockFileSystem;

pub use mailbuild_test_utils::builders::SettingsBuilder;
pub use mailbuild_test_utils::init_tracing;

pub fn src(rel: &str) -> PathBuf {
    Path::new("/ws/src").join(rel)
}

pub fn dist(rel: &str) -> PathBuf {
    Path::new("/ws/dist").join(rel)
}

/// A mock workspace with the source and output dirs in place.
pub fn workspace(files: &[(&str, &str)]) -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    fs.add_dir("/ws/src");
    fs.add_dir("/ws/dist");
    for (rel, content) in files {
        fs.add_file(src(rel), *content);
    }
    Arc::new(fs)
}

pub fn read(fs: &dyn FileSystem, path: &Path) -> String {
    fs.read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {:?}: {e:#}", path))
}

pub fn settings(builder: SettingsBuilder) -> Arc<Settings> {
    Arc::new(builder.build())
}
