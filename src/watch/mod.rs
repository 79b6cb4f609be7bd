// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) over the
//!   input roots and turning its events into [`crate::engine::RuntimeEvent`]s.
//! - Content hashing so unchanged saves don't trigger recompiles.
//!
//! It does **not** know about tasks or locales; it only reports which
//! input paths changed.

pub mod cache;
pub mod hash;
pub mod watcher;

pub use cache::FileCache;
pub use hash::{compute_content_hash, compute_file_hash};
pub use watcher::{WatcherHandle, spawn_watcher, translate_event};
