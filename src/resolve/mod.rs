// src/resolve/mod.rs

//! File resolution and locale fanout.
//!
//! Settings + source tree → [`discover`] → per file [`frontmatter`] →
//! [`expand`] → [`RuntimeTaskIndex`]. The watch engine keeps an index alive
//! and re-expands single files through [`RuntimeTaskIndex::rebuild_one`].

pub mod discover;
pub mod expand;
pub mod frontmatter;
pub mod index;
pub mod task;

pub use discover::{InputMatcher, SourceFile, discover};
pub use expand::{expand, expand_file, merge_maps};
pub use frontmatter::FrontMatter;
pub use index::RuntimeTaskIndex;
pub use task::Task;
