// src/render/mod.rs

//! Rendering seams: the templating layer and the markup-to-HTML compiler.

use std::fmt::Debug;
use std::path::PathBuf;

use anyhow::Result;

use crate::resolve::Task;

pub mod markup;
pub mod mjml;
pub mod tera_engine;

pub use markup::PassthroughRenderer;
pub use mjml::MjmlRenderer;
pub use tera_engine::TeraEngine;

/// Templating layer: source text + task context → markup.
pub trait TemplateEngine: Send + Sync + Debug {
    fn render(&self, source: &str, task: &Task) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct MarkupOptions {
    /// Collapse whitespace and drop comments (prod builds).
    pub minify: bool,
    /// Input file, for include resolution and error messages.
    pub source_path: PathBuf,
}

/// Markup-to-HTML compiler.
pub trait MarkupRenderer: Send + Sync + Debug {
    fn render(&self, markup: &str, opts: &MarkupOptions) -> Result<String>;
}
