// src/render/markup.rs

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use super::{MarkupOptions, MarkupRenderer};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid whitespace regex"));

/// Renderer for inputs that are already HTML.
///
/// Emits the templated markup unchanged, or with comments and inter-tag
/// whitespace removed when minifying.
#[derive(Debug, Clone, Default)]
pub struct PassthroughRenderer;

impl MarkupRenderer for PassthroughRenderer {
    fn render(&self, markup: &str, opts: &MarkupOptions) -> Result<String> {
        if !opts.minify {
            return Ok(markup.to_string());
        }
        Ok(minify(markup))
    }
}

pub fn minify(markup: &str) -> String {
    let without_comments = COMMENT.replace_all(markup, "");
    BETWEEN_TAGS
        .replace_all(&without_comments, "><")
        .trim()
        .to_string()
}
