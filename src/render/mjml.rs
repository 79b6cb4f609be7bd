// src/render/mjml.rs

use anyhow::{Result, anyhow};
use mrml::prelude::render::RenderOptions;

use super::markup::{PassthroughRenderer, minify};
use super::{MarkupOptions, MarkupRenderer};

/// Compiles `.mjml` sources to email HTML with `mrml`; other inputs
/// (plain `.html` templates) go through [`PassthroughRenderer`].
#[derive(Debug, Clone, Default)]
pub struct MjmlRenderer;

impl MarkupRenderer for MjmlRenderer {
    fn render(&self, markup: &str, opts: &MarkupOptions) -> Result<String> {
        let is_mjml = opts
            .source_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mjml"));
        if !is_mjml {
            return PassthroughRenderer.render(markup, opts);
        }

        let parsed = mrml::parse(markup)
            .map_err(|e| anyhow!("parsing MJML {:?}: {e}", opts.source_path))?;
        let html = parsed
            .element
            .render(&RenderOptions::default())
            .map_err(|e| anyhow!("rendering MJML {:?}: {e}", opts.source_path))?;

        Ok(if opts.minify { minify(&html) } else { html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn opts(path: &str, minify: bool) -> MarkupOptions {
        MarkupOptions {
            minify,
            source_path: PathBuf::from(path),
        }
    }

    #[test]
    fn mjml_becomes_html() {
        let src = "<mjml><mj-body><mj-section><mj-column><mj-text>Hola</mj-text></mj-column></mj-section></mj-body></mjml>";
        let html = MjmlRenderer.render(src, &opts("/ws/src/a.mjml", false)).unwrap();

        assert!(html.contains("<html"));
        assert!(html.contains("Hola"));
        assert!(!html.contains("<mj-text"));
    }

    #[test]
    fn html_templates_pass_through() {
        let src = "<p>\n  hi\n</p>";
        assert_eq!(MjmlRenderer.render(src, &opts("a.html", false)).unwrap(), src);
    }

    #[test]
    fn invalid_mjml_is_an_error() {
        assert!(MjmlRenderer.render("<mj-body>", &opts("a.mjml", false)).is_err());
    }
}
