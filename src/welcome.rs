// src/welcome.rs

//! Start page for the live-reload preview, listing every HTML output.

use anyhow::{Context as _, Result};
use tera::{Context, Tera};
use tracing::debug;

use crate::config::Settings;
use crate::config::settings::WELCOME_PAGE;
use crate::fs::FileSystem;
use crate::fs::path_utils::relative_str;
use crate::resolve::RuntimeTaskIndex;

const WELCOME_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>mailbuild</title>
  </head>
  <body style="font-family: sans-serif">
    <p>This is your auto-generated welcome page from mailbuild.</p>
    <p>Locales: {{ locales | join(sep=", ") }}</p>
    <ul>
{%- for file in files %}
      <li><a href="{{ file }}">{{ file }}</a></li>
{%- endfor %}
    </ul>
  </body>
</html>
"#;

/// HTML outputs relative to the output dir, with forward slashes.
pub fn listed_files(settings: &Settings, index: &RuntimeTaskIndex) -> Vec<String> {
    index
        .html_outputs()
        .iter()
        .filter_map(|p| relative_str(&settings.output_dir, p))
        .collect()
}

pub fn render_welcome_page(settings: &Settings, index: &RuntimeTaskIndex) -> Result<String> {
    let mut context = Context::new();
    context.insert("files", &listed_files(settings, index));
    context.insert("locales", &settings.locales);

    Tera::one_off(WELCOME_TEMPLATE, &context, true).context("rendering welcome page")
}

/// Render the page in memory and write it to `<output_dir>/__.html`.
pub fn write_welcome_page(
    fs: &dyn FileSystem,
    settings: &Settings,
    index: &RuntimeTaskIndex,
) -> Result<()> {
    let html = render_welcome_page(settings, index)?;
    let target = settings.output_dir.join(WELCOME_PAGE);
    fs.write(&target, html.as_bytes())?;
    debug!(path = %target.display(), "welcome page written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvSnapshot, Overrides, RawSettings, ResolveContext};
    use crate::fs::mock::MockFileSystem;
    use crate::types::BuildEnv;
    use std::path::PathBuf;

    #[test]
    fn file_names_are_escaped() {
        let ctx = ResolveContext {
            workspace: PathBuf::from("/ws"),
            build_env: BuildEnv::Dev,
            settings_file: None,
            env: EnvSnapshot::default(),
        };
        let settings = Settings::resolve(RawSettings::default(), &Overrides::default(), &ctx).unwrap();
        let fs = MockFileSystem::new();
        fs.add_file("/ws/src/a&<b>.mjml", "<mjml/>");
        let index = RuntimeTaskIndex::build_full(&fs, &settings).unwrap();

        let page = render_welcome_page(&settings, &index).unwrap();

        assert!(page.contains("a&amp;&lt;b&gt;.html"));
        assert!(!page.contains("a&<b>.html"));
    }
}
