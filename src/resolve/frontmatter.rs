// src/resolve/frontmatter.rs

//! Per-file metadata block at the top of a template.
//!
//! ```text
//! ---
//! locales: [en, fr]
//! handlebars:
//!   context:
//!     title: Welcome
//! ---
//! <mjml>...</mjml>
//! ```
//!
//! `templating:` is accepted as an alias of `handlebars:`.

use serde::Deserialize;
use tracing::warn;

use crate::config::model::TemplatingSection;
use crate::config::validate::locale_problem;
use crate::types::ContextMap;

/// Parsed front matter. Absent keys are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Locales for this file only; `None` defers to the settings.
    pub locales: Option<Vec<String>>,
    pub templating_context: ContextMap,
    pub templating_options: ContextMap,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        self.locales.is_none()
            && self.templating_context.is_empty()
            && self.templating_options.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontMatter {
    locales: Option<Vec<String>>,
    #[serde(alias = "handlebars")]
    templating: TemplatingSection,
}

/// Split `contents` into front matter and body.
///
/// Never fails: a missing, unterminated or unparseable block yields empty
/// front matter and the whole input as body.
pub fn extract(contents: &str) -> (FrontMatter, &str) {
    let Some((yaml, body)) = split_block(contents) else {
        return (FrontMatter::default(), contents);
    };

    match parse_block(yaml) {
        Ok(front_matter) => (front_matter, body),
        Err(e) => {
            warn!(error = %e, "ignoring unparseable front matter");
            (FrontMatter::default(), contents)
        }
    }
}

/// Strip the front matter block, if any, without parsing it.
pub fn body(contents: &str) -> &str {
    extract(contents).1
}

fn split_block(contents: &str) -> Option<(&str, &str)> {
    let text = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != "---" {
        return None;
    }
    let rest = &text[first_end + 1..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_block(yaml: &str) -> Result<FrontMatter, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let raw: RawFrontMatter = serde_yaml::from_str(yaml)?;
    let locales = raw.locales.map(clean_locales).filter(|ls| !ls.is_empty());

    Ok(FrontMatter {
        locales,
        templating_context: raw.templating.context,
        templating_options: raw.templating.options,
    })
}

/// Trimmed, usable, first occurrence only. Dropped entries are logged.
fn clean_locales(locales: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(locales.len());
    for locale in locales {
        let locale = locale.trim().to_string();
        if locale.is_empty() {
            continue;
        }
        if let Some(problem) = locale_problem(&locale) {
            warn!(%locale, problem, "ignoring front matter locale");
            continue;
        }
        if out.contains(&locale) {
            warn!(%locale, "ignoring duplicate front matter locale");
            continue;
        }
        out.push(locale);
    }
    out
}
