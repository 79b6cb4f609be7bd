// src/resolve/expand.rs

//! Task expansion: one source file plus its front matter into per-locale tasks.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::config::Settings;
use crate::fs::FileSystem;
use crate::resolve::discover::SourceFile;
use crate::resolve::frontmatter::{self, FrontMatter};
use crate::resolve::task::Task;
use crate::types::{ContextMap, InputKind, OutputKind};

/// Context key holding the task's locale.
pub const LOCALE_KEY: &str = "locale";
/// Context key holding the task's full locale list.
pub const LOCALE_SET_KEY: &str = "localeSet";

/// Read the file's front matter (templates only) and expand it.
///
/// A read failure is not fatal here: it is logged and the file is expanded
/// with empty front matter, so the compile step reports the real error.
pub fn expand_file(fs: &dyn FileSystem, settings: &Settings, source: &SourceFile) -> Vec<Task> {
    let front_matter = match source.input_kind {
        InputKind::Asset => FrontMatter::default(),
        InputKind::Template => match fs.read_to_string(&source.path) {
            Ok(contents) => frontmatter::extract(&contents).0,
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "cannot read front matter");
                FrontMatter::default()
            }
        },
    };
    expand(source, &front_matter, settings)
}

/// Expand a source file into its tasks, ordered by locale.
pub fn expand(source: &SourceFile, front_matter: &FrontMatter, settings: &Settings) -> Vec<Task> {
    let rel = relative_to_source(settings, &source.path);

    match source.input_kind {
        InputKind::Asset => {
            let ext = source
                .path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string();
            let default_locale = settings.default_locale().to_string();
            vec![Task {
                input_path: source.path.clone(),
                output_path: settings.output_dir.join(&rel),
                input_kind: InputKind::Asset,
                output_kind: OutputKind::Passthrough(ext),
                locale: default_locale.clone(),
                locale_set: vec![default_locale],
                templating_context: ContextMap::new(),
                templating_options: ContextMap::new(),
            }]
        }
        InputKind::Template => {
            let locales = match &front_matter.locales {
                Some(ls) if !ls.is_empty() => ls.clone(),
                _ => settings.locales.clone(),
            };
            let html_rel = rel.with_extension("html");

            locales
                .iter()
                .enumerate()
                .map(|(i, locale)| {
                    let out_rel = localized_output(
                        &html_rel,
                        locale,
                        i == 0 && settings.omit_default_locale_from_filename,
                    );
                    let output_path = settings.output_dir.join(&out_rel);

                    let mut injected = ContextMap::new();
                    injected.insert(LOCALE_KEY.into(), Value::String(locale.clone()));
                    injected.insert(
                        LOCALE_SET_KEY.into(),
                        Value::Array(locales.iter().cloned().map(Value::String).collect()),
                    );
                    if settings.publishes() {
                        if let (Some(storage), Some(name)) = (
                            settings.storage.as_ref(),
                            output_path.file_name().and_then(|n| n.to_str()),
                        ) {
                            injected.insert(
                                settings.view_in_browser_tag.clone(),
                                Value::String(storage.public_url(name)),
                            );
                        }
                    }

                    Task {
                        input_path: source.path.clone(),
                        output_path,
                        input_kind: InputKind::Template,
                        output_kind: OutputKind::Html,
                        locale: locale.clone(),
                        locale_set: locales.clone(),
                        templating_context: merge_maps(&[
                            &settings.global_templating_context,
                            &front_matter.templating_context,
                            &injected,
                        ]),
                        templating_options: merge_maps(&[
                            &settings.global_templating_options,
                            &front_matter.templating_options,
                        ]),
                    }
                })
                .collect()
        }
    }
}

/// Shallow merge: later layers replace top-level keys of earlier ones.
pub fn merge_maps(layers: &[&ContextMap]) -> ContextMap {
    let mut out = ContextMap::new();
    for layer in layers {
        for (k, v) in layer.iter() {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// `a/b.html` for the default locale (when omitted), else `a/b_<locale>.html`.
pub fn localized_output(html_rel: &Path, locale: &str, omit_locale: bool) -> PathBuf {
    if omit_locale {
        return html_rel.to_path_buf();
    }
    let stem = html_rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    html_rel.with_file_name(format!("{stem}_{locale}.html"))
}

/// Path of `input` relative to the source dir.
///
/// Inputs outside the source dir keep their best-effort relative path with
/// the leading `..` components dropped, so outputs stay inside `output_dir`.
fn relative_to_source(settings: &Settings, input: &Path) -> PathBuf {
    let rel = pathdiff::diff_paths(input, &settings.source_dir).unwrap_or_else(|| {
        input
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default()
    });

    if !rel.starts_with("..") {
        return rel;
    }

    warn!(
        input = %input.display(),
        source_dir = %settings.source_dir.display(),
        "input is outside the source directory"
    );
    rel.components()
        .skip_while(|c| matches!(c, Component::ParentDir))
        .collect()
}
