// src/resolve/discover.rs

//! Input discovery: expand the configured selectors into source files.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, trace, warn};

use crate::config::Settings;
use crate::config::loader::SETTINGS_STEM;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::fs::path_utils::{literal_prefix, normalize, to_slash};
use crate::types::InputKind;

/// File names that are never inputs: the welcome page template and its output.
pub const RESERVED_NAMES: [&str; 2] = ["__.mjml", "__.html"];

/// Extensions rendered as templates; everything else is copied.
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["mjml", "html"];

/// A discovered input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    pub path: PathBuf,
    pub input_kind: InputKind,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        let input_kind = classify(&path);
        Self { path, input_kind }
    }
}

/// Classify a path by extension (case-insensitive).
pub fn classify(path: &Path) -> InputKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext)
            if TEMPLATE_EXTENSIONS
                .iter()
                .any(|t| t.eq_ignore_ascii_case(ext)) =>
        {
            InputKind::Template
        }
        _ => InputKind::Asset,
    }
}

/// Compiled include/exclude rules for one settings value.
///
/// Shared by the one-shot discovery walk and the watcher, which uses
/// [`InputMatcher::matches`] to decide whether an event concerns an input.
#[derive(Clone)]
pub struct InputMatcher {
    source_dir: PathBuf,
    output_dir: PathBuf,
    /// `None` means "everything under `source_dir`".
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    roots: Vec<PathBuf>,
}

impl fmt::Debug for InputMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputMatcher")
            .field("source_dir", &self.source_dir)
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl InputMatcher {
    pub fn from_settings(fs: &dyn FileSystem, settings: &Settings) -> Result<Self> {
        let (include_set, roots) = match &settings.input_selectors {
            None => (None, vec![settings.source_dir.clone()]),
            Some(selectors) => {
                let patterns: Vec<String> = selectors
                    .iter()
                    .map(|sel| {
                        // A plain directory selects everything below it.
                        if !has_glob_meta(sel) && fs.is_dir(Path::new(sel)) {
                            format!("{}/**", sel.trim_end_matches('/'))
                        } else {
                            sel.clone()
                        }
                    })
                    .collect();
                let roots = patterns.iter().map(|p| literal_prefix(p)).collect();
                (Some(build_globset(&patterns)?), roots)
            }
        };

        let exclude_set = if settings.ignore_patterns.is_empty() {
            None
        } else {
            Some(build_globset(&settings.ignore_patterns)?)
        };

        Ok(Self {
            source_dir: settings.source_dir.clone(),
            output_dir: settings.output_dir.clone(),
            include_set,
            exclude_set,
            roots,
        })
    }

    /// Directories (or single files) the walk starts from.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether an absolute file path is an input.
    pub fn matches(&self, path: &Path) -> bool {
        let path = normalize(path);

        if path.starts_with(&self.output_dir) {
            return false;
        }
        if is_excluded_name(&path) {
            return false;
        }

        let path_str = to_slash(&path);
        let included = match &self.include_set {
            Some(set) => set.is_match(&path_str),
            None => path.starts_with(&self.source_dir),
        };
        if !included {
            return false;
        }

        match &self.exclude_set {
            Some(set) => !set.is_match(&path_str),
            None => true,
        }
    }
}

/// Discover every input file for `settings`, sorted and deduplicated.
pub fn discover(fs: &dyn FileSystem, settings: &Settings) -> Result<Vec<SourceFile>> {
    let matcher = InputMatcher::from_settings(fs, settings)?;
    discover_with(fs, &matcher)
}

pub fn discover_with(fs: &dyn FileSystem, matcher: &InputMatcher) -> Result<Vec<SourceFile>> {
    let mut found = BTreeSet::new();
    // Canonical dirs already listed; symlinked dirs can form cycles.
    let mut visited: HashSet<PathBuf> = HashSet::new();

    for root in matcher.roots() {
        if fs.is_file(root) {
            if matcher.matches(root) {
                found.insert(normalize(root));
            }
            continue;
        }
        if !fs.is_dir(root) {
            debug!(root = %root.display(), "selector root does not exist, skipping");
            continue;
        }

        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let canonical = fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            if !visited.insert(canonical) {
                warn!(dir = %dir.display(), "directory already walked, skipping");
                continue;
            }
            let entries = fs
                .read_dir(&dir)
                .with_context(|| format!("listing {:?}", dir))?;
            for path in entries {
                if fs.is_dir(&path) {
                    if !is_hidden(&path) && !path.starts_with(&matcher.output_dir) {
                        stack.push(path);
                    }
                } else if fs.is_file(&path) && matcher.matches(&path) {
                    trace!(path = %path.display(), "discovered input");
                    found.insert(normalize(&path));
                }
            }
        }
    }

    debug!(count = found.len(), "input discovery finished");
    Ok(found.into_iter().map(SourceFile::new).collect())
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_excluded_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name.starts_with('.')
        || RESERVED_NAMES.contains(&name)
        || name.starts_with(&format!("{SETTINGS_STEM}."))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat).literal_separator(true).build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
