// src/resolve/index.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Settings;
use crate::errors::{MailbuildError, Result};
use crate::fs::FileSystem;
use crate::fs::path_utils::normalize;
use crate::resolve::discover::{self, SourceFile};
use crate::resolve::expand::expand_file;
use crate::resolve::task::Task;
use crate::types::OutputKind;

/// Input path to its tasks, in locale order.
///
/// Keys are exactly the discovered files and every key has at least one
/// task. The index is a value: rebuilding returns a new index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeTaskIndex {
    entries: BTreeMap<PathBuf, Vec<Task>>,
}

impl RuntimeTaskIndex {
    /// Discover every input and expand it.
    pub fn build_full(fs: &dyn FileSystem, settings: &Settings) -> Result<Self> {
        let sources = discover::discover(fs, settings)?;
        let index = Self::from_sources(fs, settings, &sources);
        info!(
            inputs = index.len(),
            tasks = index.task_count(),
            "task index built"
        );
        Ok(index)
    }

    pub fn from_sources(fs: &dyn FileSystem, settings: &Settings, sources: &[SourceFile]) -> Self {
        let entries = sources
            .iter()
            .map(|source| (source.path.clone(), expand_file(fs, settings, source)))
            .collect();
        Self { entries }
    }

    /// Re-expand a single known input, leaving every other entry untouched.
    ///
    /// Never adds or removes keys; an unknown path is an error.
    pub fn rebuild_one(&self, fs: &dyn FileSystem, settings: &Settings, path: &Path) -> Result<Self> {
        let key = normalize(path);
        if !self.entries.contains_key(&key) {
            return Err(MailbuildError::UnknownPath(key));
        }

        let tasks = expand_file(fs, settings, &SourceFile::new(key.clone()));
        debug!(path = %key.display(), tasks = tasks.len(), "re-expanded input");

        let mut entries = self.entries.clone();
        entries.insert(key, tasks);
        Ok(Self { entries })
    }

    pub fn tasks_for(&self, path: &Path) -> Option<&[Task]> {
        self.entries.get(&normalize(path)).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&normalize(path))
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.entries.values().flatten()
    }

    /// Every `(input, output, locale)` triple, in index order.
    pub fn triples(&self) -> Vec<(PathBuf, PathBuf, String)> {
        self.all_tasks().map(Task::triple).collect()
    }

    /// Output paths of every HTML task, sorted.
    pub fn html_outputs(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = self
            .all_tasks()
            .filter(|t| t.output_kind == OutputKind::Html)
            .map(|t| t.output_path.clone())
            .collect();
        out.sort();
        out
    }
}
