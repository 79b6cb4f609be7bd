// src/resolve/task.rs

use std::path::PathBuf;

use crate::types::{ContextMap, InputKind, OutputKind};

/// One unit of compilation: an input rendered for one locale into one output.
///
/// Tasks are rebuilt from scratch whenever their input is re-expanded and
/// are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub input_kind: InputKind,
    pub output_kind: OutputKind,
    pub locale: String,
    /// Locales this input fans out to, in order. Drives the `t` helper.
    pub locale_set: Vec<String>,
    pub templating_context: ContextMap,
    pub templating_options: ContextMap,
}

impl Task {
    /// Position of `locale` in `locale_set` (0 when absent).
    pub fn locale_index(&self) -> usize {
        self.locale_set
            .iter()
            .position(|l| *l == self.locale)
            .unwrap_or(0)
    }

    pub fn is_template(&self) -> bool {
        self.input_kind == InputKind::Template
    }

    /// `(input, output, locale)`, the identity of a task.
    pub fn triple(&self) -> (PathBuf, PathBuf, String) {
        (
            self.input_path.clone(),
            self.output_path.clone(),
            self.locale.clone(),
        )
    }
}
