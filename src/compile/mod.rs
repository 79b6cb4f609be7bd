// src/compile/mod.rs

//! Pluggable compile backend.
//!
//! The watch runtime talks to a [`TaskCompiler`] instead of the concrete
//! pipeline, so tests can swap in a recording fake while production uses
//! [`Compiler`].

use std::path::PathBuf;

use crate::resolve::{RuntimeTaskIndex, Task};

pub mod assets;
pub mod pipeline;

pub use crate::storage::BoxFuture;
pub use pipeline::Compiler;

/// Trait abstracting how tasks are compiled.
pub trait TaskCompiler: Send + Sync + 'static {
    /// Compile the given tasks. Failures are reported per task and never
    /// abort the remaining ones.
    fn compile<'a>(&'a self, tasks: Vec<Task>) -> BoxFuture<'a, CompileReport>;

    /// Called after the index was (re)built, before its tasks are compiled.
    fn index_updated<'a>(&'a self, _index: &'a RuntimeTaskIndex) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Compiled,
    Copied,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub locale: String,
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self.status, TaskStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl CompileReport {
    pub fn merge(&mut self, other: CompileReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// Outputs written by template tasks, sorted.
    pub fn compiled_outputs(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = self
            .outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Compiled)
            .map(|o| o.output_path.clone())
            .collect();
        out.sort();
        out
    }
}
