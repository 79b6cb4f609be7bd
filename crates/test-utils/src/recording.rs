use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use mailbuild::compile::{BoxFuture, CompileReport, TaskCompiler, TaskOutcome, TaskStatus};
use mailbuild::render::TemplateEngine;
use mailbuild::resolve::{RuntimeTaskIndex, Task};

/// One compile call as seen by [`RecordingCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Start(String),
    End(String),
    IndexUpdated(usize),
}

/// A compiler that:
/// - records when each task starts and ends
/// - optionally sleeps between the two, so overlapping work shows up
/// - reports every task as compiled without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct RecordingCompiler {
    delay: Option<Duration>,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    /// `file_name#locale` of every finished task, in order.
    pub fn finished(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::End(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    fn push(&self, entry: Recorded) {
        self.log.lock().unwrap().push(entry);
    }
}

fn label(task: &Task) -> String {
    let name = task
        .input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}#{}", name, task.locale)
}

impl TaskCompiler for RecordingCompiler {
    fn compile<'a>(&'a self, tasks: Vec<Task>) -> BoxFuture<'a, CompileReport> {
        Box::pin(async move {
            let mut report = CompileReport::default();
            for task in tasks {
                self.push(Recorded::Start(label(&task)));
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.push(Recorded::End(label(&task)));
                report.outcomes.push(TaskOutcome {
                    input_path: task.input_path.clone(),
                    output_path: task.output_path.clone(),
                    locale: task.locale.clone(),
                    status: TaskStatus::Compiled,
                });
            }
            report
        })
    }

    fn index_updated<'a>(&'a self, index: &'a RuntimeTaskIndex) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.push(Recorded::IndexUpdated(index.task_count()));
        })
    }
}

/// A template engine that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEngine;

impl TemplateEngine for FailingEngine {
    fn render(&self, _source: &str, _task: &Task) -> Result<String> {
        Err(anyhow!("template engine exploded"))
    }
}
