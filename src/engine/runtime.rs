// src/engine/runtime.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::compile::{CompileReport, TaskCompiler};
use crate::config::Settings;
use crate::errors::{MailbuildError, Result};
use crate::fs::FileSystem;
use crate::resolve::{RuntimeTaskIndex, Task};
use crate::watch::FileCache;

use super::core::CoreRuntime;
use super::locks::PathLocks;
use super::{CoreCommand, RuntimeEvent, RuntimeOptions};

/// What a finished run leaves behind.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub index: RuntimeTaskIndex,
    /// Every task outcome of the run, in completion order.
    pub report: CompileReport,
}

/// State shared between the event loop and its dispatches.
struct Shared<C: TaskCompiler> {
    compiler: Arc<C>,
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    index: RwLock<RuntimeTaskIndex>,
    locks: PathLocks,
    hashes: Mutex<FileCache>,
    options: RuntimeOptions,
}

/// Drives the coordinator core in response to `RuntimeEvent`s and runs the
/// resulting rebuilds and compiles.
///
/// This is a pure IO shell around [`CoreRuntime`], which contains all the
/// coordination semantics. Each dispatch runs as its own Tokio task, so
/// events are handled without waiting for unrelated work; work on the same
/// input is serialized through [`PathLocks`].
pub struct Runtime<C: TaskCompiler> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    shared: Arc<Shared<C>>,
    dispatches: JoinSet<CompileReport>,
}

impl<C: TaskCompiler> fmt::Debug for Runtime<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("in_flight", &self.dispatches.len())
            .finish_non_exhaustive()
    }
}

impl<C: TaskCompiler> Runtime<C> {
    pub fn new(
        compiler: Arc<C>,
        fs: Arc<dyn FileSystem>,
        settings: Arc<Settings>,
        index: RuntimeTaskIndex,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            core: CoreRuntime::new(options),
            event_rx,
            shared: Arc::new(Shared {
                compiler,
                fs,
                settings,
                index: RwLock::new(index),
                locks: PathLocks::new(),
                hashes: Mutex::new(FileCache::new()),
                options,
            }),
            dispatches: JoinSet::new(),
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx` and finished dispatches.
    /// - Feeds them into the core runtime.
    /// - Spawns the work the core asks for.
    ///
    /// On exit, in-flight dispatches are awaited before returning.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("mailbuild runtime started");
        let mut report = CompileReport::default();

        loop {
            let event = tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
                Some(joined) = self.dispatches.join_next(), if !self.dispatches.is_empty() => {
                    match joined {
                        Ok(r) => report.merge(r),
                        Err(e) => error!(error = %e, "dispatch task failed"),
                    }
                    RuntimeEvent::DispatchFinished
                }
            };

            debug!(?event, "runtime received event");

            let step = {
                let index = self.shared.index.read().await;
                self.core.step(event, &index)
            };

            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        while let Some(joined) = self.dispatches.join_next().await {
            match joined {
                Ok(r) => report.merge(r),
                Err(e) => error!(error = %e, "dispatch task failed"),
            }
        }

        let index = self.shared.index.read().await.clone();
        info!("runtime exiting");
        Ok(RunSummary { index, report })
    }

    fn execute_command(&mut self, command: CoreCommand) {
        let shared = Arc::clone(&self.shared);
        match command {
            CoreCommand::CompileAll => {
                self.dispatches.spawn(shared.compile_all());
            }
            CoreCommand::RebuildOne(path) => {
                self.dispatches.spawn(shared.rebuild_one_and_compile(path));
            }
            CoreCommand::RebuildAll { focus } => {
                self.dispatches.spawn(shared.rebuild_all_and_compile(focus));
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
    }
}

impl<C: TaskCompiler> Shared<C> {
    fn hashes(&self) -> MutexGuard<'_, FileCache> {
        self.hashes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn compile_all(self: Arc<Self>) -> CompileReport {
        let index = self.index.read().await.clone();
        self.compiler.index_updated(&index).await;

        let mut per_input = JoinSet::new();
        for path in index.paths() {
            let tasks = index.tasks_for(path).map(<[Task]>::to_vec).unwrap_or_default();
            let shared = Arc::clone(&self);
            let path = path.clone();
            per_input.spawn(async move { shared.compile_path(&path, tasks).await });
        }

        let mut report = CompileReport::default();
        while let Some(joined) = per_input.join_next().await {
            match joined {
                Ok(r) => report.merge(r),
                Err(e) => error!(error = %e, "compile task failed"),
            }
        }

        info!(
            tasks = report.outcomes.len(),
            failed = report.failure_count(),
            "full compile finished"
        );
        report
    }

    /// Compile one input's tasks while holding its path lock.
    async fn compile_path(&self, path: &Path, tasks: Vec<Task>) -> CompileReport {
        let _guard = self.locks.lock(path).await;
        if self.options.skip_unchanged {
            if let Err(e) = self.hashes().record(self.fs.as_ref(), path) {
                debug!(path = %path.display(), error = %e, "cannot hash input");
            }
        }
        self.compiler.compile(tasks).await
    }

    async fn rebuild_one_and_compile(self: Arc<Self>, path: PathBuf) -> CompileReport {
        let _guard = self.locks.lock(&path).await;

        if self.options.skip_unchanged {
            let changed = self.hashes().has_changed(self.fs.as_ref(), &path);
            match changed {
                Ok(false) => {
                    debug!(path = %path.display(), "content unchanged, skipping");
                    return CompileReport::default();
                }
                Ok(true) => {}
                Err(e) => {
                    self.hashes().invalidate(&path);
                    debug!(path = %path.display(), error = %e, "cannot hash input");
                }
            }
        }

        let (tasks, snapshot) = {
            let mut index = self.index.write().await;
            match index.rebuild_one(self.fs.as_ref(), &self.settings, &path) {
                Ok(rebuilt) => *index = rebuilt,
                Err(MailbuildError::UnknownPath(_)) => {
                    debug!(path = %path.display(), "input left the index, skipping");
                    return CompileReport::default();
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot re-expand input");
                    return CompileReport::default();
                }
            }
            let tasks = index.tasks_for(&path).map(<[Task]>::to_vec).unwrap_or_default();
            (tasks, index.clone())
        };

        self.compiler.index_updated(&snapshot).await;
        self.compiler.compile(tasks).await
    }

    async fn rebuild_all_and_compile(self: Arc<Self>, focus: PathBuf) -> CompileReport {
        // Held across discovery: a single-file rebuild lands wholly before or after.
        let rebuilt = {
            let mut index = self.index.write().await;
            match RuntimeTaskIndex::build_full(self.fs.as_ref(), &self.settings) {
                Ok(rebuilt) => *index = rebuilt,
                Err(e) => {
                    error!(error = %e, "cannot rebuild task index");
                    return CompileReport::default();
                }
            }
            index.clone()
        };
        self.compiler.index_updated(&rebuilt).await;

        match rebuilt.tasks_for(&focus) {
            Some(tasks) => self.compile_path(&focus, tasks.to_vec()).await,
            None => {
                debug!(path = %focus.display(), "not an input after rebuild");
                CompileReport::default()
            }
        }
    }
}
