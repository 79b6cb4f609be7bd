// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::engine::{CoordinatorState, RuntimeOptions};
use crate::resolve::RuntimeTaskIndex;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Compile every task in the index.
    CompileAll,
    /// Re-expand one known input, then compile its tasks.
    RebuildOne(PathBuf),
    /// Rebuild the whole index, then compile the tasks of `focus`.
    RebuildAll { focus: PathBuf },
    /// Request that the process exits (one-shot mode when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn nothing() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    pub fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }

    fn dispatch(command: CoreCommand) -> Self {
        Self {
            commands: vec![command],
            keep_running: true,
        }
    }
}

/// Mutable core state shared by the handlers.
#[derive(Debug)]
pub struct CoreState {
    pub state: CoordinatorState,
    pub in_flight: usize,
}

impl CoreState {
    fn start_dispatch(&mut self, command: CoreCommand) -> CoreStep {
        self.in_flight += 1;
        self.state = CoordinatorState::Dispatching;
        CoreStep::dispatch(command)
    }
}

pub fn handle_ready(core: &mut CoreState) -> CoreStep {
    if core.state != CoordinatorState::Idle {
        debug!("duplicate ready event ignored");
        return CoreStep::nothing();
    }
    info!("watcher ready, compiling everything");
    core.start_dispatch(CoreCommand::CompileAll)
}

/// A new file: rebuild the whole index so discovery rules apply, then
/// compile it. An already indexed path is treated as a change.
pub fn handle_added(core: &mut CoreState, index: &RuntimeTaskIndex, path: PathBuf) -> CoreStep {
    if core.state == CoordinatorState::Idle {
        debug!(path = %path.display(), "event before ready ignored");
        return CoreStep::nothing();
    }
    if index.contains(&path) {
        return core.start_dispatch(CoreCommand::RebuildOne(path));
    }
    info!(path = %path.display(), "input added");
    core.start_dispatch(CoreCommand::RebuildAll { focus: path })
}

pub fn handle_changed(core: &mut CoreState, index: &RuntimeTaskIndex, path: PathBuf) -> CoreStep {
    if core.state == CoordinatorState::Idle {
        debug!(path = %path.display(), "event before ready ignored");
        return CoreStep::nothing();
    }
    if index.contains(&path) {
        debug!(path = %path.display(), "input changed");
        core.start_dispatch(CoreCommand::RebuildOne(path))
    } else {
        // Missed its creation event (e.g. atomic save via rename).
        debug!(path = %path.display(), "change on unknown input, rebuilding index");
        core.start_dispatch(CoreCommand::RebuildAll { focus: path })
    }
}

/// Removals are reported only; outputs stay where they are.
pub fn handle_removed(core: &CoreState, path: PathBuf) -> CoreStep {
    if core.state != CoordinatorState::Idle {
        info!(path = %path.display(), "input removed; its outputs are left in place");
    }
    CoreStep::nothing()
}

pub fn handle_dispatch_finished(core: &mut CoreState, options: &RuntimeOptions) -> CoreStep {
    core.in_flight = core.in_flight.saturating_sub(1);
    if core.in_flight > 0 {
        return CoreStep::nothing();
    }
    core.state = CoordinatorState::Watching;

    if options.exit_when_idle {
        return CoreStep {
            commands: vec![CoreCommand::RequestExit],
            keep_running: false,
        };
    }
    CoreStep::nothing()
}
