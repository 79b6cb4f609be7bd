// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated coordinator state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - rebuilding the index and compiling tasks
//! - handling Ctrl+C / shutdown
//!
//! The core can be unit tested without any Tokio, channels, filesystem, or
//! compiler.

use crate::engine::event_handlers::{
    CoreState, CoreStep, handle_added, handle_changed, handle_dispatch_finished, handle_ready,
    handle_removed,
};
use crate::engine::{CoordinatorState, RuntimeEvent, RuntimeOptions};
use crate::resolve::RuntimeTaskIndex;

#[derive(Debug)]
pub struct CoreRuntime {
    core: CoreState,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            core: CoreState {
                state: CoordinatorState::Idle,
                in_flight: 0,
            },
            options,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.core.state
    }

    /// Number of dispatches not yet reported finished.
    pub fn in_flight(&self) -> usize {
        self.core.in_flight
    }

    /// Handle a single runtime event against the current index, updating
    /// core state and returning the resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, index: &RuntimeTaskIndex) -> CoreStep {
        if self.core.state == CoordinatorState::Stopped {
            return CoreStep::stop();
        }

        match event {
            RuntimeEvent::Ready => handle_ready(&mut self.core),
            RuntimeEvent::Added(path) => handle_added(&mut self.core, index, path),
            RuntimeEvent::Changed(path) => handle_changed(&mut self.core, index, path),
            RuntimeEvent::Removed(path) => handle_removed(&self.core, path),
            RuntimeEvent::DispatchFinished => {
                handle_dispatch_finished(&mut self.core, &self.options)
            }
            RuntimeEvent::ShutdownRequested => {
                self.core.state = CoordinatorState::Stopped;
                CoreStep::stop()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CoreCommand;
    use std::path::PathBuf;

    fn watching(options: RuntimeOptions) -> CoreRuntime {
        let mut core = CoreRuntime::new(options);
        let step = core.step(RuntimeEvent::Ready, &RuntimeTaskIndex::default());
        assert_eq!(step.commands, vec![CoreCommand::CompileAll]);
        core.step(RuntimeEvent::DispatchFinished, &RuntimeTaskIndex::default());
        assert_eq!(core.state(), CoordinatorState::Watching);
        core
    }

    #[test]
    fn file_events_before_ready_are_ignored() {
        let mut core = CoreRuntime::new(RuntimeOptions::default());
        let index = RuntimeTaskIndex::default();

        let step = core.step(RuntimeEvent::Changed(PathBuf::from("/ws/src/a.mjml")), &index);
        assert!(step.commands.is_empty());
        assert_eq!(core.state(), CoordinatorState::Idle);
    }

    #[test]
    fn unknown_paths_trigger_full_rebuild() {
        let mut core = watching(RuntimeOptions::default());
        let index = RuntimeTaskIndex::default();
        let path = PathBuf::from("/ws/src/new.mjml");

        let step = core.step(RuntimeEvent::Added(path.clone()), &index);
        assert_eq!(
            step.commands,
            vec![CoreCommand::RebuildAll { focus: path.clone() }]
        );
        assert_eq!(core.state(), CoordinatorState::Dispatching);

        let step = core.step(RuntimeEvent::Changed(path.clone()), &index);
        assert_eq!(step.commands, vec![CoreCommand::RebuildAll { focus: path }]);
        assert_eq!(core.in_flight(), 2);

        core.step(RuntimeEvent::DispatchFinished, &index);
        assert_eq!(core.state(), CoordinatorState::Dispatching);
        core.step(RuntimeEvent::DispatchFinished, &index);
        assert_eq!(core.state(), CoordinatorState::Watching);
    }

    #[test]
    fn removals_only_log() {
        let mut core = watching(RuntimeOptions::default());
        let step = core.step(
            RuntimeEvent::Removed(PathBuf::from("/ws/src/a.mjml")),
            &RuntimeTaskIndex::default(),
        );
        assert_eq!(step, CoreStep::nothing());
        assert_eq!(core.state(), CoordinatorState::Watching);
    }

    #[test]
    fn exit_when_idle_after_last_dispatch() {
        let mut core = CoreRuntime::new(RuntimeOptions {
            skip_unchanged: false,
            exit_when_idle: true,
        });
        let index = RuntimeTaskIndex::default();

        core.step(RuntimeEvent::Ready, &index);
        let step = core.step(RuntimeEvent::DispatchFinished, &index);
        assert!(!step.keep_running);
        assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut core = watching(RuntimeOptions::default());
        let index = RuntimeTaskIndex::default();

        assert!(!core.step(RuntimeEvent::ShutdownRequested, &index).keep_running);
        assert_eq!(core.state(), CoordinatorState::Stopped);

        let step = core.step(RuntimeEvent::Ready, &index);
        assert!(!step.keep_running);
        assert!(step.commands.is_empty());
    }
}
