// src/engine/mod.rs

//! Watch coordination engine.
//!
//! This module ties together:
//! - the live [`crate::resolve::RuntimeTaskIndex`]
//! - the compile backend ([`crate::compile::TaskCompiler`])
//! - the main runtime event loop that reacts to:
//!   - the watcher becoming ready
//!   - files being added, changed or removed
//!   - dispatches finishing
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;

pub mod core;
pub mod event_handlers;
pub mod locks;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use locks::PathLocks;
pub use runtime::{RunSummary, Runtime};

/// Coordinator lifecycle.
///
/// `Idle → Watching → Dispatching → Watching`, with `Stopped` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Waiting for the watcher's initial scan.
    Idle,
    Watching,
    /// At least one dispatch is in flight.
    Dispatching,
    Stopped,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Skip change events whose file content hash didn't change.
    pub skip_unchanged: bool,
    /// Exit once nothing is in flight (one-shot builds and tests).
    pub exit_when_idle: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            skip_unchanged: true,
            exit_when_idle: false,
        }
    }
}

/// Events flowing into the runtime from the watcher and the shell itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The watcher is set up; compile everything.
    Ready,
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    /// A dispatch spawned by the shell completed.
    DispatchFinished,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}
