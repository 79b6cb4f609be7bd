// src/watch/watcher.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::engine::RuntimeEvent;
use crate::resolve::InputMatcher;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping it stops
/// file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Map a notify event to runtime events, keeping only input paths.
///
/// Renames are reported per path: a path that still exists was added,
/// one that is gone was removed.
pub fn translate_event(event: &Event, matcher: &InputMatcher) -> Vec<RuntimeEvent> {
    event
        .paths
        .iter()
        .filter(|path| matcher.matches(path))
        .filter_map(|path| {
            let path = path.clone();
            match event.kind {
                EventKind::Create(_) => Some(RuntimeEvent::Added(path)),
                EventKind::Modify(ModifyKind::Name(_)) => {
                    if path.exists() {
                        Some(RuntimeEvent::Added(path))
                    } else {
                        Some(RuntimeEvent::Removed(path))
                    }
                }
                EventKind::Modify(ModifyKind::Metadata(_)) => None,
                EventKind::Modify(_) => Some(RuntimeEvent::Changed(path)),
                EventKind::Remove(_) => Some(RuntimeEvent::Removed(path)),
                _ => None,
            }
        })
        .collect()
}

/// Directories to watch for `matcher`, with their recursion mode.
fn watch_targets(matcher: &InputMatcher) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut targets = BTreeMap::new();
    for root in matcher.roots() {
        if root.is_dir() {
            targets.insert(root.clone(), RecursiveMode::Recursive);
        } else if let Some(parent) = root.parent().filter(|p| p.is_dir()) {
            targets
                .entry(parent.to_path_buf())
                .or_insert(RecursiveMode::NonRecursive);
        } else {
            warn!(root = %root.display(), "nothing to watch for selector");
        }
    }
    targets
}

/// Spawn a filesystem watcher over the input roots of `matcher`.
///
/// Matching changes are forwarded to `runtime_tx` as `Added` / `Changed` /
/// `Removed`; once watching is set up a single `Ready` is sent.
pub fn spawn_watcher(
    matcher: InputMatcher,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("mailbuild: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("mailbuild: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    for (dir, mode) in watch_targets(&matcher) {
        watcher
            .watch(&dir, mode)
            .with_context(|| format!("watching {:?}", dir))?;
        info!(dir = %dir.display(), "watching for changes");
    }

    tokio::spawn(async move {
        if runtime_tx.send(RuntimeEvent::Ready).await.is_err() {
            return;
        }

        while let Some(event) = event_rx.recv().await {
            trace!(?event, "received notify event");
            for runtime_event in translate_event(&event, &matcher) {
                debug!(?runtime_event, "forwarding file event");
                if runtime_tx.send(runtime_event).await.is_err() {
                    debug!("runtime gone, watcher loop exiting");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
