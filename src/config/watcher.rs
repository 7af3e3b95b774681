//! Mapping file watcher for hot-reload support
//!
//! notify runs its callback on its own thread. The watcher only reads the file
//! there and hands the text over a channel; the owner feeds it to the joystick
//! manager from the thread that drives the frame loop.

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, TryRecvError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Changed mapping file and its new contents
#[derive(Debug, Clone, PartialEq)]
pub struct MappingUpdate {
    pub path: PathBuf,
    pub text: String,
}

/// Watches mapping files and queues their contents when they change
pub struct MappingWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<MappingUpdate>,
}

impl MappingWatcher {
    /// Create a watcher for the given files
    ///
    /// Files that do not exist yet are skipped.
    pub fn new(files: &[PathBuf]) -> Result<Self> {
        let (tx, rx) = channel::unbounded();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    // Only reload on modify events
                    if !matches!(event.kind, EventKind::Modify(_)) {
                        return;
                    }
                    debug!("Mapping file modified: {:?}", event.paths);

                    // Debounce: wait a bit for file writes to complete
                    std::thread::sleep(Duration::from_millis(100));

                    for path in event.paths {
                        match fs::read_to_string(&path) {
                            Ok(text) => {
                                if tx.send(MappingUpdate { path, text }).is_err() {
                                    debug!("Mapping watcher receiver dropped");
                                }
                            }
                            Err(e) => warn!("Failed to re-read {}: {}", path.display(), e),
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        for file in files {
            if !file.exists() {
                debug!("Not watching missing mapping file {}", file.display());
                continue;
            }
            watcher
                .watch(Path::new(file), RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch mapping file: {}", file.display()))?;
            info!("Watching mapping file: {}", file.display());
        }

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next queued update, if any
    pub fn try_recv(&self) -> Option<MappingUpdate> {
        match self.rx.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next update
    pub fn recv_timeout(&self, timeout: Duration) -> Option<MappingUpdate> {
        self.rx.recv_timeout(timeout).ok()
    }
}
