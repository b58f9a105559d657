// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Source file watching.
//!
//! Watches the single DSL source file for content changes and delivers
//! debounced change notifications over a channel. The watch is placed on
//! the parent directory because most editors save by writing a temp file
//! and renaming it over the target, which would silently detach a watch
//! on the file itself. Deletion and rename-away are logged and ignored;
//! the previously loaded program stays live.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use tracing::{info, warn};

/// A debounced "the source file changed" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceChanged;

/// Watcher over one source file.
pub struct SourceWatcher {
    /// Debounce duration: how long to wait after the first event.
    debounce: Duration,
}

impl SourceWatcher {
    /// Create a watcher with the given debounce duration.
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }

    /// Start watching. Returns a channel that yields one notification per
    /// debounced batch of changes to the file.
    pub fn watch(&self, source: PathBuf) -> std::io::Result<Receiver<SourceChanged>> {
        let parent = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let file_name = source
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path")
            })?;

        let (tx, rx) = mpsc::channel();
        let debounce = self.debounce;

        std::thread::spawn(move || {
            let (notify_tx, notify_rx) = mpsc::channel();

            let mut watcher = match notify::recommended_watcher(
                move |res: Result<notify::Event, notify::Error>| {
                    if let Ok(event) = res {
                        let _ = notify_tx.send(event);
                    }
                },
            ) {
                Ok(w) => w,
                Err(e) => {
                    warn!("failed to create file watcher: {e}");
                    return;
                }
            };

            if let Err(e) = watcher.watch(&parent, RecursiveMode::NonRecursive) {
                warn!("failed to watch {}: {e}", parent.display());
                return;
            }

            info!("watching {} for changes", source.display());

            loop {
                let Ok(first_event) = notify_rx.recv() else {
                    break;
                };

                let mut events = vec![first_event];

                // Collect more events within the debounce window.
                let deadline = Instant::now() + debounce;
                while Instant::now() < deadline {
                    match notify_rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                    {
                        Ok(event) => events.push(event),
                        Err(_) => break,
                    }
                }

                let touches_source = events.iter().any(|event| {
                    event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()))
                });
                if !touches_source {
                    continue;
                }

                if !source.exists() {
                    // Deleted or renamed away: the running program keeps
                    // its last good state.
                    warn!(
                        "{} disappeared; keeping the last loaded program",
                        source.display()
                    );
                    continue;
                }

                if tx.send(SourceChanged).is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

impl Default for SourceWatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
