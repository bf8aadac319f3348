//! Watched-folder service.
//!
//! Watches the configured drop folder for new job files and pushes them
//! into the control plane through the file-store and device-facade seams.
//! The watcher runs on its own background thread owned by notify; its
//! lifecycle is tied 1:1 to the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::managers::{AnalysisQueue, DeviceFacade, FileStore};

/// File extensions treated as job files.
const JOB_EXTENSIONS: [&str; 3] = ["gcode", "gco", "g"];

/// Background watcher over the job drop folder.
pub struct JobWatcher {
    // Held for its Drop impl: dropping stops and joins the watch thread.
    _watcher: RecommendedWatcher,
    folder: PathBuf,
}

impl JobWatcher {
    /// Start watching `folder`. Detected job files are imported into the
    /// file store, queued for analysis and announced to the device facade.
    pub fn start(
        folder: &Path,
        files: Arc<dyn FileStore>,
        analysis: Arc<dyn AnalysisQueue>,
        device: Arc<dyn DeviceFacade>,
    ) -> Result<Self, notify::Error> {
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if !(event.kind.is_create() || event.kind.is_modify()) {
                        return;
                    }
                    for path in &event.paths {
                        if !is_job_file(path) {
                            continue;
                        }
                        match files.add_watched_file(path) {
                            Ok(stored) => {
                                analysis.enqueue(&stored);
                                device.job_file_detected(&stored);
                            }
                            Err(e) => {
                                tracing::error!(path = ?path, error = %e, "Failed to import watched file");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(folder, RecursiveMode::NonRecursive)?;
        tracing::info!(folder = ?folder, "Job watcher started");

        Ok(Self {
            _watcher: watcher,
            folder: folder.to_path_buf(),
        })
    }

    /// Stop the watcher and join its thread.
    pub fn stop(self) {
        tracing::info!(folder = ?self.folder, "Job watcher stopped");
        // Dropping the inner watcher shuts its thread down.
    }
}

fn is_job_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| JOB_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
