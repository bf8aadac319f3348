//! Manager seams for the external collaborators.
//!
//! The composition/routing core talks to the device stack, file storage,
//! analysis queue, slicing and profile subsystems through the narrow traits
//! defined here. The traits are deliberately small: this layer only needs
//! the calls it actually makes. Concrete production implementations live
//! behind these seams; `local.rs` provides the in-process defaults.
//!
//! # Concurrency
//! All trait methods take `&self` and implementations must be `Send + Sync`:
//! manager handles are written once into the [`AppContext`] before the
//! server starts serving and are only read afterwards.
//!
//! [`AppContext`]: crate::context::AppContext

pub mod local;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

/// Facade over the device-communication stack.
pub trait DeviceFacade: Send + Sync {
    /// Ports currently enumerable on this host.
    fn available_ports(&self) -> Vec<String>;

    /// Connect to a device. Best-effort; errors are reported, not fatal.
    fn connect(&self, port: &str, baudrate: Option<u32>, profile: &str) -> Result<(), ManagerError>;

    /// Whether a device connection is currently established.
    fn is_connected(&self) -> bool;

    /// Thread-safe entry point used by the watched-folder service to hand
    /// over a freshly detected job file.
    fn job_file_detected(&self, path: &Path);

    /// Current device state for the push channel.
    fn state_payload(&self) -> serde_json::Value;
}

/// File storage for uploaded and watched job files.
pub trait FileStore: Send + Sync {
    /// Folder uploads are stored in.
    fn upload_folder(&self) -> &Path;

    /// Register a file that appeared in the watched drop folder.
    fn add_watched_file(&self, path: &Path) -> Result<PathBuf, ManagerError>;

    /// Store a spooled upload under its original file name.
    fn store_upload(&self, source: &Path, name: &str) -> Result<PathBuf, ManagerError>;
}

/// Queue performing background analysis of job files.
pub trait AnalysisQueue: Send + Sync {
    fn enqueue(&self, path: &Path);
    fn pending(&self) -> usize;
}

/// Slicing subsystem.
pub trait SlicingService: Send + Sync {
    fn profile_folder(&self) -> &Path;
}

/// Device profile store.
pub trait ProfileStore: Send + Sync {
    /// Identifier of the default profile, used for auto-connect.
    fn default_profile_id(&self) -> String;
}

/// Error type shared by manager operations.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("device error: {0}")]
    Device(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Events published on the process-wide bus.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Startup,
    FileDetected { path: PathBuf },
    DeviceConnected { port: String },
    DeviceStateChanged { payload: serde_json::Value },
    Shutdown,
}

/// Process-wide event bus.
///
/// Thin wrapper over a broadcast channel; senders never block and lagging
/// receivers drop events rather than stalling the publisher.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn publish(&self, event: Event) {
        // No receivers is fine (e.g. before any channel client connected).
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracker for short-lived UI application sessions.
///
/// Concurrent map keyed by session id; the push channel and the app-session
/// API both touch it from request context.
#[derive(Clone, Default)]
pub struct AppSessionTracker {
    inner: Arc<dashmap::DashMap<String, AppSession>>,
}

/// One tracked UI session.
#[derive(Debug, Clone, Serialize)]
pub struct AppSession {
    pub key: String,
    pub verified: bool,
}

impl AppSessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> String {
        let key = uuid::Uuid::new_v4().simple().to_string();
        self.inner.insert(
            key.clone(),
            AppSession {
                key: key.clone(),
                verified: false,
            },
        );
        key
    }

    pub fn verify(&self, key: &str) -> bool {
        match self.inner.get_mut(key) {
            Some(mut session) => {
                session.verified = true;
                true
            }
            None => false,
        }
    }

    pub fn is_verified(&self, key: &str) -> bool {
        self.inner.get(key).map(|s| s.verified).unwrap_or(false)
    }

    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_sessions_verify_lifecycle() {
        let tracker = AppSessionTracker::new();
        let key = tracker.create();
        assert!(!tracker.is_verified(&key));
        assert!(tracker.verify(&key));
        assert!(tracker.is_verified(&key));
        tracker.remove(&key);
        assert!(!tracker.verify(&key));
    }

    #[test]
    fn event_bus_delivers_to_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(Event::Startup);
        match rx.try_recv() {
            Ok(Event::Startup) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }
}
