//! In-process default implementations of the manager seams.
//!
//! These back a fully working single-host deployment. Deployments with a
//! real device stack swap in their own [`DeviceFacade`] implementation; the
//! rest of the server does not care.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::managers::{
    AnalysisQueue, DeviceFacade, Event, EventBus, FileStore, ManagerError, ProfileStore,
    SlicingService,
};

/// Serial device facade backed by host port enumeration.
pub struct SerialDeviceFacade {
    events: EventBus,
    connected: AtomicBool,
    port: Mutex<Option<String>>,
}

impl SerialDeviceFacade {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            connected: AtomicBool::new(false),
            port: Mutex::new(None),
        }
    }

    fn scan_ports() -> Vec<String> {
        // Serial devices surface under /dev on the supported platforms.
        let mut ports = Vec::new();
        if let Ok(entries) = std::fs::read_dir("/dev") {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with("ttyUSB") || name.starts_with("ttyACM") {
                    ports.push(format!("/dev/{name}"));
                }
            }
        }
        ports.sort();
        ports
    }
}

impl DeviceFacade for SerialDeviceFacade {
    fn available_ports(&self) -> Vec<String> {
        Self::scan_ports()
    }

    fn connect(&self, port: &str, baudrate: Option<u32>, profile: &str) -> Result<(), ManagerError> {
        tracing::info!(port, ?baudrate, profile, "Connecting to device");
        *self
            .port
            .lock()
            .map_err(|_| ManagerError::Device("port state poisoned".to_string()))? =
            Some(port.to_string());
        self.connected.store(true, Ordering::SeqCst);
        self.events.publish(Event::DeviceConnected {
            port: port.to_string(),
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn job_file_detected(&self, path: &Path) {
        tracing::debug!(path = ?path, "Job file handed to device facade");
        self.events.publish(Event::FileDetected {
            path: path.to_path_buf(),
        });
    }

    fn state_payload(&self) -> serde_json::Value {
        let port = self.port.lock().ok().and_then(|p| p.clone());
        serde_json::json!({
            "connected": self.is_connected(),
            "port": port,
        })
    }
}

/// File store keeping uploads in a local folder.
pub struct LocalFileStore {
    uploads: PathBuf,
}

impl LocalFileStore {
    pub fn new(uploads: PathBuf) -> Self {
        Self { uploads }
    }
}

impl FileStore for LocalFileStore {
    fn upload_folder(&self) -> &Path {
        &self.uploads
    }

    fn add_watched_file(&self, path: &Path) -> Result<PathBuf, ManagerError> {
        let name = path
            .file_name()
            .ok_or_else(|| ManagerError::Device("watched file has no name".to_string()))?;
        let target = self.uploads.join(name);
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::copy(path, &target)?;
        tracing::info!(from = ?path, to = ?target, "Imported watched file");
        Ok(target)
    }

    fn store_upload(&self, source: &Path, name: &str) -> Result<PathBuf, ManagerError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(ManagerError::Device(format!("invalid upload name {name:?}")));
        }
        let target = self.uploads.join(name);
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::copy(source, &target)?;
        tracing::info!(name, to = ?target, "Stored upload");
        Ok(target)
    }
}

/// Analysis queue that counts pending work.
///
/// Real analysis runs in the external subsystem; this layer only needs the
/// enqueue entry point and queue depth for the UI.
#[derive(Default)]
pub struct CountingAnalysisQueue {
    pending: AtomicUsize,
}

impl AnalysisQueue for CountingAnalysisQueue {
    fn enqueue(&self, path: &Path) {
        tracing::debug!(path = ?path, "Queued file for analysis");
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Slicing service anchored at a profile folder.
pub struct LocalSlicingService {
    profiles: PathBuf,
}

impl LocalSlicingService {
    pub fn new(profiles: PathBuf) -> Self {
        Self { profiles }
    }
}

impl SlicingService for LocalSlicingService {
    fn profile_folder(&self) -> &Path {
        &self.profiles
    }
}

/// Profile store with a single default profile.
#[derive(Default)]
pub struct DefaultProfileStore;

impl ProfileStore for DefaultProfileStore {
    fn default_profile_id(&self) -> String {
        "_default".to_string()
    }
}
