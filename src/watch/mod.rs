//! Filesystem watching subsystem.

pub mod watcher;

pub use watcher::JobWatcher;
