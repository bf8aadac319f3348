//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (orchestrator.rs):
//!     Load config → Managers → Extensions → Templates → Routes →
//!     Identity → Auto-connect → Watcher → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections →
//!     Stop watcher → Extension shutdown hooks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then the listener
//! - States advance one way only; no restart-in-place
//! - Shutdown triggering is idempotent

pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use orchestrator::{Server, ServerError};
pub use shutdown::Shutdown;
pub use state::{LifecycleState, LifecycleTracker};
