//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     infrastructure bindings + extension bindings + catch-all
//!     → Compile patterns (exact, prefix, anchored regex)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (method, path):
//!     → table.rs (ordered scan, first match wins)
//!     → Return: RouteMatch with captures, or the catch-all
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - The catch-all never shadows a structural route

pub mod matcher;
pub mod table;

pub use matcher::{MethodSet, RoutePattern};
pub use table::{AccessPolicy, RouteBinding, RouteHandler, RouteMatch, RouteTable};
