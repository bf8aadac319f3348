//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, table dispatch)
//!     → request.rs (credential extraction)
//!     → middleware/ (authorization, CORS post-processing)
//!     → handler modules (index, assets, downloads, uploads, channel, api)
//! ```

pub mod api;
pub mod assets;
pub mod channel;
pub mod downloads;
pub mod middleware;
pub mod request;
pub mod server;
pub mod uploads;

pub use server::{AppState, HttpServer};
