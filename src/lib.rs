// src/lib.rs
// Public library surface shared by both binaries and the integration tests.

pub mod api;
pub mod config;
pub mod folders;
pub mod metrics;
pub mod summary;
pub mod sync;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::{AppConfig, Environment, SourceDir};
pub use crate::folders::resolve_latest;
pub use crate::summary::{aggregate, latest_across, SEPARATOR, SUMMARY_FILE_NAME};
