//! Core domain library for the pastebin service (config, storage, services).

/// Audit hooks for entity lifecycle events.
pub mod audit;
/// Change-notification side channel (channel sink and polling detector).
pub mod changes;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Storage backends and the injected storage context.
pub mod db;
/// Application error types (storage/domain).
pub mod error;
/// Entity records.
pub mod models;
/// Domain services built on top of [`db::Storage`].
pub mod service;
/// Shared cancellation signal for background tasks.
pub mod shutdown;

pub use audit::{ChangeLogger, NoopChangeLogger, TracingChangeLogger};
pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use db::{Storage, StorageBackend};
pub use error::AppError;
pub use service::Services;
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
