//! Audit hooks for entity lifecycle events.
//!
//! Callers treat audit failures as best effort: they are logged and never
//! fail the operation that triggered them.

use crate::error::AppError;
use crate::models::EntityKind;

/// Receives `(entity, id, action)` events for created and deleted records.
pub trait ChangeLogger: Send + Sync {
    fn log_change(&self, entity: EntityKind, id: &str, action: &str) -> Result<(), AppError>;
}

/// Emits each change as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChangeLogger;

impl ChangeLogger for TracingChangeLogger {
    fn log_change(&self, entity: EntityKind, id: &str, action: &str) -> Result<(), AppError> {
        tracing::info!(entity = entity.as_str(), id, action, "entity changed");
        Ok(())
    }
}

/// Discards every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChangeLogger;

impl ChangeLogger for NoopChangeLogger {
    fn log_change(&self, _entity: EntityKind, _id: &str, _action: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Forward a change to `logger`, downgrading failures to a warning.
pub(crate) fn record(logger: &dyn ChangeLogger, entity: EntityKind, id: &str, action: &str) {
    if let Err(err) = logger.log_change(entity, id, action) {
        tracing::warn!("Failed to log {} {} for {}: {}", entity, action, id, err);
    }
}
