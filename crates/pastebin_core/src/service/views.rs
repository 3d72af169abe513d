//! View accounting shared by paste lookups and short-link resolution.

use crate::db::Storage;
use crate::error::AppError;
use crate::models::Paste;

/// Increment the paste's own counter and mirror the view into its stats row.
///
/// The stats update is best effort; a missing stats row is not an error.
///
/// # Returns
/// The paste with its updated view count.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the paste vanished before the update.
pub(crate) fn record_view(storage: &Storage, paste_id: &str) -> Result<Paste, AppError> {
    let paste = storage.pastes.modify(paste_id, &mut |p| p.views += 1)?;
    match storage.stats.modify(paste_id, &mut |s| s.views += 1) {
        Ok(_) | Err(AppError::NotFound) => {}
        Err(err) => tracing::warn!("Failed to count view for paste {}: {}", paste_id, err),
    }
    Ok(paste)
}
