//! Short URL service.

use super::views::record_view;
use crate::audit::{self, ChangeLogger};
use crate::constants::SHORT_CODE_LEN;
use crate::db::Storage;
use crate::error::AppError;
use crate::models::{EntityKind, ShortUrl};
use std::sync::Arc;

/// Maps short codes to paste hashes and resolves them back to content.
#[derive(Clone)]
pub struct ShortUrlService {
    storage: Storage,
    logger: Arc<dyn ChangeLogger>,
}

impl ShortUrlService {
    pub fn new(storage: Storage, logger: Arc<dyn ChangeLogger>) -> Self {
        Self { storage, logger }
    }

    /// Register `code` as pointing at `target`.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for blank inputs and
    /// [`AppError::Conflict`] when `code` is taken; the existing mapping is
    /// left untouched.
    pub fn create_short_url(&self, code: &str, target: &str) -> Result<ShortUrl, AppError> {
        let code = code.trim();
        let target = target.trim();
        if code.is_empty() {
            return Err(AppError::Validation("short code is required".to_string()));
        }
        if target.is_empty() {
            return Err(AppError::Validation("short url target is required".to_string()));
        }

        let short_url = ShortUrl::new(code, target);
        self.storage
            .short_urls
            .insert_new(&short_url)
            .map_err(|err| match err {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("short code '{}' already exists", code))
                }
                other => other,
            })?;
        audit::record(self.logger.as_ref(), EntityKind::ShortUrl, code, "created");
        Ok(short_url)
    }

    /// Create the short link for an existing paste, keyed by its hash prefix.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when no paste carries `hash`.
    pub fn create_for_paste(&self, hash: &str) -> Result<ShortUrl, AppError> {
        let paste = self.storage.pastes.get_by_hash(hash.trim())?;
        let code = paste.hash.get(..SHORT_CODE_LEN).ok_or_else(|| {
            AppError::Validation(format!(
                "hash must be at least {} characters",
                SHORT_CODE_LEN
            ))
        })?;
        self.create_short_url(code, &paste.hash)
    }

    pub fn get_short_url_by_id(&self, code: &str) -> Result<ShortUrl, AppError> {
        self.storage.short_urls.get(code)
    }

    pub fn delete_short_url(&self, code: &str) -> Result<(), AppError> {
        self.storage.short_urls.delete(code)?;
        audit::record(self.logger.as_ref(), EntityKind::ShortUrl, code, "deleted");
        Ok(())
    }

    pub fn list_short_urls(&self) -> Result<Vec<ShortUrl>, AppError> {
        self.storage.short_urls.list()
    }

    /// Follow `code` to its paste, count the view, and return the content.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the code or its paste is missing.
    pub fn resolve_short_url(&self, code: &str) -> Result<String, AppError> {
        let short_url = self.storage.short_urls.get(code)?;
        let paste = self.storage.pastes.get_by_hash(&short_url.original)?;
        let viewed = record_view(&self.storage, &paste.id)?;
        Ok(viewed.content)
    }
}
