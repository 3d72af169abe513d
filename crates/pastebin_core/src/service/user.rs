//! User service.

use crate::audit::{self, ChangeLogger};
use crate::db::Storage;
use crate::error::AppError;
use crate::models::{EntityKind, Record, User};
use std::sync::{Arc, Mutex};

/// Manages user records with sequential numeric ids.
#[derive(Clone)]
pub struct UserService {
    storage: Storage,
    logger: Arc<dyn ChangeLogger>,
    allocation: Arc<Mutex<()>>,
}

fn parse_user_id(id: &str) -> Result<i64, AppError> {
    id.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid user id '{}'", id)))
}

impl UserService {
    pub fn new(storage: Storage, logger: Arc<dyn ChangeLogger>) -> Self {
        Self {
            storage,
            logger,
            allocation: Arc::new(Mutex::new(())),
        }
    }

    /// Create a user with the next free id (highest existing id + 1).
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when `username` is blank.
    pub fn create_user(&self, username: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }

        let user = {
            let _allocation = self
                .allocation
                .lock()
                .map_err(|_| AppError::poisoned("user id allocation"))?;
            let next_id = self
                .storage
                .users
                .list()?
                .iter()
                .map(|user| user.id)
                .max()
                .unwrap_or(0)
                + 1;
            let user = User {
                id: next_id,
                username: username.to_string(),
                posts: Vec::new(),
            };
            self.storage.users.insert_new(&user)?;
            user
        };
        audit::record(self.logger.as_ref(), EntityKind::User, &user.key(), "created");
        Ok(user)
    }

    /// # Errors
    /// Returns [`AppError::Validation`] for non-numeric ids and
    /// [`AppError::NotFound`] for unknown ones.
    pub fn get_user_by_id(&self, id: &str) -> Result<User, AppError> {
        let id = parse_user_id(id)?;
        self.storage.users.get(&id.to_string())
    }

    pub fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let id = parse_user_id(id)?.to_string();
        self.storage.users.delete(&id)?;
        audit::record(self.logger.as_ref(), EntityKind::User, &id, "deleted");
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.storage.users.list()
    }

    /// Append an existing paste's hash to the user's posts, once.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the user or the paste is missing.
    pub fn add_post(&self, id: &str, hash: &str) -> Result<User, AppError> {
        let id = parse_user_id(id)?.to_string();
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(AppError::Validation("paste hash is required".to_string()));
        }
        self.storage.pastes.get_by_hash(hash)?;
        self.storage.users.modify(&id, &mut |user| {
            if !user.posts.iter().any(|post| post == hash) {
                user.posts.push(hash.to_string());
            }
        })
    }
}
