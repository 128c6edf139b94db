// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! User repository.
//!
//! Each user is stored as a separate JSON file under `users/`, keyed by id.
//! Email lookup scans the directory; emails are unique at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

use super::super::{FileStore, StorageError, StorageResult};

/// User record as persisted on disk.
///
/// The credential digest never leaves this layer; API projections are built
/// from the identity fields only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Login email (unique)
    pub email: String,
    /// Display username
    pub username: String,
    /// bcrypt credential digest
    pub password_hash: String,
    /// Authorization role
    pub role: Role,
    /// Deactivated accounts cannot log in or resolve tokens
    pub active: bool,
    /// Whether the login email has been verified
    pub email_verified: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last successful login (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    store: &'a FileStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        self.store.exists(self.store.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.store.paths().user(user_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.store.read_json(path)
    }

    /// Get a user by email (case-insensitive).
    pub fn get_by_email(&self, email: &str) -> StorageResult<StoredUser> {
        let user_ids = self
            .store
            .list_files(self.store.paths().users_dir(), "json")?;

        for id in user_ids {
            if let Ok(user) = self.get(&id) {
                if user.email.eq_ignore_ascii_case(email) {
                    return Ok(user);
                }
            }
        }

        Err(StorageError::NotFound(format!("User with email {email}")))
    }

    /// Create a new user.
    ///
    /// Rejects duplicate ids and duplicate emails.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let user_id = &user.id;

        if self.exists(user_id) {
            return Err(StorageError::AlreadyExists(format!("User {user_id}")));
        }

        if self.get_by_email(&user.email).is_ok() {
            return Err(StorageError::AlreadyExists(format!(
                "User with email {}",
                user.email
            )));
        }

        self.store.write_json(self.store.paths().user(user_id), user)
    }

    /// Update an existing user.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        let user_id = &user.id;

        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }

        self.store.write_json(self.store.paths().user(user_id), user)
    }

    /// Replace a user's credential digest.
    pub fn set_password_hash(&self, user_id: &str, password_hash: &str) -> StorageResult<StoredUser> {
        let mut user = self.get(user_id)?;
        user.password_hash = password_hash.to_string();
        self.update(&user)?;
        Ok(user)
    }

    /// Record a successful login.
    pub fn touch_last_login(&self, user_id: &str) -> StorageResult<StoredUser> {
        let mut user = self.get(user_id)?;
        user.last_login_at = Some(Utc::now());
        self.update(&user)?;
        Ok(user)
    }

    /// Change a user's role.
    pub fn set_role(&self, user_id: &str, role: Role) -> StorageResult<StoredUser> {
        let mut user = self.get(user_id)?;
        user.role = role;
        self.update(&user)?;
        Ok(user)
    }

    /// List all users (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let user_ids = self
            .store
            .list_files(self.store.paths().users_dir(), "json")?;

        let mut users = Vec::new();
        for id in user_ids {
            if let Ok(user) = self.get(&id) {
                users.push(user);
            }
        }

        Ok(users)
    }
}
