// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Session repository.
//!
//! A session record is created at login and deleted at logout. Tokens stay
//! stateless; the session record is the authoritative liveness signal, so
//! deleting a user's sessions revokes their refresh flow immediately even
//! though already-issued tokens remain structurally valid until expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStore, StorageError, StorageResult};

/// Session record as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    /// Opaque session identifier (UUID)
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// When the session was opened
    pub created_at: DateTime<Utc>,
    /// When the session expires (refresh-token horizon)
    pub expires_at: DateTime<Utc>,
    /// IP address at login (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl StoredSession {
    /// Whether the session is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Repository for session records.
pub struct SessionRepository<'a> {
    store: &'a FileStore,
}

impl<'a> SessionRepository<'a> {
    /// Create a new SessionRepository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Get a session by ID.
    pub fn get(&self, session_id: &str) -> StorageResult<StoredSession> {
        let path = self.store.paths().session(session_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Session {session_id}")));
        }
        self.store.read_json(path)
    }

    /// Create a new session.
    pub fn create(&self, session: &StoredSession) -> StorageResult<()> {
        let path = self.store.paths().session(&session.id);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!("Session {}", session.id)));
        }
        self.store.write_json(path, session)
    }

    /// Delete a session.
    pub fn delete(&self, session_id: &str) -> StorageResult<()> {
        let path = self.store.paths().session(session_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Session {session_id}")));
        }
        self.store.delete(path)
    }

    /// List all sessions belonging to a user.
    pub fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<StoredSession>> {
        let session_ids = self
            .store
            .list_files(self.store.paths().sessions_dir(), "json")?;

        let mut sessions = Vec::new();
        for id in session_ids {
            if let Ok(session) = self.get(&id) {
                if session.user_id == user_id {
                    sessions.push(session);
                }
            }
        }

        Ok(sessions)
    }

    /// Whether the user has at least one live session.
    pub fn has_live_session(&self, user_id: &str, now: DateTime<Utc>) -> StorageResult<bool> {
        Ok(self
            .list_for_user(user_id)?
            .iter()
            .any(|s| s.is_live(now)))
    }

    /// Delete every session belonging to a user. Returns how many went away.
    pub fn delete_for_user(&self, user_id: &str) -> StorageResult<usize> {
        let sessions = self.list_for_user(user_id)?;
        let mut removed = 0;
        for session in &sessions {
            if self.delete(&session.id).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Count sessions that are live at `now`.
    pub fn count_active(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let session_ids = self
            .store
            .list_files(self.store.paths().sessions_dir(), "json")?;

        let mut count = 0;
        for id in session_ids {
            if let Ok(session) = self.get(&id) {
                if session.is_live(now) {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    /// Remove sessions whose expiry has passed. Returns how many went away.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let session_ids = self
            .store
            .list_files(self.store.paths().sessions_dir(), "json")?;

        let mut removed = 0;
        for id in session_ids {
            if let Ok(session) = self.get(&id) {
                if !session.is_live(now) && self.delete(&session.id).is_ok() {
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}
