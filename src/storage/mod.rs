// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! # Storage Module
//!
//! Filesystem-backed persistence for the platform's auth core. Every entity
//! is a JSON file under the data directory; audit logs are append-only
//! daily JSONL files.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   users/
//!     {user_id}.json       # Identity + credential digest + role
//!   sessions/
//!     {session_id}.json    # Liveness record, created at login
//!   settings/
//!     system.json          # Platform-wide switches (super-admin only)
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//! ```

pub mod audit;
pub mod file_store;
pub mod paths;
pub mod repository;

pub use audit::{AuditAction, AuditEvent, AuditRepository};
pub use file_store::{FileStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    SessionRepository, SettingsRepository, StoredSession, StoredUser, SystemSettings,
    UserRepository,
};
