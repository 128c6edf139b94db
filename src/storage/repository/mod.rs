// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Repository layer providing typed access to the file store.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the FileStore for all file operations.

pub mod sessions;
pub mod settings;
pub mod users;

pub use sessions::{SessionRepository, StoredSession};
pub use settings::{SettingsRepository, SystemSettings};
pub use users::{StoredUser, UserRepository};
