// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! System settings repository.
//!
//! Platform-wide switches stored as a single JSON record. Reads fall back
//! to defaults when no record has been written yet; writes are restricted
//! to the super-admin settings endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStore, StorageResult};

/// Platform-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SystemSettings {
    /// When true, non-admin requests are expected to be refused upstream.
    pub maintenance_mode: bool,
    /// When false, the register endpoint stops accepting new accounts.
    pub registration_open: bool,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Principal who last modified the settings.
    pub updated_by: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            registration_open: true,
            updated_at: Utc::now(),
            updated_by: "System".to_string(),
        }
    }
}

/// Repository for the system settings record.
pub struct SettingsRepository<'a> {
    store: &'a FileStore,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new SettingsRepository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Read the current settings, defaulting when none have been saved.
    pub fn get(&self) -> SystemSettings {
        let path = self.store.paths().system_settings();
        if !self.store.exists(&path) {
            return SystemSettings::default();
        }
        self.store.read_json(path).unwrap_or_default()
    }

    /// Persist new settings.
    pub fn put(&self, settings: &SystemSettings) -> StorageResult<()> {
        self.store
            .write_json(self.store.paths().system_settings(), settings)
    }
}
