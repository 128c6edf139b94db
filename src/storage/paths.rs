// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Path constants and utilities for the storage layout.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DATA_DIR;

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a specific user record.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Session Paths ==========

    /// Directory containing all session records.
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Path to a specific session record.
    pub fn session(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.json"))
    }

    // ========== System Settings Paths ==========

    /// Directory containing platform-wide settings.
    pub fn settings_dir(&self) -> PathBuf {
        self.root.join("settings")
    }

    /// Path to the system settings record.
    pub fn system_settings(&self) -> PathBuf {
        self.settings_dir().join("system.json")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
    }

    #[test]
    fn custom_root_for_testing() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(
            paths.user("user-123"),
            PathBuf::from("/tmp/test-data/users/user-123.json")
        );
    }

    #[test]
    fn user_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.users_dir(), PathBuf::from("/data/users"));
        assert_eq!(paths.user("u1"), PathBuf::from("/data/users/u1.json"));
    }

    #[test]
    fn session_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.sessions_dir(), PathBuf::from("/data/sessions"));
        assert_eq!(
            paths.session("sess-456"),
            PathBuf::from("/data/sessions/sess-456.json")
        );
    }

    #[test]
    fn settings_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.system_settings(),
            PathBuf::from("/data/settings/system.json")
        );
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.audit_dir(), PathBuf::from("/data/audit"));
        assert_eq!(
            paths.audit_events_file("2026-08-06"),
            PathBuf::from("/data/audit/2026-08-06/events.jsonl")
        );
    }
}
