// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Audit logging for security-sensitive operations.
//!
//! Authentication events, credential changes, and administrative actions
//! are appended to the audit store. Entries are never mutated or deleted
//! by request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FileStore, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Account events
    RegisterSuccess,
    PasswordChanged,
    RoleChanged,

    // Auth events
    LoginSuccess,
    LoginFailed,
    TokenRefreshed,
    RefreshRejected,
    Logout,
    PermissionDenied,

    // Admin events
    AdminAccess,
    SettingsChanged,
}

impl AuditAction {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RegisterSuccess => "REGISTER_SUCCESS",
            AuditAction::PasswordChanged => "PASSWORD_CHANGED",
            AuditAction::RoleChanged => "ROLE_CHANGED",
            AuditAction::LoginSuccess => "LOGIN_SUCCESS",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::TokenRefreshed => "TOKEN_REFRESHED",
            AuditAction::RefreshRejected => "REFRESH_REJECTED",
            AuditAction::Logout => "LOGOUT",
            AuditAction::PermissionDenied => "PERMISSION_DENIED",
            AuditAction::AdminAccess => "ADMIN_ACCESS",
            AuditAction::SettingsChanged => "SETTINGS_CHANGED",
        }
    }
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: AuditAction,
    /// Principal who triggered the event (absent for pre-auth failures).
    pub user_id: Option<String>,
    /// Resource affected (route, user id, settings key, etc.).
    pub resource: Option<String>,
    /// IP address of the request (if available).
    pub ip_address: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(action: AuditAction) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            user_id: None,
            resource: None,
            ip_address: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the principal.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the affected resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the IP address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Display name for the acting principal; events with no principal
    /// (failed logins, bootstrap actions) are attributed to "System".
    pub fn actor(&self) -> &str {
        self.user_id.as_deref().unwrap_or("System")
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    store: &'a FileStore,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.store.paths().audit_events_file(&date);

        // Read existing events (or empty if file doesn't exist)
        let mut content = self.store.read_raw(&path).unwrap_or_default();

        let event_json = serde_json::to_string(event).map_err(|e| {
            super::StorageError::SerializationError(format!(
                "Failed to serialize audit event: {}",
                e
            ))
        })?;

        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(event_json.as_bytes());
        content.push(b'\n');

        self.store.write_raw(&path, &content)
    }

    /// Read audit events for a specific date.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.store.paths().audit_events_file(date);
        let content = self.store.read_raw(&path)?;

        let content_str = String::from_utf8(content).map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid UTF-8 in audit log: {}", e))
        })?;

        let mut events = Vec::new();
        for line in content_str.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line).map_err(|e| {
                super::StorageError::SerializationError(format!(
                    "Failed to deserialize audit event: {}",
                    e
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read events for a date range.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        use chrono::NaiveDate;

        let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid start date: {}", e))
        })?;

        let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid end date: {}", e))
        })?;

        let mut all_events = Vec::new();
        let mut current = start;

        while current <= end {
            let date_str = current.format("%Y-%m-%d").to_string();
            if let Ok(events) = self.read_events(&date_str) {
                all_events.extend(events);
            }
            current = current.succ_opt().ok_or_else(|| {
                super::StorageError::SerializationError("Date overflow".to_string())
            })?;
        }

        Ok(all_events)
    }

    /// Count today's events, for the admin stats view.
    pub fn count_today(&self) -> usize {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.read_events(&today).map(|e| e.len()).unwrap_or(0)
    }
}

/// Helper macro for logging audit events.
#[macro_export]
macro_rules! audit_log {
    ($store:expr, $action:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let event = $crate::storage::AuditEvent::new($action);
        let _ = repo.log(&event);
    }};
    ($store:expr, $action:expr, $user_id:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let event = $crate::storage::AuditEvent::new($action).with_user($user_id);
        let _ = repo.log(&event);
    }};
    ($store:expr, $action:expr, $user_id:expr, $resource:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let event = $crate::storage::AuditEvent::new($action)
            .with_user($user_id)
            .with_resource($resource);
        let _ = repo.log(&event);
    }};
}
