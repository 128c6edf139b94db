// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Admin-only API endpoints for system management.
//!
//! These endpoints require an admin-audience token. They provide:
//! - System statistics
//! - User overview and role management
//! - Audit log queries
//! - System settings (super-admin only)

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::{AdminAuth, Role, SuperAdminOnly},
    error::ApiError,
    models::{ApiResponse, ChangeRoleRequest, UpdateSettingsRequest, UserProfile},
    state::AppState,
    storage::{
        AuditAction, AuditEvent, AuditRepository, SessionRepository, SettingsRepository,
        SystemSettings, UserRepository,
    },
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatsResponse {
    /// Total number of accounts.
    pub total_users: usize,
    /// Accounts that can log in.
    pub active_users: usize,
    /// Accounts with an admin-capable role.
    pub admin_users: usize,
    /// Sessions live right now.
    pub active_sessions: usize,
    /// Audit events recorded today.
    pub audit_events_today: usize,
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

/// Response for the admin user list.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserListResponse {
    /// All accounts, as public projections.
    pub users: Vec<UserProfile>,
    /// Total count.
    pub total: usize,
}

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQueryParams {
    /// Start date (YYYY-MM-DD format). Defaults to today.
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD format). Defaults to start date.
    pub end_date: Option<String>,
    /// Filter by principal ID.
    pub user_id: Option<String>,
    /// Filter by action (e.g. `LOGIN_FAILED`).
    pub action: Option<String>,
    /// Maximum number of results (default 100).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Response for audit log queries.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditLogResponse {
    /// Audit events matching the query.
    pub events: Vec<AuditEvent>,
    /// Total count (before limit/offset).
    pub total: usize,
    /// Whether there are more results.
    pub has_more: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get system statistics.
///
/// Expired sessions are purged as a side effect so the active-session
/// count stays honest. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "System statistics", body = ApiResponse<SystemStatsResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_system_stats(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SystemStatsResponse>>, ApiError> {
    let now = Utc::now();

    let users = UserRepository::new(&state.store).list_all()?;
    let active_users = users.iter().filter(|u| u.active).count();
    let admin_users = users.iter().filter(|u| u.role.is_admin_capable()).count();

    let sessions = SessionRepository::new(&state.store);
    let _ = sessions.purge_expired(now);
    let active_sessions = sessions.count_active(now)?;

    let audit_events_today = AuditRepository::new(&state.store).count_today();

    audit_log!(&state.store, AuditAction::AdminAccess, &admin.id, "/v1/admin/stats");

    Ok(Json(ApiResponse::ok(SystemStatsResponse {
        total_users: users.len(),
        active_users,
        admin_users,
        active_sessions,
        audit_events_today,
        uptime_seconds: state.uptime_seconds(),
        timestamp: now.to_rfc3339(),
    })))
}

/// List all accounts. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = ApiResponse<AdminUserListResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AdminUserListResponse>>, ApiError> {
    let users = UserRepository::new(&state.store).list_all()?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();

    audit_log!(&state.store, AuditAction::AdminAccess, &admin.id, "/v1/admin/users");

    let total = profiles.len();
    Ok(Json(ApiResponse::ok(AdminUserListResponse {
        users: profiles,
        total,
    })))
}

/// Change an account's role. Super-admin only.
#[utoipa::path(
    put,
    path = "/v1/admin/users/{user_id}/role",
    params(("user_id" = String, Path, description = "Account to change")),
    request_body = ChangeRoleRequest,
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserProfile>),
        (status = 403, description = "Not authorized (super-admin required)"),
        (status = 404, description = "No such account")
    )
)]
pub async fn change_role(
    SuperAdminOnly(admin): SuperAdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    if admin.id == user_id && request.role != Role::SuperAdmin {
        return Err(ApiError::unprocessable(
            "Cannot remove your own super-admin role",
        ));
    }

    let user = UserRepository::new(&state.store).set_role(&user_id, request.role)?;

    tracing::info!(user_id = %user.id, role = %user.role, changed_by = %admin.id, "role changed");
    let event = AuditEvent::new(AuditAction::RoleChanged)
        .with_user(&admin.id)
        .with_resource(&user.id)
        .with_details(serde_json::json!({ "role": user.role }));
    let _ = AuditRepository::new(&state.store).log(&event);

    Ok(Json(ApiResponse::ok(UserProfile::from(&user))))
}

/// Query the audit log. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    params(AuditQueryParams),
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Matching audit events", body = ApiResponse<AuditLogResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn query_audit(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<ApiResponse<AuditLogResponse>>, ApiError> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let start = params.start_date.unwrap_or_else(|| today.clone());
    let end = params.end_date.unwrap_or_else(|| start.clone());

    let repo = AuditRepository::new(&state.store);
    let mut events = repo
        .read_events_range(&start, &end)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    if let Some(ref user_id) = params.user_id {
        events.retain(|e| e.user_id.as_deref() == Some(user_id.as_str()));
    }
    if let Some(ref action) = params.action {
        events.retain(|e| e.action.as_str() == action);
    }

    let total = events.len();
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(100);
    let events: Vec<AuditEvent> = events.into_iter().skip(offset).take(limit).collect();
    let has_more = offset + events.len() < total;

    Ok(Json(ApiResponse::ok(AuditLogResponse {
        events,
        total,
        has_more,
    })))
}

/// Read the system settings. Admin only.
#[utoipa::path(
    get,
    path = "/v1/admin/settings",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = ApiResponse<SystemSettings>),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_settings(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SystemSettings>>, ApiError> {
    Ok(Json(ApiResponse::ok(
        SettingsRepository::new(&state.store).get(),
    )))
}

/// Update the system settings. Super-admin only.
#[utoipa::path(
    put,
    path = "/v1/admin/settings",
    request_body = UpdateSettingsRequest,
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<SystemSettings>),
        (status = 403, description = "Not authorized (super-admin required)")
    )
)]
pub async fn update_settings(
    SuperAdminOnly(admin): SuperAdminOnly,
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<SystemSettings>>, ApiError> {
    let settings = SystemSettings {
        maintenance_mode: request.maintenance_mode,
        registration_open: request.registration_open,
        updated_at: Utc::now(),
        updated_by: admin.id.clone(),
    };
    SettingsRepository::new(&state.store).put(&settings)?;

    tracing::info!(changed_by = %admin.id, "system settings updated");
    let event = AuditEvent::new(AuditAction::SettingsChanged)
        .with_user(&admin.id)
        .with_resource("system-settings")
        .with_details(serde_json::to_value(&settings).unwrap_or_default());
    let _ = AuditRepository::new(&state.store).log(&event);

    Ok(Json(ApiResponse::ok(settings)))
}
