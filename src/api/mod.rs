// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Role, TokenPair},
    models::{
        ApiResponse, AuthPayload, ChangePasswordRequest, ChangeRoleRequest, LoginRequest,
        RefreshRequest, RegisterRequest, UpdateSettingsRequest, UserProfile,
    },
    state::AppState,
    storage::{AuditAction, AuditEvent, SystemSettings},
};

pub mod admin;
pub mod auth;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route("/admin/stats", get(admin::get_system_stats))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{user_id}/role", put(admin::change_role))
        .route("/admin/audit", get(admin::query_audit))
        .route(
            "/admin/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,
        auth::change_password,
        admin::get_system_stats,
        admin::list_users,
        admin::change_role,
        admin::query_audit,
        admin::get_settings,
        admin::update_settings,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Role,
            TokenPair,
            UserProfile,
            AuthPayload,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            ChangePasswordRequest,
            ChangeRoleRequest,
            UpdateSettingsRequest,
            SystemSettings,
            AuditAction,
            AuditEvent,
            ApiResponse<UserProfile>,
            ApiResponse<AuthPayload>,
            ApiResponse<SystemSettings>,
            admin::SystemStatsResponse,
            admin::AdminUserListResponse,
            admin::AuditLogResponse,
            health::ReadyResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Authentication and token lifecycle"),
        (name = "Admin", description = "Administrative operations"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
