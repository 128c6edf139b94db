// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Authentication endpoints: register, login, refresh, logout, profile,
//! and password change.
//!
//! Login failures are deliberately uniform: unknown email, wrong password,
//! and deactivated account all produce the same message, so the endpoint
//! cannot be used to enumerate accounts. Audit entries record the
//! distinction server-side.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};

use crate::{
    audit_log,
    auth::{
        password::{hash_password, verify_password},
        score_password_strength, AnyAuth, AuthError, UserAuth,
    },
    error::ApiError,
    models::{
        ApiResponse, AuthPayload, ChangePasswordRequest, LoginRequest, RefreshRequest,
        RegisterRequest, UserProfile,
    },
    state::AppState,
    storage::{
        AuditAction, AuditEvent, AuditRepository, SessionRepository, SettingsRepository,
        StoredSession, StoredUser, UserRepository,
    },
};

/// Map a strength report to a 422 with the itemized reasons.
fn strength_error(report: &crate::auth::StrengthReport) -> ApiError {
    let reasons: Vec<String> = report.violations.iter().map(|v| v.to_string()).collect();
    ApiError::unprocessable(reasons.join("; "))
}

/// Create a new account.
///
/// The candidate password is strength-checked before hashing; violations
/// come back itemized so the caller can retry with a stronger one.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserProfile>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Password too weak")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let settings = SettingsRepository::new(&state.store).get();
    if !settings.registration_open {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "REGISTRATION_CLOSED",
            "Registration is currently closed",
        ));
    }

    if request.email.trim().is_empty() || request.username.trim().is_empty() {
        return Err(ApiError::bad_request("Email and username are required"));
    }

    let report = score_password_strength(&request.password);
    if !report.valid {
        return Err(strength_error(&report));
    }

    let password_hash = hash_password(&request.password, state.hash_cost)?;

    let user = StoredUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: request.email.trim().to_lowercase(),
        username: request.username.trim().to_string(),
        password_hash,
        role: crate::auth::Role::User,
        active: true,
        email_verified: false,
        created_at: Utc::now(),
        last_login_at: None,
    };

    UserRepository::new(&state.store).create(&user)?;

    tracing::info!(user_id = %user.id, "account created");
    audit_log!(&state.store, AuditAction::RegisterSuccess, &user.id, "/v1/auth/register");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserProfile::from(&user))),
    ))
}

/// Log in with email and password.
///
/// On success returns a token pair (audience derived from the stored role)
/// and the principal projection, and opens a session record whose expiry
/// matches the refresh-token horizon.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<AuthPayload>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let repo = UserRepository::new(&state.store);

    let rejected = |reason: &str| {
        let event = AuditEvent::new(AuditAction::LoginFailed)
            .with_resource("/v1/auth/login")
            .with_details(serde_json::json!({ "email": request.email.clone() }))
            .failed(reason);
        let _ = AuditRepository::new(&state.store).log(&event);
        ApiError::invalid_credentials()
    };

    let user = match repo.get_by_email(request.email.trim()) {
        Ok(user) => user,
        Err(_) => return Err(rejected("unknown email")),
    };

    if !verify_password(&request.password, &user.password_hash) {
        return Err(rejected("wrong password"));
    }

    if !user.active {
        return Err(rejected("account deactivated"));
    }

    let tokens = state
        .tokens
        .issue_token_pair(&user.id, &user.email, user.role)?;

    let session = StoredSession {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::seconds(state.tokens.refresh_ttl_secs()),
        ip_address: None,
    };
    SessionRepository::new(&state.store).create(&session)?;

    let user = repo.touch_last_login(&user.id)?;

    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
    audit_log!(&state.store, AuditAction::LoginSuccess, &user.id, "/v1/auth/login");

    Ok(Json(ApiResponse::ok(AuthPayload {
        tokens,
        user: UserProfile::from(&user),
    })))
}

/// Exchange a refresh token for a fresh pair.
///
/// The subject must still resolve to a live account with a live session
/// record: deleting a user's sessions revokes their refresh flow. The new
/// access token carries the role as currently stored, so promotions and
/// demotions propagate here.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<AuthPayload>),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let rejected = |user_id: Option<&str>, reason: &str| {
        let mut event = AuditEvent::new(AuditAction::RefreshRejected)
            .with_resource("/v1/auth/refresh")
            .failed(reason);
        if let Some(id) = user_id {
            event = event.with_user(id);
        }
        let _ = AuditRepository::new(&state.store).log(&event);
        ApiError::from(AuthError::InvalidToken)
    };

    let claims = state
        .tokens
        .verify_refresh_token(&request.refresh_token)
        .map_err(|_| rejected(None, "refresh token failed verification"))?;

    let repo = UserRepository::new(&state.store);
    let user = match repo.get(&claims.principal_id) {
        Ok(user) if user.active => user,
        Ok(_) => return Err(rejected(Some(&claims.principal_id), "account deactivated")),
        Err(_) => return Err(rejected(Some(&claims.principal_id), "account no longer exists")),
    };

    let sessions = SessionRepository::new(&state.store);
    if !sessions.has_live_session(&user.id, Utc::now())? {
        return Err(rejected(Some(&user.id), "no live session"));
    }

    let tokens = state
        .tokens
        .issue_token_pair(&user.id, &user.email, user.role)?;

    audit_log!(&state.store, AuditAction::TokenRefreshed, &user.id, "/v1/auth/refresh");

    Ok(Json(ApiResponse::ok(AuthPayload {
        tokens,
        user: UserProfile::from(&user),
    })))
}

/// Log out, closing every session the caller owns.
///
/// Accepts either audience: the user app and the admin dashboard both call
/// this endpoint with their own tokens.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    AnyAuth(principal): AnyAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let closed = SessionRepository::new(&state.store).delete_for_user(&principal.id)?;

    tracing::info!(user_id = %principal.id, closed, "logout");
    audit_log!(&state.store, AuditAction::Logout, &principal.id, "/v1/auth/logout");

    Ok(Json(ApiResponse::ok(
        serde_json::json!({ "sessionsClosed": closed }),
    )))
}

/// Current principal profile.
///
/// Reads the account record fresh on every call; clients use this at
/// bootstrap to re-validate cached credentials.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<UserProfile>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    UserAuth(principal): UserAuth,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = UserRepository::new(&state.store).get(&principal.id)?;
    Ok(Json(ApiResponse::ok(UserProfile::from(&user))))
}

/// Change the caller's password.
#[utoipa::path(
    put,
    path = "/v1/auth/password",
    request_body = ChangePasswordRequest,
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password wrong"),
        (status = 422, description = "New password too weak")
    )
)]
pub async fn change_password(
    UserAuth(principal): UserAuth,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let repo = UserRepository::new(&state.store);
    let user = repo.get(&principal.id)?;

    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let report = score_password_strength(&request.new_password);
    if !report.valid {
        return Err(strength_error(&report));
    }

    let password_hash = hash_password(&request.new_password, state.hash_cost)?;
    repo.set_password_hash(&user.id, &password_hash)?;

    audit_log!(&state.store, AuditAction::PasswordChanged, &user.id, "/v1/auth/password");

    Ok(Json(ApiResponse::ok(serde_json::json!({ "changed": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::test_support::test_state;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn register_account(state: &AppState, email: &str, password: &str) -> UserProfile {
        let (status, Json(body)) = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: email.to_string(),
                username: email.split('@').next().unwrap().to_string(),
                password: password.to_string(),
            }),
        )
        .await
        .expect("register succeeds");
        assert_eq!(status, StatusCode::CREATED);
        body.data
    }

    async fn login_payload(state: &AppState, email: &str, password: &str) -> AuthPayload {
        let Json(body) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            }),
        )
        .await
        .expect("login succeeds");
        body.data
    }

    async fn auth_for(state: &AppState, payload: &AuthPayload) -> UserAuth {
        let mut parts = Request::builder()
            .uri("/test")
            .header(
                "Authorization",
                format!("Bearer {}", payload.tokens.access_token),
            )
            .body(())
            .unwrap()
            .into_parts()
            .0;
        UserAuth::from_request_parts(&mut parts, state)
            .await
            .expect("token authenticates")
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let (state, _tmp) = test_state();

        let result = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "weak@example.com".to_string(),
                username: "weak".to_string(),
                password: "password".to_string(),
            }),
        )
        .await;

        match result {
            Err(err) => {
                assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
                assert!(err.message.contains("too common"));
            }
            Ok(_) => panic!("expected weak password to be rejected"),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (state, _tmp) = test_state();
        register_account(&state, "dupe@example.com", "Str0ng&Pass").await;

        let result = register(
            State(state.clone()),
            Json(RegisterRequest {
                email: "dupe@example.com".to_string(),
                username: "other".to_string(),
                password: "Str0ng&Pass".to_string(),
            }),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.status, StatusCode::CONFLICT),
            Ok(_) => panic!("expected duplicate email to be rejected"),
        }
    }

    #[tokio::test]
    async fn login_returns_tokens_and_profile() {
        let (state, _tmp) = test_state();
        register_account(&state, "miner@example.com", "Str0ng&Pass").await;

        let payload = login_payload(&state, "miner@example.com", "Str0ng&Pass").await;

        assert_eq!(payload.user.email, "miner@example.com");
        assert_eq!(payload.user.role, Role::User);
        assert!(!payload.tokens.access_token.is_empty());
        assert!(!payload.tokens.refresh_token.is_empty());

        // One live session was opened.
        let count = SessionRepository::new(&state.store)
            .count_active(Utc::now())
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn login_failure_is_uniform() {
        let (state, _tmp) = test_state();
        register_account(&state, "real@example.com", "Str0ng&Pass").await;

        let unknown = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "whatever1!".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let wrong = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "real@example.com".to_string(),
                password: "WrongPass1!".to_string(),
            }),
        )
        .await
        .unwrap_err();

        // Unknown account and wrong password are indistinguishable.
        assert_eq!(unknown.status, wrong.status);
        assert_eq!(unknown.message, wrong.message);
        assert_eq!(unknown.code, wrong.code);
    }

    #[tokio::test]
    async fn login_failures_are_audited() {
        let (state, _tmp) = test_state();

        let _ = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever1!".to_string(),
            }),
        )
        .await;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = AuditRepository::new(&state.store)
            .read_events(&today)
            .unwrap();
        assert!(events
            .iter()
            .any(|e| e.action == AuditAction::LoginFailed && e.actor() == "System"));
    }

    #[tokio::test]
    async fn refresh_rotates_pair_and_reads_fresh_role() {
        let (state, _tmp) = test_state();
        let profile = register_account(&state, "promote@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "promote@example.com", "Str0ng&Pass").await;

        // Promote after login: the refreshed access token must carry the
        // new role (and thus the admin audience).
        UserRepository::new(&state.store)
            .set_role(&profile.id, Role::Admin)
            .unwrap();

        let Json(body) = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: payload.tokens.refresh_token.clone(),
            }),
        )
        .await
        .expect("refresh succeeds");

        assert_eq!(body.data.user.role, Role::Admin);
        let claims = state
            .tokens
            .verify(&body.data.tokens.access_token, crate::auth::Audience::Admin)
            .unwrap();
        assert_eq!(claims.aud, "admin-app");
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let (state, _tmp) = test_state();
        register_account(&state, "swap@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "swap@example.com", "Str0ng&Pass").await;

        // An access token is not a refresh token, even though it is a
        // structurally valid signed token.
        let result = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: payload.tokens.access_token.clone(),
            }),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.status, StatusCode::UNAUTHORIZED),
            Ok(_) => panic!("expected access token to be rejected as refresh token"),
        }
    }

    #[tokio::test]
    async fn refresh_requires_live_session() {
        let (state, _tmp) = test_state();
        let profile = register_account(&state, "revoke@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "revoke@example.com", "Str0ng&Pass").await;

        // Closing the sessions revokes the refresh flow even though the
        // refresh token itself is still unexpired.
        SessionRepository::new(&state.store)
            .delete_for_user(&profile.id)
            .unwrap();

        let result = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                refresh_token: payload.tokens.refresh_token.clone(),
            }),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.status, StatusCode::UNAUTHORIZED),
            Ok(_) => panic!("expected refresh without live session to fail"),
        }
    }

    #[tokio::test]
    async fn logout_closes_sessions() {
        let (state, _tmp) = test_state();
        register_account(&state, "leave@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "leave@example.com", "Str0ng&Pass").await;

        let mut parts = Request::builder()
            .uri("/v1/auth/logout")
            .header(
                "Authorization",
                format!("Bearer {}", payload.tokens.access_token),
            )
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let any = AnyAuth::from_request_parts(&mut parts, &state).await.unwrap();

        let Json(body) = logout(any, State(state.clone())).await.unwrap();
        assert_eq!(body.data["sessionsClosed"], 1);

        let count = SessionRepository::new(&state.store)
            .count_active(Utc::now())
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn me_returns_fresh_profile() {
        let (state, _tmp) = test_state();
        register_account(&state, "fresh@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "fresh@example.com", "Str0ng&Pass").await;

        let auth = auth_for(&state, &payload).await;
        let Json(body) = me(auth, State(state.clone())).await.unwrap();
        assert_eq!(body.data.email, "fresh@example.com");
    }

    #[tokio::test]
    async fn change_password_requires_current_and_strength() {
        let (state, _tmp) = test_state();
        register_account(&state, "change@example.com", "Str0ng&Pass").await;
        let payload = login_payload(&state, "change@example.com", "Str0ng&Pass").await;

        // Wrong current password
        let auth = auth_for(&state, &payload).await;
        let result = change_password(
            auth,
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "WrongPass1!".to_string(),
                new_password: "N3w&Secret".to_string(),
            }),
        )
        .await;
        assert_eq!(result.unwrap_err().status, StatusCode::UNAUTHORIZED);

        // Weak new password
        let auth = auth_for(&state, &payload).await;
        let result = change_password(
            auth,
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "Str0ng&Pass".to_string(),
                new_password: "password".to_string(),
            }),
        )
        .await;
        assert_eq!(result.unwrap_err().status, StatusCode::UNPROCESSABLE_ENTITY);

        // Valid change: the old password stops working, the new one logs in.
        let auth = auth_for(&state, &payload).await;
        change_password(
            auth,
            State(state.clone()),
            Json(ChangePasswordRequest {
                current_password: "Str0ng&Pass".to_string(),
                new_password: "N3w&Secret".to_string(),
            }),
        )
        .await
        .expect("password change succeeds");

        let old = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "change@example.com".to_string(),
                password: "Str0ng&Pass".to_string(),
            }),
        )
        .await;
        assert!(old.is_err());

        login_payload(&state, "change@example.com", "N3w&Secret").await;
    }
}
