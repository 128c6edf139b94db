// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Axum extractors for authenticated principals.
//!
//! Each extractor walks the same per-request pipeline: pull the raw token
//! from the request, verify it against the audience the endpoint expects,
//! then resolve the subject to a live account record. Any step can reject;
//! a valid signature does not guarantee the account still exists.
//!
//! Use the `UserAuth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(UserAuth(principal): UserAuth) -> impl IntoResponse {
//!     // principal is AuthenticatedPrincipal
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};

use crate::state::AppState;
use crate::storage::UserRepository;

use super::{
    claims::{AuthenticatedPrincipal, TokenClaims},
    error::AuthError,
    roles::{authorize, Role},
    token::Audience,
};

/// Pull the raw token for the expected audience out of the request.
///
/// The `Authorization: Bearer` header takes precedence over cookies on
/// every endpoint; the cookie fallback reads `user_token` or `admin_token`
/// depending on the audience. The `Bearer ` prefix is case-sensitive.
fn extract_token(parts: &Parts, audience: Audience) -> Result<String, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;
        return Ok(token.trim().to_string());
    }

    cookie_value(parts, audience.cookie_name()).ok_or(AuthError::MissingCredentials)
}

/// Find a cookie by name in the Cookie header.
fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    let cookie_header = parts.headers.get(COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((cookie_name, value)) = cookie.split_once('=') {
            if cookie_name == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Verify the token and resolve its subject to a live account.
///
/// Deleted and deactivated accounts are rejected with the same
/// client-visible error as an invalid token.
fn resolve_principal(
    state: &AppState,
    claims: &TokenClaims,
) -> Result<AuthenticatedPrincipal, AuthError> {
    let repo = UserRepository::new(&state.store);
    let user = repo.get(&claims.principal_id).map_err(|_| {
        tracing::debug!(user_id = %claims.principal_id, "token subject no longer resolves");
        AuthError::PrincipalNotFound
    })?;

    if !user.active {
        tracing::debug!(user_id = %user.id, "token subject is deactivated");
        return Err(AuthError::PrincipalNotFound);
    }

    Ok(AuthenticatedPrincipal::from_record(&user, claims))
}

fn authenticate(
    parts: &mut Parts,
    state: &AppState,
    audience: Audience,
) -> Result<AuthenticatedPrincipal, AuthError> {
    // Middleware or a prior extractor may have resolved the principal already
    if let Some(principal) = parts.extensions.get::<AuthenticatedPrincipal>().cloned() {
        return Ok(principal);
    }

    let token = extract_token(parts, audience)?;
    let claims = state.tokens.verify(&token, audience)?;
    let principal = resolve_principal(state, &claims)?;

    parts.extensions.insert(principal.clone());
    Ok(principal)
}

/// Extractor for authenticated end users (`user-app` audience).
pub struct UserAuth(pub AuthenticatedPrincipal);

impl FromRequestParts<AppState> for UserAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(UserAuth(authenticate(parts, state, Audience::User)?))
    }
}

/// Extractor for admin-capable principals (`admin-app` audience).
///
/// Requires an admin-audience token AND a stored role that passes the
/// admin gate, so a demotion takes effect on the next request even while
/// an admin-audience token is still circulating.
#[derive(Debug)]
pub struct AdminAuth(pub AuthenticatedPrincipal);

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state, Audience::Admin)?;

        if !authorize(principal.role, Some(Role::Admin)) {
            return Err(AuthError::InsufficientPermission {
                required: Role::Admin,
            });
        }

        Ok(AdminAuth(principal))
    }
}

/// Extractor accepting either audience.
///
/// For routes shared by both applications (logout). The token is checked
/// against the user audience first, then the admin audience; failures from
/// both collapse into the second attempt's error.
pub struct AnyAuth(pub AuthenticatedPrincipal);

impl FromRequestParts<AppState> for AnyAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, Audience::User) {
            Ok(principal) => Ok(AnyAuth(principal)),
            Err(_) => authenticate(parts, state, Audience::Admin).map(AnyAuth),
        }
    }
}

/// Extractor for super-admin-only endpoints.
#[derive(Debug)]
pub struct SuperAdminOnly(pub AuthenticatedPrincipal);

impl FromRequestParts<AppState> for SuperAdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = authenticate(parts, state, Audience::Admin)?;

        if !authorize(principal.role, Some(Role::SuperAdmin)) {
            return Err(AuthError::InsufficientPermission {
                required: Role::SuperAdmin,
            });
        }

        Ok(SuperAdminOnly(principal))
    }
}
