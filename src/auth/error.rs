// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Authentication errors.
//!
//! Verification failures deliberately collapse into a single client-visible
//! kind: signature, audience, issuer, and expiry mismatches all surface as
//! `InvalidToken` with one generic message, and a principal that no longer
//! exists is indistinguishable from an invalid token. Callers that need the
//! sub-cause log it server-side before converting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer header or audience cookie was presented
    MissingCredentials,
    /// Authorization header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Token failed verification (signature, audience, issuer, or expiry)
    InvalidToken,
    /// Token verified but the subject no longer resolves to a live account.
    /// Client-visible behavior is identical to `InvalidToken`.
    PrincipalNotFound,
    /// Principal resolved but lacks the required role
    InsufficientPermission { required: super::Role },
    /// Credential hashing transform failed (never a wrong-password case)
    HashingFailure,
}

#[derive(Serialize)]
struct ErrorDetail {
    message: String,
    code: String,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: ErrorDetail,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials | AuthError::InvalidAuthHeader => "AUTH_REQUIRED",
            AuthError::InvalidToken | AuthError::PrincipalNotFound => "TOKEN_INVALID",
            AuthError::InsufficientPermission { required } => match required {
                super::Role::SuperAdmin => "SUPER_ADMIN_REQUIRED",
                _ => "ADMIN_REQUIRED",
            },
            AuthError::HashingFailure => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken
            | AuthError::PrincipalNotFound => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermission { .. } => StatusCode::FORBIDDEN,
            AuthError::HashingFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a credential was presented and rejected (as opposed to
    /// absent). Handlers use this to decide when a failed-auth audit entry
    /// is warranted.
    pub fn credential_was_presented(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidAuthHeader | AuthError::InvalidToken | AuthError::PrincipalNotFound
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Authentication required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            // One message for every verification failure and for missing
            // principals; the sub-cause is never shown to the client.
            AuthError::InvalidToken | AuthError::PrincipalNotFound => {
                write!(f, "Invalid or expired token")
            }
            AuthError::InsufficientPermission { required } => {
                write!(f, "{required} role required for this operation")
            }
            AuthError::HashingFailure => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: ErrorDetail {
                message: self.to_string(),
                code: self.error_code().to_string(),
            },
        });
        (status, body).into_response()
    }
}
