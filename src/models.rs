// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON handling
//! and OpenAPI documentation. Wire field names are camelCase.
//!
//! Success responses use the envelope `{"success": true, "data": ...}`;
//! see [`crate::error::ApiError`] for the failure envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Role, TokenPair};
use crate::storage::StoredUser;

// =============================================================================
// Response Envelope
// =============================================================================

/// Success envelope wrapping every 2xx response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always true for success responses.
    pub success: bool,
    /// The endpoint-specific payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in the success envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// =============================================================================
// Principal Projection
// =============================================================================

/// Public projection of a user record. Never carries the credential digest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Unique user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display username.
    pub username: String,
    /// Authorization role.
    pub role: Role,
    /// Whether the login email has been verified.
    pub email_verified: bool,
}

impl From<&StoredUser> for UserProfile {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            email_verified: user.email_verified,
        }
    }
}

// =============================================================================
// Auth Requests / Responses
// =============================================================================

/// Request to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Login email (unique).
    pub email: String,
    /// Display username.
    pub username: String,
    /// Plaintext password; strength-checked before hashing.
    pub password: String,
}

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthPayload {
    /// The issued token pair.
    pub tokens: TokenPair,
    /// Projection of the authenticated principal.
    pub user: UserProfile,
}

/// Request to exchange a refresh token for a fresh pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request to change the caller's password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// =============================================================================
// Admin Requests / Responses
// =============================================================================

/// Request to change a user's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// Request to update system settings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub maintenance_mode: bool,
    pub registration_open: bool,
}
