// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Token claims and the resolved principal representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::storage::StoredUser;

/// Claims embedded in every token this service issues.
///
/// `aud` pins the token to one consumer population (`user-app`,
/// `admin-app`, or `refresh-token`); it is set from the principal's role at
/// issuance and re-checked against the endpoint's expected audience on
/// every verification. `audienceType` mirrors it as a custom claim for
/// consumers that read the payload without JWT-library audience handling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// The principal's canonical id
    pub principal_id: String,
    /// Principal's login email
    pub email: String,
    /// Principal's role at issuance time
    pub role: Role,
    /// Mirror of the audience claim (`user-app`, `admin-app`, `refresh-token`)
    pub audience_type: String,
    /// Audience claim, enforced at verification
    pub aud: String,
    /// Issuer (fixed platform issuer string)
    pub iss: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration (Unix timestamp, seconds)
    pub exp: i64,
}

/// Authenticated principal resolved from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the identity making a request. It is rebuilt from the user store on
/// every request, so role and active-flag changes take effect on the next
/// request rather than at next token issuance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedPrincipal {
    /// Canonical user ID
    pub id: String,
    /// Login email
    pub email: String,
    /// Display username
    pub username: String,
    /// Role as currently stored (may be fresher than the token's claim)
    pub role: Role,
    /// Token expiration (Unix timestamp, used by guards, not serialized)
    #[serde(skip)]
    pub token_expires_at: i64,
}

impl AuthenticatedPrincipal {
    /// Build from a stored user record plus the verified claims.
    pub fn from_record(user: &StoredUser, claims: &TokenClaims) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
            token_expires_at: claims.exp,
        }
    }

    /// Check if this principal may use the admin application.
    pub fn is_admin_capable(&self) -> bool {
        self.role.is_admin_capable()
    }
}
