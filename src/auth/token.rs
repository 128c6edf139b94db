// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Token issuance and verification.
//!
//! Two HS256 signing domains, one per audience: user-audience access tokens
//! use the user secret, admin-audience access tokens use the admin secret.
//! Refresh tokens are always signed with the admin secret regardless of the
//! principal's role - both sides of the refresh exchange assume this, so it
//! must not be changed without coordinating client and server.
//!
//! Verification pins signature, issuer, audience, and expiry on every call;
//! all four checks collapse into one client-visible failure. Sub-causes are
//! logged at debug level for operators only.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::AuthSettings;

use super::{claims::TokenClaims, error::AuthError, roles::Role};

/// Consumer population a token is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// End-user application
    User,
    /// Admin dashboard
    Admin,
    /// Refresh-exchange flow (never a valid access-token audience)
    Refresh,
}

impl Audience {
    /// The exact audience claim value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::User => "user-app",
            Audience::Admin => "admin-app",
            Audience::Refresh => "refresh-token",
        }
    }

    /// The cookie a browser presents for this audience.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Audience::User => "user_token",
            Audience::Admin | Audience::Refresh => "admin_token",
        }
    }

    /// Derive the access-token audience from a principal's role.
    pub fn for_role(role: Role) -> Audience {
        if role.is_admin_capable() {
            Audience::Admin
        } else {
            Audience::User
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An access/refresh token pair, as returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token for API calls
    pub access_token: String,
    /// Long-lived token for the refresh exchange
    pub refresh_token: String,
}

/// Issues and verifies signed tokens for both audiences.
///
/// Pure computation over immutable key material: no I/O, no shared mutable
/// state, safe to call concurrently from any number of requests.
pub struct TokenService {
    user_encoding: EncodingKey,
    user_decoding: DecodingKey,
    admin_encoding: EncodingKey,
    admin_decoding: DecodingKey,
    issuer: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Build a token service from auth settings.
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            user_encoding: EncodingKey::from_secret(settings.user_token_secret.as_bytes()),
            user_decoding: DecodingKey::from_secret(settings.user_token_secret.as_bytes()),
            admin_encoding: EncodingKey::from_secret(settings.admin_token_secret.as_bytes()),
            admin_decoding: DecodingKey::from_secret(settings.admin_token_secret.as_bytes()),
            issuer: settings.issuer.clone(),
            access_ttl_secs: settings.access_ttl.as_secs() as i64,
            refresh_ttl_secs: settings.refresh_ttl.as_secs() as i64,
        }
    }

    /// The configured issuer claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Refresh-token lifetime in seconds; session records share this horizon.
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    fn encoding_key(&self, audience: Audience) -> &EncodingKey {
        match audience {
            Audience::User => &self.user_encoding,
            // Refresh tokens share the admin signing domain.
            Audience::Admin | Audience::Refresh => &self.admin_encoding,
        }
    }

    fn decoding_key(&self, audience: Audience) -> &DecodingKey {
        match audience {
            Audience::User => &self.user_decoding,
            Audience::Admin | Audience::Refresh => &self.admin_decoding,
        }
    }

    /// Issue an access token pinned to the given audience.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        audience: Audience,
    ) -> Result<String, AuthError> {
        self.issue(user_id, email, role, audience, self.access_ttl_secs)
    }

    /// Issue a refresh token.
    ///
    /// Signed with the admin secret for every role, audience pinned to
    /// `refresh-token` so it can never pass an access-token check.
    pub fn issue_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        self.issue(user_id, email, role, Audience::Refresh, self.refresh_ttl_secs)
    }

    /// Issue an access/refresh pair, deriving the access audience from the
    /// principal's role. Sole entry point for login and refresh-exchange.
    pub fn issue_token_pair(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let audience = Audience::for_role(role);
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, email, role, audience)?,
            refresh_token: self.issue_refresh_token(user_id, email, role)?,
        })
    }

    fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        audience: Audience,
        ttl_secs: i64,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            principal_id: user_id.to_string(),
            email: email.to_string(),
            role,
            audience_type: audience.as_str().to_string(),
            aud: audience.as_str().to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + ttl_secs,
        };

        encode(&Header::default(), &claims, self.encoding_key(audience)).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AuthError::HashingFailure
        })
    }

    /// Verify a token against the expected audience and return its claims.
    ///
    /// Checks, in one pass: HS256 signature under the expected audience's
    /// secret, exact issuer match, exact audience match, and expiry with
    /// zero leeway. Any mismatch collapses into `InvalidToken`.
    pub fn verify(&self, token: &str, expected: Audience) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[expected.as_str()]);

        decode::<TokenClaims>(token, self.decoding_key(expected), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                // Operators get the sub-cause; clients never do.
                tracing::debug!(
                    audience = %expected,
                    reason = %e,
                    "token verification failed"
                );
                AuthError::InvalidToken
            })
    }

    /// Verify a refresh token: audience pinned to `refresh-token`, secret
    /// pinned to the admin signing domain.
    pub fn verify_refresh_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify(token, Audience::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn service() -> TokenService {
        TokenService::new(&AuthSettings::for_tests())
    }

    #[test]
    fn audience_derivation_follows_role() {
        assert_eq!(Audience::for_role(Role::User), Audience::User);
        assert_eq!(Audience::for_role(Role::Admin), Audience::Admin);
        assert_eq!(Audience::for_role(Role::SuperAdmin), Audience::Admin);
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let svc = service();
        let token = svc
            .issue_access_token("u-1", "miner@example.com", Role::User, Audience::User)
            .unwrap();

        let claims = svc.verify(&token, Audience::User).unwrap();
        assert_eq!(claims.principal_id, "u-1");
        assert_eq!(claims.email, "miner@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.aud, "user-app");
        assert_eq!(claims.audience_type, "user-app");
        assert_eq!(claims.iss, svc.issuer());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_pair_audience_per_role() {
        let svc = service();

        for (role, expected_aud) in [
            (Role::User, "user-app"),
            (Role::Admin, "admin-app"),
            (Role::SuperAdmin, "admin-app"),
        ] {
            let pair = svc.issue_token_pair("u-1", "a@example.com", role).unwrap();

            let access_audience = Audience::for_role(role);
            let access = svc.verify(&pair.access_token, access_audience).unwrap();
            assert_eq!(access.aud, expected_aud, "role {role}");

            // Refresh tokens verify only against the refresh audience,
            // under the admin signing domain, for every role.
            let refresh = svc.verify_refresh_token(&pair.refresh_token).unwrap();
            assert_eq!(refresh.aud, "refresh-token", "role {role}");
        }
    }

    #[test]
    fn cross_audience_rejection() {
        let svc = service();

        let user_token = svc
            .issue_access_token("u-1", "u@example.com", Role::User, Audience::User)
            .unwrap();
        let admin_token = svc
            .issue_access_token("a-1", "a@example.com", Role::Admin, Audience::Admin)
            .unwrap();

        // Wrong expected audience (which also means the wrong secret is
        // tried): both directions must fail.
        assert_eq!(
            svc.verify(&user_token, Audience::Admin),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            svc.verify(&admin_token, Audience::User),
            Err(AuthError::InvalidToken)
        );

        // Correct secret but wrong expected-audience string: an admin-signed
        // refresh token shares the admin secret, so this isolates the
        // audience check from the signature check.
        let refresh = svc
            .issue_refresh_token("a-1", "a@example.com", Role::Admin)
            .unwrap();
        assert_eq!(
            svc.verify(&refresh, Audience::Admin),
            Err(AuthError::InvalidToken)
        );
        assert!(svc.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn wrong_secret_entirely_fails() {
        let svc = service();
        let mut other_settings = AuthSettings::for_tests();
        other_settings.user_token_secret = "a-completely-different-secret".to_string();
        let other = TokenService::new(&other_settings);

        let token = other
            .issue_access_token("u-1", "u@example.com", Role::User, Audience::User)
            .unwrap();
        assert_eq!(svc.verify(&token, Audience::User), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expiry_boundary_is_exact() {
        let svc = service();
        let now = Utc::now().timestamp();

        // Hand-craft tokens on either side of the boundary.
        let make = |exp: i64| {
            let claims = TokenClaims {
                principal_id: "u-1".to_string(),
                email: "u@example.com".to_string(),
                role: Role::User,
                audience_type: "user-app".to_string(),
                aud: "user-app".to_string(),
                iss: svc.issuer().to_string(),
                iat: now - 60,
                exp,
            };
            encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(b"user-test-secret"),
            )
            .unwrap()
        };

        // One minute in the past: must fail even with zero clock drift.
        let expired = make(now - 60);
        assert_eq!(svc.verify(&expired, Audience::User), Err(AuthError::InvalidToken));

        // Comfortably in the future: must pass.
        let live = make(now + 5);
        assert!(svc.verify(&live, Audience::User).is_ok());
    }

    #[test]
    fn wrong_issuer_fails() {
        let svc = service();
        let mut other_settings = AuthSettings::for_tests();
        other_settings.issuer = "someone-else".to_string();
        let other = TokenService::new(&other_settings);

        // Same secrets, different issuer claim.
        let token = other
            .issue_access_token("u-1", "u@example.com", Role::User, Audience::User)
            .unwrap();
        assert_eq!(svc.verify(&token, Audience::User), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_fails() {
        let svc = service();
        let token = svc
            .issue_access_token("u-1", "u@example.com", Role::User, Audience::User)
            .unwrap();

        // Swap the payload segment for one claiming a different subject.
        let parts: Vec<&str> = token.split('.').collect();
        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        let mut forged = payload.clone();
        forged["principalId"] = serde_json::Value::String("someone-else".to_string());
        let forged_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}.{}", parts[0], forged_b64, parts[2]);

        assert_eq!(
            svc.verify(&forged_token, Audience::User),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn malformed_tokens_fail_uniformly() {
        let svc = service();
        for garbage in ["", "not-a-token", "a.b", "a.b.c.d", "a.b.c"] {
            assert_eq!(
                svc.verify(garbage, Audience::User),
                Err(AuthError::InvalidToken),
                "token {garbage:?}"
            );
        }
    }
}
