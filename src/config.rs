// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once at startup into
//! explicit settings structs. Every component that needs a secret or a TTL
//! receives it at construction time; nothing reads the environment after
//! boot.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `USER_TOKEN_SECRET` | HS256 secret for user-audience access tokens | Required |
//! | `ADMIN_TOKEN_SECRET` | HS256 secret for admin-audience access tokens and all refresh tokens | Required |
//! | `TOKEN_ISSUER` | Issuer claim stamped on and required of every token | `minepool-platform` |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime in seconds | `3600` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime in seconds | `604800` |
//! | `BCRYPT_COST` | bcrypt cost factor for credential digests | `12` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::time::Duration;

/// Environment variable name for the persistent data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Default issuer claim when `TOKEN_ISSUER` is unset.
pub const DEFAULT_ISSUER: &str = "minepool-platform";

/// Lowest bcrypt cost the service will accept; configured values below this
/// are raised to it.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Errors raised while loading settings from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Signing secrets, token lifetimes, and hashing cost for the auth core.
///
/// The two secrets are deliberately distinct: user-audience access tokens
/// are signed with `user_token_secret`, admin-audience access tokens with
/// `admin_token_secret`. Refresh tokens are always signed with the admin
/// secret, whichever audience the principal belongs to.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HS256 secret for `user-app` audience tokens.
    pub user_token_secret: String,
    /// HS256 secret for `admin-app` audience tokens and all refresh tokens.
    pub admin_token_secret: String,
    /// Issuer claim stamped on every token and required at verification.
    pub issuer: String,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// bcrypt cost factor for credential digests.
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    /// Load auth settings from the environment.
    ///
    /// Both signing secrets are required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_token_secret =
            env::var("USER_TOKEN_SECRET").map_err(|_| ConfigError::MissingVar("USER_TOKEN_SECRET"))?;
        let admin_token_secret = env::var("ADMIN_TOKEN_SECRET")
            .map_err(|_| ConfigError::MissingVar("ADMIN_TOKEN_SECRET"))?;

        Ok(Self {
            user_token_secret,
            admin_token_secret,
            issuer: env::var("TOKEN_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
            access_ttl: Duration::from_secs(parse_secs("ACCESS_TOKEN_TTL_SECS", 3600)?),
            refresh_ttl: Duration::from_secs(parse_secs("REFRESH_TOKEN_TTL_SECS", 604_800)?),
            bcrypt_cost: parse_secs("BCRYPT_COST", 12)?.max(u64::from(MIN_BCRYPT_COST)) as u32,
        })
    }

    /// Fixed settings for tests: default TTLs, minimum hashing cost.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            user_token_secret: "user-test-secret".to_string(),
            admin_token_secret: "admin-test-secret".to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(604_800),
            // Minimum cost keeps hashing-heavy tests fast.
            bcrypt_cost: MIN_BCRYPT_COST,
        }
    }
}

/// Bind address and storage location for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
}

impl ServerSettings {
    /// Load server settings from the environment. All fields have defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidVar {
                var: "PORT",
                reason: e.to_string(),
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            data_dir: env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
        })
    }
}

fn parse_secs(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidVar {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
