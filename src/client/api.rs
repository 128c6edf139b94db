// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Network collaborator for the client session.
//!
//! The session state machine talks to the platform through the [`AuthApi`]
//! trait; [`HttpAuthApi`] is the production implementation. Tests swap in
//! mocks to drive failure paths without a server.

use std::future::Future;

use serde::Deserialize;
use url::Url;

use crate::models::{AuthPayload, UserProfile};

/// Errors surfaced to the client application.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    /// Login refused. One message for every cause, so the UI cannot leak
    /// whether the account exists.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// A presented token was refused.
    #[error("Session is no longer valid")]
    Unauthorized,
    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with something other than the envelope.
    #[error("Unexpected response: {0}")]
    Protocol(String),
}

/// Calls the client session makes against the platform.
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token pair and profile.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthPayload, ClientError>> + Send;

    /// Exchange a refresh token for a fresh pair.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<AuthPayload, ClientError>> + Send;

    /// Server-side session invalidation. Best-effort from the caller's
    /// point of view.
    fn logout(&self, access_token: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Fetch the current profile, validating the access token.
    fn profile(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: T,
}

/// HTTP implementation of [`AuthApi`] against the platform API.
pub struct HttpAuthApi {
    base: Url,
    http: reqwest::Client,
}

impl HttpAuthApi {
    /// Create a client for the API at `base` (e.g. `https://api.minepool.io/`).
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Protocol(format!("bad endpoint {path}: {e}")))
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::Protocol(format!("status {status}")));
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        Ok(envelope.data)
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/login")?)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        // Whatever the server's reason, the user sees one message.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }
        Self::parse(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthPayload, ClientError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/refresh")?)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::parse(response).await
    }

    async fn logout(&self, access_token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint("v1/auth/logout")?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let _: serde_json::Value = Self::parse(response).await?;
        Ok(())
    }

    async fn profile(&self, access_token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .get(self.endpoint("v1/auth/me")?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Self::parse(response).await
    }
}
