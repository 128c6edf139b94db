// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Client-resident session state.
//!
//! [`AuthSession`] owns the client's copy of the token pair and principal
//! projection, exposes a reactive snapshot to the UI layer, and performs
//! the housekeeping around login, logout, bootstrap re-validation, and the
//! refresh exchange. It has an explicit `init`/`teardown` lifecycle rather
//! than initializing on first use.
//!
//! Storage invariant: the three stored values (`authToken`, `refreshToken`,
//! `user`) are written and cleared together, never partially.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

use super::api::{AuthApi, ClientError};

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "authToken";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the cached principal projection.
pub const USER_KEY: &str = "user";

/// The client's persisted credential set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub principal: UserProfile,
}

/// Client-side persistence for credentials.
///
/// `clear` removes everything or nothing; implementations must not leave a
/// partial credential set behind.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<StoredCredentials>;
    fn save(&self, credentials: &StoredCredentials);
    fn clear(&self);
}

/// In-memory credential store keyed like browser storage.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<StoredCredentials> {
        let entries = self.entries.lock().unwrap();
        let access_token = entries.get(ACCESS_TOKEN_KEY)?.clone();
        let refresh_token = entries.get(REFRESH_TOKEN_KEY)?.clone();
        let principal = serde_json::from_str(entries.get(USER_KEY)?).ok()?;
        Some(StoredCredentials {
            access_token,
            refresh_token,
            principal,
        })
    }

    fn save(&self, credentials: &StoredCredentials) {
        let principal = match serde_json::to_string(&credentials.principal) {
            Ok(json) => json,
            Err(_) => return,
        };
        let mut entries = self.entries.lock().unwrap();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), credentials.access_token.clone());
        entries.insert(
            REFRESH_TOKEN_KEY.to_string(),
            credentials.refresh_token.clone(),
        );
        entries.insert(USER_KEY.to_string(), principal);
    }

    fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(ACCESS_TOKEN_KEY);
        entries.remove(REFRESH_TOKEN_KEY);
        entries.remove(USER_KEY);
    }
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// `init` has not completed yet.
    Loading,
    /// No credentials.
    Anonymous,
    /// Credentials validated against the server.
    Authenticated,
    /// Credentials were present but expired; re-authentication required.
    Expired,
}

/// Immutable view of the session handed to the UI layer and the guards.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub principal: Option<UserProfile>,
    /// Access-token expiry (Unix seconds), when authenticated.
    pub access_expires_at: Option<i64>,
}

/// Outcome of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new pair was stored.
    Refreshed,
    /// Another refresh was already in flight; no network call was made.
    AlreadyInFlight,
    /// There was nothing to refresh.
    NotAuthenticated,
    /// The exchange was refused; local state has been cleared.
    ReauthRequired,
}

/// Read a token's `exp` claim without verifying the signature.
///
/// The client cannot verify HMAC signatures (it holds no secret) and never
/// trusts this value for authorization; it is scheduling input only.
pub fn token_expiry(token: &str) -> Option<i64> {
    #[derive(Deserialize)]
    struct ExpOnly {
        exp: i64,
    }
    jsonwebtoken::dangerous::insecure_decode::<ExpOnly>(token)
        .ok()
        .map(|data| data.claims.exp)
}

/// The client-resident auth state machine.
pub struct AuthSession<A: AuthApi, S: CredentialStore> {
    api: A,
    store: S,
    status: RwLock<SessionStatus>,
    principal: RwLock<Option<UserProfile>>,
    access_expires_at: RwLock<Option<i64>>,
    /// Unix seconds of the last recorded user activity.
    last_activity: RwLock<i64>,
    /// Guard against two concurrent refresh exchanges consuming the same
    /// refresh token.
    refresh_in_flight: AtomicBool,
}

impl<A: AuthApi, S: CredentialStore> AuthSession<A, S> {
    /// Create a session in the `Loading` state. Call [`init`](Self::init)
    /// before reading snapshots.
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            status: RwLock::new(SessionStatus::Loading),
            principal: RwLock::new(None),
            access_expires_at: RwLock::new(None),
            last_activity: RwLock::new(Utc::now().timestamp()),
            refresh_in_flight: AtomicBool::new(false),
        }
    }

    /// Bootstrap from storage.
    ///
    /// Stored credentials are never trusted on their own: the profile
    /// endpoint must confirm them, and any failure clears everything.
    pub async fn init(&self) {
        let Some(credentials) = self.store.load() else {
            self.set_state(SessionStatus::Anonymous, None, None);
            return;
        };

        match self.api.profile(&credentials.access_token).await {
            Ok(profile) => {
                // Re-save so the cached projection tracks the server.
                let refreshed = StoredCredentials {
                    principal: profile.clone(),
                    ..credentials.clone()
                };
                self.store.save(&refreshed);
                self.set_state(
                    SessionStatus::Authenticated,
                    Some(profile),
                    token_expiry(&credentials.access_token),
                );
            }
            Err(_) => {
                self.store.clear();
                self.set_state(SessionStatus::Anonymous, None, None);
            }
        }
    }

    /// Log in, storing the returned pair and principal on success.
    ///
    /// The error is already uniform ([`ClientError::InvalidCredentials`])
    /// whatever the server-side cause was.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let payload = self.api.login(email, password).await?;

        let credentials = StoredCredentials {
            access_token: payload.tokens.access_token.clone(),
            refresh_token: payload.tokens.refresh_token.clone(),
            principal: payload.user.clone(),
        };
        self.store.save(&credentials);
        self.set_state(
            SessionStatus::Authenticated,
            Some(payload.user.clone()),
            token_expiry(&payload.tokens.access_token),
        );
        self.record_activity();

        Ok(payload.user)
    }

    /// Log out: best-effort server invalidation, then unconditional local
    /// clearing. The local clear never depends on the network call.
    pub async fn logout(&self) {
        if let Some(credentials) = self.store.load() {
            let _ = self.api.logout(&credentials.access_token).await;
        }
        self.store.clear();
        self.set_state(SessionStatus::Anonymous, None, None);
    }

    /// Note user activity; the refresh scheduler only renews tokens for
    /// recently active users.
    pub fn record_activity(&self) {
        *self.last_activity.write().unwrap() = Utc::now().timestamp();
    }

    /// Unix seconds of the last recorded activity.
    pub fn last_activity(&self) -> i64 {
        *self.last_activity.read().unwrap()
    }

    /// Current view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: *self.status.read().unwrap(),
            principal: self.principal.read().unwrap().clone(),
            access_expires_at: *self.access_expires_at.read().unwrap(),
        }
    }

    /// Exchange the stored refresh token for a fresh pair.
    ///
    /// Idempotent under concurrency: the in-flight flag ensures two
    /// near-simultaneous triggers produce exactly one network call; the
    /// loser returns [`RefreshOutcome::AlreadyInFlight`] untouched.
    pub async fn try_refresh(&self) -> RefreshOutcome {
        let Some(credentials) = self.store.load() else {
            return RefreshOutcome::NotAuthenticated;
        };

        if self
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return RefreshOutcome::AlreadyInFlight;
        }

        let outcome = match self.api.refresh(&credentials.refresh_token).await {
            Ok(payload) => {
                let fresh = StoredCredentials {
                    access_token: payload.tokens.access_token.clone(),
                    refresh_token: payload.tokens.refresh_token.clone(),
                    principal: payload.user.clone(),
                };
                self.store.save(&fresh);
                self.set_state(
                    SessionStatus::Authenticated,
                    Some(payload.user),
                    token_expiry(&payload.tokens.access_token),
                );
                RefreshOutcome::Refreshed
            }
            Err(_) => {
                self.store.clear();
                self.set_state(SessionStatus::Expired, None, None);
                RefreshOutcome::ReauthRequired
            }
        };

        self.refresh_in_flight.store(false, Ordering::Release);
        outcome
    }

    /// Force the session into the expired state, clearing storage. Used by
    /// the scheduler when it finds the access token already dead.
    pub fn expire(&self) {
        self.store.clear();
        self.set_state(SessionStatus::Expired, None, None);
    }

    /// Drop the reactive state. Stored credentials survive so the next
    /// `init` can re-validate them.
    pub fn teardown(&self) {
        self.set_state(SessionStatus::Loading, None, None);
    }

    fn set_state(
        &self,
        status: SessionStatus,
        principal: Option<UserProfile>,
        expires_at: Option<i64>,
    ) {
        *self.status.write().unwrap() = status;
        *self.principal.write().unwrap() = principal;
        *self.access_expires_at.write().unwrap() = expires_at;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::auth::Role;
    use crate::models::{AuthPayload, UserProfile};

    use super::super::api::{AuthApi, ClientError};

    pub fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            username: id.to_string(),
            role: Role::User,
            email_verified: true,
        }
    }

    pub fn payload(id: &str, access: &str, refresh: &str) -> AuthPayload {
        AuthPayload {
            tokens: crate::auth::TokenPair {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
            },
            user: profile(id),
        }
    }

    /// Scripted collaborator counting calls per method.
    pub struct MockApi {
        pub login_result: Mutex<Result<AuthPayload, ClientError>>,
        pub refresh_result: Mutex<Result<AuthPayload, ClientError>>,
        pub profile_result: Mutex<Result<UserProfile, ClientError>>,
        pub logout_result: Mutex<Result<(), ClientError>>,
        pub refresh_calls: AtomicUsize,
        pub logout_calls: AtomicUsize,
        /// Artificial latency inside `refresh`, to force overlap in
        /// concurrency tests.
        pub refresh_delay: Duration,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self {
                login_result: Mutex::new(Err(ClientError::InvalidCredentials)),
                refresh_result: Mutex::new(Err(ClientError::Unauthorized)),
                profile_result: Mutex::new(Err(ClientError::Unauthorized)),
                logout_result: Mutex::new(Ok(())),
                refresh_calls: AtomicUsize::new(0),
                logout_calls: AtomicUsize::new(0),
                refresh_delay: Duration::ZERO,
            }
        }
    }

    impl AuthApi for &MockApi {
        async fn login(&self, _email: &str, _password: &str) -> Result<AuthPayload, ClientError> {
            self.login_result.lock().unwrap().clone()
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthPayload, ClientError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if !self.refresh_delay.is_zero() {
                tokio::time::sleep(self.refresh_delay).await;
            }
            self.refresh_result.lock().unwrap().clone()
        }

        async fn logout(&self, _access_token: &str) -> Result<(), ClientError> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            self.logout_result.lock().unwrap().clone()
        }

        async fn profile(&self, _access_token: &str) -> Result<UserProfile, ClientError> {
            self.profile_result.lock().unwrap().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{payload, profile, MockApi};
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn stored(access: &str, refresh: &str) -> StoredCredentials {
        StoredCredentials {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            principal: profile("u-1"),
        }
    }

    #[test]
    fn memory_store_round_trips_and_clears_together() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().is_none());

        let credentials = stored("access-1", "refresh-1");
        store.save(&credentials);
        assert_eq!(store.load().unwrap(), credentials);

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn token_expiry_reads_exp_without_verifying() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(br#"{"exp":1800000000}"#);
        let token = format!("{header}.{claims}.not-a-real-signature");

        assert_eq!(token_expiry(&token), Some(1_800_000_000));
        assert_eq!(token_expiry("garbage"), None);
    }

    #[tokio::test]
    async fn init_without_credentials_is_anonymous() {
        let api = MockApi::new();
        let session = AuthSession::new(&api, MemoryCredentialStore::new());

        assert_eq!(session.snapshot().status, SessionStatus::Loading);
        session.init().await;
        assert_eq!(session.snapshot().status, SessionStatus::Anonymous);
    }

    #[tokio::test]
    async fn init_validates_stored_credentials_with_server() {
        let api = MockApi::new();
        *api.profile_result.lock().unwrap() = Ok(profile("u-cached"));

        let store = MemoryCredentialStore::new();
        store.save(&stored("access-1", "refresh-1"));

        let session = AuthSession::new(&api, store);
        session.init().await;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Authenticated);
        assert_eq!(snapshot.principal.unwrap().id, "u-cached");
    }

    #[tokio::test]
    async fn init_clears_everything_when_validation_fails() {
        let api = MockApi::new();
        // profile_result defaults to Unauthorized

        let store = MemoryCredentialStore::new();
        store.save(&stored("stale-access", "stale-refresh"));

        let session = AuthSession::new(&api, store);
        session.init().await;

        assert_eq!(session.snapshot().status, SessionStatus::Anonymous);
        assert!(session.store.load().is_none());
    }

    #[tokio::test]
    async fn login_stores_pair_and_principal() {
        let api = MockApi::new();
        *api.login_result.lock().unwrap() = Ok(payload("u-login", "access-2", "refresh-2"));

        let session = AuthSession::new(&api, MemoryCredentialStore::new());
        let user = session.login("u-login@example.com", "pw").await.unwrap();

        assert_eq!(user.id, "u-login");
        assert_eq!(session.snapshot().status, SessionStatus::Authenticated);
        let saved = session.store.load().unwrap();
        assert_eq!(saved.access_token, "access-2");
        assert_eq!(saved.refresh_token, "refresh-2");
    }

    #[tokio::test]
    async fn login_failure_surfaces_uniform_error() {
        let api = MockApi::new();
        let session = AuthSession::new(&api, MemoryCredentialStore::new());

        let err = session.login("who@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(session.snapshot().principal, None);
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_call_fails() {
        let api = MockApi::new();
        *api.login_result.lock().unwrap() = Ok(payload("u-out", "access-3", "refresh-3"));
        *api.logout_result.lock().unwrap() = Err(ClientError::Network("offline".to_string()));

        let session = AuthSession::new(&api, MemoryCredentialStore::new());
        session.login("u-out@example.com", "pw").await.unwrap();

        session.logout().await;

        assert_eq!(api.logout_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(session.snapshot().status, SessionStatus::Anonymous);
        assert!(session.store.load().is_none());
    }

    #[tokio::test]
    async fn refresh_success_rotates_stored_pair() {
        let api = MockApi::new();
        *api.login_result.lock().unwrap() = Ok(payload("u-r", "old-access", "old-refresh"));
        *api.refresh_result.lock().unwrap() = Ok(payload("u-r", "new-access", "new-refresh"));

        let session = AuthSession::new(&api, MemoryCredentialStore::new());
        session.login("u-r@example.com", "pw").await.unwrap();

        assert_eq!(session.try_refresh().await, RefreshOutcome::Refreshed);
        let saved = session.store.load().unwrap();
        assert_eq!(saved.access_token, "new-access");
        assert_eq!(saved.refresh_token, "new-refresh");
    }

    #[tokio::test]
    async fn refresh_failure_expires_session() {
        let api = MockApi::new();
        *api.login_result.lock().unwrap() = Ok(payload("u-x", "a", "r"));
        // refresh_result defaults to Unauthorized

        let session = AuthSession::new(&api, MemoryCredentialStore::new());
        session.login("u-x@example.com", "pw").await.unwrap();

        assert_eq!(session.try_refresh().await, RefreshOutcome::ReauthRequired);
        assert_eq!(session.snapshot().status, SessionStatus::Expired);
        assert!(session.store.load().is_none());
    }

    #[tokio::test]
    async fn concurrent_refresh_triggers_issue_one_network_call() {
        let api = Box::leak(Box::new(MockApi::new()));
        *api.login_result.lock().unwrap() = Ok(payload("u-c", "a", "r"));
        *api.refresh_result.lock().unwrap() = Ok(payload("u-c", "a2", "r2"));
        api.refresh_delay = Duration::from_millis(50);

        let session = Arc::new(AuthSession::new(&*api, MemoryCredentialStore::new()));
        session.login("u-c@example.com", "pw").await.unwrap();

        let first = session.clone();
        let second = session.clone();
        let (a, b) = tokio::join!(first.try_refresh(), second.try_refresh());

        // Exactly one trigger reached the network; the other backed off.
        assert_eq!(api.refresh_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        let outcomes = [a, b];
        assert!(outcomes.contains(&RefreshOutcome::Refreshed));
        assert!(outcomes.contains(&RefreshOutcome::AlreadyInFlight));
    }

    #[tokio::test]
    async fn teardown_keeps_stored_credentials() {
        let api = MockApi::new();
        *api.login_result.lock().unwrap() = Ok(payload("u-t", "a", "r"));

        let session = AuthSession::new(&api, MemoryCredentialStore::new());
        session.login("u-t@example.com", "pw").await.unwrap();

        session.teardown();
        assert_eq!(session.snapshot().status, SessionStatus::Loading);
        // Storage survives for the next init to re-validate.
        assert!(session.store.load().is_some());
    }
}
