// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! # Proactive Token Refresh
//!
//! Background task that renews the access token before it expires, so
//! in-flight work is never interrupted by a 401. Decoupled from any UI
//! lifecycle: the decision is a pure function of `(now, token expiry, last
//! activity)`, and the scheduler is a plain repeating timer driving it.
//!
//! ## Strategy
//!
//! Every `check_interval` (default 30 s) the scheduler:
//! 1. Reads the session snapshot.
//! 2. Applies [`evaluate_refresh`]: refresh when the token is inside the
//!    refresh threshold AND the user was recently active; force
//!    re-authentication when the token is already dead.
//! 3. Hands `Refresh` decisions to the session's guarded exchange, which
//!    tolerates overlapping triggers.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful teardown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::api::AuthApi;
use super::store::{AuthSession, CredentialStore, SessionStatus};

/// Tuning for the refresh loop.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Renew when remaining token lifetime drops to this or below.
    pub refresh_threshold: Duration,
    /// Only renew for users active within this window.
    pub activity_window: Duration,
    /// How often the scheduler wakes up.
    pub check_interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            refresh_threshold: Duration::from_secs(5 * 60),
            activity_window: Duration::from_secs(15 * 60),
            check_interval: Duration::from_secs(30),
        }
    }
}

/// What a scheduler tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// Token healthy or user idle; do nothing.
    Stay,
    /// Token close to expiry and user active; renew now.
    Refresh,
    /// Token already expired; clear state and force a new login.
    Reauthenticate,
}

/// Decide what to do about the access token at `now` (Unix seconds).
///
/// Pure; the scheduler and the tests share it.
pub fn evaluate_refresh(
    now: i64,
    expires_at: Option<i64>,
    last_activity: i64,
    policy: &RefreshPolicy,
) -> RefreshDecision {
    let Some(expires_at) = expires_at else {
        return RefreshDecision::Stay;
    };

    if expires_at <= now {
        return RefreshDecision::Reauthenticate;
    }

    let remaining = (expires_at - now) as u64;
    let idle = now.saturating_sub(last_activity) as u64;

    if remaining <= policy.refresh_threshold.as_secs() && idle <= policy.activity_window.as_secs() {
        RefreshDecision::Refresh
    } else {
        RefreshDecision::Stay
    }
}

/// Background refresh loop over an [`AuthSession`].
pub struct RefreshScheduler<A: AuthApi, S: CredentialStore> {
    session: Arc<AuthSession<A, S>>,
    policy: RefreshPolicy,
}

impl<A: AuthApi, S: CredentialStore> RefreshScheduler<A, S> {
    /// Create a scheduler with the given policy.
    pub fn new(session: Arc<AuthSession<A, S>>, policy: RefreshPolicy) -> Self {
        Self { session, policy }
    }

    /// Run the loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(scheduler.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.policy.check_interval.as_secs(),
            "token refresh scheduler starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("token refresh scheduler shutting down");
                return;
            }

            self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(self.policy.check_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("token refresh scheduler shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one check. Public so hosts with their own timers can drive it.
    pub async fn tick(&self) {
        let snapshot = self.session.snapshot();
        if snapshot.status != SessionStatus::Authenticated {
            return;
        }

        let decision = evaluate_refresh(
            Utc::now().timestamp(),
            snapshot.access_expires_at,
            self.session.last_activity(),
            &self.policy,
        );

        match decision {
            RefreshDecision::Stay => {}
            RefreshDecision::Refresh => {
                let outcome = self.session.try_refresh().await;
                debug!(?outcome, "proactive refresh attempted");
            }
            RefreshDecision::Reauthenticate => {
                info!("access token expired while idle; forcing re-authentication");
                self.session.expire();
            }
        }
    }
}
