// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Route guarding for protected views.
//!
//! A synchronous check over the session snapshot, run before rendering any
//! protected route. Unauthenticated and expired sessions both redirect to
//! the login route with the original path preserved for post-login
//! redirect; only expired sessions add the `expired` flag, which the login
//! view uses to show a distinct "session expired" message. Absent
//! credentials never get that flag.

use url::form_urlencoded;

use super::store::{SessionSnapshot, SessionStatus};

/// Route the login view lives at.
const LOGIN_ROUTE: &str = "/login";

/// What to do with a navigation to a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested view.
    Allow,
    /// Navigate to this location instead.
    Redirect(String),
}

fn login_redirect(requested_path: &str, expired: bool) -> RouteDecision {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("redirect", requested_path);
    if expired {
        query.append_pair("expired", "true");
    }
    RouteDecision::Redirect(format!("{LOGIN_ROUTE}?{}", query.finish()))
}

/// Guard a navigation to `requested_path` at `now` (Unix seconds).
pub fn guard_route(snapshot: &SessionSnapshot, now: i64, requested_path: &str) -> RouteDecision {
    match snapshot.status {
        SessionStatus::Authenticated => match snapshot.access_expires_at {
            Some(expires_at) if expires_at > now => RouteDecision::Allow,
            // Token died since the last scheduler tick.
            _ => login_redirect(requested_path, true),
        },
        SessionStatus::Expired => login_redirect(requested_path, true),
        SessionStatus::Loading | SessionStatus::Anonymous => {
            login_redirect(requested_path, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::test_support::profile;

    fn snapshot(status: SessionStatus, expires_at: Option<i64>) -> SessionSnapshot {
        SessionSnapshot {
            status,
            principal: matches!(status, SessionStatus::Authenticated).then(|| profile("u-1")),
            access_expires_at: expires_at,
        }
    }

    #[test]
    fn live_session_is_allowed() {
        let decision = guard_route(
            &snapshot(SessionStatus::Authenticated, Some(1_000_600)),
            1_000_000,
            "/dashboard",
        );
        assert_eq!(decision, RouteDecision::Allow);
    }

    #[test]
    fn anonymous_redirects_without_expired_flag() {
        let decision = guard_route(
            &snapshot(SessionStatus::Anonymous, None),
            1_000_000,
            "/dashboard",
        );
        assert_eq!(
            decision,
            RouteDecision::Redirect("/login?redirect=%2Fdashboard".to_string())
        );
    }

    #[test]
    fn expired_session_redirects_with_expired_flag() {
        let decision = guard_route(
            &snapshot(SessionStatus::Expired, None),
            1_000_000,
            "/investments/new",
        );
        assert_eq!(
            decision,
            RouteDecision::Redirect(
                "/login?redirect=%2Finvestments%2Fnew&expired=true".to_string()
            )
        );
    }

    #[test]
    fn stale_token_behind_authenticated_status_counts_as_expired() {
        // The scheduler has not run yet, but the token is already dead.
        let decision = guard_route(
            &snapshot(SessionStatus::Authenticated, Some(999_999)),
            1_000_000,
            "/wallet",
        );
        assert_eq!(
            decision,
            RouteDecision::Redirect("/login?redirect=%2Fwallet&expired=true".to_string())
        );
    }

    #[test]
    fn redirect_preserves_query_in_original_path() {
        let decision = guard_route(
            &snapshot(SessionStatus::Anonymous, None),
            1_000_000,
            "/plans?tier=pro",
        );
        assert_eq!(
            decision,
            RouteDecision::Redirect("/login?redirect=%2Fplans%3Ftier%3Dpro".to_string())
        );
    }
}
