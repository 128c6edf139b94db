// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! # Client Session Module
//!
//! The client-resident half of the auth lifecycle, embedded by the user
//! and admin applications:
//!
//! - [`store::AuthSession`] - owns the stored token pair and principal
//!   projection, with an explicit `init`/`teardown` lifecycle
//! - [`api::HttpAuthApi`] - network collaborator against the platform API
//! - [`refresh::RefreshScheduler`] - proactive, activity-aware token
//!   renewal on a plain repeating timer
//! - [`guard::guard_route`] - synchronous pre-navigation check producing
//!   login redirects with the original route preserved
//!
//! The pieces are wired explicitly:
//!
//! ```rust,ignore
//! let session = Arc::new(AuthSession::new(
//!     HttpAuthApi::new(base_url),
//!     MemoryCredentialStore::new(),
//! ));
//! session.init().await;
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(
//!     RefreshScheduler::new(session.clone(), RefreshPolicy::default())
//!         .run(shutdown.clone()),
//! );
//! ```

pub mod api;
pub mod guard;
pub mod refresh;
pub mod store;

pub use api::{AuthApi, ClientError, HttpAuthApi};
pub use guard::{guard_route, RouteDecision};
pub use refresh::{evaluate_refresh, RefreshDecision, RefreshPolicy, RefreshScheduler};
pub use store::{
    AuthSession, CredentialStore, MemoryCredentialStore, RefreshOutcome, SessionSnapshot,
    SessionStatus, StoredCredentials,
};
