// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::TokenService;
use crate::storage::FileStore;

/// State threaded through every handler: the file store, the token
/// service, the hashing cost, and the process start time for uptime
/// reporting.
///
/// All shared pieces are immutable after construction (the store's
/// interior is the filesystem); the state is cloned per request with no
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub tokens: Arc<TokenService>,
    /// bcrypt cost factor for new credential digests.
    pub hash_cost: u32,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: FileStore, tokens: TokenService, hash_cost: u32) -> Self {
        Self {
            store: Arc::new(store),
            tokens: Arc::new(tokens),
            hash_cost,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
