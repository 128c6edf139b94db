// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

use std::env;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use minepool_server::api::router;
use minepool_server::auth::TokenService;
use minepool_server::config::{AuthSettings, ServerSettings};
use minepool_server::state::AppState;
use minepool_server::storage::{FileStore, StoragePaths};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let server_settings = ServerSettings::from_env().expect("invalid server configuration");
    let auth_settings = AuthSettings::from_env().expect("invalid auth configuration");

    // Initialize storage
    let mut store = FileStore::new(StoragePaths::new(&server_settings.data_dir));
    store.initialize().expect("failed to initialize storage");

    let tokens = TokenService::new(&auth_settings);
    let state = AppState::new(store, tokens, auth_settings.bcrypt_cost);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", server_settings.host, server_settings.port)
        .parse()
        .expect("failed to parse bind address");

    tracing::info!(%addr, "MinePool server listening (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server failed");
}
