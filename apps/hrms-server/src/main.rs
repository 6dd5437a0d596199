// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc};

use hrms_server::{
    accounts::{load_seed_file, InMemoryAccountStore},
    api::router,
    auth::{AccessPolicy, TokenCodec},
    config::AppConfig,
    logging::{init_tracing, LogFormat},
    state::AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    init_tracing(LogFormat::from_env());

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    let policy = match &config.access_policy_path {
        Some(path) => AccessPolicy::from_json_file(path)?,
        None => AccessPolicy::hrms_default()?,
    };
    tracing::info!(rules = policy.rules().len(), "Access policy loaded");

    let accounts = Arc::new(InMemoryAccountStore::new());
    if let Some(path) = &config.seed_accounts_path {
        let seeded = accounts.seed(load_seed_file(path)?).await?;
        tracing::info!(accounts = seeded, "Seeded account store");
    } else {
        tracing::warn!("No SEED_ACCOUNTS_PATH set; every login will fail");
    }

    let state = AppState::new(
        TokenCodec::new(&config.jwt_secret, config.token_validity),
        accounts,
        policy,
    );
    let app = router(state, &config.cors_allowed_origins);

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "HRMS server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
