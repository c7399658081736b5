mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use waypoint_core::Environment;
use waypoint_db::PgHistoryStore;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = waypoint_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pool_config = waypoint_db::PoolConfig::from_app_config(&config);
    let pool = waypoint_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = waypoint_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let providers = waypoint_geocode::build_providers(&config)?;
    let geocoder = providers.fallback_resolver();
    tracing::info!(providers = ?geocoder.provider_names(), "geocoding chain ready");

    let auth = AuthState::from_config(
        config.api_keys.as_deref(),
        config.env == Environment::Development,
    )?;
    let state = AppState {
        store: Arc::new(PgHistoryStore::new(pool)),
        geocoder,
        suggestions: Arc::new(providers.suggestion_source()),
        recents_limit: config.recents_display_limit,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "waypoint server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
