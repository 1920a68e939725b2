mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = prospectdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = prospectdb_db::PoolConfig::from_app_config(&config);
    let pool = prospectdb_db::connect_pool(&config.database_url, pool_config).await?;
    prospectdb_db::run_migrations(&pool).await?;

    let traffic = match config.apify_token.as_deref() {
        Some(token) => Some(Arc::new(prospectdb_traffic::TrafficClient::new(
            token,
            config.traffic_timeout_secs,
        )?)),
        None => {
            tracing::warn!(
                "APIFY_TOKEN not set; traffic analysis requests will fail until configured"
            );
            None
        }
    };

    let auth = AuthState::from_env(matches!(
        config.env,
        prospectdb_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        traffic,
        home_country: config.home_country.clone(),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "prospectdb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
