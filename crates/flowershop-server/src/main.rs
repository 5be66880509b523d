mod api;
mod media;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(flowershop_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = flowershop_db::PoolConfig::from_app_config(&config);
    let pool = flowershop_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = flowershop_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    tokio::fs::create_dir_all(&config.media_root).await?;
    if config.bot_secret.is_none() {
        tracing::warn!("FLOWERSHOP_BOT_SECRET not set; bot endpoints will reject every call");
    }

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    let auth = AuthState::from_env(config.is_development())?;
    let app = build_app(
        AppState {
            pool,
            config: Arc::clone(&config),
        },
        auth,
        default_rate_limit_state(),
    );

    tracing::info!(addr = %config.bind_addr, env = %config.env, "flowershop server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
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
