mod config;
mod db;
mod routes;
mod services;
mod state;

use std::time::Duration;

use config::{ConfigError, ServerConfig};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;
    if config.admin.is_none() {
        tracing::warn!("ADMIN_PASSWORD_SHA256 not set; operator login and bulk delete disabled");
    }

    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    let port = config.port;
    services::session::spawn_purge_worker(pool.clone(), Duration::from_secs(config.session_purge_secs));

    let state = state::AppState::new(pool, config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "registros listening");
    axum::serve(listener, app).await?;
    Ok(())
}
