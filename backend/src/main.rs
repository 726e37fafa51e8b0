use backend::{
    config::AppConfig,
    db::Database,
    keep_alive::KeepAlive,
    web_server::{run_server, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- Setup ---
    // 1. Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load configuration (.env, Config.toml, environment)
    let config = AppConfig::from_env()?;

    // 3. Connect to MongoDB in the background; the server listens regardless.
    let db = Database::new();
    {
        let db = db.clone();
        let db_config = config.database.clone();
        tokio::spawn(async move {
            if let Err(e) = db.connect(&db_config).await {
                tracing::error!("Giving up on MongoDB, database routes will fail: {}", e);
            }
        });
    }

    // 4. Optional self-ping for hosts that suspend idle services
    match KeepAlive::from_config(reqwest::Client::new(), &config.keep_alive) {
        Some(keep_alive) => {
            keep_alive.spawn();
        }
        None => tracing::info!("Keep-alive disabled"),
    }

    // --- Run Server ---
    let app_state = AppState::new(config, db)?;
    run_server(app_state).await?;
    Ok(())
}
