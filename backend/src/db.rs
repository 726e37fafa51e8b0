use std::{sync::Arc, time::Duration};

use common::DatabaseStatus;
use mongodb::{bson::doc, options::ClientOptions, Client};
use tokio::sync::RwLock;

use crate::{config::DatabaseConfig, error::AppError};

pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum Connection {
    Pending,
    Ready(Client),
    Failed(String),
}

/// Process-wide MongoDB handle. Created once, connected in the background,
/// dropped at process exit.
#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<RwLock<Connection>>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self {
            connection: Arc::new(RwLock::new(Connection::Pending)),
        }
    }

    /// Wraps an already built client, treating it as connected.
    pub fn from_client(client: Client) -> Self {
        Self {
            connection: Arc::new(RwLock::new(Connection::Ready(client))),
        }
    }

    pub async fn status(&self) -> DatabaseStatus {
        match &*self.connection.read().await {
            Connection::Pending => DatabaseStatus::Connecting,
            Connection::Ready(_) => DatabaseStatus::Connected,
            Connection::Failed(_) => DatabaseStatus::Disconnected,
        }
    }

    /// The last connection error, if the handle gave up connecting.
    pub async fn last_error(&self) -> Option<String> {
        match &*self.connection.read().await {
            Connection::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    pub async fn client(&self) -> Result<Client, AppError> {
        match &*self.connection.read().await {
            Connection::Ready(client) => Ok(client.clone()),
            _ => Err(AppError::DatabaseUnavailable),
        }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        let client = self.client().await?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Connects with exponential backoff. A final failure leaves the handle
    /// `Disconnected`; it never takes the process down.
    pub async fn connect(&self, config: &DatabaseConfig) -> Result<(), AppError> {
        let attempts = config.max_retries.saturating_add(1);
        let mut backoff = Duration::from_millis(config.retry_backoff_ms).min(MAX_BACKOFF);

        for attempt in 1..=attempts {
            match try_connect(config).await {
                Ok(client) => {
                    *self.connection.write().await = Connection::Ready(client);
                    tracing::info!("MongoDB connected");
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        retry_in_ms = backoff.as_millis() as u64,
                        "MongoDB connection error: {}",
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(e) => {
                    tracing::error!(attempt, attempts, "MongoDB connection error: {}", e);
                    *self.connection.write().await = Connection::Failed(e.to_string());
                    return Err(AppError::Database(e));
                }
            }
        }

        // attempts is never zero
        Err(AppError::DatabaseUnavailable)
    }
}

/// Builds a client from the connection string without touching the network.
pub async fn build_client(config: &DatabaseConfig) -> Result<Client, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.uri).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    Client::with_options(options)
}

async fn try_connect(config: &DatabaseConfig) -> Result<Client, mongodb::error::Error> {
    let client = build_client(config).await?;
    client.database("admin").run_command(doc! { "ping": 1 }).await?;
    Ok(client)
}
