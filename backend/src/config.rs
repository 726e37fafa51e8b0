use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dotenvy::dotenv;

use crate::routes::RouteModule;

/// Origins allowed to make credentialed cross-origin requests.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "https://pet-frontend-tau.vercel.app",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("MONGO_URI must be set")]
    MissingDatabaseUri,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    pub addr: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub uploads_dir: String,
    pub max_body_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
            uploads_dir: "uploads".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub server_selection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            max_retries: 5,
            retry_backoff_ms: 500,
            server_selection_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub interval_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            interval_secs: 600,
        }
    }
}

impl KeepAliveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Base URLs of the services that own each route module.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct UpstreamConfig {
    pub auth: Option<String>,
    pub products: Option<String>,
    pub orders: Option<String>,
    pub cart: Option<String>,
    pub user: Option<String>,
    pub paypal: Option<String>,
    pub contact: Option<String>,
    pub admin: Option<String>,
    pub reviews: Option<String>,
}

impl UpstreamConfig {
    pub fn base_url(&self, module: RouteModule) -> Option<&str> {
        let url = match module {
            RouteModule::Auth => &self.auth,
            RouteModule::Products => &self.products,
            RouteModule::Orders => &self.orders,
            RouteModule::Cart => &self.cart,
            RouteModule::User => &self.user,
            RouteModule::Payments => &self.paypal,
            RouteModule::Contact => &self.contact,
            RouteModule::Admin => &self.admin,
            RouteModule::Reviews => &self.reviews,
        };
        url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn set_base_url(&mut self, module: RouteModule, url: impl Into<String>) {
        let slot = match module {
            RouteModule::Auth => &mut self.auth,
            RouteModule::Products => &mut self.products,
            RouteModule::Orders => &mut self.orders,
            RouteModule::Cart => &mut self.cart,
            RouteModule::User => &mut self.user,
            RouteModule::Payments => &mut self.paypal,
            RouteModule::Contact => &mut self.contact,
            RouteModule::Admin => &mut self.admin,
            RouteModule::Reviews => &mut self.reviews,
        };
        *slot = Some(url.into());
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub keep_alive: KeepAliveConfig,
    pub upstreams: UpstreamConfig,
}

impl AppConfig {
    /// Layers compiled defaults, `Config.toml`, `APP_`-prefixed variables
    /// and the platform variables `MONGO_URI`, `PORT` and `RENDER_EXTERNAL_URL`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("Config.toml")) // For non-sensitive defaults
            .merge(Env::prefixed("APP_").split("__")) // e.g., APP_UPSTREAMS__CART
            .merge(
                Env::raw()
                    .only(&["RENDER_EXTERNAL_URL"])
                    .map(|_| "keep_alive.url".into()),
            )
            .merge(Env::raw().only(&["MONGO_URI"]).map(|_| "database.uri".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "web.port".into()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract()?;
        if config.database.uri.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUri);
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = Self::from_figment(Self::figment())?;

        tracing::info!(
            port = config.web.port,
            origins = ?config.web.allowed_origins,
            uploads_dir = %config.web.uploads_dir,
            keep_alive = config.keep_alive.enabled && config.keep_alive.url.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_the_platform_contract() {
        Jail::expect_with(|jail| {
            jail.set_env("MONGO_URI", "mongodb://localhost:27017/pets");

            let config = AppConfig::from_figment(AppConfig::figment()).expect("config loads");
            assert_eq!(config.web.port, 5000);
            assert_eq!(config.web.addr, "0.0.0.0");
            assert_eq!(config.web.allowed_origins, DEFAULT_ALLOWED_ORIGINS);
            assert_eq!(config.database.uri, "mongodb://localhost:27017/pets");
            assert_eq!(config.keep_alive.interval_secs, 600);
            assert!(config.keep_alive.url.is_none());
            Ok(())
        });
    }

    #[test]
    fn port_and_render_url_come_from_raw_env() {
        Jail::expect_with(|jail| {
            jail.set_env("MONGO_URI", "mongodb://db");
            jail.set_env("PORT", "8081");
            jail.set_env("RENDER_EXTERNAL_URL", "https://pets.onrender.com");

            let config = AppConfig::from_figment(AppConfig::figment()).expect("config loads");
            assert_eq!(config.web.port, 8081);
            assert_eq!(
                config.keep_alive.url.as_deref(),
                Some("https://pets.onrender.com")
            );
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_and_toml_file_are_layered() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [web]
                uploads_dir = "/srv/uploads"

                [upstreams]
                products = "http://products.internal:7001"
                "#,
            )?;
            jail.set_env("MONGO_URI", "mongodb://db");
            jail.set_env("APP_UPSTREAMS__CART", "http://cart.internal:7002");
            jail.set_env("APP_KEEP_ALIVE__ENABLED", "false");

            let config = AppConfig::from_figment(AppConfig::figment()).expect("config loads");
            assert_eq!(config.web.uploads_dir, "/srv/uploads");
            assert_eq!(
                config.upstreams.base_url(RouteModule::Products),
                Some("http://products.internal:7001")
            );
            assert_eq!(
                config.upstreams.base_url(RouteModule::Cart),
                Some("http://cart.internal:7002")
            );
            assert_eq!(config.upstreams.base_url(RouteModule::Auth), None);
            assert!(!config.keep_alive.enabled);
            Ok(())
        });
    }

    #[test]
    fn missing_mongo_uri_is_rejected() {
        Jail::expect_with(|_jail| {
            let result = AppConfig::from_figment(AppConfig::figment());
            assert!(matches!(result, Err(ConfigError::MissingDatabaseUri)));
            Ok(())
        });
    }
}
