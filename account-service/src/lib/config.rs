use std::env;
use std::path::PathBuf;

use auth::IssuerSettings;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::account::service::LinkSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub urls: UrlsConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
}

impl JwtConfig {
    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            private_key_path: self.private_key_path.clone(),
            public_key_path: self.public_key_path.clone(),
            access_token_lifetime: chrono::Duration::minutes(self.access_token_minutes),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UrlsConfig {
    /// Public origin of the service, used for emailed links and problem types.
    pub base_url: String,
    #[serde(default = "default_base_error_url")]
    pub base_error_url: String,
    #[serde(default = "default_auth_api_url")]
    pub auth_api_url: String,
}

impl UrlsConfig {
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings::new(self.base_url.clone(), self.auth_api_url.clone())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_minutes() -> i64 {
    30
}

fn default_base_error_url() -> String {
    "errors".to_string()
}

fn default_auth_api_url() -> String {
    "auth".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, EMAIL__API_KEY, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // EMAIL__API_KEY=... overrides email.api_key
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
