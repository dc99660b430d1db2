use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_DATA_DIR: &str = "data/order_analysis";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/api_database.db?mode=rwc";
const DEFAULT_LOAD_BATCH_SIZE: usize = 250;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the remote data API
    #[validate(url)]
    pub api_url: String,

    /// Directory holding the date-partitioned CSV artifacts
    #[validate(length(min = 1))]
    pub data_dir: String,

    /// Database connection URL for the final store
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to ensure the destination schema on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// API retry: maximum attempts per call
    #[serde(default = "default_api_max_retries")]
    pub api_max_retries: u32,

    /// API retry: initial backoff delay (milliseconds)
    #[serde(default = "default_api_retry_initial_delay_ms")]
    pub api_retry_initial_delay_ms: u64,

    /// API retry: backoff ceiling (milliseconds)
    #[serde(default = "default_api_retry_max_delay_ms")]
    pub api_retry_max_delay_ms: u64,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Upsert chunk size within the per-run load transaction
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_load_batch_size")]
    pub load_batch_size: usize,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Creates a configuration with explicit endpoints, suitable for tests.
    pub fn new(api_url: String, data_dir: String, database_url: String) -> Self {
        Self {
            api_url,
            data_dir,
            database_url,
            environment: DEFAULT_ENV.to_string(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            api_max_retries: default_api_max_retries(),
            api_retry_initial_delay_ms: default_api_retry_initial_delay_ms(),
            api_retry_max_delay_ms: default_api_retry_max_delay_ms(),
            api_timeout_secs: default_api_timeout_secs(),
            load_batch_size: default_load_batch_size(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true_bool() -> bool {
    true
}

fn default_api_max_retries() -> u32 {
    5
}

fn default_api_retry_initial_delay_ms() -> u64 {
    500
}

fn default_api_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_load_batch_size() -> usize {
    DEFAULT_LOAD_BATCH_SIZE
}

fn default_db_max_connections() -> u32 {
    4
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

/// Initialize tracing subscriber with env filter and optional JSON output
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("order_analysis_etl={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("api_url", DEFAULT_API_URL)?
        .set_default("data_dir", DEFAULT_DATA_DIR)?
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
