use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_COD_CHARGE: &str = "50";
const DEFAULT_CURRENCY: &str = "INR";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

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

    /// Shared secret used to sign payment gateway callbacks
    #[validate(custom = "validate_gateway_secret")]
    pub payment_gateway_secret: String,

    /// Key expected in the `X-Admin-Key` header on admin routes
    #[validate(custom = "validate_admin_api_key")]
    pub admin_api_key: String,

    /// Charge applied to COD orders that do not state one
    #[serde(default = "default_cod_charge")]
    pub cod_charge: Decimal,

    /// ISO currency code shown on the status endpoint
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be 3 characters"))]
    pub currency: String,

    /// Upper bound on request handling time
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the
    /// connection string, secrets and environment.
    pub fn new(
        database_url: String,
        payment_gateway_secret: String,
        admin_api_key: String,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            payment_gateway_secret,
            admin_api_key,
            cod_charge: default_cod_charge(),
            currency: default_currency(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.cod_charge < Decimal::ZERO {
            let mut err = ValidationError::new("cod_charge");
            err.message = Some("cod_charge must not be negative".into());
            errors.add("cod_charge", err);
        }

        if self.payment_gateway_secret.trim() == self.admin_api_key.trim() {
            let mut err = ValidationError::new("admin_api_key_reused");
            err.message =
                Some("admin_api_key must differ from payment_gateway_secret".into());
            errors.add("admin_api_key", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
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

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
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
    30
}

fn default_cod_charge() -> Decimal {
    Decimal::from(50)
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Shared strength rules for configured secrets.
fn check_secret(field: &'static str, secret: &str, min_len: usize) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < min_len {
        let mut err = ValidationError::new(field);
        err.message = Some(format!("{} must be at least {} characters", field, min_len).into());
        return Err(err);
    }

    const DISALLOWED: [&str; 3] = ["CHANGE_THIS_SECRET_IN_PRODUCTION", "your-secret-key", "changeme"];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new(field);
        err.message = Some(format!("{} must be overridden with a secure random value", field).into());
        return Err(err);
    }

    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new(field);
            err.message = Some(format!("{} cannot be a repeated character sequence", field).into());
            return Err(err);
        }
    }

    Ok(())
}

fn validate_gateway_secret(secret: &str) -> Result<(), ValidationError> {
    check_secret("payment_gateway_secret", secret, 16)
}

fn validate_admin_api_key(key: &str) -> Result<(), ValidationError> {
    check_secret("admin_api_key", key, 32)
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("giftshop_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
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

    // Secrets have no defaults and must come from a config file or APP__ variables.
    let config = Config::builder()
        .set_default("database_url", "sqlite://giftshop.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("cod_charge", DEFAULT_COD_CHARGE)?
        .set_default("currency", DEFAULT_CURRENCY)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for key in ["payment_gateway_secret", "admin_api_key"] {
        if config.get_string(key).is_err() {
            error!(
                "{} is not configured. Set APP__{} to a secure random string.",
                key,
                key.to_uppercase()
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                key
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
