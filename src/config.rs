use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default PDF size threshold below which the text layer is tried first (4 MiB).
pub const DEFAULT_PDF_OCR_THRESHOLD_BYTES: usize = 4 * 1024 * 1024;
/// Default interval between OCR job status polls, in milliseconds.
pub const DEFAULT_OCR_POLL_INTERVAL_MS: u64 = 3_000;
/// Default wall-clock bound on a single OCR job wait, in seconds.
pub const DEFAULT_OCR_JOB_TIMEOUT_SECS: u64 = 300;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docingest server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the object store used to stage OCR inputs.
    pub staging_store_url: String,
    /// Bucket holding staged objects for asynchronous text detection.
    pub staging_bucket: String,
    /// Optional API key sent to the staging store.
    pub staging_api_key: Option<String>,
    /// Base URL of the asynchronous text-detection (OCR) service.
    pub ocr_service_url: String,
    /// Optional API key sent to the OCR service.
    pub ocr_api_key: Option<String>,
    /// PDF byte-size threshold for routing to the text layer vs. OCR.
    pub pdf_ocr_threshold_bytes: usize,
    /// Interval between OCR job status polls, in milliseconds.
    pub ocr_poll_interval_ms: u64,
    /// Upper bound on the wait for a single OCR job, in seconds.
    pub ocr_job_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            staging_store_url: load_env("STAGING_STORE_URL")?,
            staging_bucket: load_env("STAGING_BUCKET")?,
            staging_api_key: load_env_optional("STAGING_API_KEY"),
            ocr_service_url: load_env("OCR_SERVICE_URL")?,
            ocr_api_key: load_env_optional("OCR_API_KEY"),
            pdf_ocr_threshold_bytes: parse_env_or(
                "PDF_OCR_THRESHOLD_BYTES",
                DEFAULT_PDF_OCR_THRESHOLD_BYTES,
            )?,
            ocr_poll_interval_ms: parse_env_or(
                "OCR_POLL_INTERVAL_MS",
                DEFAULT_OCR_POLL_INTERVAL_MS,
            )?,
            ocr_job_timeout_secs: parse_env_or(
                "OCR_JOB_TIMEOUT_SECS",
                DEFAULT_OCR_JOB_TIMEOUT_SECS,
            )?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        staging_store_url = %config.staging_store_url,
        bucket = %config.staging_bucket,
        ocr_service_url = %config.ocr_service_url,
        pdf_ocr_threshold_bytes = config.pdf_ocr_threshold_bytes,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
