use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HISTORY_KEY: &str = "tailoredResumes";
/// Resume PDFs with embedded fonts or images routinely exceed axum's 2 MB default.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub tailor_endpoint_url: String,
    pub tailor_timeout: Duration,
    pub redis_url: String,
    pub history_key: String,
    /// Body limit for `POST /api/v1/extract`.
    pub max_upload_bytes: usize,
    /// Remote-backed history source. Local-only history when unset.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            tailor_endpoint_url: require_env("TAILOR_ENDPOINT_URL")?,
            tailor_timeout: Duration::from_secs(
                optional_env("TAILOR_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("TAILOR_TIMEOUT_SECS must be a whole number of seconds")?
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            redis_url: require_env("REDIS_URL")?,
            history_key: optional_env("HISTORY_KEY")
                .unwrap_or_else(|| DEFAULT_HISTORY_KEY.to_string()),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a whole number of bytes")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            database_url: optional_env("DATABASE_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
