use serde::Deserialize;

pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 60_000;
/// A tracked token is refreshed once it has this many seconds left or fewer.
pub const REFRESH_MARGIN_SECONDS_DEFAULT: u64 = 10;

/// ================================
/// Fetcher-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct FetcherSettings {
    /// per-call timeout unless the call overrides it
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// bound for token fetch and refresh requests
    #[serde(default = "default_token_timeout_ms")]
    pub token_timeout_ms: u64,
    #[serde(default = "default_refresh_margin_seconds")]
    pub refresh_margin_seconds: u64,
    #[serde(default)]
    pub error_mode: ErrorMode,
    pub logging: Option<LoggingConfig>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            token_timeout_ms: DEFAULT_TOKEN_TIMEOUT_MS,
            refresh_margin_seconds: REFRESH_MARGIN_SECONDS_DEFAULT,
            error_mode: ErrorMode::default(),
            logging: None,
        }
    }
}

/// How `FetchCall::dispatch` reports failures.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// failures are returned as `FetchError`
    #[default]
    Strict,
    /// failures are logged and the call yields no value
    Lenient,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_token_timeout_ms() -> u64 {
    DEFAULT_TOKEN_TIMEOUT_MS
}

fn default_refresh_margin_seconds() -> u64 {
    REFRESH_MARGIN_SECONDS_DEFAULT
}
