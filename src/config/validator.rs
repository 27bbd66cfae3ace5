//! Configuration validation with aggregated errors.
//! All issues are collected into one `Vec<String>` instead of failing on the
//! first one.

use reqwest::Url;
use tracing::{error, info};

use crate::config::credentials::{CredentialsConfig, FetcherConfig, JwtConfig};
use crate::config::settings::FetcherSettings;

pub fn validate_fetcher_config(cfg: &FetcherConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    if let Some(credentials) = &cfg.credentials {
        validate_credentials(credentials, &mut errors);
    }
    if let Some(jwt) = &cfg.jwt {
        validate_jwt(jwt, &mut errors);
    }

    if errors.is_empty() {
        info!("config validation passed");
        Ok(())
    } else {
        for e in &errors {
            error!("config: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &FetcherSettings, errors: &mut Vec<String>) {
    if settings.default_timeout_ms == 0 {
        errors.push("settings.default_timeout_ms must be > 0".to_string());
    }
    if settings.token_timeout_ms == 0 {
        errors.push("settings.token_timeout_ms must be > 0".to_string());
    }
    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!("settings.logging.level '{}' is not supported", logging.level));
        }
    }
}

fn validate_credentials(credentials: &CredentialsConfig, errors: &mut Vec<String>) {
    match (&credentials.username, &credentials.password) {
        (Some(username), Some(_)) if username.is_empty() => {
            errors.push("credentials.username must not be empty".to_string());
        }
        (Some(_), None) => errors.push("credentials.password is missing".to_string()),
        (None, Some(_)) => errors.push("credentials.username is missing".to_string()),
        _ => {}
    }
}

fn validate_jwt(jwt: &JwtConfig, errors: &mut Vec<String>) {
    for (field, value) in [("jwt.uri", &jwt.uri), ("jwt.refresh_uri", &jwt.refresh_uri)] {
        if let Err(e) = Url::parse(value) {
            errors.push(format!("{} '{}' is not a valid URL: {}", field, value, e));
        }
    }
}
