use http::Method;
use serde::Deserialize;
use serde_json::Value;
use std::{env, fs};

use anyhow::{anyhow, Result};

use crate::config::settings::FetcherSettings;

/// ================================
/// Full fetcher configuration
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FetcherConfig {
    pub credentials: Option<CredentialsConfig>,
    pub jwt: Option<JwtConfig>,
    #[serde(default)]
    pub settings: FetcherSettings,
}

/// Username/password pair as written in the config file
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<SecretValue>,
}

/// Where a secret comes from
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl SecretValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            SecretValue::Literal { value } => Ok(value.to_owned()),
            SecretValue::FromEnv { from_env } => env::var(from_env)
                .map_err(|err| anyhow!("env variable '{}': {}", from_env, err)),
            SecretValue::FromFile { path } => fs::read_to_string(path)
                .map_err(|err| anyhow!("secret file '{}': {}", path, err))
                .map(|res| res.trim().to_string()),
        }
    }
}

/// Token endpoints for bearer authentication
#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// full token fetch endpoint
    pub uri: String,
    /// refresh endpoint, receives `{"token": <current>}`
    pub refresh_uri: String,
    #[serde(with = "http_serde::method", default = "default_verb")]
    pub verb: Method,
    /// JSON body of the full token fetch
    #[serde(default = "default_payload")]
    pub payload: Value,
}

impl JwtConfig {
    pub fn new(uri: impl Into<String>, refresh_uri: impl Into<String>, verb: Method, payload: Value) -> Self {
        Self {
            uri: uri.into(),
            refresh_uri: refresh_uri.into(),
            verb,
            payload,
        }
    }
}

fn default_verb() -> Method {
    Method::POST
}

fn default_payload() -> Value {
    Value::Object(serde_json::Map::new())
}
