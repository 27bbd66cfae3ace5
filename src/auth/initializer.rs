//! Builds per-request options and keeps the bearer token fresh.
//!
//! The token lives behind an async mutex that is held for the whole refresh,
//! so callers racing on a nearly expired token wait for one refresh and then
//! reuse its result instead of issuing their own.

use std::time::Duration;

use http::header::{HeaderName, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::auth::jwt::get_jwt_token_expiration;
use crate::auth::token::TokenState;
use crate::auth::{Credentials, CredentialsMode};
use crate::config::credentials::JwtConfig;
use crate::config::settings::FetcherSettings;
use crate::error::FetchError;
use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;
use crate::request::options::RequestOptions;

static FETCH_OP: &str = "fetch";
static REFRESH_OP: &str = "refresh";

/// Body returned by the token and refresh endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

pub struct CredentialInitializer {
    client: Client,
    jwt: Option<JwtConfig>,
    base_headers: HeaderMap,
    credentials: CredentialsMode,
    refresh_margin_seconds: u64,
    token_timeout: Duration,
    token: Mutex<TokenState>,
}

impl CredentialInitializer {
    /// Build base headers and, in JWT mode, fetch the first token.
    ///
    /// A failed initial token fetch is logged and leaves the initializer
    /// without a token; requests then go out without a bearer header.
    pub async fn new(
        client: Client,
        credentials: Option<Credentials>,
        jwt: Option<JwtConfig>,
        settings: &FetcherSettings,
    ) -> Result<Self, FetchError> {
        let mut base_headers = HeaderMap::new();
        base_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        base_headers.insert(HeaderName::from_static("x-requested-with"), HeaderValue::from_static("XMLHttpRequest"));
        base_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut mode = CredentialsMode::Omit;
        if let Some(credentials) = credentials.as_ref().filter(|c| c.is_complete()) {
            let value = HeaderValue::from_str(&credentials.basic_header_value())
                .map_err(|_| FetchError::InvalidHeader { name: "authorization" })?;
            base_headers.insert(AUTHORIZATION, value);
            mode = CredentialsMode::Include;
            debug!(username = %credentials.username, "basic authentication enabled");
        }

        let initializer = Self {
            client,
            jwt,
            base_headers,
            credentials: mode,
            refresh_margin_seconds: settings.refresh_margin_seconds,
            token_timeout: Duration::from_millis(settings.token_timeout_ms),
            token: Mutex::new(TokenState::default()),
        };

        if initializer.jwt.is_some() {
            match initializer.fetch_token().await {
                Ok(state) => {
                    info!(expires_at = state.exp_unix_ts, "initial token fetched");
                    *initializer.token.lock().await = state;
                }
                Err(err) => {
                    error!(error = %err, "initial token fetch failed, continuing without bearer token");
                }
            }
        }

        Ok(initializer)
    }

    /// Options for one call, refreshing the token first when it is about to expire.
    pub async fn get_options(
        &self,
        timeout: Duration,
        verb: Method,
        body: Option<&Value>,
    ) -> Result<RequestOptions, FetchError> {
        let mut headers = self.base_headers.clone();
        let mut credentials = self.credentials;

        if self.jwt.is_some() {
            let state = self.ensure_fresh_token().await;
            if state.has_token() {
                let value = HeaderValue::from_str(&format!("Bearer {}", state.value))
                    .map_err(|_| FetchError::InvalidHeader { name: "authorization" })?;
                headers.insert(AUTHORIZATION, value);
                credentials = CredentialsMode::Include;
            }
        }

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(FetchError::Body)?;

        Ok(RequestOptions {
            method: verb,
            headers,
            credentials,
            body,
            timeout,
        })
    }

    /// Snapshot of the current token state.
    pub async fn current_token(&self) -> TokenState {
        self.token.lock().await.clone()
    }

    /// Refresh → full fetch fallback. When both fail the stale token is kept.
    async fn ensure_fresh_token(&self) -> TokenState {
        let mut state = self.token.lock().await;
        let now = now_i64();
        if !state.should_refresh_at(now, self.refresh_margin_seconds) {
            return state.clone();
        }

        info!(seconds_remaining = state.seconds_remaining_at(now), "token is about to expire, refreshing");
        match self.refresh_token(&state.value).await {
            Ok(refreshed) => *state = refreshed,
            Err(err) => {
                warn!(error = %err, "token refresh failed, fetching a new token");
                match self.fetch_token().await {
                    Ok(fetched) => *state = fetched,
                    Err(err) => {
                        error!(error = %err, "token fetch failed, keeping the current token");
                    }
                }
            }
        }
        state.clone()
    }

    async fn fetch_token(&self) -> Result<TokenState, FetchError> {
        let jwt = self.jwt_config()?;
        self.request_token(&jwt.uri, &jwt.payload, FETCH_OP).await
    }

    async fn refresh_token(&self, current: &str) -> Result<TokenState, FetchError> {
        let jwt = self.jwt_config()?;
        self.request_token(&jwt.refresh_uri, &json!({ "token": current }), REFRESH_OP)
            .await
    }

    fn jwt_config(&self) -> Result<&JwtConfig, FetchError> {
        self.jwt
            .as_ref()
            .ok_or_else(|| FetchError::token("-", "jwt authentication is not configured"))
    }

    async fn request_token(
        &self,
        uri: &str,
        body: &Value,
        operation: &'static str,
    ) -> Result<TokenState, FetchError> {
        let metrics = get_metrics().await;
        let verb = self.jwt_config()?.verb.clone();

        let exchange = async {
            let response = self
                .client
                .request(verb, uri)
                .headers(self.base_headers.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| FetchError::token(uri, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::token(uri, format!("HTTP {}", status)));
            }
            let parsed = response
                .json::<TokenResponse>()
                .await
                .map_err(|e| FetchError::token(uri, e))?;
            Ok::<TokenResponse, FetchError>(parsed)
        };

        let result = match tokio::time::timeout(self.token_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::token(
                uri,
                format!("timeout after {}ms", self.token_timeout.as_millis()),
            )),
        };

        let TokenResponse { token } = match result {
            Ok(response) => response,
            Err(err) => {
                metrics.token_requests.with_label_values(&[operation, "failure"]).inc();
                return Err(err);
            }
        };
        metrics.token_requests.with_label_values(&[operation, "success"]).inc();

        // A token without a readable `exp` claim is used as is, without refresh tracking.
        let exp_unix_ts = get_jwt_token_expiration(&token).unwrap_or_else(|err| {
            warn!(error = %err, "token expiry unreadable, refresh tracking disabled");
            0
        });
        metrics.token_expiry_unix.set(exp_unix_ts);
        debug!(operation, expires_at = exp_unix_ts, "token stored");

        Ok(TokenState::new(token, exp_unix_ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_options_carry_only_base_headers() {
        let initializer = CredentialInitializer::new(Client::new(), None, None, &FetcherSettings::default())
            .await
            .unwrap();
        let options = initializer
            .get_options(Duration::from_millis(500), Method::GET, None)
            .await
            .unwrap();

        assert_eq!(options.method, Method::GET);
        assert_eq!(options.credentials, CredentialsMode::Omit);
        assert_eq!(options.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(options.headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert!(options.authorization().is_none());
        assert!(options.body.is_none());
        assert_eq!(options.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn basic_options_include_credentials_and_body() {
        let credentials = Credentials::new("user", "pass");
        let initializer = CredentialInitializer::new(
            Client::new(),
            Some(credentials),
            None,
            &FetcherSettings::default(),
        )
        .await
        .unwrap();
        let body = json!({"name": "x", "tags": [1, 2]});
        let options = initializer
            .get_options(Duration::from_secs(1), Method::POST, Some(&body))
            .await
            .unwrap();

        assert_eq!(options.credentials, CredentialsMode::Include);
        assert_eq!(options.authorization(), Some("Basic dXNlcjpwYXNz"));
        let sent: Value = serde_json::from_str(options.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[tokio::test]
    async fn empty_credentials_send_no_basic_header() {
        for (username, password) in [("", ""), ("user", ""), ("", "pass")] {
            let initializer = CredentialInitializer::new(
                Client::new(),
                Some(Credentials::new(username, password)),
                None,
                &FetcherSettings::default(),
            )
            .await
            .unwrap();
            let options = initializer
                .get_options(Duration::from_secs(1), Method::GET, None)
                .await
                .unwrap();

            assert!(options.authorization().is_none(), "{:?}/{:?}", username, password);
            assert_eq!(options.credentials, CredentialsMode::Omit);
        }
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_not_fatal() {
        let jwt = JwtConfig::new(
            "http://127.0.0.1:1/token",
            "http://127.0.0.1:1/refresh",
            Method::POST,
            json!({}),
        );
        let initializer = CredentialInitializer::new(Client::new(), None, Some(jwt), &FetcherSettings::default())
            .await
            .unwrap();

        assert_eq!(initializer.current_token().await, TokenState::default());
        let options = initializer
            .get_options(Duration::from_secs(1), Method::GET, None)
            .await
            .unwrap();
        assert!(options.authorization().is_none());
        assert_eq!(options.credentials, CredentialsMode::Omit);
    }
}
