//! Public entry point: one [`JsonFetcher`] per credential configuration,
//! invoked repeatedly through [`FetchCall`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use http::Method;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::auth::{CredentialInitializer, Credentials};
use crate::config::credentials::{FetcherConfig, JwtConfig};
use crate::config::settings::{ErrorMode, FetcherSettings};
use crate::error::FetchError;
use crate::request::executor::RequestExecutor;

type Observer<'a> = Box<dyn FnOnce(&Value) + Send + 'a>;

#[derive(Clone)]
pub struct JsonFetcher {
    executor: Arc<RequestExecutor>,
    settings: Arc<FetcherSettings>,
}

impl JsonFetcher {
    pub fn builder() -> JsonFetcherBuilder {
        JsonFetcherBuilder::default()
    }

    /// Fetcher sending anonymous requests.
    pub async fn anonymous() -> Result<Self, FetchError> {
        Self::builder().build().await
    }

    /// Fetcher sending `Authorization: Basic ...` on every request.
    pub async fn with_basic(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, FetchError> {
        Self::builder().basic(username, password).build().await
    }

    /// Fetcher authenticating with a bearer token from `jwt.uri`.
    /// Awaits the initial token fetch.
    pub async fn with_jwt(
        username: impl Into<String>,
        password: impl Into<String>,
        jwt: JwtConfig,
    ) -> Result<Self, FetchError> {
        Self::builder().basic(username, password).jwt(jwt).build().await
    }

    /// Fetcher from a loaded config; secrets are resolved here.
    pub async fn from_config(config: FetcherConfig) -> Result<Self> {
        let mut builder = Self::builder().settings(config.settings);
        if let Some(credentials) = config.credentials {
            if let (Some(username), Some(password)) = (credentials.username, credentials.password) {
                builder = builder.basic(username, password.resolve()?);
            }
        }
        if let Some(jwt) = config.jwt {
            builder = builder.jwt(jwt);
        }
        Ok(builder.build().await?)
    }

    pub fn settings(&self) -> &FetcherSettings {
        &self.settings
    }

    pub fn initializer(&self) -> &CredentialInitializer {
        self.executor.initializer()
    }

    /// Start a call; nothing is sent until `send`, `send_lenient` or `dispatch`.
    pub fn call(&self, verb: Method, uri: impl Into<String>) -> FetchCall<'_> {
        FetchCall {
            fetcher: self,
            verb,
            uri: uri.into(),
            timeout: Duration::from_millis(self.settings.default_timeout_ms),
            body: None,
            observer: None,
        }
    }

    pub fn get(&self, uri: impl Into<String>) -> FetchCall<'_> {
        self.call(Method::GET, uri)
    }

    pub fn post(&self, uri: impl Into<String>) -> FetchCall<'_> {
        self.call(Method::POST, uri)
    }
}

#[derive(Default)]
pub struct JsonFetcherBuilder {
    client: Option<Client>,
    credentials: Option<Credentials>,
    jwt: Option<JwtConfig>,
    settings: FetcherSettings,
}

impl JsonFetcherBuilder {
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn jwt(mut self, jwt: JwtConfig) -> Self {
        self.jwt = Some(jwt);
        self
    }

    pub fn settings(mut self, settings: FetcherSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn build(self) -> Result<JsonFetcher, FetchError> {
        let client = self.client.unwrap_or_default();
        let initializer =
            CredentialInitializer::new(client.clone(), self.credentials, self.jwt, &self.settings).await?;
        Ok(JsonFetcher {
            executor: Arc::new(RequestExecutor::new(client, Arc::new(initializer))),
            settings: Arc::new(self.settings),
        })
    }
}

/// One pending call.
#[must_use = "a FetchCall does nothing until it is sent"]
pub struct FetchCall<'a> {
    fetcher: &'a JsonFetcher,
    verb: Method,
    uri: String,
    timeout: Duration,
    body: Option<Result<Value, serde_json::Error>>,
    observer: Option<Observer<'a>>,
}

impl<'a> FetchCall<'a> {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    /// JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_value(body));
        self
    }

    /// Called once with the parsed result, only when the call succeeds.
    pub fn on_success<F>(mut self, observer: F) -> Self
    where
        F: FnOnce(&Value) + Send + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub async fn send(self) -> Result<Value, FetchError> {
        let body = self.body.transpose().map_err(FetchError::Body)?;
        let value = self
            .fetcher
            .executor
            .execute(self.verb, &self.uri, self.timeout, body.as_ref())
            .await?;

        if let Some(observer) = self.observer {
            observer(&value);
        }
        Ok(value)
    }

    /// Logs any failure and yields `None` instead of an error.
    pub async fn send_lenient(self) -> Option<Value> {
        let uri = self.uri.clone();
        match self.send().await {
            Ok(value) => Some(value),
            Err(err) => {
                error!(uri = %uri, kind = err.kind().as_str(), error = %err, "JSON Fetch Errors");
                None
            }
        }
    }

    /// Follows the fetcher's configured [`ErrorMode`].
    pub async fn dispatch(self) -> Result<Option<Value>, FetchError> {
        match self.fetcher.settings.error_mode {
            ErrorMode::Strict => self.send().await.map(Some),
            ErrorMode::Lenient => Ok(self.send_lenient().await),
        }
    }
}
