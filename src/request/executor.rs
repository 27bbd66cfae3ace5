use std::sync::Arc;
use std::time::Duration;

use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Method, StatusCode};
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::CredentialInitializer;
use crate::error::FetchError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::request::options::RequestOptions;

/// Performs one request and turns the response into parsed JSON.
pub struct RequestExecutor {
    client: Client,
    initializer: Arc<CredentialInitializer>,
}

impl RequestExecutor {
    pub fn new(client: Client, initializer: Arc<CredentialInitializer>) -> Self {
        Self { client, initializer }
    }

    pub fn initializer(&self) -> &CredentialInitializer {
        &self.initializer
    }

    pub async fn execute(
        &self,
        verb: Method,
        uri: &str,
        timeout: Duration,
        body: Option<&Value>,
    ) -> Result<Value, FetchError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let method = verb.as_str().to_owned();
        metrics.requests.with_label_values(&[method.as_str()]).inc();

        let result = match self.initializer.get_options(timeout, verb, body).await {
            Ok(options) => self.send(uri, options).await,
            Err(err) => Err(err),
        };

        metrics
            .request_duration
            .with_label_values(&[method.as_str()])
            .observe(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            metrics.request_failures.with_label_values(&[err.kind().as_str()]).inc();
            debug!(uri, method = %method, error = %err, "json fetch failed");
        }
        result
    }

    /// Send the request and read the body, all bounded by the options' timeout.
    ///
    /// On timeout the in-flight exchange is dropped, which closes the
    /// underlying connection.
    async fn send(&self, uri: &str, options: RequestOptions) -> Result<Value, FetchError> {
        let RequestOptions {
            method,
            headers,
            credentials,
            body,
            timeout,
        } = options;
        debug!(uri, %method, ?credentials, timeout_ms = timeout.as_millis() as u64, "sending request");

        let mut request = self.client.request(method, uri).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let exchange = async {
            let response = request.send().await.map_err(|source| FetchError::Transport {
                url: uri.to_owned(),
                source,
            })?;
            let response = check_status(response)?;

            let status = response.status();
            let headers = response.headers().clone();
            let url = response.url().to_string();
            let bytes = response.bytes().await.map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
            Ok::<Value, FetchError>(parse_json_body(&url, status, &headers, &bytes)?)
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(uri, timeout_ms = timeout.as_millis() as u64, "fetch timeout");
                Err(FetchError::Timeout {
                    url: uri.to_owned(),
                    timeout,
                })
            }
        }
    }
}

fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(FetchError::Status {
        url: response.url().to_string(),
        status,
        status_text: status.canonical_reason().unwrap_or_default().to_owned(),
    })
}

/// Parse a successful response body.
///
/// A body that is not JSON is only accepted as `{}` for 201/202/204 answers
/// that explicitly announce `content-length: 0`.
pub fn parse_json_body(
    url: &str,
    status: StatusCode,
    headers: &HeaderMap,
    bytes: &[u8],
) -> Result<Value, FetchError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Ok(value),
        Err(_) if is_empty_success(status, headers) => {
            debug!(url, status = status.as_u16(), "empty response body, returning {{}}");
            Ok(Value::Object(Map::new()))
        }
        Err(source) => Err(FetchError::Parse {
            url: url.to_owned(),
            status,
            source,
        }),
    }
}

fn is_empty_success(status: StatusCode, headers: &HeaderMap) -> bool {
    matches!(
        status,
        StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
    ) && headers
        .get(CONTENT_LENGTH)
        .is_some_and(|v| v.as_bytes() == b"0")
}
