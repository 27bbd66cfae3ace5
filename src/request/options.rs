use std::time::Duration;

use http::{HeaderMap, Method};

use crate::auth::CredentialsMode;

/// Everything needed to issue one request. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub credentials: CredentialsMode,
    /// JSON-serialized request body
    pub body: Option<String>,
    pub timeout: Duration,
}

impl RequestOptions {
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}
