use anyhow::{anyhow, Result};
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub exp: i64,
}

/// Decode the payload (middle) segment of a JWT. The signature is not checked.
pub fn decode_jwt_claims(token_string: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token_string.split('.').collect();
    if parts.len() != 3 {
        return Err(anyhow!("invalid JWT format"));
    }

    let payload = parts[1].trim_end_matches('=');
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| anyhow!("base64 decode error: {}", e))?;

    serde_json::from_slice::<JwtClaims>(&decoded)
        .map_err(|e| anyhow!("invalid JWT payload: {}", e))
}

/// `exp` claim of the token as unix seconds.
pub fn get_jwt_token_expiration(token_value: &str) -> Result<i64> {
    let claims = decode_jwt_claims(token_value)?;
    debug!(expires_at = claims.exp, "jwt parsed successfully");
    Ok(claims.exp)
}
