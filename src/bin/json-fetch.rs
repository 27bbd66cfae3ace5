use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use http::Method;
use json_fetch::config::credentials::{CredentialsConfig, SecretValue};
use json_fetch::config::loader;
use json_fetch::observability::metrics::gather_metrics;
use json_fetch::utils::logging::{self, LogLevel};
use json_fetch::{ErrorMode, FetcherConfig, JsonFetcher};
use serde_json::Value;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// absolute URL to fetch
    url: String,
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,
    #[arg(short, long, env = "JSON_FETCH_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// JSON request body
    #[arg(short, long)]
    data: Option<String>,
    #[arg(short, long, env = "JSON_FETCH_CONFIG")]
    config: Option<PathBuf>,
    #[arg(short, long, env = "JSON_FETCH_USER")]
    user: Option<String>,
    #[arg(long, env = "JSON_FETCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// log failures and print nothing instead of exiting with an error
    #[arg(long)]
    lenient: bool,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// print collected metrics to stderr after the call
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load config, CLI flags override it
    // -------------------------------

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => loader::file_to_config(path).await?,
        None => FetcherConfig::default(),
    };
    logging::init_logging(&logging::resolve(config.settings.logging.as_ref(), args.log_level));

    if let Some(credentials) = cli_credentials(args.user.as_deref(), args.password.as_deref())? {
        config.credentials = Some(credentials);
    }
    if args.lenient {
        config.settings.error_mode = ErrorMode::Lenient;
    }

    let method: Method = args
        .method
        .to_uppercase()
        .parse()
        .map_err(|e| anyhow!("invalid method '{}': {}", args.method, e))?;
    let body: Option<Value> = args
        .data
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| anyhow!("--data is not valid JSON: {}", e))?;

    // -------------------------------
    // 2. Build fetcher (fetches the initial token in JWT mode)
    // -------------------------------

    let fetcher = JsonFetcher::from_config(config).await?;

    // -------------------------------
    // 3. Fetch
    // -------------------------------

    let mut call = fetcher.call(method, args.url.as_str());
    if let Some(timeout_ms) = args.timeout_ms {
        call = call.timeout_ms(timeout_ms);
    }
    if let Some(body) = &body {
        call = call.json(body);
    }
    let outcome = call.dispatch().await;

    if args.print_metrics {
        eprintln!("{}", gather_metrics().await?);
    }

    match outcome? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => info!("no result"),
    }
    Ok(())
}

/// `--user` and `--password` only make sense together.
fn cli_credentials(user: Option<&str>, password: Option<&str>) -> Result<Option<CredentialsConfig>> {
    match (user, password) {
        (Some(user), Some(password)) => Ok(Some(CredentialsConfig {
            username: Some(user.to_owned()),
            password: Some(SecretValue::Literal { value: password.to_owned() }),
        })),
        (Some(_), None) => Err(anyhow!("--user requires --password (or JSON_FETCH_PASSWORD)")),
        (None, Some(_)) => Err(anyhow!("--password requires --user (or JSON_FETCH_USER)")),
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_and_password_build_credentials() {
        let credentials = cli_credentials(Some("svc"), Some("pw")).unwrap().unwrap();
        assert_eq!(credentials.username.as_deref(), Some("svc"));
        assert_eq!(credentials.password.unwrap().resolve().unwrap(), "pw");
        assert!(cli_credentials(None, None).unwrap().is_none());
    }

    #[test]
    fn half_a_credential_pair_is_rejected() {
        let err = cli_credentials(Some("svc"), None).unwrap_err();
        assert!(err.to_string().contains("--user requires --password"));
        let err = cli_credentials(None, Some("pw")).unwrap_err();
        assert!(err.to_string().contains("--password requires --user"));
    }
}
