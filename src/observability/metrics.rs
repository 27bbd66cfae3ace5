use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

/// Render all registered metrics in the text exposition format.
pub async fn gather_metrics() -> anyhow::Result<String> {
    let metrics = get_metrics().await;
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&metrics.registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Request metrics
    pub requests: IntCounterVec,
    pub request_failures: IntCounterVec,
    pub request_duration: HistogramVec,

    // Token metrics
    pub token_requests: IntCounterVec,
    pub token_expiry_unix: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("jsonfetch".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            requests: IntCounterVec::new(Opts::new("requests_total", "Total JSON fetch calls by method"), &["method"]).unwrap(),
            request_failures: IntCounterVec::new(Opts::new("request_failures_total", "JSON fetch failures by kind"), &["kind"]).unwrap(),
            request_duration: HistogramVec::new(HistogramOpts::new("request_duration_seconds", "JSON fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 30.0, 60.0]), &["method"]).unwrap(),

            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Token fetch/refresh requests by outcome"), &["operation", "outcome"]).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry of the most recently stored token").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.requests.clone())).unwrap();
        reg.register(Box::new(metrics.request_failures.clone())).unwrap();
        reg.register(Box::new(metrics.request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();

        metrics
    }
}
