use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
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

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Session metrics
    pub auth_requests: IntCounterVec,
    pub auth_duration: Histogram,
    pub session_token_expiry_unix: IntGauge,

    // Validation metrics
    pub validations: IntCounterVec,
    pub validation_failures: IntCounterVec,
    pub validation_duration: Histogram,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("tokenvalidator".into()), None)
            .expect("metrics prefix is valid");

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Session
            auth_requests: IntCounterVec::new(Opts::new("auth_requests_total", "Identity provider authentications by kind and result"), &["kind", "result"]).expect("metric"),
            auth_duration: Histogram::with_opts(HistogramOpts::new("auth_duration_seconds", "Authentication duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])).expect("metric"),
            session_token_expiry_unix: IntGauge::new("session_token_expiry_unix_seconds", "Session token expiry timestamp").expect("metric"),

            // Validation
            validations: IntCounterVec::new(Opts::new("validations_total", "Token validations by result"), &["result"]).expect("metric"),
            validation_failures: IntCounterVec::new(Opts::new("validation_failures_total", "Token validation failures by reason"), &["reason"]).expect("metric"),
            validation_duration: Histogram::with_opts(HistogramOpts::new("validation_duration_seconds", "Token validation duration seconds").buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])).expect("metric"),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").expect("metric"),
            up: IntGauge::new("up", "1 if service is healthy").expect("metric"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(metrics.auth_requests.clone()),
            Box::new(metrics.auth_duration.clone()),
            Box::new(metrics.session_token_expiry_unix.clone()),
            Box::new(metrics.validations.clone()),
            Box::new(metrics.validation_failures.clone()),
            Box::new(metrics.validation_duration.clone()),
            Box::new(metrics.config_validation_errors.clone()),
            Box::new(metrics.up.clone()),
        ];
        for collector in collectors {
            reg.register(collector).expect("metric registered once");
        }

        metrics
    }
}
