use clap::ValueEnum;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::credentials::ServiceConfig;
use crate::config::settings::{LogFormat, LoggingConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

/// Command line level wins over the configured one.
pub fn run(service_config: &ServiceConfig, arg_log_level: Option<LogLevel>) {
    let logging_config = match &service_config.settings.logging {
        Some(config) => LoggingConfig::new(
            arg_log_level
                .map(|level| level.as_str().to_owned())
                .unwrap_or_else(|| config.level.to_owned()),
            config.format.to_owned(),
        ),
        None => LoggingConfig::new(
            arg_log_level.map(|level| level.as_str()).unwrap_or("info").to_owned(),
            LogFormat::Compact,
        ),
    };

    init_logging(&logging_config);
}

/// Compact stderr subscriber used until the configured one is installed.
pub fn bootstrap_subscriber(arg_log_level: Option<LogLevel>) -> impl Subscriber + Send + Sync + 'static {
    bootstrap_subscriber_with_writer(arg_log_level, std::io::stderr)
}

pub fn bootstrap_subscriber_with_writer<W>(
    arg_log_level: Option<LogLevel>,
    writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = arg_log_level.map(|level| level.as_str()).unwrap_or("info");
    tracing_subscriber::registry().with(EnvFilter::new(level)).with(
        fmt::layer()
            .compact()
            .with_timer(UtcTime::rfc_3339())
            .with_ansi(false)
            .with_writer(writer),
    )
}

/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}
