use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use token_validator::server;
use token_validator::utils::constants::DEFAULT_CONFIG_PATH;
use token_validator::utils::logging::{self, LogLevel};
use token_validator::utils::config_loader;
use token_validator::validator::accessor;
use tracing::instrument::WithSubscriber;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Validate this token once and exit instead of serving HTTP
    token: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let service_config = config_loader::run(&args.config)
        .with_subscriber(logging::bootstrap_subscriber(args.log_level))
        .await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Authenticate and resolve validation endpoint
    // -------------------------------

    let validator = accessor::init_validator(&service_config)
        .await
        .map_err(|e| anyhow!("validator initialization failed: {}", e))?;

    // -------------------------------
    // 3. One-shot validation
    // -------------------------------

    if let Some(token) = args.token {
        let valid = validator.validate(&token).await.context("token validation failed")?;
        println!("{}", if valid { "valid" } else { "invalid" });
        return Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    // -------------------------------
    // 4. Serve validation and metrics over HTTP
    // -------------------------------

    info!("Service starting...");
    tokio::select! {
        res = server::server::start(&service_config.settings, Arc::clone(&validator)) => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(ExitCode::SUCCESS)
}
