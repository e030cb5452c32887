mod args;
mod server;

use std::{process::ExitCode, sync::Arc};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use purpleprom::{config::Config, metrics::MetricsRegistry, purpleair::PurpleAirClient};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(&args.config).context("failed to load configuration")?;
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    debug!("config: {config:?}");

    let registry = Arc::new(
        MetricsRegistry::new(config.policy).context("failed to create metrics registry")?,
    );
    info!(
        "publishing {} sensor(s) with {} policy",
        config.sensors.len(),
        config.policy
    );

    if config.metrics.is_exported() {
        server::bind(&config.metrics.path, config.metrics.port, registry.clone())
            .await
            .context("failed to start metrics server")?;
    } else {
        info!("metrics export disabled");
    }

    let client = PurpleAirClient::new(&config.api.url, config.api.timeout)
        .context("failed to create PurpleAir client")?;

    tokio::select! {
        _ = poll(&config, &client, &registry) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutting down");
        }
    }

    Ok(())
}

async fn poll(config: &Config, client: &PurpleAirClient, registry: &MetricsRegistry) {
    let mut ticker = interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // A failed cycle is dropped; the previous values stay published.
        match client.fetch(&config.sensors).await {
            Ok(readings) => {
                registry.record(&readings);
                debug!("recorded {} reading(s)", readings.len());
            }
            Err(err) => warn!("failed to poll sensors: {err:#}"),
        }
    }
}
