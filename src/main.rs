use anyhow::{Context, Result};
use clap::Parser;
use rsibot::api::{http_client, BitgetClient, GroqAdvisor, TaapiClient};
use rsibot::execution::{CycleScheduler, PositionManager};
use rsibot::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// RSI-driven, AI-advised futures trading loop
#[derive(Debug, Parser)]
#[command(name = "rsibot", version)]
struct Cli {
    /// Stop after this many cycles instead of running until Ctrl+C
    #[arg(long)]
    cycles: Option<u64>,

    /// Override CYCLE_INTERVAL_SECS
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("Invalid configuration")?;
    setup_logging();

    let interval = cli
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.cycle_interval());

    tracing::info!(
        "🚀 Starting {} {}-based AI Trading Bot ({} loop)",
        settings.symbol,
        settings.indicator.to_uppercase(),
        settings.indicator_interval
    );

    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {}", settings.symbol);
    tracing::info!(
        "  Mode: {}",
        if settings.paper_trading { "PAPER" } else { "LIVE" }
    );
    tracing::info!("  Model: {}", settings.groq_model);
    tracing::info!(
        "  Indicator: {} {} {} on {}",
        settings.indicator,
        settings.indicator_pair,
        settings.indicator_interval,
        settings.indicator_exchange
    );
    tracing::info!("  Cycle interval: {}s", interval.as_secs());
    tracing::info!(
        "  Order sizes: open {} / close {}",
        settings.open_size,
        settings.close_size
    );
    // The close leg never reads the live position; its size is a fixed policy value
    tracing::warn!(
        "Close orders use a fixed size ({}) and are sent without checking the open position",
        settings.close_size
    );

    let http = http_client(settings.http_timeout()).context("Failed to build HTTP client")?;

    let exchange = Arc::new(BitgetClient::new(
        http.clone(),
        &settings.bitget_base_url,
        settings.credentials(),
        settings.paper_trading,
    ));
    let indicator = Arc::new(TaapiClient::from_settings(http.clone(), &settings));
    let advisor = Arc::new(GroqAdvisor::from_settings(http, &settings));
    let positions = PositionManager::from_settings(exchange, &settings);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut scheduler = CycleScheduler::new(indicator, advisor, positions, interval, shutdown_rx);
    if let Some(cycles) = cli.cycles {
        scheduler = scheduler.with_max_cycles(cycles);
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    });

    tracing::info!("\nPress Ctrl+C to stop...\n");

    let completed = scheduler.run().await.context("Trading loop stopped")?;

    tracing::info!("👋 rsibot stopped after {} cycles", completed);
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rsibot=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
