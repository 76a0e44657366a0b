//! DJ Console Map - standalone runner
//!
//! Connects to the console and drives it against the in-process engine.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use djconsole_map::config::AppConfig;
use djconsole_map::console::{self, ConsoleDriver};
use djconsole_map::host::MemoryHost;
use djconsole_map::router::Router;

/// DJ Console Map - drive a Hercules DJ Console against a mixing engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        console::list_ports_formatted();
        return Ok(());
    }

    info!("Starting DJ Console Map...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;

    let mut driver = ConsoleDriver::new(&config);
    driver.connect()?;

    let transport = driver
        .transport()
        .ok_or_else(|| anyhow::anyhow!("Console output not connected"))?;
    let mut events = driver
        .take_event_receiver()
        .ok_or_else(|| anyhow::anyhow!("Failed to get console event receiver"))?;

    let engine = Arc::new(MemoryHost::new());
    let mut router = Router::new(&config, engine.clone(), engine, Arc::new(transport));
    router.init()?;

    info!("Ready to process MIDI events!");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // One event at a time: the router owns all mapping state
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        debug!(
                            "Received console event: raw={:02X?} queued={:?}",
                            event.raw_data,
                            event.timestamp.elapsed()
                        );
                        router.on_midi(&event.raw_data);
                    }
                    None => {
                        warn!("Console event channel closed");
                        break;
                    }
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    router.shutdown();
    driver.disconnect();
    info!("DJ Console Map shutdown complete");

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
