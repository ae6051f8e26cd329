//! mapperd — the airport name-to-port registry daemon.
//!
//! Takes no arguments. Binds an ephemeral port, prints it on stdout, then
//! serves the Mapper protocol until shut down.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use flightline_core::config::FlightlineConfig;
use flightline_services::{new_airport_directory, MapperListener, WorkerGate, WorkerPolicy};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if std::env::args().nth(1).is_some() {
        eprintln!("Usage: mapperd");
        std::process::exit(1);
    }

    if let Err(e) = FlightlineConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = FlightlineConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FlightlineConfig::default()
    });

    let listener = TcpListener::bind((config.network.bind_host.as_str(), 0))
        .await
        .context("failed to bind mapper listener")?;

    let directory = new_airport_directory();
    let gate = WorkerGate::new(WorkerPolicy::from_limit(config.limits.max_connections));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    let listener = MapperListener::new(listener, directory, gate, shutdown_tx.subscribe());
    let port = listener.local_port()?;

    // startup contract: the bound port is the only stdout output
    println!("{port}");
    std::io::stdout().flush()?;
    tracing::info!(port, "mapperd accepting connections");

    listener.run().await
}
