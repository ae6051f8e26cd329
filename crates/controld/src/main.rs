//! controld — a per-airport Control daemon.
//!
//! `controld <id> <info> [mapper_port]`
//!
//! Binds an ephemeral port, prints it on stdout, registers with the Mapper
//! when one was given, then serves visits until shut down.

use std::io::Write;

use anyhow::Result;
use tokio::net::TcpListener;

use flightline_core::config::FlightlineConfig;
use flightline_core::protocol::{parse_port, valid_token};
use flightline_services::{
    new_visit_log, ControlListener, MapperClient, WorkerGate, WorkerPolicy,
};

/// Process exit statuses. Startup failures print the message on stderr and
/// exit with the discriminant; nothing is retried.
#[derive(Clone, Copy)]
enum Status {
    Usage = 1,
    InvalidArgs = 2,
    InvalidPort = 3,
    ConnFailed = 4,
    ServerFailed = 5,
}

impl Status {
    fn message(self) -> &'static str {
        match self {
            Status::Usage => "Usage: controld id info [mapper]",
            Status::InvalidArgs => "Invalid char in parameter",
            Status::InvalidPort => "Invalid port",
            Status::ConnFailed => "Can not connect to map",
            Status::ServerFailed => "",
        }
    }
}

fn fail(status: Status) -> ! {
    let message = status.message();
    if !message.is_empty() {
        eprintln!("{message}");
    }
    std::process::exit(status as i32);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (id, info, mapper_arg) = match args.as_slice() {
        [id, info] => (id, info, None),
        [id, info, mapper] => (id, info, Some(mapper)),
        _ => fail(Status::Usage),
    };
    if !valid_token(id) || !valid_token(info) {
        fail(Status::InvalidArgs);
    }
    let mapper_port = mapper_arg.map(|arg| match parse_port(arg) {
        Some(port) => port,
        None => fail(Status::InvalidPort),
    });

    if let Err(e) = FlightlineConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = FlightlineConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FlightlineConfig::default()
    });

    let listener = match TcpListener::bind((config.network.bind_host.as_str(), 0)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind control listener");
            fail(Status::ServerFailed);
        }
    };

    let visits = new_visit_log();
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

    let listener = ControlListener::new(
        listener,
        info.clone(),
        visits,
        gate,
        shutdown_tx.subscribe(),
    );
    let port = match listener.local_port() {
        Ok(port) => port,
        Err(e) => {
            tracing::error!(error = %e, "failed to read bound port");
            fail(Status::ServerFailed);
        }
    };

    // startup contract: the bound port is the only stdout output
    println!("{port}");
    std::io::stdout().flush()?;

    // one-shot registration, before the first accept; failure is fatal so
    // the service never runs half-registered
    if let Some(mapper_port) = mapper_port {
        let host = config.network.connect_host.as_str();
        let mut mapper = match MapperClient::connect(host, mapper_port).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, mapper_port, "mapper registration failed");
                fail(Status::ConnFailed);
            }
        };
        if let Err(e) = mapper.register(id, port).await {
            tracing::error!(error = %e, mapper_port, "mapper registration failed");
            fail(Status::ConnFailed);
        }
        tracing::info!(id = %id, port, mapper_port, "registered with mapper");
    }

    tracing::info!(id = %id, port, "controld accepting connections");
    if let Err(e) = listener.run().await {
        tracing::error!(error = %e, "control listener failed");
        fail(Status::ServerFailed);
    }
    Ok(())
}
