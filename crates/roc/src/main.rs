//! roc — an aircraft client that visits a sequence of airports.
//!
//! `roc <plane_id> <mapper_port|-> [destinations...]`
//!
//! Three strictly sequential phases: resolve every destination to a port
//! (numeric arguments directly, ids via the Mapper), visit each Control in
//! argument order, then print the travel log.

use std::io::Write;

use anyhow::Result;

use flightline_core::config::FlightlineConfig;
use flightline_core::protocol::{parse_port, valid_token};
use flightline_services::{visit_control, MapperClient};

const NO_MAPPER: &str = "-";

/// Process exit statuses, reported on stderr.
#[derive(Clone, Copy)]
enum Status {
    Usage = 1,
    InvalidMapperPort = 2,
    MapperRequired = 3,
    MapperConnFailed = 4,
    NoMapEntry = 5,
    VisitFailed = 6,
}

impl Status {
    fn message(self) -> &'static str {
        match self {
            Status::Usage => "Usage: roc id mapper {airports}",
            Status::InvalidMapperPort => "Invalid mapper port",
            Status::MapperRequired => "Mapper required",
            Status::MapperConnFailed => "Failed to connect to mapper",
            Status::NoMapEntry => "No map entry for destination",
            Status::VisitFailed => "Failed to connect to at least one destination",
        }
    }
}

fn fail(status: Status) -> ! {
    eprintln!("{}", status.message());
    std::process::exit(status as i32);
}

/// One destination argument with its resolved port string. The port stays a
/// string until the visit — the Mapper hands back whatever was registered.
struct Destination {
    arg: String,
    port: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        fail(Status::Usage);
    }
    let plane_id = args[0].as_str();
    if !valid_token(plane_id) {
        fail(Status::Usage);
    }
    let mapper_port = match args[1].as_str() {
        NO_MAPPER => None,
        arg => match parse_port(arg) {
            Some(port) => Some(port),
            None => fail(Status::InvalidMapperPort),
        },
    };

    let config = FlightlineConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        FlightlineConfig::default()
    });
    let host = config.network.connect_host.as_str();

    // one mapper connection serves every lookup of the run
    let mut mapper = match mapper_port {
        Some(port) => match MapperClient::connect(host, port).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, port, "mapper connection failed");
                fail(Status::MapperConnFailed);
            }
        },
        None => None,
    };

    // ── Resolve phase ────────────────────────────────────────────────────────

    let mut destinations = Vec::new();
    for arg in &args[2..] {
        if !valid_token(arg) {
            fail(Status::MapperRequired);
        }
        let port = if parse_port(arg).is_some() {
            // numeric destination, no mapper contact
            arg.clone()
        } else {
            let mapper = match mapper.as_mut() {
                Some(mapper) => mapper,
                None => fail(Status::MapperRequired),
            };
            match mapper.lookup(arg).await {
                Ok(Some(port)) => port,
                Ok(None) => fail(Status::NoMapEntry),
                Err(e) => {
                    tracing::error!(error = %e, id = %arg, "mapper lookup failed");
                    fail(Status::MapperConnFailed);
                }
            }
        };
        destinations.push(Destination {
            arg: arg.clone(),
            port,
        });
    }

    // ── Visit phase ──────────────────────────────────────────────────────────

    let mut travel_log: Vec<Option<String>> = Vec::new();
    for destination in &destinations {
        let info = match parse_port(&destination.port) {
            Some(port) => match visit_control(host, port, plane_id).await {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(error = %e, dest = %destination.arg, "visit failed");
                    None
                }
            },
            None => {
                tracing::warn!(
                    dest = %destination.arg,
                    port = %destination.port,
                    "resolved port is not usable"
                );
                None
            }
        };
        travel_log.push(info);
    }

    // ── Report phase ─────────────────────────────────────────────────────────

    let mut stdout = std::io::stdout();
    for info in travel_log.iter().flatten() {
        writeln!(stdout, "{info}")?;
    }
    stdout.flush()?;

    if travel_log.iter().any(|info| info.is_none()) {
        fail(Status::VisitFailed);
    }
    Ok(())
}
