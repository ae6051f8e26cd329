//! Mapper service — the airport name-to-port registry listener.
//!
//! One accept loop, one worker task per connection. A connection carries any
//! number of requests; the worker loops until the peer closes or sends
//! something unreadable.

use anyhow::Result;
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use flightline_core::codec::write_line;
use flightline_core::protocol::{MapperRequest, NOT_FOUND};

use crate::records::AirportRecord;
use crate::registry::AirportDirectory;
use crate::workers::WorkerGate;

pub struct MapperListener {
    listener: TcpListener,
    directory: AirportDirectory,
    gate: WorkerGate,
    shutdown: broadcast::Receiver<()>,
}

impl MapperListener {
    pub fn new(
        listener: TcpListener,
        directory: AirportDirectory,
        gate: WorkerGate,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            directory,
            gate,
            shutdown,
        }
    }

    /// The port the OS bound for us.
    pub fn local_port(&self) -> std::io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("mapper listener shutting down");
                    return Ok(());
                }

                result = self.listener.accept() => {
                    // accept failure is a server failure, not a per-connection one
                    let (stream, peer) = result?;
                    tracing::debug!(%peer, "mapper connection accepted");
                    let directory = self.directory.clone();
                    let permit = self.gate.admit().await;
                    tokio::spawn(async move {
                        let _permit = permit;
                        let (read_half, write_half) = stream.into_split();
                        serve_connection(read_half, write_half, directory).await;
                    });
                }
            }
        }
    }
}

async fn serve_connection(
    read_half: OwnedReadHalf,
    mut write_half: OwnedWriteHalf,
    directory: AirportDirectory,
) {
    let mut reader = BufReader::new(read_half);

    loop {
        let request = match MapperRequest::read_from(&mut reader).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("mapper connection closed by peer");
                return;
            }
            Err(e) => {
                // protocol violation — close silently, nothing written back
                tracing::debug!(error = %e, "dropping unreadable mapper connection");
                return;
            }
        };

        match request {
            MapperRequest::PortLookup { id } => {
                let reply = match directory.find(&id).await {
                    Some(airport) => airport.port,
                    None => NOT_FOUND.to_string(),
                };
                tracing::debug!(id = %id, reply = %reply, "port lookup");
                if write_line(&mut write_half, &reply).await.is_err() {
                    return;
                }
            }

            MapperRequest::Register { id, port } => {
                let stored = directory.insert(AirportRecord::new(&id, &port)).await;
                tracing::debug!(id = %id, port = %port, stored, "registration");
                // no response on the wire either way
            }

            MapperRequest::Directory => {
                // copy under the registry lock, write after releasing it
                let snapshot = directory.snapshot().await;
                tracing::debug!(count = snapshot.len(), "directory dump");
                for airport in snapshot {
                    if write_line(&mut write_half, &airport.directory_line())
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    }
}
