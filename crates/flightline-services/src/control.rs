//! Control service — greets visiting aircraft and serves the visit log.
//!
//! Single-message protocol: each worker reads exactly one line, responds,
//! and closes. `log` dumps the visit log; any other line is an aircraft id.

use anyhow::Result;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use flightline_core::codec::{read_token, write_line, LINE};
use flightline_core::protocol::{LOG_REQUEST, LOG_TERMINATOR};

use crate::records::AirplaneRecord;
use crate::registry::VisitLog;
use crate::workers::WorkerGate;

pub struct ControlListener {
    listener: TcpListener,
    info: String,
    visits: VisitLog,
    gate: WorkerGate,
    shutdown: broadcast::Receiver<()>,
}

impl ControlListener {
    pub fn new(
        listener: TcpListener,
        info: String,
        visits: VisitLog,
        gate: WorkerGate,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            info,
            visits,
            gate,
            shutdown,
        }
    }

    pub fn local_port(&self) -> std::io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("control listener shutting down");
                    return Ok(());
                }

                result = self.listener.accept() => {
                    let (stream, peer) = result?;
                    tracing::debug!(%peer, "control connection accepted");
                    let info = self.info.clone();
                    let visits = self.visits.clone();
                    let permit = self.gate.admit().await;
                    tokio::spawn(async move {
                        let _permit = permit;
                        serve_visit(stream, info, visits).await;
                    });
                }
            }
        }
    }
}

async fn serve_visit(stream: TcpStream, info: String, visits: VisitLog) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let line = match read_token(&mut reader, LINE).await {
        Ok(Some(line)) => line,
        Ok(None) => {
            tracing::debug!("control connection closed before a message arrived");
            return;
        }
        Err(e) => {
            tracing::debug!(error = %e, "dropping unreadable control connection");
            return;
        }
    };

    if line == LOG_REQUEST {
        let snapshot = visits.snapshot().await;
        tracing::debug!(count = snapshot.len(), "visit log dump");
        for airplane in snapshot {
            if write_line(&mut write_half, &airplane.id).await.is_err() {
                return;
            }
        }
        let _ = write_line(&mut write_half, LOG_TERMINATOR).await;
    } else {
        // any other line is a visiting aircraft id, duplicates included
        visits.insert(AirplaneRecord::new(&line)).await;
        tracing::debug!(id = %line, "aircraft visit recorded");
        let _ = write_line(&mut write_half, &info).await;
    }
    // worker never reads a second message; dropping the halves closes
}
