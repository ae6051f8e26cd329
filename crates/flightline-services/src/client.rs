//! Outbound protocol clients — the connecting side of both wire protocols.
//!
//! Used by controld for startup registration, by roc for resolution and
//! visits, and by the integration tests.

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use flightline_core::codec::{read_token, write_line, CodecError, LINE};
use flightline_core::protocol::{MapperRequest, LOG_REQUEST, LOG_TERMINATOR, NOT_FOUND};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("server closed the connection before responding")]
    ConnectionClosed,
}

/// A live connection to a Mapper. One connection serves any number of
/// lookups and registrations.
pub struct MapperClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl MapperClient {
    pub async fn connect(host: &str, port: u16) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((host, port)).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Resolve an airport id to its port. `None` when the Mapper has no
    /// entry (the `;` sentinel line).
    pub async fn lookup(&mut self, id: &str) -> Result<Option<String>, ClientError> {
        self.send(MapperRequest::PortLookup { id: id.into() })
            .await?;
        let reply = read_token(&mut self.reader, LINE)
            .await?
            .ok_or(ClientError::ConnectionClosed)?;
        if reply == NOT_FOUND {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    /// Register an airport. The Mapper never responds to registrations,
    /// successful or not.
    pub async fn register(&mut self, id: &str, port: u16) -> Result<(), ClientError> {
        self.send(MapperRequest::Register {
            id: id.into(),
            port: port.to_string(),
        })
        .await
    }

    /// Fetch the full directory as `(id, port)` pairs.
    ///
    /// The dump has no terminator — the Mapper just stops writing — so this
    /// reads until the response drains and must be the last request on this
    /// connection.
    pub async fn directory(mut self) -> Result<Vec<(String, String)>, ClientError> {
        self.send(MapperRequest::Directory).await?;
        self.writer.shutdown().await?;

        let mut entries = Vec::new();
        while let Some(line) = read_token(&mut self.reader, LINE).await? {
            if let Some((id, port)) = line.split_once(':') {
                entries.push((id.to_string(), port.to_string()));
            }
        }
        Ok(entries)
    }

    async fn send(&mut self, request: MapperRequest) -> Result<(), ClientError> {
        self.writer.write_all(request.encode().as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Visit a Control: fresh connection, announce the plane id, read back the
/// airport's info line.
pub async fn visit_control(host: &str, port: u16, plane_id: &str) -> Result<String, ClientError> {
    let stream = TcpStream::connect((host, port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_line(&mut write_half, plane_id).await?;
    read_token(&mut reader, LINE)
        .await?
        .ok_or(ClientError::ConnectionClosed)
}

/// Fetch a Control's visit log: the ids in ascending order, without the
/// trailing `.` terminator line.
pub async fn fetch_control_log(host: &str, port: u16) -> Result<Vec<String>, ClientError> {
    let stream = TcpStream::connect((host, port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_line(&mut write_half, LOG_REQUEST).await?;

    let mut ids = Vec::new();
    loop {
        let line = read_token(&mut reader, LINE)
            .await?
            .ok_or(ClientError::ConnectionClosed)?;
        if line == LOG_TERMINATOR {
            return Ok(ids);
        }
        ids.push(line);
    }
}
