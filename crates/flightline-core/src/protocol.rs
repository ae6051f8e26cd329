//! Wire protocol — message types for the Mapper and Control roles.
//!
//! Both protocols are newline-framed text. Mapper messages carry a single
//! leading type byte; Control messages are one bare line per connection.
//! Parsing is built on the frame codec and shares its end-of-stream
//! convention: `Ok(None)` means the peer closed the connection.

use tokio::io::AsyncBufRead;

use crate::codec::{self, CodecError, FIELD, LINE};

// ── Message bytes and sentinels ──────────────────────────────────────────────

/// Mapper request: look up the port for an airport id.
pub const PORT_REQUEST: u8 = b'?';
/// Mapper request: register an airport id and port.
pub const ADD_AIRPORT: u8 = b'!';
/// Mapper request: dump the full directory.
pub const INFO_REQUEST: u8 = b'@';

/// Mapper response line for an id with no directory entry.
pub const NOT_FOUND: &str = ";";
/// Control request line asking for the visit log.
pub const LOG_REQUEST: &str = "log";
/// Line terminating a Control visit-log dump.
pub const LOG_TERMINATOR: &str = ".";

pub const MIN_PORT: u16 = 1;

// ── Errors ───────────────────────────────────────────────────────────────────

/// A request that could not be interpreted. Services respond to any of these
/// by closing the connection; nothing is written back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown message type byte: 0x{0:02x}")]
    UnknownType(u8),

    #[error("stream ended inside a message")]
    Truncated,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ── Mapper requests ──────────────────────────────────────────────────────────

/// One parsed Mapper request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperRequest {
    /// `?<id>\n` — answer with the port line, or the not-found sentinel.
    PortLookup { id: String },
    /// `!<id>:<port>\n` — insert if absent, no response either way.
    Register { id: String, port: String },
    /// `@\n` — dump every `id:port` line in ascending id order.
    Directory,
}

impl MapperRequest {
    /// Read the next request off the connection.
    ///
    /// `Ok(None)` when the peer closed the stream between messages. A close
    /// inside a message, an unknown type byte, or a non-UTF-8 field is an
    /// error — callers drop the connection.
    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, ProtocolError>
    where
        R: AsyncBufRead + Unpin,
    {
        let type_byte = match codec::read_byte(reader).await? {
            Some(b) => b,
            None => return Ok(None),
        };

        match type_byte {
            PORT_REQUEST => {
                let id = field(reader, LINE).await?;
                Ok(Some(MapperRequest::PortLookup { id }))
            }
            ADD_AIRPORT => {
                let id = field(reader, FIELD).await?;
                let port = field(reader, LINE).await?;
                Ok(Some(MapperRequest::Register { id, port }))
            }
            INFO_REQUEST => {
                // rest of the line carries nothing
                field(reader, LINE).await?;
                Ok(Some(MapperRequest::Directory))
            }
            other => Err(ProtocolError::UnknownType(other)),
        }
    }

    /// Render the request in wire form, framing included.
    pub fn encode(&self) -> String {
        match self {
            MapperRequest::PortLookup { id } => format!("?{id}\n"),
            MapperRequest::Register { id, port } => format!("!{id}:{port}\n"),
            MapperRequest::Directory => "@\n".to_string(),
        }
    }
}

async fn field<R>(reader: &mut R, sentinel: u8) -> Result<String, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    codec::read_token(reader, sentinel)
        .await?
        .ok_or(ProtocolError::Truncated)
}

// ── Token validation ─────────────────────────────────────────────────────────

/// Whether `token` may appear as a protocol field. Newlines would break
/// framing and `:` would break the registration payload, so they are
/// rejected before any token reaches a stream.
pub fn valid_token(token: &str) -> bool {
    !token.bytes().any(|b| matches!(b, b'\n' | b'\r' | b':'))
}

/// Parse a destination or mapper-port argument as a port number.
/// Accepts decimal 1–65535 only; anything else is not a port.
pub fn parse_port(token: &str) -> Option<u16> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u16>().ok().filter(|p| *p >= MIN_PORT)
}
