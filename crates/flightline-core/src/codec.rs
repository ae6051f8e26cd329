//! Frame codec — sentinel-delimited text tokens over a byte stream.
//!
//! This is the parsing primitive under every flightline role. A frame is the
//! bytes up to (not including) a sentinel byte; the sentinel is consumed.
//! The codec has no knowledge of message semantics.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Sentinel terminating a full line.
pub const LINE: u8 = b'\n';
/// Sentinel separating the id and port fields of a registration.
pub const FIELD: u8 = b':';

/// Errors that can arise while reading a frame.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame is not valid UTF-8")]
    NotUtf8(#[from] std::string::FromUtf8Error),
}

/// Read one token terminated by `sentinel`.
///
/// Returns `Ok(Some(token))` when the sentinel was found — the token may be
/// empty if the sentinel was the first byte. Returns `Ok(None)` on
/// end-of-stream, including end-of-stream in the middle of a token: a peer
/// that hangs up mid-frame is treated as a closed connection, never as a
/// malformed message. There is no length limit.
pub async fn read_token<R>(reader: &mut R, sentinel: u8) -> Result<Option<String>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.read_until(sentinel, &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&sentinel) {
        buf.pop();
    } else {
        // stream ended before the sentinel arrived
        return Ok(None);
    }
    Ok(Some(String::from_utf8(buf)?))
}

/// Read a single byte, `Ok(None)` on end-of-stream.
pub async fn read_byte<R>(reader: &mut R) -> Result<Option<u8>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    match reader.read_u8().await {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write `line` followed by the line sentinel and flush.
pub async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(&[LINE]).await?;
    writer.flush().await
}
