//! JSON-lines request listener.
//!
//! Each connection carries any number of [`CommandRequest`] documents, one
//! per line. Every non-blank line gets exactly one [`CommandResponse`] line
//! back, in order. Malformed lines are answered, not fatal.
//!
//! Lines longer than [`MAX_REQUEST_LINE`] are answered with an
//! `invalid request` response and the rest of the line is discarded
//! without being buffered.
//!
//! [`CommandRequest`]: crate::protocol::CommandRequest
//! [`CommandResponse`]: crate::protocol::CommandResponse

use super::ServerError;
use crate::protocol::{CommandResponse, SingleShotAdapter};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Longest request line accepted, newline excluded.
pub const MAX_REQUEST_LINE: usize = 64 * 1024;

/// One unit read from a request connection.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    /// The line exceeded [`MAX_REQUEST_LINE`]; its remainder is still unread.
    TooLong,
    Eof,
}

/// Reads one line, holding at most `max + 1` bytes of it in memory.
async fn next_frame<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > max {
        return Ok(Frame::TooLong);
    }
    Ok(Frame::Line(String::from_utf8_lossy(buf).into_owned()))
}

/// Consumes input up to and including the next newline.
async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Accepts request connections until `shutdown` flips to `true`.
pub(super) async fn accept_loop(
    listener: TcpListener,
    adapter: SingleShotAdapter,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let adapter = adapter.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(err) = serve_requests(stream, peer, adapter, shutdown).await {
                            debug!(peer = %peer, error = %err, "request connection ended with error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "request accept failed"),
            },
        }
    }
    debug!("request listener stopped");
}

/// Answers requests on one connection until EOF or shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Io`] on socket failure.
pub async fn serve_requests(
    stream: TcpStream,
    peer: SocketAddr,
    adapter: SingleShotAdapter,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    info!(peer = %peer, "request connection accepted");

    let mut served = 0usize;
    loop {
        let frame = tokio::select! {
            _ = shutdown.changed() => break,
            frame = next_frame(&mut reader, &mut buf, MAX_REQUEST_LINE) => frame?,
        };
        let oversized = frame == Frame::TooLong;
        let response = match frame {
            Frame::Eof => break,
            Frame::Line(line) if line.trim().is_empty() => continue,
            Frame::Line(line) => {
                let adapter = adapter.clone();
                tokio::task::spawn_blocking(move || adapter.handle_json(&line)).await?
            }
            Frame::TooLong => {
                warn!(peer = %peer, max = MAX_REQUEST_LINE, "oversized request line");
                CommandResponse::invalid_request(format!(
                    "line exceeds {MAX_REQUEST_LINE} bytes"
                ))
            }
        };

        let mut out = response.to_json_line();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        served += 1;

        if oversized {
            buf = Vec::new();
            tokio::select! {
                _ = shutdown.changed() => break,
                skipped = discard_line(&mut reader) => skipped?,
            }
        }
    }

    let _ = writer.shutdown().await;
    info!(peer = %peer, served, "request connection closed");
    Ok(())
}
