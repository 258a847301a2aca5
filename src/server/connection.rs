//! Servicing of a single accepted connection, from first read to close.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::ServerOptions;
use super::handshake::switching_protocols;
use super::request::{Classified, classify};
use super::response::Response;
use crate::format::format_bytes;
use crate::json;
use crate::system::collector::Sampler;

pub const READ_BUFFER_SIZE: usize = 8192;
pub const API_MEMORY_PATH: &str = "/api/memory";

/// Read one request, answer it or stream snapshots, then close.
///
/// Errors are confined to this connection; the caller only logs them.
pub async fn serve<T, S>(mut stream: T, sampler: &mut S, options: &ServerOptions) -> io::Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: Sampler + ?Sized,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let Some(received) = read_request(&mut stream, &mut buf, options.read_timeout).await? else {
        return Ok(());
    };

    match classify(&buf[..received]) {
        Classified::Http { method, path } => {
            debug!(method, path, "http request");
            let response = route(path, sampler, options).await;
            debug!(
                status = response.status,
                body = %format_bytes(response.body.len() as u64),
                "responding"
            );
            stream.write_all(&response.into_bytes()).await?;
        }
        Classified::Upgrade { path, key } => {
            info!(path, "websocket upgrade, starting push stream");
            push_loop(&mut stream, key, sampler, options).await?;
        }
        Classified::Unusable => {
            debug!(bytes = received, "unparseable request, closing");
            return Ok(());
        }
    }

    // The peer may already be gone; nothing left to report either way.
    let _ = stream.shutdown().await;
    Ok(())
}

async fn read_request<T>(
    stream: &mut T,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> io::Result<Option<usize>>
where
    T: AsyncRead + Unpin,
{
    let received = match timeout {
        Some(limit) => match tokio::time::timeout(limit, stream.read(buf)).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(?limit, "client sent nothing before the read timeout");
                return Ok(None);
            }
        },
        None => stream.read(buf).await?,
    };
    if received == 0 {
        debug!("client closed without sending a request");
        return Ok(None);
    }
    Ok(Some(received))
}

/// Map a request path to its response. First match wins.
pub async fn route<S>(path: &str, sampler: &mut S, options: &ServerOptions) -> Response
where
    S: Sampler + ?Sized,
{
    let file = match path {
        API_MEMORY_PATH => return memory_response(sampler, options),
        "/" | "/index.html" => options.static_files.index().await,
        other => options.static_files.load(other).await,
    };
    match file {
        Some(file) => Response::ok(file.content_type, file.bytes),
        None => Response::not_found(),
    }
}

fn memory_response<S>(sampler: &mut S, options: &ServerOptions) -> Response
where
    S: Sampler + ?Sized,
{
    let snapshot = sampler.sample();
    match json::to_json(&snapshot, options.layout) {
        Ok(body) => Response::ok("application/json", body),
        Err(err) => {
            warn!(error = %err, "failed to encode snapshot");
            Response::internal_error()
        }
    }
}

async fn push_loop<T, S>(
    stream: &mut T,
    key: &str,
    sampler: &mut S,
    options: &ServerOptions,
) -> io::Result<()>
where
    T: AsyncWrite + Unpin,
    S: Sampler + ?Sized,
{
    stream.write_all(switching_protocols(key).as_bytes()).await?;

    let mut sent: u64 = 0;
    loop {
        let snapshot = sampler.sample();
        let payload = match json::to_json(&snapshot, options.layout) {
            Ok(body) => options.framing.encode(body),
            Err(err) => {
                warn!(error = %err, "failed to encode snapshot, ending push stream");
                break;
            }
        };
        if let Err(err) = stream.write_all(&payload).await {
            info!(error = %err, sent, "push client went away");
            break;
        }
        sent += 1;
        tokio::time::sleep(options.push_interval).await;
    }
    Ok(())
}
