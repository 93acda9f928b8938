//! Single-shot local HTTP listener for redirect-delivered codes.
//!
//! Some two-factor and OAuth-style flows deliver a code by redirecting the
//! browser to a local URL. [`wait_for_code`] binds a port, serves exactly one
//! matching request, and shuts down. It is a callback receiver, not a
//! general HTTP server; request parsing is the minimum needed to read a
//! GET request line.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::Result;

/// Wait for a local HTTP request whose path contains `keyword` and return
/// its query string.
///
/// Listens on `127.0.0.1:port`. Requests without the keyword in the path get
/// a 404 and the listener keeps waiting; the first matching request gets a
/// 200 and ends the wait. Returns `Ok(None)` if `timeout` elapses first.
///
/// Typical use is as a two-factor code source, with the code delivered as
/// the query of a visit to `http://localhost:{port}/{keyword}?{code}`.
pub async fn wait_for_code(port: u16, keyword: &str, timeout: Duration) -> Result<Option<String>> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!("waiting for callback on port {port}");

    match tokio::time::timeout(timeout, serve_until_match(&listener, keyword)).await {
        Ok(result) => result.map(Some),
        Err(_) => {
            tracing::info!("no callback within {timeout:?}");
            Ok(None)
        }
    }
}

async fn serve_until_match(listener: &TcpListener, keyword: &str) -> Result<String> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        tracing::debug!("callback connection from {peer}");

        match handle_connection(&mut stream, keyword).await {
            Ok(Some(query)) => return Ok(query),
            Ok(None) => continue,
            Err(err) => {
                // A bad connection is not a reason to stop listening.
                tracing::debug!("ignoring failed callback connection: {err}");
                continue;
            }
        }
    }
}

/// Serve one connection. Returns the query string when the request matched.
async fn handle_connection(stream: &mut TcpStream, keyword: &str) -> Result<Option<String>> {
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // Only the request line matters: "GET /path?query HTTP/1.1".
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default();
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    if !path.contains(keyword) {
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
            .await?;
        stream.shutdown().await?;
        return Ok(None);
    }

    stream
        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
        .await?;
    stream.shutdown().await?;
    Ok(Some(query.to_string()))
}
