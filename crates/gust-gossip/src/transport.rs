//! UDP transport — bind, timeout-bounded receive, fire-and-forget send.
//!
//! There is exactly one socket per node, bound on all interfaces. Sends
//! carry no delivery confirmation and are never retried; a failed send is
//! logged and forgotten, consistent with unreliable-transport semantics.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;

/// Bind the node socket on all local interfaces.
///
/// A port conflict at startup is fatal — there is nothing sensible to do
/// without a socket, so the error propagates with context and the process
/// exits before any loop starts.
pub async fn bind(port: u16) -> Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("failed to bind UDP port {port}"))?;
    Ok(Arc::new(socket))
}

/// Receive one datagram, waiting at most `timeout`.
///
/// Returns `Ok(None)` when the timeout elapses with nothing received, so
/// callers can re-check their shutdown signal between waits.
pub async fn recv_timeout(
    socket: &UdpSocket,
    buf: &mut [u8],
    timeout: Duration,
) -> std::io::Result<Option<(usize, SocketAddr)>> {
    match tokio::time::timeout(timeout, socket.recv_from(buf)).await {
        Ok(Ok((len, addr))) => Ok(Some((len, addr))),
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => Ok(None),
    }
}

/// Fire-and-forget send. Errors are logged at `warn` and swallowed.
pub async fn send(socket: &UdpSocket, payload: &[u8], dest: SocketAddr) {
    match socket.send_to(payload, dest).await {
        Ok(n) => tracing::trace!(bytes = n, %dest, "datagram sent"),
        Err(e) => tracing::warn!(error = %e, %dest, "send failed"),
    }
}
