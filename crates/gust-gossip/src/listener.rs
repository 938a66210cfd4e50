//! Inbound datagram listener.
//!
//! Polls the node socket with a bounded timeout and feeds every datagram
//! to the protocol core. Nothing that arrives on the wire can take this
//! loop down: transport errors and undecodable payloads are logged (at
//! most) and the loop continues. Only the shutdown signal ends it.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;

use gust_core::envelope::MAX_DATAGRAM;

use crate::node::Node;
use crate::transport;

/// Default upper bound on a single receive wait.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(200);

pub struct Listener {
    node: Node,
    shutdown: broadcast::Receiver<()>,
    recv_timeout: Duration,
}

impl Listener {
    pub fn new(node: Node, shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            node,
            shutdown,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Run until shutdown. Exits within one receive-timeout interval of
    /// the signal.
    pub async fn run(mut self) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        tracing::info!(
            addr = %self.node.local_addr()?,
            timeout_ms = self.recv_timeout.as_millis() as u64,
            "listener starting"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("listener shutting down");
                    return Ok(());
                }

                result = transport::recv_timeout(self.node.socket(), &mut buf, self.recv_timeout) => {
                    match result {
                        Ok(Some((len, src))) => self.node.handle_datagram(&buf[..len], src).await,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "recv_from failed");
                            continue;
                        }
                    }
                }
            }
        }
    }
}
