//! Peer registry — the set of known remote endpoints a node broadcasts to.
//!
//! Shared between the listener task and the command loop. Peers are never
//! evicted: the set grows monotonically for the process lifetime, matching
//! the manual-add / learn-from-traffic discovery model. A peer that goes
//! away simply stops answering; we keep sending into the void.

use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashSet;

#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<DashSet<SocketAddr>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address. Returns true iff it was not already known.
    ///
    /// The HELLO-on-first-contact side effect belongs to the caller and
    /// must happen after this returns — never while a shard lock is held.
    pub fn insert(&self, addr: SocketAddr) -> bool {
        self.peers.insert(addr)
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.contains(addr)
    }

    /// Snapshot for broadcast targeting. The set may grow while the
    /// snapshot is being walked; new peers catch the next broadcast.
    pub fn snapshot(&self) -> Vec<SocketAddr> {
        self.peers.iter().map(|a| *a).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
