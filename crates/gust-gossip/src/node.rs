//! Protocol core — interprets inbound envelopes, maintains the peer and
//! seen-message state, and originates local messages.
//!
//! There is no multi-step handshake; every envelope is handled on its
//! own. The flood is bounded by two rules: a message is relayed at most
//! once per node (seen-message set), and never straight back to the
//! address it just arrived from. A copy can still revisit a node via a
//! longer path; the seen set is what stops the amplification then.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use gust_core::envelope::{self, Envelope};
use gust_core::Identity;

use crate::dedup::SeenMessages;
use crate::events::{EventSender, NodeEvent};
use crate::peer::PeerRegistry;
use crate::transport;

/// One chat node: socket, identity, shared state, event surface.
///
/// Cheap to clone — the listener task and the command loop each hold a
/// clone and mutate the same underlying registry and seen set.
#[derive(Clone)]
pub struct Node {
    socket: Arc<UdpSocket>,
    identity: Arc<Identity>,
    peers: PeerRegistry,
    seen: SeenMessages,
    events: EventSender,
}

impl Node {
    pub fn new(socket: Arc<UdpSocket>, identity: Arc<Identity>, events: EventSender) -> Self {
        Self {
            socket,
            identity,
            peers: PeerRegistry::new(),
            seen: SeenMessages::new(),
            events,
        }
    }

    pub fn nickname(&self) -> &str {
        self.identity.nickname()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn seen(&self) -> &SeenMessages {
        &self.seen
    }

    pub(crate) fn socket(&self) -> &UdpSocket {
        &self.socket
    }

    /// Entry point for every inbound datagram.
    ///
    /// Undecodable payloads are dropped here, before any dispatch — an
    /// expected condition on an open UDP port, not an error.
    pub async fn handle_datagram(&self, bytes: &[u8], src: SocketAddr) {
        let envelope = match envelope::decode(bytes) {
            Ok(e) => e,
            Err(e) => {
                tracing::trace!(%src, error = %e, "dropping undecodable datagram");
                return;
            }
        };

        match envelope {
            Envelope::Hello { name } => self.handle_hello(name, src).await,
            Envelope::Message {
                id,
                name,
                text,
                peers,
            } => self.handle_message(id, name, text, peers, src).await,
        }
    }

    /// HELLO is idempotent and cheap to repeat — no deduplication.
    async fn handle_hello(&self, name: String, src: SocketAddr) {
        tracing::debug!(%src, name, "peer announced itself");
        let _ = self.events.send(NodeEvent::PeerConnected { addr: src, name });
        self.add_peer(src).await;
    }

    async fn handle_message(
        &self,
        id: String,
        name: String,
        text: String,
        mut peers: Vec<String>,
        src: SocketAddr,
    ) {
        // Learn the relay as a peer even when the message itself is a
        // duplicate — connectivity grows either way.
        self.add_peer(src).await;

        if !self.seen.first_sighting(&id) {
            tracing::trace!(%src, id, "duplicate message suppressed");
            return;
        }

        peers.push(src.to_string());
        let _ = self.events.send(NodeEvent::ChatReceived {
            name: name.clone(),
            text: text.clone(),
            path: peers.clone(),
        });

        // Relay onward to everyone except the address it arrived from.
        let relay = Envelope::Message {
            id,
            name,
            text,
            peers,
        };
        self.broadcast(&relay, Some(src)).await;
    }

    /// Learn a peer address. On first contact, announce ourselves to it.
    ///
    /// The reciprocal HELLO means both sides end up in each other's
    /// registry: the remote's own `add_peer` for us short-circuits,
    /// so the exchange settles after one round trip.
    pub async fn add_peer(&self, addr: SocketAddr) {
        if !self.peers.insert(addr) {
            return;
        }
        tracing::debug!(%addr, total = self.peers.len(), "peer added");

        // Side-effect send happens after the registry insert returns —
        // no container lock is held across network I/O.
        let hello = Envelope::Hello {
            name: self.identity.nickname().to_string(),
        };
        match envelope::encode(&hello) {
            Ok(bytes) => transport::send(&self.socket, &bytes, addr).await,
            Err(e) => tracing::warn!(error = %e, "failed to encode hello"),
        }
    }

    /// Originate a chat message: digest it, record our own digest so a
    /// flooded-back copy is recognised, and broadcast to every known peer.
    pub async fn send_chat(&self, text: &str) {
        let id = self.identity.next_digest(text);
        self.seen.first_sighting(&id);

        let message = Envelope::Message {
            id,
            name: self.identity.nickname().to_string(),
            text: text.to_string(),
            peers: Vec::new(),
        };
        self.broadcast(&message, None).await;
    }

    /// Send one envelope to every registry entry except `exclude`.
    ///
    /// Works from a snapshot; sends are sequential fire-and-forget with
    /// no state lock held.
    async fn broadcast(&self, envelope: &Envelope, exclude: Option<SocketAddr>) {
        let bytes = match envelope::encode(envelope) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode envelope");
                return;
            }
        };

        for peer in self.peers.snapshot() {
            if Some(peer) == exclude {
                continue;
            }
            transport::send(&self.socket, &bytes, peer).await;
        }
    }
}
