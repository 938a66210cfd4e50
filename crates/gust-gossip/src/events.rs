//! Node events — the surface the terminal front end consumes.
//!
//! The protocol core never prints. It reports connections and fresh chat
//! messages over an unbounded channel; whoever holds the receiver decides
//! how to render them.

use std::net::SocketAddr;

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// A peer announced itself with HELLO.
    PeerConnected { addr: SocketAddr, name: String },

    /// A fresh (non-duplicate) chat message, with the relay path it had
    /// accumulated by the time it reached us — our immediate sender last.
    ChatReceived {
        name: String,
        text: String,
        path: Vec<String>,
    },
}

pub type EventSender = mpsc::UnboundedSender<NodeEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<NodeEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
