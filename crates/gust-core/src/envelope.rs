//! Gust wire format — the JSON envelope carried in every datagram.
//!
//! One envelope per datagram, no length prefix (UDP frames for us) and no
//! version field. Forward compatibility is purely "unknown type → discard":
//! the tagged enum below rejects anything it does not recognise, and every
//! receive-path caller treats a decode failure as a silent drop.

use serde::{Deserialize, Serialize};

/// Maximum serialized envelope size. Bounded by the UDP/IPv4 datagram limit.
pub const MAX_DATAGRAM: usize = 65535;

/// The structured message unit exchanged between peers.
///
/// The `type` field on the wire is the variant tag. Extra fields in an
/// incoming envelope are tolerated; missing or mistyped required fields
/// fail decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Envelope {
    /// Peer announcement. Sent once to every newly learned address.
    Hello { name: String },

    /// A chat message plus the relay path it has taken so far.
    ///
    /// `id` is the originator's content digest (see [`crate::identity`])
    /// and is the deduplication key. `peers` holds the canonical
    /// `host:port` form of every node that relayed the message, in
    /// traversal order — each relay appends the address it received from.
    Message {
        id: String,
        name: String,
        text: String,
        peers: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("not a valid envelope: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize an envelope to its wire bytes.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, EnvelopeError> {
    serde_json::to_vec(envelope).map_err(EnvelopeError::Encode)
}

/// Parse wire bytes into an envelope.
///
/// Never panics on arbitrary input. Malformed JSON, an unrecognised
/// `type`, or a missing required field all come back as
/// [`EnvelopeError::Decode`] — receive paths drop those and keep listening.
pub fn decode(bytes: &[u8]) -> Result<Envelope, EnvelopeError> {
    serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)
}
