//! Seen-message set — suppresses reprocessing and re-flooding of
//! messages the node has already handled.
//!
//! Digests are never pruned; the set grows for the process lifetime.
//! That trades memory for simplicity and is what bounds the flood: a
//! message can revisit a node through a longer path, but it can only be
//! relayed once.

use std::sync::Arc;

use dashmap::DashSet;

#[derive(Clone, Default)]
pub struct SeenMessages {
    seen: Arc<DashSet<String>>,
}

impl SeenMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-insert. Returns true iff this digest has not been
    /// seen before; the caller processes the message exactly when this
    /// returns true.
    pub fn first_sighting(&self, digest: &str) -> bool {
        self.seen.insert(digest.to_string())
    }

    pub fn has_seen(&self, digest: &str) -> bool {
        self.seen.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
