//! Local identity — nickname, process tag, and message digests.
//!
//! Every process gets a fresh 16-byte random tag at startup. Message
//! digests mix the tag with a monotonic send counter, so two messages
//! from the same process can never collide and messages from different
//! processes collide only with negligible probability. The digest is a
//! deduplication key, not a trust mechanism.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::RngCore;

/// Fixed for the process lifetime: nickname and random tag are set once,
/// the send counter only ever goes up.
pub struct Identity {
    nickname: String,
    tag: [u8; 16],
    counter: AtomicU64,
}

impl Identity {
    /// Fix the nickname and generate a fresh process tag.
    pub fn new(nickname: impl Into<String>) -> Self {
        let mut tag = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut tag);
        Self {
            nickname: nickname.into(),
            tag,
            counter: AtomicU64::new(0),
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Digest for the next locally originated message.
    ///
    /// Atomically takes the current counter value and increments it, then
    /// hashes `(nickname, text, counter, tag)` with NUL separators between
    /// fields so `("a", "b")` and `("ab", "")` cannot splice into the same
    /// preimage. Returns the BLAKE3 hash hex-encoded.
    pub fn next_digest(&self, text: &str) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.nickname.as_bytes());
        hasher.update(&[0]);
        hasher.update(text.as_bytes());
        hasher.update(&[0]);
        hasher.update(&seq.to_le_bytes());
        hasher.update(&[0]);
        hasher.update(&self.tag);
        hex::encode(hasher.finalize().as_bytes())
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // tag stays out of logs — it is the only thing distinguishing two
        // processes with the same nickname
        f.debug_struct("Identity")
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}
