//! gust-core — envelope wire format, local identity, and configuration.
//! All other Gust crates depend on this one.

pub mod config;
pub mod envelope;
pub mod identity;

pub use envelope::{decode, encode, Envelope, EnvelopeError};
pub use identity::Identity;
