//! Small shared helpers: hex/bytes, hashing, canonical CBOR and the wall clock.

pub mod bytes;
pub mod cbor;
pub mod hash;

/// Current unix time in whole seconds.
#[inline]
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
