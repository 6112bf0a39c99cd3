//! Hash helpers for the SDK.
//!
//! Everything here is SHA3-256. Domain-separated variants prefix the input with
//! `b"keyless|" + tag + b"|"` so that nonces, identity commitments and signing
//! messages can never collide with one another.
use sha3::{Digest, Sha3_256};

/// Prefix shared by every domain-separated hash in this crate.
const DOMAIN_ROOT: &[u8] = b"keyless|";

/// SHA3-256 digest.
#[inline]
pub fn sha3_256<B: AsRef<[u8]>>(bytes: B) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(bytes.as_ref());
    hasher.finalize().into()
}

/// Domain-separated SHA3-256 over multiple parts with length-prefixing to avoid ambiguity.
///
/// Layout:
/// `prefix = "keyless|{tag}|"` then for each part: `u32_be(len) || part`
pub fn sha3_256_domain_parts(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(DOMAIN_ROOT);
    hasher.update(tag.as_bytes());
    hasher.update(b"|");
    for p in parts {
        hasher.update((p.len() as u32).to_be_bytes());
        hasher.update(p);
    }
    hasher.finalize().into()
}
