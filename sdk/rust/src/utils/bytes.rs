//! Byte/hex helpers used across the SDK.
//!
//! Conventions:
//! - Hex strings are **lowercase** and **0x-prefixed** in canonical form.
//! - Decoders accept with/without `0x` and both cases.
//! - Fixed-size helpers either require an exact length or left-pad (big-endian).

use crate::error::Error;

/// Whether the string starts with `0x` or `0X`.
#[inline]
pub fn has_0x(s: &str) -> bool {
    s.starts_with("0x") || s.starts_with("0X")
}

/// Strip a leading `0x`/`0X` prefix; return the original if absent.
#[inline]
pub fn strip_0x(s: &str) -> &str {
    if has_0x(s) { &s[2..] } else { s }
}

/// Encode bytes to canonical lowercase `0x`-hex.
#[inline]
pub fn hex_encode<B: AsRef<[u8]>>(bytes: B) -> String {
    format!("0x{}", hex::encode(bytes.as_ref()))
}

/// Decode hex into bytes. Accepts with/without `0x`. Odd lengths are left-padded
/// with a zero nibble.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, Error> {
    let mut hex = strip_0x(s.trim()).to_string();
    if hex.is_empty() {
        return Ok(Vec::new());
    }
    if hex.len() % 2 == 1 {
        hex.insert(0, '0');
    }
    Ok(hex::decode(hex)?)
}

/// Convert a byte slice into a fixed-size array `[u8; N]` by **left-padding with zeros**.
/// Returns an error if the input is longer than `N`.
pub fn left_pad_to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Error> {
    if bytes.len() > N {
        return Err(Error::InvalidParams(format!(
            "input of {} bytes longer than target {N}",
            bytes.len()
        )));
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

/// Decode hex that must encode exactly `N` bytes.
pub fn hex_to_exact<const N: usize>(s: &str) -> Result<[u8; N], Error> {
    let bytes = hex_decode(s)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        Error::InvalidParams(format!("expected {N} bytes of hex, got {}", bytes.len()))
    })
}
