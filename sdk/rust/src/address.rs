//! Account addresses and authentication keys.
//!
//! Format:
//!   address = 32 raw bytes, displayed as lowercase `0x` + 64 hex chars
//!   auth_key = sha3_256(public_key_bytes || scheme_byte)
//!
//! For a freshly created account the address equals its authentication key.
//!
//! Notes:
//! - Parsing is **relaxed** by default: `0x1` is accepted and left-padded, as
//!   framework modules are conventionally written in short form.
//! - [`AccountAddress::from_str_strict`] requires the full 64-char form.

use crate::error::{Error, Result};
use crate::utils::bytes::{hex_decode, hex_encode, left_pad_to_array, strip_0x};
use crate::utils::hash::sha3_256;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Address length in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Scheme byte appended to a single-key public key before hashing.
pub const SINGLE_KEY_SCHEME: u8 = 0x02;

/// Canonical account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ADDRESS_LENGTH]);

impl core::fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "AccountAddress({})", self)
    }
}

impl AccountAddress {
    /// `0x1`, home of the framework modules.
    pub const ONE: Self = Self::from_u8(1);

    const fn from_u8(last: u8) -> Self {
        let mut b = [0u8; ADDRESS_LENGTH];
        b[ADDRESS_LENGTH - 1] = last;
        Self(b)
    }

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build from raw bytes (exactly 32).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|_| {
            Error::Address(format!("address must be {ADDRESS_LENGTH} bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Parse `0x`-hex, accepting short forms such as `0x1`.
    pub fn from_str_relaxed(s: &str) -> Result<Self> {
        let hex = strip_0x(s.trim());
        if hex.is_empty() || hex.len() > ADDRESS_LENGTH * 2 {
            return Err(Error::Address(format!("invalid address length: {s}")));
        }
        let bytes = hex_decode(hex).map_err(|e| Error::Address(format!("{s}: {e}")))?;
        Ok(Self(left_pad_to_array::<ADDRESS_LENGTH>(&bytes)?))
    }

    /// Parse the full `0x` + 64 hex chars form only.
    pub fn from_str_strict(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| Error::Address(format!("missing 0x prefix: {s}")))?;
        if hex.len() != ADDRESS_LENGTH * 2 {
            return Err(Error::Address(format!(
                "expected {} hex chars, got {}",
                ADDRESS_LENGTH * 2,
                hex.len()
            )));
        }
        Self::from_str_relaxed(s)
    }

    /// Short form with leading zeros trimmed (`0x1`), as used in function ids
    /// and type tags.
    pub fn to_short_string(&self) -> String {
        let full = hex::encode(self.0);
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }

    /// Quick boolean validator for a candidate address string.
    pub fn is_valid(s: &str) -> bool {
        Self::from_str_relaxed(s).is_ok()
    }
}

impl Display for AccountAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&hex_encode(self.0))
    }
}

impl FromStr for AccountAddress {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_relaxed(s)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str_relaxed(&s).map_err(serde::de::Error::custom)
    }
}

/// Authentication key: the hash that authorizes a public key for an account.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticationKey([u8; 32]);

impl core::fmt::Debug for AuthenticationKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "AuthenticationKey({})", hex_encode(self.0))
    }
}

impl AuthenticationKey {
    /// `sha3_256(public_key_bytes || scheme)`.
    pub fn from_public_key_bytes(public_key: &[u8], scheme: u8) -> Self {
        let mut preimage = Vec::with_capacity(public_key.len() + 1);
        preimage.extend_from_slice(public_key);
        preimage.push(scheme);
        Self(sha3_256(preimage))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Address of an account whose key has never been rotated.
    pub fn derived_address(&self) -> AccountAddress {
        AccountAddress(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_short_form() {
        let one: AccountAddress = "0x1".parse().unwrap();
        assert_eq!(one, AccountAddress::ONE);
        assert_eq!(
            one.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn short_string_trims_leading_zeros() {
        assert_eq!(AccountAddress::ONE.to_short_string(), "0x1");
        assert_eq!(AccountAddress::new([0; 32]).to_short_string(), "0x0");
        let full = AccountAddress::new([0xab; 32]);
        assert_eq!(full.to_short_string(), full.to_string());
    }

    #[test]
    fn strict_requires_full_length() {
        assert!(AccountAddress::from_str_strict("0x1").is_err());
        let full = AccountAddress::ONE.to_string();
        assert_eq!(AccountAddress::from_str_strict(&full).unwrap(), AccountAddress::ONE);
        assert!(AccountAddress::from_str_strict(&full[2..]).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(!AccountAddress::is_valid(""));
        assert!(!AccountAddress::is_valid("0xzz"));
        assert!(!AccountAddress::is_valid(&format!("0x{}", "1".repeat(65))));
    }

    #[test]
    fn serde_as_hex_string() {
        let addr = AccountAddress::new([0xab; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        let back: AccountAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn auth_key_depends_on_scheme() {
        let a = AuthenticationKey::from_public_key_bytes(&[1, 2, 3], SINGLE_KEY_SCHEME);
        let b = AuthenticationKey::from_public_key_bytes(&[1, 2, 3], 0x00);
        assert_ne!(a, b);
        assert_eq!(a.derived_address().as_bytes(), a.as_bytes());
    }
}
