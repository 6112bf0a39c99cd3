//! Identity commitment and keyless address derivation.
//!
//! ```text
//! idc        = sha3_256("keyless|idc|" || len||pepper || len||aud || len||uid_val || len||uid_key)
//! public_key = 0x03 || u32_be(len(iss)) || iss || idc
//! auth_key   = sha3_256(public_key || 0x02)
//! address    = auth_key
//! ```
//!
//! The address depends on identity attributes only, never on the ephemeral key
//! or the particular JWT, so every login of the same user lands on the same
//! account. Without the pepper the address cannot be linked to the identity.

use crate::address::{AccountAddress, AuthenticationKey, SINGLE_KEY_SCHEME};
use crate::error::Result;
use crate::keyless::jwt::{Jwt, DEFAULT_UID_KEY};
use crate::keyless::Pepper;
use crate::utils::bytes::hex_encode;
use crate::utils::hash::sha3_256_domain_parts;
use serde::Serialize;

const IDC_DOMAIN: &str = "idc";

/// Variant tag of a keyless key inside a single-key public key.
pub const KEYLESS_KEY_VARIANT: u8 = 0x03;

/// Identity attributes plus the pepper that hides them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCommitment {
    pub iss: String,
    pub uid_key: String,
    pub uid_val: String,
    pub aud: String,
    pub pepper: Pepper,
}

impl IdentityCommitment {
    /// Read `iss`, `aud` and the `uid_key` claim from a token.
    pub fn from_jwt(jwt: &Jwt, uid_key: &str, pepper: Pepper) -> Result<Self> {
        Ok(Self {
            iss: jwt.issuer().to_string(),
            uid_key: uid_key.to_string(),
            uid_val: jwt.uid_value(uid_key)?,
            aud: jwt.audience()?.to_string(),
            pepper,
        })
    }

    /// The 32-byte commitment `idc`.
    pub fn commitment(&self) -> [u8; 32] {
        sha3_256_domain_parts(
            IDC_DOMAIN,
            &[
                self.pepper.as_bytes().as_slice(),
                self.aud.as_bytes(),
                self.uid_val.as_bytes(),
                self.uid_key.as_bytes(),
            ],
        )
    }

    pub fn public_key(&self) -> KeylessPublicKey {
        KeylessPublicKey { iss: self.iss.clone(), idc: self.commitment() }
    }

    pub fn address(&self) -> AccountAddress {
        self.public_key().address()
    }
}

/// On-chain keyless public key: issuer in the clear, identity hidden in `idc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeylessPublicKey {
    pub iss: String,
    #[serde(serialize_with = "ser_hex32")]
    pub idc: [u8; 32],
}

impl KeylessPublicKey {
    /// Single-key encoding hashed into the authentication key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let iss = self.iss.as_bytes();
        let mut out = Vec::with_capacity(1 + 4 + iss.len() + 32);
        out.push(KEYLESS_KEY_VARIANT);
        out.extend_from_slice(&(iss.len() as u32).to_be_bytes());
        out.extend_from_slice(iss);
        out.extend_from_slice(&self.idc);
        out
    }

    pub fn authentication_key(&self) -> AuthenticationKey {
        AuthenticationKey::from_public_key_bytes(&self.to_bytes(), SINGLE_KEY_SCHEME)
    }

    pub fn address(&self) -> AccountAddress {
        self.authentication_key().derived_address()
    }
}

fn ser_hex32<S: serde::Serializer>(v: &[u8; 32], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex_encode(v))
}

/// Address for `(iss, sub, aud, pepper)` using the default `sub` claim key.
pub fn compute_address(iss: &str, uid_val: &str, aud: &str, pepper: &Pepper) -> AccountAddress {
    IdentityCommitment {
        iss: iss.to_string(),
        uid_key: DEFAULT_UID_KEY.to_string(),
        uid_val: uid_val.to_string(),
        aud: aud.to_string(),
        pepper: *pepper,
    }
    .address()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "https://accounts.google.com";
    const SUB: &str = "111627772460752342312";
    const AUD: &str = "client-id";

    #[test]
    fn deterministic() {
        let p = Pepper::new([7; 32]);
        assert_eq!(compute_address(ISS, SUB, AUD, &p), compute_address(ISS, SUB, AUD, &p));
    }

    #[test]
    fn every_field_matters() {
        let p = Pepper::new([7; 32]);
        let base = compute_address(ISS, SUB, AUD, &p);
        assert_ne!(base, compute_address("https://appleid.apple.com", SUB, AUD, &p));
        assert_ne!(base, compute_address(ISS, "111627772460752342313", AUD, &p));
        assert_ne!(base, compute_address(ISS, SUB, "other-client", &p));
        assert_ne!(base, compute_address(ISS, SUB, AUD, &Pepper::new([8; 32])));

        let by_email = IdentityCommitment {
            iss: ISS.into(),
            uid_key: "email".into(),
            uid_val: SUB.into(),
            aud: AUD.into(),
            pepper: p,
        };
        assert_ne!(base, by_email.address());
    }

    #[test]
    fn public_key_layout() {
        let pk = KeylessPublicKey { iss: "ab".into(), idc: [9; 32] };
        let bytes = pk.to_bytes();
        assert_eq!(bytes[0], KEYLESS_KEY_VARIANT);
        assert_eq!(&bytes[1..5], &2u32.to_be_bytes());
        assert_eq!(&bytes[5..7], b"ab");
        assert_eq!(&bytes[7..], &[9; 32]);
    }
}
