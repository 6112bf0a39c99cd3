//! Keyless accounts: OAuth identity plus a zero-knowledge proof instead of a
//! long-lived private key.
//!
//! Flow:
//! 1. [`EphemeralKeyPair`] is generated; its nonce goes into the OAuth request.
//! 2. The identity provider returns a [`Jwt`] carrying that nonce.
//! 3. A [`PepperService`] returns the per-identity secret pepper.
//! 4. A [`ProverService`] returns a proof binding the JWT to the ephemeral key.
//! 5. [`KeylessClient::derive_keyless_account`] assembles a [`KeylessAccount`]
//!    whose address is the [`IdentityCommitment`] of (iss, uid, aud, pepper).

use crate::error::{Error, Result};
use crate::utils::bytes::{hex_decode, hex_encode};
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod account;
pub mod client;
pub mod commitment;
pub mod jwt;
pub mod nonce;
pub mod pepper;
pub mod prover;

/// Blinder length in bytes; keeps the nonce inside provider size limits.
pub const BLINDER_LENGTH: usize = 31;

/// Pepper length in bytes.
pub const PEPPER_LENGTH: usize = 32;

/// Secret per-identity salt returned by the pepper service.
///
/// Losing it loses the address; callers should persist it. `Debug` redacts it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pepper([u8; PEPPER_LENGTH]);

impl Pepper {
    pub const fn new(bytes: [u8; PEPPER_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PEPPER_LENGTH] = bytes
            .try_into()
            .map_err(|_| Error::PepperLength { expected: PEPPER_LENGTH, got: bytes.len() })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::from_bytes(&hex_decode(s)?)
    }

    pub fn as_bytes(&self) -> &[u8; PEPPER_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex_encode(self.0)
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pepper(..)")
    }
}

impl Serialize for Pepper {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Pepper {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

pub use account::{KeylessAccount, KeylessSignature, ProofFailure, ProofStatus};
pub use client::{DeriveAccountArgs, KeylessClient, ProofFetchCallback, ProofFetchMode};
pub use commitment::{compute_address, IdentityCommitment, KeylessPublicKey};
pub use jwt::{verify_nonce_binding, Jwt, JwtClaims, DEFAULT_UID_KEY};
pub use nonce::derive_nonce;
pub use pepper::{PepperRequest, PepperService};
pub use prover::{Groth16Proof, ProofRequest, ProverService, ZkProof};

#[cfg(feature = "native")]
pub use pepper::HttpPepperService;
#[cfg(feature = "native")]
pub use prover::HttpProverService;

pub use crate::wallet::ephemeral::{EphemeralKeyPair, EphemeralPublicKey};
