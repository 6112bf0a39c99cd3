//! Nonce derivation.
//!
//! The nonce is what the identity provider signs over without knowing it: the
//! application places it in the `nonce` parameter of the authorization URL and
//! it comes back verbatim inside the JWT. It commits to the ephemeral public
//! key, its expiry and a blinder:
//!
//! ```text
//! digest = sha3_256("keyless|nonce|" || len||epk || len||u64_be(expiry) || len||blinder)
//! nonce  = decimal(digest mod r)      // r = BN254 scalar field order
//! ```
//!
//! Rendering as a field element keeps the value usable as a public input of the
//! proving circuit and short enough for provider nonce limits.

use crate::error::{Error, Result};
use crate::keyless::BLINDER_LENGTH;
use crate::utils::hash::sha3_256_domain_parts;
use crate::wallet::ephemeral::EphemeralPublicKey;
use ark_bn254::Fr;
use ark_ff::PrimeField;

const NONCE_DOMAIN: &str = "nonce";

/// Derive the OAuth nonce for an ephemeral key.
pub fn derive_nonce(
    public_key: &EphemeralPublicKey,
    expiry_date_secs: u64,
    blinder: &[u8],
) -> Result<String> {
    if blinder.len() != BLINDER_LENGTH {
        return Err(Error::BlinderLength { expected: BLINDER_LENGTH, got: blinder.len() });
    }
    let epk = public_key.to_bytes();
    let expiry = expiry_date_secs.to_be_bytes();
    let digest = sha3_256_domain_parts(NONCE_DOMAIN, &[epk.as_slice(), expiry.as_slice(), blinder]);
    let element = Fr::from_be_bytes_mod_order(&digest);
    Ok(element.into_bigint().to_string())
}
