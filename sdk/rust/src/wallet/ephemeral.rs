//! Ephemeral key pairs.
//!
//! A short-lived Ed25519 key that bootstraps a keyless account. It is created
//! before the OAuth redirect, its nonce is embedded in the authorization URL,
//! and it is discarded once it expires. It is never persisted by the SDK.

use crate::error::{Error, Result};
use crate::keyless::nonce::derive_nonce;
use crate::keyless::BLINDER_LENGTH;
use crate::utils::bytes::hex_encode;
use crate::utils::now_secs;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;

/// Variant tag of an Ed25519 ephemeral public key in its serialized form.
pub const ED25519_VARIANT: u8 = 0x00;

/// Public half of an ephemeral key. Only Ed25519 is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EphemeralPublicKey {
    Ed25519([u8; 32]),
}

impl EphemeralPublicKey {
    /// `variant || key bytes`, as hashed into the nonce and sent to services.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            EphemeralPublicKey::Ed25519(pk) => {
                let mut out = Vec::with_capacity(33);
                out.push(ED25519_VARIANT);
                out.extend_from_slice(pk);
                out
            }
        }
    }

    /// Inverse of [`EphemeralPublicKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&ED25519_VARIANT, key)) => {
                let key: [u8; 32] = key
                    .try_into()
                    .map_err(|_| Error::Signer(format!("ed25519 key must be 32 bytes, got {}", key.len())))?;
                Ok(EphemeralPublicKey::Ed25519(key))
            }
            Some((variant, _)) => Err(Error::Signer(format!("unsupported ephemeral key variant {variant}"))),
            None => Err(Error::Signer("empty ephemeral public key".into())),
        }
    }

    pub fn to_hex(&self) -> String {
        hex_encode(self.to_bytes())
    }

    /// Check an ephemeral signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            EphemeralPublicKey::Ed25519(pk) => {
                let key = VerifyingKey::from_bytes(pk)?;
                let sig = ed25519_dalek::Signature::from_slice(signature)?;
                key.verify(message, &sig)?;
                Ok(())
            }
        }
    }
}

/// Ephemeral signing key plus expiry and blinder.
#[derive(Clone)]
pub struct EphemeralKeyPair {
    signing_key: SigningKey,
    public_key: EphemeralPublicKey,
    expiry_date_secs: u64,
    blinder: [u8; BLINDER_LENGTH],
    nonce: String,
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public_key", &self.public_key.to_hex())
            .field("expiry_date_secs", &self.expiry_date_secs)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

impl EphemeralKeyPair {
    /// Generate a fresh key and blinder from the OS RNG.
    ///
    /// `expiry_date_secs` must lie in `(now, now + max_exp_horizon_secs]`.
    pub fn generate(expiry_date_secs: u64, max_exp_horizon_secs: u64) -> Result<Self> {
        let now = now_secs();
        let max_allowed = now.saturating_add(max_exp_horizon_secs);
        if expiry_date_secs <= now || expiry_date_secs > max_allowed {
            return Err(Error::ExpiryHorizon { expiry: expiry_date_secs, max_allowed });
        }
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut blinder = [0u8; BLINDER_LENGTH];
        OsRng.fill_bytes(&mut blinder);
        Self::assemble(signing_key, expiry_date_secs, blinder)
    }

    /// Rebuild from raw parts. No time checks are applied, so expired pairs can
    /// be restored (and will then refuse to sign).
    pub fn from_parts(private_key: [u8; 32], expiry_date_secs: u64, blinder: &[u8]) -> Result<Self> {
        let blinder: [u8; BLINDER_LENGTH] = blinder
            .try_into()
            .map_err(|_| Error::BlinderLength { expected: BLINDER_LENGTH, got: blinder.len() })?;
        Self::assemble(SigningKey::from_bytes(&private_key), expiry_date_secs, blinder)
    }

    fn assemble(
        signing_key: SigningKey,
        expiry_date_secs: u64,
        blinder: [u8; BLINDER_LENGTH],
    ) -> Result<Self> {
        let public_key = EphemeralPublicKey::Ed25519(signing_key.verifying_key().to_bytes());
        let nonce = derive_nonce(&public_key, expiry_date_secs, &blinder)?;
        Ok(Self { signing_key, public_key, expiry_date_secs, blinder, nonce })
    }

    pub fn public_key(&self) -> &EphemeralPublicKey {
        &self.public_key
    }

    pub fn expiry_date_secs(&self) -> u64 {
        self.expiry_date_secs
    }

    pub fn blinder(&self) -> &[u8; BLINDER_LENGTH] {
        &self.blinder
    }

    /// Nonce to embed in the OAuth authorization request.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Expired once `now` reaches the expiry timestamp.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expiry_date_secs
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_secs())
    }

    /// Raw Ed25519 signature over `message`. Expiry is enforced by the account
    /// layer, not here.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Secret key bytes, for callers that keep the pair across a redirect.
    pub fn private_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn from_parts_is_deterministic() {
        let a = EphemeralKeyPair::from_parts(KEY, 1_718_911_224, &[0u8; 31]).unwrap();
        let b = EphemeralKeyPair::from_parts(KEY, 1_718_911_224, &[0u8; 31]).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.nonce(), b.nonce());
        assert_eq!(a.private_key_bytes(), KEY);
    }

    #[test]
    fn wrong_blinder_length_rejected() {
        let err = EphemeralKeyPair::from_parts(KEY, 1, &[0u8; 30]).unwrap_err();
        assert!(matches!(err, Error::BlinderLength { expected: 31, got: 30 }));
    }

    #[test]
    fn generate_respects_horizon() {
        let now = now_secs();
        assert!(EphemeralKeyPair::generate(now + 3600, 7200).is_ok());
        assert!(matches!(
            EphemeralKeyPair::generate(now + 10_000, 7200),
            Err(Error::ExpiryHorizon { .. })
        ));
        assert!(matches!(
            EphemeralKeyPair::generate(now.saturating_sub(1), 7200),
            Err(Error::ExpiryHorizon { .. })
        ));
    }

    #[test]
    fn generated_pairs_differ() {
        let now = now_secs();
        let a = EphemeralKeyPair::generate(now + 60, 3600).unwrap();
        let b = EphemeralKeyPair::generate(now + 60, 3600).unwrap();
        assert_ne!(a.public_key(), b.public_key());
        assert_ne!(a.nonce(), b.nonce());
    }

    #[test]
    fn sign_and_verify() {
        let kp = EphemeralKeyPair::from_parts(KEY, 10, &[0u8; 31]).unwrap();
        let sig = kp.sign(b"hello");
        kp.public_key().verify(b"hello", &sig).unwrap();
        assert!(kp.public_key().verify(b"hellp", &sig).is_err());
    }

    #[test]
    fn public_key_bytes_roundtrip() {
        let kp = EphemeralKeyPair::from_parts(KEY, 10, &[0u8; 31]).unwrap();
        let bytes = kp.public_key().to_bytes();
        assert_eq!(bytes.len(), 33);
        assert_eq!(&EphemeralPublicKey::from_bytes(&bytes).unwrap(), kp.public_key());
        assert!(EphemeralPublicKey::from_bytes(&[0x01; 33]).is_err());
        assert!(EphemeralPublicKey::from_bytes(&bytes[..20]).is_err());
    }

    #[test]
    fn expiry_boundary() {
        let kp = EphemeralKeyPair::from_parts(KEY, 100, &[0u8; 31]).unwrap();
        assert!(!kp.is_expired_at(99));
        assert!(kp.is_expired_at(100));
    }

    #[test]
    fn debug_redacts_secret() {
        let kp = EphemeralKeyPair::from_parts(KEY, 10, &[0u8; 31]).unwrap();
        let dbg = format!("{kp:?}");
        assert!(!dbg.contains(&hex::encode(KEY)));
    }
}
