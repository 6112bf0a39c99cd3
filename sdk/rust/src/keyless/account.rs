//! Keyless accounts.
//!
//! A [`KeylessAccount`] is an address derived from identity attributes plus an
//! ephemeral key that can sign for it while a proof is attached. The proof
//! lives behind a [`watch`] channel: it is `Ready` immediately when fetched in
//! blocking mode, or `Pending` until a background fetch resolves it.
//!
//! Signing never waits. Each attempt checks, in order:
//! 1. ephemeral key expiry → [`Error::EphemeralKeyExpired`]
//! 2. proof state → [`Error::ProofNotReady`] / [`Error::ProofFetchFailed`]
//! 3. proof expiry → [`Error::ProofExpired`]
//!
//! Use [`KeylessAccount::wait_for_proof`] to await a pending proof.

use crate::address::AccountAddress;
use crate::error::{Error, ErrorKind, Result};
use crate::keyless::commitment::{IdentityCommitment, KeylessPublicKey};
use crate::keyless::jwt::{verify_nonce_binding, Jwt};
use crate::keyless::prover::ZkProof;
use crate::keyless::Pepper;
use crate::types::{RawTransaction, SignedTransaction, TransactionAuthenticator};
use crate::utils::bytes::hex_encode;
use crate::utils::{cbor, now_secs};
use crate::wallet::ephemeral::{EphemeralKeyPair, EphemeralPublicKey};
use crate::wallet::TransactionSigner;
use ciborium::value::Value;
use serde::{Serialize, Serializer};
use tokio::sync::watch;

/// Why a background proof fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofFailure {
    pub kind: ErrorKind,
    pub retryable: bool,
    pub message: String,
}

impl From<&Error> for ProofFailure {
    fn from(e: &Error) -> Self {
        Self { kind: e.kind(), retryable: e.is_retryable(), message: e.to_string() }
    }
}

/// State of an account's proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofStatus {
    Pending,
    Ready(ZkProof),
    Failed(ProofFailure),
}

impl ProofStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProofStatus::Pending)
    }
}

/// Signature produced by a keyless account.
#[derive(Debug, Clone, Serialize)]
pub struct KeylessSignature {
    /// Base64url JWT header, as issued.
    pub jwt_header: String,
    pub proof: ZkProof,
    pub exp_horizon_secs: u64,
    pub exp_date_secs: u64,
    #[serde(serialize_with = "ser_epk")]
    pub ephemeral_public_key: EphemeralPublicKey,
    #[serde(with = "serde_bytes")]
    pub ephemeral_signature: Vec<u8>,
}

fn ser_epk<S: Serializer>(pk: &EphemeralPublicKey, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&pk.to_hex())
}

impl KeylessSignature {
    /// Check the ephemeral signature over `message` and the attached proof.
    pub fn verify(&self, message: &[u8]) -> Result<()> {
        let bound = bound_message(message, &self.proof)?;
        self.ephemeral_public_key.verify(&bound, &self.ephemeral_signature)
    }

    pub fn to_cbor_value(&self) -> Result<Value> {
        Ok(cbor::int_map(vec![
            (0, cbor::text(&self.jwt_header)),
            (1, self.proof.to_cbor_value()),
            (2, cbor::uint(self.exp_horizon_secs)),
            (3, cbor::uint(self.exp_date_secs)),
            (4, cbor::bytes(&self.ephemeral_public_key.to_bytes())),
            (5, cbor::bytes(&self.ephemeral_signature)),
        ]))
    }
}

/// The ephemeral key signs the message together with the proof it travels with.
fn bound_message(message: &[u8], proof: &ZkProof) -> Result<Vec<u8>> {
    cbor::to_vec(&Value::Array(vec![cbor::bytes(message), proof.to_cbor_value()]))
}

/// Account controlled by an OAuth identity and an ephemeral key.
#[derive(Clone)]
pub struct KeylessAccount {
    identity: IdentityCommitment,
    public_key: KeylessPublicKey,
    address: AccountAddress,
    ephemeral: EphemeralKeyPair,
    jwt: Jwt,
    exp_horizon_secs: u64,
    proof: watch::Receiver<ProofStatus>,
}

impl std::fmt::Debug for KeylessAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeylessAccount")
            .field("address", &self.address)
            .field("iss", &self.identity.iss)
            .field("uid_key", &self.identity.uid_key)
            .field("ephemeral", &self.ephemeral)
            .field("proof_pending", &self.proof.borrow().is_pending())
            .finish_non_exhaustive()
    }
}

impl KeylessAccount {
    pub(crate) fn new(
        identity: IdentityCommitment,
        ephemeral: EphemeralKeyPair,
        jwt: Jwt,
        exp_horizon_secs: u64,
        proof: watch::Receiver<ProofStatus>,
    ) -> Self {
        let public_key = identity.public_key();
        let address = public_key.address();
        Self { identity, public_key, address, ephemeral, jwt, exp_horizon_secs, proof }
    }

    /// Restore an account from parts the caller persisted (token, ephemeral
    /// key, pepper, proof). No services are contacted. The token's own `exp` is
    /// not checked; the ephemeral key's expiry bounds signing.
    pub fn from_parts(
        jwt: Jwt,
        ephemeral: EphemeralKeyPair,
        uid_key: &str,
        pepper: Pepper,
        proof: ZkProof,
        exp_horizon_secs: u64,
    ) -> Result<Self> {
        verify_nonce_binding(&jwt, &ephemeral)?;
        proof.validate()?;
        let identity = IdentityCommitment::from_jwt(&jwt, uid_key, pepper)?;
        let (_tx, rx) = watch::channel(ProofStatus::Ready(proof));
        Ok(Self::new(identity, ephemeral, jwt, exp_horizon_secs, rx))
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key(&self) -> &KeylessPublicKey {
        &self.public_key
    }

    pub fn identity(&self) -> &IdentityCommitment {
        &self.identity
    }

    pub fn pepper(&self) -> &Pepper {
        &self.identity.pepper
    }

    pub fn uid_key(&self) -> &str {
        &self.identity.uid_key
    }

    pub fn jwt(&self) -> &Jwt {
        &self.jwt
    }

    pub fn ephemeral_key_pair(&self) -> &EphemeralKeyPair {
        &self.ephemeral
    }

    pub fn exp_horizon_secs(&self) -> u64 {
        self.exp_horizon_secs
    }

    /// Snapshot of the proof state.
    pub fn proof_status(&self) -> ProofStatus {
        self.proof.borrow().clone()
    }

    pub fn proof(&self) -> Option<ZkProof> {
        match &*self.proof.borrow() {
            ProofStatus::Ready(p) => Some(p.clone()),
            _ => None,
        }
    }

    /// Once expired, the account can never sign again; derive a new one.
    pub fn is_expired(&self) -> bool {
        self.ephemeral.is_expired_at(now_secs())
    }

    /// Wait until the proof leaves `Pending`. Returns the proof, or the fetch
    /// failure as [`Error::ProofFetchFailed`].
    pub async fn wait_for_proof(&self) -> Result<ZkProof> {
        let mut rx = self.proof.clone();
        let status = rx
            .wait_for(|s| !s.is_pending())
            .await
            .map_err(|_| Error::ProofFetchFailed("proof task ended without a result".into()))?
            .clone();
        match status {
            ProofStatus::Ready(p) => Ok(p),
            ProofStatus::Failed(f) => Err(Error::ProofFetchFailed(f.message)),
            ProofStatus::Pending => Err(Error::ProofNotReady),
        }
    }

    /// Proof usable for signing at `now`, or the reason signing must be refused.
    pub(crate) fn signable_proof_at(&self, now: u64) -> Result<ZkProof> {
        let expires = self.ephemeral.expiry_date_secs();
        if self.ephemeral.is_expired_at(now) {
            return Err(Error::EphemeralKeyExpired { expired_at: expires });
        }
        let proof = match &*self.proof.borrow() {
            ProofStatus::Pending => return Err(Error::ProofNotReady),
            ProofStatus::Failed(f) => return Err(Error::ProofFetchFailed(f.message.clone())),
            ProofStatus::Ready(p) => p.clone(),
        };
        let proof_expiry = proof.effective_expiry(expires);
        if now >= proof_expiry {
            return Err(Error::ProofExpired { expired_at: proof_expiry });
        }
        Ok(proof)
    }

    pub(crate) fn sign_at(&self, message: &[u8], now: u64) -> Result<KeylessSignature> {
        let proof = self.signable_proof_at(now).map_err(|e| {
            tracing::debug!(address = %self.address, error = %e, "refusing to sign");
            e
        })?;
        let bound = bound_message(message, &proof)?;
        let signature = self.ephemeral.sign(&bound);
        Ok(KeylessSignature {
            jwt_header: self.jwt.header_b64().to_string(),
            proof,
            exp_horizon_secs: self.exp_horizon_secs,
            exp_date_secs: self.ephemeral.expiry_date_secs(),
            ephemeral_public_key: *self.ephemeral.public_key(),
            ephemeral_signature: signature.to_vec(),
        })
    }

    /// Sign arbitrary bytes. Fails fast if the account cannot sign right now.
    pub fn sign(&self, message: &[u8]) -> Result<KeylessSignature> {
        self.sign_at(message, now_secs())
    }

    /// Sign a transaction whose sender is this account.
    pub fn sign_transaction(&self, raw: RawTransaction) -> Result<SignedTransaction> {
        crate::tx::encode::build_signed_transaction(self, raw)
    }

    /// Hex of the keyless public key bytes, for explorers and logs.
    pub fn public_key_hex(&self) -> String {
        hex_encode(self.public_key.to_bytes())
    }
}

impl TransactionSigner for KeylessAccount {
    fn address(&self) -> AccountAddress {
        self.address
    }

    fn authenticate(&self, signing_message: &[u8]) -> Result<TransactionAuthenticator> {
        Ok(TransactionAuthenticator::Keyless {
            public_key: self.public_key.clone(),
            signature: self.sign(signing_message)?,
        })
    }
}
