//! Proving service and the proof it returns.
//!
//! Wire format:
//! ```text
//! POST {prover_url}/prove
//! { "jwt_b64", "epk", "epk_blinder", "exp_date_secs", "exp_horizon_secs", "pepper", "uid_key" }
//! -> { "proof": { "a", "b", "c" }, "public_inputs_hash",
//!      "training_wheels_signature"?, "expiry_secs"? }
//! ```
//!
//! The proof is opaque to the SDK: it is carried into signatures untouched and
//! verified on chain.

use crate::error::{Error, Result};
use crate::keyless::jwt::Jwt;
use crate::keyless::Pepper;
use crate::utils::bytes::hex_encode;
use crate::utils::cbor;
use crate::wallet::ephemeral::EphemeralKeyPair;
use ciborium::value::Value;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Groth16 proof points, as encoded by the proving service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    pub a: String,
    pub b: String,
    pub c: String,
}

/// Proof plus the metadata the service attaches to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProof {
    pub proof: Groth16Proof,
    pub public_inputs_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_wheels_signature: Option<String>,
    /// Service-declared end of validity, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_secs: Option<u64>,
}

impl ZkProof {
    /// Reject responses with empty proof points.
    pub fn validate(&self) -> Result<()> {
        let p = &self.proof;
        if p.a.is_empty() || p.b.is_empty() || p.c.is_empty() || self.public_inputs_hash.is_empty() {
            return Err(Error::ProofRejected("proving service returned an incomplete proof".into()));
        }
        Ok(())
    }

    /// A proof never outlives the ephemeral key it was made for.
    pub fn effective_expiry(&self, ephemeral_expiry_secs: u64) -> u64 {
        match self.expiry_secs {
            Some(exp) => exp.min(ephemeral_expiry_secs),
            None => ephemeral_expiry_secs,
        }
    }

    /// Canonical form bound into ephemeral signatures.
    pub fn to_cbor_value(&self) -> Value {
        cbor::int_map(vec![
            (0, cbor::text(&self.proof.a)),
            (1, cbor::text(&self.proof.b)),
            (2, cbor::text(&self.proof.c)),
            (3, cbor::text(&self.public_inputs_hash)),
            (
                4,
                self.training_wheels_signature.as_deref().map_or(Value::Null, cbor::text),
            ),
        ])
    }
}

/// Body of a proof request. Carries the pepper, so `Debug` is redacted.
#[derive(Clone, Serialize)]
pub struct ProofRequest {
    pub jwt_b64: String,
    pub epk: String,
    pub epk_blinder: String,
    pub exp_date_secs: u64,
    pub exp_horizon_secs: u64,
    pub pepper: String,
    pub uid_key: String,
}

impl ProofRequest {
    pub fn new(
        jwt: &Jwt,
        ephemeral: &EphemeralKeyPair,
        pepper: &Pepper,
        uid_key: &str,
        exp_horizon_secs: u64,
    ) -> Self {
        Self {
            jwt_b64: jwt.as_str().to_string(),
            epk: ephemeral.public_key().to_hex(),
            epk_blinder: hex_encode(ephemeral.blinder()),
            exp_date_secs: ephemeral.expiry_date_secs(),
            exp_horizon_secs,
            pepper: pepper.to_hex(),
            uid_key: uid_key.to_string(),
        }
    }
}

impl std::fmt::Debug for ProofRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofRequest")
            .field("epk", &self.epk)
            .field("exp_date_secs", &self.exp_date_secs)
            .field("exp_horizon_secs", &self.exp_horizon_secs)
            .field("uid_key", &self.uid_key)
            .finish_non_exhaustive()
    }
}

/// Source of proofs.
pub trait ProverService: Send + Sync {
    fn fetch_proof<'a>(&'a self, request: &'a ProofRequest) -> BoxFuture<'a, Result<ZkProof>>;
}

#[cfg(feature = "native")]
pub use self::http::HttpProverService;

#[cfg(feature = "native")]
mod http {
    use super::*;
    use crate::config::KeylessConfig;
    use crate::service::{ServiceClient, ServiceClientBuilder};
    use futures::FutureExt;

    const SERVICE: &str = "prover";

    /// Proving service reached over HTTP.
    #[derive(Debug, Clone)]
    pub struct HttpProverService {
        http: ServiceClient,
    }

    impl HttpProverService {
        pub fn new(config: &KeylessConfig) -> Result<Self> {
            // Proof generation is slow; the per-request timeout must cover it.
            let http = ServiceClientBuilder::from_config(SERVICE, &config.prover_url, config)
                .timeout(config.request_timeout.max(config.proof_fetch_timeout))
                .build()?;
            Ok(Self { http })
        }

        async fn prove(&self, request: &ProofRequest) -> Result<ZkProof> {
            let proof: ZkProof = self
                .http
                .post_json("prove", None, request)
                .await
                .map_err(refine)?;
            proof.validate()?;
            Ok(proof)
        }
    }

    impl ProverService for HttpProverService {
        fn fetch_proof<'a>(&'a self, request: &'a ProofRequest) -> BoxFuture<'a, Result<ZkProof>> {
            self.prove(request).boxed()
        }
    }

    fn refine(err: Error) -> Error {
        match err {
            Error::HttpStatus { status: 400, body } => Error::ProofRejected(body),
            other => other,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bad_request_is_rejection() {
            assert!(matches!(
                refine(Error::HttpStatus { status: 400, body: "exp_date too far".into() }),
                Error::ProofRejected(_)
            ));
            assert!(refine(Error::HttpStatus { status: 500, body: String::new() }).is_retryable());
        }
    }
}
