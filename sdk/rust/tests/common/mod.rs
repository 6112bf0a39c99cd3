// Shared fixtures for the integration tests: JWT builder and in-memory
// pepper/prover services that behave like the real ones (nonce re-check,
// deterministic peppers, call counting, gated proof completion).

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use keyless_sdk::error::{Error, Result};
use keyless_sdk::keyless::prover::{Groth16Proof, ProofRequest, ProverService, ZkProof};
use keyless_sdk::keyless::{derive_nonce, EphemeralPublicKey, Jwt, Pepper, PepperRequest, PepperService};
use keyless_sdk::utils::bytes::hex_decode;
use keyless_sdk::utils::hash::sha3_256;
use keyless_sdk::utils::now_secs;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const ISS: &str = "https://accounts.google.com";
pub const AUD: &str = "407408718192.apps.googleusercontent.com";
pub const SUB: &str = "111627772460752342312";

/// Route test logs through `RUST_LOG` when set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn token(claims: &Value) -> String {
    let header = json!({"alg": "RS256", "kid": "test-kid", "typ": "JWT"});
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode(b"not-a-real-signature")
    )
}

/// Google-style ID token for `sub`, issued now, valid for an hour.
pub fn id_token(nonce: &str, sub: &str) -> Jwt {
    let now = now_secs();
    Jwt::parse(&token(&json!({
        "iss": ISS,
        "aud": AUD,
        "sub": sub,
        "email": format!("{sub}@example.com"),
        "nonce": nonce,
        "iat": now,
        "exp": now + 3600,
    })))
    .expect("fixture token parses")
}

/// Pepper service double: re-derives the nonce from the request like the real
/// service and returns a pepper that depends only on the identity.
#[derive(Default)]
pub struct FakePepperService {
    pub calls: AtomicUsize,
}

impl FakePepperService {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn serve(&self, req: &PepperRequest) -> Result<Pepper> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let jwt = Jwt::parse(&req.jwt_b64)?;
        let epk = EphemeralPublicKey::from_bytes(&hex_decode(&req.epk)?)?;
        let expected = derive_nonce(&epk, req.exp_date_secs, &hex_decode(&req.epk_blinder)?)?;
        let got = jwt.nonce().unwrap_or_default();
        if got != expected {
            return Err(Error::NonceMismatch { jwt_nonce: got.to_string(), expected });
        }
        let seed = format!(
            "{}|{}|{}|{}",
            jwt.issuer(),
            req.uid_key,
            jwt.uid_value(&req.uid_key)?,
            jwt.audience()?
        );
        Ok(Pepper::new(sha3_256(seed)))
    }
}

impl PepperService for FakePepperService {
    fn fetch_pepper<'a>(&'a self, request: &'a PepperRequest) -> BoxFuture<'a, Result<Pepper>> {
        let res = self.serve(request);
        async move { res }.boxed()
    }
}

pub enum ProverBehavior {
    Succeed,
    Fail,
    /// Never answers; exercises the fetch timeout.
    Hang,
}

/// Prover double. With a gate, answers only after [`FakeProver::release`].
pub struct FakeProver {
    pub calls: AtomicUsize,
    behavior: ProverBehavior,
    gate: Option<Arc<Notify>>,
}

impl FakeProver {
    pub fn new(behavior: ProverBehavior) -> Self {
        Self { calls: AtomicUsize::new(0), behavior, gate: None }
    }

    pub fn gated() -> Self {
        Self { calls: AtomicUsize::new(0), behavior: ProverBehavior::Succeed, gate: Some(Arc::new(Notify::new())) }
    }

    pub fn release(&self) {
        if let Some(g) = &self.gate {
            g.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_proof() -> ZkProof {
    ZkProof {
        proof: Groth16Proof { a: "0x0a".into(), b: "0x0b".into(), c: "0x0c".into() },
        public_inputs_hash: "1234567890".into(),
        training_wheels_signature: Some("0xfeed".into()),
        expiry_secs: None,
    }
}

impl ProverService for FakeProver {
    fn fetch_proof<'a>(&'a self, _request: &'a ProofRequest) -> BoxFuture<'a, Result<ZkProof>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if let Some(g) = &self.gate {
                g.notified().await;
            }
            match self.behavior {
                ProverBehavior::Succeed => Ok(sample_proof()),
                ProverBehavior::Fail => Err(Error::ProofRejected("jwt expired".into())),
                ProverBehavior::Hang => futures::future::pending().await,
            }
        }
        .boxed()
    }
}
