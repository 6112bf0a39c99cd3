//! Keyless client: orchestrates pepper and proof fetching into accounts.
//!
//! ```no_run
//! # async fn demo(token: &str) -> keyless_sdk::Result<()> {
//! use keyless_sdk::config::{KeylessConfig, Network};
//! use keyless_sdk::keyless::{DeriveAccountArgs, Jwt, KeylessClient};
//!
//! let client = KeylessClient::new(KeylessConfig::for_network(Network::Devnet)?)?;
//! let ekp = client.generate_ephemeral_key_pair(None)?;
//! // ... redirect the user with `ekp.nonce()`, receive `token` ...
//! let account = client
//!     .derive_keyless_account(DeriveAccountArgs::new(Jwt::parse(token)?, ekp))
//!     .await?;
//! println!("{}", account.address());
//! # Ok(())
//! # }
//! ```

use crate::config::KeylessConfig;
use crate::error::{Error, Result};
use crate::keyless::account::{KeylessAccount, ProofFailure, ProofStatus};
use crate::keyless::commitment::IdentityCommitment;
use crate::keyless::jwt::{verify_nonce_binding, Jwt, DEFAULT_UID_KEY};
use crate::keyless::pepper::{PepperRequest, PepperService};
use crate::keyless::prover::{ProofRequest, ProverService, ZkProof};
use crate::keyless::Pepper;
use crate::utils::now_secs;
use crate::wallet::ephemeral::EphemeralKeyPair;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Completion hook for a background proof fetch. Called exactly once.
pub type ProofFetchCallback = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// How the proof is obtained during derivation.
#[derive(Default)]
pub enum ProofFetchMode {
    /// Await the proof; the returned account can sign immediately.
    #[default]
    Blocking,
    /// Return at once with the proof pending; a background task resolves it
    /// within `proof_fetch_timeout`.
    ///
    /// The outcome is published to the account before the callback runs, so
    /// an account can already sign from inside a successful callback. Signing
    /// attempted earlier fails with [`Error::ProofNotReady`].
    Background { callback: Option<ProofFetchCallback> },
}

impl std::fmt::Debug for ProofFetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofFetchMode::Blocking => f.write_str("Blocking"),
            ProofFetchMode::Background { callback } => f
                .debug_struct("Background")
                .field("callback", &callback.is_some())
                .finish(),
        }
    }
}

/// Inputs to [`KeylessClient::derive_keyless_account`].
#[derive(Debug)]
pub struct DeriveAccountArgs {
    pub jwt: Jwt,
    pub ephemeral: EphemeralKeyPair,
    pub uid_key: Option<String>,
    /// Skip the pepper service when the caller already holds the pepper.
    pub pepper: Option<Pepper>,
    pub proof_fetch: ProofFetchMode,
}

impl DeriveAccountArgs {
    pub fn new(jwt: Jwt, ephemeral: EphemeralKeyPair) -> Self {
        Self { jwt, ephemeral, uid_key: None, pepper: None, proof_fetch: ProofFetchMode::Blocking }
    }

    pub fn uid_key(mut self, uid_key: &str) -> Self {
        self.uid_key = Some(uid_key.to_string());
        self
    }

    pub fn pepper(mut self, pepper: Pepper) -> Self {
        self.pepper = Some(pepper);
        self
    }

    pub fn background(mut self, callback: Option<ProofFetchCallback>) -> Self {
        self.proof_fetch = ProofFetchMode::Background { callback };
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
    iss: String,
    uid_key: String,
    uid_val: String,
    aud: String,
}

/// Entry point for keyless accounts.
#[derive(Clone)]
pub struct KeylessClient {
    config: KeylessConfig,
    pepper_service: Arc<dyn PepperService>,
    prover_service: Arc<dyn ProverService>,
    peppers: Arc<Mutex<HashMap<IdentityKey, Pepper>>>,
}

impl std::fmt::Debug for KeylessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeylessClient")
            .field("pepper_url", &self.config.pepper_url.as_str())
            .field("prover_url", &self.config.prover_url.as_str())
            .field("cached_peppers", &self.peppers.lock().len())
            .finish()
    }
}

impl KeylessClient {
    /// Client backed by the HTTP pepper and proving services in `config`.
    #[cfg(feature = "native")]
    pub fn new(config: KeylessConfig) -> Result<Self> {
        let pepper = crate::keyless::pepper::HttpPepperService::new(&config)?;
        let prover = crate::keyless::prover::HttpProverService::new(&config)?;
        Ok(Self::with_services(config, Arc::new(pepper), Arc::new(prover)))
    }

    /// Client backed by caller-supplied services.
    pub fn with_services(
        config: KeylessConfig,
        pepper_service: Arc<dyn PepperService>,
        prover_service: Arc<dyn ProverService>,
    ) -> Self {
        Self { config, pepper_service, prover_service, peppers: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn config(&self) -> &KeylessConfig {
        &self.config
    }

    /// Fresh ephemeral key pair. Without an explicit expiry the configured
    /// default lifetime is used.
    pub fn generate_ephemeral_key_pair(&self, expiry_date_secs: Option<u64>) -> Result<EphemeralKeyPair> {
        let expiry = expiry_date_secs
            .unwrap_or_else(|| now_secs().saturating_add(self.config.ephemeral_lifetime_secs()));
        EphemeralKeyPair::generate(expiry, self.config.max_exp_horizon_secs)
    }

    /// Pepper for the token's identity. The nonce binding is checked before
    /// anything is sent; results are cached per identity.
    #[instrument(skip_all, fields(iss = jwt.issuer()))]
    pub async fn get_pepper(&self, jwt: &Jwt, ephemeral: &EphemeralKeyPair, uid_key: &str) -> Result<Pepper> {
        verify_nonce_binding(jwt, ephemeral)?;
        let key = IdentityKey {
            iss: jwt.issuer().to_string(),
            uid_key: uid_key.to_string(),
            uid_val: jwt.uid_value(uid_key)?,
            aud: jwt.audience()?.to_string(),
        };
        if let Some(p) = self.peppers.lock().get(&key).copied() {
            debug!("pepper cache hit");
            return Ok(p);
        }

        let request = PepperRequest::new(jwt, ephemeral, uid_key, &self.config.derivation_path);
        let pepper = self.pepper_service.fetch_pepper(&request).await.map_err(|e| {
            warn!(error = %e, "pepper fetch failed");
            e
        })?;
        self.peppers.lock().insert(key, pepper);
        Ok(pepper)
    }

    /// Proof binding the token to the ephemeral key and pepper.
    #[instrument(skip_all, fields(iss = jwt.issuer()))]
    pub async fn get_proof(
        &self,
        jwt: &Jwt,
        ephemeral: &EphemeralKeyPair,
        uid_key: &str,
        pepper: &Pepper,
    ) -> Result<ZkProof> {
        verify_nonce_binding(jwt, ephemeral)?;
        if ephemeral.is_expired() {
            return Err(Error::EphemeralKeyExpired { expired_at: ephemeral.expiry_date_secs() });
        }
        let request = ProofRequest::new(jwt, ephemeral, pepper, uid_key, self.config.max_exp_horizon_secs);
        fetch_proof(self.prover_service.as_ref(), &request).await
    }

    /// Derive a keyless account from a token and the ephemeral key pair whose
    /// nonce it carries.
    #[instrument(skip_all, fields(iss = args.jwt.issuer()))]
    pub async fn derive_keyless_account(&self, args: DeriveAccountArgs) -> Result<KeylessAccount> {
        let DeriveAccountArgs { jwt, ephemeral, uid_key, pepper, proof_fetch } = args;
        let uid_key = uid_key.unwrap_or_else(|| DEFAULT_UID_KEY.to_string());
        let now = now_secs();

        jwt.validate(now)?;
        if ephemeral.is_expired_at(now) {
            return Err(Error::EphemeralKeyExpired { expired_at: ephemeral.expiry_date_secs() });
        }
        verify_nonce_binding(&jwt, &ephemeral)?;
        if let Some(iat) = jwt.issued_at() {
            let max_allowed = iat.saturating_add(self.config.max_exp_horizon_secs);
            if ephemeral.expiry_date_secs() > max_allowed {
                return Err(Error::ExpiryHorizon { expiry: ephemeral.expiry_date_secs(), max_allowed });
            }
        }

        let pepper = match pepper {
            Some(p) => p,
            None => self.get_pepper(&jwt, &ephemeral, &uid_key).await?,
        };
        let identity = IdentityCommitment::from_jwt(&jwt, &uid_key, pepper)?;
        let horizon = self.config.max_exp_horizon_secs;

        let proof_rx = match proof_fetch {
            ProofFetchMode::Blocking => {
                let proof = self.get_proof(&jwt, &ephemeral, &uid_key, &pepper).await?;
                watch::channel(ProofStatus::Ready(proof)).1
            }
            ProofFetchMode::Background { callback } => {
                let request = ProofRequest::new(&jwt, &ephemeral, &pepper, &uid_key, horizon);
                self.spawn_proof_fetch(request, callback)?
            }
        };

        let account = KeylessAccount::new(identity, ephemeral, jwt, horizon, proof_rx);
        info!(address = %account.address(), "derived keyless account");
        Ok(account)
    }

    fn spawn_proof_fetch(
        &self,
        request: ProofRequest,
        callback: Option<ProofFetchCallback>,
    ) -> Result<watch::Receiver<ProofStatus>> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::InvalidParams("background proof fetch needs a tokio runtime".into()))?;
        let (tx, rx) = watch::channel(ProofStatus::Pending);
        let prover = Arc::clone(&self.prover_service);
        let deadline = self.config.proof_fetch_timeout;

        handle.spawn(async move {
            let outcome = match tokio::time::timeout(deadline, fetch_proof(prover.as_ref(), &request)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout("proof fetch")),
            };
            let (status, report) = match outcome {
                Ok(proof) => (ProofStatus::Ready(proof), Ok(())),
                Err(e) => {
                    warn!(error = %e, "background proof fetch failed");
                    (ProofStatus::Failed(ProofFailure::from(&e)), Err(e))
                }
            };
            // Receivers may all be gone; the callback still fires.
            let _ = tx.send(status);
            if let Some(cb) = callback {
                cb(report);
            }
        });
        Ok(rx)
    }
}

async fn fetch_proof(prover: &dyn ProverService, request: &ProofRequest) -> Result<ZkProof> {
    debug!("requesting proof");
    let proof = prover.fetch_proof(request).await.map_err(|e| {
        warn!(error = %e, "proof fetch failed");
        e
    })?;
    proof.validate()?;
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyless::jwt::test_tokens::make;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPepper(AtomicUsize);

    impl PepperService for CountingPepper {
        fn fetch_pepper<'a>(&'a self, _req: &'a PepperRequest) -> BoxFuture<'a, Result<Pepper>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            async { Ok(Pepper::new([9; 32])) }.boxed()
        }
    }

    struct NoProver;

    impl ProverService for NoProver {
        fn fetch_proof<'a>(&'a self, _req: &'a ProofRequest) -> BoxFuture<'a, Result<ZkProof>> {
            async { Err(Error::Network("unreachable in this test".into())) }.boxed()
        }
    }

    fn client() -> (Arc<CountingPepper>, KeylessClient) {
        let pepper = Arc::new(CountingPepper(AtomicUsize::new(0)));
        let c = KeylessClient::with_services(KeylessConfig::builder().build().unwrap(), pepper.clone(), Arc::new(NoProver));
        (pepper, c)
    }

    fn token(nonce: &str) -> Jwt {
        let now = now_secs();
        Jwt::parse(&make(&serde_json::json!({
            "iss": "https://accounts.google.com",
            "aud": "client",
            "sub": "42",
            "nonce": nonce,
            "iat": now,
            "exp": now + 3600,
        })))
        .unwrap()
    }

    #[tokio::test]
    async fn pepper_cached_per_identity() {
        let (counter, c) = client();
        let ekp = c.generate_ephemeral_key_pair(None).unwrap();
        let jwt = token(ekp.nonce());
        let a = c.get_pepper(&jwt, &ekp, "sub").await.unwrap();
        let b = c.get_pepper(&jwt, &ekp, "sub").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pepper_refused_on_nonce_mismatch() {
        let (counter, c) = client();
        let ekp = c.generate_ephemeral_key_pair(None).unwrap();
        let jwt = token("1");
        assert!(matches!(c.get_pepper(&jwt, &ekp, "sub").await, Err(Error::NonceMismatch { .. })));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn default_ephemeral_lifetime() {
        let (_, c) = client();
        let before = now_secs();
        let ekp = c.generate_ephemeral_key_pair(None).unwrap();
        let expected = before + c.config().ephemeral_lifetime_secs();
        assert!(ekp.expiry_date_secs() >= expected && ekp.expiry_date_secs() <= expected + 5);
    }

    #[tokio::test]
    async fn horizon_measured_from_issuance() {
        let config = KeylessConfig::builder().max_exp_horizon_secs(600).build().unwrap();
        let c = KeylessClient::with_services(
            config,
            Arc::new(CountingPepper(AtomicUsize::new(0))),
            Arc::new(NoProver),
        );
        let ekp = c.generate_ephemeral_key_pair(Some(now_secs() + 500)).unwrap();
        let now = now_secs();
        let jwt = Jwt::parse(&make(&serde_json::json!({
            "iss": "i", "aud": "a", "sub": "s", "nonce": ekp.nonce(),
            "iat": now - 200, "exp": now + 3600,
        })))
        .unwrap();
        let err = c.derive_keyless_account(DeriveAccountArgs::new(jwt, ekp)).await.unwrap_err();
        assert!(matches!(err, Error::ExpiryHorizon { .. }));
    }
}
