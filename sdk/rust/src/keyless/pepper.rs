//! Pepper service.
//!
//! Wire format:
//! ```text
//! POST {pepper_url}/fetch
//! Authorization: Bearer <jwt>
//! { "jwt_b64", "epk", "exp_date_secs", "epk_blinder", "uid_key", "derivation_path" }
//! -> { "pepper": "0x<32 bytes>" }
//! ```
//!
//! The service re-checks the JWT signature and the nonce binding server-side.
//! The client checks the binding too, before the request is ever sent.

use crate::error::Result;
use crate::keyless::jwt::Jwt;
use crate::keyless::Pepper;
use crate::utils::bytes::hex_encode;
use crate::wallet::ephemeral::EphemeralKeyPair;
use futures::future::BoxFuture;
use serde::Serialize;

/// Body of a pepper request.
#[derive(Clone, Serialize)]
pub struct PepperRequest {
    pub jwt_b64: String,
    pub epk: String,
    pub exp_date_secs: u64,
    pub epk_blinder: String,
    pub uid_key: String,
    pub derivation_path: String,
    #[serde(skip)]
    pub(crate) jwt_nonce: String,
    #[serde(skip)]
    pub(crate) ephemeral_nonce: String,
}

impl PepperRequest {
    pub fn new(jwt: &Jwt, ephemeral: &EphemeralKeyPair, uid_key: &str, derivation_path: &str) -> Self {
        Self {
            jwt_b64: jwt.as_str().to_string(),
            epk: ephemeral.public_key().to_hex(),
            exp_date_secs: ephemeral.expiry_date_secs(),
            epk_blinder: hex_encode(ephemeral.blinder()),
            uid_key: uid_key.to_string(),
            derivation_path: derivation_path.to_string(),
            jwt_nonce: jwt.nonce().unwrap_or_default().to_string(),
            ephemeral_nonce: ephemeral.nonce().to_string(),
        }
    }
}

impl std::fmt::Debug for PepperRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PepperRequest")
            .field("epk", &self.epk)
            .field("exp_date_secs", &self.exp_date_secs)
            .field("uid_key", &self.uid_key)
            .field("derivation_path", &self.derivation_path)
            .finish_non_exhaustive()
    }
}

/// Source of peppers. Implemented over HTTP by [`HttpPepperService`]; tests and
/// custom deployments supply their own.
pub trait PepperService: Send + Sync {
    fn fetch_pepper<'a>(&'a self, request: &'a PepperRequest) -> BoxFuture<'a, Result<Pepper>>;
}

#[cfg(feature = "native")]
pub use self::http::HttpPepperService;

#[cfg(feature = "native")]
mod http {
    use super::*;
    use crate::config::KeylessConfig;
    use crate::error::Error;
    use crate::service::{ServiceClient, ServiceClientBuilder};
    use futures::FutureExt;
    use serde::Deserialize;

    const SERVICE: &str = "pepper";

    #[derive(Deserialize)]
    struct PepperResponse {
        pepper: String,
    }

    /// Pepper service reached over HTTP.
    #[derive(Debug, Clone)]
    pub struct HttpPepperService {
        http: ServiceClient,
    }

    impl HttpPepperService {
        pub fn new(config: &KeylessConfig) -> Result<Self> {
            let http = ServiceClientBuilder::from_config(SERVICE, &config.pepper_url, config).build()?;
            Ok(Self { http })
        }

        async fn fetch(&self, request: &PepperRequest) -> Result<Pepper> {
            let resp: PepperResponse = self
                .http
                .post_json("fetch", Some(request.jwt_b64.as_str()), request)
                .await
                .map_err(|e| refine(e, request))?;
            Pepper::from_hex(&resp.pepper)
        }
    }

    impl PepperService for HttpPepperService {
        fn fetch_pepper<'a>(&'a self, request: &'a PepperRequest) -> BoxFuture<'a, Result<Pepper>> {
            self.fetch(request).boxed()
        }
    }

    /// 400 is either a server-side nonce mismatch or a bad token.
    fn refine(err: Error, request: &PepperRequest) -> Error {
        match err {
            Error::HttpStatus { status: 400, body } => {
                if body.to_ascii_lowercase().contains("nonce") {
                    Error::NonceMismatch {
                        jwt_nonce: request.jwt_nonce.clone(),
                        expected: request.ephemeral_nonce.clone(),
                    }
                } else {
                    Error::JwtRejected { service: SERVICE, reason: body }
                }
            }
            other => other,
        }
    }

}
