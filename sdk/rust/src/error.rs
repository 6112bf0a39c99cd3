use thiserror::Error;

/// Common result alias for the SDK.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], used by callers to decide between
/// fixing input, retrying, treating the failure as an attack signal, or
/// prompting the user to sign in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input (JWT, blinder, key material, payload arguments).
    Validation,
    /// Connectivity or transient service failure.
    Network,
    /// JWT / ephemeral key binding rejected locally or by a service.
    Binding,
    /// Ephemeral key pair or proof past its validity window.
    Expired,
    /// Anything else (encoding failures, internal task failures).
    Internal,
}

/// Top-level SDK error.
///
/// Specific submodules return these variants directly; there are no nested
/// per-module error enums in the public API.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    // ---- Transport / service ----------------------------------------------
    /// Network error (request building, connection, DNS, etc.).
    #[error("network error: {0}")]
    Network(String),

    /// HTTP status error (non-2xx) not mapped to a more specific variant.
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Service asked us to slow down (HTTP 429).
    #[error("rate limited by {service} service")]
    RateLimited { service: &'static str },

    /// Timeout reached while waiting for a response or a background proof.
    #[error("timeout: {0}")]
    Timeout(&'static str),

    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    // ---- Encoding / Decoding ----------------------------------------------
    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encode error.
    #[error("cbor encode error: {0}")]
    Cbor(String),

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Base64url decoding error (JWT segments).
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // ---- Input validation --------------------------------------------------
    /// JWT is structurally invalid, missing claims, or already expired.
    #[error("invalid jwt: {0}")]
    InvalidJwt(String),

    /// Blinder must be exactly [`crate::keyless::BLINDER_LENGTH`] bytes.
    #[error("blinder must be {expected} bytes, got {got}")]
    BlinderLength { expected: usize, got: usize },

    /// Pepper must be exactly [`crate::keyless::PEPPER_LENGTH`] bytes.
    #[error("pepper must be {expected} bytes, got {got}")]
    PepperLength { expected: usize, got: usize },

    /// Ephemeral expiry is in the past or beyond the allowed horizon.
    #[error("expiry {expiry} outside allowed window (latest allowed {max_allowed})")]
    ExpiryHorizon { expiry: u64, max_allowed: u64 },

    /// Address error (invalid length / hex).
    #[error("address error: {0}")]
    Address(String),

    /// Signer / key material error.
    #[error("signer error: {0}")]
    Signer(String),

    /// Payload schema or argument coercion error.
    #[error("payload error: {0}")]
    Payload(String),

    /// Invalid parameters for a call.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    // ---- Binding / protocol ------------------------------------------------
    /// The JWT nonce does not commit to the supplied ephemeral key pair.
    #[error("key binding mismatch: jwt nonce {jwt_nonce} does not match ephemeral nonce {expected}")]
    NonceMismatch { jwt_nonce: String, expected: String },

    /// A service refused the JWT (signature, issuer, audience or expiry checks).
    #[error("jwt validation failed at {service} service: {reason}")]
    JwtRejected { service: &'static str, reason: String },

    /// The proving service refused the request as malformed.
    #[error("proof request rejected: {0}")]
    ProofRejected(String),

    // ---- Expiry / proof lifecycle -----------------------------------------
    /// Ephemeral key pair has expired; the user must sign in again.
    #[error("ephemeral key pair expired at {expired_at}")]
    EphemeralKeyExpired { expired_at: u64 },

    /// Proof validity window has passed.
    #[error("proof expired at {expired_at}")]
    ProofExpired { expired_at: u64 },

    /// Proof is still being fetched in the background.
    #[error("proof not ready")]
    ProofNotReady,

    /// Background proof fetch finished with an error.
    #[error("proof fetch failed: {0}")]
    ProofFetchFailed(String),
}

impl Error {
    /// Classification per the SDK error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Network(_) | HttpStatus { .. } | RateLimited { .. } | Timeout(_) => ErrorKind::Network,
            InvalidJwt(_)
            | BlinderLength { .. }
            | PepperLength { .. }
            | ExpiryHorizon { .. }
            | Address(_)
            | Signer(_)
            | Payload(_)
            | InvalidParams(_)
            | Url(_)
            | Hex(_)
            | Base64(_) => ErrorKind::Validation,
            NonceMismatch { .. } | JwtRejected { .. } | ProofRejected(_) => ErrorKind::Binding,
            EphemeralKeyExpired { .. } | ProofExpired { .. } => ErrorKind::Expired,
            Json(_) | Cbor(_) | ProofNotReady | ProofFetchFailed(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error is likely transient and safe to retry with backoff.
    ///
    /// The SDK never retries internally; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) | Error::RateLimited { .. } => true,
            Error::HttpStatus { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

// ---- Conversions from common backends ---------------------------------------

#[cfg(feature = "native")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout("http")
        } else if let Some(status) = e.status() {
            Error::HttpStatus { status: status.as_u16(), body: e.to_string() }
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl<T: std::fmt::Debug> From<ciborium::ser::Error<T>> for Error {
    fn from(e: ciborium::ser::Error<T>) -> Self {
        Error::Cbor(format!("{e:?}"))
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        Error::Signer(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_only_for_transient_failures() {
        assert!(Error::Network("connection reset".into()).is_retryable());
        assert!(Error::Timeout("http").is_retryable());
        assert!(Error::RateLimited { service: "pepper" }.is_retryable());
        assert!(Error::HttpStatus { status: 503, body: String::new() }.is_retryable());
        assert!(!Error::HttpStatus { status: 404, body: String::new() }.is_retryable());
        assert!(!Error::NonceMismatch { jwt_nonce: "1".into(), expected: "2".into() }.is_retryable());
        assert!(!Error::EphemeralKeyExpired { expired_at: 1 }.is_retryable());
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::InvalidJwt("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::BlinderLength { expected: 31, got: 3 }.kind(), ErrorKind::Validation);
        assert_eq!(Error::Network("x".into()).kind(), ErrorKind::Network);
        assert_eq!(
            Error::JwtRejected { service: "pepper", reason: "bad sig".into() }.kind(),
            ErrorKind::Binding
        );
        assert_eq!(Error::ProofExpired { expired_at: 5 }.kind(), ErrorKind::Expired);
        assert_eq!(Error::ProofNotReady.kind(), ErrorKind::Internal);
    }
}
