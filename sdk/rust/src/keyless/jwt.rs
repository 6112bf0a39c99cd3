//! OpenID Connect ID tokens as consumed by keyless derivation.
//!
//! Tokens are decoded, not verified: the identity provider's RSA signature is
//! checked by the pepper service, the prover and ultimately the chain. Locally
//! we only need the claims that feed the nonce binding and the identity
//! commitment.

use crate::error::{Error, Result};
use crate::wallet::ephemeral::EphemeralKeyPair;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim used to identify the user when the caller does not pick one.
pub const DEFAULT_UID_KEY: &str = "sub";

/// JOSE header.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// `aud` is either a string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Claims relevant to keyless accounts. Unknown claims are kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub aud: Audience,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A decoded token together with its original encoding.
#[derive(Debug, Clone)]
pub struct Jwt {
    raw: String,
    header_b64: String,
    header: JwtHeader,
    claims: JwtClaims,
}

impl Jwt {
    /// Split and decode `header.payload.signature`.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(Error::InvalidJwt("expected three dot-separated segments".into())),
            };
        if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
            return Err(Error::InvalidJwt("empty segment".into()));
        }
        let header: JwtHeader = decode_segment(header_b64, "header")?;
        let claims: JwtClaims = decode_segment(payload_b64, "payload")?;
        Ok(Self {
            raw: token.to_string(),
            header_b64: header_b64.to_string(),
            header,
            claims,
        })
    }

    /// Structural checks plus expiry against `now`.
    pub fn validate(&self, now: u64) -> Result<()> {
        if self.claims.iss.is_empty() {
            return Err(Error::InvalidJwt("empty iss".into()));
        }
        self.audience()?;
        if self.claims.nonce.as_deref().map_or(true, str::is_empty) {
            return Err(Error::InvalidJwt("missing nonce claim".into()));
        }
        match self.claims.exp {
            Some(exp) if exp <= now => {
                Err(Error::InvalidJwt(format!("token expired at {exp}")))
            }
            Some(_) => Ok(()),
            None => Err(Error::InvalidJwt("missing exp claim".into())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Base64url header segment exactly as issued; carried in signatures.
    pub fn header_b64(&self) -> &str {
        &self.header_b64
    }

    pub fn header(&self) -> &JwtHeader {
        &self.header
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }

    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    /// The single audience (OAuth client id). Multi-audience tokens are refused.
    pub fn audience(&self) -> Result<&str> {
        match &self.claims.aud {
            Audience::One(a) if !a.is_empty() => Ok(a),
            Audience::Many(v) if v.len() == 1 && !v[0].is_empty() => Ok(&v[0]),
            _ => Err(Error::InvalidJwt("aud must name exactly one client".into())),
        }
    }

    pub fn nonce(&self) -> Option<&str> {
        self.claims.nonce.as_deref()
    }

    pub fn issued_at(&self) -> Option<u64> {
        self.claims.iat
    }

    pub fn expires_at(&self) -> Option<u64> {
        self.claims.exp
    }

    /// Value of the claim that identifies the user (`sub`, `email`, ...).
    pub fn uid_value(&self, uid_key: &str) -> Result<String> {
        let found = match uid_key {
            "sub" => self.claims.sub.clone(),
            "iss" => Some(self.claims.iss.clone()),
            "nonce" => self.claims.nonce.clone(),
            other => self.claims.extra.get(other).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        };
        found
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::InvalidJwt(format!("missing uid claim '{uid_key}'")))
    }
}

/// Check that the token's nonce commits to this ephemeral key pair.
///
/// Must pass before the token is shown to any service alongside the pair.
pub fn verify_nonce_binding(jwt: &Jwt, ephemeral: &EphemeralKeyPair) -> Result<()> {
    let jwt_nonce = jwt.nonce().unwrap_or_default();
    if jwt_nonce != ephemeral.nonce() {
        return Err(Error::NonceMismatch {
            jwt_nonce: jwt_nonce.to_string(),
            expected: ephemeral.nonce().to_string(),
        });
    }
    Ok(())
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidJwt(format!("{what}: {e}")))
}


#[cfg(test)]
mod tests {
    use super::test_tokens::make;
    use super::*;
    use serde_json::json;

    fn claims(nonce: &str) -> Value {
        json!({
            "iss": "https://accounts.google.com",
            "aud": "407408718192.apps.googleusercontent.com",
            "sub": "111627772460752342312",
            "email": "user@example.com",
            "nonce": nonce,
            "iat": 1_708_911_966u64,
            "exp": 1_708_915_566u64,
        })
    }

    #[test]
    fn parses_claims_and_header() {
        let jwt = Jwt::parse(&make(&claims("123"))).unwrap();
        assert_eq!(jwt.issuer(), "https://accounts.google.com");
        assert_eq!(jwt.audience().unwrap(), "407408718192.apps.googleusercontent.com");
        assert_eq!(jwt.nonce(), Some("123"));
        assert_eq!(jwt.header().kid.as_deref(), Some("test-kid"));
        assert_eq!(jwt.uid_value(DEFAULT_UID_KEY).unwrap(), "111627772460752342312");
        assert_eq!(jwt.uid_value("email").unwrap(), "user@example.com");
        assert!(jwt.uid_value("phone").is_err());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(Jwt::parse("abc"), Err(Error::InvalidJwt(_))));
        assert!(matches!(Jwt::parse("a.b.c.d"), Err(Error::InvalidJwt(_))));
        assert!(Jwt::parse("!!.??.zz").is_err());
        // Valid base64 but not JSON claims.
        let bad = format!("{}.{}.sig", URL_SAFE_NO_PAD.encode("{}"), URL_SAFE_NO_PAD.encode("[1]"));
        assert!(Jwt::parse(&bad).is_err());
    }

    #[test]
    fn expiry_validation() {
        let jwt = Jwt::parse(&make(&claims("1"))).unwrap();
        assert!(jwt.validate(1_708_915_565).is_ok());
        assert!(matches!(jwt.validate(1_708_915_566), Err(Error::InvalidJwt(_))));
    }

    #[test]
    fn audience_array_with_one_entry() {
        let mut c = claims("1");
        c["aud"] = json!(["client-a"]);
        assert_eq!(Jwt::parse(&make(&c)).unwrap().audience().unwrap(), "client-a");
        c["aud"] = json!(["client-a", "client-b"]);
        assert!(Jwt::parse(&make(&c)).unwrap().audience().is_err());
    }

    #[test]
    fn nonce_binding() {
        let kp = EphemeralKeyPair::from_parts([0x11; 32], 1_718_911_224, &[0u8; 31]).unwrap();
        let good = Jwt::parse(&make(&claims(kp.nonce()))).unwrap();
        verify_nonce_binding(&good, &kp).unwrap();

        let bad = Jwt::parse(&make(&claims("42"))).unwrap();
        assert!(matches!(verify_nonce_binding(&bad, &kp), Err(Error::NonceMismatch { .. })));
    }
}
