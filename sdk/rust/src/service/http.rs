//! JSON-over-HTTP client shared by the pepper and proving services (reqwest).
//!
//! - Base URL plus relative paths (`fetch`, `prove`), joined with [`Url::join`].
//! - Timeouts, user agent and content type from [`KeylessConfig`].
//! - Optional bearer token per request (the pepper service authenticates the JWT).
//! - No retry loop: failures surface immediately and callers consult
//!   [`Error::is_retryable`](crate::error::Error::is_retryable).
//!
//! Status mapping common to both services:
//! - 401 / 403 → [`Error::JwtRejected`]
//! - 429 → [`Error::RateLimited`]
//! - everything else non-2xx → [`Error::HttpStatus`], refined by the caller

use crate::config::KeylessConfig;
use crate::error::{Error, Result};
use reqwest::{header, Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Builder for [`ServiceClient`].
#[derive(Clone, Debug)]
pub struct ServiceClientBuilder {
    service: &'static str,
    base: Url,
    timeout: Duration,
    connect_timeout: Duration,
    default_headers: header::HeaderMap,
    user_agent: Option<String>,
}

impl ServiceClientBuilder {
    pub fn new(service: &'static str, base: Url) -> Self {
        Self {
            service,
            base,
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
            default_headers: header::HeaderMap::new(),
            user_agent: None,
        }
    }

    /// Base URL, timeouts and user agent from the client configuration.
    pub fn from_config(service: &'static str, base: &Url, config: &KeylessConfig) -> Self {
        Self::new(service, base.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn header(mut self, key: header::HeaderName, value: header::HeaderValue) -> Self {
        self.default_headers.insert(key, value);
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_owned());
        self
    }

    pub fn build(self) -> Result<ServiceClient> {
        let mut headers = self.default_headers.clone();
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(header::HeaderValue::from_static("application/json"));
        let ua = self
            .user_agent
            .as_deref()
            .and_then(|ua| header::HeaderValue::from_str(ua).ok())
            .unwrap_or_else(|| header::HeaderValue::from_static("keyless-rust-sdk"));
        headers.entry(header::USER_AGENT).or_insert(ua);

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Network(format!("reqwest build: {e}")))?;

        Ok(ServiceClient { service: self.service, base: self.base, client })
    }
}

/// Async JSON client bound to one service base URL.
#[derive(Clone)]
pub struct ServiceClient {
    service: &'static str,
    base: Url,
    client: Client,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.service)
            .field("base", &self.base.as_str())
            .finish()
    }
}

impl ServiceClient {
    pub fn builder(service: &'static str, base: Url) -> ServiceClientBuilder {
        ServiceClientBuilder::new(service, base)
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// POST `body` as JSON to `path` and decode a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, bearer: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(service = self.service, %url, "service request");

        let mut req = self.client.post(url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let err = http_status_error(self.service, status, &bytes);
            tracing::warn!(service = self.service, status = status.as_u16(), "service rejected request");
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Network(format!(
                "{} service returned undecodable body: {e}; body={}",
                self.service,
                truncate_body(&bytes)
            ))
        })
    }
}

// --------------------------- helpers -----------------------------------------

pub(crate) fn truncate_body(bytes: &[u8]) -> String {
    const LIM: usize = 512;
    let s = String::from_utf8_lossy(bytes);
    if s.len() > LIM {
        let mut end = LIM;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[+{}B]", &s[..end], s.len() - end)
    } else {
        s.into_owned()
    }
}

pub(crate) fn http_status_error(service: &'static str, status: StatusCode, body: &[u8]) -> Error {
    let snippet = truncate_body(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::JwtRejected { service, reason: snippet }
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { service },
        _ => Error::HttpStatus { status: status.as_u16(), body: snippet },
    }
}

// ------------------------------ tests ----------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_relative_to_base() {
        let c = ServiceClient::builder("pepper", Url::parse("http://localhost:8000/v0/").unwrap())
            .build()
            .unwrap();
        assert_eq!(c.endpoint("fetch").unwrap().as_str(), "http://localhost:8000/v0/fetch");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            http_status_error("pepper", StatusCode::UNAUTHORIZED, b"bad sig"),
            Error::JwtRejected { service: "pepper", .. }
        ));
        assert!(matches!(
            http_status_error("prover", StatusCode::TOO_MANY_REQUESTS, b""),
            Error::RateLimited { service: "prover" }
        ));
        let e = http_status_error("prover", StatusCode::BAD_GATEWAY, b"upstream");
        assert!(e.is_retryable());
        assert!(matches!(e, Error::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(400);
        let t = truncate_body(long.as_bytes());
        assert!(t.contains("...[+"));
    }
}
