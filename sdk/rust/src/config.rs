//! Client configuration.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KEYLESS_NETWORK` | Preset for service URLs (`devnet`, `testnet`, `mainnet`, `local`) | `local` |
//! | `KEYLESS_PEPPER_URL` | Pepper service base URL (overrides the preset) | preset |
//! | `KEYLESS_PROVER_URL` | Proving service base URL (overrides the preset) | preset |
//! | `KEYLESS_MAX_EXP_HORIZON_SECS` | Maximum ephemeral key lifetime measured from JWT issuance | `10000000` |
//! | `KEYLESS_PROOF_TIMEOUT_SECS` | Deadline for a background proof fetch | `60` |

use crate::error::{Error, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const NETWORK_ENV: &str = "KEYLESS_NETWORK";
pub const PEPPER_URL_ENV: &str = "KEYLESS_PEPPER_URL";
pub const PROVER_URL_ENV: &str = "KEYLESS_PROVER_URL";
pub const MAX_EXP_HORIZON_ENV: &str = "KEYLESS_MAX_EXP_HORIZON_SECS";
pub const PROOF_TIMEOUT_ENV: &str = "KEYLESS_PROOF_TIMEOUT_SECS";

/// On-chain default for the keyless configuration's `max_exp_horizon_secs`.
pub const DEFAULT_MAX_EXP_HORIZON_SECS: u64 = 10_000_000;

/// Two weeks.
pub const DEFAULT_EPHEMERAL_LIFETIME_SECS: u64 = 1_209_600;

/// BIP-44 style path the pepper service uses to derive per-account peppers.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/637'/0'/0'/0'";

/// Well-known deployments of the pepper and proving services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
    Local,
}

impl Network {
    pub fn pepper_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://api.devnet.aptoslabs.com/keyless/pepper/v0/",
            Network::Testnet => "https://api.testnet.aptoslabs.com/keyless/pepper/v0/",
            Network::Mainnet => "https://api.mainnet.aptoslabs.com/keyless/pepper/v0/",
            Network::Local => "http://127.0.0.1:8000/v0/",
        }
    }

    pub fn prover_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://api.devnet.aptoslabs.com/keyless/prover/v0/",
            Network::Testnet => "https://api.testnet.aptoslabs.com/keyless/prover/v0/",
            Network::Mainnet => "https://api.mainnet.aptoslabs.com/keyless/prover/v0/",
            Network::Local => "http://127.0.0.1:8083/v0/",
        }
    }
}

impl FromStr for Network {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "local" | "localnet" => Ok(Network::Local),
            other => Err(Error::InvalidParams(format!("unknown network: {other}"))),
        }
    }
}

/// Settings shared by the keyless client and its HTTP services.
///
/// Obtained from [`KeylessConfig::builder`], [`KeylessConfig::from_env`] or
/// serde. Every path normalizes the service base URLs and rejects a zero
/// horizon or proof timeout.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawKeylessConfig")]
pub struct KeylessConfig {
    pub pepper_url: Url,
    pub prover_url: Url,
    pub max_exp_horizon_secs: u64,
    pub default_ephemeral_lifetime_secs: u64,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub proof_fetch_timeout: Duration,
    pub derivation_path: String,
    pub user_agent: String,
}

/// Unchecked settings, as written in a config file or collected by the builder.
/// Explicit URLs win over the network preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawKeylessConfig {
    network: Network,
    pepper_url: Option<String>,
    prover_url: Option<String>,
    max_exp_horizon_secs: u64,
    default_ephemeral_lifetime_secs: u64,
    #[serde(with = "secs")]
    request_timeout: Duration,
    #[serde(with = "secs")]
    connect_timeout: Duration,
    #[serde(with = "secs")]
    proof_fetch_timeout: Duration,
    derivation_path: String,
    user_agent: String,
}

impl Default for RawKeylessConfig {
    fn default() -> Self {
        Self {
            network: Network::Local,
            pepper_url: None,
            prover_url: None,
            max_exp_horizon_secs: DEFAULT_MAX_EXP_HORIZON_SECS,
            default_ephemeral_lifetime_secs: DEFAULT_EPHEMERAL_LIFETIME_SECS,
            request_timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(10),
            proof_fetch_timeout: Duration::from_secs(60),
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
            user_agent: concat!("keyless-rust-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TryFrom<RawKeylessConfig> for KeylessConfig {
    type Error = Error;

    fn try_from(raw: RawKeylessConfig) -> Result<Self> {
        if raw.max_exp_horizon_secs == 0 {
            return Err(Error::InvalidParams("max_exp_horizon_secs must be > 0".into()));
        }
        if raw.proof_fetch_timeout.is_zero() {
            return Err(Error::InvalidParams("proof_fetch_timeout must be > 0".into()));
        }
        let pepper_url = parse_base_url(raw.pepper_url.as_deref().unwrap_or(raw.network.pepper_url()))?;
        let prover_url = parse_base_url(raw.prover_url.as_deref().unwrap_or(raw.network.prover_url()))?;
        Ok(Self {
            pepper_url,
            prover_url,
            max_exp_horizon_secs: raw.max_exp_horizon_secs,
            default_ephemeral_lifetime_secs: raw.default_ephemeral_lifetime_secs,
            request_timeout: raw.request_timeout,
            connect_timeout: raw.connect_timeout,
            proof_fetch_timeout: raw.proof_fetch_timeout,
            derivation_path: raw.derivation_path,
            user_agent: raw.user_agent,
        })
    }
}

impl KeylessConfig {
    /// Defaults with the service URLs of a preset network.
    pub fn for_network(network: Network) -> Result<Self> {
        Self::builder().network(network).build()
    }

    /// Builder starting from the `local` preset and default limits.
    pub fn builder() -> KeylessConfigBuilder {
        KeylessConfigBuilder { raw: RawKeylessConfig::default() }
    }

    /// Load from `KEYLESS_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Ok(v) = std::env::var(NETWORK_ENV) {
            builder = builder.network(v.parse()?);
        }
        if let Ok(v) = std::env::var(PEPPER_URL_ENV) {
            builder = builder.pepper_url(&v);
        }
        if let Ok(v) = std::env::var(PROVER_URL_ENV) {
            builder = builder.prover_url(&v);
        }
        if let Ok(v) = std::env::var(MAX_EXP_HORIZON_ENV) {
            let secs = v
                .parse()
                .map_err(|_| Error::InvalidParams(format!("{MAX_EXP_HORIZON_ENV}={v}")))?;
            builder = builder.max_exp_horizon_secs(secs);
        }
        if let Ok(v) = std::env::var(PROOF_TIMEOUT_ENV) {
            let secs = v
                .parse()
                .map_err(|_| Error::InvalidParams(format!("{PROOF_TIMEOUT_ENV}={v}")))?;
            builder = builder.proof_fetch_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Default ephemeral lifetime, clamped to the horizon.
    pub fn ephemeral_lifetime_secs(&self) -> u64 {
        self.default_ephemeral_lifetime_secs.min(self.max_exp_horizon_secs)
    }
}

/// Builder for [`KeylessConfig`]. Nothing is checked until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct KeylessConfigBuilder {
    raw: RawKeylessConfig,
}

impl KeylessConfigBuilder {
    /// Preset for whichever service URL is not set explicitly.
    pub fn network(mut self, network: Network) -> Self {
        self.raw.network = network;
        self
    }

    pub fn pepper_url(mut self, url: &str) -> Self {
        self.raw.pepper_url = Some(url.to_owned());
        self
    }

    pub fn prover_url(mut self, url: &str) -> Self {
        self.raw.prover_url = Some(url.to_owned());
        self
    }

    pub fn max_exp_horizon_secs(mut self, secs: u64) -> Self {
        self.raw.max_exp_horizon_secs = secs;
        self
    }

    pub fn default_ephemeral_lifetime_secs(mut self, secs: u64) -> Self {
        self.raw.default_ephemeral_lifetime_secs = secs;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.raw.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.raw.connect_timeout = timeout;
        self
    }

    pub fn proof_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.raw.proof_fetch_timeout = timeout;
        self
    }

    pub fn derivation_path(mut self, path: &str) -> Self {
        self.raw.derivation_path = path.to_owned();
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.raw.user_agent = ua.to_owned();
        self
    }

    pub fn build(self) -> Result<KeylessConfig> {
        KeylessConfig::try_from(self.raw)
    }
}

/// Service paths are joined relative to the base, so it must end with `/`.
fn parse_base_url(url: &str) -> Result<Url> {
    let mut s = url.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    Ok(Url::parse(&s)?)
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
