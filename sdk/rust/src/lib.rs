//! Keyless account SDK.
//!
//! Derives blockchain accounts from OAuth identity tokens: an ephemeral key's
//! nonce is embedded in the OAuth request, the returned JWT is exchanged for a
//! pepper and a zero-knowledge proof, and the resulting [`KeylessAccount`]
//! signs transactions built from a data-driven function table.
//!
//! Modules:
//! - [`keyless`]: nonce, JWT, identity commitment, pepper/prover services,
//!   account assembly
//! - [`wallet`]: signer trait and ephemeral key pairs
//! - [`tx`]: payload builder, function catalog, canonical encoding
//! - [`config`], [`error`], [`address`], [`types`], [`utils`]
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod address;
pub mod config;
pub mod error;
pub mod keyless;
#[cfg(feature = "native")]
pub mod service;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use address::AccountAddress;
pub use config::{KeylessConfig, Network};
pub use error::{Error, ErrorKind, Result};
pub use keyless::{
    compute_address, derive_nonce, DeriveAccountArgs, EphemeralKeyPair, Jwt, KeylessAccount,
    KeylessClient, Pepper, ProofFetchMode, ProofStatus,
};
pub use types::{RawTransaction, SignedTransaction};
pub use wallet::TransactionSigner;
