//! Signers.
//!
//! A [`TransactionSigner`] owns an address and turns a transaction signing
//! message into an authenticator. Keyless accounts are the implementation
//! shipped here; their short-lived keys live in [`ephemeral`].
//!
//! ## Examples
//! ```no_run
//! use keyless_sdk::tx::encode::build_signed_transaction;
//! use keyless_sdk::types::RawTransaction;
//! use keyless_sdk::wallet::TransactionSigner;
//!
//! fn sign_and_print<S: TransactionSigner>(signer: &S, raw: RawTransaction) -> keyless_sdk::Result<()> {
//!     let signed = build_signed_transaction(signer, raw)?;
//!     println!("{}", serde_json::to_string(&signed)?);
//!     Ok(())
//! }
//! ```

use crate::address::AccountAddress;
use crate::error::Result;
use crate::types::TransactionAuthenticator;

pub mod ephemeral;

/// Minimal signer interface used by transaction building.
pub trait TransactionSigner: Send + Sync {
    /// Account the signer authorizes.
    fn address(&self) -> AccountAddress;

    /// Authorize `signing_message` (see [`crate::tx::encode::signing_message`]).
    fn authenticate(&self, signing_message: &[u8]) -> Result<TransactionAuthenticator>;
}

pub use ephemeral::{EphemeralKeyPair, EphemeralPublicKey};
