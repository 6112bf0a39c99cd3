//! Canonical CBOR encoding for transactions and signing.
//!
//! - **Signing message** = `sha3_256("KEYLESS::RawTransaction") || cbor(raw)`.
//!   The salt prefix keeps transaction signatures apart from any other bytes
//!   an ephemeral key might sign.
//! - Maps use **integer keys** in ascending order, so the encoding is stable
//!   across runs and SDKs.
//!
//! ## RawTransaction map layout
//! ```text
//! 0: sender                     (bytes, 32)
//! 1: sequence_number            (u64)
//! 2: payload                    ({0: function, 1: [type args], 2: [args]})
//! 3: max_gas_amount             (u64)
//! 4: gas_unit_price             (u64)
//! 5: expiration_timestamp_secs  (u64)
//! 6: chain_id                   (u8)
//! ```
//!
//! ## Signed envelope
//! `[ RawTxMap, AuthMap ]` where a keyless `AuthMap` is
//! ```text
//! 0: variant      (u8, 3 = keyless)
//! 1: public_key   (bytes)
//! 2: signature    (map, see KeylessSignature::to_cbor_value)
//! ```

use crate::error::{Error, Result};
use crate::types::{RawTransaction, SignedTransaction, TransactionAuthenticator, TransactionPayload};
use crate::utils::cbor;
use crate::utils::hash::sha3_256;
use crate::wallet::TransactionSigner;
use ciborium::value::Value;

/// Salt hashed into the signing-message prefix.
pub const RAW_TRANSACTION_SALT: &[u8] = b"KEYLESS::RawTransaction";

/// Authenticator variant tag for keyless signatures.
pub const KEYLESS_AUTHENTICATOR: u8 = 3;

fn payload_value(payload: &TransactionPayload) -> Value {
    match payload {
        TransactionPayload::EntryFunction(p) => p.to_cbor_value(),
    }
}

fn raw_value(raw: &RawTransaction) -> Value {
    cbor::int_map(vec![
        (0, cbor::bytes(raw.sender.as_bytes())),
        (1, cbor::uint(raw.sequence_number)),
        (2, payload_value(&raw.payload)),
        (3, cbor::uint(raw.max_gas_amount)),
        (4, cbor::uint(raw.gas_unit_price)),
        (5, cbor::uint(raw.expiration_timestamp_secs)),
        (6, cbor::uint(u64::from(raw.chain_id))),
    ])
}

fn authenticator_value(auth: &TransactionAuthenticator) -> Result<Value> {
    match auth {
        TransactionAuthenticator::Keyless { public_key, signature } => Ok(cbor::int_map(vec![
            (0, cbor::uint(u64::from(KEYLESS_AUTHENTICATOR))),
            (1, cbor::bytes(&public_key.to_bytes())),
            (2, signature.to_cbor_value()?),
        ])),
    }
}

/// Canonical CBOR of the unsigned transaction.
pub fn encode_raw_transaction(raw: &RawTransaction) -> Result<Vec<u8>> {
    cbor::to_vec(&raw_value(raw))
}

/// Bytes an account signs for `raw`.
pub fn signing_message(raw: &RawTransaction) -> Result<Vec<u8>> {
    let body = encode_raw_transaction(raw)?;
    let mut out = Vec::with_capacity(32 + body.len());
    out.extend_from_slice(&sha3_256(RAW_TRANSACTION_SALT));
    out.extend_from_slice(&body);
    Ok(out)
}

/// Sign `raw` with `signer`. The transaction's sender must be the signer.
pub fn build_signed_transaction<S>(signer: &S, raw: RawTransaction) -> Result<SignedTransaction>
where
    S: TransactionSigner + ?Sized,
{
    let address = signer.address();
    if raw.sender != address {
        return Err(Error::Signer(format!(
            "transaction sender {} does not match signer {address}",
            raw.sender
        )));
    }
    let message = signing_message(&raw)?;
    let authenticator = signer.authenticate(&message)?;
    Ok(SignedTransaction { raw_txn: raw, authenticator })
}

/// Canonical CBOR of the signed envelope, as submitted to a node.
pub fn encode_signed_transaction(tx: &SignedTransaction) -> Result<Vec<u8>> {
    let envelope = Value::Array(vec![raw_value(&tx.raw_txn), authenticator_value(&tx.authenticator)?]);
    cbor::to_vec(&envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountAddress;
    use crate::tx::catalog;
    use serde_json::json;

    fn raw(seq: u64) -> RawTransaction {
        let payload = catalog::entry_payload(
            "0x1::aptos_account::transfer",
            &[],
            vec![json!("0x2"), json!(100)],
        )
        .unwrap();
        RawTransaction::new(AccountAddress::new([7; 32]), seq, payload, 2_000, 100, 1_900_000_000, 4)
    }

    #[test]
    fn encoding_is_stable() {
        assert_eq!(encode_raw_transaction(&raw(1)).unwrap(), encode_raw_transaction(&raw(1)).unwrap());
        assert_ne!(encode_raw_transaction(&raw(1)).unwrap(), encode_raw_transaction(&raw(2)).unwrap());
    }

    #[test]
    fn signing_message_is_salted() {
        let msg = signing_message(&raw(1)).unwrap();
        assert_eq!(&msg[..32], &sha3_256(RAW_TRANSACTION_SALT));
        assert_eq!(&msg[32..], encode_raw_transaction(&raw(1)).unwrap().as_slice());
    }
}
