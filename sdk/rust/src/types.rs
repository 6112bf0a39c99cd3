//! Transaction types.
//!
//! Only what a keyless account needs to produce a signed transaction: the raw
//! transaction, its authenticator and the signed envelope. Submission and
//! receipts belong to the node client, not this crate.

use crate::address::AccountAddress;
use crate::keyless::account::KeylessSignature;
use crate::keyless::commitment::KeylessPublicKey;
use crate::tx::payload::EntryFunctionPayload;
use serde::Serialize;

/// Chain identifier.
pub type ChainId = u8;

/// What a transaction executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionPayload {
    EntryFunction(EntryFunctionPayload),
}

impl From<EntryFunctionPayload> for TransactionPayload {
    fn from(p: EntryFunctionPayload) -> Self {
        TransactionPayload::EntryFunction(p)
    }
}

/// Unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub payload: TransactionPayload,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: ChainId,
}

impl RawTransaction {
    pub fn new(
        sender: AccountAddress,
        sequence_number: u64,
        payload: impl Into<TransactionPayload>,
        max_gas_amount: u64,
        gas_unit_price: u64,
        expiration_timestamp_secs: u64,
        chain_id: ChainId,
    ) -> Self {
        Self {
            sender,
            sequence_number,
            payload: payload.into(),
            max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs,
            chain_id,
        }
    }
}

/// Proof of authorization attached to a transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionAuthenticator {
    Keyless {
        public_key: KeylessPublicKey,
        signature: KeylessSignature,
    },
}

/// Raw transaction plus authenticator, ready for submission.
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransaction {
    pub raw_txn: RawTransaction,
    pub authenticator: TransactionAuthenticator,
}
