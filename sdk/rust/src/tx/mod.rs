//! Transaction payloads, the function table and canonical encoding.

pub mod catalog;
pub mod encode;
pub mod payload;

pub use encode::{build_signed_transaction, encode_signed_transaction, signing_message};
pub use payload::{
    EntryFunctionPayload, FunctionId, FunctionKind, FunctionSchema, MoveType, MoveValue,
    PayloadBuilder, ViewFunctionPayload,
};
