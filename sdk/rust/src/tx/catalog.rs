//! Static table of known on-chain functions.
//!
//! Rows are plain data; [`PayloadBuilder`](super::payload::PayloadBuilder)
//! turns any of them into a payload. Add a row to support a new function.

use super::payload::{
    EntryFunctionPayload, FunctionId, FunctionKind, FunctionSchema, ViewFunctionPayload,
};
use crate::error::{Error, Result};
use serde_json::Value;

const FRAMEWORK: &str = "0x1";

/// Game profile module used by the demo application.
pub const PLAYER_PROFILE_ADDRESS: &str =
    "0x4b272129fdeabadae2d61453a1e2693de7758215a3653463e9adffddd3d3a766";

const fn entry(
    module_address: &'static str,
    module_name: &'static str,
    function_name: &'static str,
    type_params: u16,
    params: &'static [(&'static str, &'static str)],
) -> FunctionSchema {
    FunctionSchema { module_address, module_name, function_name, kind: FunctionKind::Entry, type_params, params }
}

const fn view(
    module_address: &'static str,
    module_name: &'static str,
    function_name: &'static str,
    type_params: u16,
    params: &'static [(&'static str, &'static str)],
) -> FunctionSchema {
    FunctionSchema { module_address, module_name, function_name, kind: FunctionKind::View, type_params, params }
}

/// Every function the SDK knows how to build.
pub static FUNCTIONS: &[FunctionSchema] = &[
    // ---- delegation_pool: entry ----
    entry(FRAMEWORK, "delegation_pool", "initialize_delegation_pool", 0, &[
        ("operator_commission_percentage", "u64"),
        ("delegation_pool_creation_seed", "vector<u8>"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "add_stake", 0, &[("pool_address", "address"), ("amount", "u64")]),
    entry(FRAMEWORK, "delegation_pool", "unlock", 0, &[("pool_address", "address"), ("amount", "u64")]),
    entry(FRAMEWORK, "delegation_pool", "reactivate_stake", 0, &[
        ("pool_address", "address"),
        ("amount", "u64"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "withdraw", 0, &[("pool_address", "address"), ("amount", "u64")]),
    entry(FRAMEWORK, "delegation_pool", "set_operator", 0, &[("new_operator", "address")]),
    entry(FRAMEWORK, "delegation_pool", "set_delegated_voter", 0, &[("new_voter", "address")]),
    entry(FRAMEWORK, "delegation_pool", "delegate_voting_power", 0, &[
        ("pool_address", "address"),
        ("new_voter", "address"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "vote", 0, &[
        ("pool_address", "address"),
        ("proposal_id", "u64"),
        ("voting_power", "u64"),
        ("should_pass", "bool"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "create_proposal", 0, &[
        ("pool_address", "address"),
        ("execution_hash", "vector<u8>"),
        ("metadata_location", "vector<u8>"),
        ("metadata_hash", "vector<u8>"),
        ("is_multi_step_proposal", "bool"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "update_commission_percentage", 0, &[
        ("new_commission_percentage", "u64"),
    ]),
    entry(FRAMEWORK, "delegation_pool", "synchronize_delegation_pool", 0, &[("pool_address", "address")]),
    // ---- delegation_pool: view ----
    view(FRAMEWORK, "delegation_pool", "delegation_pool_exists", 0, &[("addr", "address")]),
    view(FRAMEWORK, "delegation_pool", "get_stake", 0, &[
        ("pool_address", "address"),
        ("delegator_address", "address"),
    ]),
    view(FRAMEWORK, "delegation_pool", "get_add_stake_fee", 0, &[
        ("pool_address", "address"),
        ("amount", "u64"),
    ]),
    view(FRAMEWORK, "delegation_pool", "get_delegation_pool_stake", 0, &[("pool_address", "address")]),
    view(FRAMEWORK, "delegation_pool", "operator_commission_percentage", 0, &[("pool_address", "address")]),
    view(FRAMEWORK, "delegation_pool", "calculate_and_update_voter_total_voting_power", 0, &[
        ("pool_address", "address"),
        ("voter", "address"),
    ]),
    // ---- accounts and coins ----
    entry(FRAMEWORK, "aptos_account", "transfer", 0, &[("to", "address"), ("amount", "u64")]),
    entry(FRAMEWORK, "aptos_account", "create_account", 0, &[("auth_key", "address")]),
    entry(FRAMEWORK, "coin", "transfer", 1, &[("to", "address"), ("amount", "u64")]),
    view(FRAMEWORK, "coin", "balance", 1, &[("owner", "address")]),
    // ---- application modules ----
    view(PLAYER_PROFILE_ADDRESS, "player_profile", "view_player_profile", 0, &[("player", "address")]),
    entry(PLAYER_PROFILE_ADDRESS, "player_profile", "set_display_name", 0, &[
        ("display_name", "0x1::string::String"),
    ]),
];

/// Find a function by `address::module::function`. Short and long address
/// forms both match.
pub fn lookup(function: &str) -> Option<&'static FunctionSchema> {
    let wanted: FunctionId = function.parse().ok()?;
    FUNCTIONS
        .iter()
        .find(|s| s.function_id().map(|id| id == wanted).unwrap_or(false))
}

pub fn entry_functions() -> impl Iterator<Item = &'static FunctionSchema> {
    FUNCTIONS.iter().filter(|s| s.kind == FunctionKind::Entry)
}

pub fn view_functions() -> impl Iterator<Item = &'static FunctionSchema> {
    FUNCTIONS.iter().filter(|s| s.kind == FunctionKind::View)
}

fn require(function: &str) -> Result<&'static FunctionSchema> {
    lookup(function).ok_or_else(|| Error::Payload(format!("unknown function: {function}")))
}

/// Build an entry payload for a catalogued function.
pub fn entry_payload(function: &str, type_args: &[&str], args: Vec<Value>) -> Result<EntryFunctionPayload> {
    type_args
        .iter()
        .fold(require(function)?.builder(), |b, t| b.type_arg(t))
        .args(args)
        .build_entry()
}

/// Build a view payload for a catalogued function.
pub fn view_payload(function: &str, type_args: &[&str], args: Vec<Value>) -> Result<ViewFunctionPayload> {
    type_args
        .iter()
        .fold(require(function)?.builder(), |b, t| b.type_arg(t))
        .args(args)
        .build_view()
}
