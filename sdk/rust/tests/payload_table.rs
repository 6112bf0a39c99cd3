// Function table coverage: every row must parse, and payloads built from the
// table must carry checked, canonically encoded arguments.

use keyless_sdk::tx::catalog::{self, FUNCTIONS, PLAYER_PROFILE_ADDRESS};
use keyless_sdk::tx::{FunctionKind, MoveValue, PayloadBuilder};
use keyless_sdk::{AccountAddress, Error};
use serde_json::json;
use std::collections::HashSet;

#[test]
fn every_row_is_well_formed() {
    let mut seen = HashSet::new();
    for f in FUNCTIONS {
        let id = f.function_id().unwrap_or_else(|e| panic!("{}: {e}", f.function_name));
        assert!(seen.insert(id.to_string()), "duplicate row {id}");
        f.param_types().unwrap_or_else(|e| panic!("{id}: {e}"));
        assert!(catalog::lookup(&id.to_string()).is_some(), "{id} not found by lookup");
    }
    assert_eq!(catalog::entry_functions().count() + catalog::view_functions().count(), FUNCTIONS.len());
}

#[test]
fn delegation_pool_surface_is_complete() {
    for name in [
        "initialize_delegation_pool",
        "add_stake",
        "unlock",
        "reactivate_stake",
        "withdraw",
        "set_operator",
        "set_delegated_voter",
        "delegate_voting_power",
        "vote",
        "create_proposal",
        "update_commission_percentage",
        "synchronize_delegation_pool",
    ] {
        let f = catalog::lookup(&format!("0x1::delegation_pool::{name}")).unwrap_or_else(|| panic!("{name}"));
        assert_eq!(f.kind, FunctionKind::Entry, "{name}");
    }
    for name in ["get_stake", "delegation_pool_exists", "get_add_stake_fee", "operator_commission_percentage"] {
        let f = catalog::lookup(&format!("0x1::delegation_pool::{name}")).unwrap_or_else(|| panic!("{name}"));
        assert_eq!(f.kind, FunctionKind::View, "{name}");
    }
}

#[test]
fn vote_arguments_are_typed() {
    let p = catalog::entry_payload(
        "0x1::delegation_pool::vote",
        &[],
        vec![json!("0xabc"), json!(7), json!("250000"), json!(true)],
    )
    .unwrap();
    assert_eq!(p.function.to_string(), "0x1::delegation_pool::vote");
    assert_eq!(p.args[0], MoveValue::Address("0xabc".parse().unwrap()));
    assert_eq!(p.args[1], MoveValue::U64(7));
    assert_eq!(p.args[2], MoveValue::U64(250_000));
    assert_eq!(p.args[3], MoveValue::Bool(true));

    let err = catalog::entry_payload("0x1::delegation_pool::vote", &[], vec![json!("0xabc"), json!(7)]).unwrap_err();
    assert!(matches!(err, Error::Payload(_)));
    let err = catalog::entry_payload(
        "0x1::delegation_pool::vote",
        &[],
        vec![json!("0xabc"), json!(-1), json!(1), json!(false)],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Payload(_)));
}

#[test]
fn byte_vectors_accept_hex_and_arrays() {
    let p = catalog::entry_payload(
        "0x1::delegation_pool::create_proposal",
        &[],
        vec![json!("0x1"), json!("0xdeadbeef"), json!("ipfs://meta"), json!([1, 2, 3]), json!(false)],
    )
    .unwrap();
    assert_eq!(p.args[1], MoveValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    assert_eq!(p.args[2], MoveValue::Bytes(b"ipfs://meta".to_vec()));
    assert_eq!(p.args[3], MoveValue::Bytes(vec![1, 2, 3]));
}

#[test]
fn view_payload_json_shape() {
    let v = catalog::view_payload("0x1::coin::balance", &["0x1::aptos_coin::AptosCoin"], vec![json!("0x1")]).unwrap();
    assert_eq!(
        v.to_json(),
        json!({
            "function": "0x1::coin::balance",
            "type_arguments": ["0x1::aptos_coin::AptosCoin"],
            "arguments": [AccountAddress::ONE.to_string()],
        })
    );
    assert_eq!(serde_json::to_value(&v).unwrap(), v.to_json());

    // Entry functions cannot be built as views and vice versa.
    assert!(catalog::view_payload("0x1::aptos_account::transfer", &[], vec![json!("0x1"), json!(1)]).is_err());
    assert!(catalog::entry_payload("0x1::coin::balance", &["0x1::aptos_coin::AptosCoin"], vec![json!("0x1")]).is_err());
}

#[test]
fn application_module_rows() {
    let name = format!("{PLAYER_PROFILE_ADDRESS}::player_profile::set_display_name");
    let schema = catalog::lookup(&name).unwrap();
    let p = PayloadBuilder::new(schema).arg("satoshi").build_entry().unwrap();
    assert_eq!(p.args, vec![MoveValue::String("satoshi".into())]);
    assert!(p.function.to_string().ends_with("::player_profile::set_display_name"));

    let view = catalog::lookup(&format!("{PLAYER_PROFILE_ADDRESS}::player_profile::view_player_profile")).unwrap();
    assert!(view.builder().arg("0x2").build_view().is_ok());
}

#[test]
fn unknown_function_is_reported() {
    let err = catalog::entry_payload("0x1::nope::missing", &[], vec![]).unwrap_err();
    assert!(matches!(err, Error::Payload(_)), "{err:?}");
}
