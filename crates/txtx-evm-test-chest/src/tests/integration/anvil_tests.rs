use alloy::hex;
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use num_bigint::BigInt;
use serde_json::{json, Value};

use super::anvil_harness::AnvilInstance;
use crate::anvil_test;
use crate::assertions::{assert_invalid_opcode, assert_reverts};
use crate::codec::conversion::{address_to_evm_word, parse_ether, u256_to_bigint};
use crate::codec::logs::DecodedReceipt;
use crate::rpc::{EvmRpc, TestNodeClient};
use crate::TestChest;

const TRANSFER_TOPIC: &str = "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

async fn accounts(chest: &TestChest<EvmRpc>) -> Vec<Address> {
    chest.client().get_accounts().await.unwrap()
}

async fn deploy(chest: &TestChest<EvmRpc>, from: Address, code: &str) -> Address {
    let code = Bytes::from(hex::decode(code).unwrap());
    let tx = TransactionRequest::default().with_from(from).with_deploy_code(code);
    let receipt = chest.client().send_transaction(tx).await.unwrap();
    assert!(receipt.status());
    receipt.contract_address.unwrap()
}

fn eth_call(from: Address, data: &str) -> Value {
    json!([{ "from": from, "data": data }, "latest"])
}

anvil_test!(test_mine_block_advances_height, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();

    let before = chest.client().get_block_number().await.unwrap();
    chest.mine_block().await.unwrap();
    chest.mine_block().await.unwrap();
    let after = chest.client().get_block_number().await.unwrap();
    assert_eq!(after, before + 2);
});

anvil_test!(test_advance_time_moves_timestamp, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();

    let before = chest.current_block_timestamp().await.unwrap();
    chest.advance_time_and_mine(3600).await.unwrap();
    let after = chest.current_block_timestamp().await.unwrap();
    assert!(after >= before + 3600, "{} should be at least {} + 3600", after, before);
});

anvil_test!(test_native_transfer_balances, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();
    let accounts = accounts(&chest).await;
    let (sender, recipient) = (accounts[0], accounts[1]);
    let amount = parse_ether("1").unwrap();

    let sender_before = chest.client().get_balance(&sender).await.unwrap();
    let recipient_before = chest.client().get_balance(&recipient).await.unwrap();

    let tx = TransactionRequest::default()
        .with_from(sender)
        .with_to(recipient)
        .with_value(amount);
    chest.client().send_transaction(tx).await.unwrap();

    let sender_after = chest.client().get_balance(&sender).await.unwrap();
    let recipient_after = chest.client().get_balance(&recipient).await.unwrap();

    let paid = -u256_to_bigint(&amount);
    chest.assert_native_balance_changed(sender_before, sender_after, paid).unwrap();
    chest.assert_native_balance_changed(recipient_before, recipient_after, amount).unwrap();
    // the recipient gets the exact amount
    chest
        .assert_token_balance_changed(recipient_before, recipient_after, amount)
        .unwrap();
    assert!(chest
        .assert_native_balance_changed(recipient_before, recipient_after, BigInt::from(0))
        .is_err());
});

anvil_test!(test_dump_storage_of_deployed_contract, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();
    let deployer = accounts(&chest).await[0];

    // SSTORE(0, 0x2a) SSTORE(1, 0x07) STOP
    let contract = deploy(&chest, deployer, "602a600055600760015500").await;
    let slots = chest.dump_storage(&contract.to_string()).await.unwrap();

    assert_eq!(slots.len(), 20);
    assert_eq!(U256::from_be_bytes(slots[0].value.0), U256::from(0x2au64));
    assert_eq!(U256::from_be_bytes(slots[1].value.0), U256::from(0x07u64));
    assert!(slots[2..].iter().all(|slot| slot.value.is_zero()));
});

anvil_test!(test_reverting_calls, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();
    let caller = accounts(&chest).await[0];

    // PUSH1 0 PUSH1 0 REVERT
    let call = chest.client().request("eth_call", eth_call(caller, "0x60006000fd"));
    assert_reverts(call).await.unwrap();

    let call = chest.client().request("eth_call", eth_call(caller, "0xfe"));
    assert_invalid_opcode(call).await.unwrap();

    // STOP
    let call = chest.client().request("eth_call", eth_call(caller, "0x00"));
    assert!(assert_reverts(call).await.is_err());
});

anvil_test!(test_extract_event_arg_from_receipt, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();
    let accounts = accounts(&chest).await;
    let (from, to) = (accounts[0], accounts[1]);

    // MSTORE(0, 10) LOG3(0, 32, Transfer, from, to) STOP
    let code = format!(
        "600a6000527f{}7f{}7f{}60206000a300",
        &address_to_evm_word(&to.to_string()).unwrap()[2..],
        &address_to_evm_word(&from.to_string()).unwrap()[2..],
        TRANSFER_TOPIC,
    );
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(Bytes::from(hex::decode(code).unwrap()));
    let receipt = chest.client().send_transaction(tx).await.unwrap();

    let abi = JsonAbi::parse([
        "event Transfer(address indexed from, address indexed to, uint256 value)",
    ])
    .unwrap();
    let outcome = DecodedReceipt::from_receipt(&receipt, &[abi]).unwrap();

    assert_eq!(
        chest.extract_event_arg(&outcome, "Transfer", "to").unwrap(),
        &json!(to.to_checksum(None))
    );
    assert_eq!(chest.extract_event_arg(&outcome, "Transfer", "value").unwrap(), &json!("10"));
    assert!(chest.extract_event_arg(&outcome, "Approval", "value").is_err());
});

anvil_test!(test_node_errors_carry_code, async {
    let anvil = AnvilInstance::spawn();
    let chest = anvil.chest();

    let error = chest.client().request("evm_doesNotExist", json!([])).await.unwrap_err();
    assert!(matches!(
        error.current_context(),
        crate::errors::ChestError::Rpc(crate::errors::RpcError::NodeError { .. })
    ));
});
