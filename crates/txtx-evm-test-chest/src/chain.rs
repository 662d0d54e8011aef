//! Control plane helpers for test nodes: mining blocks and moving the chain clock.

use alloy_rpc_types::BlockNumberOrTag;
use error_stack::{Report, ResultExt};
use serde_json::{json, Value};

use crate::constants::{ETH_GET_BLOCK_BY_NUMBER, EVM_INCREASE_TIME, EVM_MINE};
use crate::errors::{ChestError, ChestResult, RpcError};
use crate::rpc::TestNodeClient;

/// Forces the node to produce one block, returning its raw answer
pub async fn mine_block<C: TestNodeClient + ?Sized>(client: &C) -> ChestResult<Value> {
    client.request(EVM_MINE, json!([])).await.map_err(|e| {
        log::warn!("{} failed on {}", EVM_MINE, client.endpoint());
        e.attach_printable("Mining a block")
    })
}

/// Shifts the simulated clock of the node forward by `seconds`
pub async fn increase_time<C: TestNodeClient + ?Sized>(
    client: &C,
    seconds: u64,
) -> ChestResult<Value> {
    client.request(EVM_INCREASE_TIME, json!([seconds])).await.map_err(|e| {
        log::warn!("{} failed on {}", EVM_INCREASE_TIME, client.endpoint());
        e.attach_printable(format!("Increasing time by {} seconds", seconds))
    })
}

/// Shifts the clock then mines a block so that the shift is visible on chain.
/// A failure to mine does not undo the clock shift.
pub async fn advance_time_and_mine<C: TestNodeClient + ?Sized>(
    client: &C,
    seconds: u64,
) -> ChestResult<()> {
    increase_time(client, seconds).await?;
    mine_block(client)
        .await
        .attach_printable(format!("Mining after a {} seconds time shift", seconds))?;
    Ok(())
}

pub async fn current_block_timestamp<C: TestNodeClient + ?Sized>(client: &C) -> ChestResult<u64> {
    client
        .get_block_timestamp(BlockNumberOrTag::Latest)
        .await
        .attach_printable("Fetching the latest block")?
        .ok_or_else(|| {
            Report::new(ChestError::Rpc(RpcError::InvalidResponse(
                "no latest block".to_string(),
            )))
            .attach_printable(format!(
                "{} on {} returned no block",
                ETH_GET_BLOCK_BY_NUMBER,
                client.endpoint()
            ))
        })
}
