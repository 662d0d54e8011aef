#[macro_use]
extern crate serde_derive;

pub mod assertions;
pub mod chain;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod parsers;
pub mod printers;
pub mod rpc;

#[cfg(test)]
mod tests;

use std::fmt::Display;
use std::future::Future;

use alloy::primitives::U256;
use serde_json::Value;

pub use codec::conversion::{
    address_to_evm_word, bytes32_to_evm_word, ether, format_ether, gwei, number_to_evm_word,
    parse_ether, parse_gwei, parse_int, sleep, to_hex, AmountInput, ZERO_ADDRESS,
};
pub use codec::logs::{DecodedReceipt, EventLogEntry};
pub use config::ChestConfig;
pub use errors::{ChestError, ChestResult};
pub use printers::StorageSlot;
pub use rpc::{EvmRpc, TestNodeClient};

/// Test helpers bound to one node client and one set of defaults.
///
/// Every method delegates to the free function of the same name, filling in
/// the configured tolerance and storage range where the function takes them.
#[derive(Debug, Clone)]
pub struct TestChest<C: TestNodeClient> {
    client: C,
    config: ChestConfig,
}

impl TestChest<EvmRpc> {
    /// Builds an HTTP client for `config.rpc_url`
    pub fn connect(config: ChestConfig) -> ChestResult<Self> {
        config.validate()?;
        let client = EvmRpc::new(&config.rpc_url)?;
        Ok(Self { client, config })
    }
}

impl<C: TestNodeClient> TestChest<C> {
    pub fn new(client: C, config: ChestConfig) -> Self {
        Self { client, config }
    }

    pub fn with_client(client: C) -> Self {
        Self::new(client, ChestConfig::default())
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ChestConfig {
        &self.config
    }

    pub async fn mine_block(&self) -> ChestResult<Value> {
        chain::mine_block(&self.client).await
    }

    pub async fn increase_time(&self, seconds: u64) -> ChestResult<Value> {
        chain::increase_time(&self.client, seconds).await
    }

    pub async fn advance_time_and_mine(&self, seconds: u64) -> ChestResult<()> {
        chain::advance_time_and_mine(&self.client, seconds).await
    }

    pub async fn current_block_timestamp(&self) -> ChestResult<u64> {
        chain::current_block_timestamp(&self.client).await
    }

    pub fn assert_equal(
        &self,
        actual: impl Into<AmountInput>,
        expected: impl Into<AmountInput>,
    ) -> ChestResult<()> {
        assertions::assert_equal(actual, expected)
    }

    pub fn assert_native_balance_changed(
        &self,
        balance_before: impl Into<AmountInput>,
        balance_after: impl Into<AmountInput>,
        expected_delta: impl Into<AmountInput>,
    ) -> ChestResult<()> {
        self.assert_native_balance_changed_within(
            balance_before,
            balance_after,
            expected_delta,
            self.config.tolerance,
        )
    }

    /// Same check with a different tolerance, the ceiling stays the configured one
    pub fn assert_native_balance_changed_within(
        &self,
        balance_before: impl Into<AmountInput>,
        balance_after: impl Into<AmountInput>,
        expected_delta: impl Into<AmountInput>,
        tolerance: U256,
    ) -> ChestResult<()> {
        assertions::assert_native_balance_changed_within(
            balance_before,
            balance_after,
            expected_delta,
            tolerance,
            self.config.tolerance_ceiling,
        )
    }

    pub fn assert_token_balance_changed(
        &self,
        balance_before: impl Into<AmountInput>,
        balance_after: impl Into<AmountInput>,
        expected_delta: impl Into<AmountInput>,
    ) -> ChestResult<()> {
        assertions::assert_token_balance_changed(balance_before, balance_after, expected_delta)
    }

    pub async fn assert_invalid_opcode<F, T, E>(&self, future: F) -> ChestResult<()>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        assertions::assert_invalid_opcode(future).await
    }

    pub async fn assert_revert<F, T, E>(
        &self,
        future: F,
        expected: &str,
        match_as_regex: bool,
    ) -> ChestResult<()>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        assertions::assert_revert(future, expected, match_as_regex).await
    }

    pub async fn assert_revert_with<F, T, E>(&self, future: F, expected: &str) -> ChestResult<()>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        assertions::assert_revert_with(future, expected).await
    }

    pub async fn assert_reverts<F, T, E>(&self, future: F) -> ChestResult<()>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        assertions::assert_reverts(future).await
    }

    /// Dumps the configured slot range of `address`
    pub async fn dump_storage(&self, address: &str) -> ChestResult<Vec<StorageSlot>> {
        self.dump_storage_range(address, self.config.storage_from, self.config.storage_to).await
    }

    pub async fn dump_storage_range(
        &self,
        address: &str,
        from: u64,
        to: u64,
    ) -> ChestResult<Vec<StorageSlot>> {
        printers::dump_storage(&self.client, address, from, to).await
    }

    pub fn extract_event_arg<'a>(
        &self,
        outcome: &'a DecodedReceipt,
        event_name: &str,
        arg_name: &str,
    ) -> ChestResult<&'a Value> {
        parsers::extract_event_arg(outcome, event_name, arg_name)
    }
}
