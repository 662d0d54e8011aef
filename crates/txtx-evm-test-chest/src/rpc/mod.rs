use std::borrow::Cow;

use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use alloy_provider::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
};
use alloy_provider::Identity;
use alloy_rpc_types::{BlockId, BlockNumberOrTag};
use async_trait::async_trait;
use error_stack::{Report, ResultExt};
use serde_json::Value;
use url::Url;

use crate::constants::{
    ETH_ACCOUNTS, ETH_BLOCK_NUMBER, ETH_GET_BALANCE, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_STORAGE_AT,
    ETH_SEND_TRANSACTION,
};
use crate::errors::{ChestError, ChestErrorExt, ChestResult, ConfigError, RpcError};

/// The node a test chest drives: a JSON-RPC transport plus the two state
/// queries the helpers rely on.
#[async_trait]
pub trait TestNodeClient: Send + Sync {
    /// Human readable location of the node, used in error context
    fn endpoint(&self) -> String;

    /// Send a raw JSON-RPC request and return the `result` member of the response
    async fn request(&self, method: &str, params: Value) -> ChestResult<Value>;

    async fn get_storage_at(&self, address: Address, slot: U256) -> ChestResult<B256>;

    /// Timestamp of the block identified by `tag`, `None` when the node knows no such block
    async fn get_block_timestamp(&self, tag: BlockNumberOrTag) -> ChestResult<Option<u64>>;
}

pub type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

#[derive(Clone, Debug)]
pub struct EvmRpc {
    pub url: Url,
    pub provider: HttpProvider,
}

impl EvmRpc {
    pub fn new(url: &str) -> ChestResult<Self> {
        let url = Url::try_from(url).map_err(|e| {
            Report::new(ChestError::Config(ConfigError::InvalidValue {
                field: "rpc_url".to_string(),
                value: format!("{}: {}", url, e),
            }))
        })?;

        let provider = ProviderBuilder::new().on_http(url.clone());
        Ok(Self { url, provider })
    }

    pub async fn get_balance(&self, address: &Address) -> ChestResult<U256> {
        log::debug!("sending {} {:?} to {}", ETH_GET_BALANCE, address, self.url);
        self.provider
            .get_balance(*address)
            .await
            .map_err(node_error)
            .with_rpc_context(
                self.endpoint(),
                ETH_GET_BALANCE,
                Some(format!("[\"{:?}\", \"latest\"]", address)),
            )
            .attach_printable(format!("Getting balance for address {}", address))
    }

    pub async fn get_block_number(&self) -> ChestResult<u64> {
        log::debug!("sending {} to {}", ETH_BLOCK_NUMBER, self.url);
        self.provider
            .get_block_number()
            .await
            .map_err(node_error)
            .with_rpc_context(self.endpoint(), ETH_BLOCK_NUMBER, None)
    }

    /// Accounts the node holds keys for
    pub async fn get_accounts(&self) -> ChestResult<Vec<Address>> {
        log::debug!("sending {} to {}", ETH_ACCOUNTS, self.url);
        self.provider
            .get_accounts()
            .await
            .map_err(node_error)
            .with_rpc_context(self.endpoint(), ETH_ACCOUNTS, None)
    }

    /// Sends a transaction signed by the node itself and waits for its receipt.
    /// Only works with the unlocked accounts of a test node.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> ChestResult<TransactionReceipt> {
        let params = format!("{:?}", tx);
        log::debug!("sending {} {} to {}", ETH_SEND_TRANSACTION, params, self.url);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(node_error)
            .with_rpc_context(self.endpoint(), ETH_SEND_TRANSACTION, Some(params.clone()))?;

        pending
            .get_receipt()
            .await
            .map_err(|e| {
                Report::new(ChestError::Rpc(RpcError::Transport(e.to_string())))
            })
            .with_rpc_context(self.endpoint(), ETH_SEND_TRANSACTION, Some(params))
            .attach_printable("Waiting for transaction receipt")
    }
}

#[async_trait]
impl TestNodeClient for EvmRpc {
    fn endpoint(&self) -> String {
        self.url.to_string()
    }

    async fn request(&self, method: &str, params: Value) -> ChestResult<Value> {
        log::debug!("sending {} {} to {}", method, params, self.url);
        self.provider
            .raw_request::<_, Value>(Cow::Owned(method.to_string()), params.clone())
            .await
            .map_err(node_error)
            .with_rpc_context(self.endpoint(), method, Some(params.to_string()))
    }

    async fn get_storage_at(&self, address: Address, slot: U256) -> ChestResult<B256> {
        log::debug!("sending {} {:?} {} to {}", ETH_GET_STORAGE_AT, address, slot, self.url);
        let value = self
            .provider
            .get_storage_at(address, slot)
            .await
            .map_err(node_error)
            .with_rpc_context(
                self.endpoint(),
                ETH_GET_STORAGE_AT,
                Some(format!("[\"{:?}\", \"{:#x}\", \"latest\"]", address, slot)),
            )?;
        Ok(B256::from(value))
    }

    async fn get_block_timestamp(&self, tag: BlockNumberOrTag) -> ChestResult<Option<u64>> {
        log::debug!("sending {} {} to {}", ETH_GET_BLOCK_BY_NUMBER, tag, self.url);
        let block = self
            .provider
            .get_block(BlockId::from(tag))
            .await
            .map_err(node_error)
            .with_rpc_context(
                self.endpoint(),
                ETH_GET_BLOCK_BY_NUMBER,
                Some(format!("[\"{}\", false]", tag)),
            )?;
        Ok(block.map(|block| block.header.timestamp))
    }
}

/// Keeps the code and message of JSON-RPC error responses, everything else
/// is reported as a transport failure.
pub fn node_error(error: TransportError) -> Report<ChestError> {
    let rpc_error = match &error {
        TransportRpcError::ErrorResp(payload) => {
            RpcError::NodeError { code: payload.code, message: payload.message.to_string() }
        }
        _ => RpcError::Transport(error.to_string()),
    };
    Report::new(ChestError::Rpc(rpc_error))
}
