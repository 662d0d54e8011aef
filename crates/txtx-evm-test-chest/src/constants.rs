use alloy::primitives::U256;

pub const EVM_WORD_HEX_LENGTH: usize = 64;
pub const ETHER_DECIMALS: u32 = 18;

// Control plane methods, only served by test nodes
pub const EVM_MINE: &str = "evm_mine";
pub const EVM_INCREASE_TIME: &str = "evm_increaseTime";

// Standard methods, used for error context
pub const ETH_GET_STORAGE_AT: &str = "eth_getStorageAt";
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
pub const ETH_GET_BALANCE: &str = "eth_getBalance";
pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";

// Substrings identifying the failure of a transaction
pub const REVERT_MARKER: &str = "revert";
pub const INVALID_OPCODE_MARKERS: &[&str] = &["invalid opcode", "InvalidFEOpcode"];

// Defaults
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
/// 0.01 ether
pub const DEFAULT_TOLERANCE: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);
/// 0.01 ether
pub const DEFAULT_TOLERANCE_CEILING: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);
pub const DEFAULT_STORAGE_FROM: u64 = 0;
pub const DEFAULT_STORAGE_TO: u64 = 20;

// Environment
pub const CONFIG_PATH_ENV: &str = "TXTX_TEST_CHEST_CONFIG";
pub const RPC_URL_ENV: &str = "TXTX_TEST_CHEST_RPC_URL";
pub const TOLERANCE_ENV: &str = "TXTX_TEST_CHEST_TOLERANCE";
pub const TOLERANCE_CEILING_ENV: &str = "TXTX_TEST_CHEST_TOLERANCE_CEILING";
