use std::fmt;

use error_stack::Report;
use num_bigint::BigInt;

use crate::codec::conversion::format_ether;

pub type ChestResult<T> = Result<T, Report<ChestError>>;

/// Top level error for every helper exposed by the test chest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionError),
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {value}")]
    InvalidValue { field: String, value: String },
    #[error("unable to read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("malformed config file: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// The node answered with a JSON-RPC error object
    #[error("node returned error {code}: {message}")]
    NodeError { code: i64, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("{argument} is not a decimal amount: '{value}'")]
    MalformedAmount { argument: String, value: String },
    #[error("{argument} must not be negative, got {value}")]
    NegativeAmount { argument: String, value: String },
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid hex value '{0}'")]
    InvalidHex(String),
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid storage range {from}..{to}")]
    InvalidRange { from: u64, to: u64 },
    #[error("unable to decode log: {0}")]
    UndecodableLog(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssertionError {
    #[error(
        "expected {} (actual) ether to be equal {} ether (expected)",
        format_ether(.actual),
        format_ether(.expected)
    )]
    NotEqual { actual: BigInt, expected: BigInt },
    #[error(
        "expected balance drift {} ({drift} wei) to be at most {} ether",
        format_ether(.drift),
        format_ether(.ceiling)
    )]
    DriftAboveCeiling { drift: BigInt, ceiling: BigInt },
    #[error(
        "expected balance drift {} ({drift} wei) to be greater than 0",
        format_ether(.drift)
    )]
    DriftNotPositive { drift: BigInt },
    #[error("expected token balance {after} to equal {before} + {delta} = {expected}")]
    TokenBalanceMismatch { before: BigInt, after: BigInt, delta: BigInt, expected: BigInt },
    #[error("{0}")]
    MissingFailure(String),
    #[error("expected {expected}, got '{actual}' instead")]
    UnexpectedFailure { expected: String, actual: String },
}

/// Details of the RPC call that produced an error
#[derive(Debug, Clone)]
pub struct RpcContext {
    pub endpoint: String,
    pub method: String,
    pub params: Option<String>,
}

impl fmt::Display for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.method, self.endpoint)?;
        if let Some(params) = &self.params {
            write!(f, " with params {}", params)?;
        }
        Ok(())
    }
}

/// The storage slot a failing read was targeting
#[derive(Debug, Clone, Copy)]
pub struct SlotContext {
    pub slot: u64,
}

impl fmt::Display for SlotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage slot #{}", self.slot)
    }
}

pub trait ChestErrorExt {
    /// Attach the RPC call details
    fn with_rpc_context(
        self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        params: Option<String>,
    ) -> Self;

    fn with_slot(self, slot: u64) -> Self;
}

impl<T> ChestErrorExt for ChestResult<T> {
    fn with_rpc_context(
        self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        params: Option<String>,
    ) -> Self {
        self.map_err(|e| {
            e.attach(RpcContext { endpoint: endpoint.into(), method: method.into(), params })
        })
    }

    fn with_slot(self, slot: u64) -> Self {
        self.map_err(|e| e.attach(SlotContext { slot }))
    }
}

/// Helper macro for creating chest errors with a printable message
#[macro_export]
macro_rules! chest_error {
    ($error:expr, $($arg:tt)*) => {{
        error_stack::Report::new($crate::errors::ChestError::from($error))
            .attach_printable(format!($($arg)*))
    }};
}
