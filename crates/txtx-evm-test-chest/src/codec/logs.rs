use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::hex;
use alloy::json_abi::{Event, JsonAbi};
use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Log, TransactionReceipt};
use error_stack::{Report, ResultExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{ChestError, ChestResult, InputError};

/// A log entry of a receipt, decoded against a known event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub event: String,
    pub address: Option<Address>,
    pub args: IndexMap<String, Value>,
}

impl EventLogEntry {
    pub fn new(event: impl Into<String>, args: IndexMap<String, Value>) -> Self {
        Self { event: event.into(), address: None, args }
    }
}

/// The decoded logs of a mined transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedReceipt {
    pub transaction_hash: Option<B256>,
    pub logs: Vec<EventLogEntry>,
}

impl DecodedReceipt {
    pub fn new(logs: Vec<EventLogEntry>) -> Self {
        Self { transaction_hash: None, logs }
    }

    pub fn from_receipt(receipt: &TransactionReceipt, abis: &[JsonAbi]) -> ChestResult<Self> {
        let logs = decode_logs(receipt.inner.logs(), abis)
            .attach_printable(format!("Decoding logs of transaction {}", receipt.transaction_hash))?;
        Ok(Self { transaction_hash: Some(receipt.transaction_hash), logs })
    }
}

/// Decodes the logs whose first topic matches an event of one of the `abis`.
/// Logs emitted by unknown events are skipped.
pub fn decode_logs(logs: &[Log], abis: &[JsonAbi]) -> ChestResult<Vec<EventLogEntry>> {
    logs.iter()
        .filter_map(|log| {
            let first_topic = log.topics().first()?;
            let matching_event = abis.iter().find_map(|abi| {
                abi.events().find(|e| !e.anonymous && e.selector().eq(first_topic))
            })?;
            Some(decode_log(matching_event, log))
        })
        .collect()
}

fn decode_log(event: &Event, log: &Log) -> ChestResult<EventLogEntry> {
    let log_address = log.address();
    let decoded = event
        .decode_log(log.data())
        .map_err(|e| {
            Report::new(ChestError::InvalidInput(InputError::UndecodableLog(e.to_string())))
        })
        .attach_printable(format!("Decoding event '{}' at address {}", event.name, log_address))?;

    let mut indexed = decoded.indexed.iter();
    let mut body = decoded.body.iter();
    let mut args = IndexMap::new();
    for input in event.inputs.iter() {
        let value = if input.indexed { indexed.next() } else { body.next() };
        let Some(value) = value else {
            return Err(Report::new(ChestError::InvalidInput(InputError::UndecodableLog(
                format!("missing value for parameter '{}'", input.name),
            ))));
        };
        args.insert(input.name.clone(), sol_value_to_json(value));
    }

    Ok(EventLogEntry { event: event.name.clone(), address: Some(log_address), args })
}

pub fn sol_value_to_json(sol_value: &DynSolValue) -> Value {
    match sol_value {
        DynSolValue::Bool(value) => Value::Bool(*value),
        DynSolValue::Int(value, _) => Value::String(value.to_string()),
        DynSolValue::Uint(value, _) => Value::String(value.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(value) => Value::String(value.to_checksum(None)),
        DynSolValue::Function(value) => Value::String(hex::encode_prefixed(value)),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(value) => Value::String(value.clone()),
        DynSolValue::Array(values)
        | DynSolValue::FixedArray(values)
        | DynSolValue::Tuple(values) => Value::Array(values.iter().map(sol_value_to_json).collect()),
        DynSolValue::CustomStruct { prop_names, tuple, .. } => Value::Object(
            prop_names
                .iter()
                .zip(tuple.iter())
                .map(|(name, value)| (name.clone(), sol_value_to_json(value)))
                .collect(),
        ),
    }
}
