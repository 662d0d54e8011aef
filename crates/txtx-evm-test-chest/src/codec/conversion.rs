// Unit and word conversion utilities for EVM test values

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use alloy::hex::{self, FromHex};
use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, U256};
use error_stack::{Report, ResultExt};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};

use crate::constants::{ETHER_DECIMALS, EVM_WORD_HEX_LENGTH};
use crate::chest_error;
use crate::errors::{ChestError, ChestResult, InputError};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// An amount accepted by the balance helpers, either as a decimal string or
/// as an already parsed integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountInput {
    Decimal(String),
    Word(U256),
    Integer(BigInt),
}

impl AmountInput {
    /// Normalizes a balance, which can never be negative.
    pub fn to_balance(&self, argument: &str) -> ChestResult<BigInt> {
        let value = self.to_delta(argument)?;
        if value.is_negative() {
            return Err(Report::new(ChestError::InvalidInput(InputError::NegativeAmount {
                argument: argument.to_string(),
                value: value.to_string(),
            })));
        }
        Ok(value)
    }

    /// Normalizes a signed amount, such as the expected change of a balance.
    pub fn to_delta(&self, argument: &str) -> ChestResult<BigInt> {
        match self {
            AmountInput::Decimal(value) => BigInt::from_str(value.trim()).map_err(|_| {
                Report::new(ChestError::InvalidInput(InputError::MalformedAmount {
                    argument: argument.to_string(),
                    value: value.clone(),
                }))
            }),
            AmountInput::Word(value) => Ok(u256_to_bigint(value)),
            AmountInput::Integer(value) => Ok(value.clone()),
        }
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Decimal(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        AmountInput::Decimal(value)
    }
}

impl From<U256> for AmountInput {
    fn from(value: U256) -> Self {
        AmountInput::Word(value)
    }
}

impl From<BigInt> for AmountInput {
    fn from(value: BigInt) -> Self {
        AmountInput::Integer(value)
    }
}

impl From<u64> for AmountInput {
    fn from(value: u64) -> Self {
        AmountInput::Integer(BigInt::from(value))
    }
}

impl From<u128> for AmountInput {
    fn from(value: u128) -> Self {
        AmountInput::Integer(BigInt::from(value))
    }
}

impl From<i64> for AmountInput {
    fn from(value: i64) -> Self {
        AmountInput::Integer(BigInt::from(value))
    }
}

pub fn u256_to_bigint(value: &U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

/// Convert a decimal quantity expressed in `unit` into base units
pub fn to_base_units(amount: impl Display, unit: &str) -> ChestResult<U256> {
    let amount = amount.to_string();
    let parsed = parse_units(amount.trim(), unit)
        .map_err(|e| {
            Report::new(ChestError::InvalidInput(InputError::MalformedAmount {
                argument: unit.to_string(),
                value: format!("{}: {}", amount, e),
            }))
        })
        .attach_printable(format!("Converting {} {} to wei", amount, unit))?;
    if parsed.is_negative() {
        return Err(Report::new(ChestError::InvalidInput(InputError::NegativeAmount {
            argument: unit.to_string(),
            value: amount,
        })));
    }
    Ok(parsed.get_absolute())
}

pub fn parse_gwei(amount: impl Display) -> ChestResult<U256> {
    to_base_units(amount, "gwei")
}

pub fn parse_ether(amount: impl Display) -> ChestResult<U256> {
    to_base_units(amount, "ether")
}

/// Wei amount, as a decimal string, for a quantity of gwei
pub fn gwei(amount: impl Display) -> ChestResult<String> {
    parse_gwei(amount).map(|wei| wei.to_string())
}

/// Wei amount, as a decimal string, for a quantity of ether
pub fn ether(amount: impl Display) -> ChestResult<String> {
    parse_ether(amount).map(|wei| wei.to_string())
}

/// Minimal `0x` prefixed hex representation of a number
pub fn to_hex(value: impl Into<U256>) -> String {
    let value: U256 = value.into();
    let encoded = hex::encode(value.to_be_bytes::<32>());
    let digits = encoded.trim_start_matches('0');
    if digits.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", digits)
    }
}

pub fn parse_int(input: &str) -> ChestResult<i64> {
    input.trim().parse::<i64>().map_err(|_| {
        Report::new(ChestError::InvalidInput(InputError::MalformedAmount {
            argument: "input".to_string(),
            value: input.to_string(),
        }))
    })
}

pub fn number_to_evm_word(value: impl Into<U256>) -> String {
    let value: U256 = value.into();
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}

pub fn address_to_evm_word(address: &str) -> ChestResult<String> {
    let address = string_to_address(address.to_string())
        .attach_printable("Encoding address as an EVM word")?;
    Ok(format!("0x{:0>width$}", hex::encode(address), width = EVM_WORD_HEX_LENGTH))
}

pub fn bytes32_to_evm_word(bytes32: &str) -> ChestResult<String> {
    let digits = bytes32.strip_prefix("0x").unwrap_or(bytes32);
    if digits.len() > EVM_WORD_HEX_LENGTH || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(chest_error!(
            InputError::InvalidHex(bytes32.to_string()),
            "Encoding bytes32 as an EVM word"
        ));
    }
    Ok(format!("0x{:0<width$}", digits, width = EVM_WORD_HEX_LENGTH))
}

/// Convert a string to an Ethereum address
/// Handles both with and without 0x prefix
/// Also handles 32-byte padded addresses
pub fn string_to_address(address_str: String) -> ChestResult<Address> {
    let mut address_str = address_str.trim().replace("0x", "");
    if address_str.is_empty() {
        return Err(chest_error!(
            InputError::InvalidAddress(address_str),
            "Address must not be empty"
        ));
    }
    if !address_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(chest_error!(
            InputError::InvalidAddress(address_str.clone()),
            "Address must only contain hex digits: {}",
            address_str
        ));
    }

    // A 32-byte value is assumed to be an address left-padded with zeros
    if address_str.len() == EVM_WORD_HEX_LENGTH {
        address_str = address_str[EVM_WORD_HEX_LENGTH - 40..].to_owned();
    }

    let address = Address::from_hex(&address_str).map_err(|e| {
        chest_error!(
            InputError::InvalidAddress(format!("{}: {}", address_str, e)),
            "Parsing address: {}",
            address_str
        )
    })?;
    Ok(address)
}

/// Render a wei amount in ether, dropping trailing zeros of the fraction
pub fn format_ether(value: &BigInt) -> String {
    let unit = BigUint::from(10u64).pow(ETHER_DECIMALS);
    let magnitude = value.magnitude();
    let whole = magnitude / &unit;
    let fraction = magnitude % &unit;
    let sign = if value.sign() == Sign::Minus { "-" } else { "" };
    if fraction.is_zero() {
        return format!("{}{}", sign, whole);
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = ETHER_DECIMALS as usize);
    format!("{}{}.{}", sign, whole, fraction.trim_end_matches('0'))
}

pub async fn sleep(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await
}
