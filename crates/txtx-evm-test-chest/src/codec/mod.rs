pub mod conversion;
pub mod logs;

pub use conversion::{
    address_to_evm_word, bytes32_to_evm_word, ether, format_ether, gwei, number_to_evm_word,
    parse_ether, parse_gwei, parse_int, sleep, string_to_address, to_hex, AmountInput,
    ZERO_ADDRESS,
};
pub use logs::{decode_logs, DecodedReceipt, EventLogEntry};
