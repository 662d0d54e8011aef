use alloy::primitives::{B256, U256};
use error_stack::{Report, ResultExt};
use futures::future::try_join_all;

use crate::codec::conversion::string_to_address;
use crate::errors::{ChestError, ChestErrorExt, ChestResult, InputError};
use crate::rpc::TestNodeClient;

/// The raw content of one storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub slot: u64,
    pub value: B256,
}

/// Reads the slots `from..to` of the contract at `address` and logs them.
///
/// All reads are in flight at once, the slots are still logged and returned
/// in ascending order. The first failing read fails the dump.
pub async fn dump_storage<C: TestNodeClient + ?Sized>(
    client: &C,
    address: &str,
    from: u64,
    to: u64,
) -> ChestResult<Vec<StorageSlot>> {
    if address.trim().is_empty() {
        return Err(Report::new(ChestError::InvalidInput(InputError::InvalidAddress(
            address.to_string(),
        ))))
        .attach_printable("A contract address is required to dump storage");
    }
    if from > to {
        return Err(Report::new(ChestError::InvalidInput(InputError::InvalidRange { from, to })));
    }
    let contract = string_to_address(address.to_string())?;

    let reads = (from..to).map(|slot| async move {
        client
            .get_storage_at(contract, U256::from(slot))
            .await
            .with_slot(slot)
            .map(|value| StorageSlot { slot, value })
    });
    let slots = try_join_all(reads)
        .await
        .attach_printable(format!("Dumping storage of {}", contract))?;

    log::info!("storage of {} (slots {}..{})", contract, from, to);
    for StorageSlot { slot, value } in slots.iter() {
        log::info!("storage #{}: {}", slot, value);
    }
    Ok(slots)
}
