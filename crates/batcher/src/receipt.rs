//! Decoding of the on-chain batch confirmation receipt.

use alloy_primitives::{Log, U256};
use alloy_sol_types::{sol, SolEvent, SolValue};
use thiserror::Error;
use tracing::debug;

sol! {
    /// Emitted by the service manager when a batch is confirmed on chain.
    /// Exactly two data fields: the assigned batch identifier and the fee.
    event BatchConfirmed(uint32 batchId, uint256 fee);
}

/// Number of ABI words in the `BatchConfirmed` data section.
const BATCH_CONFIRMED_FIELDS: usize = 2;

/// Errors from receipt decoding. None of these mutate blob state; the
/// caller decides whether to re-read the receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("transaction receipt contains no logs")]
    NoLogs,

    #[error("no batch confirmation log found in the transaction receipt")]
    LogNotFound,

    /// The matching log's data section has the wrong number of fields.
    #[error("batch confirmation log should contain exactly 2 fields, found {0}")]
    FieldCount(usize),

    #[error("failed to decode batch confirmation log: {0}")]
    Decode(#[from] alloy_sol_types::Error),
}

/// Extracts the assigned batch identifier from the logs of a confirmation
/// transaction receipt.
///
/// Scans the logs in order for the first whose leading topic is the
/// [`BatchConfirmed`] signature; logs without topics are skipped with a
/// diagnostic. The matching log must decode to exactly two fields, and the
/// first is returned as the batch identifier.
pub fn batch_id_from_receipt(logs: &[Log]) -> Result<u32, ReceiptError> {
    if logs.is_empty() {
        return Err(ReceiptError::NoLogs);
    }

    for log in logs {
        let Some(first_topic) = log.data.topics().first() else {
            debug!("transaction log has no topics, skipping");
            continue;
        };
        if *first_topic != BatchConfirmed::SIGNATURE_HASH {
            continue;
        }

        let data = log.data.data.as_ref();
        if data.len() != BATCH_CONFIRMED_FIELDS * 32 {
            return Err(ReceiptError::FieldCount(data.len() / 32));
        }
        let (batch_id, _fee) = <(u32, U256)>::abi_decode(data)?;
        return Ok(batch_id);
    }

    Err(ReceiptError::LogNotFound)
}
