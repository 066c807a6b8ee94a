//! Operator assignment snapshot types.
//!
//! Captured from a point-in-time view of network operator state when a batch
//! is planned; never mutated after capture. The indexer that produces the
//! snapshot is an external collaborator.

use std::collections::BTreeMap;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::blob::QuorumId;

/// Identifier of a network operator.
pub type OperatorId = B256;

/// Scaling unit applied to byte-size thresholds governing encoding
/// granularity and early batch triggering.
pub const QUANTIZATION_FACTOR: u32 = 1;

/// Chunk range of a blob assigned to one operator within a quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub start_index: u32,
    pub num_chunks: u32,
}

/// Aggregate information about a quorum's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentInfo {
    pub total_chunks: u32,
}

/// Per-quorum assignment snapshot attached to a batch plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumInfo {
    pub assignments: BTreeMap<OperatorId, Assignment>,
    pub info: AssignmentInfo,
    pub quantization_factor: u32,
}

impl QuorumInfo {
    /// Snapshot with the default quantization factor.
    pub fn new(assignments: BTreeMap<OperatorId, Assignment>, info: AssignmentInfo) -> Self {
        Self {
            assignments,
            info,
            quantization_factor: QUANTIZATION_FACTOR,
        }
    }
}

/// Reported signing outcome for one quorum after batch confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumResult {
    pub quorum_id: QuorumId,
    /// Percentage of the quorum's stake that signed the batch.
    pub percent_signed: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_uses_default_quantization() {
        let assignments = BTreeMap::from([(
            OperatorId::repeat_byte(0x01),
            Assignment {
                start_index: 0,
                num_chunks: 4,
            },
        )]);
        let info = QuorumInfo::new(assignments, AssignmentInfo { total_chunks: 4 });
        assert_eq!(info.quantization_factor, QUANTIZATION_FACTOR);
        assert_eq!(info.assignments.len(), 1);
    }
}
