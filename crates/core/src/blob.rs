//! Blob-level types: the committed blob header, the queue-owned metadata
//! record, and the encoded payload handed over for dispersal.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier of a quorum of operators.
pub type QuorumId = u8;

/// Security parameters a blob requests for one quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobQuorumParam {
    /// The quorum this parameter set applies to.
    pub quorum_id: QuorumId,
    /// Max percentage of stake that may be adversarial.
    pub adversary_threshold: u8,
    /// Min percentage of stake that must sign for the blob to pass.
    pub quorum_threshold: u8,
}

/// KZG commitment to the blob polynomial, opaque to the batching core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct G1Commitment {
    pub x: B256,
    pub y: B256,
}

/// The committed description of a blob. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobHeader {
    commitment: G1Commitment,
    data_length: u32,
    quorum_params: Vec<BlobQuorumParam>,
}

impl BlobHeader {
    /// Creates a header; a blob must request at least one quorum.
    pub fn new(
        commitment: G1Commitment,
        data_length: u32,
        quorum_params: Vec<BlobQuorumParam>,
    ) -> Result<Self, &'static str> {
        if quorum_params.is_empty() {
            return Err("blob header must request at least one quorum");
        }
        Ok(Self {
            commitment,
            data_length,
            quorum_params,
        })
    }

    pub fn commitment(&self) -> &G1Commitment {
        &self.commitment
    }

    pub fn data_length(&self) -> u32 {
        self.data_length
    }

    /// Quorums this blob requests, with their thresholds.
    pub fn quorum_params(&self) -> &[BlobQuorumParam] {
        &self.quorum_params
    }

    /// Content hash of the header: keccak256 over its ABI encoding. This is
    /// the leaf committed into the batch merkle tree.
    pub fn header_hash(&self) -> B256 {
        let params: Vec<(u16, u16, u16)> = self
            .quorum_params
            .iter()
            .map(|p| {
                (
                    p.quorum_id as u16,
                    p.adversary_threshold as u16,
                    p.quorum_threshold as u16,
                )
            })
            .collect();
        let encoded = (
            self.commitment.x,
            self.commitment.y,
            self.data_length,
            params,
        )
            .abi_encode();
        keccak256(encoded)
    }
}

/// Lifecycle status of a blob in the durable queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobStatus {
    /// Accepted and waiting to be batched (or re-batched after a failure).
    Processing,
    /// Included in a confirmed batch.
    Confirmed,
    /// Retry budget exhausted; permanently failed.
    Failed,
    /// Confirmed batch finalized on chain.
    Finalized,
    /// Batch confirmed but this blob's quorums fell short of threshold.
    InsufficientSignatures,
}

impl BlobStatus {
    /// Stable label used on metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobStatus::Processing => "processing",
            BlobStatus::Confirmed => "confirmed",
            BlobStatus::Failed => "failed",
            BlobStatus::Finalized => "finalized",
            BlobStatus::InsufficientSignatures => "insufficient_signatures",
        }
    }
}

/// Queue-owned bookkeeping record for one submitted blob.
///
/// The batching core only ever borrows these for the duration of one attempt;
/// status and retry transitions belong to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Content-derived key of the blob in the store.
    pub blob_key: B256,
    /// Unencoded blob size in bytes.
    pub blob_size: u64,
    /// Unix timestamp (seconds) of the original request.
    pub requested_at: u64,
    /// Current lifecycle status.
    pub status: BlobStatus,
    /// Failed batch attempts so far.
    pub num_retries: u32,
}

/// Encoded payload for one blob, ready for dispersal. Opaque to the core;
/// produced by the external encoding collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedBlob {
    pub data: Bytes,
}
