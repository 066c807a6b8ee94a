//! Batch types: the on-chain batch header and one assembled batch attempt.

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Bytes, B256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    assignment::QuorumInfo,
    blob::{BlobHeader, BlobMetadata, EncodedBlob, QuorumId},
    merkle::MerkleTree,
};

/// Errors from batch header hashing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchHeaderError {
    /// Quorum numbers and signed percentages are parallel arrays.
    #[error("quorum numbers ({numbers}) and signed percentages ({percentages}) must be aligned")]
    QuorumArityMismatch { numbers: usize, percentages: usize },
}

/// The committed description of a batch, mirroring the on-chain shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchHeader {
    /// Merkle root over the blob header hashes.
    pub batch_root: B256,
    /// Quorums represented in this batch, in ascending order.
    pub quorum_numbers: Vec<QuorumId>,
    /// Target signed-stake percentage per quorum, aligned with
    /// `quorum_numbers`.
    pub quorum_signed_percentages: Vec<u8>,
    /// Operator-state block the assignment snapshot was taken at.
    pub reference_block_number: u32,
}

impl BatchHeader {
    /// Content-addressed identifier of the batch: keccak256 over the ABI
    /// encoding of the header fields. Computed once per attempt and used both
    /// for dispatch and for correlating confirmation.
    pub fn header_hash(&self) -> Result<B256, BatchHeaderError> {
        if self.quorum_numbers.len() != self.quorum_signed_percentages.len() {
            return Err(BatchHeaderError::QuorumArityMismatch {
                numbers: self.quorum_numbers.len(),
                percentages: self.quorum_signed_percentages.len(),
            });
        }
        let encoded = (
            self.batch_root,
            Bytes::from(self.quorum_numbers.clone()),
            Bytes::from(self.quorum_signed_percentages.clone()),
            self.reference_block_number,
        )
            .abi_encode();
        Ok(keccak256(encoded))
    }
}

/// One assembly attempt: header, parallel per-blob sequences, and the merkle
/// commitment over the blob header hashes.
///
/// Index *i* in every sequence refers to the same blob; the constructor
/// enforces this and that the header root actually commits to the headers.
/// A batch is consumed entirely within one attempt and never reused.
#[derive(Debug, Clone)]
pub struct Batch {
    header: BatchHeader,
    blob_metadata: Vec<BlobMetadata>,
    blob_headers: Vec<BlobHeader>,
    encoded_payloads: Vec<EncodedBlob>,
    merkle_tree: MerkleTree,
    quorums: BTreeMap<QuorumId, QuorumInfo>,
    /// Logical creation timestamp, used as the reservation key in the queue.
    ts: u64,
    /// Network identifier assigned by the dispersal gateway on submission.
    submission_id: Option<B256>,
}

impl Batch {
    /// Assembles a batch, validating the index-alignment invariant.
    pub fn new(
        header: BatchHeader,
        blob_metadata: Vec<BlobMetadata>,
        blob_headers: Vec<BlobHeader>,
        encoded_payloads: Vec<EncodedBlob>,
        quorums: BTreeMap<QuorumId, QuorumInfo>,
        ts: u64,
    ) -> Result<Self, &'static str> {
        if blob_metadata.is_empty() {
            return Err("batch cannot be empty");
        }
        if blob_headers.len() != blob_metadata.len() {
            return Err("blob headers must be aligned with blob metadata");
        }
        if encoded_payloads.len() != blob_metadata.len() {
            return Err("encoded payloads must be aligned with blob metadata");
        }

        let leaves = blob_headers.iter().map(BlobHeader::header_hash).collect();
        let merkle_tree =
            MerkleTree::from_leaves(leaves).map_err(|_| "batch cannot be empty")?;
        if header.batch_root != merkle_tree.root() {
            return Err("batch header root must commit to the blob headers");
        }

        Ok(Self {
            header,
            blob_metadata,
            blob_headers,
            encoded_payloads,
            merkle_tree,
            quorums,
            ts,
            submission_id: None,
        })
    }

    pub fn header(&self) -> &BatchHeader {
        &self.header
    }

    pub fn blob_metadata(&self) -> &[BlobMetadata] {
        &self.blob_metadata
    }

    pub fn blob_headers(&self) -> &[BlobHeader] {
        &self.blob_headers
    }

    pub fn encoded_payloads(&self) -> &[EncodedBlob] {
        &self.encoded_payloads
    }

    pub fn merkle_tree(&self) -> &MerkleTree {
        &self.merkle_tree
    }

    /// Per-quorum operator assignment snapshot captured at assembly.
    pub fn quorums(&self) -> &BTreeMap<QuorumId, QuorumInfo> {
        &self.quorums
    }

    /// Number of blobs in the batch.
    pub fn len(&self) -> usize {
        self.blob_metadata.len()
    }

    /// Always false; empty batches are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.blob_metadata.is_empty()
    }

    /// Logical creation timestamp of the attempt.
    pub fn ts(&self) -> u64 {
        self.ts
    }

    pub fn submission_id(&self) -> Option<B256> {
        self.submission_id
    }

    /// Records the gateway's submission identifier after dispatch.
    pub fn set_submission_id(&mut self, id: B256) {
        self.submission_id = Some(id);
    }
}
