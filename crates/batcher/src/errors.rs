//! Error types for the batching core.

use strew_core::{BatchHeaderError, MerkleError};
use thiserror::Error;

/// Category attached to a failed batch attempt, for failure accounting and
/// metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Computing the batch header hash failed.
    BatchHeaderHash,
    /// Building the per-blob inclusion proofs failed.
    InclusionProof,
    /// The dispersal gateway rejected the batch.
    Dispatch,
}

impl FailReason {
    /// Stable label used on metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::BatchHeaderHash => "batch_header_hash",
            FailReason::InclusionProof => "inclusion_proof",
            FailReason::Dispatch => "dispatch",
        }
    }
}

/// Batch assembly outcome, with the no-work case distinguished from real
/// failures so the scheduling loop can treat it as informational.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// No eligible encoded blob exists; not an error condition.
    #[error("no encoded blobs are ready for batching")]
    NoBlobsReady,

    /// Any other assembler failure, opaque to the core.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from inclusion-proof construction over an assembled batch.
#[derive(Debug, Error)]
pub enum ProofError {
    /// A blob index with no corresponding header; contract violation by the
    /// assembler.
    #[error("blob header at index {index} not found in batch of {headers} headers")]
    MissingHeader { index: usize, headers: usize },

    /// The tree leaf at an index does not commit the header at that index.
    #[error("merkle leaf at index {index} does not match the blob header hash")]
    LeafMismatch { index: usize },

    /// Proof generation itself failed.
    #[error("failed to generate inclusion proof: {0}")]
    Proof(#[from] MerkleError),
}

/// Terminal error of one batch attempt.
#[derive(Debug, Error)]
pub enum BatcherError {
    #[error("batch assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("failed to compute batch header hash: {0}")]
    HeaderHash(#[from] BatchHeaderError),

    #[error("failed to build inclusion proofs: {0}")]
    InclusionProof(#[from] ProofError),

    #[error("failed to disperse batch: {0}")]
    Dispatch(anyhow::Error),

    /// The confirmation subsystem dropped its end of the handoff queue.
    #[error("confirmation queue closed")]
    ConfirmationQueueClosed,
}

impl BatcherError {
    /// True for the distinguished informational no-work condition.
    pub fn is_no_blobs_ready(&self) -> bool {
        matches!(self, BatcherError::Assembly(AssemblyError::NoBlobsReady))
    }
}

/// Failure of one batch attempt, carrying the attempt's reservation
/// timestamp so the caller can release the reservation on every path.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct BatchAttemptError {
    ts: u64,
    source: BatcherError,
}

impl BatchAttemptError {
    pub fn new(ts: u64, source: BatcherError) -> Self {
        Self { ts, source }
    }

    /// Reservation timestamp of the failed attempt; zero when assembly never
    /// reserved one.
    pub fn ts(&self) -> u64 {
        self.ts
    }

    pub fn kind(&self) -> &BatcherError {
        &self.source
    }

    pub fn is_no_blobs_ready(&self) -> bool {
        self.source.is_no_blobs_ready()
    }
}
