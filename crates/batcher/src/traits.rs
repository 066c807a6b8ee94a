//! Capability interfaces for the batcher's collaborators.
//!
//! The store, gateway, assembler, and the confirmation/finalization
//! lifecycles are injected at construction so every one of them can be
//! substituted with a test double.

use alloy_primitives::B256;
use async_trait::async_trait;
use strew_core::{Batch, BatchHeader, BlobMetadata, EncodedBlob, MerkleProof};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{batcher::ConfirmationRecord, errors::AssemblyError};

/// Durable queue of submitted blobs.
///
/// Owns blob status and retry bookkeeping; the batching core only reports
/// outcomes to it.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Records a failed attempt for `blob`.
    ///
    /// While the blob has budget left it goes back to processing; beyond
    /// `max_retries` failed attempts it transitions to permanent failure.
    async fn handle_blob_failure(&self, blob: &BlobMetadata, max_retries: u32)
        -> anyhow::Result<()>;
}

/// Gateway to the dispersal network.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Submits an assembled batch for dispersal.
    ///
    /// Returns the network submission identifier used to track the batch
    /// through confirmation.
    async fn disperse_batch(
        &self,
        header_hash: B256,
        header: &BatchHeader,
        encoded_payloads: &[EncodedBlob],
        proofs: &[MerkleProof],
    ) -> anyhow::Result<B256>;
}

/// The encoding streamer: accumulates encoded blobs and assembles batches on
/// demand.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BatchAssembler: Send + Sync {
    /// Assembles the next batch from eligible encoded blobs, reserving them
    /// under the returned logical timestamp.
    ///
    /// Index *i* of every per-blob sequence in the returned [`Batch`] refers
    /// to the same blob.
    async fn create_batch(&self) -> Result<(Batch, u64), AssemblyError>;

    /// Releases the reservation taken by a failed attempt so its blobs can
    /// be reconsidered.
    ///
    /// Releasing an unknown or already-released timestamp is a no-op.
    async fn remove_batching_status(&self, ts: u64);

    /// Runs the assembler's own encoding pipeline until cancelled.
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// Asynchronous confirmation subsystem.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Consumes confirmation records from the bounded handoff queue until
    /// the queue closes or cancellation.
    async fn run(
        &self,
        inbound: mpsc::Receiver<ConfirmationRecord>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()>;
}

/// Finalizer for confirmed batches; independent lifecycle, no direct data
/// exchange with the batching core.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
