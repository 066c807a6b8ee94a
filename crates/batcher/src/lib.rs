//! Batch orchestration core of the strew dispersal node.
//!
//! Aggregates pending encoded blobs into verifiable batches, builds per-blob
//! inclusion proofs, submits batches to the dispersal gateway, hands them
//! off for asynchronous confirmation, and reconciles failures against the
//! durable blob queue with bounded retries. The pure decision pieces, the
//! quorum pass/fail evaluator and the confirmation receipt decoder, are
//! exported for the confirmation subsystem.

pub mod batcher;
pub mod errors;
pub mod metrics;
pub mod notifier;
pub mod proofs;
pub mod quorum;
pub mod receipt;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batcher::{Batcher, ConfirmationRecord};
pub use errors::{AssemblyError, BatchAttemptError, BatcherError, FailReason, ProofError};
pub use notifier::EncodedSizeNotifier;
pub use proofs::build_inclusion_proofs;
pub use quorum::blob_quorum_pass_status;
pub use receipt::{batch_id_from_receipt, BatchConfirmed, ReceiptError};
pub use traits::{BatchAssembler, BlobStore, Confirmer, Dispatcher, Finalizer};

#[cfg(feature = "test-utils")]
pub use traits::{
    MockBatchAssembler, MockBlobStore, MockConfirmer, MockDispatcher, MockFinalizer,
};
