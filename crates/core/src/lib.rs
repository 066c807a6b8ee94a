//! Core domain types for the strew dispersal pipeline: blobs, batches,
//! operator assignment snapshots, and the merkle commitment scheme that ties
//! blob headers into a batch.

pub mod assignment;
pub mod batch;
pub mod blob;
pub mod merkle;

pub use assignment::{
    Assignment, AssignmentInfo, OperatorId, QuorumInfo, QuorumResult, QUANTIZATION_FACTOR,
};
pub use batch::{Batch, BatchHeader, BatchHeaderError};
pub use blob::{
    BlobHeader, BlobMetadata, BlobQuorumParam, BlobStatus, EncodedBlob, G1Commitment, QuorumId,
};
pub use merkle::{verify_proof, MerkleError, MerkleProof, MerkleTree};
