//! In-memory collaborator doubles and batch fixtures shared across tests.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use alloy_primitives::B256;
use async_trait::async_trait;
use strew_core::{
    Assignment, AssignmentInfo, Batch, BatchHeader, BlobHeader, BlobMetadata, BlobQuorumParam,
    BlobStatus, EncodedBlob, G1Commitment, MerkleTree, QuorumInfo,
};
use tokio_util::sync::CancellationToken;

use crate::{
    errors::AssemblyError,
    traits::{BatchAssembler, BlobStore},
};

pub(crate) fn make_test_blob(seed: u8) -> (BlobMetadata, BlobHeader, EncodedBlob) {
    let metadata = BlobMetadata {
        blob_key: B256::repeat_byte(seed),
        blob_size: 256 * seed as u64,
        requested_at: 1_700_000_000 + seed as u64,
        status: BlobStatus::Processing,
        num_retries: 0,
    };
    let header = BlobHeader::new(
        G1Commitment {
            x: B256::repeat_byte(seed),
            y: B256::repeat_byte(seed.wrapping_add(0x80)),
        },
        256 * seed as u32,
        vec![BlobQuorumParam {
            quorum_id: 0,
            adversary_threshold: 33,
            quorum_threshold: 67,
        }],
    )
    .expect("valid test header");
    let payload = EncodedBlob {
        data: vec![seed; 128].into(),
    };
    (metadata, header, payload)
}

fn make_batch_with_quorums(
    n: usize,
    ts: u64,
    quorum_numbers: Vec<u8>,
    quorum_signed_percentages: Vec<u8>,
) -> Batch {
    assert!(n > 0 && n < 255, "fixture supports 1..255 blobs");
    let mut metadata = Vec::with_capacity(n);
    let mut headers = Vec::with_capacity(n);
    let mut payloads = Vec::with_capacity(n);
    for seed in 1..=n as u8 {
        let (m, h, p) = make_test_blob(seed);
        metadata.push(m);
        headers.push(h);
        payloads.push(p);
    }

    let leaves: Vec<B256> = headers.iter().map(BlobHeader::header_hash).collect();
    let header = BatchHeader {
        batch_root: MerkleTree::from_leaves(leaves).expect("non-empty").root(),
        quorum_numbers,
        quorum_signed_percentages,
        reference_block_number: 100,
    };

    // One-operator assignment snapshot for quorum 0.
    let assignments = BTreeMap::from([(
        B256::repeat_byte(0xf0),
        Assignment {
            start_index: 0,
            num_chunks: 8,
        },
    )]);
    let quorums = BTreeMap::from([(
        0,
        QuorumInfo::new(assignments, AssignmentInfo { total_chunks: 8 }),
    )]);

    Batch::new(header, metadata, headers, payloads, quorums, ts).expect("aligned test batch")
}

/// A well-formed batch of `n` blobs reserved under `ts`.
pub(crate) fn make_test_batch(n: usize, ts: u64) -> Batch {
    make_batch_with_quorums(n, ts, vec![0], vec![67])
}

/// A batch whose header cannot be hashed: its quorum numbers and signed
/// percentages are parallel arrays of different lengths.
pub(crate) fn make_test_batch_with_bad_quorum_arity(n: usize, ts: u64) -> Batch {
    make_batch_with_quorums(n, ts, vec![0, 1], vec![67])
}

/// Blob store double with real retry accounting.
#[derive(Debug, Default)]
pub(crate) struct InMemoryBlobStore {
    blobs: Mutex<HashMap<B256, BlobMetadata>>,
    marks: Mutex<HashMap<B256, u32>>,
}

impl InMemoryBlobStore {
    pub(crate) fn get(&self, key: &B256) -> Option<BlobMetadata> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    /// How many times each blob was marked failed.
    pub(crate) fn marked_failures(&self) -> HashMap<B256, u32> {
        self.marks.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn handle_blob_failure(
        &self,
        blob: &BlobMetadata,
        max_retries: u32,
    ) -> anyhow::Result<()> {
        *self
            .marks
            .lock()
            .unwrap()
            .entry(blob.blob_key)
            .or_insert(0) += 1;

        let mut blobs = self.blobs.lock().unwrap();
        let entry = blobs
            .entry(blob.blob_key)
            .or_insert_with(|| blob.clone());
        if entry.num_retries < max_retries {
            entry.num_retries += 1;
            entry.status = BlobStatus::Processing;
        } else {
            entry.status = BlobStatus::Failed;
        }
        Ok(())
    }
}

/// Assembler double returning scripted results, tracking reservations and
/// releases.
pub(crate) struct StubAssembler {
    results: Mutex<VecDeque<Result<(Batch, u64), AssemblyError>>>,
    reserved: Mutex<HashSet<u64>>,
    releases: Mutex<Vec<u64>>,
}

impl StubAssembler {
    /// Scripted results are yielded in order; once exhausted every call
    /// reports no blobs ready.
    pub(crate) fn with_results(results: Vec<Result<(Batch, u64), AssemblyError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            reserved: Mutex::new(HashSet::new()),
            releases: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn releases(&self) -> Vec<u64> {
        self.releases.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchAssembler for StubAssembler {
    async fn create_batch(&self) -> Result<(Batch, u64), AssemblyError> {
        match self.results.lock().unwrap().pop_front() {
            Some(Ok((batch, ts))) => {
                self.reserved.lock().unwrap().insert(ts);
                Ok((batch, ts))
            }
            Some(Err(e)) => Err(e),
            None => Err(AssemblyError::NoBlobsReady),
        }
    }

    async fn remove_batching_status(&self, ts: u64) {
        // Releasing a timestamp that was never reserved is a no-op.
        let _ = self.reserved.lock().unwrap().remove(&ts);
        self.releases.lock().unwrap().push(ts);
    }

    async fn run(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        cancel.cancelled().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_budget_boundary() {
        let store = InMemoryBlobStore::default();
        let (blob, _, _) = make_test_blob(1);
        let max_retries = 3;

        for attempt in 1..=3u32 {
            store.handle_blob_failure(&blob, max_retries).await.unwrap();
            let stored = store.get(&blob.blob_key).unwrap();
            assert_eq!(stored.num_retries, attempt);
            assert_eq!(
                stored.status,
                BlobStatus::Processing,
                "failure {attempt} of {max_retries} leaves the blob retryable"
            );
        }

        // Fourth failure exceeds the budget.
        store.handle_blob_failure(&blob, max_retries).await.unwrap();
        let stored = store.get(&blob.blob_key).unwrap();
        assert_eq!(stored.status, BlobStatus::Failed);
        assert_eq!(stored.num_retries, 3);
    }

    #[tokio::test]
    async fn test_release_is_a_defensive_noop() {
        let assembler = StubAssembler::with_results(Vec::new());

        // Never reserved, then released twice; neither may fault.
        assembler.remove_batching_status(12345).await;
        assembler.remove_batching_status(12345).await;
        assert_eq!(assembler.releases(), vec![12345, 12345]);
    }
}
