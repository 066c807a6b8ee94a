//! The batching loop and its single-attempt cycle controller.
//!
//! One dedicated task runs [`Batcher::run`], selecting over a periodic pull
//! ticker and a capacity-1 size-threshold notification. Servicing either
//! trigger runs one end-to-end batch attempt inline, so at most one attempt
//! is ever in flight from this loop. All per-attempt state is local to one
//! [`Batcher::handle_single_batch`] invocation.

use std::{sync::Arc, time::Instant};

use alloy_primitives::B256;
use strew_config::{BatcherConfig, TimeoutConfig};
use strew_core::{Batch, BlobMetadata, BlobStatus, MerkleProof};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    errors::{BatchAttemptError, BatcherError, FailReason},
    metrics::{self, TimingGuard},
    notifier::EncodedSizeNotifier,
    proofs::build_inclusion_proofs,
    traits::{BatchAssembler, BlobStore, Confirmer, Dispatcher, Finalizer},
};

/// The unit handed to the asynchronous confirmation subsystem: everything
/// needed to track one dispatched batch through quorum confirmation.
///
/// Created once per successful dispatch, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ConfirmationRecord {
    header_hash: B256,
    batch: Batch,
    proofs: Vec<MerkleProof>,
    ts: u64,
}

impl ConfirmationRecord {
    pub(crate) fn new(header_hash: B256, batch: Batch, proofs: Vec<MerkleProof>, ts: u64) -> Self {
        Self {
            header_hash,
            batch,
            proofs,
            ts,
        }
    }

    /// Content-addressed identifier of the dispatched batch header.
    pub fn header_hash(&self) -> B256 {
        self.header_hash
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Inclusion proofs, aligned with the batch's blob order.
    pub fn proofs(&self) -> &[MerkleProof] {
        &self.proofs
    }

    /// Reservation timestamp of the attempt that produced this record.
    pub fn ts(&self) -> u64 {
        self.ts
    }

    pub fn into_parts(self) -> (B256, Batch, Vec<MerkleProof>, u64) {
        (self.header_hash, self.batch, self.proofs, self.ts)
    }
}

/// Drives batch assembly, dispersal, and the confirmation handoff.
///
/// Collaborators are injected as capability traits; the batcher owns only
/// the scheduling and the per-attempt orchestration.
#[derive(Debug)]
pub struct Batcher<Q, D, A> {
    config: BatcherConfig,
    timeouts: TimeoutConfig,

    queue: Arc<Q>,
    dispatcher: Arc<D>,
    assembler: Arc<A>,

    size_notifier: EncodedSizeNotifier,
    notify_rx: mpsc::Receiver<()>,
    confirm_tx: mpsc::Sender<ConfirmationRecord>,
}

impl<Q, D, A> Batcher<Q, D, A>
where
    Q: BlobStore,
    D: Dispatcher,
    A: BatchAssembler,
{
    /// Creates a batcher along with the receive half of the bounded
    /// confirmation handoff queue, sized by
    /// `config.confirmation_queue_size`.
    pub fn new(
        config: BatcherConfig,
        timeouts: TimeoutConfig,
        queue: Arc<Q>,
        dispatcher: Arc<D>,
        assembler: Arc<A>,
    ) -> (Self, mpsc::Receiver<ConfirmationRecord>) {
        let (confirm_tx, confirm_rx) = mpsc::channel(config.confirmation_queue_size);
        let (notify_tx, notify_rx) = mpsc::channel(1);
        let size_notifier = EncodedSizeNotifier::new(notify_tx, config.batch_size_limit_bytes());

        let batcher = Self {
            config,
            timeouts,
            queue,
            dispatcher,
            assembler,
            size_notifier,
            notify_rx,
            confirm_tx,
        };
        (batcher, confirm_rx)
    }

    /// Trigger handle to share with the encoding pipeline; it fires the
    /// early-batch notification when pending encoded bytes cross the
    /// configured threshold.
    pub fn size_notifier(&self) -> EncodedSizeNotifier {
        self.size_notifier.clone()
    }

    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Deadlines to hand to collaborators at wiring.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Spawns the collaborator lifecycles and the batching loop.
    ///
    /// Mirrors node wiring order: the assembler's encoding pipeline first,
    /// then the confirmation and finalization consumers, then the loop
    /// itself. Returns the task handles; all tasks exit on cancellation.
    pub fn start<C, F>(
        self,
        confirm_rx: mpsc::Receiver<ConfirmationRecord>,
        confirmer: Arc<C>,
        finalizer: Arc<F>,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>>
    where
        Q: 'static,
        D: 'static,
        A: 'static,
        C: Confirmer + 'static,
        F: Finalizer + 'static,
    {
        let mut handles = Vec::with_capacity(4);

        let assembler = self.assembler.clone();
        let assembler_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = assembler.run(assembler_cancel).await {
                error!(err = %e, "batch assembler exited with error");
            }
        }));

        let confirmer_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = confirmer.run(confirm_rx, confirmer_cancel).await {
                error!(err = %e, "confirmer exited with error");
            }
        }));

        let finalizer_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = finalizer.run(finalizer_cancel).await {
                error!(err = %e, "finalizer exited with error");
            }
        }));

        handles.push(tokio::spawn(self.run(cancel)));
        handles
    }

    /// The batching loop.
    ///
    /// The two trigger sources are mutually exclusive: attempts run inline
    /// in the loop, so a size notification arriving during a tick-triggered
    /// attempt waits (coalesced to one) until that attempt completes.
    /// Exits on cancellation without aborting an in-flight attempt.
    pub async fn run(mut self, cancel: CancellationToken) {
        let pull_interval = self.config.pull_interval();
        let mut ticker = time::interval_at(time::Instant::now() + pull_interval, pull_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            pull_interval_ms = self.config.pull_interval_ms,
            size_threshold_bytes = self.size_notifier.threshold_bytes(),
            "batcher started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("batcher received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.attempt_batch("pull_interval").await;
                }
                Some(()) = self.notify_rx.recv() => {
                    self.attempt_batch("size_threshold").await;
                    // The periodic trigger was implicitly paused while the
                    // attempt ran; restart its full period.
                    ticker.reset();
                }
            }
        }
    }

    /// Runs one attempt and translates its outcome into log side effects,
    /// releasing the attempt's reservation on failure.
    async fn attempt_batch(&self, trigger: &'static str) {
        match self.handle_single_batch().await {
            Ok(ts) => {
                debug!(trigger, ts, "batch attempt dispatched");
            }
            Err(err) => {
                // Make the attempt's blobs eligible for the next cycle.
                self.assembler.remove_batching_status(err.ts()).await;
                if err.is_no_blobs_ready() {
                    warn!(trigger, "no encoded blobs ready to make a batch");
                } else {
                    error!(trigger, err = %err, "failed to process batch attempt");
                }
            }
        }
    }

    /// One end-to-end batch attempt: assemble, hash the header, build
    /// inclusion proofs, disperse, and hand off for confirmation.
    ///
    /// Returns the attempt's reservation timestamp; on failure the error
    /// carries the timestamp so the caller can release the reservation. A
    /// failing attempt marks every implicated blob through the failure
    /// handler exactly once, with the reason of the stage that aborted it.
    pub async fn handle_single_batch(&self) -> Result<u64, BatchAttemptError> {
        let _total = TimingGuard::new("total");

        let stage_start = Instant::now();
        let assembled = self.assembler.create_batch().await;
        metrics::observe_stage("create_batch", stage_start.elapsed());
        let (mut batch, ts) = match assembled {
            Ok(assembled) => assembled,
            // No reservation was taken; releasing ts 0 downstream is a no-op.
            Err(e) => return Err(BatchAttemptError::new(0, e.into())),
        };
        trace!(
            blobs = batch.len(),
            duration_ms = stage_start.elapsed().as_millis() as u64,
            "assembled batch"
        );

        let header_hash = match batch.header().header_hash() {
            Ok(hash) => hash,
            Err(e) => {
                self.fail_batch(batch.blob_metadata(), FailReason::BatchHeaderHash)
                    .await;
                return Err(BatchAttemptError::new(ts, BatcherError::HeaderHash(e)));
            }
        };

        let proofs = match build_inclusion_proofs(&batch) {
            Ok(proofs) => proofs,
            Err(e) => {
                self.fail_batch(batch.blob_metadata(), FailReason::InclusionProof)
                    .await;
                return Err(BatchAttemptError::new(ts, BatcherError::InclusionProof(e)));
            }
        };

        let stage_start = Instant::now();
        let dispatched = self
            .dispatcher
            .disperse_batch(header_hash, batch.header(), batch.encoded_payloads(), &proofs)
            .await;
        metrics::observe_stage("disperse", stage_start.elapsed());
        let submission_id = match dispatched {
            Ok(id) => id,
            Err(e) => {
                self.fail_batch(batch.blob_metadata(), FailReason::Dispatch).await;
                return Err(BatchAttemptError::new(ts, BatcherError::Dispatch(e)));
            }
        };
        trace!(
            %header_hash,
            %submission_id,
            duration_ms = stage_start.elapsed().as_millis() as u64,
            "dispersed batch"
        );
        batch.set_submission_id(submission_id);

        // Hand off for asynchronous confirmation. Blocks only when the
        // bounded queue is full; a slow confirmer throttles new attempts.
        let record = ConfirmationRecord::new(header_hash, batch, proofs, ts);
        if self.confirm_tx.send(record).await.is_err() {
            return Err(BatchAttemptError::new(
                ts,
                BatcherError::ConfirmationQueueClosed,
            ));
        }

        Ok(ts)
    }

    /// The failure handler: marks every implicated blob against the store,
    /// bounded by the configured retry budget, and updates failure metrics.
    ///
    /// Best-effort across the whole set: a store error for one blob does not
    /// stop the others, and the failed-bytes metric is updated for every
    /// blob regardless of its own marking outcome. Returns the per-blob
    /// sub-errors in blob order; empty means every mark succeeded.
    pub async fn handle_failure(
        &self,
        blobs: &[BlobMetadata],
        reason: FailReason,
    ) -> Vec<anyhow::Error> {
        let mut sub_errors = Vec::new();
        for blob in blobs {
            if let Err(e) = self
                .queue
                .handle_blob_failure(blob, self.config.max_retries_per_blob)
                .await
            {
                error!(blob_key = %blob.blob_key, err = %e, "error handling blob failure");
                sub_errors.push(e);
            }
            metrics::record_completed_blob(blob.blob_size, BlobStatus::Failed);
        }
        metrics::record_batch_error(reason, blobs.len());
        sub_errors
    }

    async fn fail_batch(&self, blobs: &[BlobMetadata], reason: FailReason) {
        let sub_errors = self.handle_failure(blobs, reason).await;
        if !sub_errors.is_empty() {
            warn!(
                reason = reason.as_str(),
                failed_marks = sub_errors.len(),
                blobs = blobs.len(),
                "failed to mark some blobs of the failed attempt"
            );
        }
    }
}
