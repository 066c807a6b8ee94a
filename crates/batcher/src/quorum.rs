//! Pure pass/fail evaluation of stake-signed quorums against per-blob
//! thresholds.

use std::collections::BTreeMap;

use strew_core::{BlobHeader, QuorumId, QuorumResult};

/// Determines the failure status of each blob based on stake signed per
/// quorum.
///
/// A blob passes iff, for every quorum it requested, the reported signed
/// percentage is at least the blob's threshold for that quorum; it fails
/// only on strict shortfall, so exact equality passes. A quorum absent from
/// `signed_quorums` counts as 0% signed.
///
/// Returns the per-blob pass flags, aligned index-for-index with `headers`,
/// and the number of passing blobs.
pub fn blob_quorum_pass_status(
    signed_quorums: &BTreeMap<QuorumId, QuorumResult>,
    headers: &[BlobHeader],
) -> (Vec<bool>, usize) {
    let mut num_passed = 0;
    let mut passed = Vec::with_capacity(headers.len());

    for header in headers {
        let this_passed = header.quorum_params().iter().all(|param| {
            let percent_signed = signed_quorums
                .get(&param.quorum_id)
                .map(|result| result.percent_signed)
                .unwrap_or(0);
            percent_signed >= param.quorum_threshold
        });
        passed.push(this_passed);
        if this_passed {
            num_passed += 1;
        }
    }

    (passed, num_passed)
}
