//! Inclusion-proof construction over an assembled batch.

use strew_core::{Batch, MerkleProof};

use crate::errors::ProofError;

/// Builds one merkle inclusion proof per blob, in batch order.
///
/// Proof *i* proves that blob header hash *i* is leaf *i* of the batch's
/// tree. Any inconsistency between the blob sequences and the tree is a
/// contract violation by the assembler and fails the whole attempt.
pub fn build_inclusion_proofs(batch: &Batch) -> Result<Vec<MerkleProof>, ProofError> {
    let mut proofs = Vec::with_capacity(batch.len());
    for index in 0..batch.len() {
        let header = batch
            .blob_headers()
            .get(index)
            .ok_or(ProofError::MissingHeader {
                index,
                headers: batch.blob_headers().len(),
            })?;

        let leaf = header.header_hash();
        if batch.merkle_tree().leaf(index) != Some(leaf) {
            return Err(ProofError::LeafMismatch { index });
        }

        proofs.push(batch.merkle_tree().gen_proof(index)?);
    }
    Ok(proofs)
}

#[cfg(test)]
mod tests {
    use strew_core::verify_proof;

    use super::*;
    use crate::test_utils::make_test_batch;

    #[test]
    fn test_one_proof_per_blob() {
        for n in [1, 2, 3, 5, 8] {
            let batch = make_test_batch(n, 1);
            let proofs = build_inclusion_proofs(&batch).unwrap();
            assert_eq!(proofs.len(), n, "batch of {n} blobs should yield {n} proofs");
        }
    }

    #[test]
    fn test_proofs_verify_against_root_and_headers() {
        let batch = make_test_batch(5, 1);
        let root = batch.merkle_tree().root();
        let proofs = build_inclusion_proofs(&batch).unwrap();

        for (i, proof) in proofs.iter().enumerate() {
            assert_eq!(proof.index(), i);
            let leaf = batch.blob_headers()[i].header_hash();
            assert!(
                verify_proof(root, leaf, proof),
                "proof {i} should verify against blob header hash {i}"
            );
        }
    }

    #[test]
    fn test_proofs_are_index_aligned() {
        let batch = make_test_batch(4, 1);
        let root = batch.merkle_tree().root();
        let proofs = build_inclusion_proofs(&batch).unwrap();

        // A proof must not verify for a different blob's header.
        let other_leaf = batch.blob_headers()[2].header_hash();
        assert!(!verify_proof(root, other_leaf, &proofs[0]));
    }
}
