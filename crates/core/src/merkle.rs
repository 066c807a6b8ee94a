//! Binary Merkle tree over blob header hashes.
//!
//! Internal nodes are keccak256 of the concatenated child hashes. Levels with
//! an odd node count duplicate their last node, so every leaf has a proof of
//! the same shape regardless of batch size.

use alloy_primitives::{keccak256, B256};
use thiserror::Error;

/// Errors from tree construction and proof generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("cannot build a merkle tree with no leaves")]
    EmptyLeaves,

    /// Proof requested for a leaf index the tree does not have.
    #[error("leaf index {index} out of range for tree with {leaves} leaves")]
    IndexOutOfRange { index: usize, leaves: usize },
}

/// Merkle tree with all intermediate levels materialized.
///
/// Built once per batch from the blob header hashes; leaf order is the batch
/// order, so leaf *i* always commits blob *i*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `layers[0]` is the leaf level, `layers.last()` the single-element root
    /// level.
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Builds a tree from leaf hashes, preserving their order.
    pub fn from_leaves(leaves: Vec<B256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyLeaves);
        }

        let mut layers = vec![leaves];
        while layers.last().expect("at least one layer").len() > 1 {
            let current = layers.last().expect("at least one layer");
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for pair in current.chunks(2) {
                let left = &pair[0];
                // Duplicate the last node on odd-sized levels.
                let right = if pair.len() == 2 { &pair[1] } else { &pair[0] };
                next.push(hash_pair(left, right));
            }
            layers.push(next);
        }

        Ok(Self { layers })
    }

    /// Root commitment of the tree.
    pub fn root(&self) -> B256 {
        self.layers.last().expect("at least one layer")[0]
    }

    /// Number of leaves the tree was built from.
    pub fn num_leaves(&self) -> usize {
        self.layers[0].len()
    }

    /// Leaf hash at `index`, if present.
    pub fn leaf(&self, index: usize) -> Option<B256> {
        self.layers[0].get(index).copied()
    }

    /// Generates the inclusion proof for the leaf at `index`.
    pub fn gen_proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        let leaves = self.num_leaves();
        if index >= leaves {
            return Err(MerkleError::IndexOutOfRange { index, leaves });
        }

        let mut hashes = Vec::with_capacity(self.layers.len() - 1);
        let mut idx = index;
        for level in &self.layers[..self.layers.len() - 1] {
            let sibling = if idx % 2 == 0 {
                // Right sibling; at an odd end the node is its own sibling.
                *level.get(idx + 1).unwrap_or(&level[idx])
            } else {
                level[idx - 1]
            };
            hashes.push(sibling);
            idx /= 2;
        }

        Ok(MerkleProof { hashes, index })
    }
}

/// Inclusion proof for one leaf: the sibling path from leaf level to root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    hashes: Vec<B256>,
    index: usize,
}

impl MerkleProof {
    /// Sibling hashes, leaf level first.
    pub fn hashes(&self) -> &[B256] {
        &self.hashes
    }

    /// Leaf index the proof was generated for.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Flat concatenation of the sibling hashes, the wire form expected by
    /// the dispersal gateway.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.hashes.len() * 32);
        for hash in &self.hashes {
            out.extend_from_slice(hash.as_slice());
        }
        out
    }
}

/// Checks `proof` against a leaf hash and an expected root.
pub fn verify_proof(root: B256, leaf: B256, proof: &MerkleProof) -> bool {
    let mut acc = leaf;
    let mut idx = proof.index;
    for sibling in &proof.hashes {
        acc = if idx % 2 == 0 {
            hash_pair(&acc, sibling)
        } else {
            hash_pair(sibling, &acc)
        };
        idx /= 2;
    }
    acc == root
}

fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<B256> {
        (0..n).map(|i| B256::repeat_byte(i as u8 + 1)).collect()
    }

    #[test]
    fn test_empty_leaves_rejected() {
        assert_eq!(
            MerkleTree::from_leaves(Vec::new()),
            Err(MerkleError::EmptyLeaves)
        );
    }

    #[test]
    fn test_single_leaf_is_root() {
        let leaf = B256::repeat_byte(0x42);
        let tree = MerkleTree::from_leaves(vec![leaf]).unwrap();
        assert_eq!(tree.root(), leaf);

        let proof = tree.gen_proof(0).unwrap();
        assert!(proof.hashes().is_empty());
        assert!(verify_proof(tree.root(), leaf, &proof));
    }

    #[test]
    fn test_two_leaves_root() {
        let ls = leaves(2);
        let tree = MerkleTree::from_leaves(ls.clone()).unwrap();
        assert_eq!(tree.root(), hash_pair(&ls[0], &ls[1]));
    }

    #[test]
    fn test_all_proofs_verify() {
        // Cover even, odd, and power-of-two leaf counts.
        for n in [1, 2, 3, 4, 5, 7, 8, 13] {
            let ls = leaves(n);
            let tree = MerkleTree::from_leaves(ls.clone()).unwrap();
            for (i, leaf) in ls.iter().enumerate() {
                let proof = tree.gen_proof(i).unwrap();
                assert_eq!(proof.index(), i);
                assert!(
                    verify_proof(tree.root(), *leaf, &proof),
                    "proof {i} of {n} should verify"
                );
            }
        }
    }

    #[test]
    fn test_wrong_leaf_fails_verification() {
        let ls = leaves(5);
        let tree = MerkleTree::from_leaves(ls.clone()).unwrap();
        let proof = tree.gen_proof(2).unwrap();
        assert!(!verify_proof(tree.root(), ls[3], &proof));
        assert!(!verify_proof(B256::ZERO, ls[2], &proof));
    }

    #[test]
    fn test_proof_index_out_of_range() {
        let tree = MerkleTree::from_leaves(leaves(3)).unwrap();
        assert_eq!(
            tree.gen_proof(3),
            Err(MerkleError::IndexOutOfRange {
                index: 3,
                leaves: 3
            })
        );
    }

    #[test]
    fn test_proof_serialization_is_flat() {
        let tree = MerkleTree::from_leaves(leaves(4)).unwrap();
        let proof = tree.gen_proof(1).unwrap();
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), proof.hashes().len() * 32);
        assert_eq!(&bytes[..32], proof.hashes()[0].as_slice());
    }

    #[test]
    fn test_deterministic() {
        let ls = leaves(6);
        let a = MerkleTree::from_leaves(ls.clone()).unwrap();
        let b = MerkleTree::from_leaves(ls).unwrap();
        assert_eq!(a.root(), b.root());
    }
}
