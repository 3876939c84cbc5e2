//! Merkle commitment to a dealer's public commitments.
//!
//! The leaves are the uncompressed G1 commitments (in order of degree) followed by the
//! uncompressed G2 commitments. Digests are computed with SHA-256:
//!
//! * leaf: `H(0x00 || position || point)` where `position` is a big-endian `u32`
//! * node: `H(0x01 || left || right)`
//!
//! When a level has an odd number of nodes, the last node is promoted to the next level
//! unchanged.

use crate::bls12381::{
    dkg::types::Commitment,
    primitives::group::Point,
};
use sha2::{Digest as _, Sha256};

/// Size of a digest in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// A SHA-256 digest.
pub type Digest = [u8; DIGEST_LENGTH];

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Computes the digest of a leaf at `position`.
pub fn leaf_digest(position: u32, element: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(position.to_be_bytes());
    hasher.update(element);
    hasher.finalize().into()
}

/// Computes the digest of a node given its children.
pub fn node_digest(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// A Merkle tree over a fixed list of elements.
#[derive(Debug, Clone)]
pub struct Tree {
    levels: Vec<Vec<Digest>>,
}

impl Tree {
    /// Builds a tree over the provided elements.
    ///
    /// Returns `None` if no elements are provided.
    pub fn new<E: AsRef<[u8]>>(elements: &[E]) -> Option<Self> {
        if elements.is_empty() {
            return None;
        }
        let leaves = elements
            .iter()
            .enumerate()
            .map(|(position, element)| leaf_digest(position as u32, element.as_ref()))
            .collect::<Vec<_>>();
        let mut levels = vec![leaves];
        while let Some(level) = levels.last() {
            if level.len() == 1 {
                break;
            }
            let next = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => node_digest(left, right),
                    [single] => *single,
                    _ => unreachable!(),
                })
                .collect();
            levels.push(next);
        }
        Some(Self { levels })
    }

    /// Builds the tree over both halves of a commitment.
    pub fn from_commitment(commitment: &Commitment) -> Self {
        let elements = commitment
            .feldman()
            .coefficients()
            .iter()
            .map(|point| point.serialize_uncompressed())
            .chain(
                commitment
                    .public()
                    .coefficients()
                    .iter()
                    .map(|point| point.serialize_uncompressed()),
            )
            .collect::<Vec<_>>();

        // A commitment always has at least one coefficient in each group
        Self::new(&elements).expect("commitment has no coefficients")
    }

    /// Returns the number of leaves.
    pub fn leaves(&self) -> u32 {
        self.levels[0].len() as u32
    }

    /// Returns the root of the tree.
    pub fn root(&self) -> Digest {
        self.levels[self.levels.len() - 1][0]
    }

    /// Returns an inclusion proof for the leaf at `position`.
    pub fn proof(&self, position: u32) -> Option<Proof> {
        if position >= self.leaves() {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.levels.len() - 1);
        let mut index = position as usize;
        for level in &self.levels[..self.levels.len() - 1] {
            siblings.push(level.get(index ^ 1).copied());
            index /= 2;
        }
        Some(Proof { siblings })
    }
}

/// An inclusion proof for a single leaf.
///
/// A sibling is absent at levels where the node was promoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub siblings: Vec<Option<Digest>>,
}

impl Proof {
    /// Returns true if `element` is the leaf at `position` of the tree with `root`.
    pub fn verify(&self, root: &Digest, position: u32, element: &[u8]) -> bool {
        let mut digest = leaf_digest(position, element);
        let mut index = position;
        for sibling in &self.siblings {
            if let Some(sibling) = sibling {
                digest = if index % 2 == 0 {
                    node_digest(&digest, sibling)
                } else {
                    node_digest(sibling, &digest)
                };
            } else if index % 2 == 1 {
                // Only the last (even) node of a level can be promoted
                return false;
            }
            index /= 2;
        }
        &digest == root
    }
}

/// Computes the Merkle root over a dealer's G1 and G2 commitments.
pub fn merkle_commit(commitment: &Commitment) -> Digest {
    Tree::from_commitment(commitment).root()
}
