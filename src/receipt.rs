use chrono::Utc;
use ethers::utils::keccak256;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::Receipt;

pub fn hash_leaf(data: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hasher.finalize().into()
}

fn hash_pair(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Pairwise SHA-256 fold. An odd leaf at the end of a level is paired with
/// itself.
pub fn build_merkle_root(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len().div_ceil(2));

        for pair in leaves.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            next.push(hash_pair(left, right));
        }

        leaves = next;
    }

    leaves[0]
}

/// Sibling path for `leaves[index]`, bottom-up. Recomputing the root from it
/// needs the leaf's position parity per level, which the receipt does not
/// carry: verification stays a shape check (see `routes::receipt`).
pub fn merkle_proof(leaves: &[[u8; 32]], index: usize) -> Vec<[u8; 32]> {
    let mut proof = Vec::new();
    if leaves.len() < 2 || index >= leaves.len() {
        return proof;
    }

    let mut level = leaves.to_vec();
    let mut pos = index;

    while level.len() > 1 {
        let sibling = if pos % 2 == 0 {
            *level.get(pos + 1).unwrap_or(&level[pos])
        } else {
            level[pos - 1]
        };
        proof.push(sibling);

        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            next.push(hash_pair(left, right));
        }

        level = next;
        pos /= 2;
    }

    proof
}

/// Keccak-256 over the round tuple, hex-encoded. This is the receipt's
/// identity and its Redis key suffix.
pub fn receipt_hash(feed: &str, round_id: &str, median: &str, timestamp: u64) -> String {
    let data = format!("{feed}:{round_id}:{median}:{timestamp}");
    hex::encode(keccak256(data.as_bytes()))
}

/// Assemble a delivery receipt for a round. Leaves cover the tuple fields
/// and every council id; the proof is the first leaf's sibling path.
pub fn build_receipt(
    feed: &str,
    round_id: &str,
    median: &str,
    timestamp: u64,
    councils: &[String],
) -> Receipt {
    let mut leaves = vec![
        hash_leaf(feed),
        hash_leaf(round_id),
        hash_leaf(median),
        hash_leaf(&timestamp.to_string()),
    ];
    for council in councils {
        leaves.push(hash_leaf(council));
    }

    let root = build_merkle_root(leaves.clone());
    let proof = merkle_proof(&leaves, 0);
    let depth = proof.len();

    Receipt {
        receipt_id: Uuid::new_v4(),
        feed: feed.to_string(),
        round_id: round_id.to_string(),
        median: median.to_string(),
        timestamp,
        hash: receipt_hash(feed, round_id, median, timestamp),
        root: hex::encode(root),
        proof: proof.into_iter().map(hex::encode).collect(),
        depth,
        issued_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let leaf = hash_leaf("BTC:100:6500000000000:1700000000");
        assert_eq!(build_merkle_root(vec![leaf]), leaf);
    }

    #[test]
    fn odd_leaf_is_paired_with_itself() {
        let leaves: Vec<[u8; 32]> = ["a", "b", "c"].iter().map(|d| hash_leaf(d)).collect();
        let expected = hash_pair(
            hash_pair(leaves[0], leaves[1]),
            hash_pair(leaves[2], leaves[2]),
        );
        assert_eq!(build_merkle_root(leaves), expected);
    }

    #[test]
    fn empty_tree_has_zero_root() {
        assert_eq!(build_merkle_root(vec![]), [0u8; 32]);
    }

    #[test]
    fn proof_is_the_sibling_path() {
        let leaves: Vec<[u8; 32]> = ["a", "b", "c", "d"].iter().map(|d| hash_leaf(d)).collect();
        let proof = merkle_proof(&leaves, 0);

        assert_eq!(proof.len(), 2);
        assert_eq!(proof[0], leaves[1]);
        assert_eq!(proof[1], hash_pair(leaves[2], leaves[3]));

        // Recombining along the path reproduces the root for leaf 0.
        let root = hash_pair(hash_pair(leaves[0], proof[0]), proof[1]);
        assert_eq!(root, build_merkle_root(leaves));
    }

    #[test]
    fn receipt_depth_matches_proof() {
        let councils = vec!["council-01".to_string(), "council-02".to_string()];
        let receipt = build_receipt("BTC", "42", "6500000000000", 1700000000, &councils);

        assert_eq!(receipt.depth, receipt.proof.len());
        assert_eq!(receipt.hash.len(), 64);
        assert_eq!(receipt.root.len(), 64);
        // 6 leaves -> 3 levels above the leaves.
        assert_eq!(receipt.depth, 3);
    }

    #[test]
    fn receipt_hash_is_stable() {
        let a = receipt_hash("BTC", "42", "100", 1);
        let b = receipt_hash("BTC", "42", "100", 1);
        let c = receipt_hash("BTC", "43", "100", 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
