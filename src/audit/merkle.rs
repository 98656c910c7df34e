//! Merkle tree over ordered batches of entry hashes.
//!
//! Built bottom-up; an odd node at any level is paired with itself
//! (duplicate-last rule). The root of an empty batch is the empty string by
//! definition, not an error.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::audit::entry::ChainedLogEntry;

fn combine(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => combine(left, right),
            [odd] => combine(odd, odd),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

fn root_of_hashes(hashes: &[String]) -> String {
    if hashes.is_empty() {
        return String::new();
    }
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level.remove(0)
}

/// Merkle root over the ordered list of entry hashes.
pub fn generate_merkle_root(logs: &[ChainedLogEntry]) -> String {
    let hashes: Vec<String> = logs.iter().map(|e| e.hash.clone()).collect();
    let root = root_of_hashes(&hashes);
    debug!("Merkle root over {} entries: {}", logs.len(), root);
    root
}

/// One sibling hash on the path from a leaf to the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofStep {
    pub hash: String,
    /// Whether the sibling sits to the left of the running hash.
    pub sibling_is_left: bool,
}

/// Inclusion proof for a single entry against a batch root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_hash: String,
    pub steps: Vec<ProofStep>,
    pub root_hash: String,
}

/// Build an inclusion proof for `logs[entry_index]`.
pub fn generate_merkle_proof(
    logs: &[ChainedLogEntry],
    entry_index: usize,
) -> Option<MerkleProof> {
    if entry_index >= logs.len() {
        return None;
    }

    let mut level: Vec<String> = logs.iter().map(|e| e.hash.clone()).collect();
    let leaf_hash = level[entry_index].clone();
    let mut index = entry_index;
    let mut steps = Vec::new();

    while level.len() > 1 {
        let sibling_is_left = index % 2 == 1;
        let sibling_index = if sibling_is_left { index - 1 } else { index + 1 };
        // Duplicate-last: an unpaired node is its own sibling.
        let sibling = level
            .get(sibling_index)
            .unwrap_or(&level[index])
            .clone();
        steps.push(ProofStep {
            hash: sibling,
            sibling_is_left,
        });
        level = next_level(&level);
        index /= 2;
    }

    Some(MerkleProof {
        leaf_hash,
        steps,
        root_hash: level.remove(0),
    })
}

/// Recompute the root from a proof; true only if it matches the claimed root.
pub fn verify_merkle_proof(proof: &MerkleProof) -> bool {
    let mut current = proof.leaf_hash.clone();
    for step in &proof.steps {
        current = if step.sibling_is_left {
            combine(&step.hash, &current)
        } else {
            combine(&current, &step.hash)
        };
    }
    current == proof.root_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::chain::AuditChain;
    use crate::audit::entry::AuditEvent;

    fn entries(count: usize) -> Vec<ChainedLogEntry> {
        let chain = AuditChain::new("merkle-test");
        (0..count)
            .map(|i| {
                chain.create_log_entry(AuditEvent::new(
                    "alice",
                    "transaction.sign",
                    &format!("tx-{}", i),
                ))
            })
            .collect()
    }

    #[test]
    fn test_empty_batch_has_empty_root() {
        assert_eq!(generate_merkle_root(&[]), "");
    }

    #[test]
    fn test_single_entry_root_is_leaf_hash() {
        let logs = entries(1);
        assert_eq!(generate_merkle_root(&logs), logs[0].hash);
    }

    #[test]
    fn test_root_is_deterministic_and_order_sensitive() {
        let logs = entries(5);
        assert_eq!(generate_merkle_root(&logs), generate_merkle_root(&logs));

        let mut reordered = logs.clone();
        reordered.swap(1, 2);
        assert_ne!(generate_merkle_root(&logs), generate_merkle_root(&reordered));
    }

    #[test]
    fn test_odd_batch_uses_duplicate_last() {
        let logs = entries(3);
        let manual = {
            let a = combine(&logs[0].hash, &logs[1].hash);
            let b = combine(&logs[2].hash, &logs[2].hash);
            combine(&a, &b)
        };
        assert_eq!(generate_merkle_root(&logs), manual);
    }

    #[test]
    fn test_inclusion_proofs_verify_for_every_leaf() {
        for count in [1usize, 2, 3, 4, 7, 8] {
            let logs = entries(count);
            for i in 0..count {
                let proof = generate_merkle_proof(&logs, i).unwrap();
                assert_eq!(proof.root_hash, generate_merkle_root(&logs));
                assert!(verify_merkle_proof(&proof), "leaf {} of {}", i, count);
            }
        }
    }

    #[test]
    fn test_proof_fails_for_wrong_leaf() {
        let logs = entries(4);
        let mut proof = generate_merkle_proof(&logs, 2).unwrap();
        proof.leaf_hash = logs[3].hash.clone();
        assert!(!verify_merkle_proof(&proof));
    }

    #[test]
    fn test_proof_index_out_of_range() {
        let logs = entries(2);
        assert!(generate_merkle_proof(&logs, 2).is_none());
    }
}
