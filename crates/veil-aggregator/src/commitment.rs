// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use veil_events::BatchId;
use veil_fhe::{CiphertextHandle, NUM_COUNTERS};

const DOMAIN: &[u8] = b"veil:tally-commitment:v1";

/// Digest binding one ordered accumulator snapshot to one batch and one
/// coordinator instance. An oracle response can only finalize against the
/// exact state that was sent to it; a reordered snapshot, a mutated handle or
/// a different coordinator all change the digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub fn compute(
        batch_id: BatchId,
        snapshot: &[CiphertextHandle; NUM_COUNTERS],
        coordinator_identity: &str,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN);
        hasher.update(batch_id.value().to_le_bytes());
        // Length-prefix each handle so adjacent handles can never alias
        for handle in snapshot {
            hasher.update((handle.bytes().len() as u64).to_le_bytes());
            hasher.update(handle.bytes());
        }
        hasher.update((coordinator_identity.len() as u64).to_le_bytes());
        hasher.update(coordinator_identity.as_bytes());
        Commitment(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base58_string = bs58::encode(&self.0).into_string();
        write!(f, "com:{}", &base58_string[0..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(byte: u8) -> CiphertextHandle {
        CiphertextHandle::from_bytes(vec![byte; 8])
    }

    fn snapshot() -> [CiphertextHandle; NUM_COUNTERS] {
        [handle(1), handle(2), handle(3), handle(4)]
    }

    #[test]
    fn same_inputs_same_digest() {
        let a = Commitment::compute(BatchId::new(1), &snapshot(), "coord");
        let b = Commitment::compute(BatchId::new(1), &snapshot(), "coord");
        assert_eq!(a, b);
    }

    #[test]
    fn reordered_snapshot_changes_digest() {
        let a = Commitment::compute(BatchId::new(1), &snapshot(), "coord");
        let reordered = [handle(2), handle(1), handle(3), handle(4)];
        let b = Commitment::compute(BatchId::new(1), &reordered, "coord");
        assert_ne!(a, b);
    }

    #[test]
    fn coordinator_identity_changes_digest() {
        let a = Commitment::compute(BatchId::new(1), &snapshot(), "coord-a");
        let b = Commitment::compute(BatchId::new(1), &snapshot(), "coord-b");
        assert_ne!(a, b);
    }

    #[test]
    fn batch_id_changes_digest() {
        let a = Commitment::compute(BatchId::new(1), &snapshot(), "coord");
        let b = Commitment::compute(BatchId::new(2), &snapshot(), "coord");
        assert_ne!(a, b);
    }

    #[test]
    fn mutated_handle_changes_digest() {
        let a = Commitment::compute(BatchId::new(1), &snapshot(), "coord");
        let mutated = [handle(1), handle(2), handle(3), handle(9)];
        let b = Commitment::compute(BatchId::new(1), &mutated, "coord");
        assert_ne!(a, b);
    }
}
