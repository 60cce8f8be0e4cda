// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Commitment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veil_events::{BatchId, CoordinatorError, RequestId};

/// Bookkeeping for one outstanding decryption request. `processed` flips to
/// true exactly once; a processed context is never touched again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecryptionContext {
    pub batch_id: BatchId,
    pub commitment: Commitment,
    pub processed: bool,
}

/// All decryption contexts ever created, keyed by oracle request id.
/// Finalized contexts are retained indefinitely: they are the replay
/// detector and the audit trail.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DecryptionContexts(BTreeMap<RequestId, DecryptionContext>);

impl DecryptionContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, request_id: &RequestId) -> Option<&DecryptionContext> {
        self.0.get(request_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Register a context for a request id the oracle just issued. The oracle
    /// contract guarantees uniqueness; a collision means the collaborator is
    /// broken, not the caller.
    pub fn insert_fresh(
        &mut self,
        request_id: RequestId,
        batch_id: BatchId,
        commitment: Commitment,
    ) -> Result<(), CoordinatorError> {
        if self.0.contains_key(&request_id) {
            return Err(CoordinatorError::Backend(format!(
                "oracle reissued request id {}",
                request_id
            )));
        }
        self.0.insert(
            request_id,
            DecryptionContext {
                batch_id,
                commitment,
                processed: false,
            },
        );
        Ok(())
    }

    /// The irreversible `false -> true` transition.
    pub fn mark_processed(&mut self, request_id: &RequestId) -> Result<(), CoordinatorError> {
        let context = self
            .0
            .get_mut(request_id)
            .ok_or(CoordinatorError::UnknownRequest)?;
        if context.processed {
            return Err(CoordinatorError::ReplayDetected);
        }
        context.processed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn commitment() -> Commitment {
        let handles = [
            veil_fhe::CiphertextHandle::from_bytes(vec![1]),
            veil_fhe::CiphertextHandle::from_bytes(vec![2]),
            veil_fhe::CiphertextHandle::from_bytes(vec![3]),
            veil_fhe::CiphertextHandle::from_bytes(vec![4]),
        ];
        Commitment::compute(BatchId::new(1), &handles, "coord")
    }

    #[test]
    fn processes_exactly_once() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let id = RequestId::generate(&mut rng);
        let mut contexts = DecryptionContexts::new();
        contexts
            .insert_fresh(id.clone(), BatchId::new(1), commitment())
            .unwrap();

        assert!(contexts.mark_processed(&id).is_ok());
        assert_eq!(
            contexts.mark_processed(&id),
            Err(CoordinatorError::ReplayDetected)
        );
    }

    #[test]
    fn unknown_request_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let id = RequestId::generate(&mut rng);
        let mut contexts = DecryptionContexts::new();
        assert_eq!(
            contexts.mark_processed(&id),
            Err(CoordinatorError::UnknownRequest)
        );
    }

    #[test]
    fn duplicate_request_id_is_a_backend_fault() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let id = RequestId::generate(&mut rng);
        let mut contexts = DecryptionContexts::new();
        contexts
            .insert_fresh(id.clone(), BatchId::new(1), commitment())
            .unwrap();
        assert!(matches!(
            contexts.insert_fresh(id, BatchId::new(2), commitment()),
            Err(CoordinatorError::Backend(_))
        ));
    }
}
