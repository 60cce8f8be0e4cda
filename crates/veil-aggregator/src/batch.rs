// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veil_events::{BatchId, CoordinatorError};
use veil_fhe::{CiphertextHandle, Fhe, NUM_COUNTERS};

/// One encrypted value per revealed metric. Used both for a provider's
/// contribution and for a batch's running totals.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TallySet {
    pub sentiment: CiphertextHandle,
    pub keyword: CiphertextHandle,
    pub poll_option_one: CiphertextHandle,
    pub poll_option_two: CiphertextHandle,
}

impl TallySet {
    /// All four counters at the backend's additive identity.
    pub fn identity(fhe: &Fhe) -> Result<Self, CoordinatorError> {
        Ok(Self {
            sentiment: fhe.identity().map_err(CoordinatorError::backend)?,
            keyword: fhe.identity().map_err(CoordinatorError::backend)?,
            poll_option_one: fhe.identity().map_err(CoordinatorError::backend)?,
            poll_option_two: fhe.identity().map_err(CoordinatorError::backend)?,
        })
    }

    /// Pairwise homomorphic addition.
    pub fn add(&self, fhe: &Fhe, other: &TallySet) -> Result<Self, CoordinatorError> {
        Ok(Self {
            sentiment: fhe
                .add(&self.sentiment, &other.sentiment)
                .map_err(CoordinatorError::backend)?,
            keyword: fhe
                .add(&self.keyword, &other.keyword)
                .map_err(CoordinatorError::backend)?,
            poll_option_one: fhe
                .add(&self.poll_option_one, &other.poll_option_one)
                .map_err(CoordinatorError::backend)?,
            poll_option_two: fhe
                .add(&self.poll_option_two, &other.poll_option_two)
                .map_err(CoordinatorError::backend)?,
        })
    }

    /// The canonical wire order. Commitments, oracle requests and cleartext
    /// decoding all use this order; nothing else may define it.
    pub fn ordered(&self) -> [CiphertextHandle; NUM_COUNTERS] {
        [
            self.sentiment.clone(),
            self.keyword.clone(),
            self.poll_option_one.clone(),
            self.poll_option_two.clone(),
        ]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchRecord {
    pub open: bool,
    pub submission_count: u64,
    pub accumulators: TallySet,
}

/// Batch lifecycle state. At most the latest batch may be open; closed
/// batches are retained so an in-flight decryption context can re-read the
/// exact handles it committed to.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchLedger {
    last_id: u64,
    batches: BTreeMap<u64, BatchRecord>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<(BatchId, &BatchRecord)> {
        self.batches
            .get(&self.last_id)
            .map(|record| (BatchId::new(self.last_id), record))
    }

    pub fn is_open(&self) -> bool {
        self.latest().map(|(_, record)| record.open).unwrap_or(false)
    }

    pub fn record(&self, batch_id: BatchId) -> Option<&BatchRecord> {
        self.batches.get(&batch_id.value())
    }

    /// Assign the next id and start a fresh batch with identity accumulators.
    pub fn open_batch(&mut self, fhe: &Fhe) -> Result<BatchId, CoordinatorError> {
        if self.is_open() {
            return Err(CoordinatorError::BatchAlreadyOpen);
        }
        let batch_id = BatchId::new(self.last_id + 1);
        self.batches.insert(
            batch_id.value(),
            BatchRecord {
                open: true,
                submission_count: 0,
                accumulators: TallySet::identity(fhe)?,
            },
        );
        self.last_id = batch_id.value();
        Ok(batch_id)
    }

    /// Returns the closed batch's id and final submission count.
    pub fn close_batch(&mut self) -> Result<(BatchId, u64), CoordinatorError> {
        let id = self.last_id;
        match self.batches.get_mut(&id) {
            Some(record) if record.open => {
                record.open = false;
                Ok((BatchId::new(id), record.submission_count))
            }
            _ => Err(CoordinatorError::BatchNotOpen),
        }
    }

    /// The only accumulator mutator. Applies the homomorphic add to each of
    /// the four counters and bumps the submission count. Returns the batch id
    /// and the new count.
    pub fn accumulate(
        &mut self,
        fhe: &Fhe,
        contributions: &TallySet,
    ) -> Result<(BatchId, u64), CoordinatorError> {
        let id = self.last_id;
        match self.batches.get_mut(&id) {
            Some(record) if record.open => {
                record.accumulators = record.accumulators.add(fhe, contributions)?;
                record.submission_count += 1;
                Ok((BatchId::new(id), record.submission_count))
            }
            _ => Err(CoordinatorError::BatchNotOpen),
        }
    }

    /// Fault injection: mutate a batch's accumulators regardless of lifecycle
    /// state, bypassing every guard `accumulate` enforces.
    #[cfg(feature = "test-utils")]
    pub fn tamper(
        &mut self,
        fhe: &Fhe,
        batch_id: BatchId,
        contributions: &TallySet,
    ) -> Result<(), CoordinatorError> {
        let record = self
            .batches
            .get_mut(&batch_id.value())
            .ok_or(CoordinatorError::BatchNotOpen)?;
        record.accumulators = record.accumulators.add(fhe, contributions)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use veil_fhe::loopback::LoopbackCipher;

    fn fhe() -> Fhe {
        Fhe::new(Arc::new(LoopbackCipher))
    }

    fn contribution(values: [u64; 4]) -> TallySet {
        TallySet {
            sentiment: LoopbackCipher::encrypt(values[0]),
            keyword: LoopbackCipher::encrypt(values[1]),
            poll_option_one: LoopbackCipher::encrypt(values[2]),
            poll_option_two: LoopbackCipher::encrypt(values[3]),
        }
    }

    fn decrypted(record: &BatchRecord) -> [u64; 4] {
        let handles = record.accumulators.ordered();
        [
            LoopbackCipher::decrypt(&handles[0]).unwrap(),
            LoopbackCipher::decrypt(&handles[1]).unwrap(),
            LoopbackCipher::decrypt(&handles[2]).unwrap(),
            LoopbackCipher::decrypt(&handles[3]).unwrap(),
        ]
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let fhe = fhe();
        let mut ledger = BatchLedger::new();

        let first = ledger.open_batch(&fhe).unwrap();
        ledger.close_batch().unwrap();
        let second = ledger.open_batch(&fhe).unwrap();

        assert_eq!(first, BatchId::new(1));
        assert_eq!(second, BatchId::new(2));
        assert!(ledger.record(first).is_some());
    }

    #[test]
    fn open_while_open_is_rejected() {
        let fhe = fhe();
        let mut ledger = BatchLedger::new();
        ledger.open_batch(&fhe).unwrap();
        assert_eq!(
            ledger.open_batch(&fhe),
            Err(CoordinatorError::BatchAlreadyOpen)
        );
    }

    #[test]
    fn close_and_accumulate_require_open_batch() {
        let fhe = fhe();
        let mut ledger = BatchLedger::new();
        assert_eq!(ledger.close_batch(), Err(CoordinatorError::BatchNotOpen));
        assert_eq!(
            ledger.accumulate(&fhe, &contribution([1, 0, 0, 0])),
            Err(CoordinatorError::BatchNotOpen)
        );

        ledger.open_batch(&fhe).unwrap();
        ledger.close_batch().unwrap();
        assert_eq!(
            ledger.accumulate(&fhe, &contribution([1, 0, 0, 0])),
            Err(CoordinatorError::BatchNotOpen)
        );
    }

    #[test]
    fn accumulate_sums_each_counter() {
        let fhe = fhe();
        let mut ledger = BatchLedger::new();
        let batch_id = ledger.open_batch(&fhe).unwrap();

        ledger.accumulate(&fhe, &contribution([1, 3, 1, 0])).unwrap();
        ledger.accumulate(&fhe, &contribution([1, 3, 1, 0])).unwrap();

        let record = ledger.record(batch_id).unwrap();
        assert_eq!(record.submission_count, 2);
        assert_eq!(decrypted(record), [2, 6, 2, 0]);
    }

    #[test]
    fn reopening_does_not_disturb_closed_batches() {
        let fhe = fhe();
        let mut ledger = BatchLedger::new();
        let first = ledger.open_batch(&fhe).unwrap();
        ledger.accumulate(&fhe, &contribution([5, 0, 0, 0])).unwrap();
        ledger.close_batch().unwrap();

        ledger.open_batch(&fhe).unwrap();
        ledger.accumulate(&fhe, &contribution([9, 9, 9, 9])).unwrap();

        assert_eq!(decrypted(ledger.record(first).unwrap()), [5, 0, 0, 0]);
    }

    proptest! {
        // Real homomorphic schemes guarantee ordering-independence of
        // addition; verify the ledger preserves it for any permutation.
        #[test]
        fn accumulation_is_order_independent(
            values in proptest::collection::vec(proptest::array::uniform4(0u64..1_000_000), 0..8)
        ) {
            let fhe = fhe();
            let mut shuffled = values.clone();
            shuffled.reverse();
            if shuffled.len() > 2 {
                let mid = shuffled.len() / 2;
                shuffled.swap(0, mid);
            }

            let mut a = BatchLedger::new();
            let id_a = a.open_batch(&fhe).unwrap();
            for v in &values {
                a.accumulate(&fhe, &contribution(*v)).unwrap();
            }

            let mut b = BatchLedger::new();
            let id_b = b.open_batch(&fhe).unwrap();
            for v in &shuffled {
                b.accumulate(&fhe, &contribution(*v)).unwrap();
            }

            prop_assert_eq!(
                decrypted(a.record(id_a).unwrap()),
                decrypted(b.record(id_b).unwrap())
            );
        }
    }
}
