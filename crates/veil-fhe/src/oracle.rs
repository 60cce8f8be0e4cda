// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use anyhow::Result;
use veil_events::RequestId;
use veil_utils::ArcBytes;

/// External decryption service. `request_decryption` is fire-and-forget: it
/// returns the oracle-issued request id and the cleartexts arrive later
/// through the coordinator's delivery message, carrying a proof this trait
/// also verifies.
pub trait DecryptionOracle: Send + Sync {
    /// Hand the ordered snapshot to the oracle; returns a fresh unique id.
    fn request_decryption(&self, handles: &[CiphertextHandle]) -> Result<RequestId>;

    /// Check that `proof` authenticates `cleartexts` for `request_id`.
    fn verify_proof(&self, request_id: &RequestId, cleartexts: &ArcBytes, proof: &ArcBytes)
        -> bool;
}
