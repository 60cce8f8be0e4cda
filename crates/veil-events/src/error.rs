// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Rejection taxonomy for every mutating operation on the coordinator.
///
/// Each variant maps to exactly one failure condition; callers receive these
/// synchronously from the actor message that detected them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum CoordinatorError {
    #[error("caller is not authorized for this operation")]
    NotAuthorized,
    #[error("operations are paused")]
    SystemPaused,
    #[error("a batch is already open")]
    BatchAlreadyOpen,
    #[error("no batch is open")]
    BatchNotOpen,
    #[error("the batch is still open")]
    BatchStillOpen,
    #[error("the batch has no submissions to reveal")]
    EmptyBatch,
    #[error("cooldown active until t={retry_at}")]
    CooldownActive { retry_at: u64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("no decryption context exists for this request id")]
    UnknownRequest,
    #[error("decryption request has already been finalized")]
    ReplayDetected,
    #[error("accumulator state does not match the request commitment")]
    StateMismatch,
    #[error("oracle proof failed verification")]
    InvalidProof,
    #[error("cleartext payload is malformed")]
    InvalidCleartexts,
    #[error("store failure: {0}")]
    Store(String),
    #[error("collaborator backend failure: {0}")]
    Backend(String),
}

impl CoordinatorError {
    /// Wrap an infrastructure failure (persistence, serialization) so it can
    /// travel through the same rejection channel as domain errors.
    pub fn store(err: impl Display) -> Self {
        CoordinatorError::Store(err.to_string())
    }

    /// Wrap a failure reported by the homomorphic backend or the oracle.
    pub fn backend(err: impl Display) -> Self {
        CoordinatorError::Backend(err.to_string())
    }
}
