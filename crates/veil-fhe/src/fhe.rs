// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use anyhow::Result;
use std::sync::Arc;

/// The two homomorphic primitives the coordinator needs from an encryption
/// backend. Everything else about the scheme stays on the other side of this
/// trait.
pub trait HomomorphicBackend: Send + Sync {
    /// The additive identity — a fresh accumulator starts here.
    fn identity(&self) -> Result<CiphertextHandle>;
    /// Homomorphic addition of two ciphertexts.
    fn add(&self, a: &CiphertextHandle, b: &CiphertextHandle) -> Result<CiphertextHandle>;
}

/// Fhe backend adaptor.
#[derive(Clone)]
pub struct Fhe {
    backend: Arc<dyn HomomorphicBackend>,
}

impl Fhe {
    pub fn new(backend: Arc<dyn HomomorphicBackend>) -> Self {
        Self { backend }
    }

    pub fn identity(&self) -> Result<CiphertextHandle> {
        self.backend.identity()
    }

    pub fn add(&self, a: &CiphertextHandle, b: &CiphertextHandle) -> Result<CiphertextHandle> {
        self.backend.add(a, b)
    }
}
