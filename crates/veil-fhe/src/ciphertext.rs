// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt;
use veil_utils::ArcBytes;

/// Opaque reference to an encrypted value. The coordinator moves these
/// around, hashes them into commitments and hands them to the backend; it
/// never looks inside.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiphertextHandle(ArcBytes);

impl CiphertextHandle {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ArcBytes::from_bytes(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CiphertextHandle({:?})", self.0)
    }
}

impl From<ArcBytes> for CiphertextHandle {
    fn from(value: ArcBytes) -> Self {
        Self(value)
    }
}
