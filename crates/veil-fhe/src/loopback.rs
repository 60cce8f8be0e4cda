// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Loopback homomorphic backend. Carries a plaintext u64 counter through the
//! opaque handle interface so the whole coordinator can be exercised without
//! a real encryption scheme. Provides no confidentiality whatsoever.

use crate::{CiphertextHandle, HomomorphicBackend};
use anyhow::{bail, Result};

/// Marker so a loopback handle is never mistaken for a real ciphertext.
const TAG: &[u8; 3] = b"lb:";

pub struct LoopbackCipher;

impl LoopbackCipher {
    pub fn encrypt(value: u64) -> CiphertextHandle {
        let mut bytes = TAG.to_vec();
        bytes.extend_from_slice(&value.to_le_bytes());
        CiphertextHandle::from_bytes(bytes)
    }

    pub fn decrypt(handle: &CiphertextHandle) -> Result<u64> {
        let bytes = handle.bytes();
        if bytes.len() != TAG.len() + 8 || &bytes[..TAG.len()] != TAG {
            bail!("not a loopback ciphertext");
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[TAG.len()..]);
        Ok(u64::from_le_bytes(buf))
    }
}

impl HomomorphicBackend for LoopbackCipher {
    fn identity(&self) -> Result<CiphertextHandle> {
        Ok(Self::encrypt(0))
    }

    fn add(&self, a: &CiphertextHandle, b: &CiphertextHandle) -> Result<CiphertextHandle> {
        let sum = Self::decrypt(a)?.wrapping_add(Self::decrypt(b)?);
        Ok(Self::encrypt(sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_homomorphic() -> Result<()> {
        let backend = LoopbackCipher;
        let sum = backend.add(&LoopbackCipher::encrypt(2), &LoopbackCipher::encrypt(40))?;
        assert_eq!(LoopbackCipher::decrypt(&sum)?, 42);
        Ok(())
    }

    #[test]
    fn identity_is_zero() -> Result<()> {
        let backend = LoopbackCipher;
        let id = backend.identity()?;
        assert_eq!(LoopbackCipher::decrypt(&id)?, 0);

        let x = LoopbackCipher::encrypt(7);
        let sum = backend.add(&id, &x)?;
        assert_eq!(LoopbackCipher::decrypt(&sum)?, 7);
        Ok(())
    }

    #[test]
    fn rejects_foreign_bytes() {
        let handle = CiphertextHandle::from_bytes(vec![1, 2, 3]);
        assert!(LoopbackCipher::decrypt(&handle).is_err());
    }
}
