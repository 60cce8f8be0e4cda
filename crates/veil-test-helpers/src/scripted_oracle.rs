// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Mutex;
use veil_aggregator::DeliverDecryption;
use veil_events::RequestId;
use veil_fhe::{encode_counters, loopback::LoopbackCipher, CiphertextHandle, DecryptionOracle};
use veil_utils::{ArcBytes, SharedRng};

/// Oracle stand-in for tests. Records each request's snapshot, "decrypts" it
/// through the loopback cipher on demand, and signs deliveries with a keyed
/// hash so proof verification has real teeth: any tampered byte fails.
pub struct ScriptedOracle {
    rng: SharedRng,
    secret: [u8; 32],
    requests: Mutex<BTreeMap<RequestId, Vec<CiphertextHandle>>>,
}

impl ScriptedOracle {
    pub fn new(rng: SharedRng) -> Self {
        let secret = {
            let mut rng = rng.lock().expect("rng poisoned");
            let mut bytes = [0u8; 32];
            rand::RngCore::fill_bytes(&mut *rng, &mut bytes);
            bytes
        };
        Self {
            rng,
            secret,
            requests: Mutex::new(BTreeMap::new()),
        }
    }

    fn proof_for(&self, request_id: &RequestId, cleartexts: &[u8]) -> ArcBytes {
        let mut hasher = Sha256::new();
        hasher.update(self.secret);
        hasher.update(request_id.0);
        hasher.update(cleartexts);
        ArcBytes::from_bytes(hasher.finalize().to_vec())
    }

    fn cleartexts_for(&self, request_id: &RequestId) -> Result<Vec<u8>> {
        let requests = self.requests.lock().expect("requests poisoned");
        let handles = requests
            .get(request_id)
            .ok_or_else(|| anyhow!("no request recorded for {}", request_id))?;
        let mut counters = [0u64; 4];
        for (i, handle) in handles.iter().enumerate() {
            counters[i] = LoopbackCipher::decrypt(handle)?;
        }
        Ok(encode_counters(&counters))
    }

    /// A faithful delivery for the recorded snapshot.
    pub fn deliver(&self, request_id: &RequestId) -> Result<DeliverDecryption> {
        let cleartexts = self.cleartexts_for(request_id)?;
        let proof = self.proof_for(request_id, &cleartexts);
        Ok(DeliverDecryption {
            request_id: request_id.clone(),
            cleartexts: ArcBytes::from_bytes(cleartexts),
            proof,
        })
    }

    /// A delivery carrying arbitrary cleartext bytes under a valid proof.
    pub fn deliver_signed(
        &self,
        request_id: &RequestId,
        cleartexts: Vec<u8>,
    ) -> DeliverDecryption {
        let proof = self.proof_for(request_id, &cleartexts);
        DeliverDecryption {
            request_id: request_id.clone(),
            cleartexts: ArcBytes::from_bytes(cleartexts),
            proof,
        }
    }

    /// A delivery whose proof has one bit flipped.
    pub fn deliver_tampered_proof(&self, request_id: &RequestId) -> Result<DeliverDecryption> {
        let mut delivery = self.deliver(request_id)?;
        let mut proof = delivery.proof.to_vec();
        proof[0] ^= 0x01;
        delivery.proof = ArcBytes::from_bytes(proof);
        Ok(delivery)
    }

    /// A delivery with forged counters and a proof that no longer matches.
    pub fn deliver_forged_counters(
        &self,
        request_id: &RequestId,
        counters: [u64; 4],
    ) -> Result<DeliverDecryption> {
        let mut delivery = self.deliver(request_id)?;
        delivery.cleartexts = ArcBytes::from_bytes(encode_counters(&counters));
        Ok(delivery)
    }
}

impl DecryptionOracle for ScriptedOracle {
    fn request_decryption(&self, handles: &[CiphertextHandle]) -> Result<RequestId> {
        let request_id = {
            let mut rng = self.rng.lock().expect("rng poisoned");
            RequestId::generate(&mut *rng)
        };
        self.requests
            .lock()
            .expect("requests poisoned")
            .insert(request_id.clone(), handles.to_vec());
        Ok(request_id)
    }

    fn verify_proof(
        &self,
        request_id: &RequestId,
        cleartexts: &ArcBytes,
        proof: &ArcBytes,
    ) -> bool {
        self.proof_for(request_id, cleartexts) == *proof
    }
}
