// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rand::RngCore;
use veil_aggregator::TallySet;
use veil_events::{DecryptionCompleted, Event, VeilEvent};
use veil_fhe::loopback::LoopbackCipher;
use veil_utils::SharedRng;

/// A provider contribution in the canonical counter order
/// `[sentiment, keyword, poll_option_one, poll_option_two]`.
pub fn contribution(values: [u64; 4]) -> TallySet {
    TallySet {
        sentiment: LoopbackCipher::encrypt(values[0]),
        keyword: LoopbackCipher::encrypt(values[1]),
        poll_option_one: LoopbackCipher::encrypt(values[2]),
        poll_option_two: LoopbackCipher::encrypt(values[3]),
    }
}

/// A random 20-byte hex address.
pub fn rand_addr(rng: &SharedRng) -> String {
    let mut rng = rng.lock().expect("rng poisoned");
    let mut bytes = [0u8; 20];
    rng.fill_bytes(&mut bytes);
    format!("0x{}", hex::encode(bytes))
}

/// Pull the `DecryptionCompleted` payloads out of an event history.
pub fn completed_events(events: &[VeilEvent]) -> Vec<DecryptionCompleted> {
    events
        .iter()
        .filter_map(|event| match event {
            VeilEvent::DecryptionCompleted { data, .. } => Some(data.clone()),
            _ => None,
        })
        .collect()
}

/// The event type names in arrival order.
pub fn event_types(events: &[VeilEvent]) -> Vec<String> {
    events.iter().map(|event| event.event_type()).collect()
}

/// Install a test tracing subscriber once per process. Safe to call from
/// every test.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
