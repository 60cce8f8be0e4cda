// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veil_events::CoordinatorError;

/// The two independently rate-limited actions. A provider flooding
/// submissions does not throttle the owner's decryption requests and vice
/// versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Submission,
    DecryptionRequest,
}

/// Per-identity, per-action-kind last-action timestamps. Timestamps are unix
/// seconds and monotonically non-decreasing per (identity, kind).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RateLimiter {
    submission: BTreeMap<String, u64>,
    decryption: BTreeMap<String, u64>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&mut self, kind: ActionKind) -> &mut BTreeMap<String, u64> {
        match kind {
            ActionKind::Submission => &mut self.submission,
            ActionKind::DecryptionRequest => &mut self.decryption,
        }
    }

    pub fn last(&self, identity: &str, kind: ActionKind) -> Option<u64> {
        match kind {
            ActionKind::Submission => self.submission.get(identity).copied(),
            ActionKind::DecryptionRequest => self.decryption.get(identity).copied(),
        }
    }

    /// Fails while the cooldown window is still open; otherwise records `now`
    /// and succeeds. Check and record are one operation so two callers can
    /// never both pass before either records.
    pub fn check_and_record(
        &mut self,
        identity: &str,
        kind: ActionKind,
        now: u64,
        cooldown_secs: u64,
    ) -> Result<(), CoordinatorError> {
        let records = self.records(kind);
        if let Some(last) = records.get(identity) {
            let retry_at = last.saturating_add(cooldown_secs);
            if now < retry_at {
                return Err(CoordinatorError::CooldownActive { retry_at });
            }
        }
        records.insert(identity.to_string(), now);
        Ok(())
    }
}
