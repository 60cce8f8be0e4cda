// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use veil_events::{CoordinatorError, OrderedSet};

/// Owner identity, provider allow-list, pause flag and the global cooldown
/// parameter. All role checks live here; the actor wrapper only sequences
/// access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessState {
    owner: String,
    providers: OrderedSet<String>,
    paused: bool,
    cooldown_secs: u64,
}

impl AccessState {
    pub fn new(owner: &str, cooldown_secs: u64) -> Self {
        Self {
            owner: owner.to_string(),
            providers: OrderedSet::new(),
            paused: false,
            cooldown_secs,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn is_provider(&self, identity: &str) -> bool {
        self.providers.contains(&identity.to_string())
    }

    pub fn num_providers(&self) -> usize {
        self.providers.len()
    }

    pub fn ensure_owner(&self, caller: &str) -> Result<(), CoordinatorError> {
        if caller != self.owner {
            return Err(CoordinatorError::NotAuthorized);
        }
        Ok(())
    }

    pub fn ensure_unpaused(&self) -> Result<(), CoordinatorError> {
        if self.paused {
            return Err(CoordinatorError::SystemPaused);
        }
        Ok(())
    }

    /// Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &str,
        new_owner: &str,
    ) -> Result<String, CoordinatorError> {
        self.ensure_owner(caller)?;
        if new_owner.is_empty() {
            return Err(CoordinatorError::InvalidParameter(
                "new owner must not be empty".to_string(),
            ));
        }
        let previous = std::mem::replace(&mut self.owner, new_owner.to_string());
        Ok(previous)
    }

    /// Returns true when membership actually changed.
    pub fn add_provider(&mut self, caller: &str, provider: &str) -> Result<bool, CoordinatorError> {
        self.ensure_owner(caller)?;
        Ok(self.providers.insert(provider.to_string()))
    }

    /// Returns true when membership actually changed.
    pub fn remove_provider(
        &mut self,
        caller: &str,
        provider: &str,
    ) -> Result<bool, CoordinatorError> {
        self.ensure_owner(caller)?;
        Ok(self.providers.remove(&provider.to_string()))
    }

    pub fn set_paused(&mut self, caller: &str, paused: bool) -> Result<(), CoordinatorError> {
        self.ensure_owner(caller)?;
        self.paused = paused;
        Ok(())
    }

    /// Returns the previous cooldown.
    pub fn set_cooldown(&mut self, caller: &str, secs: u64) -> Result<u64, CoordinatorError> {
        self.ensure_owner(caller)?;
        if secs == 0 {
            return Err(CoordinatorError::InvalidParameter(
                "cooldown must be strictly positive".to_string(),
            ));
        }
        let previous = std::mem::replace(&mut self.cooldown_secs, secs);
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AccessState {
        AccessState::new("owner", 60)
    }

    #[test]
    fn only_owner_may_administer() {
        let mut state = state();
        assert_eq!(
            state.add_provider("mallory", "p1"),
            Err(CoordinatorError::NotAuthorized)
        );
        assert_eq!(
            state.set_paused("mallory", true),
            Err(CoordinatorError::NotAuthorized)
        );
        assert_eq!(
            state.transfer_ownership("mallory", "mallory"),
            Err(CoordinatorError::NotAuthorized)
        );
    }

    #[test]
    fn provider_mutation_is_idempotent() {
        let mut state = state();
        assert!(state.add_provider("owner", "p1").unwrap());
        assert!(!state.add_provider("owner", "p1").unwrap());
        assert!(state.remove_provider("owner", "p1").unwrap());
        assert!(!state.remove_provider("owner", "p1").unwrap());
    }

    #[test]
    fn ownership_transfer_moves_control() {
        let mut state = state();
        let previous = state.transfer_ownership("owner", "alice").unwrap();
        assert_eq!(previous, "owner");
        assert_eq!(
            state.add_provider("owner", "p1"),
            Err(CoordinatorError::NotAuthorized)
        );
        assert!(state.add_provider("alice", "p1").unwrap());
    }

    #[test]
    fn zero_cooldown_is_invalid() {
        let mut state = state();
        assert!(matches!(
            state.set_cooldown("owner", 0),
            Err(CoordinatorError::InvalidParameter(_))
        ));
        assert_eq!(state.set_cooldown("owner", 30).unwrap(), 60);
    }

    #[test]
    fn pause_blocks_unpaused_check() {
        let mut state = state();
        assert!(state.ensure_unpaused().is_ok());
        state.set_paused("owner", true).unwrap();
        assert_eq!(state.ensure_unpaused(), Err(CoordinatorError::SystemPaused));
    }
}
