// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AccessState, ActionKind, RateLimiter};
use actix::prelude::*;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use veil_data::{AutoPersist, Persistable, Repository};
use veil_events::{
    CooldownChanged, CoordinatorError, EventBus, OwnershipTransferred, PauseChanged, ProviderAdded,
    ProviderRemoved, VeilEvent,
};

/// Everything the registry owns: roles, pause flag and rate-limit records.
/// Persisted as one unit so a gate decision and its recorded timestamp can
/// never be split by a crash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryState {
    pub access: AccessState,
    pub limits: RateLimiter,
}

impl RegistryState {
    pub fn new(owner: &str, cooldown_secs: u64) -> Self {
        Self {
            access: AccessState::new(owner, cooldown_secs),
            limits: RateLimiter::new(),
        }
    }
}

/// Serializes every role check, admin mutation and rate-limit decision.
pub struct Registry {
    bus: Addr<EventBus<VeilEvent>>,
    state: Persistable<RegistryState>,
}

impl Registry {
    pub fn new(bus: &Addr<EventBus<VeilEvent>>, state: Persistable<RegistryState>) -> Self {
        Self {
            bus: bus.clone(),
            state,
        }
    }

    /// Load persisted registry state (or initialize it) and start the actor.
    pub async fn attach(
        bus: &Addr<EventBus<VeilEvent>>,
        repo: Repository<RegistryState>,
        owner: &str,
        cooldown_secs: u64,
    ) -> Result<Addr<Self>> {
        let state = repo
            .load_or_default(RegistryState::new(owner, cooldown_secs))
            .await?;
        Ok(Registry::new(bus, state).start())
    }

    fn read_state(&self) -> Result<RegistryState, CoordinatorError> {
        self.state.try_get().map_err(CoordinatorError::store)
    }
}

impl Actor for Registry {
    type Context = Context<Self>;
}

//////////////////////////////////////////////////////////////////////////////
// Administrative surface
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct TransferOwnership {
    pub caller: String,
    pub new_owner: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct AddProvider {
    pub caller: String,
    pub provider: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct RemoveProvider {
    pub caller: String,
    pub provider: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct SetPaused {
    pub caller: String,
    pub paused: bool,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct SetCooldown {
    pub caller: String,
    pub cooldown_secs: u64,
}

impl Handler<TransferOwnership> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: TransferOwnership, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        let previous_owner = state.access.transfer_ownership(&msg.caller, &msg.new_owner)?;
        self.state.set(state);
        self.bus.do_send(VeilEvent::from(OwnershipTransferred {
            previous_owner,
            new_owner: msg.new_owner,
        }));
        Ok(())
    }
}

impl Handler<AddProvider> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: AddProvider, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        let changed = state.access.add_provider(&msg.caller, &msg.provider)?;
        let num_providers = state.access.num_providers();
        self.state.set(state);
        if changed {
            self.bus.do_send(VeilEvent::from(ProviderAdded {
                provider: msg.provider,
                num_providers,
            }));
        }
        Ok(())
    }
}

impl Handler<RemoveProvider> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: RemoveProvider, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        let changed = state.access.remove_provider(&msg.caller, &msg.provider)?;
        let num_providers = state.access.num_providers();
        self.state.set(state);
        if changed {
            self.bus.do_send(VeilEvent::from(ProviderRemoved {
                provider: msg.provider,
                num_providers,
            }));
        }
        Ok(())
    }
}

impl Handler<SetPaused> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: SetPaused, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        state.access.set_paused(&msg.caller, msg.paused)?;
        self.state.set(state);
        self.bus.do_send(VeilEvent::from(PauseChanged {
            paused: msg.paused,
        }));
        Ok(())
    }
}

impl Handler<SetCooldown> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: SetCooldown, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        let previous_secs = state.access.set_cooldown(&msg.caller, msg.cooldown_secs)?;
        self.state.set(state);
        self.bus.do_send(VeilEvent::from(CooldownChanged {
            previous_secs,
            secs: msg.cooldown_secs,
        }));
        Ok(())
    }
}

//////////////////////////////////////////////////////////////////////////////
// Gates
//////////////////////////////////////////////////////////////////////////////

/// Non-mutating provider check: membership then pause. Used to fail a
/// submission fast, before any cooldown is consumed.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct ProviderCheck {
    pub provider: String,
}

/// Provider gate for a submission: membership, pause, then the submission
/// cooldown. Recording the timestamp happens in the same handler so the
/// check-and-record pair is atomic.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct SubmissionGate {
    pub provider: String,
    pub now: u64,
}

/// Owner gate for a decryption request, including the decryption-request
/// cooldown.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct RequestGate {
    pub caller: String,
    pub now: u64,
}

/// Owner + pause gate for batch lifecycle calls. No rate limiting.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct OwnerGate {
    pub caller: String,
}

impl Handler<ProviderCheck> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: ProviderCheck, _: &mut Self::Context) -> Self::Result {
        let state = self.read_state()?;
        if !state.access.is_provider(&msg.provider) {
            return Err(CoordinatorError::NotAuthorized);
        }
        state.access.ensure_unpaused()?;
        Ok(())
    }
}

impl Handler<SubmissionGate> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: SubmissionGate, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        if !state.access.is_provider(&msg.provider) {
            return Err(CoordinatorError::NotAuthorized);
        }
        state.access.ensure_unpaused()?;
        let cooldown = state.access.cooldown_secs();
        state
            .limits
            .check_and_record(&msg.provider, ActionKind::Submission, msg.now, cooldown)?;
        self.state.set(state);
        Ok(())
    }
}

impl Handler<RequestGate> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: RequestGate, _: &mut Self::Context) -> Self::Result {
        let mut state = self.read_state()?;
        state.access.ensure_owner(&msg.caller)?;
        state.access.ensure_unpaused()?;
        let cooldown = state.access.cooldown_secs();
        state.limits.check_and_record(
            &msg.caller,
            ActionKind::DecryptionRequest,
            msg.now,
            cooldown,
        )?;
        self.state.set(state);
        Ok(())
    }
}

impl Handler<OwnerGate> for Registry {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: OwnerGate, _: &mut Self::Context) -> Self::Result {
        let state = self.read_state()?;
        state.access.ensure_owner(&msg.caller)?;
        state.access.ensure_unpaused()?;
        Ok(())
    }
}

//////////////////////////////////////////////////////////////////////////////
// Inspection
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<AccessState, CoordinatorError>")]
pub struct GetAccess;

impl Handler<GetAccess> for Registry {
    type Result = Result<AccessState, CoordinatorError>;

    fn handle(&mut self, _: GetAccess, _: &mut Self::Context) -> Self::Result {
        Ok(self.read_state()?.access)
    }
}
