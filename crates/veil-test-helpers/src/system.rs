// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ScriptedOracle;
use actix::{Actor, Addr};
use anyhow::Result;
use std::sync::Arc;
use veil_aggregator::{
    ContextsRepositoryFactory, DecryptionCoordinator, DecryptionCoordinatorParams,
    LedgerRepositoryFactory,
};
use veil_config::CoordinatorConfig;
use veil_data::{DataStore, GetDump, InMemStore, RepositoriesFactory};
use veil_events::{
    new_event_bus_with_history, EventBus, HistoryCollector, VeilEvent,
};
use veil_fhe::{loopback::LoopbackCipher, Fhe};
use veil_logger::SimpleLogger;
use veil_registry::{Registry, RegistryRepositoryFactory};
use veil_utils::shared_rng_from_u64;

/// A fully wired coordinator over an in-memory store and the scripted
/// oracle. `history` sees every event, `errors` only error events.
pub struct TestSystem {
    pub bus: Addr<EventBus<VeilEvent>>,
    pub history: Addr<HistoryCollector<VeilEvent>>,
    pub errors: Addr<HistoryCollector<VeilEvent>>,
    pub store: Addr<InMemStore>,
    pub registry: Addr<Registry>,
    pub coordinator: Addr<DecryptionCoordinator>,
    pub oracle: Arc<ScriptedOracle>,
    pub fhe: Fhe,
}

pub struct SystemParams {
    pub owner: String,
    pub cooldown_secs: u64,
    pub identity: String,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            cooldown_secs: 60,
            identity: "coordinator-test".to_string(),
        }
    }
}

impl From<&CoordinatorConfig> for SystemParams {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            owner: config.initial_owner.clone(),
            cooldown_secs: config.cooldown_secs,
            identity: config.identity.clone(),
        }
    }
}

/// Build a fresh system with an empty store.
pub async fn setup_system(params: SystemParams) -> Result<TestSystem> {
    let oracle = Arc::new(ScriptedOracle::new(shared_rng_from_u64(42)));
    let store = InMemStore::new(true).start();
    attach_system(params, store, oracle).await
}

/// Rebuild every actor over a dump of the given system's store. Simulates a
/// process restart: the oracle (an external service) survives as-is, all
/// coordinator state must come back from persistence.
pub async fn restart_system(params: SystemParams, previous: &TestSystem) -> Result<TestSystem> {
    let dump = previous.store.send(GetDump).await??;
    let store = InMemStore::from_dump(dump, true)?.start();
    attach_system(params, store, previous.oracle.clone()).await
}

async fn attach_system(
    params: SystemParams,
    store: Addr<InMemStore>,
    oracle: Arc<ScriptedOracle>,
) -> Result<TestSystem> {
    let (bus, history) = new_event_bus_with_history::<VeilEvent>();
    let errors = EventBus::error(&bus);
    SimpleLogger::attach(&params.identity, bus.clone());

    let repositories = DataStore::from(&store).repositories();
    let registry = Registry::attach(
        &bus,
        repositories.registry(),
        &params.owner,
        params.cooldown_secs,
    )
    .await?;

    let fhe = Fhe::new(Arc::new(LoopbackCipher));
    let coordinator = DecryptionCoordinator::attach(
        DecryptionCoordinatorParams {
            fhe: fhe.clone(),
            oracle: oracle.clone(),
            bus: bus.clone(),
            registry: registry.clone(),
            identity: params.identity.clone(),
        },
        repositories.ledger(),
        repositories.contexts(),
    )
    .await?;

    Ok(TestSystem {
        bus,
        history,
        errors,
        store,
        registry,
        coordinator,
        oracle,
        fhe,
    })
}
