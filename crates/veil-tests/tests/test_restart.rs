// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use veil_aggregator::{CloseBatch, OpenBatch, RequestDecryption, Submit};
use veil_events::{CoordinatorError, GetEvents};
use veil_registry::{AddProvider, SubmissionGate};
use veil_test_helpers::{
    completed_events, contribution, init_test_tracing, restart_system, setup_system, SystemParams,
    TestSystem,
};

const OWNER: &str = "owner";

fn params() -> SystemParams {
    SystemParams::default()
}

async fn prepare_outstanding_request(system: &TestSystem) -> Result<veil_events::RequestId> {
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;
    system
        .coordinator
        .send(OpenBatch {
            caller: OWNER.to_string(),
        })
        .await??;
    system
        .coordinator
        .send(Submit {
            provider: "p1".to_string(),
            contributions: contribution([2, 4, 0, 1]),
            now: 100,
        })
        .await??;
    system
        .coordinator
        .send(CloseBatch {
            caller: OWNER.to_string(),
        })
        .await??;
    Ok(system
        .coordinator
        .send(RequestDecryption {
            caller: OWNER.to_string(),
            now: 200,
        })
        .await??)
}

#[actix::test]
async fn outstanding_request_survives_restart() -> Result<()> {
    init_test_tracing();
    let system = setup_system(params()).await?;
    let request_id = prepare_outstanding_request(&system).await?;

    // writes are fire-and-forget; let them land before dumping the store
    sleep(Duration::from_millis(20)).await;
    let restarted = restart_system(params(), &system).await?;

    // the rebuilt coordinator recomputes the same commitment and finalizes
    let delivery = restarted.oracle.deliver(&request_id)?;
    restarted.coordinator.send(delivery).await??;

    sleep(Duration::from_millis(20)).await;
    let completed = completed_events(&restarted.history.send(GetEvents::new()).await?);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].sentiment, 2);
    assert_eq!(completed[0].keyword, 4);
    assert_eq!(completed[0].poll_option_two, 1);
    Ok(())
}

#[actix::test]
async fn replay_is_detected_across_restarts() -> Result<()> {
    init_test_tracing();
    let system = setup_system(params()).await?;
    let request_id = prepare_outstanding_request(&system).await?;

    let delivery = system.oracle.deliver(&request_id)?;
    system.coordinator.send(delivery.clone()).await??;

    sleep(Duration::from_millis(20)).await;
    let restarted = restart_system(params(), &system).await?;

    let replay = restarted.coordinator.send(delivery).await?;
    assert_eq!(replay, Err(CoordinatorError::ReplayDetected));
    Ok(())
}

#[actix::test]
async fn rate_limit_records_survive_restart() -> Result<()> {
    init_test_tracing();
    let system = setup_system(params()).await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;
    system
        .registry
        .send(SubmissionGate {
            provider: "p1".to_string(),
            now: 1000,
        })
        .await??;

    sleep(Duration::from_millis(20)).await;
    let restarted = restart_system(params(), &system).await?;

    let gate = restarted
        .registry
        .send(SubmissionGate {
            provider: "p1".to_string(),
            now: 1030,
        })
        .await?;
    assert_eq!(
        gate,
        Err(CoordinatorError::CooldownActive { retry_at: 1060 })
    );
    Ok(())
}
