// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::time::Duration;
use tokio::time::sleep;
use veil_aggregator::{
    CloseBatch, OpenBatch, RequestDecryption, Submit, TamperBatch,
};
use veil_events::{BatchId, CoordinatorError, GetErrors, GetEvents, RequestId};
use veil_registry::{AddProvider, SetPaused};
use veil_test_helpers::{
    completed_events, contribution, init_test_tracing, setup_system, SystemParams, TestSystem,
};

const OWNER: &str = "owner";

async fn system() -> Result<TestSystem> {
    init_test_tracing();
    setup_system(SystemParams::default()).await
}

/// Open a batch, run the given submissions through it and close it again.
/// Returns the batch id.
async fn run_batch(
    system: &TestSystem,
    submissions: &[(&str, [u64; 4], u64)],
) -> Result<BatchId> {
    let batch_id = system
        .coordinator
        .send(OpenBatch {
            caller: OWNER.to_string(),
        })
        .await??;
    for (provider, values, now) in submissions {
        system
            .coordinator
            .send(Submit {
                provider: provider.to_string(),
                contributions: contribution(*values),
                now: *now,
            })
            .await??;
    }
    system
        .coordinator
        .send(CloseBatch {
            caller: OWNER.to_string(),
        })
        .await??;
    Ok(batch_id)
}

async fn request(system: &TestSystem, now: u64) -> Result<RequestId> {
    Ok(system
        .coordinator
        .send(RequestDecryption {
            caller: OWNER.to_string(),
            now,
        })
        .await??)
}

#[actix::test]
async fn tampered_accumulators_fail_the_commitment_check() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    let batch_id = run_batch(&system, &[("p1", [1, 2, 3, 4], 100)]).await?;
    let request_id = request(&system, 200).await?;

    // mutate the closed batch behind the coordinator's guards
    system
        .coordinator
        .send(TamperBatch {
            batch_id,
            contributions: contribution([1, 0, 0, 0]),
        })
        .await??;

    let delivery = system.oracle.deliver(&request_id)?;
    let rejected = system.coordinator.send(delivery).await?;
    assert_eq!(rejected, Err(CoordinatorError::StateMismatch));

    // the rejection is surfaced on the bus for observers
    sleep(Duration::from_millis(20)).await;
    let errors = system.errors.send(GetErrors::new()).await?;
    assert_eq!(errors.len(), 1);

    // undo the tampering (loopback addition wraps); the context is still
    // pending, so the same request id can now finalize
    system
        .coordinator
        .send(TamperBatch {
            batch_id,
            contributions: contribution([u64::MAX, 0, 0, 0]),
        })
        .await??;

    let delivery = system.oracle.deliver(&request_id)?;
    system.coordinator.send(delivery).await??;

    sleep(Duration::from_millis(20)).await;
    let completed = completed_events(&system.history.send(GetEvents::new()).await?);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].sentiment, 1);
    Ok(())
}

#[actix::test]
async fn invalid_proof_leaves_context_retryable() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    run_batch(&system, &[("p1", [5, 0, 0, 0], 100)]).await?;
    let request_id = request(&system, 200).await?;

    let tampered = system.oracle.deliver_tampered_proof(&request_id)?;
    let rejected = system.coordinator.send(tampered).await?;
    assert_eq!(rejected, Err(CoordinatorError::InvalidProof));

    // a legitimate retry of the same request id succeeds
    let honest = system.oracle.deliver(&request_id)?;
    system.coordinator.send(honest).await??;
    Ok(())
}

#[actix::test]
async fn forged_counters_fail_proof_verification() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    run_batch(&system, &[("p1", [5, 0, 0, 0], 100)]).await?;
    let request_id = request(&system, 200).await?;

    let forged = system
        .oracle
        .deliver_forged_counters(&request_id, [999, 999, 999, 999])?;
    let rejected = system.coordinator.send(forged).await?;
    assert_eq!(rejected, Err(CoordinatorError::InvalidProof));
    Ok(())
}

#[actix::test]
async fn malformed_cleartexts_are_rejected() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    run_batch(&system, &[("p1", [5, 0, 0, 0], 100)]).await?;
    let request_id = request(&system, 200).await?;

    // correctly signed, wrong shape
    let short = system.oracle.deliver_signed(&request_id, vec![0u8; 16]);
    let rejected = system.coordinator.send(short).await?;
    assert_eq!(rejected, Err(CoordinatorError::InvalidCleartexts));
    Ok(())
}

#[actix::test]
async fn unknown_request_id_is_rejected() -> Result<()> {
    let system = system().await?;

    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let unknown = RequestId::generate(&mut rng);
    let delivery = system.oracle.deliver_signed(&unknown, vec![0u8; 32]);

    let rejected = system.coordinator.send(delivery).await?;
    assert_eq!(rejected, Err(CoordinatorError::UnknownRequest));
    Ok(())
}

#[actix::test]
async fn outstanding_requests_finalize_independently() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    // first batch goes out for decryption...
    let first_batch = run_batch(&system, &[("p1", [1, 1, 1, 1], 100)]).await?;
    let first_request = request(&system, 1000).await?;

    // ...while a second batch is opened, filled and also sent out
    let second_batch = run_batch(&system, &[("p1", [7, 0, 0, 0], 200)]).await?;
    let second_request = request(&system, 2000).await?;

    // deliveries arrive out of order
    system
        .coordinator
        .send(system.oracle.deliver(&second_request)?)
        .await??;
    system
        .coordinator
        .send(system.oracle.deliver(&first_request)?)
        .await??;

    sleep(Duration::from_millis(20)).await;
    let completed = completed_events(&system.history.send(GetEvents::new()).await?);
    assert_eq!(completed.len(), 2);

    let first = completed
        .iter()
        .find(|c| c.batch_id == first_batch)
        .expect("first batch result");
    assert_eq!(
        (first.sentiment, first.keyword, first.poll_option_one, first.poll_option_two),
        (1, 1, 1, 1)
    );

    let second = completed
        .iter()
        .find(|c| c.batch_id == second_batch)
        .expect("second batch result");
    assert_eq!(second.sentiment, 7);
    Ok(())
}

#[actix::test]
async fn re_requesting_a_batch_creates_an_independent_context() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    run_batch(&system, &[("p1", [3, 0, 0, 0], 100)]).await?;

    let first_request = request(&system, 1000).await?;
    let second_request = request(&system, 2000).await?;
    assert_ne!(first_request, second_request);

    // finalizing one context does not consume the other
    system
        .coordinator
        .send(system.oracle.deliver(&first_request)?)
        .await??;
    let replay = system
        .coordinator
        .send(system.oracle.deliver(&first_request)?)
        .await?;
    assert_eq!(replay, Err(CoordinatorError::ReplayDetected));

    system
        .coordinator
        .send(system.oracle.deliver(&second_request)?)
        .await??;
    Ok(())
}

#[actix::test]
async fn pause_does_not_block_delivery() -> Result<()> {
    let system = system().await?;
    system
        .registry
        .send(AddProvider {
            caller: OWNER.to_string(),
            provider: "p1".to_string(),
        })
        .await??;

    run_batch(&system, &[("p1", [4, 0, 0, 0], 100)]).await?;
    let request_id = request(&system, 200).await?;

    system
        .registry
        .send(SetPaused {
            caller: OWNER.to_string(),
            paused: true,
        })
        .await??;

    // a new request is blocked by pause...
    let blocked = system
        .coordinator
        .send(RequestDecryption {
            caller: OWNER.to_string(),
            now: 500,
        })
        .await?;
    assert_eq!(blocked, Err(CoordinatorError::SystemPaused));

    // ...but the in-flight response still finalizes
    system
        .coordinator
        .send(system.oracle.deliver(&request_id)?)
        .await??;
    Ok(())
}
