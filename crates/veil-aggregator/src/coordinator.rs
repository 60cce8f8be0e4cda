// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BatchLedger, BatchRecord, Commitment, DecryptionContexts, TallySet};
use actix::prelude::*;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;
use veil_data::{AutoPersist, Persistable, Repository};
use veil_events::{
    BatchClosed, BatchId, BatchOpened, CoordinatorError, DecryptionCompleted, DecryptionRequested,
    ErrorEvent, EventBus, RequestId, SubmissionReceived, VeilErrorType, VeilEvent,
};
use veil_fhe::{decode_counters, DecryptionOracle, Fhe};
use veil_registry::{OwnerGate, ProviderCheck, Registry, RequestGate, SubmissionGate};
use veil_utils::ArcBytes;

/// Owns the batch ledger and every decryption context. Submissions are
/// serialized through this actor's mailbox; the only await inside a mutating
/// handler is the registry gate, and ledger state is re-read in the actor
/// continuation afterwards, so no two submissions can interleave a
/// read-modify-write on the accumulators.
pub struct DecryptionCoordinator {
    fhe: Fhe,
    oracle: Arc<dyn DecryptionOracle>,
    bus: Addr<EventBus<VeilEvent>>,
    registry: Addr<Registry>,
    identity: String,
    ledger: Persistable<BatchLedger>,
    contexts: Persistable<DecryptionContexts>,
}

pub struct DecryptionCoordinatorParams {
    pub fhe: Fhe,
    pub oracle: Arc<dyn DecryptionOracle>,
    pub bus: Addr<EventBus<VeilEvent>>,
    pub registry: Addr<Registry>,
    /// Identity string bound into every commitment this instance issues.
    pub identity: String,
}

impl DecryptionCoordinator {
    pub fn new(
        params: DecryptionCoordinatorParams,
        ledger: Persistable<BatchLedger>,
        contexts: Persistable<DecryptionContexts>,
    ) -> Self {
        Self {
            fhe: params.fhe,
            oracle: params.oracle,
            bus: params.bus,
            registry: params.registry,
            identity: params.identity,
            ledger,
            contexts,
        }
    }

    /// Load persisted ledger and context state (or initialize both) and start
    /// the actor. A coordinator restarted between a decryption request and
    /// its delivery picks up exactly where it left off.
    pub async fn attach(
        params: DecryptionCoordinatorParams,
        ledger_repo: Repository<BatchLedger>,
        contexts_repo: Repository<DecryptionContexts>,
    ) -> Result<Addr<Self>> {
        let ledger = ledger_repo.load_or_default(BatchLedger::new()).await?;
        let contexts = contexts_repo
            .load_or_default(DecryptionContexts::new())
            .await?;
        Ok(Self::new(params, ledger, contexts).start())
    }

    fn read_ledger(&self) -> Result<BatchLedger, CoordinatorError> {
        self.ledger.try_get().map_err(CoordinatorError::store)
    }

    fn read_contexts(&self) -> Result<DecryptionContexts, CoordinatorError> {
        self.contexts.try_get().map_err(CoordinatorError::store)
    }
}

impl Actor for DecryptionCoordinator {
    type Context = Context<Self>;
}

//////////////////////////////////////////////////////////////////////////////
// Batch lifecycle
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchId, CoordinatorError>")]
pub struct OpenBatch {
    pub caller: String,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<BatchId, CoordinatorError>")]
pub struct CloseBatch {
    pub caller: String,
}

impl Handler<OpenBatch> for DecryptionCoordinator {
    type Result = ResponseActFuture<Self, Result<BatchId, CoordinatorError>>;

    fn handle(&mut self, msg: OpenBatch, _: &mut Self::Context) -> Self::Result {
        Box::pin(
            self.registry
                .send(OwnerGate { caller: msg.caller })
                .into_actor(self)
                .map(|res, act, _| {
                    res.map_err(CoordinatorError::store)??;
                    let mut ledger = act.read_ledger()?;
                    let batch_id = ledger.open_batch(&act.fhe)?;
                    act.ledger.set(ledger);
                    act.bus.do_send(VeilEvent::from(BatchOpened { batch_id }));
                    Ok(batch_id)
                }),
        )
    }
}

impl Handler<CloseBatch> for DecryptionCoordinator {
    type Result = ResponseActFuture<Self, Result<BatchId, CoordinatorError>>;

    fn handle(&mut self, msg: CloseBatch, _: &mut Self::Context) -> Self::Result {
        Box::pin(
            self.registry
                .send(OwnerGate { caller: msg.caller })
                .into_actor(self)
                .map(|res, act, _| {
                    res.map_err(CoordinatorError::store)??;
                    let mut ledger = act.read_ledger()?;
                    let (batch_id, submission_count) = ledger.close_batch()?;
                    act.ledger.set(ledger);
                    act.bus.do_send(VeilEvent::from(BatchClosed {
                        batch_id,
                        submission_count,
                    }));
                    Ok(batch_id)
                }),
        )
    }
}

//////////////////////////////////////////////////////////////////////////////
// Submission processing
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct Submit {
    pub provider: String,
    pub contributions: TallySet,
    pub now: u64,
}

impl Handler<Submit> for DecryptionCoordinator {
    type Result = ResponseActFuture<Self, Result<(), CoordinatorError>>;

    /// Gate order follows the submission contract: provider membership,
    /// pause, batch state, cooldown, then the accumulator mutation. The
    /// cooldown is only recorded once every earlier gate has passed, so a
    /// doomed submission never consumes the provider's timer.
    fn handle(&mut self, msg: Submit, _: &mut Self::Context) -> Self::Result {
        let Submit {
            provider,
            contributions,
            now,
        } = msg;

        let check = self.registry.send(ProviderCheck {
            provider: provider.clone(),
        });

        Box::pin(check.into_actor(self).then(move |res, act, _| {
            let checked: Result<(), CoordinatorError> =
                res.map_err(CoordinatorError::store).and_then(|gate| gate);
            if let Err(err) = checked {
                return Box::pin(fut::ready(Err(err)))
                    as ResponseActFuture<DecryptionCoordinator, Result<(), CoordinatorError>>;
            }

            let open = match act.read_ledger() {
                Ok(ledger) => ledger.is_open(),
                Err(err) => return Box::pin(fut::ready(Err(err))),
            };
            if !open {
                return Box::pin(fut::ready(Err(CoordinatorError::BatchNotOpen)));
            }

            // SubmissionGate re-validates membership and pause so a provider
            // removed while this message was in flight cannot slip through.
            let gate = act.registry.send(SubmissionGate {
                provider: provider.clone(),
                now,
            });
            Box::pin(gate.into_actor(act).map(move |res, act, _| {
                res.map_err(CoordinatorError::store)??;
                // State may have moved while the gate was in flight;
                // accumulate re-checks that the batch is still open.
                let mut ledger = act.read_ledger()?;
                let (batch_id, submission_count) = ledger.accumulate(&act.fhe, &contributions)?;
                act.ledger.set(ledger);
                act.bus.do_send(VeilEvent::from(SubmissionReceived {
                    batch_id,
                    provider,
                    submission_count,
                }));
                Ok(())
            }))
        }))
    }
}

//////////////////////////////////////////////////////////////////////////////
// Decryption round trip
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<RequestId, CoordinatorError>")]
pub struct RequestDecryption {
    pub caller: String,
    pub now: u64,
}

/// Inbound delivery from the oracle. Not rate limited and not blocked by
/// pause: a response already in flight must remain finalizable.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct DeliverDecryption {
    pub request_id: RequestId,
    pub cleartexts: ArcBytes,
    pub proof: ArcBytes,
}

impl Handler<RequestDecryption> for DecryptionCoordinator {
    type Result = ResponseActFuture<Self, Result<RequestId, CoordinatorError>>;

    /// Owner first, then batch state, then the request cooldown; the cooldown
    /// is only recorded for a request that would otherwise go out.
    fn handle(&mut self, msg: RequestDecryption, _: &mut Self::Context) -> Self::Result {
        let RequestDecryption { caller, now } = msg;

        let check = self.registry.send(OwnerGate {
            caller: caller.clone(),
        });

        Box::pin(check.into_actor(self).then(move |res, act, _| {
            let checked: Result<(), CoordinatorError> =
                res.map_err(CoordinatorError::store).and_then(|gate| gate);
            if let Err(err) = checked {
                return Box::pin(fut::ready(Err(err)))
                    as ResponseActFuture<DecryptionCoordinator, Result<RequestId, CoordinatorError>>;
            }

            let precheck = act.read_ledger().and_then(|ledger| {
                let Some((batch_id, record)) = ledger.latest() else {
                    return Err(CoordinatorError::EmptyBatch);
                };
                if record.open {
                    return Err(CoordinatorError::BatchStillOpen);
                }
                if record.submission_count == 0 {
                    return Err(CoordinatorError::EmptyBatch);
                }
                Ok(batch_id)
            });
            let batch_id = match precheck {
                Ok(batch_id) => batch_id,
                Err(err) => return Box::pin(fut::ready(Err(err))),
            };

            let gate = act.registry.send(RequestGate { caller, now });
            Box::pin(gate.into_actor(act).map(move |res, act, _| {
                res.map_err(CoordinatorError::store)??;
                let ledger = act.read_ledger()?;
                let record = ledger.record(batch_id).ok_or(CoordinatorError::EmptyBatch)?;
                let snapshot = record.accumulators.ordered();
                let commitment = Commitment::compute(batch_id, &snapshot, &act.identity);

                let request_id = act
                    .oracle
                    .request_decryption(&snapshot)
                    .map_err(CoordinatorError::backend)?;

                let mut contexts = act.read_contexts()?;
                contexts.insert_fresh(request_id.clone(), batch_id, commitment)?;
                act.contexts.set(contexts);
                act.bus.do_send(VeilEvent::from(DecryptionRequested {
                    request_id: request_id.clone(),
                    batch_id,
                }));
                Ok(request_id)
            }))
        }))
    }
}

impl Handler<DeliverDecryption> for DecryptionCoordinator {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: DeliverDecryption, _: &mut Self::Context) -> Self::Result {
        let result = self.process_delivery(&msg);
        if let Err(err) = &result {
            warn!(request_id = %msg.request_id, "delivery rejected: {}", err);
            self.bus.do_send(VeilEvent::from_error(
                VeilErrorType::Decryption,
                anyhow::Error::new(err.clone()),
            ));
        }
        result
    }
}

impl DecryptionCoordinator {
    fn process_delivery(&mut self, msg: &DeliverDecryption) -> Result<(), CoordinatorError> {
        let contexts = self.read_contexts()?;
        let context = contexts
            .get(&msg.request_id)
            .ok_or(CoordinatorError::UnknownRequest)?
            .clone();

        if context.processed {
            return Err(CoordinatorError::ReplayDetected);
        }

        // The ledger freezes closed batches, but that is an assumption about
        // our own code; the commitment check verifies it against the handles
        // as they are right now.
        let ledger = self.read_ledger()?;
        let record = ledger
            .record(context.batch_id)
            .ok_or(CoordinatorError::StateMismatch)?;
        let snapshot = record.accumulators.ordered();
        let commitment = Commitment::compute(context.batch_id, &snapshot, &self.identity);
        if commitment != context.commitment {
            return Err(CoordinatorError::StateMismatch);
        }

        if !self
            .oracle
            .verify_proof(&msg.request_id, &msg.cleartexts, &msg.proof)
        {
            return Err(CoordinatorError::InvalidProof);
        }

        let counters =
            decode_counters(&msg.cleartexts).map_err(|_| CoordinatorError::InvalidCleartexts)?;

        // Every check has passed; flip processed and publish. Failures above
        // leave the context pending so the oracle may retry the same id.
        let mut contexts = contexts;
        contexts.mark_processed(&msg.request_id)?;
        self.contexts.set(contexts);

        self.bus.do_send(VeilEvent::from(DecryptionCompleted {
            request_id: msg.request_id.clone(),
            batch_id: context.batch_id,
            sentiment: counters[0],
            keyword: counters[1],
            poll_option_one: counters[2],
            poll_option_two: counters[3],
        }));
        Ok(())
    }
}

//////////////////////////////////////////////////////////////////////////////
// Inspection
//////////////////////////////////////////////////////////////////////////////

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Option<BatchRecord>, CoordinatorError>")]
pub struct GetBatch {
    pub batch_id: BatchId,
}

impl Handler<GetBatch> for DecryptionCoordinator {
    type Result = Result<Option<BatchRecord>, CoordinatorError>;

    fn handle(&mut self, msg: GetBatch, _: &mut Self::Context) -> Self::Result {
        Ok(self.read_ledger()?.record(msg.batch_id).cloned())
    }
}

//////////////////////////////////////////////////////////////////////////////
// Fault injection
//////////////////////////////////////////////////////////////////////////////

/// Mutate a closed batch's accumulators behind the ledger's back. Exists so
/// tests can prove the commitment check catches exactly this.
#[cfg(feature = "test-utils")]
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), CoordinatorError>")]
pub struct TamperBatch {
    pub batch_id: BatchId,
    pub contributions: TallySet,
}

#[cfg(feature = "test-utils")]
impl Handler<TamperBatch> for DecryptionCoordinator {
    type Result = Result<(), CoordinatorError>;

    fn handle(&mut self, msg: TamperBatch, _: &mut Self::Context) -> Self::Result {
        let mut ledger = self.read_ledger()?;
        ledger.tamper(&self.fhe, msg.batch_id, &msg.contributions)?;
        self.ledger.set(ledger);
        Ok(())
    }
}
