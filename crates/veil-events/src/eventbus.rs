// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::traits::{ErrorEvent, Event};
use actix::prelude::*;
use bloom::{BloomFilter, ASMS};
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use tracing::info;

//////////////////////////////////////////////////////////////////////////////
// Configuration
//////////////////////////////////////////////////////////////////////////////

/// Configuration for EventBus behavior
pub struct EventBusConfig {
    pub deduplicate: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

fn default_bloomfilter() -> BloomFilter {
    let num_items = 10000000;
    let fp_rate = 0.001;
    BloomFilter::with_rate(fp_rate, num_items)
}

//////////////////////////////////////////////////////////////////////////////
// EventBus Implementation
//////////////////////////////////////////////////////////////////////////////

/// Central EventBus for the coordinator. Actors publish events by sending it
/// VeilEvents; listeners subscribe per event type or with "*" for everything.
/// Duplicate suppression is keyed by event id so the same payload republished
/// (e.g. replayed by a faulty caller) is not re-broadcast to listeners.
pub struct EventBus<E: Event> {
    config: EventBusConfig,
    ids: BloomFilter,
    listeners: HashMap<String, Vec<Recipient<E>>>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new(config: EventBusConfig) -> Self {
        EventBus {
            config,
            listeners: HashMap::new(),
            ids: default_bloomfilter(),
        }
    }

    /// Attach a HistoryCollector that records every event on the bus.
    pub fn history(source: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>> {
        let addr = HistoryCollector::<E>::new().start();
        source.do_send(Subscribe::new("*", addr.clone().recipient()));
        addr
    }

    /// Attach a HistoryCollector that records only error events.
    pub fn error(source: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>>
    where
        E: ErrorEvent,
    {
        let addr = HistoryCollector::<E>::new().start();
        source.do_send(Subscribe::new("VeilError", addr.clone().recipient()));
        addr
    }

    fn track(&mut self, event: E) {
        self.ids.insert(&event.event_id());
    }

    fn is_duplicate(&self, event: &E) -> bool {
        self.config.deduplicate && self.ids.contains(&event.event_id())
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        if self.is_duplicate(&event) {
            return;
        }
        if let Some(listeners) = self.listeners.get("*") {
            for listener in listeners {
                listener.do_send(event.clone());
            }
        }

        if let Some(listeners) = self.listeners.get(&event.event_type()) {
            for listener in listeners {
                listener.do_send(event.clone());
            }
        }

        tracing::info!(">>> {}", event);
        self.track(event);
    }
}

//////////////////////////////////////////////////////////////////////////////
// Subscribe Message
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Unsubscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        self.listeners
            .entry(msg.event_type)
            .or_default()
            .push(msg.listener);
    }
}

impl<E: Event> Handler<Unsubscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe<E>, _: &mut Context<Self>) {
        if let Some(listeners) = self.listeners.get_mut(&msg.event_type) {
            listeners.retain(|listener| listener != &msg.listener);
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
// History Management
//////////////////////////////////////////////////////////////////////////////

#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct GetEvents<E: Event>(PhantomData<E>);

impl<E: Event> GetEvents<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Event> Default for GetEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain up to `amount` events, waiting for more to arrive if the buffer is
/// short. Lets async tests await "the next N events" without sleeping.
#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct TakeEvents<E: Event> {
    amount: usize,
    _d: PhantomData<E>,
}

impl<E: Event> TakeEvents<E> {
    pub fn new(amount: usize) -> Self {
        Self {
            amount,
            _d: PhantomData,
        }
    }
}

struct PendingTake<E: Event> {
    count: usize,
    collected: Vec<E>,
    responder: tokio::sync::oneshot::Sender<Vec<E>>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ResetHistory;

#[derive(Message)]
#[rtype(result = "Vec<E::Error>")]
pub struct GetErrors<E: ErrorEvent>(PhantomData<E>);

impl<E: ErrorEvent> GetErrors<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: ErrorEvent> Default for GetErrors<E> {
    fn default() -> Self {
        Self::new()
    }
}

//////////////////////////////////////////////////////////////////////////////
// History Collector
//////////////////////////////////////////////////////////////////////////////

/// Actor to subscribe to EventBus to capture all history
pub struct HistoryCollector<E: Event> {
    history: VecDeque<E>,
    pending_takes: Vec<PendingTake<E>>,
}

impl<E: Event> HistoryCollector<E> {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            pending_takes: Vec::new(),
        }
    }

    fn try_fulfill_pending_takes(&mut self) {
        let mut completed = Vec::new();

        for (idx, pending) in self.pending_takes.iter_mut().enumerate() {
            while pending.collected.len() < pending.count && !self.history.is_empty() {
                if let Some(event) = self.history.pop_front() {
                    pending.collected.push(event);
                }
            }

            if pending.collected.len() >= pending.count {
                completed.push(idx);
            }
        }

        // Reverse order keeps swap_remove indices valid
        for idx in completed.into_iter().rev() {
            let pending = self.pending_takes.swap_remove(idx);
            let events = pending.collected.into_iter().take(pending.count).collect();
            let _ = pending.responder.send(events);
        }
    }

    fn add_event(&mut self, event: E) {
        for pending in &mut self.pending_takes {
            if pending.collected.len() < pending.count {
                pending.collected.push(event);
                self.try_fulfill_pending_takes();
                return;
            }
        }

        self.history.push_back(event);
    }
}

impl<E: Event> Default for HistoryCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Actor for HistoryCollector<E> {
    type Context = Context<Self>;
}

impl<E: Event> Handler<E> for HistoryCollector<E> {
    type Result = E::Result;
    fn handle(&mut self, msg: E, _ctx: &mut Self::Context) -> Self::Result {
        self.add_event(msg);
    }
}

impl<E: Event> Handler<GetEvents<E>> for HistoryCollector<E> {
    type Result = Vec<E>;

    fn handle(&mut self, _: GetEvents<E>, _: &mut Context<Self>) -> Vec<E> {
        self.history.iter().cloned().collect()
    }
}

impl<E: ErrorEvent> Handler<GetErrors<E>> for HistoryCollector<E> {
    type Result = Vec<E::Error>;

    fn handle(&mut self, _: GetErrors<E>, _: &mut Context<Self>) -> Self::Result {
        self.history
            .iter()
            .filter_map(|evt| evt.as_error().cloned())
            .collect()
    }
}

impl<E: Event> Handler<ResetHistory> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, _: ResetHistory, _: &mut Context<Self>) {
        self.history.clear();
        self.pending_takes.clear();
    }
}

impl<E: Event> Handler<TakeEvents<E>> for HistoryCollector<E> {
    type Result = ResponseActFuture<Self, Vec<E>>;

    fn handle(&mut self, msg: TakeEvents<E>, _: &mut Context<Self>) -> Self::Result {
        let count = msg.amount;

        if self.history.len() >= count {
            let events: Vec<E> = self.history.drain(..count).collect();
            return Box::pin(async move { events }.into_actor(self));
        }

        info!(
            "Requesting {} events but only {} in the buffer. waiting for more...",
            count,
            self.history.len()
        );

        let (tx, rx) = tokio::sync::oneshot::channel();

        let mut collected = Vec::new();
        while !self.history.is_empty() && collected.len() < count {
            if let Some(event) = self.history.pop_front() {
                collected.push(event);
            }
        }

        self.pending_takes.push(PendingTake {
            count,
            collected,
            responder: tx,
        });

        Box::pin(async move { rx.await.unwrap_or_else(|_| Vec::new()) }.into_actor(self))
    }
}

//////////////////////////////////////////////////////////////////////////////
// Test Helper Functions
//////////////////////////////////////////////////////////////////////////////

/// Function to help with testing when we want to maintain a vec of events
pub fn new_event_bus_with_history<E: Event>() -> (Addr<EventBus<E>>, Addr<HistoryCollector<E>>) {
    let bus = EventBus::<E>::default().start();
    let history = EventBus::history(&bus);
    (bus, history)
}
