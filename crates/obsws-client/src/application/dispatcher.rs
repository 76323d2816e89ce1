//! Event dispatch.
//!
//! Routes each op 5 event to the subscribers registered for its
//! `eventType`, in registration order.  Each subscriber owns an unbounded
//! channel, so the reader task never waits on a slow consumer.
//!
//! Event names this crate has no category for also go to the catch-all
//! "unknown event" subscribers.  The negotiated subscription mask is used for
//! logging only; the server already filters by it, and events are never
//! dropped on the client side.
//!
//! # Derived output edges
//!
//! The four output state events (`StreamStateChanged`, `RecordStateChanged`,
//! `ReplayBufferStateChanged`, `VirtualcamStateChanged`) carry an
//! `outputActive` flag that repeats on every intermediate state.  The
//! dispatcher remembers the last flag per output and, only when it flips,
//! emits a synthetic `<Output>Started` or `<Output>Stopped` event after the
//! raw one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use obsws_core::events::OutputKind;
use obsws_core::protocol::messages::EventPayload;
use obsws_core::protocol::subscription::required_subscription;
use obsws_core::EventSubscription;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::ObsEvent;

/// Handle for [`EventDispatcher::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Receiving end of a subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    event_type: Option<String>,
    receiver: mpsc::UnboundedReceiver<ObsEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The event name subscribed to; `None` for the unknown-event channel.
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// Waits for the next event.  Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<ObsEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ObsEvent> {
        self.receiver.try_recv().ok()
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::UnboundedSender<ObsEvent>,
}

/// Last seen `outputActive` per output.
#[derive(Debug, Default)]
struct OutputEdges {
    active: HashMap<OutputKind, bool>,
}

impl OutputEdges {
    /// Returns the synthetic event name if `active` flips the output's state.
    fn observe(&mut self, kind: OutputKind, active: bool) -> Option<&'static str> {
        let previous = self.active.insert(kind, active).unwrap_or(false);
        match (previous, active) {
            (false, true) => Some(kind.started_event()),
            (true, false) => Some(kind.stopped_event()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct DispatcherState {
    by_type: HashMap<String, Vec<Subscriber>>,
    unknown: Vec<Subscriber>,
    edges: OutputEdges,
}

/// What a single dispatch did; used by the connection for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub delivered: usize,
    pub unknown: bool,
    pub derived: Option<&'static str>,
}

#[derive(Default)]
pub struct EventDispatcher {
    state: Mutex<DispatcherState>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribes to one event name.  Derived edge names
    /// (`StreamStarted`, `RecordStopped`, …) are valid too.
    pub fn subscribe(&self, event_type: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id();
        self.state
            .lock()
            .by_type
            .entry(event_type.to_string())
            .or_default()
            .push(Subscriber { id, sender });
        Subscription {
            id,
            event_type: Some(event_type.to_string()),
            receiver,
        }
    }

    /// Subscribes to events whose name this crate does not recognise.
    pub fn subscribe_unknown(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id();
        self.state.lock().unknown.push(Subscriber { id, sender });
        Subscription {
            id,
            event_type: None,
            receiver,
        }
    }

    /// Removes a subscription.  Its receiver sees the channel close.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.lock();
        let before = state.unknown.len();
        state.unknown.retain(|s| s.id != id);
        if state.unknown.len() != before {
            return true;
        }
        for subscribers in state.by_type.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|s| s.id != id);
            if subscribers.len() != before {
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.state
            .lock()
            .by_type
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Delivers one server event (and any edge derived from it).
    pub fn dispatch(&self, payload: EventPayload, mask: EventSubscription) -> DispatchReport {
        let event = ObsEvent::from(payload);
        let mut report = DispatchReport::default();
        let mut state = self.state.lock();

        match required_subscription(&event.event_type) {
            Some(bit) if !mask.contains(bit) => {
                debug!(event = %event.event_type, %mask, "event outside the negotiated mask");
            }
            Some(_) => {}
            None => {
                debug!(event = %event.event_type, "unknown event type");
                report.unknown = true;
                report.delivered += send_all(&mut state.unknown, &event);
            }
        }

        let derived = OutputKind::from_state_event(&event.event_type).and_then(|kind| {
            match event.output_state() {
                Ok(change) => state.edges.observe(kind, change.active),
                Err(e) => {
                    debug!(event = %event.event_type, error = %e, "output event without a usable state");
                    None
                }
            }
        });

        report.delivered += deliver(&mut state.by_type, &event);

        if let Some(name) = derived {
            trace!(event = name, "derived output edge");
            let edge = ObsEvent::derived(name, event.event_data.clone());
            report.delivered += deliver(&mut state.by_type, &edge);
            report.derived = Some(name);
        }
        report
    }

    /// Forgets every output's last state; called when the socket drops.
    pub fn reset_edges(&self) {
        self.state.lock().edges = OutputEdges::default();
    }
}

fn deliver(by_type: &mut HashMap<String, Vec<Subscriber>>, event: &ObsEvent) -> usize {
    match by_type.get_mut(&event.event_type) {
        Some(subscribers) => send_all(subscribers, event),
        None => 0,
    }
}

/// Sends to every live subscriber, pruning those whose receiver is gone.
fn send_all(subscribers: &mut Vec<Subscriber>, event: &ObsEvent) -> usize {
    let mut sent = 0;
    subscribers.retain(|s| match s.sender.send(event.clone()) {
        Ok(()) => {
            sent += 1;
            true
        }
        Err(_) => false,
    });
    sent
}

// ── Tests ─────────────────────────────────────────────────────────────────────
