//! Replay-1 fan-out of location samples.
//!
//! Every subscriber owns a one-slot channel. Publishing into a full slot
//! evicts the stale sample first, so a slow reader only ever sees the latest
//! fix and a fast reader never lags behind. The registry and the last-value
//! cell share one lock: a sample is either replayed to a new subscriber or
//! delivered to it, never both.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::model::LocationSample;

#[derive(Default)]
pub struct SampleBroadcast {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last: Option<LocationSample>,
    slots: Vec<LatestSlot<LocationSample>>,
}

/// One-slot channel that keeps only the newest value. Also backs the
/// navigation state watchers.
pub(crate) struct LatestSlot<T> {
    tx: Sender<T>,
    /// Second handle on the slot, used only to evict a stale value.
    evict: Receiver<T>,
    alive: Weak<()>,
}

impl<T> LatestSlot<T> {
    /// The slot, its reading end, and the token that keeps it registered.
    pub(crate) fn open() -> (Self, Receiver<T>, Arc<()>) {
        let (tx, rx) = bounded(1);
        let alive = Arc::new(());
        let slot = Self {
            tx,
            evict: rx.clone(),
            alive: Arc::downgrade(&alive),
        };
        (slot, rx, alive)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }

    pub(crate) fn offer(&self, value: T) {
        let mut pending = value;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(s)) => {
                    let _ = self.evict.try_recv();
                    pending = s;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

impl SampleBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (slot, rx, alive) = LatestSlot::open();

        let mut inner = self.inner.lock();
        if let Some(last) = &inner.last {
            slot.offer(last.clone());
        }
        inner.slots.push(slot);

        Subscription { rx, _alive: alive }
    }

    pub fn publish(&self, sample: LocationSample) {
        let mut inner = self.inner.lock();
        inner.slots.retain(LatestSlot::is_alive);
        for slot in &inner.slots {
            slot.offer(sample.clone());
        }
        inner.last = Some(sample);
    }

    pub fn last(&self) -> Option<LocationSample> {
        self.inner.lock().last.clone()
    }

    /// Live subscribers, not counting ones dropped since the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.is_alive())
            .count()
    }
}

/// Receiving end of a replay-1 slot. Dropping it unsubscribes.
pub struct Subscription {
    rx: Receiver<LocationSample>,
    _alive: Arc<()>,
}

impl Subscription {
    /// Blocks for the next sample; `None` once the broadcaster is gone.
    pub fn recv(&self) -> Option<LocationSample> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<LocationSample> {
        match self.rx.recv_timeout(timeout) {
            Ok(s) => Some(s),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<LocationSample> {
        match self.rx.try_recv() {
            Ok(s) => Some(s),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// For `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<LocationSample> {
        &self.rx
    }
}
