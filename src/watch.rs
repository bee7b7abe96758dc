//! Latest-value state cells shared between one writer and many readers.
//!
//! Every state slice the renderers observe (mode, grid stack, cursor position,
//! gesture paths, settings, screen size) lives in a [`StateCell`]. The owning
//! manager holds the cell and is the only writer; everyone else gets a
//! [`StateReader`]. Readers always see a whole `Arc<T>` snapshot, and each
//! write bumps a version so subscribers can tell whether anything changed.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::lock_or_recover;

struct Slot<T> {
    version: u64,
    value: Arc<T>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    subscribers: Mutex<Vec<Sender<u64>>>,
}

impl<T> Shared<T> {
    fn snapshot(&self) -> (u64, Arc<T>) {
        let slot = lock_or_recover(&self.slot, "watch::snapshot");
        (slot.version, Arc::clone(&slot.value))
    }
}

/// Writable side of a state slice.
pub struct StateCell<T> {
    shared: Arc<Shared<T>>,
}

impl<T> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    version: 0,
                    value: Arc::new(initial),
                }),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Replace the value and wake subscribers.
    pub fn set(&self, value: T) {
        self.publish(Arc::new(value));
    }

    /// Replace the value with an already shared snapshot.
    pub fn publish(&self, value: Arc<T>) {
        let version = {
            let mut slot = lock_or_recover(&self.shared.slot, "watch::publish");
            slot.version += 1;
            slot.value = value;
            slot.version
        };
        self.notify(version);
    }

    /// Apply `f` to a copy of the current value and publish the result.
    pub fn update<F>(&self, f: F)
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let version = {
            let mut slot = lock_or_recover(&self.shared.slot, "watch::update");
            let mut next = (*slot.value).clone();
            f(&mut next);
            slot.version += 1;
            slot.value = Arc::new(next);
            slot.version
        };
        self.notify(version);
    }

    pub fn get(&self) -> Arc<T> {
        self.shared.snapshot().1
    }

    pub fn reader(&self) -> StateReader<T> {
        StateReader {
            shared: Arc::clone(&self.shared),
        }
    }

    fn notify(&self, version: u64) {
        let mut subscribers = lock_or_recover(&self.shared.subscribers, "watch::notify");
        // A full slot already holds a pending wake-up; readers fetch the latest value anyway.
        subscribers
            .retain(|tx| !matches!(tx.try_send(version), Err(TrySendError::Disconnected(_))));
    }
}

/// Read-only handle to a state slice.
pub struct StateReader<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for StateReader<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> StateReader<T> {
    pub fn get(&self) -> Arc<T> {
        self.shared.snapshot().1
    }

    pub fn version(&self) -> u64 {
        self.shared.snapshot().0
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = bounded(1);
        lock_or_recover(&self.shared.subscribers, "watch::subscribe").push(tx);
        Subscription {
            shared: Arc::clone(&self.shared),
            signal_rx: rx,
            seen: self.version(),
        }
    }
}

/// Change notifications for one reader.
pub struct Subscription<T> {
    shared: Arc<Shared<T>>,
    signal_rx: Receiver<u64>,
    seen: u64,
}

impl<T> Subscription<T> {
    /// Latest value if it changed since the last call.
    pub fn try_changed(&mut self) -> Option<Arc<T>> {
        while self.signal_rx.try_recv().is_ok() {}
        self.take_if_newer()
    }

    /// Block until the value changes or the timeout elapses.
    pub fn wait_changed(&mut self, timeout: Duration) -> Option<Arc<T>> {
        if let Some(value) = self.try_changed() {
            return Some(value);
        }
        match self.signal_rx.recv_timeout(timeout) {
            Ok(_) => self.take_if_newer(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn take_if_newer(&mut self) -> Option<Arc<T>> {
        let (version, value) = self.shared.snapshot();
        if version == self.seen {
            return None;
        }
        self.seen = version;
        Some(value)
    }
}
