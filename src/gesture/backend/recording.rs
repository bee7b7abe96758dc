use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use super::{BackendError, GestureBackend};
use crate::gesture::{GestureKind, GesturePath};
use crate::lock_or_recover;

#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    pub path: GesturePath,
    pub started: Instant,
    pub finished: Instant,
}

/// In-memory backend that keeps every delivered path.
///
/// Used by the driver's dry-run mode and by tests. Latency, availability,
/// supported kinds and failures are all adjustable.
pub struct RecordingBackend {
    name: String,
    kinds: Option<Vec<GestureKind>>,
    latency: Duration,
    available: AtomicBool,
    failure: Mutex<Option<String>>,
    records: Mutex<Vec<RecordedDispatch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kinds: None,
            latency: Duration::ZERO,
            available: AtomicBool::new(true),
            failure: Mutex::new(None),
            records: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Restrict the backend to the given gesture kinds.
    pub fn with_kinds(mut self, kinds: &[GestureKind]) -> Self {
        self.kinds = Some(kinds.to_vec());
        self
    }

    /// Sleep this long inside every dispatch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every following dispatch fail with `reason` (or succeed again with `None`).
    pub fn set_failure(&self, reason: Option<&str>) {
        *lock_or_recover(&self.failure, "RecordingBackend::set_failure") =
            reason.map(str::to_string);
    }

    pub fn records(&self) -> Vec<RecordedDispatch> {
        lock_or_recover(&self.records, "RecordingBackend::records").clone()
    }

    pub fn kinds(&self) -> Vec<GestureKind> {
        self.records().iter().map(|r| r.path.kind()).collect()
    }

    pub fn dispatch_count(&self) -> usize {
        lock_or_recover(&self.records, "RecordingBackend::dispatch_count").len()
    }

    /// Highest number of dispatches observed running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl GestureBackend for RecordingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn supports(&self, kind: GestureKind) -> bool {
        self.kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&kind))
    }

    fn dispatch(&self, path: &GesturePath) -> Result<(), BackendError> {
        if let Some(reason) = lock_or_recover(&self.failure, "RecordingBackend::dispatch").clone() {
            return Err(BackendError::Failed(reason));
        }
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let started = Instant::now();
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let finished = Instant::now();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        lock_or_recover(&self.records, "RecordingBackend::dispatch").push(RecordedDispatch {
            path: path.clone(),
            started,
            finished,
        });
        Ok(())
    }
}
