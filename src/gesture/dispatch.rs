use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::backend::{DispatchOutcome, DropReason, GestureBackends};
use super::visual::GestureVisualizer;
use super::{GestureError, GestureKind, GesturePath, GesturePoint, GestureRequest};
use crate::geometry::ScreenDimensions;
use crate::watch::StateReader;
use crate::{lock_or_recover, log_debug};

const VISUAL_PRUNE_INTERVAL_MS: u64 = 50;

struct DispatchJob {
    path: Arc<GesturePath>,
    generation: u64,
    reply: Sender<DispatchOutcome>,
}

enum QueueMessage {
    Dispatch(DispatchJob),
    Shutdown,
}

/// Receipt for one queued gesture. Resolves to exactly one outcome.
pub struct DispatchTicket {
    kind: GestureKind,
    rx: Receiver<DispatchOutcome>,
}

impl DispatchTicket {
    fn resolved(kind: GestureKind, outcome: DispatchOutcome) -> Self {
        let (tx, rx) = bounded(1);
        let _ = tx.send(outcome);
        Self { kind, rx }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Outcome if the worker already finished this gesture.
    pub fn try_outcome(&self) -> Option<DispatchOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(crossbeam_channel::TryRecvError::Empty) => None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Some(DispatchOutcome::Dropped(DropReason::QueueClosed))
            }
        }
    }

    /// Wait for the outcome; `None` only if `timeout` elapsed first.
    pub fn wait(&self, timeout: Duration) -> Option<DispatchOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(DispatchOutcome::Dropped(DropReason::QueueClosed))
            }
        }
    }
}

/// Serialized gesture dispatch.
///
/// Requests are queued and run one at a time on a dedicated worker, so two
/// gestures never overlap on the host no matter how many threads submit them.
/// Submitting never blocks the caller.
pub struct GestureManager {
    tx: Sender<QueueMessage>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    closed: AtomicBool,
    visuals: Arc<GestureVisualizer>,
    screen: StateReader<ScreenDimensions>,
}

impl GestureManager {
    pub fn new(
        backends: GestureBackends,
        screen: StateReader<ScreenDimensions>,
        visual_ttl: Duration,
        visualization: bool,
    ) -> Self {
        let (tx, rx) = unbounded();
        let visuals = Arc::new(GestureVisualizer::new(visual_ttl, visualization));
        tracing::info!(backends = ?backends.names(), "gesture dispatch starting");
        let worker = spawn_dispatch_thread(rx, backends, Arc::clone(&visuals));
        Self {
            tx,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
            visuals,
            screen,
        }
    }

    /// Build a request against the current screen and queue it.
    pub fn perform(&self, request: GestureRequest) -> DispatchTicket {
        let screen = *self.screen.get();
        match request.build(screen) {
            Ok(path) => self.submit(path),
            Err(err) => {
                log_debug(&format!("gesture {} rejected: {err}", request.kind().label()));
                tracing::warn!(kind = request.kind().label(), error = %err, "gesture rejected");
                DispatchTicket::resolved(
                    request.kind(),
                    DispatchOutcome::Dropped(DropReason::BackendFailed(err.to_string())),
                )
            }
        }
    }

    /// Queue a raw path. The points are validated before anything is queued.
    pub fn dispatch(
        &self,
        kind: GestureKind,
        points: Vec<GesturePoint>,
        duration: Duration,
    ) -> Result<DispatchTicket, GestureError> {
        let path = GesturePath::new(kind, points, duration)?;
        Ok(self.submit(path))
    }

    pub fn submit(&self, path: GesturePath) -> DispatchTicket {
        let kind = path.kind();
        if self.closed.load(Ordering::SeqCst) {
            return DispatchTicket::resolved(
                kind,
                DispatchOutcome::Dropped(DropReason::QueueClosed),
            );
        }
        let (reply, rx) = bounded(1);
        let job = DispatchJob {
            path: Arc::new(path),
            generation: self.visuals.generation(),
            reply,
        };
        if self.tx.send(QueueMessage::Dispatch(job)).is_err() {
            return DispatchTicket::resolved(
                kind,
                DispatchOutcome::Dropped(DropReason::QueueClosed),
            );
        }
        DispatchTicket { kind, rx }
    }

    /// Drop every gesture still waiting in the queue and clear the trail.
    pub fn cancel_pending(&self) {
        let generation = self.visuals.cancel();
        tracing::debug!(generation, "pending gestures cancelled");
    }

    pub fn set_visualization(&self, enabled: bool) {
        self.visuals.set_enabled(enabled);
    }

    /// Recently dispatched paths, newest last.
    pub fn paths(&self) -> StateReader<Vec<Arc<GesturePath>>> {
        self.visuals.reader()
    }

    /// Finish everything already queued, then stop the worker.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.tx.send(QueueMessage::Shutdown);
        if let Some(handle) = lock_or_recover(&self.worker, "GestureManager::shutdown").take() {
            if handle.join().is_err() {
                log_debug("gesture dispatch worker panicked");
                tracing::warn!("gesture dispatch worker panicked");
            }
        }
    }
}

impl Drop for GestureManager {
    fn drop(&mut self) {
        let _ = self.tx.send(QueueMessage::Shutdown);
    }
}

fn spawn_dispatch_thread(
    rx: Receiver<QueueMessage>,
    backends: GestureBackends,
    visuals: Arc<GestureVisualizer>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        match rx.recv_timeout(Duration::from_millis(VISUAL_PRUNE_INTERVAL_MS)) {
            Ok(QueueMessage::Dispatch(job)) => {
                let outcome = run_job(&job, &backends, &visuals);
                let _ = job.reply.send(outcome);
            }
            Ok(QueueMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => visuals.prune(Instant::now()),
        }
    })
}

fn run_job(
    job: &DispatchJob,
    backends: &GestureBackends,
    visuals: &GestureVisualizer,
) -> DispatchOutcome {
    let kind = job.path.kind();
    if !visuals.admit(job.generation, &job.path, Instant::now()) {
        tracing::debug!(kind = kind.label(), "skipping cancelled gesture");
        return DispatchOutcome::Dropped(DropReason::Cancelled);
    }
    let outcome = backends.dispatch(&job.path);
    match &outcome {
        DispatchOutcome::Dispatched { backend } => {
            tracing::debug!(
                kind = kind.label(),
                backend = backend.as_str(),
                "gesture dispatched"
            );
        }
        DispatchOutcome::Degraded { backend, reason } => {
            tracing::warn!(
                kind = kind.label(),
                backend = backend.as_str(),
                reason = reason.as_str(),
                "gesture degraded to fallback backend"
            );
            log_debug(&format!(
                "gesture {} sent via {backend} fallback: {reason}",
                kind.label()
            ));
        }
        DispatchOutcome::Dropped(reason) => {
            tracing::warn!(kind = kind.label(), reason = ?reason, "gesture dropped");
            log_debug(&format!("gesture {} dropped: {reason:?}", kind.label()));
        }
    }
    outcome
}
