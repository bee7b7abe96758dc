use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::GesturePath;
use crate::lock_or_recover;
use crate::watch::{StateCell, StateReader};

struct VisualEntry {
    path: Arc<GesturePath>,
    expires_at: Instant,
}

struct VisualState {
    generation: u64,
    enabled: bool,
    entries: Vec<VisualEntry>,
}

/// Recently dispatched paths for the on-screen trail, plus the cancellation
/// generation that decides whether a queued gesture may still run.
///
/// Generation and entries share one lock so a cancel can never be followed by
/// a stale path appearing in the published list.
pub(crate) struct GestureVisualizer {
    state: Mutex<VisualState>,
    published: StateCell<Vec<Arc<GesturePath>>>,
    ttl: Duration,
}

impl GestureVisualizer {
    pub(crate) fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            state: Mutex::new(VisualState {
                generation: 0,
                enabled,
                entries: Vec::new(),
            }),
            published: StateCell::new(Vec::new()),
            ttl,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        lock_or_recover(&self.state, "GestureVisualizer::generation").generation
    }

    /// Accept a path picked up by the dispatch worker. Returns false when the
    /// path was queued before the last cancel and must not run.
    pub(crate) fn admit(&self, generation: u64, path: &Arc<GesturePath>, now: Instant) -> bool {
        let mut state = lock_or_recover(&self.state, "GestureVisualizer::admit");
        if state.generation != generation {
            return false;
        }
        if state.enabled {
            state.entries.retain(|entry| entry.expires_at > now);
            state.entries.push(VisualEntry {
                path: Arc::clone(path),
                expires_at: now + path.duration() + self.ttl,
            });
            self.publish(&state);
        }
        true
    }

    pub(crate) fn prune(&self, now: Instant) {
        let mut state = lock_or_recover(&self.state, "GestureVisualizer::prune");
        let before = state.entries.len();
        state.entries.retain(|entry| entry.expires_at > now);
        if state.entries.len() != before {
            self.publish(&state);
        }
    }

    /// Invalidate everything queued so far and clear the trail.
    pub(crate) fn cancel(&self) -> u64 {
        let mut state = lock_or_recover(&self.state, "GestureVisualizer::cancel");
        state.generation += 1;
        if !state.entries.is_empty() {
            state.entries.clear();
            self.publish(&state);
        }
        state.generation
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        let mut state = lock_or_recover(&self.state, "GestureVisualizer::set_enabled");
        state.enabled = enabled;
        if !enabled && !state.entries.is_empty() {
            state.entries.clear();
            self.publish(&state);
        }
    }

    pub(crate) fn reader(&self) -> StateReader<Vec<Arc<GesturePath>>> {
        self.published.reader()
    }

    fn publish(&self, state: &VisualState) {
        self.published
            .set(state.entries.iter().map(|e| Arc::clone(&e.path)).collect());
    }
}
