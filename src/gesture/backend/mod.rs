//! Gesture injection backends.
//!
//! A backend turns a [`GesturePath`] into real touch input on the host. The
//! standard backend is always present; a privileged backend (an external
//! helper with elevated rights) may be added and is preferred whenever it is
//! available and supports the gesture kind.

mod helper_pipe;
mod json_lines;
mod recording;

pub use helper_pipe::HelperPipeBackend;
pub use json_lines::JsonLinesBackend;
pub use recording::{RecordedDispatch, RecordingBackend};

use std::fmt;
use std::sync::Arc;

use super::{GestureKind, GesturePath};

/// Interface every gesture injector implements.
pub trait GestureBackend: Send + Sync {
    /// Short identifier used in logs and dispatch outcomes.
    fn name(&self) -> &str;

    /// Whether the backend can take gestures right now.
    fn is_available(&self) -> bool {
        true
    }

    fn supports(&self, kind: GestureKind) -> bool;

    /// Inject the path. Blocks until the host accepted or rejected it.
    fn dispatch(&self, path: &GesturePath) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    Unavailable(String),
    Unsupported(GestureKind),
    Failed(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable(reason) => write!(f, "backend unavailable: {reason}"),
            BackendError::Unsupported(kind) => write!(f, "{} gestures not supported", kind.label()),
            BackendError::Failed(reason) => write!(f, "dispatch failed: {reason}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Result of one dispatch request. Every request yields exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered by the preferred backend.
    Dispatched { backend: String },
    /// Delivered by the standard backend after the privileged one was skipped or failed.
    Degraded { backend: String, reason: String },
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, DispatchOutcome::Dropped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No backend can perform this kind of gesture.
    Unsupported(GestureKind),
    BackendFailed(String),
    /// Overlays were force-hidden before the request ran.
    Cancelled,
    /// The dispatch queue is shut down.
    QueueClosed,
}

/// The standard backend plus an optional privileged one.
#[derive(Clone)]
pub struct GestureBackends {
    standard: Arc<dyn GestureBackend>,
    privileged: Option<Arc<dyn GestureBackend>>,
}

impl GestureBackends {
    pub fn new(standard: Arc<dyn GestureBackend>) -> Self {
        Self {
            standard,
            privileged: None,
        }
    }

    pub fn with_privileged(mut self, privileged: Arc<dyn GestureBackend>) -> Self {
        self.privileged = Some(privileged);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.standard.name()];
        if let Some(privileged) = &self.privileged {
            names.push(privileged.name());
        }
        names
    }

    /// Run one path through the preferred backend, falling back once.
    pub(crate) fn dispatch(&self, path: &GesturePath) -> DispatchOutcome {
        let kind = path.kind();
        let mut degraded_reason = None;
        if let Some(privileged) = &self.privileged {
            if !privileged.is_available() {
                degraded_reason = Some(format!("{} unavailable", privileged.name()));
            } else if !privileged.supports(kind) {
                degraded_reason = Some(format!("{} cannot {}", privileged.name(), kind.label()));
            } else {
                match privileged.dispatch(path) {
                    Ok(()) => {
                        return DispatchOutcome::Dispatched {
                            backend: privileged.name().to_string(),
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            backend = privileged.name(),
                            error = %err,
                            "privileged dispatch failed"
                        );
                        degraded_reason = Some(err.to_string());
                    }
                }
            }
        }

        if !self.standard.is_available() {
            return DispatchOutcome::Dropped(DropReason::BackendFailed(format!(
                "{} unavailable",
                self.standard.name()
            )));
        }
        if !self.standard.supports(kind) {
            return DispatchOutcome::Dropped(DropReason::Unsupported(kind));
        }
        match self.standard.dispatch(path) {
            Ok(()) => {
                let backend = self.standard.name().to_string();
                match degraded_reason {
                    Some(reason) => DispatchOutcome::Degraded { backend, reason },
                    None => DispatchOutcome::Dispatched { backend },
                }
            }
            Err(err) => DispatchOutcome::Dropped(DropReason::BackendFailed(err.to_string())),
        }
    }
}
