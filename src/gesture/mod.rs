//! Gesture synthesis: timed touch paths, injection backends and the serialized
//! dispatch queue that feeds them.

pub mod backend;
mod dispatch;
mod path;
mod visual;

pub use backend::{
    BackendError, DispatchOutcome, DropReason, GestureBackend, GestureBackends,
    HelperPipeBackend, JsonLinesBackend, RecordedDispatch, RecordingBackend,
};
pub use dispatch::{DispatchTicket, GestureManager};
pub use path::{
    GestureError, GestureKind, GesturePath, GesturePoint, GestureRequest, DRAG_PICKUP_MS,
    LONG_PRESS_DURATION_MS, TAP_DURATION_MS,
};
