//! Cursor mode: a virtual pointer steered by held direction keys, with click,
//! long press, scroll and drag actions at its position.

mod handler;
mod manager;
mod motion;
mod scheme;
#[cfg(test)]
mod tests;
mod ticker;

pub use handler::CursorActionHandler;
pub use manager::{CursorStateManager, CursorView, DragToggle};
pub use motion::{
    apply_bounds, CursorMotion, Direction, HeldDirections, MotionParams, ACCELERATION_RAMP,
    ACCELERATION_STEP, BASE_PIXELS_PER_TICK,
};
pub use scheme::{
    action_for, drag_gesture, scroll_gesture, CursorAction, ScrollDirection,
    SCROLL_SCREEN_FRACTION,
};
