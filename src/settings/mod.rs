//! Overlay settings as seen by the input core.
//!
//! Settings arrive from outside (a JSON file for the driver, a settings UI on a
//! real host). They are validated here before they can reach any handler; the
//! core only ever sees a [`KeyBindingSnapshot`] that passed [`OverlaySettings::validate`].

mod store;
mod validation;

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use crate::keys::{KeyCode, KEY_NONE, KEY_POUND, KEY_STAR};

pub use store::{SettingsChange, SettingsStore};
pub use validation::{SettingsError, SettingsViolation};

pub const GRID_LEVELS_RANGE: RangeInclusive<u32> = 1..=5;
pub const OVERLAY_OPACITY_RANGE: RangeInclusive<u32> = 0..=100;
pub const CURSOR_SPEED_RANGE: RangeInclusive<u32> = 1..=10;
pub const CURSOR_ACCELERATION_RANGE: RangeInclusive<u32> = 0..=10;
pub const CURSOR_SIZE_RANGE: RangeInclusive<u32> = 1..=10;
pub const GESTURE_DURATION_MS_RANGE: RangeInclusive<u64> = 50..=2_000;
pub const SCROLL_MULTIPLIER_RANGE: RangeInclusive<f32> = 0.25..=3.0;

/// Immutable settings snapshot handed to a mode for the length of one session.
pub type KeyBindingSnapshot = Arc<OverlaySettings>;

/// Which keys drive cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    /// D-pad moves, center clicks, 2/4/6/8 scroll.
    #[default]
    Standard,
    /// 2/4/6/8 move (1/3/7/9 diagonals), 5 clicks, D-pad and page keys scroll.
    Numpad,
}

/// Shape of multi-point gestures (swipes and drags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureStyle {
    #[default]
    Linear,
    /// Fast start, slow finish, like a flick.
    Inertia,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub grid_levels: u32,
    pub overlay_opacity: u32,
    pub persist_overlay: bool,
    pub hide_numbers: bool,
    pub use_natural_scrolling: bool,
    pub show_gesture_visualization: bool,
    pub cursor_speed: u32,
    pub cursor_acceleration: u32,
    pub cursor_size: u32,
    pub grid_activation_key: KeyCode,
    pub cursor_activation_key: KeyCode,
    pub control_scheme: ControlScheme,
    pub cursor_wrap_around: bool,
    pub gesture_style: GestureStyle,
    pub toggle_hold: bool,
    /// Swipe and drag duration in milliseconds.
    pub gesture_duration: u64,
    pub scroll_multiplier: f32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            grid_levels: 2,
            overlay_opacity: 50,
            persist_overlay: false,
            hide_numbers: false,
            use_natural_scrolling: false,
            show_gesture_visualization: true,
            cursor_speed: 5,
            cursor_acceleration: 3,
            cursor_size: 5,
            grid_activation_key: KEY_POUND,
            cursor_activation_key: KEY_STAR,
            control_scheme: ControlScheme::Standard,
            cursor_wrap_around: false,
            gesture_style: GestureStyle::Linear,
            toggle_hold: false,
            gesture_duration: 200,
            scroll_multiplier: 1.0,
        }
    }
}

impl OverlaySettings {
    pub fn grid_key(&self) -> Option<KeyCode> {
        bound_key(self.grid_activation_key)
    }

    pub fn cursor_key(&self) -> Option<KeyCode> {
        bound_key(self.cursor_activation_key)
    }

    pub fn gesture_duration(&self) -> Duration {
        Duration::from_millis(self.gesture_duration)
    }

    pub fn snapshot(self) -> KeyBindingSnapshot {
        Arc::new(self)
    }
}

fn bound_key(code: KeyCode) -> Option<KeyCode> {
    (code != KEY_NONE).then_some(code)
}
