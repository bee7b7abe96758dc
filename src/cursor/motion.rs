//! Cursor kinematics: held directions integrate into per-tick displacement.

use std::time::Duration;

use crate::geometry::{Point, ScreenDimensions};
use crate::keys::KeyCode;
use crate::settings::OverlaySettings;

/// Pixels per tick at cursor speed 1 before acceleration.
pub const BASE_PIXELS_PER_TICK: f32 = 1.5;
/// Each acceleration step raises the ceiling multiplier by this much.
pub const ACCELERATION_STEP: f32 = 0.4;
/// Time a direction must be held to reach full acceleration.
pub const ACCELERATION_RAMP: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Unit vector in screen coordinates (y grows downward).
    pub fn unit(self) -> (f32, f32) {
        const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::UpLeft => (-D, -D),
            Direction::UpRight => (D, -D),
            Direction::DownLeft => (-D, D),
            Direction::DownRight => (D, D),
        }
    }
}

/// Direction keys currently held, keyed by the code that pressed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeldDirections {
    keys: Vec<(KeyCode, Direction)>,
}

impl HeldDirections {
    /// Returns true if this press started motion from rest.
    pub fn press(&mut self, code: KeyCode, direction: Direction) -> bool {
        let was_empty = self.keys.is_empty();
        if !self.keys.iter().any(|(held, _)| *held == code) {
            self.keys.push((code, direction));
        }
        was_empty
    }

    pub fn release(&mut self, code: KeyCode) -> bool {
        let before = self.keys.len();
        self.keys.retain(|(held, _)| *held != code);
        self.keys.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Sum of held unit vectors, renormalized; `None` when they cancel out.
    pub fn heading(&self) -> Option<(f32, f32)> {
        let (x, y) = self.keys.iter().fold((0.0f32, 0.0f32), |(ax, ay), (_, d)| {
            let (dx, dy) = d.unit();
            (ax + dx, ay + dy)
        });
        let length = (x * x + y * y).sqrt();
        (length > f32::EPSILON).then(|| (x / length, y / length))
    }
}

/// Speed profile derived from one settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub tick: Duration,
    pub base_speed: f32,
    pub ceiling: f32,
    pub wrap_around: bool,
}

impl MotionParams {
    pub fn from_settings(settings: &OverlaySettings, tick: Duration) -> Self {
        Self {
            tick,
            base_speed: settings.cursor_speed as f32 * BASE_PIXELS_PER_TICK,
            ceiling: 1.0 + settings.cursor_acceleration as f32 * ACCELERATION_STEP,
            wrap_around: settings.cursor_wrap_around,
        }
    }

    /// Multiplier after holding for `held`. Non-decreasing and capped at the ceiling.
    pub fn acceleration(&self, held: Duration) -> f32 {
        let ramp = (held.as_secs_f32() / ACCELERATION_RAMP.as_secs_f32()).min(1.0);
        1.0 + (self.ceiling - 1.0) * ramp
    }

    /// Distance covered by the `n`th tick (1-based) of continuous motion.
    pub fn tick_distance(&self, n: u32) -> f32 {
        self.base_speed * self.acceleration(self.tick * n)
    }
}

/// Position integrator for one cursor session.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorMotion {
    params: MotionParams,
    position: Point,
    ticks_held: u32,
}

impl CursorMotion {
    pub fn new(params: MotionParams, position: Point) -> Self {
        Self {
            params,
            position,
            ticks_held: 0,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Advance one tick. Returns false, and drops accumulated acceleration,
    /// when the held directions give no heading.
    pub fn step(&mut self, held: &HeldDirections, screen: ScreenDimensions) -> bool {
        let Some((ux, uy)) = held.heading() else {
            self.ticks_held = 0;
            return false;
        };
        self.ticks_held = self.ticks_held.saturating_add(1);
        let distance = self.params.tick_distance(self.ticks_held);
        let next = self.position.offset(ux * distance, uy * distance);
        self.position = apply_bounds(next, screen, self.params.wrap_around);
        true
    }

    pub fn reset_acceleration(&mut self) {
        self.ticks_held = 0;
    }
}

/// Keep a point on screen: wrap each axis modulo its extent, or clamp.
pub fn apply_bounds(point: Point, screen: ScreenDimensions, wrap: bool) -> Point {
    if wrap {
        Point::new(
            wrap_axis(point.x, screen.width),
            wrap_axis(point.y, screen.height),
        )
    } else {
        screen.clamp(point)
    }
}

fn wrap_axis(value: f32, extent: u32) -> f32 {
    if extent == 0 {
        return 0.0;
    }
    let extent = extent as f32;
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs.
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}
