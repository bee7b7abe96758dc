//! Timed touch paths and the builders that shape them.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::geometry::{Point, ScreenDimensions};
use crate::settings::GestureStyle;

pub const TAP_DURATION_MS: u64 = 50;
pub const LONG_PRESS_DURATION_MS: u64 = 650;
/// Hold at the start of a drag so the target picks the touch up before it moves.
pub const DRAG_PICKUP_MS: u64 = 400;
const STROKE_SAMPLES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Tap,
    LongPress,
    Drag,
    Swipe,
}

impl GestureKind {
    pub fn label(self) -> &'static str {
        match self {
            GestureKind::Tap => "tap",
            GestureKind::LongPress => "long_press",
            GestureKind::Drag => "drag",
            GestureKind::Swipe => "swipe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GesturePoint {
    pub x: f32,
    pub y: f32,
    /// Offset from gesture start in milliseconds.
    pub t_ms: u64,
}

impl GesturePoint {
    pub fn new(x: f32, y: f32, t_ms: u64) -> Self {
        Self { x, y, t_ms }
    }

    pub fn at(point: Point, t_ms: u64) -> Self {
        Self::new(point.x, point.y, t_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureError {
    Empty,
    NonFiniteCoordinate { index: usize },
    TimestampsOutOfOrder { index: usize },
}

impl fmt::Display for GestureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureError::Empty => write!(f, "gesture path has no points"),
            GestureError::NonFiniteCoordinate { index } => {
                write!(f, "gesture point {index} has a non-finite coordinate")
            }
            GestureError::TimestampsOutOfOrder { index } => {
                write!(f, "gesture point {index} is earlier than its predecessor")
            }
        }
    }
}

impl std::error::Error for GestureError {}

/// A validated, immutable touch path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GesturePath {
    kind: GestureKind,
    points: Vec<GesturePoint>,
    duration_ms: u64,
}

impl GesturePath {
    /// Build a path, rejecting empty or time-reversed sample lists.
    ///
    /// The total duration is never shorter than the last sample's offset.
    pub fn new(
        kind: GestureKind,
        points: Vec<GesturePoint>,
        duration: Duration,
    ) -> Result<Self, GestureError> {
        if points.is_empty() {
            return Err(GestureError::Empty);
        }
        for (index, point) in points.iter().enumerate() {
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(GestureError::NonFiniteCoordinate { index });
            }
            if index > 0 && point.t_ms < points[index - 1].t_ms {
                return Err(GestureError::TimestampsOutOfOrder { index });
            }
        }
        let last = points.last().map(|p| p.t_ms).unwrap_or(0);
        let duration_ms = (duration.as_millis() as u64).max(last);
        Ok(Self {
            kind,
            points,
            duration_ms,
        })
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn points(&self) -> &[GesturePoint] {
        &self.points
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn start(&self) -> Point {
        let first = self.points[0];
        Point::new(first.x, first.y)
    }

    pub fn end(&self) -> Point {
        let last = self.points[self.points.len() - 1];
        Point::new(last.x, last.y)
    }
}

/// High-level gesture intent, turned into a path against the current screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureRequest {
    Tap(Point),
    LongPress(Point),
    Swipe {
        from: Point,
        to: Point,
        duration: Duration,
        style: GestureStyle,
    },
    Drag {
        from: Point,
        to: Point,
        duration: Duration,
        style: GestureStyle,
    },
}

impl GestureRequest {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureRequest::Tap(_) => GestureKind::Tap,
            GestureRequest::LongPress(_) => GestureKind::LongPress,
            GestureRequest::Swipe { .. } => GestureKind::Swipe,
            GestureRequest::Drag { .. } => GestureKind::Drag,
        }
    }

    /// Sample the request into a path. Every point is clamped onto the screen.
    pub fn build(&self, screen: ScreenDimensions) -> Result<GesturePath, GestureError> {
        match *self {
            GestureRequest::Tap(at) => GesturePath::new(
                GestureKind::Tap,
                vec![GesturePoint::at(screen.clamp(at), 0)],
                Duration::from_millis(TAP_DURATION_MS),
            ),
            GestureRequest::LongPress(at) => GesturePath::new(
                GestureKind::LongPress,
                vec![GesturePoint::at(screen.clamp(at), 0)],
                Duration::from_millis(LONG_PRESS_DURATION_MS),
            ),
            GestureRequest::Swipe {
                from,
                to,
                duration,
                style,
            } => {
                let points = stroke(screen.clamp(from), screen.clamp(to), duration, style, 0);
                GesturePath::new(GestureKind::Swipe, points, duration)
            }
            GestureRequest::Drag {
                from,
                to,
                duration,
                style,
            } => {
                let from = screen.clamp(from);
                let mut points = vec![GesturePoint::at(from, 0)];
                points.extend(stroke(from, screen.clamp(to), duration, style, DRAG_PICKUP_MS));
                GesturePath::new(
                    GestureKind::Drag,
                    points,
                    duration + Duration::from_millis(DRAG_PICKUP_MS),
                )
            }
        }
    }
}

fn stroke(
    from: Point,
    to: Point,
    duration: Duration,
    style: GestureStyle,
    start_ms: u64,
) -> Vec<GesturePoint> {
    let total_ms = duration.as_millis() as u64;
    let last = (STROKE_SAMPLES - 1) as f32;
    (0..STROKE_SAMPLES)
        .map(|i| {
            let progress = i as f32 / last;
            let eased = ease(progress, style);
            let t_ms = start_ms + (total_ms * i as u64) / (STROKE_SAMPLES as u64 - 1);
            GesturePoint::new(
                from.x + (to.x - from.x) * eased,
                from.y + (to.y - from.y) * eased,
                t_ms,
            )
        })
        .collect()
}

fn ease(progress: f32, style: GestureStyle) -> f32 {
    match style {
        GestureStyle::Linear => progress,
        GestureStyle::Inertia => 1.0 - (1.0 - progress) * (1.0 - progress),
    }
}
