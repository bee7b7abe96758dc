use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

use super::motion::{apply_bounds, CursorMotion, Direction, HeldDirections, MotionParams};
use crate::geometry::{Point, ScreenDimensions};
use crate::keys::KeyCode;
use crate::lock_or_recover;
use crate::settings::KeyBindingSnapshot;
use crate::watch::{StateCell, StateReader};

/// What the cursor renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorView {
    pub x: f32,
    pub y: f32,
    pub size: u32,
    pub moving: bool,
    pub dragging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragToggle {
    /// Anchor dropped at the cursor.
    Started(Point),
    /// Second press: drag from the anchor to the cursor.
    Finished { from: Point, to: Point },
}

struct CursorSession {
    motion: CursorMotion,
    held: HeldDirections,
    settings: KeyBindingSnapshot,
    screen: ScreenDimensions,
    drag_anchor: Option<Point>,
    ticker_id: u64,
    ticking: bool,
}

/// Owns the live cursor session and is the only writer of the cursor view.
///
/// Ticks and key transitions share one lock, so a tick either lands before a
/// deactivation or sees the session gone and stops.
pub struct CursorStateManager {
    session: Mutex<Option<CursorSession>>,
    view: StateCell<Option<CursorView>>,
    screen: StateReader<ScreenDimensions>,
    tick: Duration,
    next_ticker: Mutex<u64>,
}

impl CursorStateManager {
    pub fn new(screen: StateReader<ScreenDimensions>, tick: Duration) -> Self {
        Self {
            session: Mutex::new(None),
            view: StateCell::new(None),
            screen,
            tick,
            next_ticker: Mutex::new(0),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    /// Start a session with the cursor at screen center.
    pub fn show(&self, settings: KeyBindingSnapshot) {
        let screen = *self.screen.get();
        let params = MotionParams::from_settings(&settings, self.tick);
        let mut session = lock_or_recover(&self.session, "CursorStateManager::show");
        *session = Some(CursorSession {
            motion: CursorMotion::new(params, screen.center()),
            held: HeldDirections::default(),
            settings,
            screen,
            drag_anchor: None,
            ticker_id: 0,
            ticking: false,
        });
        self.publish(&session);
    }

    pub fn hide(&self) -> bool {
        let mut session = lock_or_recover(&self.session, "CursorStateManager::hide");
        if session.take().is_none() {
            return false;
        }
        self.publish(&session);
        true
    }

    pub fn session_settings(&self) -> Option<KeyBindingSnapshot> {
        lock_or_recover(&self.session, "CursorStateManager::session_settings")
            .as_ref()
            .map(|s| s.settings.clone())
    }

    pub fn position(&self) -> Option<Point> {
        lock_or_recover(&self.session, "CursorStateManager::position")
            .as_ref()
            .map(|s| s.motion.position())
    }

    /// Place the cursor directly, e.g. at a host-chosen start point.
    pub fn warp(&self, point: Point) -> bool {
        let screen = *self.screen.get();
        let mut session = lock_or_recover(&self.session, "CursorStateManager::warp");
        let Some(live) = session.as_mut() else {
            return false;
        };
        let wrap = live.motion.params().wrap_around;
        live.motion.set_position(apply_bounds(point, screen, wrap));
        self.publish(&session);
        true
    }

    /// Hold a direction. Returns the id of a ticker to start when motion begins.
    pub fn press_direction(&self, code: KeyCode, direction: Direction) -> Option<u64> {
        let mut session = lock_or_recover(&self.session, "CursorStateManager::press_direction");
        let live = session.as_mut()?;
        if live.held.press(code, direction) {
            live.motion.reset_acceleration();
        }
        let spawn = if live.ticking {
            None
        } else {
            let id = self.allocate_ticker_id();
            live.ticker_id = id;
            live.ticking = true;
            Some(id)
        };
        self.publish(&session);
        spawn
    }

    pub fn release_direction(&self, code: KeyCode) -> bool {
        let mut session = lock_or_recover(&self.session, "CursorStateManager::release_direction");
        let Some(live) = session.as_mut() else {
            return false;
        };
        if !live.held.release(code) {
            return false;
        }
        if live.held.is_empty() {
            live.motion.reset_acceleration();
        }
        self.publish(&session);
        true
    }

    /// One motion tick for ticker `ticker_id`. Returns false when that ticker
    /// should stop: the session ended, a newer ticker took over, or nothing is held.
    pub fn tick(&self, ticker_id: u64) -> bool {
        let screen = *self.screen.get();
        let mut session = lock_or_recover(&self.session, "CursorStateManager::tick");
        let Some(live) = session.as_mut() else {
            return false;
        };
        if live.ticker_id != ticker_id || !live.ticking {
            return false;
        }
        if live.held.is_empty() {
            live.ticking = false;
            live.motion.reset_acceleration();
            self.publish(&session);
            return false;
        }
        // Opposite keys cancel out; keep ticking until one is released.
        if live.motion.step(&live.held, screen) {
            self.publish(&session);
        }
        true
    }

    pub fn toggle_drag(&self) -> Option<DragToggle> {
        let mut session = lock_or_recover(&self.session, "CursorStateManager::toggle_drag");
        let live = session.as_mut()?;
        let here = live.motion.position();
        let toggle = match live.drag_anchor.take() {
            Some(from) => DragToggle::Finished { from, to: here },
            None => {
                live.drag_anchor = Some(here);
                DragToggle::Started(here)
            }
        };
        self.publish(&session);
        Some(toggle)
    }

    /// Rescale the cursor (and any drag anchor) proportionally to a new screen.
    pub fn rescale(&self, screen: ScreenDimensions) -> bool {
        let mut session = lock_or_recover(&self.session, "CursorStateManager::rescale");
        let Some(live) = session.as_mut() else {
            return false;
        };
        let old = live.screen;
        let wrap = live.motion.params().wrap_around;
        let scale = |p: Point| {
            let x = p.x * screen.width as f32 / old.width.max(1) as f32;
            let y = p.y * screen.height as f32 / old.height.max(1) as f32;
            apply_bounds(Point::new(x, y), screen, wrap)
        };
        let moved = scale(live.motion.position());
        live.motion.set_position(moved);
        live.drag_anchor = live.drag_anchor.map(scale);
        live.screen = screen;
        self.publish(&session);
        true
    }

    pub fn view(&self) -> StateReader<Option<CursorView>> {
        self.view.reader()
    }

    fn allocate_ticker_id(&self) -> u64 {
        let mut next = lock_or_recover(&self.next_ticker, "CursorStateManager::allocate_ticker_id");
        *next += 1;
        *next
    }

    fn publish(&self, session: &Option<CursorSession>) {
        let view = session.as_ref().map(|s| {
            let position = s.motion.position();
            CursorView {
                x: position.x,
                y: position.y,
                size: s.settings.cursor_size,
                moving: !s.held.is_empty(),
                dragging: s.drag_anchor.is_some(),
            }
        });
        self.view.set(view);
    }
}
