use super::*;
use crate::geometry::{Point, ScreenDimensions, ScreenGeometry};
use crate::gesture::{GestureBackends, GestureKind, GestureManager, GesturePath, RecordingBackend};
use crate::keys::*;
use crate::mode::{ModeCoordinator, OverlayMode};
use crate::settings::{ControlScheme, OverlaySettings};
use crate::watch::StateCell;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(16);

fn screen() -> ScreenDimensions {
    ScreenDimensions::new(1080, 1920)
}

fn manager_for(settings: OverlaySettings) -> (CursorStateManager, ScreenGeometry) {
    let geometry = ScreenGeometry::new(screen());
    let manager = CursorStateManager::new(geometry.reader(), TICK);
    manager.show(Arc::new(settings));
    (manager, geometry)
}

fn wrapping() -> OverlaySettings {
    OverlaySettings {
        cursor_wrap_around: true,
        ..OverlaySettings::default()
    }
}

#[test]
fn wraps_past_right_edge_modulo_width() {
    let settings = wrapping();
    let params = MotionParams::from_settings(&settings, TICK);
    let (manager, _geometry) = manager_for(settings);
    manager.warp(Point::new(1075.0, 960.0));

    let ticker = manager.press_direction(KEY_DPAD_RIGHT, Direction::Right).unwrap();
    assert!(manager.tick(ticker));
    assert!(manager.tick(ticker));

    let expected = (1075.0 + params.tick_distance(1) + params.tick_distance(2)).rem_euclid(1080.0);
    let position = manager.position().unwrap();
    assert!((position.x - expected).abs() < 1e-3, "{} vs {expected}", position.x);
    assert!(position.x < 1080.0);
    assert_eq!(position.y, 960.0);
}

#[test]
fn clamps_at_edges_without_wrap() {
    let (manager, _geometry) = manager_for(OverlaySettings::default());
    manager.warp(Point::new(1075.0, 3.0));
    let ticker = manager.press_direction(KEY_DPAD_RIGHT, Direction::Right).unwrap();
    manager.press_direction(KEY_DPAD_UP, Direction::Up);
    for _ in 0..5 {
        manager.tick(ticker);
    }
    assert_eq!(manager.position().unwrap(), Point::new(1079.0, 0.0));
}

#[test]
fn wrap_handles_negative_coordinates() {
    let wrapped = apply_bounds(Point::new(-10.0, -1e-7), screen(), true);
    assert_eq!(wrapped.x, 1070.0);
    assert!(wrapped.y >= 0.0 && wrapped.y < 1920.0);
}

#[test]
fn acceleration_is_monotonic_and_capped() {
    let settings = OverlaySettings {
        cursor_speed: 4,
        cursor_acceleration: 10,
        ..OverlaySettings::default()
    };
    let params = MotionParams::from_settings(&settings, TICK);
    let cap = params.base_speed * params.ceiling;
    let mut previous = 0.0;
    for n in 1..300 {
        let distance = params.tick_distance(n);
        assert!(distance >= previous);
        assert!(distance <= cap + 1e-4);
        previous = distance;
    }
    assert!((params.tick_distance(1_000) - cap).abs() < 1e-4);
}

#[test]
fn zero_acceleration_keeps_constant_speed() {
    let settings = OverlaySettings {
        cursor_acceleration: 0,
        ..OverlaySettings::default()
    };
    let params = MotionParams::from_settings(&settings, TICK);
    assert_eq!(params.tick_distance(1), params.tick_distance(500));
}

#[test]
fn release_stops_motion_on_next_tick() {
    let (manager, _geometry) = manager_for(OverlaySettings::default());
    let ticker = manager.press_direction(KEY_DPAD_LEFT, Direction::Left).unwrap();
    assert!(manager.tick(ticker));
    assert!(manager.release_direction(KEY_DPAD_LEFT));
    let stopped_at = manager.position();
    assert!(!manager.tick(ticker));
    assert_eq!(manager.position(), stopped_at);
}

#[test]
fn acceleration_restarts_after_release() {
    let settings = OverlaySettings {
        cursor_acceleration: 10,
        ..OverlaySettings::default()
    };
    let params = MotionParams::from_settings(&settings, TICK);
    let (manager, _geometry) = manager_for(settings);
    let ticker = manager.press_direction(KEY_DPAD_DOWN, Direction::Down).unwrap();
    for _ in 0..40 {
        manager.tick(ticker);
    }
    manager.release_direction(KEY_DPAD_DOWN);
    assert!(manager.press_direction(KEY_DPAD_DOWN, Direction::Down).is_none());
    let before = manager.position().unwrap();
    manager.tick(ticker);
    let after = manager.position().unwrap();
    assert!((after.y - before.y - params.tick_distance(1)).abs() < 1e-3);
}

#[test]
fn adding_a_direction_keeps_built_up_speed() {
    let settings = OverlaySettings {
        cursor_speed: 1,
        cursor_acceleration: 10,
        ..OverlaySettings::default()
    };
    let params = MotionParams::from_settings(&settings, TICK);
    let (manager, _geometry) = manager_for(settings);
    manager.warp(Point::new(100.0, 960.0));
    let ticker = manager.press_direction(KEY_DPAD_RIGHT, Direction::Right).unwrap();
    for _ in 0..40 {
        manager.tick(ticker);
    }
    assert!(manager.press_direction(KEY_DPAD_UP, Direction::Up).is_none());
    let before = manager.position().unwrap();
    assert!(manager.tick(ticker));
    let after = manager.position().unwrap();
    let expected = params.tick_distance(41) * std::f32::consts::FRAC_1_SQRT_2;
    assert!((after.x - before.x - expected).abs() < 1e-3);
    assert!(after.x - before.x > params.tick_distance(1));
}

#[test]
fn opposite_keys_cancel_without_stopping_ticker() {
    let (manager, _geometry) = manager_for(OverlaySettings::default());
    let ticker = manager.press_direction(KEY_DPAD_LEFT, Direction::Left).unwrap();
    manager.press_direction(KEY_DPAD_RIGHT, Direction::Right);
    let start = manager.position();
    assert!(manager.tick(ticker));
    assert_eq!(manager.position(), start);
    manager.release_direction(KEY_DPAD_LEFT);
    assert!(manager.tick(ticker));
    assert!(manager.position().unwrap().x > start.unwrap().x);
}

#[test]
fn diagonal_moves_at_unit_speed() {
    let settings = OverlaySettings::default();
    let params = MotionParams::from_settings(&settings, TICK);
    let (manager, _geometry) = manager_for(settings);
    let start = manager.position().unwrap();
    let ticker = manager.press_direction(KEY_9, Direction::DownRight).unwrap();
    manager.tick(ticker);
    let end = manager.position().unwrap();
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    assert!((dx - dy).abs() < 1e-3);
    assert!(((dx * dx + dy * dy).sqrt() - params.tick_distance(1)).abs() < 1e-3);
}

#[test]
fn stale_ticker_cannot_move_new_session() {
    let (manager, _geometry) = manager_for(OverlaySettings::default());
    let old = manager.press_direction(KEY_DPAD_UP, Direction::Up).unwrap();
    manager.hide();
    assert!(!manager.tick(old));
    manager.show(Arc::new(OverlaySettings::default()));
    let fresh = manager.press_direction(KEY_DPAD_UP, Direction::Up).unwrap();
    assert_ne!(old, fresh);
    let before = manager.position();
    assert!(!manager.tick(old));
    assert_eq!(manager.position(), before);
}

#[test]
fn rescale_keeps_relative_position() {
    let (manager, _geometry) = manager_for(OverlaySettings::default());
    manager.warp(Point::new(270.0, 480.0));
    assert!(manager.rescale(ScreenDimensions::new(2160, 3840)));
    assert_eq!(manager.position().unwrap(), Point::new(540.0, 960.0));
}

#[test]
fn standard_and_numpad_bindings_differ() {
    assert_eq!(
        action_for(ControlScheme::Standard, KEY_DPAD_UP),
        Some(CursorAction::Move(Direction::Up))
    );
    assert_eq!(
        action_for(ControlScheme::Numpad, KEY_DPAD_UP),
        Some(CursorAction::Scroll(ScrollDirection::Up))
    );
    assert_eq!(
        action_for(ControlScheme::Standard, KEY_8),
        Some(CursorAction::Scroll(ScrollDirection::Down))
    );
    assert_eq!(
        action_for(ControlScheme::Numpad, KEY_NUMPAD_1),
        Some(CursorAction::Move(Direction::UpLeft))
    );
    assert_eq!(action_for(ControlScheme::Numpad, KEY_5), Some(CursorAction::Click));
    assert_eq!(action_for(ControlScheme::Standard, KEY_5), None);
    assert_eq!(action_for(ControlScheme::Standard, KEY_0), Some(CursorAction::ToggleDrag));
    assert_eq!(action_for(ControlScheme::Numpad, KEY_BACK), Some(CursorAction::Exit));
}

#[test]
fn scroll_direction_follows_natural_setting() {
    let at = Point::new(540.0, 960.0);
    let end_y = |natural: bool| {
        let settings = OverlaySettings {
            use_natural_scrolling: natural,
            scroll_multiplier: 2.0,
            ..OverlaySettings::default()
        };
        match scroll_gesture(at, ScrollDirection::Down, &settings, screen()) {
            crate::gesture::GestureRequest::Swipe { to, .. } => to.y,
            other => panic!("unexpected request {other:?}"),
        }
    };
    assert_eq!(end_y(false), 0.0);
    assert_eq!(end_y(true), 1920.0);
}

struct Fixture {
    handler: CursorActionHandler,
    coordinator: Arc<ModeCoordinator>,
    backend: Arc<RecordingBackend>,
    _settings: StateCell<OverlaySettings>,
    _geometry: ScreenGeometry,
}

impl Fixture {
    fn new(settings: OverlaySettings) -> Self {
        let geometry = ScreenGeometry::new(screen());
        let settings = StateCell::new(settings);
        let coordinator = Arc::new(ModeCoordinator::new());
        let backend = Arc::new(RecordingBackend::new("rec"));
        let gestures = Arc::new(GestureManager::new(
            GestureBackends::new(backend.clone()),
            geometry.reader(),
            Duration::from_millis(500),
            true,
        ));
        let handler = CursorActionHandler::new(
            Arc::new(CursorStateManager::new(geometry.reader(), TICK)),
            Arc::clone(&coordinator),
            gestures,
            settings.reader(),
            geometry.reader(),
        );
        Self {
            handler,
            coordinator,
            backend,
            _settings: settings,
            _geometry: geometry,
        }
    }

    fn send(&self, event: KeyEvent) -> bool {
        self.handler.try_handle(&event).expect("handler").is_consumed()
    }

    fn tap_key(&self, code: KeyCode) {
        assert!(self.send(KeyEvent::down(code)), "down {code}");
        assert!(self.send(KeyEvent::up(code)), "up {code}");
    }

    fn position(&self) -> Option<Point> {
        self.handler.manager().position()
    }

    fn wait_for_gestures(&self, count: usize) -> Vec<GesturePath> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.backend.dispatch_count() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        self.backend.records().into_iter().map(|r| r.path).collect()
    }
}

#[test]
fn activation_key_toggles_cursor_at_center() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    assert_eq!(fx.coordinator.current(), OverlayMode::Cursor);
    assert_eq!(fx.position(), Some(Point::new(540.0, 960.0)));
    let view = (*fx.handler.manager().view().get()).clone().unwrap();
    assert_eq!(view.size, 5);
    fx.tap_key(KEY_STAR);
    assert_eq!(fx.coordinator.current(), OverlayMode::Inactive);
    assert!(fx.handler.manager().view().get().is_none());
}

#[test]
fn activation_key_passes_through_while_grid_active() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.coordinator.activate(OverlayMode::Grid).unwrap();
    assert!(!fx.send(KeyEvent::down(KEY_STAR)));
    assert!(fx.position().is_none());
}

#[test]
fn click_taps_and_hold_long_presses_at_cursor() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    fx.tap_key(KEY_DPAD_CENTER);
    assert!(fx.send(KeyEvent::down(KEY_ENTER)));
    assert!(fx.send(KeyEvent::repeat(KEY_ENTER, 1)));
    assert!(fx.send(KeyEvent::repeat(KEY_ENTER, 2)));
    assert!(fx.send(KeyEvent::up(KEY_ENTER)));

    let gestures = fx.wait_for_gestures(2);
    assert_eq!(fx.backend.kinds(), vec![GestureKind::Tap, GestureKind::LongPress]);
    assert!(gestures.iter().all(|g| g.start() == Point::new(540.0, 960.0)));
    assert_eq!(fx.coordinator.current(), OverlayMode::Cursor);
}

#[test]
fn scroll_key_swipes_from_cursor() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    fx.tap_key(KEY_8);
    let gestures = fx.wait_for_gestures(1);
    assert_eq!(gestures[0].kind(), GestureKind::Swipe);
    assert_eq!(gestures[0].start(), Point::new(540.0, 960.0));
    assert_eq!(gestures[0].end(), Point::new(540.0, 480.0));
}

#[test]
fn drag_needs_two_presses() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    fx.tap_key(KEY_0);
    assert!((*fx.handler.manager().view().get()).as_ref().unwrap().dragging);
    fx.handler.manager().warp(Point::new(100.0, 100.0));
    fx.tap_key(KEY_0);
    let gestures = fx.wait_for_gestures(1);
    assert_eq!(gestures[0].kind(), GestureKind::Drag);
    assert_eq!(gestures[0].start(), Point::new(540.0, 960.0));
    assert_eq!(gestures[0].end(), Point::new(100.0, 100.0));
}

#[test]
fn back_key_leaves_cursor_mode() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    fx.tap_key(KEY_BACK);
    assert_eq!(fx.coordinator.current(), OverlayMode::Inactive);
    assert!(!fx.send(KeyEvent::down(KEY_DPAD_UP)));
}

#[test]
fn held_direction_moves_until_released() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    assert!(fx.send(KeyEvent::down(KEY_DPAD_RIGHT)));
    thread::sleep(Duration::from_millis(150));
    assert!(fx.send(KeyEvent::repeat(KEY_DPAD_RIGHT, 1)));
    assert!(fx.send(KeyEvent::up(KEY_DPAD_RIGHT)));
    let released_at = fx.position().unwrap();
    assert!(released_at.x > 540.0);
    assert_eq!(released_at.y, 960.0);
    thread::sleep(Duration::from_millis(80));
    assert_eq!(fx.position().unwrap(), released_at);
}

#[test]
fn deactivating_mid_motion_leaves_no_cursor_behind() {
    let fx = Fixture::new(OverlaySettings::default());
    fx.tap_key(KEY_STAR);
    assert!(fx.send(KeyEvent::down(KEY_DPAD_DOWN)));
    thread::sleep(Duration::from_millis(40));
    fx.tap_key(KEY_STAR);
    let mut views = fx.handler.manager().view().subscribe();
    thread::sleep(Duration::from_millis(80));
    assert!(views.try_changed().is_none());
    assert!(fx.handler.manager().view().get().is_none());
    // The direction release reaches the handler after the mode is gone.
    assert!(fx.send(KeyEvent::up(KEY_DPAD_DOWN)));
}

#[test]
fn hold_mode_cursor_lives_while_key_is_down() {
    let fx = Fixture::new(OverlaySettings {
        toggle_hold: true,
        ..OverlaySettings::default()
    });
    assert!(fx.send(KeyEvent::down(KEY_STAR)));
    assert_eq!(fx.coordinator.current(), OverlayMode::Cursor);
    fx.tap_key(KEY_DPAD_CENTER);
    assert!(fx.send(KeyEvent::up(KEY_STAR)));
    assert_eq!(fx.coordinator.current(), OverlayMode::Inactive);
    assert_eq!(fx.wait_for_gestures(1).len(), 1);
}
