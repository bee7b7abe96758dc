use keytouch::geometry::ScreenDimensions;
use keytouch::gesture::{
    DispatchOutcome, DropReason, GestureBackends, GestureKind, GesturePath, GesturePoint,
    RecordingBackend,
};
use keytouch::keys::*;
use keytouch::mode::OverlayMode;
use keytouch::settings::OverlaySettings;
use keytouch::{OverlayService, ServiceOptions};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Harness {
    service: OverlayService,
    backend: Arc<RecordingBackend>,
}

impl Harness {
    fn new(settings: OverlaySettings) -> Self {
        let backend = Arc::new(RecordingBackend::new("rec"));
        let service = OverlayService::start(
            settings,
            ScreenDimensions::new(1080, 1920),
            GestureBackends::new(backend.clone()),
            ServiceOptions {
                motion_tick: Duration::from_millis(8),
                visual_ttl: Duration::from_millis(1_000),
            },
        )
        .expect("valid settings");
        Self { service, backend }
    }

    fn press(&self, code: KeyCode) -> bool {
        let down = self.service.handle_key_event(&KeyEvent::down(code));
        let up = self.service.handle_key_event(&KeyEvent::up(code));
        down && up
    }

    fn wait_for_gestures(&self, count: usize) -> Vec<GesturePath> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.backend.dispatch_count() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        self.backend.records().into_iter().map(|r| r.path).collect()
    }
}

fn approx(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 0.5
}

#[test]
fn grid_drill_down_taps_the_deepest_cell() {
    let harness = Harness::new(OverlaySettings {
        grid_levels: 3,
        ..OverlaySettings::default()
    });
    assert!(harness.press(KEY_POUND));
    assert_eq!(harness.service.current_mode(), OverlayMode::Grid);
    for _ in 0..3 {
        assert!(harness.press(KEY_9));
    }
    let view = harness.service.grid_stream().get();
    assert_eq!((*view).as_ref().map(|v| v.depth), Some(3));

    assert!(harness.press(KEY_ENTER));
    let paths = harness.wait_for_gestures(1);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].kind(), GestureKind::Tap);
    let at = paths[0].start();
    assert!(approx(at.x, 1060.0) && approx(at.y, 1884.0), "tap at {at:?}");
    assert_eq!(harness.service.current_mode(), OverlayMode::Inactive);
    assert!(harness.service.grid_stream().get().is_none());
}

#[test]
fn colliding_activation_keys_are_rejected_without_side_effects() {
    let harness = Harness::new(OverlaySettings::default());
    assert!(harness.press(KEY_POUND));

    let err = harness
        .service
        .update_settings(OverlaySettings {
            grid_activation_key: KEY_STAR,
            cursor_activation_key: KEY_STAR,
            ..OverlaySettings::default()
        })
        .expect_err("collision");
    assert!(err.has_key_collision());
    assert_eq!(harness.service.settings().grid_activation_key, KEY_POUND);
    assert_eq!(harness.service.current_mode(), OverlayMode::Grid);
}

#[test]
fn activation_key_change_hides_the_live_mode() {
    let harness = Harness::new(OverlaySettings::default());
    assert!(harness.press(KEY_STAR));
    assert_eq!(harness.service.current_mode(), OverlayMode::Cursor);

    let change = harness
        .service
        .update_settings(OverlaySettings {
            cursor_activation_key: KEY_VOLUME_UP,
            ..OverlaySettings::default()
        })
        .expect("valid settings");
    assert!(change.activation_changed);
    assert_eq!(harness.service.current_mode(), OverlayMode::Inactive);
    assert!(harness.service.cursor_stream().get().is_none());
    assert!(!harness.press(KEY_STAR));
    assert!(harness.press(KEY_VOLUME_UP));
    assert_eq!(harness.service.current_mode(), OverlayMode::Cursor);
}

#[test]
fn modes_stay_exclusive_under_interleaved_activation() {
    let harness = Harness::new(OverlaySettings::default());
    let workers: Vec<_> = [KEY_POUND, KEY_STAR]
        .into_iter()
        .map(|code| {
            let service = harness.service.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    service.handle_key_event(&KeyEvent::down(code));
                    service.handle_key_event(&KeyEvent::up(code));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let grid_visible = harness.service.grid_stream().get().is_some();
    let cursor_visible = harness.service.cursor_stream().get().is_some();
    assert!(!(grid_visible && cursor_visible));
    match harness.service.current_mode() {
        OverlayMode::Grid => assert!(grid_visible),
        OverlayMode::Cursor => assert!(cursor_visible),
        OverlayMode::Inactive => assert!(!grid_visible && !cursor_visible),
    }
}

#[test]
fn other_mode_key_passes_through_while_a_mode_is_active() {
    let harness = Harness::new(OverlaySettings::default());
    assert!(harness.press(KEY_POUND));
    assert!(!harness.press(KEY_STAR));
    assert_eq!(harness.service.current_mode(), OverlayMode::Grid);
}

#[test]
fn force_hide_clears_every_stream() {
    let harness = Harness::new(OverlaySettings::default());
    harness.service.activate_cursor().expect("cursor");
    assert!(harness.press(KEY_DPAD_CENTER));
    harness.wait_for_gestures(1);
    assert!(!harness.service.gesture_stream().get().is_empty());

    harness.service.force_hide_all_overlays();
    assert_eq!(harness.service.current_mode(), OverlayMode::Inactive);
    assert!(harness.service.cursor_stream().get().is_none());
    assert!(harness.service.grid_stream().get().is_none());
    assert!(harness.service.gesture_stream().get().is_empty());
}

#[test]
fn shortcuts_replace_whichever_mode_is_live() {
    let harness = Harness::new(OverlaySettings::default());
    harness.service.activate_grid().expect("grid");
    assert_eq!(harness.service.current_mode(), OverlayMode::Grid);
    harness.service.activate_cursor().expect("cursor");
    assert_eq!(harness.service.current_mode(), OverlayMode::Cursor);
    assert!(harness.service.grid_stream().get().is_none());
    assert!(harness.service.cursor_stream().get().is_some());
}

#[test]
fn rotation_rescales_the_cursor() {
    let harness = Harness::new(OverlaySettings::default());
    harness.service.activate_cursor().expect("cursor");
    assert!(harness
        .service
        .update_screen(ScreenDimensions::new(1920, 1080)));
    assert!(!harness.service.update_screen(ScreenDimensions::new(0, 1080)));

    assert!(harness.press(KEY_DPAD_CENTER));
    let paths = harness.wait_for_gestures(1);
    let at = paths[0].start();
    assert!(approx(at.x, 960.0) && approx(at.y, 540.0), "tap at {at:?}");
}

#[test]
fn raw_gestures_bypass_the_modes() {
    let harness = Harness::new(OverlaySettings::default());
    let ticket = harness
        .service
        .dispatch_gesture(
            GestureKind::Swipe,
            vec![GesturePoint::new(100.0, 100.0, 0), GesturePoint::new(100.0, 600.0, 200)],
            Duration::from_millis(200),
        )
        .expect("valid path");
    let outcome = ticket.wait(Duration::from_secs(5)).expect("outcome");
    assert!(outcome.is_delivered());
    assert!(harness
        .service
        .dispatch_gesture(GestureKind::Tap, Vec::new(), Duration::from_millis(50))
        .is_err());
    assert_eq!(harness.service.current_mode(), OverlayMode::Inactive);
}

#[test]
fn failing_confirm_is_reported_as_not_consumed() {
    let harness = Harness::new(OverlaySettings::default());
    harness.service.shutdown();

    harness.service.activate_grid().expect("grid");
    assert!(harness
        .service
        .handle_key_event(&KeyEvent::down(KEY_ENTER)));
    assert!(!harness.service.handle_key_event(&KeyEvent::up(KEY_ENTER)));
    assert_eq!(harness.backend.dispatch_count(), 0);

    let ticket = harness.service.dispatch_gesture(
        GestureKind::Tap,
        vec![GesturePoint::new(10.0, 10.0, 0)],
        Duration::from_millis(50),
    );
    assert_eq!(
        ticket.expect("valid path").try_outcome(),
        Some(DispatchOutcome::Dropped(DropReason::QueueClosed))
    );
}

#[test]
fn force_hide_racing_activation_keeps_mode_and_sessions_in_step() {
    let harness = Harness::new(OverlaySettings::default());
    for _ in 0..500 {
        harness.service.activate_grid().expect("grid");
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let hider = {
            let service = harness.service.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.force_hide_all_overlays();
            })
        };
        barrier.wait();
        harness.service.handle_key_event(&KeyEvent::down(KEY_STAR));
        harness.service.handle_key_event(&KeyEvent::up(KEY_STAR));
        hider.join().expect("hider");

        let grid_visible = harness.service.grid_stream().get().is_some();
        let cursor_visible = harness.service.cursor_stream().get().is_some();
        match harness.service.current_mode() {
            OverlayMode::Cursor => assert!(cursor_visible && !grid_visible),
            OverlayMode::Grid => panic!("grid survived a force hide"),
            OverlayMode::Inactive => assert!(!grid_visible && !cursor_visible),
        }
    }
}
