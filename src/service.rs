//! Wiring for the whole input core behind one clonable handle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{AppConfig, DEFAULT_GESTURE_VISUAL_TTL_MS, DEFAULT_MOTION_TICK_MS};
use crate::cursor::{CursorActionHandler, CursorStateManager, CursorView};
use crate::geometry::{ScreenDimensions, ScreenGeometry};
use crate::gesture::{
    DispatchTicket, GestureBackends, GestureError, GestureKind, GestureManager, GesturePath,
    GesturePoint, GestureRequest,
};
use crate::grid::{GridActionHandler, GridStateManager, GridView};
use crate::keys::KeyEvent;
use crate::mode::{ModeConflict, ModeCoordinator, OverlayMode};
use crate::router::KeyEventRouter;
use crate::settings::{
    KeyBindingSnapshot, OverlaySettings, SettingsChange, SettingsError, SettingsStore,
};
use crate::watch::StateReader;
use crate::{lock_or_recover, log_debug};

/// Timing knobs that are not user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    pub motion_tick: Duration,
    pub visual_ttl: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            motion_tick: Duration::from_millis(DEFAULT_MOTION_TICK_MS),
            visual_ttl: Duration::from_millis(DEFAULT_GESTURE_VISUAL_TTL_MS),
        }
    }
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            motion_tick: config.motion_tick(),
            visual_ttl: config.visual_ttl(),
        }
    }
}

struct ServiceInner {
    settings: SettingsStore,
    geometry: ScreenGeometry,
    coordinator: Arc<ModeCoordinator>,
    gestures: Arc<GestureManager>,
    grid: Arc<GridActionHandler>,
    cursor: Arc<CursorActionHandler>,
    router: KeyEventRouter,
    /// Held across a whole routing pass and across every forced transition, so
    /// a force hide never lands between a handler's activation and its session.
    gate: Mutex<()>,
}

/// Handle to a running overlay core.
///
/// Cheap to clone; every clone drives the same core. Hand clones to the key
/// source, shortcut entry points and renderers instead of reaching for a
/// global.
#[derive(Clone)]
pub struct OverlayService {
    inner: Arc<ServiceInner>,
}

impl OverlayService {
    pub fn start(
        settings: OverlaySettings,
        screen: ScreenDimensions,
        backends: GestureBackends,
        options: ServiceOptions,
    ) -> Result<Self, SettingsError> {
        let visualization = settings.show_gesture_visualization;
        let settings = SettingsStore::new(settings)?;
        let geometry = ScreenGeometry::new(screen);
        let coordinator = Arc::new(ModeCoordinator::new());
        let gestures = Arc::new(GestureManager::new(
            backends,
            geometry.reader(),
            options.visual_ttl,
            visualization,
        ));
        let grid = Arc::new(GridActionHandler::new(
            Arc::new(GridStateManager::default()),
            Arc::clone(&coordinator),
            Arc::clone(&gestures),
            settings.reader(),
            geometry.reader(),
        ));
        let cursor = Arc::new(CursorActionHandler::new(
            Arc::new(CursorStateManager::new(geometry.reader(), options.motion_tick)),
            Arc::clone(&coordinator),
            Arc::clone(&gestures),
            settings.reader(),
            geometry.reader(),
        ));
        let router = KeyEventRouter::new(Arc::clone(&grid), Arc::clone(&cursor));
        tracing::info!(
            width = screen.width,
            height = screen.height,
            tick_ms = options.motion_tick.as_millis() as u64,
            "overlay service started"
        );
        Ok(Self {
            inner: Arc::new(ServiceInner {
                settings,
                geometry,
                coordinator,
                gestures,
                grid,
                cursor,
                router,
                gate: Mutex::new(()),
            }),
        })
    }

    /// Route one key event. True means it was consumed and must not reach the host.
    pub fn handle_key_event(&self, event: &KeyEvent) -> bool {
        let _gate = lock_or_recover(&self.inner.gate, "OverlayService::handle_key_event");
        self.inner.router.handle(event)
    }

    /// Shortcut entry: clear everything, then show the grid.
    pub fn activate_grid(&self) -> Result<(), ModeConflict> {
        let _gate = lock_or_recover(&self.inner.gate, "OverlayService::activate_grid");
        self.hide_all();
        self.inner.grid.activate()
    }

    /// Shortcut entry: clear everything, then show the cursor.
    pub fn activate_cursor(&self) -> Result<(), ModeConflict> {
        let _gate = lock_or_recover(&self.inner.gate, "OverlayService::activate_cursor");
        self.hide_all();
        self.inner.cursor.activate()
    }

    /// Leave both modes, stop motion, cancel queued gestures and clear trails.
    pub fn force_hide_all_overlays(&self) {
        let _gate = lock_or_recover(&self.inner.gate, "OverlayService::force_hide_all_overlays");
        self.hide_all();
    }

    /// Callers hold the gate.
    fn hide_all(&self) {
        let inner = &self.inner;
        inner.coordinator.force_deactivate_all();
        inner.grid.force_reset();
        inner.cursor.force_reset();
        inner.gestures.cancel_pending();
    }

    /// Validate and apply new settings. Live modes restart when the activation
    /// bindings change; an invalid candidate changes nothing.
    pub fn update_settings(&self, next: OverlaySettings) -> Result<SettingsChange, SettingsError> {
        let change = self.inner.settings.update(next)?;
        if change.activation_changed {
            log_debug("activation bindings changed; hiding overlays");
            self.force_hide_all_overlays();
        }
        if change.visualization_changed {
            let enabled = self.inner.settings.current().show_gesture_visualization;
            self.inner.gestures.set_visualization(enabled);
        }
        Ok(change)
    }

    /// Push new screen dimensions. Zero-sized screens are ignored.
    pub fn update_screen(&self, dims: ScreenDimensions) -> bool {
        if dims.width == 0 || dims.height == 0 {
            log_debug(&format!(
                "ignoring empty screen dimensions {} x {}",
                dims.width, dims.height
            ));
            return false;
        }
        let _gate = lock_or_recover(&self.inner.gate, "OverlayService::update_screen");
        if !self.inner.geometry.update(dims) {
            return false;
        }
        self.inner.grid.on_screen_changed(dims);
        self.inner.cursor.on_screen_changed(dims);
        true
    }

    pub fn set_gesture_visualization(&self, enabled: bool) {
        self.inner.gestures.set_visualization(enabled);
    }

    /// Queue a raw gesture path, bypassing the modes.
    pub fn dispatch_gesture(
        &self,
        kind: GestureKind,
        points: Vec<GesturePoint>,
        duration: Duration,
    ) -> Result<DispatchTicket, GestureError> {
        self.inner.gestures.dispatch(kind, points, duration)
    }

    pub fn perform_gesture(&self, request: GestureRequest) -> DispatchTicket {
        self.inner.gestures.perform(request)
    }

    pub fn current_mode(&self) -> OverlayMode {
        self.inner.coordinator.current()
    }

    pub fn settings(&self) -> KeyBindingSnapshot {
        self.inner.settings.current()
    }

    pub fn screen(&self) -> ScreenDimensions {
        self.inner.geometry.current()
    }

    pub fn mode_stream(&self) -> StateReader<OverlayMode> {
        self.inner.coordinator.reader()
    }

    pub fn grid_stream(&self) -> StateReader<Option<GridView>> {
        self.inner.grid.manager().view()
    }

    pub fn cursor_stream(&self) -> StateReader<Option<CursorView>> {
        self.inner.cursor.manager().view()
    }

    pub fn gesture_stream(&self) -> StateReader<Vec<Arc<GesturePath>>> {
        self.inner.gestures.paths()
    }

    pub fn settings_stream(&self) -> StateReader<OverlaySettings> {
        self.inner.settings.reader()
    }

    pub fn screen_stream(&self) -> StateReader<ScreenDimensions> {
        self.inner.geometry.reader()
    }

    /// Hide overlays, then let queued gestures finish and stop the worker.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        {
            let _gate = lock_or_recover(&inner.gate, "OverlayService::shutdown");
            inner.coordinator.force_deactivate_all();
            inner.grid.force_reset();
            inner.cursor.force_reset();
        }
        inner.gestures.shutdown();
        tracing::info!("overlay service stopped");
    }
}
