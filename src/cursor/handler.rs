use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};

use super::manager::{CursorStateManager, DragToggle};
use super::scheme::{action_for, drag_gesture, scroll_gesture, CursorAction};
use super::ticker::MotionTicker;
use crate::geometry::ScreenDimensions;
use crate::gesture::{DispatchOutcome, DropReason, GestureManager, GestureRequest};
use crate::keys::{ConsumedKeys, Handled, KeyCode, KeyEvent};
use crate::mode::{ModeConflict, ModeCoordinator, OverlayMode};
use crate::settings::{KeyBindingSnapshot, OverlaySettings};
use crate::watch::StateReader;
use crate::{lock_or_recover, log_debug};

struct ClickPress {
    code: KeyCode,
    long_press_sent: bool,
}

#[derive(Default)]
struct CursorKeyState {
    consumed: ConsumedKeys,
    click: Option<ClickPress>,
    ticker: Option<MotionTicker>,
}

impl CursorKeyState {
    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

/// Turns key events into cursor motion, clicks, scrolls and drags.
pub struct CursorActionHandler {
    manager: Arc<CursorStateManager>,
    coordinator: Arc<ModeCoordinator>,
    gestures: Arc<GestureManager>,
    settings: StateReader<OverlaySettings>,
    screen: StateReader<ScreenDimensions>,
    keys: Mutex<CursorKeyState>,
}

impl CursorActionHandler {
    pub fn new(
        manager: Arc<CursorStateManager>,
        coordinator: Arc<ModeCoordinator>,
        gestures: Arc<GestureManager>,
        settings: StateReader<OverlaySettings>,
        screen: StateReader<ScreenDimensions>,
    ) -> Self {
        Self {
            manager,
            coordinator,
            gestures,
            settings,
            screen,
            keys: Mutex::new(CursorKeyState::default()),
        }
    }

    pub fn manager(&self) -> &Arc<CursorStateManager> {
        &self.manager
    }

    pub fn try_handle(&self, event: &KeyEvent) -> Result<Handled> {
        let mut keys = lock_or_recover(&self.keys, "CursorActionHandler::try_handle");
        match self.manager.session_settings() {
            Some(settings) => self.handle_active(&mut keys, &settings, event),
            None => Ok(self.handle_idle(&mut keys, event)),
        }
    }

    /// Enter cursor mode without a key press.
    pub fn activate(&self) -> Result<(), ModeConflict> {
        self.open(self.settings.get())
    }

    /// Stop motion and drop the session without touching the mode coordinator.
    pub fn force_reset(&self) {
        let mut keys = lock_or_recover(&self.keys, "CursorActionHandler::force_reset");
        keys.stop_ticker();
        keys.click = None;
        if self.manager.hide() {
            log_debug("cursor overlay force hidden");
        }
    }

    pub fn on_screen_changed(&self, screen: ScreenDimensions) {
        if self.manager.rescale(screen) {
            tracing::debug!(
                width = screen.width,
                height = screen.height,
                "cursor rescaled for new screen"
            );
        }
    }

    fn handle_idle(&self, keys: &mut CursorKeyState, event: &KeyEvent) -> Handled {
        let code = event.code;
        if event.is_up() {
            return keys.consumed.release(code).into();
        }
        if keys.consumed.is_claimed(code) {
            return Handled::Consumed;
        }
        let settings = self.settings.get();
        if !event.is_initial_down() || settings.cursor_key() != Some(code) {
            return Handled::NotConsumed;
        }
        match self.open(settings) {
            Ok(()) => {
                keys.consumed.claim(code);
                Handled::Consumed
            }
            Err(conflict) => {
                log_debug(&format!("cursor activation key ignored: {conflict}"));
                Handled::NotConsumed
            }
        }
    }

    fn handle_active(
        &self,
        keys: &mut CursorKeyState,
        settings: &KeyBindingSnapshot,
        event: &KeyEvent,
    ) -> Result<Handled> {
        let code = event.code;
        if settings.cursor_key() == Some(code) {
            if event.is_initial_down() {
                keys.consumed.claim(code);
                if !settings.toggle_hold {
                    self.close(keys);
                }
            } else if event.is_up() {
                keys.consumed.release(code);
                if settings.toggle_hold {
                    self.close(keys);
                }
            }
            return Ok(Handled::Consumed);
        }

        let Some(action) = action_for(settings.control_scheme, code) else {
            if event.is_up() && keys.consumed.release(code) {
                return Ok(Handled::Consumed);
            }
            return Ok(Handled::NotConsumed);
        };

        if let CursorAction::Click = action {
            return self.handle_click(keys, event);
        }
        if let CursorAction::Move(direction) = action {
            if event.is_initial_down() {
                keys.consumed.claim(code);
                if let Some(ticker_id) = self.manager.press_direction(code, direction) {
                    keys.stop_ticker();
                    keys.ticker = Some(MotionTicker::spawn(Arc::clone(&self.manager), ticker_id));
                }
            } else if event.is_up() {
                keys.consumed.release(code);
                self.manager.release_direction(code);
            }
            return Ok(Handled::Consumed);
        }

        if event.is_up() {
            keys.consumed.release(code);
            return Ok(Handled::Consumed);
        }
        if !event.is_initial_down() {
            return Ok(Handled::Consumed);
        }
        keys.consumed.claim(code);
        match action {
            CursorAction::Exit => self.close(keys),
            CursorAction::Scroll(direction) => {
                if let Some(at) = self.manager.position() {
                    let request = scroll_gesture(at, direction, settings, *self.screen.get());
                    self.send(request)?;
                }
            }
            CursorAction::ToggleDrag => match self.manager.toggle_drag() {
                Some(DragToggle::Started(at)) => {
                    log_debug(&format!("drag anchored at ({:.0}, {:.0})", at.x, at.y));
                }
                Some(DragToggle::Finished { from, to }) => {
                    self.send(drag_gesture(from, to, settings))?;
                }
                None => {}
            },
            CursorAction::Click | CursorAction::Move(_) => {}
        }
        Ok(Handled::Consumed)
    }

    fn handle_click(&self, keys: &mut CursorKeyState, event: &KeyEvent) -> Result<Handled> {
        let code = event.code;
        if event.is_initial_down() {
            keys.consumed.claim(code);
            keys.click = Some(ClickPress {
                code,
                long_press_sent: false,
            });
            return Ok(Handled::Consumed);
        }
        let request = if event.is_down() {
            match keys.click.as_mut() {
                Some(press) if press.code == code && !press.long_press_sent => {
                    press.long_press_sent = true;
                    self.manager.position().map(GestureRequest::LongPress)
                }
                _ => None,
            }
        } else {
            keys.consumed.release(code);
            match keys.click.take() {
                Some(press) if press.code == code && !press.long_press_sent => {
                    self.manager.position().map(GestureRequest::Tap)
                }
                _ => None,
            }
        };
        if let Some(request) = request {
            self.send(request)?;
        }
        Ok(Handled::Consumed)
    }

    fn send(&self, request: GestureRequest) -> Result<()> {
        tracing::info!(kind = request.kind().label(), "cursor gesture");
        let ticket = self.gestures.perform(request);
        if ticket.try_outcome() == Some(DispatchOutcome::Dropped(DropReason::QueueClosed)) {
            bail!("gesture queue closed before cursor {}", request.kind().label());
        }
        Ok(())
    }

    fn open(&self, settings: KeyBindingSnapshot) -> Result<(), ModeConflict> {
        self.coordinator.activate(OverlayMode::Cursor)?;
        self.manager.show(settings);
        log_debug("cursor overlay shown");
        Ok(())
    }

    fn close(&self, keys: &mut CursorKeyState) {
        keys.stop_ticker();
        keys.click = None;
        self.manager.hide();
        self.coordinator.deactivate(OverlayMode::Cursor);
        log_debug("cursor overlay hidden");
    }
}
