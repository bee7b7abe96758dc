use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};

use super::manager::GridStateManager;
use super::navigator::BackOutcome;
use crate::geometry::ScreenDimensions;
use crate::gesture::{DispatchOutcome, DropReason, GestureKind, GestureManager, GestureRequest};
use crate::keys::{
    digit_value, is_back_key, is_confirm_key, ConsumedKeys, Handled, KeyCode, KeyEvent,
};
use crate::mode::{ModeConflict, ModeCoordinator, OverlayMode};
use crate::settings::{KeyBindingSnapshot, OverlaySettings};
use crate::watch::StateReader;
use crate::{lock_or_recover, log_debug};

struct ConfirmPress {
    code: KeyCode,
    long_press_sent: bool,
}

#[derive(Default)]
struct GridKeyState {
    consumed: ConsumedKeys,
    confirm: Option<ConfirmPress>,
}

/// Turns key events into grid navigation and confirm gestures.
pub struct GridActionHandler {
    manager: Arc<GridStateManager>,
    coordinator: Arc<ModeCoordinator>,
    gestures: Arc<GestureManager>,
    settings: StateReader<OverlaySettings>,
    screen: StateReader<ScreenDimensions>,
    keys: Mutex<GridKeyState>,
}

impl GridActionHandler {
    pub fn new(
        manager: Arc<GridStateManager>,
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
            keys: Mutex::new(GridKeyState::default()),
        }
    }

    pub fn manager(&self) -> &Arc<GridStateManager> {
        &self.manager
    }

    pub fn try_handle(&self, event: &KeyEvent) -> Result<Handled> {
        let mut keys = lock_or_recover(&self.keys, "GridActionHandler::try_handle");
        match self.manager.session_settings() {
            Some(settings) => self.handle_active(&mut keys, &settings, event),
            None => Ok(self.handle_idle(&mut keys, event)),
        }
    }

    /// Enter grid mode without a key press (shortcut or host request).
    pub fn activate(&self) -> Result<(), ModeConflict> {
        self.open(self.settings.get())
    }

    /// Drop the session without touching the mode coordinator.
    pub fn force_reset(&self) {
        let mut keys = lock_or_recover(&self.keys, "GridActionHandler::force_reset");
        keys.confirm = None;
        if self.manager.hide() {
            log_debug("grid overlay force hidden");
        }
    }

    pub fn on_screen_changed(&self, screen: ScreenDimensions) {
        if self.manager.reset_to_root(screen) {
            tracing::debug!(
                width = screen.width,
                height = screen.height,
                "grid reset for new screen"
            );
        }
    }

    fn handle_idle(&self, keys: &mut GridKeyState, event: &KeyEvent) -> Handled {
        let code = event.code;
        if event.is_up() {
            return keys.consumed.release(code).into();
        }
        if keys.consumed.is_claimed(code) {
            return Handled::Consumed;
        }
        let settings = self.settings.get();
        if !event.is_initial_down() || settings.grid_key() != Some(code) {
            return Handled::NotConsumed;
        }
        match self.open(settings) {
            Ok(()) => {
                keys.consumed.claim(code);
                Handled::Consumed
            }
            Err(conflict) => {
                log_debug(&format!("grid activation key ignored: {conflict}"));
                Handled::NotConsumed
            }
        }
    }

    fn handle_active(
        &self,
        keys: &mut GridKeyState,
        settings: &KeyBindingSnapshot,
        event: &KeyEvent,
    ) -> Result<Handled> {
        let code = event.code;
        if settings.grid_key() == Some(code) {
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

        if is_confirm_key(code) {
            return self.handle_confirm(keys, settings, event);
        }

        if is_back_key(code) {
            if event.is_initial_down() {
                keys.consumed.claim(code);
                if self.manager.back() == Some(BackOutcome::Exit) {
                    self.close(keys);
                }
            } else if event.is_up() {
                keys.consumed.release(code);
            }
            return Ok(Handled::Consumed);
        }

        let navigator = self.manager.navigator();
        if let Some(cell) = digit_value(code).and_then(|digit| navigator.cell_for_digit(digit)) {
            if event.is_initial_down() {
                keys.consumed.claim(code);
                self.manager.select(cell);
            } else if event.is_up() {
                keys.consumed.release(code);
            }
            return Ok(Handled::Consumed);
        }

        if event.is_up() && keys.consumed.release(code) {
            return Ok(Handled::Consumed);
        }
        Ok(Handled::NotConsumed)
    }

    fn handle_confirm(
        &self,
        keys: &mut GridKeyState,
        settings: &KeyBindingSnapshot,
        event: &KeyEvent,
    ) -> Result<Handled> {
        let code = event.code;
        if event.is_initial_down() {
            keys.consumed.claim(code);
            keys.confirm = Some(ConfirmPress {
                code,
                long_press_sent: false,
            });
        } else if event.is_down() {
            let fire_long_press = match keys.confirm.as_mut() {
                Some(press) if press.code == code && !press.long_press_sent => {
                    press.long_press_sent = true;
                    true
                }
                _ => false,
            };
            if fire_long_press {
                self.confirm(keys, settings, GestureKind::LongPress)?;
            }
        } else {
            keys.consumed.release(code);
            if let Some(press) = keys.confirm.take() {
                if press.code == code && !press.long_press_sent {
                    self.confirm(keys, settings, GestureKind::Tap)?;
                }
            }
        }
        Ok(Handled::Consumed)
    }

    fn confirm(
        &self,
        keys: &mut GridKeyState,
        settings: &KeyBindingSnapshot,
        kind: GestureKind,
    ) -> Result<()> {
        let Some(target) = self.manager.target() else {
            return Ok(());
        };
        let request = match kind {
            GestureKind::LongPress => GestureRequest::LongPress(target),
            _ => GestureRequest::Tap(target),
        };
        tracing::info!(kind = kind.label(), x = target.x, y = target.y, "grid confirm");
        let ticket = self.gestures.perform(request);

        if settings.persist_overlay {
            self.manager.reset_to_root(*self.screen.get());
        } else {
            self.close(keys);
        }
        if ticket.try_outcome() == Some(DispatchOutcome::Dropped(DropReason::QueueClosed)) {
            bail!("gesture queue closed before grid {}", kind.label());
        }
        Ok(())
    }

    fn open(&self, settings: KeyBindingSnapshot) -> Result<(), ModeConflict> {
        self.coordinator.activate(OverlayMode::Grid)?;
        self.manager.show(settings, *self.screen.get());
        log_debug("grid overlay shown");
        Ok(())
    }

    fn close(&self, keys: &mut GridKeyState) {
        keys.confirm = None;
        self.manager.hide();
        self.coordinator.deactivate(OverlayMode::Grid);
        log_debug("grid overlay hidden");
    }
}
