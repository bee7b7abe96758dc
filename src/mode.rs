//! Arbiter that keeps Grid and Cursor mode mutually exclusive.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

use crate::lock_or_recover;
use crate::watch::{StateCell, StateReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    Inactive,
    Grid,
    Cursor,
}

impl OverlayMode {
    pub fn label(self) -> &'static str {
        match self {
            OverlayMode::Inactive => "inactive",
            OverlayMode::Grid => "grid",
            OverlayMode::Cursor => "cursor",
        }
    }
}

/// Activation refused because the other mode holds the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeConflict {
    pub requested: OverlayMode,
    pub active: OverlayMode,
}

impl fmt::Display for ModeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot activate {} mode while {} mode is active",
            self.requested.label(),
            self.active.label()
        )
    }
}

impl std::error::Error for ModeConflict {}

/// Linearizes activation requests from both handlers.
///
/// The mutex is held across the check and the publish, so two handlers racing
/// for the overlay can never both observe themselves as the winner, and the
/// published stream sees transitions in the order they were decided.
pub struct ModeCoordinator {
    current: Mutex<OverlayMode>,
    published: StateCell<OverlayMode>,
}

impl Default for ModeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeCoordinator {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(OverlayMode::Inactive),
            published: StateCell::new(OverlayMode::Inactive),
        }
    }

    pub fn activate(&self, mode: OverlayMode) -> Result<(), ModeConflict> {
        if mode == OverlayMode::Inactive {
            self.force_deactivate_all();
            return Ok(());
        }
        let mut current = lock_or_recover(&self.current, "ModeCoordinator::activate");
        match *current {
            active if active == mode => Ok(()),
            OverlayMode::Inactive => {
                *current = mode;
                self.published.set(mode);
                tracing::debug!(mode = mode.label(), "overlay mode activated");
                Ok(())
            }
            active => {
                crate::log_debug(&format!(
                    "Refusing {} activation: {} active",
                    mode.label(),
                    active.label()
                ));
                Err(ModeConflict {
                    requested: mode,
                    active,
                })
            }
        }
    }

    /// Release `mode` if it is the active one. Returns true if it was active.
    pub fn deactivate(&self, mode: OverlayMode) -> bool {
        let mut current = lock_or_recover(&self.current, "ModeCoordinator::deactivate");
        if *current != mode || mode == OverlayMode::Inactive {
            return false;
        }
        *current = OverlayMode::Inactive;
        self.published.set(OverlayMode::Inactive);
        tracing::debug!(mode = mode.label(), "overlay mode deactivated");
        true
    }

    pub fn force_deactivate_all(&self) {
        let mut current = lock_or_recover(&self.current, "ModeCoordinator::force_deactivate_all");
        if *current == OverlayMode::Inactive {
            return;
        }
        tracing::info!(mode = current.label(), "overlay mode force deactivated");
        *current = OverlayMode::Inactive;
        self.published.set(OverlayMode::Inactive);
    }

    pub fn current(&self) -> OverlayMode {
        *lock_or_recover(&self.current, "ModeCoordinator::current")
    }

    pub fn is_active(&self, mode: OverlayMode) -> bool {
        self.current() == mode
    }

    pub fn reader(&self) -> StateReader<OverlayMode> {
        self.published.reader()
    }
}
