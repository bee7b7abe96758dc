use std::sync::Arc;

use super::{KeyBindingSnapshot, OverlaySettings, SettingsError};
use crate::watch::{StateCell, StateReader};

/// What an accepted update touched that the running core has to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsChange {
    /// Activation keys or toggle/hold semantics changed; live modes must restart.
    pub activation_changed: bool,
    pub visualization_changed: bool,
}

/// The settings boundary: validates candidates and publishes accepted snapshots.
pub struct SettingsStore {
    cell: StateCell<OverlaySettings>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self {
            cell: StateCell::new(OverlaySettings::default()),
        }
    }
}

impl SettingsStore {
    pub fn new(initial: OverlaySettings) -> Result<Self, SettingsError> {
        initial.validate()?;
        Ok(Self {
            cell: StateCell::new(initial),
        })
    }

    /// Validate and publish. A rejected candidate leaves the current snapshot untouched.
    pub fn update(&self, next: OverlaySettings) -> Result<SettingsChange, SettingsError> {
        if let Err(err) = next.validate() {
            tracing::warn!(violations = err.violations.len(), error = %err, "settings rejected");
            return Err(err);
        }
        let current = self.cell.get();
        let change = SettingsChange {
            activation_changed: current.grid_activation_key != next.grid_activation_key
                || current.cursor_activation_key != next.cursor_activation_key
                || current.toggle_hold != next.toggle_hold,
            visualization_changed: current.show_gesture_visualization
                != next.show_gesture_visualization,
        };
        self.cell.publish(Arc::new(next));
        Ok(change)
    }

    pub fn current(&self) -> KeyBindingSnapshot {
        self.cell.get()
    }

    pub fn reader(&self) -> StateReader<OverlaySettings> {
        self.cell.reader()
    }
}
