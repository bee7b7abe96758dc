use serde::Serialize;
use std::sync::Mutex;

use super::navigator::{
    BackOutcome, CellIndex, GridNavigator, GridRegion, GridStack, SelectOutcome,
};
use crate::geometry::{Point, ScreenDimensions};
use crate::lock_or_recover;
use crate::settings::KeyBindingSnapshot;
use crate::watch::{StateCell, StateReader};

/// What the grid renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridView {
    pub regions: Vec<GridRegion>,
    pub depth: u32,
    pub max_depth: u32,
    pub rows: u32,
    pub cols: u32,
    pub hide_numbers: bool,
    pub opacity: u32,
}

struct GridSession {
    stack: GridStack,
    settings: KeyBindingSnapshot,
}

/// Owns the live grid session and is the only writer of the grid view.
pub struct GridStateManager {
    navigator: GridNavigator,
    session: Mutex<Option<GridSession>>,
    view: StateCell<Option<GridView>>,
}

impl Default for GridStateManager {
    fn default() -> Self {
        Self::new(GridNavigator::default())
    }
}

impl GridStateManager {
    pub fn new(navigator: GridNavigator) -> Self {
        Self {
            navigator,
            session: Mutex::new(None),
            view: StateCell::new(None),
        }
    }

    pub fn navigator(&self) -> &GridNavigator {
        &self.navigator
    }

    /// Start a session at the root. The settings snapshot is kept until hide.
    pub fn show(&self, settings: KeyBindingSnapshot, screen: ScreenDimensions) {
        let mut session = lock_or_recover(&self.session, "GridStateManager::show");
        let stack = GridStack::new(screen.bounds(), settings.grid_levels);
        *session = Some(GridSession { stack, settings });
        self.publish(&session);
    }

    pub fn hide(&self) -> bool {
        let mut session = lock_or_recover(&self.session, "GridStateManager::hide");
        if session.take().is_none() {
            return false;
        }
        self.publish(&session);
        true
    }

    /// Settings the live session was started with.
    pub fn session_settings(&self) -> Option<KeyBindingSnapshot> {
        lock_or_recover(&self.session, "GridStateManager::session_settings")
            .as_ref()
            .map(|s| s.settings.clone())
    }

    pub fn select(&self, cell: CellIndex) -> Option<SelectOutcome> {
        let mut session = lock_or_recover(&self.session, "GridStateManager::select");
        let outcome = self.navigator.select(&mut session.as_mut()?.stack, cell);
        if outcome != SelectOutcome::Ignored {
            self.publish(&session);
        }
        Some(outcome)
    }

    pub fn back(&self) -> Option<BackOutcome> {
        let mut session = lock_or_recover(&self.session, "GridStateManager::back");
        let outcome = self.navigator.back(&mut session.as_mut()?.stack);
        if outcome == BackOutcome::Ascended {
            self.publish(&session);
        }
        Some(outcome)
    }

    pub fn target(&self) -> Option<Point> {
        let session = lock_or_recover(&self.session, "GridStateManager::target");
        session.as_ref().map(|s| self.navigator.target(&s.stack))
    }

    /// Drop back to depth 0 covering `screen`, keeping the session settings.
    pub fn reset_to_root(&self, screen: ScreenDimensions) -> bool {
        let mut session = lock_or_recover(&self.session, "GridStateManager::reset_to_root");
        let Some(live) = session.as_mut() else {
            return false;
        };
        live.stack = GridStack::new(screen.bounds(), live.settings.grid_levels);
        self.publish(&session);
        true
    }

    pub fn depth(&self) -> Option<u32> {
        lock_or_recover(&self.session, "GridStateManager::depth")
            .as_ref()
            .map(|s| s.stack.depth())
    }

    pub fn view(&self) -> StateReader<Option<GridView>> {
        self.view.reader()
    }

    fn publish(&self, session: &Option<GridSession>) {
        let view = session.as_ref().map(|s| GridView {
            regions: s.stack.regions().to_vec(),
            depth: s.stack.depth(),
            max_depth: s.stack.max_depth(),
            rows: self.navigator.rows(),
            cols: self.navigator.cols(),
            hide_numbers: s.settings.hide_numbers,
            opacity: s.settings.overlay_opacity,
        });
        self.view.set(view);
    }
}
