//! Grid mode: recursive 3x3 subdivision of the screen, navigated with the
//! keypad digits, confirmed into a tap or long press at the region center.

mod handler;
mod manager;
mod navigator;

pub use handler::GridActionHandler;
pub use manager::{GridStateManager, GridView};
pub use navigator::{
    BackOutcome, CellIndex, GridNavigator, GridRegion, GridStack, SelectOutcome, GRID_COLS,
    GRID_ROWS,
};
