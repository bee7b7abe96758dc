//! Pure grid subdivision engine. No locking, no I/O.

use serde::Serialize;

use crate::geometry::{Point, Rect};

pub const GRID_ROWS: u32 = 3;
pub const GRID_COLS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellIndex {
    pub row: u32,
    pub col: u32,
}

/// One level of the navigation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridRegion {
    pub rect: Rect,
    /// Cell of the parent this region was picked from; `None` for the root.
    pub cell: Option<CellIndex>,
}

/// Navigation stack. `regions[0]` is the full screen, the last entry is the
/// region currently subdivided on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStack {
    regions: Vec<GridRegion>,
    max_depth: u32,
}

impl GridStack {
    pub fn new(bounds: Rect, max_depth: u32) -> Self {
        Self {
            regions: vec![GridRegion {
                rect: bounds,
                cell: None,
            }],
            max_depth,
        }
    }

    pub fn depth(&self) -> u32 {
        (self.regions.len() - 1) as u32
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn regions(&self) -> &[GridRegion] {
        &self.regions
    }

    pub fn current(&self) -> &GridRegion {
        &self.regions[self.regions.len() - 1]
    }

    pub fn at_max_depth(&self) -> bool {
        self.depth() >= self.max_depth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Pushed a new level.
    Descended,
    /// At max depth: replaced the top region with a sibling cell.
    Moved,
    /// The picked cell has no area; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Ascended,
    /// Already at the root; the caller should leave grid mode.
    Exit,
}

/// Maps keypad digits to cells and applies them to a [`GridStack`].
#[derive(Debug, Clone, Copy)]
pub struct GridNavigator {
    rows: u32,
    cols: u32,
}

impl Default for GridNavigator {
    fn default() -> Self {
        Self::new(GRID_ROWS, GRID_COLS)
    }
}

impl GridNavigator {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Row-major cell for keypad digit `1..=rows*cols`.
    pub fn cell_for_digit(&self, digit: u32) -> Option<CellIndex> {
        if digit == 0 || digit > self.rows * self.cols {
            return None;
        }
        let index = digit - 1;
        Some(CellIndex {
            row: index / self.cols,
            col: index % self.cols,
        })
    }

    /// All cells of `rect` in row-major order.
    pub fn cells(&self, rect: &Rect) -> Vec<Rect> {
        (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .map(|(row, col)| rect.cell(self.rows, self.cols, row, col))
            .collect()
    }

    pub fn select(&self, stack: &mut GridStack, cell: CellIndex) -> SelectOutcome {
        if !stack.at_max_depth() {
            let rect = stack.current().rect.cell(self.rows, self.cols, cell.row, cell.col);
            if rect.area() == 0 {
                return SelectOutcome::Ignored;
            }
            stack.regions.push(GridRegion {
                rect,
                cell: Some(cell),
            });
            return SelectOutcome::Descended;
        }
        if stack.regions.len() < 2 {
            return SelectOutcome::Ignored;
        }
        let parent = stack.regions[stack.regions.len() - 2].rect;
        let rect = parent.cell(self.rows, self.cols, cell.row, cell.col);
        if rect.area() == 0 {
            return SelectOutcome::Ignored;
        }
        let last = stack.regions.len() - 1;
        stack.regions[last] = GridRegion {
            rect,
            cell: Some(cell),
        };
        SelectOutcome::Moved
    }

    pub fn back(&self, stack: &mut GridStack) -> BackOutcome {
        if stack.regions.len() > 1 {
            stack.regions.pop();
            BackOutcome::Ascended
        } else {
            BackOutcome::Exit
        }
    }

    /// Touch target for a confirm: center of the current region.
    pub fn target(&self, stack: &GridStack) -> Point {
        stack.current().rect.center()
    }
}
