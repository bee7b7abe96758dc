//! Screen geometry shared by the grid and cursor engines.

use serde::{Deserialize, Serialize};

use crate::watch::{StateCell, StateReader};

/// Physical screen size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDimensions {
    pub width: u32,
    pub height: u32,
}

impl ScreenDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn bounds(self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn center(self) -> Point {
        Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Clamp a point into `[0, width) x [0, height)`.
    pub fn clamp(self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0.0, max_coord(self.width)),
            point.y.clamp(0.0, max_coord(self.height)),
        )
    }
}

fn max_coord(extent: u32) -> f32 {
    extent.saturating_sub(1) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned pixel rectangle covering `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Cell `(row, col)` of a `rows x cols` split using floor-rounded edges.
    ///
    /// Edge `i` of an extent `len` split `n` ways sits at `floor(i * len / n)`,
    /// so adjacent cells share their boundary and the cells tile the parent.
    pub fn cell(&self, rows: u32, cols: u32, row: u32, col: u32) -> Rect {
        let left = split_edge(self.width, cols, col);
        let right = split_edge(self.width, cols, col + 1);
        let top = split_edge(self.height, rows, row);
        let bottom = split_edge(self.height, rows, row + 1);
        Rect::new(self.x + left, self.y + top, right - left, bottom - top)
    }
}

fn split_edge(len: u32, parts: u32, index: u32) -> u32 {
    ((u64::from(len) * u64::from(index)) / u64::from(parts.max(1))) as u32
}

/// Geometry provider: the host pushes dimension changes, engines read the latest.
pub struct ScreenGeometry {
    cell: StateCell<ScreenDimensions>,
}

impl ScreenGeometry {
    pub fn new(initial: ScreenDimensions) -> Self {
        Self {
            cell: StateCell::new(initial),
        }
    }

    /// Replace the dimensions, e.g. after a rotation. Returns true if they changed.
    pub fn update(&self, dims: ScreenDimensions) -> bool {
        if *self.cell.get() == dims {
            return false;
        }
        crate::log_debug(&format!(
            "Updated screen dimensions to: {} x {}",
            dims.width, dims.height
        ));
        self.cell.set(dims);
        true
    }

    pub fn current(&self) -> ScreenDimensions {
        *self.cell.get()
    }

    pub fn reader(&self) -> StateReader<ScreenDimensions> {
        self.cell.reader()
    }
}
