#![forbid(unsafe_code)]

//! Pixel <-> grid-cell coordinate system.
//!
//! A [`GridMetrics`] describes one rendered grid: column count, row height,
//! the container's pixel width and the `[x, y]` gutter between cells. All
//! conversions are pure; the only state is the validated parameter set.
//!
//! Cell pitch is `column width + horizontal margin` across and
//! `row height + vertical margin` down:
//!
//! ```text
//! col_width = (container_width - (total_cols - 1) * margin_x) / total_cols
//! ```
//!
//! # Example
//!
//! ```
//! use opsgrid_core::metrics::GridMetrics;
//!
//! let metrics = GridMetrics::new(12, 80.0, 1200.0, [16.0, 16.0]).unwrap();
//! let origin = metrics.grid_to_pixel(3, 2);
//! let cell = metrics.pixel_to_grid(origin.x, origin.y);
//! assert_eq!((cell.col, cell.row), (3, 2));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{DEFAULT_TOTAL_COLS, GridRect};

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT_PX: f64 = 80.0;

/// Default container width in pixels, used until the host reports one.
pub const DEFAULT_CONTAINER_WIDTH_PX: f64 = 1200.0;

/// Default `[x, y]` gutter between cells in pixels.
pub const DEFAULT_MARGIN_PX: [f64; 2] = [16.0, 16.0];

/// A 0-based grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub col: u16,
    pub row: u16,
}

/// A point in container-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A pixel extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

/// A pixel rectangle, as a presentation layer would position an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub origin: PixelPoint,
    pub size: PixelSize,
}

/// A span in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellSpan {
    pub w: u16,
    pub h: u16,
}

/// Validated grid coordinate system.
///
/// Deserializing goes through [`GridMetrics::new`], so a stored parameter
/// set is rejected the same way a constructed one is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridMetrics")]
pub struct GridMetrics {
    total_cols: u16,
    row_height_px: f64,
    container_width_px: f64,
    margin_px: [f64; 2],
}

#[derive(Deserialize)]
struct RawGridMetrics {
    total_cols: u16,
    row_height_px: f64,
    container_width_px: f64,
    margin_px: [f64; 2],
}

impl TryFrom<RawGridMetrics> for GridMetrics {
    type Error = GridMetricsError;

    fn try_from(raw: RawGridMetrics) -> Result<Self, Self::Error> {
        Self::new(
            raw.total_cols,
            raw.row_height_px,
            raw.container_width_px,
            raw.margin_px,
        )
    }
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            total_cols: DEFAULT_TOTAL_COLS,
            row_height_px: DEFAULT_ROW_HEIGHT_PX,
            container_width_px: DEFAULT_CONTAINER_WIDTH_PX,
            margin_px: DEFAULT_MARGIN_PX,
        }
    }
}

impl GridMetrics {
    /// Construct a validated coordinate system.
    pub fn new(
        total_cols: u16,
        row_height_px: f64,
        container_width_px: f64,
        margin_px: [f64; 2],
    ) -> Result<Self, GridMetricsError> {
        if total_cols == 0 {
            return Err(GridMetricsError::ZeroColumns);
        }
        if !row_height_px.is_finite() || row_height_px <= 0.0 {
            return Err(GridMetricsError::InvalidRowHeight {
                value: row_height_px,
            });
        }
        for (axis, value) in [("x", margin_px[0]), ("y", margin_px[1])] {
            if !value.is_finite() || value < 0.0 {
                return Err(GridMetricsError::InvalidMargin { axis, value });
            }
        }
        let metrics = Self {
            total_cols,
            row_height_px,
            container_width_px,
            margin_px,
        };
        metrics.check_container()?;
        Ok(metrics)
    }

    /// Same grid, new container width (the host viewport was resized).
    pub fn with_container_width(self, container_width_px: f64) -> Result<Self, GridMetricsError> {
        let metrics = Self {
            container_width_px,
            ..self
        };
        metrics.check_container()?;
        Ok(metrics)
    }

    fn check_container(&self) -> Result<(), GridMetricsError> {
        if !self.container_width_px.is_finite() || self.container_width_px < 0.0 {
            return Err(GridMetricsError::InvalidContainerWidth {
                value: self.container_width_px,
            });
        }
        if self.col_width_px() <= 0.0 {
            return Err(GridMetricsError::ContainerTooNarrow {
                width: self.container_width_px,
                total_cols: self.total_cols,
                margin_x: self.margin_px[0],
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn total_cols(&self) -> u16 {
        self.total_cols
    }

    #[must_use]
    pub const fn row_height_px(&self) -> f64 {
        self.row_height_px
    }

    #[must_use]
    pub const fn container_width_px(&self) -> f64 {
        self.container_width_px
    }

    #[must_use]
    pub const fn margin_px(&self) -> [f64; 2] {
        self.margin_px
    }

    /// Width of one column, gutters excluded.
    #[must_use]
    pub fn col_width_px(&self) -> f64 {
        let cols = f64::from(self.total_cols);
        (self.container_width_px - (cols - 1.0) * self.margin_px[0]) / cols
    }

    /// Horizontal distance between the left edges of adjacent columns.
    #[must_use]
    pub fn col_pitch_px(&self) -> f64 {
        self.col_width_px() + self.margin_px[0]
    }

    /// Vertical distance between the top edges of adjacent rows.
    #[must_use]
    pub fn row_pitch_px(&self) -> f64 {
        self.row_height_px + self.margin_px[1]
    }

    /// Nearest cell to a container-local pixel position.
    ///
    /// The column is clamped to `[0, total_cols - 1]` and the row to `>= 0`.
    /// Non-finite input maps to the origin.
    #[must_use]
    pub fn pixel_to_grid(&self, px: f64, py: f64) -> GridCell {
        let last_col = self.total_cols.saturating_sub(1);
        let col = round_to_cells(px / self.col_pitch_px()).min(last_col);
        let row = round_to_cells(py / self.row_pitch_px());
        GridCell { col, row }
    }

    /// Top-left pixel of a cell. No rounding.
    #[must_use]
    pub fn grid_to_pixel(&self, col: u16, row: u16) -> PixelPoint {
        PixelPoint {
            x: f64::from(col) * self.col_pitch_px(),
            y: f64::from(row) * self.row_pitch_px(),
        }
    }

    /// Pixel extent of a `w x h` cell span, inner gutters included.
    #[must_use]
    pub fn grid_size_to_pixel(&self, w: u16, h: u16) -> PixelSize {
        let w = w.max(1);
        let h = h.max(1);
        PixelSize {
            width: f64::from(w) * self.col_width_px() + f64::from(w - 1) * self.margin_px[0],
            height: f64::from(h) * self.row_height_px + f64::from(h - 1) * self.margin_px[1],
        }
    }

    /// Nearest cell span for a pixel extent, never smaller than one cell and
    /// never wider than the grid.
    #[must_use]
    pub fn pixel_size_to_grid(&self, width_px: f64, height_px: f64) -> CellSpan {
        let w = round_to_cells((width_px + self.margin_px[0]) / self.col_pitch_px())
            .clamp(1, self.total_cols);
        let h = round_to_cells((height_px + self.margin_px[1]) / self.row_pitch_px()).max(1);
        CellSpan { w, h }
    }

    /// Signed cell delta for a pointer movement, rounded to the nearest cell.
    #[must_use]
    pub fn pixel_delta_to_cells(&self, dx: f64, dy: f64) -> (i32, i32) {
        (
            round_signed(dx / self.col_pitch_px()),
            round_signed(dy / self.row_pitch_px()),
        )
    }

    /// Pixel placement of a grid rectangle.
    #[must_use]
    pub fn rect_to_pixels(&self, rect: &GridRect) -> PixelRect {
        PixelRect {
            origin: self.grid_to_pixel(rect.x, rect.y),
            size: self.grid_size_to_pixel(rect.w, rect.h),
        }
    }
}

fn round_to_cells(value: f64) -> u16 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let rounded = value.round();
    if rounded >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        rounded as u16
    }
}

fn round_signed(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    // `as` saturates at the i32 range.
    value.round() as i32
}

/// Coordinate system construction failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridMetricsError {
    ZeroColumns,
    InvalidRowHeight {
        value: f64,
    },
    InvalidMargin {
        axis: &'static str,
        value: f64,
    },
    InvalidContainerWidth {
        value: f64,
    },
    ContainerTooNarrow {
        width: f64,
        total_cols: u16,
        margin_x: f64,
    },
}

impl fmt::Display for GridMetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroColumns => write!(f, "grid must have at least one column"),
            Self::InvalidRowHeight { value } => {
                write!(f, "invalid row height {value} (must be finite and > 0)")
            }
            Self::InvalidMargin { axis, value } => {
                write!(f, "invalid {axis} margin {value} (must be finite and >= 0)")
            }
            Self::InvalidContainerWidth { value } => {
                write!(f, "invalid container width {value} (must be finite and >= 0)")
            }
            Self::ContainerTooNarrow {
                width,
                total_cols,
                margin_x,
            } => write!(
                f,
                "container width {width} leaves no room for {total_cols} columns with {margin_x} gutters"
            ),
        }
    }
}

impl std::error::Error for GridMetricsError {}
