#![forbid(unsafe_code)]

//! Grid-cell geometry.
//!
//! The canonical rectangle is [`GridRect`]: 0-based origin, extent in whole
//! cells. [`GridPosition`] is the 1-based `col/row/colSpan/rowSpan` shape used
//! by older dashboard records and by the catalog; it only exists at the
//! boundary and converts losslessly into [`GridRect`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of columns on a dashboard grid.
pub const DEFAULT_TOTAL_COLS: u16 = 12;

/// Default minimum column span for a widget.
pub const DEFAULT_MIN_COL_SPAN: u16 = 2;

/// Default minimum row span for a widget.
pub const DEFAULT_MIN_ROW_SPAN: u16 = 1;

/// Default maximum row span for a widget.
pub const DEFAULT_MAX_ROW_SPAN: u16 = 12;

/// A widget rectangle in grid cells.
///
/// Origin is 0-based at the top-left of the grid. Edges follow closed-open
/// intervals: a rect covers columns `x..x + w` and rows `y..y + h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    /// Left column (inclusive).
    pub x: u16,
    /// Top row (inclusive).
    pub y: u16,
    /// Width in columns.
    pub w: u16,
    /// Height in rows.
    pub h: u16,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.h)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.w as u32 * self.h as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Axis-aligned intersection test with closed-open edges.
    ///
    /// Rectangles that merely share an edge do not overlap.
    #[inline]
    pub const fn overlaps(&self, other: &GridRect) -> bool {
        let (ax, aw, bx, bw) = (
            self.x as u32,
            self.w as u32,
            other.x as u32,
            other.w as u32,
        );
        let (ay, ah, by, bh) = (
            self.y as u32,
            self.h as u32,
            other.y as u32,
            other.h as u32,
        );
        !(ax + aw <= bx || ax >= bx + bw) && !(ay + ah <= by || ay >= by + bh)
    }

    /// Same extent, new origin.
    #[inline]
    #[must_use]
    pub const fn with_origin(self, x: u16, y: u16) -> Self {
        Self::new(x, y, self.w, self.h)
    }

    /// Same origin, new extent.
    #[inline]
    #[must_use]
    pub const fn with_span(self, w: u16, h: u16) -> Self {
        Self::new(self.x, self.y, w, h)
    }

    /// Convert to the 1-based boundary shape.
    #[inline]
    #[must_use]
    pub const fn to_position(self) -> GridPosition {
        GridPosition {
            col: self.x.saturating_add(1),
            row: self.y.saturating_add(1),
            col_span: self.w,
            row_span: self.h,
        }
    }
}

/// Free-function form of [`GridRect::overlaps`].
#[inline]
pub const fn overlaps(a: &GridRect, b: &GridRect) -> bool {
    a.overlaps(b)
}

/// 1-based `col/row/colSpan/rowSpan` position.
///
/// `col == 0` and `row == 0` are not meaningful in this shape; converting them
/// to a [`GridRect`] saturates to the first column/row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPosition {
    pub col: u16,
    pub row: u16,
    pub col_span: u16,
    pub row_span: u16,
}

impl GridPosition {
    #[inline]
    pub const fn new(col: u16, row: u16, col_span: u16, row_span: u16) -> Self {
        Self {
            col,
            row,
            col_span,
            row_span,
        }
    }

    /// Convert to the canonical 0-based rectangle.
    #[inline]
    #[must_use]
    pub const fn to_rect(self) -> GridRect {
        GridRect {
            x: self.col.saturating_sub(1),
            y: self.row.saturating_sub(1),
            w: self.col_span,
            h: self.row_span,
        }
    }
}

impl From<GridPosition> for GridRect {
    fn from(position: GridPosition) -> Self {
        position.to_rect()
    }
}

impl From<GridRect> for GridPosition {
    fn from(rect: GridRect) -> Self {
        rect.to_position()
    }
}

/// Inclusive span bounds for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanLimits {
    pub min_w: u16,
    pub min_h: u16,
    pub max_w: u16,
    pub max_h: u16,
}

impl Default for SpanLimits {
    fn default() -> Self {
        Self {
            min_w: DEFAULT_MIN_COL_SPAN,
            min_h: DEFAULT_MIN_ROW_SPAN,
            max_w: DEFAULT_TOTAL_COLS,
            max_h: DEFAULT_MAX_ROW_SPAN,
        }
    }
}

impl SpanLimits {
    pub const fn new(min_w: u16, min_h: u16, max_w: u16, max_h: u16) -> Self {
        Self {
            min_w,
            min_h,
            max_w,
            max_h,
        }
    }

    /// Clamp a width into `[min_w, max_w]`. A maximum below the minimum
    /// collapses onto the minimum.
    #[inline]
    #[must_use]
    pub fn clamp_w(&self, w: u16) -> u16 {
        w.clamp(self.min_w, self.max_w.max(self.min_w))
    }

    /// Clamp a height into `[min_h, max_h]`.
    #[inline]
    #[must_use]
    pub fn clamp_h(&self, h: u16) -> u16 {
        h.clamp(self.min_h, self.max_h.max(self.min_h))
    }
}

/// Grid boundary plus span bounds, the input to bounds validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConstraints {
    pub total_cols: u16,
    pub spans: SpanLimits,
}

impl Default for GridConstraints {
    fn default() -> Self {
        Self {
            total_cols: DEFAULT_TOTAL_COLS,
            spans: SpanLimits::default(),
        }
    }
}

impl GridConstraints {
    pub const fn new(total_cols: u16, spans: SpanLimits) -> Self {
        Self { total_cols, spans }
    }

    /// Widest span a rect starting at column `x` can take.
    #[inline]
    #[must_use]
    pub fn max_w_at(&self, x: u16) -> u16 {
        self.spans.max_w.min(self.total_cols.saturating_sub(x))
    }
}

/// One way a rectangle violates the grid boundary or its span bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsIssue {
    /// `x + w` runs past the last column.
    ExceedsColumns { right: u16, total_cols: u16 },
    WidthBelowMin { w: u16, min: u16 },
    WidthAboveMax { w: u16, max: u16 },
    HeightBelowMin { h: u16, min: u16 },
    HeightAboveMax { h: u16, max: u16 },
}

impl fmt::Display for BoundsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsColumns { right, total_cols } => {
                write!(f, "right edge {right} exceeds grid width {total_cols}")
            }
            Self::WidthBelowMin { w, min } => write!(f, "width {w} below minimum {min}"),
            Self::WidthAboveMax { w, max } => write!(f, "width {w} above maximum {max}"),
            Self::HeightBelowMin { h, min } => write!(f, "height {h} below minimum {min}"),
            Self::HeightAboveMax { h, max } => write!(f, "height {h} above maximum {max}"),
        }
    }
}

/// Result of [`validate_bounds`]. Empty means valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundsReport {
    pub issues: Vec<BoundsIssue>,
}

impl BoundsReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check a rectangle against the grid's own boundary and span bounds.
///
/// Negative origins cannot be represented by [`GridRect`]; the pixel
/// conversion clamps them before a rect is ever built.
#[must_use]
pub fn validate_bounds(rect: &GridRect, constraints: &GridConstraints) -> BoundsReport {
    let mut issues = Vec::new();
    let right = u32::from(rect.x) + u32::from(rect.w);
    if right > u32::from(constraints.total_cols) {
        issues.push(BoundsIssue::ExceedsColumns {
            right: rect.right(),
            total_cols: constraints.total_cols,
        });
    }
    let spans = constraints.spans;
    if rect.w < spans.min_w {
        issues.push(BoundsIssue::WidthBelowMin {
            w: rect.w,
            min: spans.min_w,
        });
    } else if rect.w > spans.max_w {
        issues.push(BoundsIssue::WidthAboveMax {
            w: rect.w,
            max: spans.max_w,
        });
    }
    if rect.h < spans.min_h {
        issues.push(BoundsIssue::HeightBelowMin {
            h: rect.h,
            min: spans.min_h,
        });
    } else if rect.h > spans.max_h {
        issues.push(BoundsIssue::HeightAboveMax {
            h: rect.h,
            max: spans.max_h,
        });
    }
    BoundsReport { issues }
}

/// Best-effort correction of a rectangle so it passes [`validate_bounds`].
///
/// Spans are clamped to their bounds first. A rect that still runs past the
/// last column is shrunk to the remaining columns when that keeps it at or
/// above the minimum width, and shifted left otherwise. Never panics; when
/// the bounds themselves are unsatisfiable (minimum wider than the grid) the
/// result is as close as the grid allows.
#[must_use]
pub fn clamp_bounds(rect: &GridRect, constraints: &GridConstraints) -> GridRect {
    let total = constraints.total_cols.max(1);
    let spans = constraints.spans;
    let w = spans.clamp_w(rect.w).min(total);
    let h = spans.clamp_h(rect.h);
    let mut x = rect.x;
    let mut w = w;
    if u32::from(x) + u32::from(w) > u32::from(total) {
        let room = total.saturating_sub(x);
        if room >= spans.min_w.min(total) && room > 0 {
            w = room;
        } else {
            x = total - w;
        }
    }
    GridRect::new(x, rect.y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> GridConstraints {
        GridConstraints::default()
    }

    #[test]
    fn overlap_requires_both_axes() {
        let a = GridRect::new(0, 0, 4, 2);
        assert!(a.overlaps(&GridRect::new(3, 1, 4, 2)));
        assert!(!a.overlaps(&GridRect::new(4, 0, 4, 2)), "shared vertical edge");
        assert!(!a.overlaps(&GridRect::new(0, 2, 4, 2)), "shared horizontal edge");
        assert!(!a.overlaps(&GridRect::new(8, 8, 1, 1)));
    }

    #[test]
    fn overlap_is_symmetric_and_reflexive_for_nonempty() {
        let a = GridRect::new(2, 3, 3, 3);
        let b = GridRect::new(4, 5, 6, 1);
        assert_eq!(a.overlaps(&b), b.overlaps(&a));
        assert!(a.overlaps(&a));
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn overlap_does_not_saturate_near_u16_max() {
        let a = GridRect::new(u16::MAX - 1, 0, 4, 1);
        let b = GridRect::new(u16::MAX, 0, 4, 1);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn position_round_trip_is_one_based() {
        let p = GridPosition::new(1, 3, 4, 2);
        let r = p.to_rect();
        assert_eq!(r, GridRect::new(0, 2, 4, 2));
        assert_eq!(GridPosition::from(r), p);
    }

    #[test]
    fn zero_based_position_saturates() {
        let p = GridPosition::new(0, 0, 2, 2);
        assert_eq!(GridRect::from(p), GridRect::new(0, 0, 2, 2));
    }

    #[test]
    fn position_serializes_camel_case() {
        let json = serde_json::to_string(&GridPosition::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, r#"{"col":1,"row":2,"colSpan":3,"rowSpan":4}"#);
    }

    #[test]
    fn span_limits_clamp() {
        let limits = SpanLimits::default();
        assert_eq!(limits.clamp_w(1), 2);
        assert_eq!(limits.clamp_w(40), 12);
        assert_eq!(limits.clamp_h(0), 1);

        let inverted = SpanLimits::new(4, 1, 2, 12);
        assert_eq!(inverted.clamp_w(9), 4);
    }

    #[test]
    fn validate_accepts_in_bounds_rect() {
        let report = validate_bounds(&GridRect::new(8, 40, 4, 3), &constraints());
        assert!(report.is_valid(), "{:?}", report.issues);
    }

    #[test]
    fn validate_reports_each_violation() {
        let report = validate_bounds(&GridRect::new(11, 0, 1, 20), &constraints());
        assert_eq!(
            report.issues,
            vec![
                BoundsIssue::WidthBelowMin { w: 1, min: 2 },
                BoundsIssue::HeightAboveMax { h: 20, max: 12 },
            ]
        );

        let report = validate_bounds(&GridRect::new(10, 0, 4, 1), &constraints());
        assert!(matches!(
            report.issues.as_slice(),
            [BoundsIssue::ExceedsColumns {
                right: 14,
                total_cols: 12
            }]
        ));
    }

    #[test]
    fn clamp_shrinks_into_remaining_columns() {
        let clamped = clamp_bounds(&GridRect::new(8, 1, 6, 2), &constraints());
        assert_eq!(clamped, GridRect::new(8, 1, 4, 2));
        assert!(validate_bounds(&clamped, &constraints()).is_valid());
    }

    #[test]
    fn clamp_shifts_when_shrinking_would_break_minimum() {
        let clamped = clamp_bounds(&GridRect::new(11, 0, 3, 2), &constraints());
        assert_eq!(clamped, GridRect::new(9, 0, 3, 2));
    }

    #[test]
    fn clamp_applies_span_bounds() {
        let clamped = clamp_bounds(&GridRect::new(0, 0, 0, 0), &constraints());
        assert_eq!(clamped, GridRect::new(0, 0, 2, 1));
        let clamped = clamp_bounds(&GridRect::new(0, 0, 30, 30), &constraints());
        assert_eq!(clamped, GridRect::new(0, 0, 12, 12));
    }

    #[test]
    fn clamp_tolerates_unsatisfiable_minimum() {
        let narrow = GridConstraints::new(3, SpanLimits::new(5, 1, 5, 4));
        let clamped = clamp_bounds(&GridRect::new(2, 0, 1, 1), &narrow);
        assert_eq!(clamped, GridRect::new(0, 0, 3, 1));
    }

    #[test]
    fn max_width_at_column() {
        let c = constraints();
        assert_eq!(c.max_w_at(0), 12);
        assert_eq!(c.max_w_at(9), 3);
        assert_eq!(c.max_w_at(20), 0);
    }
}
