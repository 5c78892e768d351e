#![forbid(unsafe_code)]

//! Core: grid geometry and the pixel/cell coordinate system.
//!
//! # Role in opsgrid
//! `opsgrid-core` is the leaf of the dashboard engine. It knows the grid's
//! own boundaries (column count, span bounds, pixel pitch) and nothing about
//! widgets or collisions between them. Everything here is pure and has no
//! mutable state, so the layout crate can call it from inside store actions
//! without any coordination.
//!
//! # Primary responsibilities
//! - **GridRect**: canonical 0-based `{x, y, w, h}` cell rectangle and the
//!   closed-open overlap predicate.
//! - **GridPosition**: 1-based boundary shape and its adapter.
//! - **Bounds**: [`validate_bounds`] / [`clamp_bounds`] against
//!   [`GridConstraints`].
//! - **GridMetrics**: pixel <-> cell conversions for one rendered grid.

pub mod geometry;
pub mod metrics;

pub use geometry::{
    BoundsIssue, BoundsReport, DEFAULT_MAX_ROW_SPAN, DEFAULT_MIN_COL_SPAN, DEFAULT_MIN_ROW_SPAN,
    DEFAULT_TOTAL_COLS, GridConstraints, GridPosition, GridRect, SpanLimits, clamp_bounds,
    overlaps, validate_bounds,
};
pub use metrics::{
    CellSpan, DEFAULT_CONTAINER_WIDTH_PX, DEFAULT_MARGIN_PX, DEFAULT_ROW_HEIGHT_PX, GridCell,
    GridMetrics, GridMetricsError, PixelPoint, PixelRect, PixelSize,
};
