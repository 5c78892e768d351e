//! Resize controller.
//!
//! A [`ResizeController`] lives for one resize gesture. It remembers the
//! widget's rectangle and the pointer position at gesture start, and turns any
//! later pointer position into a candidate rectangle. Candidates are always
//! computed from the start snapshot, never from the previous candidate, so a
//! rejected step leaves no drift behind.
//!
//! The store commits a candidate only if it overlaps no other widget. Resizing
//! never displaces neighbours; a colliding candidate is rejected outright and
//! the last accepted span stays in place.

use std::fmt;

use opsgrid_core::{GridMetrics, GridRect, PixelPoint, SpanLimits};
use serde::{Deserialize, Serialize};

use crate::collision::first_collision;
use crate::session::{
    CancelReason, InteractionEffect, InteractionSession, NoopReason, ResizeSession, SessionKind,
};
use crate::store::LayoutStore;
use crate::widget::WidgetId;

/// Handle a resize gesture was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeDirection {
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::Ne,
        Self::Nw,
        Self::Se,
        Self::Sw,
    ];

    /// Parse the direction tag carried by a resize handle.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| dir.tag() == tag)
    }

    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::N => "n",
            Self::S => "s",
            Self::E => "e",
            Self::W => "w",
            Self::Ne => "ne",
            Self::Nw => "nw",
            Self::Se => "se",
            Self::Sw => "sw",
        }
    }

    #[must_use]
    pub const fn affects_horizontal(self) -> bool {
        !matches!(self, Self::N | Self::S)
    }

    #[must_use]
    pub const fn affects_vertical(self) -> bool {
        !matches!(self, Self::E | Self::W)
    }

    /// The left edge follows the pointer; the right edge stays put.
    #[must_use]
    pub const fn moves_left_edge(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// The top edge follows the pointer; the bottom edge stays put.
    #[must_use]
    pub const fn moves_top_edge(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }
}

impl fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-gesture resize state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeController {
    direction: ResizeDirection,
    start: GridRect,
    origin: PixelPoint,
    limits: SpanLimits,
    total_cols: u16,
}

impl ResizeController {
    #[must_use]
    pub fn new(
        direction: ResizeDirection,
        start: GridRect,
        origin: PixelPoint,
        limits: SpanLimits,
        total_cols: u16,
    ) -> Self {
        Self {
            direction,
            start,
            origin,
            limits,
            total_cols,
        }
    }

    #[must_use]
    pub const fn direction(&self) -> ResizeDirection {
        self.direction
    }

    /// Rectangle at gesture start.
    #[must_use]
    pub const fn start(&self) -> GridRect {
        self.start
    }

    #[must_use]
    pub const fn origin(&self) -> PixelPoint {
        self.origin
    }

    #[must_use]
    pub const fn limits(&self) -> SpanLimits {
        self.limits
    }

    /// Candidate for the pointer at `pointer`, converted through `metrics`.
    #[must_use]
    pub fn candidate_for_pointer(&self, pointer: PixelPoint, metrics: &GridMetrics) -> GridRect {
        let (d_cols, d_rows) =
            metrics.pixel_delta_to_cells(pointer.x - self.origin.x, pointer.y - self.origin.y);
        self.candidate_for_delta(d_cols, d_rows)
    }

    /// Candidate for a pointer movement of `d_cols x d_rows` cells.
    ///
    /// Positive deltas point right/down. On a west or north handle moving the
    /// pointer left/up grows the widget and keeps its opposite edge anchored.
    #[must_use]
    pub fn candidate_for_delta(&self, d_cols: i32, d_rows: i32) -> GridRect {
        let start = self.start;
        let mut rect = start;

        if self.direction.affects_horizontal() {
            if self.direction.moves_left_edge() {
                let right = start.right();
                let w = resized_span(start.w, -d_cols, self.limits.min_w, self.limits.max_w.min(right));
                rect.x = right.saturating_sub(w);
                rect.w = w;
            } else {
                let room = self.total_cols.saturating_sub(start.x);
                rect.w = resized_span(start.w, d_cols, self.limits.min_w, self.limits.max_w.min(room));
            }
        }

        if self.direction.affects_vertical() {
            if self.direction.moves_top_edge() {
                let bottom = start.bottom();
                let h = resized_span(start.h, -d_rows, self.limits.min_h, self.limits.max_h.min(bottom));
                rect.y = bottom.saturating_sub(h);
                rect.h = h;
            } else {
                rect.h = resized_span(start.h, d_rows, self.limits.min_h, self.limits.max_h);
            }
        }

        rect
    }

    /// Candidate for an absolute span request, as from a keyboard shortcut or
    /// a numeric field. Axes the handle does not affect keep their span.
    #[must_use]
    pub fn candidate_for_span(&self, w: u16, h: u16) -> GridRect {
        let mut d_cols = i32::from(w) - i32::from(self.start.w);
        let mut d_rows = i32::from(h) - i32::from(self.start.h);
        if self.direction.moves_left_edge() {
            d_cols = -d_cols;
        }
        if self.direction.moves_top_edge() {
            d_rows = -d_rows;
        }
        self.candidate_for_delta(d_cols, d_rows)
    }
}

fn resized_span(start: u16, delta: i32, min: u16, max: u16) -> u16 {
    let hi = max.max(1);
    let lo = min.min(hi);
    let span = (i32::from(start) + delta).clamp(i32::from(lo), i32::from(hi));
    u16::try_from(span).unwrap_or(hi)
}

impl LayoutStore {
    /// Start resizing `id` from the handle `direction`, with the pointer at
    /// `origin`.
    pub fn begin_resize(
        &mut self,
        id: &WidgetId,
        direction: ResizeDirection,
        origin: PixelPoint,
    ) -> InteractionEffect {
        if self.session.is_active() {
            return InteractionEffect::noop(NoopReason::SessionAlreadyActive);
        }
        let Some(widget) = self.widget(id) else {
            return InteractionEffect::noop(NoopReason::WidgetNotFound);
        };
        let controller = ResizeController::new(
            direction,
            widget.rect,
            origin,
            widget.limits.apply_to(self.config.spans),
            self.config.total_cols,
        );
        self.session = InteractionSession::Resize(ResizeSession {
            widget: id.clone(),
            controller,
        });
        tracing::debug!(widget = %id, %direction, "resize started");
        InteractionEffect::ResizeStarted {
            id: id.clone(),
            direction,
        }
    }

    /// Follow the pointer during a resize.
    pub fn update_resize(&mut self, pointer: PixelPoint) -> InteractionEffect {
        let InteractionSession::Resize(session) = &self.session else {
            return InteractionEffect::noop(self.session_mismatch());
        };
        let candidate = session.controller.candidate_for_pointer(pointer, &self.metrics);
        self.commit_resize_candidate(candidate)
    }

    /// Request an absolute span during a resize.
    pub fn update_resize_span(&mut self, w: u16, h: u16) -> InteractionEffect {
        let InteractionSession::Resize(session) = &self.session else {
            return InteractionEffect::noop(self.session_mismatch());
        };
        let candidate = session.controller.candidate_for_span(w, h);
        self.commit_resize_candidate(candidate)
    }

    fn commit_resize_candidate(&mut self, candidate: GridRect) -> InteractionEffect {
        let InteractionSession::Resize(session) = &self.session else {
            return InteractionEffect::noop(self.session_mismatch());
        };
        let id = session.widget.clone();
        let Some(index) = self.index_of(&id) else {
            self.session = InteractionSession::Idle;
            return InteractionEffect::Canceled {
                kind: SessionKind::Resize,
                reason: CancelReason::Invalidated,
            };
        };
        if self.widgets[index].rect == candidate {
            return InteractionEffect::noop(NoopReason::Unchanged);
        }
        if let Some(blocker) = first_collision(&candidate, Some(&id), &self.widgets) {
            tracing::trace!(widget = %id, blocker = %blocker.id, "resize candidate collides");
            return InteractionEffect::ResizeRejected {
                id,
                candidate,
                blocker: blocker.id.clone(),
            };
        }
        self.widgets[index].rect = candidate;
        self.dirty = true;
        InteractionEffect::ResizeApplied {
            id,
            rect: candidate,
        }
    }

    /// Finish the resize. The last accepted span is already committed.
    pub fn end_resize(&mut self) -> InteractionEffect {
        match std::mem::take(&mut self.session) {
            InteractionSession::Resize(session) => {
                let rect = self
                    .widget(&session.widget)
                    .map_or(session.controller.start(), |widget| widget.rect);
                tracing::debug!(widget = %session.widget, ?rect, "resize ended");
                InteractionEffect::ResizeEnded {
                    id: session.widget,
                    rect,
                }
            }
            other => {
                self.session = other;
                InteractionEffect::noop(self.session_mismatch())
            }
        }
    }
}
