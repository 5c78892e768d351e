//! Interaction session state and transition effects.
//!
//! ```text
//! Idle -> Placement -> Idle (confirmed | canceled)
//! Idle -> Drag      -> Idle (committed | discarded)
//! Idle -> Resize    -> Idle
//! ```
//!
//! At most one session is live. Every store action that drives a session
//! returns an [`InteractionEffect`]; input that does not apply to the current
//! state is reported as [`InteractionEffect::Noop`] rather than an error.

use opsgrid_core::{GridRect, PixelPoint};
use serde::{Deserialize, Serialize};

use crate::collision::Displacement;
use crate::resize::{ResizeController, ResizeDirection};
use crate::widget::{WidgetDraft, WidgetId, WidgetKind};

/// Transient, never-persisted interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionSession {
    #[default]
    Idle,
    Placement(PlacementSession),
    Drag(DragSession),
    Resize(ResizeSession),
}

impl InteractionSession {
    #[must_use]
    pub fn kind(&self) -> Option<SessionKind> {
        match self {
            Self::Idle => None,
            Self::Placement(_) => Some(SessionKind::Placement),
            Self::Drag(_) => Some(SessionKind::Drag),
            Self::Resize(_) => Some(SessionKind::Resize),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Staged displacement of the live placement or drag, if any.
    #[must_use]
    pub fn displacement(&self) -> Option<&Displacement> {
        match self {
            Self::Placement(session) => Some(&session.displaced),
            Self::Drag(session) => Some(&session.displaced),
            Self::Idle | Self::Resize(_) => None,
        }
    }
}

/// Candidate widget being positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    pub draft: WidgetDraft,
    pub preview: GridRect,
    pub displaced: Displacement,
}

/// Existing widget being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub widget: WidgetId,
    pub origin: GridRect,
    pub candidate: GridRect,
    pub displaced: Displacement,
    /// Pointer offset from the widget's top-left pixel when the drag began.
    pub grab_offset: Option<PixelPoint>,
}

/// Existing widget being resized.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub widget: WidgetId,
    pub controller: ResizeController,
}

/// Discriminant of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Placement,
    Drag,
    Resize,
}

/// Why a session ended without committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// Cancel button, escape key, or drag-cancel signal.
    Explicit,
    /// Unconditional cleanup (lost pointer capture, teardown).
    Programmatic,
    /// A structural edit (remove, clear, reload) made the staged state stale.
    Invalidated,
}

/// Explicit diagnostics for input that is safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    SessionAlreadyActive,
    NoActiveSession,
    SessionKindMismatch,
    WidgetNotFound,
    WidgetMismatch,
    UnknownWidgetType,
    Unchanged,
}

/// Outcome of one session action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEffect {
    PlacementStarted {
        kind: WidgetKind,
        preview: GridRect,
    },
    PreviewUpdated {
        preview: GridRect,
        displaced: usize,
    },
    PlacementCommitted {
        id: WidgetId,
        rect: GridRect,
        displaced: usize,
    },
    DragStarted {
        id: WidgetId,
        origin: GridRect,
    },
    DragUpdated {
        id: WidgetId,
        candidate: GridRect,
        displaced: usize,
    },
    DragCommitted {
        id: WidgetId,
        rect: GridRect,
        displaced: usize,
    },
    ResizeStarted {
        id: WidgetId,
        direction: ResizeDirection,
    },
    ResizeApplied {
        id: WidgetId,
        rect: GridRect,
    },
    /// Candidate span would overlap `blocker`; the committed span is kept.
    ResizeRejected {
        id: WidgetId,
        candidate: GridRect,
        blocker: WidgetId,
    },
    ResizeEnded {
        id: WidgetId,
        rect: GridRect,
    },
    Canceled {
        kind: SessionKind,
        reason: CancelReason,
    },
    Noop {
        reason: NoopReason,
    },
}

impl InteractionEffect {
    pub const fn noop(reason: NoopReason) -> Self {
        Self::Noop { reason }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }
}
