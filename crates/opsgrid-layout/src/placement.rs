//! Placement mode: positioning a new widget before it exists.
//!
//! While a placement is live the candidate has no id and is not in the
//! widget list. Each preview move recomputes the cascade it would cause
//! against the unchanged committed layout. Confirming commits the staged
//! displacement and inserts the candidate in one step; canceling leaves the
//! committed layout exactly as it was.

use opsgrid_core::{GridCell, PixelPoint};

use crate::catalog::WidgetCatalog;
use crate::collision::{Displacement, cascade_displace};
use crate::session::{
    CancelReason, InteractionEffect, InteractionSession, NoopReason, PlacementSession, SessionKind,
};
use crate::store::LayoutStore;
use crate::widget::WidgetDraft;

impl LayoutStore {
    /// Enter placement mode for `draft`. The preview starts at the top-left
    /// corner with the draft's span clamped to its limits.
    pub fn start_placement(&mut self, draft: WidgetDraft) -> InteractionEffect {
        if self.session.is_active() {
            return InteractionEffect::noop(NoopReason::SessionAlreadyActive);
        }
        let preview = self.fit_moving_rect(draft.rect.with_origin(0, 0), &draft.limits);
        let displaced = cascade_displace(&preview, None, &self.widgets, self.config.cascade);
        let kind = draft.kind;
        self.session = InteractionSession::Placement(PlacementSession {
            draft,
            preview,
            displaced,
        });
        tracing::debug!(%kind, ?preview, "placement started");
        InteractionEffect::PlacementStarted { kind, preview }
    }

    /// Enter placement mode for a catalog widget.
    pub fn start_placement_from_catalog(
        &mut self,
        kind: &str,
        catalog: &dyn WidgetCatalog,
    ) -> InteractionEffect {
        if self.session.is_active() {
            return InteractionEffect::noop(NoopReason::SessionAlreadyActive);
        }
        match catalog.create_widget(kind) {
            Some(draft) => self.start_placement(draft),
            None => {
                tracing::debug!(kind, "placement requested for unknown widget type");
                InteractionEffect::noop(NoopReason::UnknownWidgetType)
            }
        }
    }

    /// Move the candidate so its top-left corner sits on `cell`.
    pub fn set_preview_position(&mut self, cell: GridCell) -> InteractionEffect {
        let InteractionSession::Placement(session) = &self.session else {
            return InteractionEffect::noop(self.session_mismatch());
        };
        let preview = self.fit_moving_rect(
            session.preview.with_origin(cell.col, cell.row),
            &session.draft.limits,
        );
        if preview == session.preview {
            return InteractionEffect::noop(NoopReason::Unchanged);
        }
        let displaced = cascade_displace(&preview, None, &self.widgets, self.config.cascade);
        let count = displaced.len();
        if let InteractionSession::Placement(session) = &mut self.session {
            session.preview = preview;
            session.displaced = displaced;
        }
        tracing::trace!(?preview, displaced = count, "placement preview moved");
        InteractionEffect::PreviewUpdated {
            preview,
            displaced: count,
        }
    }

    /// Move the candidate to the cell under a pointer position.
    pub fn set_preview_from_pointer(&mut self, pointer: PixelPoint) -> InteractionEffect {
        let cell = self.metrics.pixel_to_grid(pointer.x, pointer.y);
        self.set_preview_position(cell)
    }

    /// Commit the staged displacement and insert the candidate.
    pub fn confirm_placement(&mut self) -> InteractionEffect {
        let session = match std::mem::take(&mut self.session) {
            InteractionSession::Placement(session) => session,
            other => {
                self.session = other;
                return InteractionEffect::noop(self.session_mismatch());
            }
        };
        let PlacementSession {
            mut draft,
            preview,
            displaced,
        } = session;
        let count = displaced.len();
        self.apply_displacement(displaced);
        draft.rect = preview;
        let id = self.add_widget(draft, false);
        tracing::debug!(widget = %id, rect = ?preview, displaced = count, "placement confirmed");
        InteractionEffect::PlacementCommitted {
            id,
            rect: preview,
            displaced: count,
        }
    }

    /// Leave placement mode without touching the committed layout.
    pub fn cancel_placement(&mut self) -> InteractionEffect {
        if !matches!(self.session, InteractionSession::Placement(_)) {
            return InteractionEffect::noop(self.session_mismatch());
        }
        self.session = InteractionSession::Idle;
        tracing::debug!("placement canceled");
        InteractionEffect::Canceled {
            kind: SessionKind::Placement,
            reason: CancelReason::Explicit,
        }
    }

    /// Displacement the current placement preview would cause.
    #[must_use]
    pub fn placement_displacement(&self) -> Option<&Displacement> {
        match &self.session {
            InteractionSession::Placement(session) => Some(&session.displaced),
            _ => None,
        }
    }
}
