//! Drag-to-move with live cascade preview.

use opsgrid_core::{GridCell, PixelPoint};

use crate::collision::cascade_displace;
use crate::session::{
    CancelReason, DragSession, InteractionEffect, InteractionSession, NoopReason, SessionKind,
};
use crate::store::LayoutStore;
use crate::widget::WidgetId;

impl LayoutStore {
    /// Start dragging `id` from its committed position.
    pub fn begin_drag(&mut self, id: &WidgetId) -> InteractionEffect {
        self.begin_drag_inner(id, None)
    }

    /// Start dragging `id`, remembering where inside the widget it was
    /// grabbed so pointer updates keep that offset.
    pub fn begin_drag_at(&mut self, id: &WidgetId, pointer: PixelPoint) -> InteractionEffect {
        let Some(widget) = self.widget(id) else {
            return InteractionEffect::noop(NoopReason::WidgetNotFound);
        };
        let corner = self.metrics.grid_to_pixel(widget.rect.x, widget.rect.y);
        let grab = PixelPoint::new(pointer.x - corner.x, pointer.y - corner.y);
        self.begin_drag_inner(id, Some(grab))
    }

    fn begin_drag_inner(&mut self, id: &WidgetId, grab_offset: Option<PixelPoint>) -> InteractionEffect {
        if self.session.is_active() {
            return InteractionEffect::noop(NoopReason::SessionAlreadyActive);
        }
        let Some(origin) = self.widget(id).map(|widget| widget.rect) else {
            return InteractionEffect::noop(NoopReason::WidgetNotFound);
        };
        self.session = InteractionSession::Drag(DragSession {
            widget: id.clone(),
            origin,
            candidate: origin,
            displaced: Default::default(),
            grab_offset,
        });
        tracing::debug!(widget = %id, ?origin, "drag started");
        InteractionEffect::DragStarted {
            id: id.clone(),
            origin,
        }
    }

    /// Move the dragged widget's candidate so its top-left sits on `cell`.
    pub fn update_drag(&mut self, id: &WidgetId, cell: GridCell) -> InteractionEffect {
        let current = match &self.session {
            InteractionSession::Drag(session) if &session.widget == id => session.candidate,
            InteractionSession::Drag(_) => {
                return InteractionEffect::noop(NoopReason::WidgetMismatch);
            }
            _ => return InteractionEffect::noop(self.session_mismatch()),
        };
        let Some(limits) = self.widget(id).map(|widget| widget.limits) else {
            self.cancel_with(CancelReason::Invalidated);
            return InteractionEffect::Canceled {
                kind: SessionKind::Drag,
                reason: CancelReason::Invalidated,
            };
        };
        let candidate = self.fit_moving_rect(current.with_origin(cell.col, cell.row), &limits);
        if candidate == current {
            return InteractionEffect::noop(NoopReason::Unchanged);
        }
        let displaced = cascade_displace(&candidate, Some(id), &self.widgets, self.config.cascade);
        let count = displaced.len();
        if let InteractionSession::Drag(session) = &mut self.session {
            session.candidate = candidate;
            session.displaced = displaced;
        }
        tracing::trace!(widget = %id, ?candidate, displaced = count, "drag moved");
        InteractionEffect::DragUpdated {
            id: id.clone(),
            candidate,
            displaced: count,
        }
    }

    /// Follow the pointer, keeping the grab offset recorded at drag start.
    pub fn update_drag_from_pointer(&mut self, pointer: PixelPoint) -> InteractionEffect {
        let InteractionSession::Drag(session) = &self.session else {
            return InteractionEffect::noop(self.session_mismatch());
        };
        let grab = session.grab_offset.unwrap_or(PixelPoint::new(0.0, 0.0));
        let id = session.widget.clone();
        let cell = self.metrics.pixel_to_grid(pointer.x - grab.x, pointer.y - grab.y);
        self.update_drag(&id, cell)
    }

    /// End the drag.
    ///
    /// The session is cleared whatever happens. With `commit` the staged
    /// displacement and candidate are written to the layout; without it
    /// nothing changes.
    pub fn end_drag(&mut self, commit: bool) -> InteractionEffect {
        let session = match std::mem::take(&mut self.session) {
            InteractionSession::Drag(session) => session,
            other => {
                self.session = other;
                return InteractionEffect::noop(self.session_mismatch());
            }
        };
        if !commit {
            tracing::debug!(widget = %session.widget, "drag discarded");
            return InteractionEffect::Canceled {
                kind: SessionKind::Drag,
                reason: CancelReason::Explicit,
            };
        }
        let Some(index) = self.index_of(&session.widget) else {
            return InteractionEffect::Canceled {
                kind: SessionKind::Drag,
                reason: CancelReason::Invalidated,
            };
        };
        let count = session.displaced.len();
        self.apply_displacement(session.displaced);
        if self.widgets[index].rect != session.candidate {
            self.widgets[index].rect = session.candidate;
            self.dirty = true;
        }
        tracing::debug!(widget = %session.widget, rect = ?session.candidate, displaced = count, "drag committed");
        InteractionEffect::DragCommitted {
            id: session.widget,
            rect: session.candidate,
            displaced: count,
        }
    }
}
