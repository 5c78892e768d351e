//! Layout store: the single owner of the canonical widget list.
//!
//! [`LayoutStore`] holds the committed widgets, the saved layout snapshot,
//! the dirty flag and the one live [`InteractionSession`]. Every mutation
//! goes through a method here (placement, drag and resize actions live in
//! their own modules as further `impl LayoutStore` blocks), so there is no
//! second copy of the widget list that could drift.
//!
//! Programmatic edits ([`LayoutStore::move_widget`],
//! [`LayoutStore::update_widget`]) overwrite geometry without a collision
//! check; only the interactive workflows cascade or reject.

use std::ops::{Deref, DerefMut};

use chrono::Utc;
use opsgrid_core::{
    BoundsIssue, GridConstraints, GridMetrics, GridMetricsError, GridRect, clamp_bounds, validate_bounds,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::catalog::WidgetCatalog;
use crate::collision::{Displacement, cascade_displace, first_fit, overlapping_pairs};
use crate::config::{GridConfig, GridConfigError};
use crate::persist::{DashboardLayout, LoadReport, PersistedLayout, sanitize_layout};
use crate::session::{CancelReason, InteractionEffect, InteractionSession, NoopReason};
use crate::storage::{LayoutStorage, StorageError, write_layout};
use crate::widget::{Widget, WidgetDraft, WidgetId, WidgetKind, WidgetLimits, WidgetPatch};

/// Owner of one dashboard's widgets and interaction state.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    pub(crate) config: GridConfig,
    pub(crate) metrics: GridMetrics,
    pub(crate) layout: DashboardLayout,
    pub(crate) widgets: Vec<Widget>,
    pub(crate) session: InteractionSession,
    pub(crate) dirty: bool,
    next_id: u64,
}

impl Default for LayoutStore {
    fn default() -> Self {
        let config = GridConfig::default();
        let layout = fresh_layout(&config);
        Self::from_parts(config, GridMetrics::default(), layout)
    }
}

impl LayoutStore {
    /// Empty store for a validated config.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(GridConfigError::Validation(errors));
        }
        let metrics = config
            .metrics()
            .map_err(|err| GridConfigError::Validation(vec![format!("grid metrics: {err}")]))?;
        let layout = fresh_layout(&config);
        Ok(Self::from_parts(config, metrics, layout))
    }

    fn from_parts(config: GridConfig, metrics: GridMetrics, layout: DashboardLayout) -> Self {
        let widgets = layout.widgets.clone();
        Self {
            config,
            metrics,
            layout,
            widgets,
            session: InteractionSession::Idle,
            dirty: false,
            next_id: 0,
        }
    }

    // ========================================================================
    // Load / save
    // ========================================================================

    /// Replace the store's contents with the record in `storage`.
    ///
    /// Corrupt widgets are dropped and an unreadable record resets to an empty
    /// layout; either way the corrected record is written back. A failed
    /// write-back is logged and does not fail the load. Any live session is
    /// canceled once the record has been read; a read error leaves the store
    /// and its session untouched.
    pub fn load_from(&mut self, storage: &mut dyn LayoutStorage) -> Result<LoadReport, StorageError> {
        let _span = tracing::debug_span!("layout_load").entered();
        let stored = storage.read()?;
        self.cancel_with(CancelReason::Invalidated);

        let report = match stored {
            None => LoadReport {
                layout: fresh_layout(&self.config),
                dropped: Vec::new(),
                reset: false,
            },
            Some(text) => match PersistedLayout::from_json_str(&text) {
                Ok(persisted) => sanitize_layout(persisted),
                Err(err) => {
                    tracing::warn!(error = %err, "stored layout unreadable, resetting");
                    LoadReport {
                        layout: fresh_layout(&self.config),
                        dropped: Vec::new(),
                        reset: true,
                    }
                }
            },
        };

        if report.needs_write_back() {
            if let Err(err) = write_layout(storage, &report.layout.to_persisted()) {
                tracing::warn!(error = %err, "failed to write back sanitized layout");
            }
        }

        let overlaps = overlapping_pairs(&report.layout.widgets);
        if !overlaps.is_empty() {
            tracing::warn!(pairs = overlaps.len(), "loaded layout contains overlapping widgets");
        }

        self.layout = report.layout.clone();
        self.widgets = report.layout.widgets.clone();
        self.dirty = false;
        tracing::debug!(
            layout = %self.layout.id,
            widgets = self.widgets.len(),
            dropped = report.dropped.len(),
            reset = report.reset,
            "layout loaded"
        );
        Ok(report)
    }

    /// Snapshot the working widgets into the saved layout.
    ///
    /// Saving a clean store changes nothing, `updated_at` included.
    pub fn save_layout(&mut self) -> &DashboardLayout {
        if self.dirty {
            self.layout.widgets = self.widgets.clone();
            self.layout.updated_at = Utc::now().max(self.layout.updated_at);
            self.dirty = false;
            tracing::debug!(layout = %self.layout.id, widgets = self.widgets.len(), "layout saved");
        }
        &self.layout
    }

    /// Save and write the record to `storage`. On failure the store stays
    /// dirty.
    pub fn save_to(&mut self, storage: &mut dyn LayoutStorage) -> Result<(), StorageError> {
        let was_dirty = self.dirty;
        let record = self.save_layout().to_persisted();
        write_layout(storage, &record).inspect_err(|_| {
            self.dirty = was_dirty;
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub const fn metrics(&self) -> &GridMetrics {
        &self.metrics
    }

    /// Committed widgets in list order.
    #[must_use]
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    #[must_use]
    pub fn widget(&self, id: &WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|widget| &widget.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Last saved layout.
    #[must_use]
    pub const fn layout(&self) -> &DashboardLayout {
        &self.layout
    }

    /// Unsaved changes exist.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub const fn session(&self) -> &InteractionSession {
        &self.session
    }

    /// The host container was resized. Cell geometry is unaffected.
    pub fn set_container_width(&mut self, width_px: f64) -> Result<(), GridMetricsError> {
        self.metrics = self.metrics.with_container_width(width_px)?;
        self.config.container_width_px = width_px;
        Ok(())
    }

    // ========================================================================
    // Widget CRUD
    // ========================================================================

    /// Insert a widget and return its fresh id.
    ///
    /// With `auto_position` the draft's origin is ignored and the first-fit
    /// slot for its (clamped) span is used instead.
    pub fn add_widget(&mut self, mut draft: WidgetDraft, auto_position: bool) -> WidgetId {
        if auto_position {
            let spans = draft.limits.apply_to(self.config.spans);
            let w = spans.clamp_w(draft.rect.w).min(self.config.total_cols);
            let h = spans.clamp_h(draft.rect.h);
            draft.rect = first_fit(
                w,
                h,
                &self.widgets,
                self.config.total_cols,
                self.config.max_row_scan,
            );
        }
        let id = self.next_widget_id();
        tracing::debug!(widget = %id, kind = %draft.kind, rect = ?draft.rect, "widget added");
        self.widgets.push(Widget::from_draft(id.clone(), draft));
        self.dirty = true;
        self.reconcile_session();
        id
    }

    /// Insert a catalog widget at its first-fit slot. Unknown kinds are
    /// ignored.
    pub fn add_from_catalog(&mut self, kind: &str, catalog: &dyn WidgetCatalog) -> Option<WidgetId> {
        match catalog.create_widget(kind) {
            Some(draft) => Some(self.add_widget(draft, true)),
            None => {
                tracing::debug!(kind, "unknown widget type ignored");
                None
            }
        }
    }

    /// Merge `patch` into a widget. Returns `false` if the id is unknown.
    pub fn update_widget(&mut self, id: &WidgetId, patch: WidgetPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let geometry = patch.touches_geometry();
        patch.apply(&mut self.widgets[index]);
        self.dirty = true;
        if geometry {
            self.reconcile_session();
        }
        true
    }

    /// Overwrite a widget's rectangle. No collision check.
    pub fn move_widget(&mut self, id: &WidgetId, rect: GridRect) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.widgets[index].rect != rect {
            self.widgets[index].rect = rect;
            self.dirty = true;
            self.reconcile_session();
        }
        true
    }

    /// Remove a widget. A session driving it is canceled.
    pub fn remove_widget(&mut self, id: &WidgetId) -> Option<Widget> {
        let index = self.index_of(id)?;
        let removed = self.widgets.remove(index);
        self.dirty = true;
        tracing::debug!(widget = %id, "widget removed");
        self.reconcile_session();
        Some(removed)
    }

    /// Remove every widget. Any live drag or resize is canceled.
    pub fn clear_dashboard(&mut self) {
        if self.widgets.is_empty() {
            return;
        }
        self.widgets.clear();
        self.dirty = true;
        tracing::debug!("dashboard cleared");
        self.reconcile_session();
    }

    // ========================================================================
    // Session control
    // ========================================================================

    /// Cancel whatever session is live, unconditionally.
    ///
    /// Staged displacement is discarded and nothing is committed. This is the
    /// cleanup path for a gesture that never received its end signal.
    pub fn force_cancel(&mut self) -> Option<InteractionEffect> {
        self.cancel_with(CancelReason::Programmatic)
    }

    /// Explicit user cancel of the live session.
    pub fn cancel_interaction(&mut self) -> InteractionEffect {
        self.cancel_with(CancelReason::Explicit)
            .unwrap_or(InteractionEffect::noop(NoopReason::NoActiveSession))
    }

    pub(crate) fn cancel_with(&mut self, reason: CancelReason) -> Option<InteractionEffect> {
        let kind = std::mem::take(&mut self.session).kind()?;
        if reason == CancelReason::Explicit {
            tracing::debug!(?kind, "session canceled");
        } else {
            tracing::warn!(?kind, ?reason, "live session force-canceled");
        }
        Some(InteractionEffect::Canceled { kind, reason })
    }

    /// Scope guard that force-cancels any session still live when dropped.
    pub fn interaction(&mut self) -> InteractionGuard<'_> {
        InteractionGuard { store: self }
    }

    pub(crate) fn session_mismatch(&self) -> NoopReason {
        if self.session.is_active() {
            NoopReason::SessionKindMismatch
        } else {
            NoopReason::NoActiveSession
        }
    }

    /// Bring the live session back in line with the widget list after a
    /// structural edit.
    ///
    /// A drag or resize whose widget is gone is canceled. Staged placement
    /// and drag displacement is recomputed against the new list.
    fn reconcile_session(&mut self) {
        let mode = self.config.cascade;
        let stale = match &self.session {
            InteractionSession::Idle => return,
            InteractionSession::Placement(_) => false,
            InteractionSession::Drag(session) => self.index_of(&session.widget).is_none(),
            InteractionSession::Resize(session) => self.index_of(&session.widget).is_none(),
        };
        if stale {
            self.cancel_with(CancelReason::Invalidated);
            return;
        }
        match &mut self.session {
            InteractionSession::Placement(session) => {
                session.displaced = cascade_displace(&session.preview, None, &self.widgets, mode);
            }
            InteractionSession::Drag(session) => {
                session.displaced =
                    cascade_displace(&session.candidate, Some(&session.widget), &self.widgets, mode);
            }
            InteractionSession::Idle | InteractionSession::Resize(_) => {}
        }
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Where everything should be drawn right now.
    ///
    /// Committed widgets appear at their committed rectangle unless the live
    /// session stages a different one. A placement candidate is appended last.
    #[must_use]
    pub fn display_rects(&self) -> Vec<DisplayItem> {
        let displaced = self.session.displacement();
        let mut items: Vec<DisplayItem> = self
            .widgets
            .iter()
            .map(|widget| {
                let (rect, role) = match &self.session {
                    InteractionSession::Drag(session) if session.widget == widget.id => {
                        (session.candidate, DisplayRole::Dragging)
                    }
                    InteractionSession::Resize(session) if session.widget == widget.id => {
                        (widget.rect, DisplayRole::Resizing)
                    }
                    _ => match displaced.and_then(|moves| moves.get(&widget.id)) {
                        Some(rect) => (rect, DisplayRole::Displaced),
                        None => (widget.rect, DisplayRole::Committed),
                    },
                };
                DisplayItem {
                    id: Some(widget.id.clone()),
                    kind: widget.kind,
                    rect,
                    role,
                }
            })
            .collect();
        if let InteractionSession::Placement(session) = &self.session {
            items.push(DisplayItem {
                id: None,
                kind: session.draft.kind,
                rect: session.preview,
                role: DisplayRole::Candidate,
            });
        }
        items
    }

    /// Rectangle of the placement candidate or dragged widget.
    #[must_use]
    pub fn preview(&self) -> Option<GridRect> {
        match &self.session {
            InteractionSession::Placement(session) => Some(session.preview),
            InteractionSession::Drag(session) => Some(session.candidate),
            InteractionSession::Idle | InteractionSession::Resize(_) => None,
        }
    }

    /// Staged displacement of the live session, if any.
    #[must_use]
    pub fn staged_displacement(&self) -> Option<&Displacement> {
        self.session.displacement()
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Check the committed widgets for overlap, out-of-bounds geometry and
    /// duplicate ids.
    #[must_use]
    pub fn invariant_report(&self) -> LayoutReport {
        let mut issues = Vec::new();

        let mut seen: FxHashSet<&WidgetId> = FxHashSet::default();
        for widget in &self.widgets {
            if !seen.insert(&widget.id) {
                issues.push(LayoutIssue::DuplicateId {
                    id: widget.id.clone(),
                });
            }
        }

        for widget in &self.widgets {
            let constraints = self.constraints_for(&widget.limits);
            for issue in validate_bounds(&widget.rect, &constraints).issues {
                issues.push(LayoutIssue::OutOfBounds {
                    id: widget.id.clone(),
                    issue,
                });
            }
        }

        for (a, b) in overlapping_pairs(&self.widgets) {
            issues.push(LayoutIssue::Overlap { a, b });
        }

        LayoutReport { issues }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn index_of(&self, id: &WidgetId) -> Option<usize> {
        self.widgets.iter().position(|widget| &widget.id == id)
    }

    pub(crate) fn constraints_for(&self, limits: &WidgetLimits) -> GridConstraints {
        GridConstraints::new(self.config.total_cols, limits.apply_to(self.config.spans))
    }

    /// Clamp a moving candidate (placement preview, drag target) into the
    /// grid. Spans are clamped to their limits and kept; a candidate past the
    /// last column slides left instead of shrinking.
    pub(crate) fn fit_moving_rect(&self, rect: GridRect, limits: &WidgetLimits) -> GridRect {
        let sized = clamp_bounds(&rect.with_origin(0, rect.y), &self.constraints_for(limits));
        let max_x = self.config.total_cols.saturating_sub(sized.w);
        sized.with_origin(rect.x.min(max_x), rect.y)
    }

    /// Write staged rectangles into the widget list. Ids that no longer exist
    /// are skipped.
    pub(crate) fn apply_displacement(&mut self, displacement: Displacement) {
        if displacement.is_empty() {
            return;
        }
        let index: FxHashMap<WidgetId, usize> = self
            .widgets
            .iter()
            .enumerate()
            .map(|(i, widget)| (widget.id.clone(), i))
            .collect();
        for (id, rect) in displacement {
            let Some(&i) = index.get(&id) else {
                continue;
            };
            if self.widgets[i].rect != rect {
                self.widgets[i].rect = rect;
                self.dirty = true;
            }
        }
    }

    fn next_widget_id(&mut self) -> WidgetId {
        loop {
            self.next_id += 1;
            let id = WidgetId::new(format!("{}-{}", self.config.id_prefix, self.next_id));
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }
}

fn fresh_layout(config: &GridConfig) -> DashboardLayout {
    let now = Utc::now();
    DashboardLayout::empty(
        format!("layout-{}", now.timestamp_millis()),
        config.layout_name.clone(),
        now,
    )
}

// ============================================================================
// Guard
// ============================================================================

/// Exclusive handle on a store for the duration of one gesture.
///
/// Dropping the guard while a session is still live force-cancels it, so an
/// early return or a lost pointer capture cannot leave a dangling session.
#[derive(Debug)]
pub struct InteractionGuard<'a> {
    store: &'a mut LayoutStore,
}

impl Deref for InteractionGuard<'_> {
    type Target = LayoutStore;

    fn deref(&self) -> &LayoutStore {
        self.store
    }
}

impl DerefMut for InteractionGuard<'_> {
    fn deref_mut(&mut self) -> &mut LayoutStore {
        self.store
    }
}

impl Drop for InteractionGuard<'_> {
    fn drop(&mut self) {
        if let Some(effect) = self.store.force_cancel() {
            tracing::debug!(?effect, "interaction guard dropped with live session");
        }
    }
}

// ============================================================================
// Display / diagnostics types
// ============================================================================

/// How a rectangle in [`LayoutStore::display_rects`] should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayRole {
    Committed,
    /// Staged cascade position, not yet committed.
    Displaced,
    Dragging,
    Resizing,
    /// Placement candidate. Has no id yet.
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub id: Option<WidgetId>,
    pub kind: WidgetKind,
    pub rect: GridRect,
    pub role: DisplayRole,
}

/// One violated layout invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    Overlap { a: WidgetId, b: WidgetId },
    OutOfBounds { id: WidgetId, issue: BoundsIssue },
    DuplicateId { id: WidgetId },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutReport {
    pub issues: Vec<LayoutIssue>,
}

impl LayoutReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn overlaps(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, LayoutIssue::Overlap { .. }))
            .count()
    }
}
