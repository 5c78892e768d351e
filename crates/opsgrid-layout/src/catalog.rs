//! Widget catalog: default span and config per widget kind.

use opsgrid_core::GridRect;
use serde_json::json;

use crate::widget::{WidgetDraft, WidgetKind};

/// Source of new widgets.
///
/// `None` means the requested type is unknown; callers treat that as a
/// no-op because it points at a stale menu entry, not a user mistake.
pub trait WidgetCatalog {
    fn create_widget(&self, kind: &str) -> Option<WidgetDraft>;
}

impl<F> WidgetCatalog for F
where
    F: Fn(&str) -> Option<WidgetDraft>,
{
    fn create_widget(&self, kind: &str) -> Option<WidgetDraft> {
        self(kind)
    }
}

/// Built-in catalog covering every [`WidgetKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl DefaultCatalog {
    /// Default `(w, h)` span for a kind.
    #[must_use]
    pub const fn default_span(kind: WidgetKind) -> (u16, u16) {
        match kind {
            WidgetKind::Kpi => (3, 2),
            WidgetKind::Chart => (6, 4),
            WidgetKind::List => (4, 4),
            WidgetKind::QuickActions => (4, 2),
            WidgetKind::Alerts => (4, 3),
            WidgetKind::ModuleStats => (6, 3),
        }
    }

    /// Draft for a known kind.
    #[must_use]
    pub fn draft(kind: WidgetKind) -> WidgetDraft {
        let (w, h) = Self::default_span(kind);
        let config = match kind {
            WidgetKind::Kpi => json!({ "title": "KPI", "metric": "open_tickets" }),
            WidgetKind::Chart => json!({ "title": "Chart", "chartType": "bar", "metric": "tickets_by_status" }),
            WidgetKind::List => json!({ "title": "Recent items", "source": "tickets", "limit": 5 }),
            WidgetKind::QuickActions => json!({ "title": "Quick actions", "actions": [] }),
            WidgetKind::Alerts => json!({ "title": "Alerts", "severity": "all" }),
            WidgetKind::ModuleStats => json!({ "title": "Module stats", "module": "inventory" }),
        };
        WidgetDraft::new(kind, GridRect::new(0, 0, w, h)).with_config(config)
    }
}

impl WidgetCatalog for DefaultCatalog {
    fn create_widget(&self, kind: &str) -> Option<WidgetDraft> {
        WidgetKind::from_name(kind).map(Self::draft)
    }
}
