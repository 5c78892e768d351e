//! Dashboard widget model.
//!
//! The grid engine only reads a widget's id and rectangle. Kind, config,
//! theme and data source ride along for the rendering and data layers.

use std::fmt;

use opsgrid_core::{GridRect, SpanLimits};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable widget identifier, unique within one layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Closed set of widget kinds the dashboard can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Kpi,
    Chart,
    List,
    QuickActions,
    Alerts,
    ModuleStats,
}

impl WidgetKind {
    pub const ALL: [Self; 6] = [
        Self::Kpi,
        Self::Chart,
        Self::List,
        Self::QuickActions,
        Self::Alerts,
        Self::ModuleStats,
    ];

    /// Wire name, as stored in the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kpi => "kpi",
            Self::Chart => "chart",
            Self::List => "list",
            Self::QuickActions => "quick_actions",
            Self::Alerts => "alerts",
            Self::ModuleStats => "module_stats",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote endpoint a widget pulls its data from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub endpoint: String,
    /// Refresh interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<u64>,
}

/// Per-widget span bounds overriding the grid defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WidgetLimits {
    pub min_w: Option<u16>,
    pub min_h: Option<u16>,
    pub max_w: Option<u16>,
    pub max_h: Option<u16>,
}

impl WidgetLimits {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min_w.is_none() && self.min_h.is_none() && self.max_w.is_none() && self.max_h.is_none()
    }

    /// Layer these overrides on top of the grid defaults.
    #[must_use]
    pub fn apply_to(&self, defaults: SpanLimits) -> SpanLimits {
        SpanLimits {
            min_w: self.min_w.unwrap_or(defaults.min_w),
            min_h: self.min_h.unwrap_or(defaults.min_h),
            max_w: self.max_w.unwrap_or(defaults.max_w),
            max_h: self.max_h.unwrap_or(defaults.max_h),
        }
    }
}

/// A placed dashboard widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub rect: GridRect,
    pub limits: WidgetLimits,
    pub config: Value,
    pub data_source: Option<DataSource>,
    pub theme: Option<Value>,
}

impl Widget {
    /// Give a draft its identity.
    #[must_use]
    pub fn from_draft(id: WidgetId, draft: WidgetDraft) -> Self {
        Self {
            id,
            kind: draft.kind,
            rect: draft.rect,
            limits: draft.limits,
            config: draft.config,
            data_source: draft.data_source,
            theme: draft.theme,
        }
    }
}

/// A widget that has not been inserted yet and therefore has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDraft {
    pub kind: WidgetKind,
    pub rect: GridRect,
    pub limits: WidgetLimits,
    pub config: Value,
    pub data_source: Option<DataSource>,
    pub theme: Option<Value>,
}

impl WidgetDraft {
    /// Draft with an empty config object.
    #[must_use]
    pub fn new(kind: WidgetKind, rect: GridRect) -> Self {
        Self {
            kind,
            rect,
            limits: WidgetLimits::default(),
            config: Value::Object(serde_json::Map::new()),
            data_source: None,
            theme: None,
        }
    }

    /// Draft sized `w x h` at the grid origin.
    #[must_use]
    pub fn sized(kind: WidgetKind, w: u16, h: u16) -> Self {
        Self::new(kind, GridRect::new(0, 0, w, h))
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: WidgetLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_source = Some(data_source);
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Value) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Shallow partial update. `None` leaves a field alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetPatch {
    pub kind: Option<WidgetKind>,
    pub rect: Option<GridRect>,
    pub limits: Option<WidgetLimits>,
    pub config: Option<Value>,
    pub data_source: Option<Option<DataSource>>,
    pub theme: Option<Option<Value>>,
}

impl WidgetPatch {
    #[must_use]
    pub fn rect(rect: GridRect) -> Self {
        Self {
            rect: Some(rect),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(config: Value) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Option<Value>) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn with_data_source(mut self, data_source: Option<DataSource>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Whether applying this patch can move or resize the widget.
    #[must_use]
    pub const fn touches_geometry(&self) -> bool {
        self.rect.is_some()
    }

    pub fn apply(self, widget: &mut Widget) {
        if let Some(kind) = self.kind {
            widget.kind = kind;
        }
        if let Some(rect) = self.rect {
            widget.rect = rect;
        }
        if let Some(limits) = self.limits {
            widget.limits = limits;
        }
        if let Some(config) = self.config {
            widget.config = config;
        }
        if let Some(data_source) = self.data_source {
            widget.data_source = data_source;
        }
        if let Some(theme) = self.theme {
            widget.theme = theme;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_names_round_trip() {
        for kind in WidgetKind::ALL {
            assert_eq!(WidgetKind::from_name(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(WidgetKind::from_name("gauge"), None);
    }

    #[test]
    fn limits_override_defaults() {
        let limits = WidgetLimits {
            min_w: Some(4),
            max_h: Some(3),
            ..WidgetLimits::default()
        };
        let merged = limits.apply_to(SpanLimits::default());
        assert_eq!(merged, SpanLimits::new(4, 1, 12, 3));
        assert!(WidgetLimits::default().is_empty());
        assert!(!limits.is_empty());
    }

    #[test]
    fn patch_is_shallow() {
        let mut widget = Widget::from_draft(
            WidgetId::new("w-1"),
            WidgetDraft::sized(WidgetKind::Chart, 6, 4)
                .with_config(json!({"title": "Tickets", "chartType": "bar"}))
                .with_theme(json!({"accent": "teal"})),
        );
        WidgetPatch::config(json!({"title": "Open tickets"})).apply(&mut widget);
        assert_eq!(widget.config, json!({"title": "Open tickets"}));
        assert_eq!(widget.rect, GridRect::new(0, 0, 6, 4));
        assert_eq!(widget.theme, Some(json!({"accent": "teal"})));

        WidgetPatch::default().with_theme(None).apply(&mut widget);
        assert_eq!(widget.theme, None);
    }

    #[test]
    fn geometry_patch_detection() {
        assert!(WidgetPatch::rect(GridRect::new(1, 1, 2, 2)).touches_geometry());
        assert!(!WidgetPatch::config(json!({})).touches_geometry());
    }
}
