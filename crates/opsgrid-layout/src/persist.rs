//! Persisted layout record and load-time sanitizing.
//!
//! The stored record is JSON:
//!
//! ```json
//! {
//!   "id": "layout-1",
//!   "name": "Dashboard",
//!   "widgets": [
//!     { "id": "widget-1", "type": "kpi",
//!       "position": { "x": 0, "y": 0, "w": 3, "h": 2, "minW": 2 },
//!       "config": { "title": "Open tickets" } }
//!   ],
//!   "createdAt": "2026-01-05T09:00:00Z",
//!   "updatedAt": "2026-01-05T09:00:00Z"
//! }
//! ```
//!
//! Two position shapes are accepted on load: the canonical 0-based
//! `{x, y, w, h}` (optionally with `minW/minH/maxW/maxH`) and the older
//! 1-based `{col, row, colSpan, rowSpan}`. Only the canonical shape is written.
//!
//! Widgets whose geometry is missing or not a finite non-negative integer are
//! dropped, never defaulted. So are entries that do not have the widget record
//! shape at all (a string `position`, a numeric `id`). Only a record whose
//! top level is unreadable fails to parse. [`sanitize_layout`] reports every
//! drop so the caller can write the corrected record back.

use std::fmt;

use chrono::{DateTime, Utc};
use opsgrid_core::{GridPosition, GridRect};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::widget::{DataSource, Widget, WidgetId, WidgetKind, WidgetLimits};

/// A layout as the engine holds it after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardLayout {
    pub id: String,
    pub name: String,
    pub widgets: Vec<Widget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DashboardLayout {
    /// Empty layout stamped with `now`.
    #[must_use]
    pub fn empty(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            widgets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Storage form of this layout.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedLayout {
        PersistedLayout {
            id: self.id.clone(),
            name: self.name.clone(),
            widgets: self
                .widgets
                .iter()
                .map(|widget| StoredWidget::Record(PersistedWidget::from_widget(widget)))
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Stored layout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLayout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<StoredWidget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedLayout {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One entry of the stored `widgets` array.
///
/// Entries decode independently. One that does not fit [`PersistedWidget`]
/// is kept as raw JSON so [`sanitize_layout`] can drop it on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredWidget {
    Record(PersistedWidget),
    Malformed { raw: Value, error: String },
}

impl StoredWidget {
    #[must_use]
    pub fn record(&self) -> Option<&PersistedWidget> {
        match self {
            Self::Record(record) => Some(record),
            Self::Malformed { .. } => None,
        }
    }

    /// Stored id as text, whatever its JSON type. Empty when absent.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Record(record) => record.id.clone(),
            Self::Malformed { raw, .. } => match raw.get("id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
        }
    }
}

impl From<PersistedWidget> for StoredWidget {
    fn from(record: PersistedWidget) -> Self {
        Self::Record(record)
    }
}

impl Serialize for StoredWidget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Record(record) => record.serialize(serializer),
            Self::Malformed { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StoredWidget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match PersistedWidget::deserialize(&raw) {
            Ok(record) => Self::Record(record),
            Err(err) => Self::Malformed {
                error: err.to_string(),
                raw,
            },
        })
    }
}

/// Stored widget record.
///
/// Geometry fields are lenient on read: a non-numeric cell reads as absent
/// and is reported as missing geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWidget {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub position: Option<PersistedPosition>,
    #[serde(default = "empty_object")]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl PersistedWidget {
    #[must_use]
    pub fn from_widget(widget: &Widget) -> Self {
        Self {
            id: widget.id.as_str().to_owned(),
            kind: widget.kind.as_str().to_owned(),
            position: Some(PersistedPosition::from_rect(widget.rect, widget.limits)),
            config: widget.config.clone(),
            data_source: widget.data_source.clone(),
            theme: widget.theme.clone(),
        }
    }
}

/// Raw position fields. Either shape may be present; numbers that are not
/// JSON numbers read as absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPosition {
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub w: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub h: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_w: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_h: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_w: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_h: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub col: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub row: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub col_span: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        serialize_with = "whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_span: Option<f64>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

/// Cells are integers; write them as JSON integers.
fn whole_number<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *value {
        Some(v) if v.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&v) => {
            serializer.serialize_u16(v as u16)
        }
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}

impl PersistedPosition {
    /// Canonical `{x, y, w, h}` form.
    #[must_use]
    pub fn from_rect(rect: GridRect, limits: WidgetLimits) -> Self {
        Self {
            x: Some(f64::from(rect.x)),
            y: Some(f64::from(rect.y)),
            w: Some(f64::from(rect.w)),
            h: Some(f64::from(rect.h)),
            min_w: limits.min_w.map(f64::from),
            min_h: limits.min_h.map(f64::from),
            max_w: limits.max_w.map(f64::from),
            max_h: limits.max_h.map(f64::from),
            ..Self::default()
        }
    }

    /// Legacy 1-based form.
    #[must_use]
    pub fn from_grid_position(position: GridPosition) -> Self {
        Self {
            col: Some(f64::from(position.col)),
            row: Some(f64::from(position.row)),
            col_span: Some(f64::from(position.col_span)),
            row_span: Some(f64::from(position.row_span)),
            ..Self::default()
        }
    }

    fn uses_canonical_shape(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.w.is_some() || self.h.is_some()
    }

    /// Adapt either shape into a rectangle plus per-widget limits.
    pub fn resolve(&self) -> Result<(GridRect, WidgetLimits), DropReason> {
        let rect = if self.uses_canonical_shape() {
            GridRect::new(
                cell("x", self.x, 0)?,
                cell("y", self.y, 0)?,
                cell("w", self.w, 1)?,
                cell("h", self.h, 1)?,
            )
        } else {
            GridPosition::new(
                cell("col", self.col, 1)?,
                cell("row", self.row, 1)?,
                cell("colSpan", self.col_span, 1)?,
                cell("rowSpan", self.row_span, 1)?,
            )
            .to_rect()
        };
        // Malformed limits are advisory; they fall back to grid defaults.
        let limits = WidgetLimits {
            min_w: optional_cell(self.min_w),
            min_h: optional_cell(self.min_h),
            max_w: optional_cell(self.max_w),
            max_h: optional_cell(self.max_h),
        };
        Ok((rect, limits))
    }
}

fn cell(field: &'static str, value: Option<f64>, min: u16) -> Result<u16, DropReason> {
    let Some(value) = value else {
        return Err(DropReason::MissingGeometry { field });
    };
    if !value.is_finite()
        || value.fract() != 0.0
        || value < f64::from(min)
        || value > f64::from(u16::MAX)
    {
        return Err(DropReason::InvalidGeometry { field, value });
    }
    Ok(value as u16)
}

fn optional_cell(value: Option<f64>) -> Option<u16> {
    value.and_then(|v| cell("limit", Some(v), 1).ok())
}

/// Why a stored widget was dropped on load.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    MissingId,
    DuplicateId,
    UnknownKind { kind: String },
    MissingPosition,
    MissingGeometry { field: &'static str },
    InvalidGeometry { field: &'static str, value: f64 },
    /// The entry does not have the widget record shape.
    Malformed { error: String },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing id"),
            Self::DuplicateId => write!(f, "duplicate id"),
            Self::UnknownKind { kind } => write!(f, "unknown widget type {kind:?}"),
            Self::MissingPosition => write!(f, "missing position"),
            Self::MissingGeometry { field } => write!(f, "missing position field {field}"),
            Self::InvalidGeometry { field, value } => {
                write!(f, "invalid position field {field} = {value}")
            }
            Self::Malformed { error } => write!(f, "malformed widget record ({error})"),
        }
    }
}

/// One dropped widget.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedWidget {
    /// Stored id, possibly empty.
    pub id: String,
    pub reason: DropReason,
}

/// Outcome of [`sanitize_layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub layout: DashboardLayout,
    pub dropped: Vec<DroppedWidget>,
    /// The whole record was unreadable and replaced by an empty layout.
    pub reset: bool,
}

impl LoadReport {
    /// Whether the stored record differs from what was loaded and should be
    /// written back.
    #[must_use]
    pub fn needs_write_back(&self) -> bool {
        self.reset || !self.dropped.is_empty()
    }

    /// One-line user notice, present only when something was discarded.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        if self.reset {
            return Some("Dashboard layout was reset: the saved layout could not be read.".into());
        }
        match self.dropped.len() {
            0 => None,
            n => Some(format!(
                "Dashboard layout was reset: {n} widget(s) with invalid data were removed."
            )),
        }
    }
}

/// Convert a stored record into an engine layout, dropping corrupt widgets.
#[must_use]
pub fn sanitize_layout(persisted: PersistedLayout) -> LoadReport {
    let mut widgets = Vec::with_capacity(persisted.widgets.len());
    let mut dropped = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();

    for entry in persisted.widgets {
        let outcome = match &entry {
            StoredWidget::Record(record) => sanitize_widget(record, &seen),
            StoredWidget::Malformed { error, .. } => Err(DropReason::Malformed {
                error: error.clone(),
            }),
        };
        match outcome {
            Ok(widget) => {
                seen.insert(widget.id.as_str().to_owned());
                widgets.push(widget);
            }
            Err(reason) => {
                let id = entry.id();
                tracing::warn!(widget = %id, %reason, "dropping stored widget");
                dropped.push(DroppedWidget { id, reason });
            }
        }
    }

    LoadReport {
        layout: DashboardLayout {
            id: persisted.id,
            name: persisted.name,
            widgets,
            created_at: persisted.created_at,
            updated_at: persisted.updated_at,
        },
        dropped,
        reset: false,
    }
}

fn sanitize_widget(record: &PersistedWidget, seen: &FxHashSet<String>) -> Result<Widget, DropReason> {
    if record.id.is_empty() {
        return Err(DropReason::MissingId);
    }
    if seen.contains(&record.id) {
        return Err(DropReason::DuplicateId);
    }
    let kind = WidgetKind::from_name(&record.kind).ok_or_else(|| DropReason::UnknownKind {
        kind: record.kind.clone(),
    })?;
    let position = record.position.as_ref().ok_or(DropReason::MissingPosition)?;
    let (rect, limits) = position.resolve()?;
    Ok(Widget {
        id: WidgetId::new(record.id.clone()),
        kind,
        rect,
        limits,
        config: record.config.clone(),
        data_source: record.data_source.clone(),
        theme: record.theme.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(widgets: Value) -> PersistedLayout {
        serde_json::from_value(json!({
            "id": "layout-1",
            "name": "Ops",
            "widgets": widgets,
            "createdAt": "2026-01-05T09:00:00Z",
            "updatedAt": "2026-01-06T09:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn canonical_shape_loads() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2, "minW": 3 }, "config": {} }
        ])));
        assert!(report.dropped.is_empty());
        let widget = &report.layout.widgets[0];
        assert_eq!(widget.rect, GridRect::new(0, 0, 3, 2));
        assert_eq!(widget.limits.min_w, Some(3));
        assert_eq!(widget.kind, WidgetKind::Kpi);
        assert!(!report.needs_write_back());
        assert_eq!(report.notice(), None);
    }

    #[test]
    fn legacy_shape_is_one_based() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "chart", "position": { "col": 1, "row": 3, "colSpan": 6, "rowSpan": 4 } }
        ])));
        assert_eq!(report.layout.widgets[0].rect, GridRect::new(0, 2, 6, 4));
        assert_eq!(report.layout.widgets[0].config, json!({}));
    }

    #[test]
    fn corrupt_geometry_is_dropped_not_defaulted() {
        let report = sanitize_layout(record(json!([
            { "id": "ok", "type": "list", "position": { "x": 4, "y": 0, "w": 4, "h": 4 } },
            { "id": "no-h", "type": "list", "position": { "x": 0, "y": 0, "w": 4 } },
            { "id": "text", "type": "list", "position": { "x": "0", "y": 0, "w": 4, "h": 2 } },
            { "id": "neg", "type": "list", "position": { "x": -1, "y": 0, "w": 4, "h": 2 } },
            { "id": "frac", "type": "list", "position": { "x": 0.5, "y": 0, "w": 4, "h": 2 } },
            { "id": "zero", "type": "list", "position": { "x": 0, "y": 0, "w": 0, "h": 2 } },
            { "id": "legacy-zero", "type": "list", "position": { "col": 0, "row": 1, "colSpan": 2, "rowSpan": 2 } },
            { "id": "nopos", "type": "list" }
        ])));
        let kept: Vec<&str> = report.layout.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(kept, vec!["ok"]);
        assert_eq!(report.dropped.len(), 7);
        assert_eq!(
            report.dropped[0].reason,
            DropReason::MissingGeometry { field: "h" }
        );
        assert_eq!(
            report.dropped[1].reason,
            DropReason::MissingGeometry { field: "x" }
        );
        assert!(matches!(
            report.dropped[2].reason,
            DropReason::InvalidGeometry { field: "x", .. }
        ));
        assert_eq!(report.dropped[6].reason, DropReason::MissingPosition);
        assert!(report.needs_write_back());
        assert!(report.notice().unwrap().contains("7 widget(s)"));
    }

    #[test]
    fn identity_problems_are_dropped() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2 } },
            { "id": "a", "type": "kpi", "position": { "x": 3, "y": 0, "w": 3, "h": 2 } },
            { "type": "kpi", "position": { "x": 6, "y": 0, "w": 3, "h": 2 } },
            { "id": "b", "type": "weather", "position": { "x": 9, "y": 0, "w": 3, "h": 2 } }
        ])));
        assert_eq!(report.layout.widgets.len(), 1);
        let reasons: Vec<&DropReason> = report.dropped.iter().map(|d| &d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &DropReason::DuplicateId,
                &DropReason::MissingId,
                &DropReason::UnknownKind {
                    kind: "weather".into()
                },
            ]
        );
    }

    #[test]
    fn bad_limits_fall_back() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2, "minW": -4, "maxH": 6 } }
        ])));
        let limits = report.layout.widgets[0].limits;
        assert_eq!(limits.min_w, None);
        assert_eq!(limits.max_h, Some(6));
    }

    #[test]
    fn writes_canonical_shape() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "alerts", "position": { "col": 2, "row": 1, "colSpan": 4, "rowSpan": 3 },
              "dataSource": { "endpoint": "/api/alerts", "refresh": 30 } }
        ])));
        let json = serde_json::to_value(report.layout.to_persisted()).unwrap();
        assert_eq!(
            json["widgets"][0]["position"],
            json!({ "x": 1, "y": 0, "w": 4, "h": 3 })
        );
        assert_eq!(json["widgets"][0]["type"], json!("alerts"));
        assert_eq!(json["widgets"][0]["dataSource"]["refresh"], json!(30));
        assert!(json["widgets"][0].get("theme").is_none());
        assert_eq!(json["createdAt"], json!("2026-01-05T09:00:00Z"));
    }

    #[test]
    fn persisted_round_trip_preserves_layout() {
        let report = sanitize_layout(record(json!([
            { "id": "a", "type": "module_stats", "position": { "x": 6, "y": 2, "w": 6, "h": 3, "maxW": 8 },
              "config": { "module": "printers" }, "theme": { "accent": "amber" } }
        ])));
        let text = report.layout.to_persisted().to_json_string().unwrap();
        let again = sanitize_layout(PersistedLayout::from_json_str(&text).unwrap());
        assert_eq!(again.layout, report.layout);
        assert!(again.dropped.is_empty());
    }

    #[test]
    fn malformed_entries_are_dropped_one_at_a_time() {
        let persisted = PersistedLayout::from_json_str(
            &json!({
                "id": "layout-1",
                "name": "Ops",
                "widgets": [
                    { "id": "good", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2 } },
                    { "id": "pos", "type": "kpi", "position": "corrupt" },
                    { "id": 5, "type": "kpi", "position": { "x": 3, "y": 0, "w": 3, "h": 2 } },
                    { "id": "kind", "type": 7, "position": { "x": 6, "y": 0, "w": 3, "h": 2 } },
                    { "id": "src", "type": "list", "position": { "x": 9, "y": 0, "w": 3, "h": 2 },
                      "dataSource": "oops" },
                    "not-an-object"
                ],
                "createdAt": "2026-01-05T09:00:00Z",
                "updatedAt": "2026-01-06T09:00:00Z"
            })
            .to_string(),
        )
        .unwrap();
        assert!(persisted.widgets[0].record().is_some());
        assert!(persisted.widgets[1].record().is_none());

        let report = sanitize_layout(persisted);
        let kept: Vec<&str> = report.layout.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(kept, vec!["good"]);
        let ids: Vec<&str> = report.dropped.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["pos", "5", "kind", "src", ""]);
        assert!(
            report
                .dropped
                .iter()
                .all(|d| matches!(d.reason, DropReason::Malformed { .. }))
        );
        assert!(!report.reset);
        assert!(report.needs_write_back());
        assert!(report.notice().unwrap().contains("5 widget(s)"));

        let rewritten = serde_json::to_value(report.layout.to_persisted()).unwrap();
        assert_eq!(rewritten["widgets"].as_array().unwrap().len(), 1);
        assert_eq!(rewritten["widgets"][0]["id"], json!("good"));
    }

    #[test]
    fn unreadable_top_level_still_fails() {
        assert!(PersistedLayout::from_json_str(r#"{"id": "l", "widgets": []}"#).is_err());
        assert!(
            PersistedLayout::from_json_str(
                r#"{"id": "l", "name": "n", "widgets": "oops",
                    "createdAt": "2026-01-05T09:00:00Z", "updatedAt": "2026-01-05T09:00:00Z"}"#
            )
            .is_err()
        );
    }
}
