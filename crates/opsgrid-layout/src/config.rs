//! Grid configuration.
//!
//! Every tunable of the dashboard grid lives in one [`GridConfig`] that can
//! be loaded from TOML or JSON at startup.
//!
//! ```toml
//! # opsgrid.toml
//! total_cols = 12
//! row_height_px = 80.0
//! margin_px = [16.0, 16.0]
//! cascade = "fixed_point"
//!
//! [spans]
//! min_w = 2
//! min_h = 2
//! ```
//!
//! Missing keys fall back to [`GridConfig::default`].

use std::fmt;
use std::path::Path;

use opsgrid_core::{
    DEFAULT_CONTAINER_WIDTH_PX, DEFAULT_MARGIN_PX, DEFAULT_ROW_HEIGHT_PX, DEFAULT_TOTAL_COLS,
    GridConstraints, GridMetrics, GridMetricsError, SpanLimits,
};
use serde::{Deserialize, Serialize};

use crate::collision::CascadeMode;

/// Default number of rows the first-fit scan examines before appending below.
pub const DEFAULT_MAX_ROW_SCAN: u16 = 20;

/// Grid configuration for one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns.
    pub total_cols: u16,
    /// Row height in pixels.
    pub row_height_px: f64,
    /// Container width assumed until the host reports the real one.
    pub container_width_px: f64,
    /// `[x, y]` gutter between cells in pixels.
    pub margin_px: [f64; 2],
    /// Rows examined by first-fit placement.
    pub max_row_scan: u16,
    /// Span bounds applied to widgets without their own.
    pub spans: SpanLimits,
    /// Displacement propagation for placement and drag previews.
    pub cascade: CascadeMode,
    /// Prefix for generated widget ids.
    pub id_prefix: String,
    /// Name given to a freshly created layout.
    pub layout_name: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            total_cols: DEFAULT_TOTAL_COLS,
            row_height_px: DEFAULT_ROW_HEIGHT_PX,
            container_width_px: DEFAULT_CONTAINER_WIDTH_PX,
            margin_px: DEFAULT_MARGIN_PX,
            max_row_scan: DEFAULT_MAX_ROW_SCAN,
            spans: SpanLimits::default(),
            cascade: CascadeMode::default(),
            id_prefix: "widget".to_owned(),
            layout_name: "Dashboard".to_owned(),
        }
    }
}

impl GridConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GridConfigError> {
        let config: Self = toml::from_str(s).map_err(GridConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GridConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GridConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, GridConfigError> {
        let config: Self = serde_json::from_str(s).map_err(GridConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, GridConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GridConfigError::Io)?;
        Self::from_json_str(&content)
    }

    fn checked(self) -> Result<Self, GridConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(GridConfigError::Validation(errors))
        }
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(err) = self.metrics() {
            errors.push(format!("grid metrics: {err}"));
        }

        let spans = self.spans;
        if spans.min_w == 0 {
            errors.push("spans.min_w must be > 0".into());
        }
        if spans.min_h == 0 {
            errors.push("spans.min_h must be > 0".into());
        }
        if spans.min_w > spans.max_w {
            errors.push(format!(
                "spans.min_w ({}) must be <= spans.max_w ({})",
                spans.min_w, spans.max_w
            ));
        }
        if spans.min_h > spans.max_h {
            errors.push(format!(
                "spans.min_h ({}) must be <= spans.max_h ({})",
                spans.min_h, spans.max_h
            ));
        }
        if spans.max_w > self.total_cols {
            errors.push(format!(
                "spans.max_w ({}) must be <= total_cols ({})",
                spans.max_w, self.total_cols
            ));
        }

        if self.max_row_scan == 0 {
            errors.push("max_row_scan must be > 0".into());
        }
        if self.id_prefix.is_empty() {
            errors.push("id_prefix must not be empty".into());
        }

        errors
    }

    /// Coordinate system for this config.
    pub fn metrics(&self) -> Result<GridMetrics, GridMetricsError> {
        GridMetrics::new(
            self.total_cols,
            self.row_height_px,
            self.container_width_px,
            self.margin_px,
        )
    }

    /// Grid boundary and default span bounds.
    #[must_use]
    pub fn constraints(&self) -> GridConstraints {
        GridConstraints::new(self.total_cols, self.spans)
    }
}

/// Errors from loading a grid config.
#[derive(Debug)]
pub enum GridConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for GridConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for GridConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
