#![forbid(unsafe_code)]

//! Dashboard widget grid layout engine.
//!
//! A dashboard is a 12-column grid of widgets that never overlap. The
//! [`LayoutStore`] owns the widget list and runs the three interactive
//! workflows on top of it:
//!
//! - **Placement**: a new widget is previewed, neighbours it would cover are
//!   staged out of the way, and confirm commits both at once.
//! - **Drag**: an existing widget is moved with the same staged cascade.
//! - **Resize**: a widget's span follows the pointer but a span that would
//!   overlap another widget is rejected, never cascaded.
//!
//! Layouts persist through a [`LayoutStorage`] backend as JSON records.
//! Loading tolerates corrupt records: bad widgets are dropped, an unreadable
//! record resets to an empty layout, and the corrected record is written back.
//!
//! ```
//! use opsgrid_layout::{DefaultCatalog, GridCell, LayoutStore};
//!
//! let mut store = LayoutStore::default();
//! let kpi = store.add_from_catalog("kpi", &DefaultCatalog).unwrap();
//!
//! store.start_placement_from_catalog("chart", &DefaultCatalog);
//! store.set_preview_position(GridCell { col: 0, row: 0 });
//! store.confirm_placement();
//!
//! // The KPI was pushed below the chart.
//! assert_eq!(store.widget(&kpi).unwrap().rect.y, 4);
//! assert!(store.invariant_report().is_clean());
//! ```

pub mod catalog;
pub mod collision;
pub mod config;
pub mod drag;
pub mod persist;
pub mod placement;
pub mod resize;
pub mod session;
pub mod storage;
pub mod store;
pub mod widget;

pub use catalog::{DefaultCatalog, WidgetCatalog};
pub use collision::{
    CascadeMode, Displacement, cascade_displace, first_collision, first_fit, overlapping_pairs,
};
pub use config::{DEFAULT_MAX_ROW_SCAN, GridConfig, GridConfigError};
pub use persist::{
    DashboardLayout, DropReason, DroppedWidget, LoadReport, PersistedLayout, PersistedPosition,
    PersistedWidget, StoredWidget, sanitize_layout,
};
pub use resize::{ResizeController, ResizeDirection};
pub use session::{
    CancelReason, DragSession, InteractionEffect, InteractionSession, NoopReason,
    PlacementSession, ResizeSession, SessionKind,
};
pub use storage::{JsonFileStorage, LayoutStorage, MemoryStorage, StorageError, write_layout};
pub use store::{
    DisplayItem, DisplayRole, InteractionGuard, LayoutIssue, LayoutReport, LayoutStore,
};
pub use widget::{
    DataSource, Widget, WidgetDraft, WidgetId, WidgetKind, WidgetLimits, WidgetPatch,
};

pub use opsgrid_core::{
    GridCell, GridConstraints, GridMetrics, GridMetricsError, GridPosition, GridRect, PixelPoint,
    PixelRect, PixelSize, SpanLimits,
};
