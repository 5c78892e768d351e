//! Overlap detection and cascading displacement.
//!
//! Everything here is a pure function of a widget snapshot. Nothing mutates
//! the canonical layout; callers receive a [`Displacement`] proposal and
//! decide when to apply it.
//!
//! # Cascade
//!
//! Given a moving rectangle `M`:
//!
//! 1. Every widget overlapping `M` is pushed straight down so its top sits on
//!    `M`'s bottom edge (column and spans unchanged).
//! 2. Any widget that now overlaps a pushed widget is pushed below that
//!    widget's new bottom edge.
//!
//! Widgets are visited in ascending row order (then column, then list order),
//! so higher widgets settle first. [`CascadeMode::FixedPoint`] repeats step 2
//! until a pass changes nothing; [`CascadeMode::SinglePass`] stops after one
//! extra pass beyond the direct hits.

use std::collections::BTreeMap;

use opsgrid_core::GridRect;
use serde::{Deserialize, Serialize};

use crate::widget::{Widget, WidgetId};

/// How far displacement propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Direct hits plus exactly one level of knock-on pushes. Chains deeper
    /// than that can be left overlapping.
    SinglePass,
    /// Repeat knock-on passes until nothing moves. Every committed layout
    /// stays overlap-free.
    #[default]
    FixedPoint,
}

/// Proposed new rectangles for displaced widgets, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Displacement {
    moves: BTreeMap<WidgetId, GridRect>,
}

impl Displacement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &WidgetId) -> Option<GridRect> {
        self.moves.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: &WidgetId) -> bool {
        self.moves.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WidgetId, &GridRect)> {
        self.moves.iter()
    }

    fn insert(&mut self, id: WidgetId, rect: GridRect) {
        self.moves.insert(id, rect);
    }
}

impl IntoIterator for Displacement {
    type Item = (WidgetId, GridRect);
    type IntoIter = std::collections::btree_map::IntoIter<WidgetId, GridRect>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

/// Compute the displacement caused by placing `moving` on top of `widgets`.
///
/// The widget named by `exclude` (the one being dragged) is ignored entirely.
#[must_use]
pub fn cascade_displace(
    moving: &GridRect,
    exclude: Option<&WidgetId>,
    widgets: &[Widget],
    mode: CascadeMode,
) -> Displacement {
    let mut order: Vec<&Widget> = widgets
        .iter()
        .filter(|widget| Some(&widget.id) != exclude)
        .collect();
    // Stable sort keeps list order as the final tie-break.
    order.sort_by_key(|widget| (widget.rect.y, widget.rect.x));

    let mut current: Vec<GridRect> = order.iter().map(|widget| widget.rect).collect();
    let mut pushed = vec![false; order.len()];

    for (rect, was_pushed) in current.iter_mut().zip(pushed.iter_mut()) {
        if moving.overlaps(rect) {
            rect.y = moving.bottom();
            *was_pushed = true;
        }
    }

    match mode {
        CascadeMode::SinglePass => knock_on_once(&mut current, &mut pushed),
        CascadeMode::FixedPoint => {
            // Each pass either settles the pushed set against itself or pulls
            // in a previously untouched widget, so this bound is never hit on
            // well-formed input. It only guarantees termination.
            let cap = order.len().saturating_mul(2).saturating_add(2);
            let mut passes = 0;
            while settle_pass(&mut current, &mut pushed) {
                passes += 1;
                if passes >= cap {
                    tracing::warn!(passes, widgets = order.len(), "cascade hit pass cap");
                    break;
                }
            }
        }
    }

    let mut displacement = Displacement::new();
    for (widget, rect) in order.iter().zip(current) {
        if widget.rect != rect {
            displacement.insert(widget.id.clone(), rect);
        }
    }
    displacement
}

/// One knock-on level: untouched widgets yield to direct hits only.
fn knock_on_once(current: &mut [GridRect], pushed: &mut [bool]) {
    let direct: Vec<GridRect> = current
        .iter()
        .zip(pushed.iter())
        .filter_map(|(rect, &hit)| hit.then_some(*rect))
        .collect();
    for (rect, was_pushed) in current.iter_mut().zip(pushed.iter_mut()) {
        if *was_pushed {
            continue;
        }
        let floor = direct
            .iter()
            .filter(|blocker| blocker.overlaps(rect))
            .map(GridRect::bottom)
            .max();
        if let Some(y) = floor {
            rect.y = y;
            *was_pushed = true;
        }
    }
}

/// One fixed-point pass. Returns whether anything moved.
///
/// An untouched widget yields to any pushed widget it overlaps. Two pushed
/// widgets that overlap resolve in visit order: the later one moves.
fn settle_pass(current: &mut [GridRect], pushed: &mut [bool]) -> bool {
    let mut changed = false;
    for index in 0..current.len() {
        let rect = current[index];
        let floor = (0..current.len())
            .filter(|&other| other != index && pushed[other])
            .filter(|&other| !pushed[index] || other < index)
            .filter(|&other| current[other].overlaps(&rect))
            .map(|other| current[other].bottom())
            .max();
        if let Some(y) = floor {
            current[index].y = y;
            pushed[index] = true;
            changed = true;
        }
    }
    changed
}

/// Whether `rect` overlaps any widget other than `exclude`. Returns the first
/// blocker in list order.
#[must_use]
pub fn first_collision<'a>(
    rect: &GridRect,
    exclude: Option<&WidgetId>,
    widgets: &'a [Widget],
) -> Option<&'a Widget> {
    widgets
        .iter()
        .filter(|widget| Some(&widget.id) != exclude)
        .find(|widget| widget.rect.overlaps(rect))
}

/// Every overlapping pair, in list order.
#[must_use]
pub fn overlapping_pairs(widgets: &[Widget]) -> Vec<(WidgetId, WidgetId)> {
    let mut pairs = Vec::new();
    for (i, a) in widgets.iter().enumerate() {
        for b in &widgets[i + 1..] {
            if a.rect.overlaps(&b.rect) {
                pairs.push((a.id.clone(), b.id.clone()));
            }
        }
    }
    pairs
}

/// First-fit slot for a `w x h` widget.
///
/// Scans rows `0..max_row_scan`, and within each row columns left to right,
/// returning the first slot free of overlap. When the scan finds nothing the
/// widget goes at column 0 directly below the lowest existing widget, which
/// always succeeds.
#[must_use]
pub fn first_fit(
    w: u16,
    h: u16,
    widgets: &[Widget],
    total_cols: u16,
    max_row_scan: u16,
) -> GridRect {
    let w = w.clamp(1, total_cols.max(1));
    let h = h.max(1);
    for row in 0..max_row_scan {
        for col in 0..=total_cols.saturating_sub(w) {
            let candidate = GridRect::new(col, row, w, h);
            if first_collision(&candidate, None, widgets).is_none() {
                return candidate;
            }
        }
    }
    let below = widgets
        .iter()
        .map(|widget| widget.rect.bottom())
        .max()
        .unwrap_or(0);
    GridRect::new(0, below, w, h)
}
