//! End-to-end dashboard workflows through the public `LayoutStore` API.
//!
//! Positions in comments use the 1-based `{col, row, colSpan, rowSpan}` shape
//! dashboards are edited in; assertions use the canonical 0-based rects.

use opsgrid_layout::{
    CascadeMode, DefaultCatalog, DisplayRole, GridCell, GridConfig, GridPosition, GridRect,
    InteractionEffect, JsonFileStorage, LayoutStorage, LayoutStore, MemoryStorage, NoopReason,
    PersistedLayout, PixelPoint, ResizeDirection, WidgetDraft, WidgetId, WidgetKind,
};
use serde_json::json;

fn store_with(rects: &[GridRect]) -> (LayoutStore, Vec<WidgetId>) {
    let mut store = LayoutStore::default();
    let ids = rects
        .iter()
        .map(|rect| store.add_widget(WidgetDraft::new(WidgetKind::Kpi, *rect), false))
        .collect();
    store.save_layout();
    (store, ids)
}

fn rect_of(store: &LayoutStore, id: &WidgetId) -> GridRect {
    store.widget(id).expect("widget exists").rect
}

// ============================================================================
// No-overlap after committed interactions
// ============================================================================

#[test]
fn placement_on_stacked_column_leaves_no_overlap() {
    let (mut store, ids) = store_with(&[
        GridRect::new(0, 1, 4, 2),
        GridRect::new(0, 3, 4, 2),
        GridRect::new(0, 5, 4, 2),
        GridRect::new(4, 0, 8, 3),
    ]);
    store.start_placement(WidgetDraft::sized(WidgetKind::Chart, 6, 3));
    store.set_preview_position(GridCell { col: 0, row: 0 });
    store.confirm_placement();

    let report = store.invariant_report();
    assert!(report.is_clean(), "{:?}", report.issues);
    assert_eq!(rect_of(&store, &ids[2]), GridRect::new(0, 7, 4, 2));
}

#[test]
fn single_pass_cascade_is_kept_as_an_option() {
    let config = GridConfig {
        cascade: CascadeMode::SinglePass,
        ..GridConfig::default()
    };
    let mut store = LayoutStore::new(config).unwrap();
    for rect in [
        GridRect::new(0, 1, 4, 2),
        GridRect::new(0, 3, 4, 2),
        GridRect::new(0, 5, 4, 2),
    ] {
        store.add_widget(WidgetDraft::new(WidgetKind::Kpi, rect), false);
    }
    store.start_placement(WidgetDraft::sized(WidgetKind::Kpi, 4, 3));
    store.confirm_placement();
    assert!(
        store.invariant_report().overlaps() > 0,
        "one knock-on level cannot settle a three-deep column"
    );
}

#[test]
fn drag_chain_commit_leaves_no_overlap() {
    let (mut store, ids) = store_with(&[
        GridRect::new(0, 0, 6, 2),
        GridRect::new(6, 0, 6, 2),
        GridRect::new(6, 2, 6, 2),
        GridRect::new(3, 4, 6, 3),
    ]);
    store.begin_drag(&ids[0]);
    store.update_drag(&ids[0], GridCell { col: 5, row: 1 });
    let effect = store.end_drag(true);
    assert!(matches!(effect, InteractionEffect::DragCommitted { .. }));
    assert_eq!(rect_of(&store, &ids[0]), GridRect::new(5, 1, 6, 2));
    assert!(store.invariant_report().is_clean());
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn placement_cancel_is_noop_on_committed_layout() {
    let (mut store, _) = store_with(&[
        GridRect::new(0, 0, 4, 2),
        GridRect::new(4, 0, 4, 2),
        GridRect::new(0, 2, 12, 2),
    ]);
    let before = store.widgets().to_vec();

    store.start_placement_from_catalog("chart", &DefaultCatalog);
    store.set_preview_position(GridCell { col: 1, row: 0 });
    store.set_preview_position(GridCell { col: 4, row: 1 });
    store.cancel_placement();

    assert_eq!(store.widgets(), before.as_slice());
    assert!(!store.is_dirty());
    assert!(!store.session().is_active());
}

#[test]
fn dropped_guard_cancels_dangling_drag() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2), GridRect::new(0, 2, 4, 2)]);
    let before = store.widgets().to_vec();
    {
        let mut gesture = store.interaction();
        gesture.begin_drag(&ids[0]);
        gesture.update_drag(&ids[0], GridCell { col: 0, row: 1 });
        // No end signal arrives.
    }
    assert!(!store.session().is_active());
    assert_eq!(store.widgets(), before.as_slice());
}

#[test]
fn clear_during_drag_invalidates_session() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2)]);
    store.begin_drag(&ids[0]);
    store.clear_dashboard();
    assert!(!store.session().is_active());
    assert!(store.is_empty());
}

#[test]
fn placement_survives_programmatic_insert_with_fresh_preview() {
    let mut store = LayoutStore::default();
    store.start_placement(WidgetDraft::sized(WidgetKind::Kpi, 4, 2));
    assert_eq!(store.staged_displacement().map(|d| d.len()), Some(0));
    let id = store.add_widget(WidgetDraft::sized(WidgetKind::Kpi, 4, 2), true);
    assert_eq!(
        store.staged_displacement().and_then(|d| d.get(&id)),
        Some(GridRect::new(0, 2, 4, 2))
    );
}

// ============================================================================
// First-fit
// ============================================================================

#[test]
fn first_fit_picks_first_free_row() {
    // {col:1,row:1,colSpan:12,rowSpan:2} occupies the top two rows.
    let (mut store, _) = store_with(&[GridPosition::new(1, 1, 12, 2).to_rect()]);
    let id = store.add_widget(WidgetDraft::sized(WidgetKind::Kpi, 4, 2), true);
    let position = GridPosition::from(rect_of(&store, &id));
    assert_eq!((position.col, position.row), (1, 3));
}

#[test]
fn catalog_add_lands_beside_existing_widget() {
    let mut store = LayoutStore::default();
    let chart = store.add_from_catalog("chart", &DefaultCatalog).unwrap();
    let kpi = store.add_from_catalog("kpi", &DefaultCatalog).unwrap();
    assert_eq!(rect_of(&store, &chart), GridRect::new(0, 0, 6, 4));
    assert_eq!(rect_of(&store, &kpi), GridRect::new(6, 0, 3, 2));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_into_neighbour_is_rejected() {
    // A {col:1,row:1,colSpan:4,rowSpan:2}, B {col:5,row:1,colSpan:4,rowSpan:2}.
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2), GridRect::new(4, 0, 4, 2)]);
    store.begin_resize(&ids[0], ResizeDirection::E, PixelPoint::new(0.0, 0.0));
    let effect = store.update_resize_span(6, 2);
    assert_eq!(
        effect,
        InteractionEffect::ResizeRejected {
            id: ids[0].clone(),
            candidate: GridRect::new(0, 0, 6, 2),
            blocker: ids[1].clone(),
        }
    );
    store.end_resize();
    assert_eq!(rect_of(&store, &ids[0]), GridRect::new(0, 0, 4, 2));
    assert_eq!(rect_of(&store, &ids[1]), GridRect::new(4, 0, 4, 2));
    assert!(!store.is_dirty());
}

#[test]
fn pointer_resize_into_neighbour_is_rejected() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2), GridRect::new(4, 0, 4, 2)]);
    let pitch = store.metrics().col_pitch_px();
    store.begin_resize(&ids[0], ResizeDirection::E, PixelPoint::new(100.0, 50.0));
    let effect = store.update_resize(PixelPoint::new(100.0 + pitch * 2.0, 50.0));
    assert!(matches!(effect, InteractionEffect::ResizeRejected { .. }));
    assert_eq!(rect_of(&store, &ids[0]).w, 4);
}

#[test]
fn resize_commits_incrementally_up_to_blocker() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2), GridRect::new(6, 0, 4, 2)]);
    store.begin_resize(&ids[0], ResizeDirection::E, PixelPoint::new(0.0, 0.0));
    assert!(matches!(
        store.update_resize_span(6, 2),
        InteractionEffect::ResizeApplied { .. }
    ));
    assert!(matches!(
        store.update_resize_span(7, 2),
        InteractionEffect::ResizeRejected { .. }
    ));
    let effect = store.end_resize();
    assert_eq!(
        effect,
        InteractionEffect::ResizeEnded {
            id: ids[0].clone(),
            rect: GridRect::new(0, 0, 6, 2),
        }
    );
    assert!(store.is_dirty());
}

#[test]
fn resize_span_is_clamped_to_limits() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2)]);
    store.begin_resize(&ids[0], ResizeDirection::E, PixelPoint::new(0.0, 0.0));

    store.update_resize_span(1, 2);
    assert_eq!(rect_of(&store, &ids[0]).w, 2);

    store.update_resize_span(40, 2);
    assert_eq!(rect_of(&store, &ids[0]).w, 12);

    store.update_resize(PixelPoint::new(-5000.0, 0.0));
    assert_eq!(rect_of(&store, &ids[0]).w, 2);
    store.end_resize();
}

#[test]
fn west_resize_anchors_right_edge() {
    let (mut store, ids) = store_with(&[GridRect::new(4, 0, 4, 2)]);
    let pitch = store.metrics().col_pitch_px();
    store.begin_resize(&ids[0], ResizeDirection::W, PixelPoint::new(500.0, 10.0));
    store.update_resize(PixelPoint::new(500.0 - pitch * 3.0, 10.0));
    assert_eq!(rect_of(&store, &ids[0]), GridRect::new(1, 0, 7, 2));
    store.end_resize();
}

#[test]
fn resize_blocks_other_sessions() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2)]);
    store.begin_resize(&ids[0], ResizeDirection::S, PixelPoint::new(0.0, 0.0));
    assert_eq!(
        store.begin_drag(&ids[0]),
        InteractionEffect::noop(NoopReason::SessionAlreadyActive)
    );
    assert_eq!(
        store.confirm_placement(),
        InteractionEffect::noop(NoopReason::SessionKindMismatch)
    );
    let items = store.display_rects();
    assert_eq!(items[0].role, DisplayRole::Resizing);
}

// ============================================================================
// Presentation
// ============================================================================

#[test]
fn display_rects_show_staged_drag() {
    let (mut store, ids) = store_with(&[GridRect::new(0, 0, 4, 2), GridRect::new(4, 0, 4, 2)]);
    store.begin_drag(&ids[0]);
    store.update_drag(&ids[0], GridCell { col: 4, row: 0 });
    let items = store.display_rects();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].role, DisplayRole::Dragging);
    assert_eq!(items[0].rect, GridRect::new(4, 0, 4, 2));
    assert_eq!(items[1].role, DisplayRole::Displaced);
    assert_eq!(items[1].rect, GridRect::new(4, 2, 4, 2));
}

#[test]
fn display_rects_append_placement_candidate() {
    let (mut store, _) = store_with(&[GridRect::new(6, 0, 6, 2)]);
    store.start_placement(WidgetDraft::sized(WidgetKind::Alerts, 4, 3));
    let items = store.display_rects();
    let candidate = items.last().unwrap();
    assert_eq!(candidate.role, DisplayRole::Candidate);
    assert!(candidate.id.is_none());
    assert_eq!(candidate.rect, GridRect::new(0, 0, 4, 3));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn file_round_trip_preserves_widgets() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = JsonFileStorage::new(dir.path().join("layout.json"));

    let mut store = LayoutStore::default();
    let id = store.add_from_catalog("module_stats", &DefaultCatalog).unwrap();
    store.save_to(&mut storage).unwrap();

    let mut reloaded = LayoutStore::default();
    let report = reloaded.load_from(&mut storage).unwrap();
    assert!(report.notice().is_none());
    assert_eq!(reloaded.widgets(), store.widgets());
    assert_eq!(rect_of(&reloaded, &id), GridRect::new(0, 0, 6, 3));
    assert_eq!(reloaded.layout().id, store.layout().id);
}

#[test]
fn legacy_one_based_positions_load() {
    let stored = json!({
        "id": "layout-7",
        "name": "Ops",
        "widgets": [
            { "id": "w1", "type": "alerts",
              "position": { "col": 1, "row": 1, "colSpan": 4, "rowSpan": 3 } },
            { "id": "w2", "type": "list",
              "position": { "col": 5, "row": 1, "colSpan": 8, "rowSpan": 2 } }
        ],
        "createdAt": "2026-02-01T08:00:00Z",
        "updatedAt": "2026-02-01T08:00:00Z"
    });
    let mut storage = MemoryStorage::with_contents(stored.to_string());
    let mut store = LayoutStore::default();
    let report = store.load_from(&mut storage).unwrap();
    assert!(report.dropped.is_empty());
    assert_eq!(storage.writes(), 0);
    assert_eq!(rect_of(&store, &WidgetId::new("w1")), GridRect::new(0, 0, 4, 3));
    assert_eq!(rect_of(&store, &WidgetId::new("w2")), GridRect::new(4, 0, 8, 2));

    // Saving writes the canonical shape only.
    store.move_widget(&WidgetId::new("w1"), GridRect::new(0, 2, 4, 3));
    store.save_to(&mut storage).unwrap();
    let text = storage.read().unwrap().unwrap();
    assert!(!text.contains("colSpan"));
    let record = PersistedLayout::from_json_str(&text).unwrap();
    assert_eq!(record.widgets.len(), 2);
}

#[test]
fn corrupt_widgets_are_dropped_and_written_back() {
    let stored = json!({
        "id": "layout-9",
        "name": "Ops",
        "widgets": [
            { "id": "ok", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2 } },
            { "id": "neg", "type": "kpi", "position": { "x": -1, "y": 0, "w": 3, "h": 2 } },
            { "id": "nan", "type": "kpi", "position": { "x": "NaN", "y": 0, "w": 3, "h": 2 } },
            { "id": "nopos", "type": "kpi" },
            { "id": "ok", "type": "chart", "position": { "x": 4, "y": 0, "w": 6, "h": 4 } },
            { "id": "strpos", "type": "kpi", "position": "corrupt" },
            { "id": 5, "type": "kpi", "position": { "x": 4, "y": 0, "w": 3, "h": 2 } },
            { "id": "numtype", "type": 7, "position": { "x": 4, "y": 0, "w": 3, "h": 2 } },
            { "id": "src", "type": "list", "position": { "x": 4, "y": 0, "w": 3, "h": 2 },
              "dataSource": "oops" }
        ],
        "createdAt": "2026-02-01T08:00:00Z",
        "updatedAt": "2026-02-01T08:00:00Z"
    });
    let mut storage = MemoryStorage::with_contents(stored.to_string());
    let mut store = LayoutStore::default();
    let report = store.load_from(&mut storage).unwrap();

    assert!(!report.reset);
    assert_eq!(store.len(), 1);
    assert_eq!(rect_of(&store, &WidgetId::new("ok")), GridRect::new(0, 0, 3, 2));
    assert_eq!(report.dropped.len(), 8);
    assert!(report.notice().unwrap().contains("8 widget"));
    assert_eq!(storage.writes(), 1);

    let written: serde_json::Value = serde_json::from_str(storage.contents().unwrap()).unwrap();
    assert_eq!(
        written["widgets"],
        json!([{ "id": "ok", "type": "kpi", "position": { "x": 0, "y": 0, "w": 3, "h": 2 },
                 "config": {} }])
    );

    let mut again = LayoutStore::default();
    let second = again.load_from(&mut storage).unwrap();
    assert!(second.dropped.is_empty());
    assert_eq!(again.widgets(), store.widgets());
}

#[test]
fn saving_clean_store_is_idempotent() {
    let mut storage = MemoryStorage::new();
    let mut store = LayoutStore::default();
    store.add_from_catalog("kpi", &DefaultCatalog);
    store.save_to(&mut storage).unwrap();
    let first = storage.contents().unwrap().to_owned();
    store.save_to(&mut storage).unwrap();
    assert_eq!(storage.contents().unwrap(), first);
}

#[test]
fn config_from_toml_drives_store() {
    let config = GridConfig::from_toml_str(
        r#"
        total_cols = 8
        id_prefix = "tile"
        cascade = "fixed_point"

        [spans]
        min_w = 2
        max_w = 8
        "#,
    )
    .unwrap();
    let mut store = LayoutStore::new(config).unwrap();
    let id = store.add_widget(WidgetDraft::sized(WidgetKind::Chart, 12, 2), true);
    assert_eq!(id.as_str(), "tile-1");
    assert_eq!(rect_of(&store, &id).w, 8);
}
