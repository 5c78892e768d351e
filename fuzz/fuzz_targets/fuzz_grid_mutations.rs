#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use opsgrid_layout::{
    DefaultCatalog, GridCell, LayoutStore, PixelPoint, ResizeDirection, WidgetDraft, WidgetKind,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Catalog(u8),
    AutoAdd { w: u8, h: u8 },
    StartPlacement { w: u8, h: u8 },
    Preview { col: u8, row: u8 },
    Confirm,
    CancelPlacement,
    BeginDrag(u8),
    Drag { col: u8, row: u8 },
    EndDrag(bool),
    BeginResize { widget: u8, direction: u8 },
    Resize { dx: i16, dy: i16 },
    EndResize,
    Remove(u8),
    ForceCancel,
    Save,
}

fn pick(store: &LayoutStore, index: u8) -> Option<opsgrid_layout::WidgetId> {
    let widgets = store.widgets();
    if widgets.is_empty() {
        return None;
    }
    Some(widgets[usize::from(index) % widgets.len()].id.clone())
}

fuzz_target!(|ops: Vec<Op>| {
    let mut store = LayoutStore::default();
    let mut dragging = None;

    for op in ops.into_iter().take(256) {
        match op {
            Op::Catalog(kind) => {
                let kind = WidgetKind::ALL[usize::from(kind) % WidgetKind::ALL.len()];
                store.add_from_catalog(kind.as_str(), &DefaultCatalog);
            }
            Op::AutoAdd { w, h } => {
                store.add_widget(
                    WidgetDraft::sized(WidgetKind::Kpi, u16::from(w % 16), u16::from(h % 16)),
                    true,
                );
            }
            Op::StartPlacement { w, h } => {
                store.start_placement(WidgetDraft::sized(
                    WidgetKind::Chart,
                    u16::from(w % 16),
                    u16::from(h % 16),
                ));
            }
            Op::Preview { col, row } => {
                store.set_preview_position(GridCell {
                    col: u16::from(col % 16),
                    row: u16::from(row % 32),
                });
            }
            Op::Confirm => {
                store.confirm_placement();
            }
            Op::CancelPlacement => {
                store.cancel_placement();
            }
            Op::BeginDrag(index) => {
                if let Some(id) = pick(&store, index) {
                    store.begin_drag(&id);
                    dragging = Some(id);
                }
            }
            Op::Drag { col, row } => {
                if let Some(id) = &dragging {
                    store.update_drag(
                        id,
                        GridCell {
                            col: u16::from(col % 16),
                            row: u16::from(row % 32),
                        },
                    );
                }
            }
            Op::EndDrag(commit) => {
                store.end_drag(commit);
            }
            Op::BeginResize { widget, direction } => {
                if let Some(id) = pick(&store, widget) {
                    let direction =
                        ResizeDirection::ALL[usize::from(direction) % ResizeDirection::ALL.len()];
                    store.begin_resize(&id, direction, PixelPoint::new(0.0, 0.0));
                }
            }
            Op::Resize { dx, dy } => {
                store.update_resize(PixelPoint::new(f64::from(dx), f64::from(dy)));
            }
            Op::EndResize => {
                store.end_resize();
            }
            Op::Remove(index) => {
                if let Some(id) = pick(&store, index) {
                    store.remove_widget(&id);
                }
            }
            Op::ForceCancel => {
                store.force_cancel();
            }
            Op::Save => {
                store.save_layout();
            }
        }

        // The committed layout is clean between any two operations, even with
        // a session still live.
        let report = store.invariant_report();
        assert!(report.is_clean(), "invariants violated: {:?}", report.issues);
    }
});
