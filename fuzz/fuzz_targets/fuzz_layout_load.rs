#![no_main]

use libfuzzer_sys::fuzz_target;
use opsgrid_layout::{LayoutStore, MemoryStorage, PersistedLayout};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut storage = MemoryStorage::with_contents(text);
    let mut store = LayoutStore::default();
    let Ok(report) = store.load_from(&mut storage) else {
        return;
    };

    // Whatever was stored, the written-back record must load cleanly.
    if report.needs_write_back() {
        let written = storage.contents().expect("write-back happened");
        let record = PersistedLayout::from_json_str(written).expect("write-back is valid JSON");
        assert_eq!(record.widgets.len(), store.len());
        assert!(record.widgets.iter().all(|entry| entry.record().is_some()));

        let mut again = LayoutStore::default();
        let second = again.load_from(&mut storage).expect("memory storage never fails");
        assert!(second.dropped.is_empty(), "sanitized record dropped widgets again");
        assert!(!second.reset, "sanitized record failed to parse");
        assert_eq!(again.widgets(), store.widgets());
    }
    assert!(!store.is_dirty());
});
