use std::sync::Once;
use std::time::{Duration, Instant};

use serde_json::json;
use sync_core::{init, update, EntityFamily, Msg, SyncSettings, SyncState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sync_logging::initialize_for_tests);
}

fn connected_with_document(id: &str) -> SyncState {
    let (state, _) = init(SyncSettings::default());
    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });
    let (state, _) = update(
        state,
        Msg::Hydrated {
            family: EntityFamily::Documents,
            body: json!([{"id": id, "name": "report.pdf", "status": "processing"}]).to_string(),
        },
    );
    state
}

fn progress(state: SyncState, id: &str, processed: u64, total: u64, at: Instant) -> SyncState {
    let text = json!({"type": "document_progress", "id": id, "processed": processed, "total": total})
        .to_string();
    update(state, Msg::FrameReceived { attempt: 1, text, at }).0
}

#[test]
fn burst_is_coalesced_and_terminal_sample_lands() {
    init_logging();
    let mut state = connected_with_document("doc-1");
    let start = Instant::now();
    for processed in 1..=50u64 {
        // 50 samples spread over 196 ms.
        let at = start + Duration::from_millis((processed - 1) * 4);
        state = progress(state, "doc-1", processed, 50, at);
    }

    let doc = state.documents().get("doc-1").unwrap();
    assert_eq!((doc.processed, doc.total), (Some(50), Some(50)));
    assert_eq!(doc.status, "processing", "progress must not touch other fields");

    let stats = state.stats();
    assert!(stats.reconciliations < 50, "got {}", stats.reconciliations);
    assert_eq!(stats.reconciliations + stats.throttled, 50);
    assert_eq!(state.throttler().tracked(), 0);
    assert_eq!(state.view().documents[0].progress_percent, Some(100));
}

#[test]
fn sample_after_the_interval_is_applied() {
    init_logging();
    let start = Instant::now();
    let state = connected_with_document("doc-1");
    let state = progress(state, "doc-1", 1, 10, start);
    let state = progress(state, "doc-1", 2, 10, start + Duration::from_millis(30));
    assert_eq!(state.documents().get("doc-1").unwrap().processed, Some(1));

    let state = progress(state, "doc-1", 3, 10, start + Duration::from_millis(130));
    assert_eq!(state.documents().get("doc-1").unwrap().processed, Some(3));
    assert_eq!(state.stats().throttled, 1);
}

#[test]
fn overflowing_progress_is_rejected() {
    init_logging();
    let state = connected_with_document("doc-1");
    let state = progress(state, "doc-1", 11, 10, Instant::now());

    assert_eq!(state.documents().get("doc-1").unwrap().processed, None);
    assert_eq!(state.stats().rejected, 1);
    assert_eq!(state.stats().reconciliations, 0);
}

#[test]
fn progress_for_unknown_document_is_a_noop() {
    init_logging();
    let state = connected_with_document("doc-1");
    let state = progress(state, "doc-404", 5, 10, Instant::now());

    assert!(!state.documents().contains("doc-404"));
    assert_eq!(state.documents().len(), 1);
}

#[test]
fn deleting_a_document_forgets_its_window() {
    init_logging();
    let start = Instant::now();
    let state = connected_with_document("doc-1");
    let state = progress(state, "doc-1", 1, 10, start);
    assert_eq!(state.throttler().tracked(), 1);

    let text = json!({"type": "document_deleted", "id": "doc-1"}).to_string();
    let (state, _) = update(state, Msg::FrameReceived { attempt: 1, text, at: start });
    assert_eq!(state.throttler().tracked(), 0);
    assert!(state.documents().is_empty());
}

#[test]
fn unknown_ids_leave_no_throttle_state() {
    init_logging();
    let start = Instant::now();
    let mut state = connected_with_document("doc-1");
    for i in 0..1000u64 {
        state = progress(state, &format!("ghost-{i}"), 1, 10, start);
    }
    let text = json!({"type": "document_status", "id": "ghost-0", "status": "failed"}).to_string();
    let (state, _) = update(state, Msg::FrameReceived { attempt: 1, text, at: start });

    assert_eq!(state.documents().len(), 1);
    assert_eq!(state.throttler().tracked(), 0);
    assert_eq!(state.stats().throttled, 0);
}

#[test]
fn reseeding_documents_drops_windows_of_vanished_ids() {
    init_logging();
    let start = Instant::now();
    let state = connected_with_document("doc-1");
    let state = progress(state, "doc-1", 1, 10, start);
    assert_eq!(state.throttler().tracked(), 1);

    let (state, _) = update(
        state,
        Msg::TransportClosed {
            attempt: 1,
            reason: "reset".to_string(),
        },
    );
    let (state, _) = update(state, Msg::ReconnectDue);
    let (state, _) = update(state, Msg::TransportOpened { attempt: 2 });
    let (state, _) = update(
        state,
        Msg::Hydrated {
            family: EntityFamily::Documents,
            body: json!([{"id": "doc-2", "name": "other.pdf"}]).to_string(),
        },
    );

    assert!(state.documents().contains("doc-2"));
    assert_eq!(state.throttler().tracked(), 0);
}
