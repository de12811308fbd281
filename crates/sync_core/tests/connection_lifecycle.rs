use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sync_core::{init, update, ConnectionStatus, Effect, EntityFamily, Msg, SyncSettings, SyncState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sync_logging::initialize_for_tests);
}

fn settings() -> SyncSettings {
    SyncSettings {
        reconnect_base_ms: 1_000,
        reconnect_max_ms: 4_000,
        ..SyncSettings::default()
    }
}

fn closed(state: SyncState, attempt: u64) -> (SyncState, Vec<Effect>) {
    update(
        state,
        Msg::TransportClosed {
            attempt,
            reason: "connection reset".to_string(),
        },
    )
}

fn scheduled_delay(effects: &[Effect]) -> Option<Duration> {
    effects.iter().find_map(|effect| match effect {
        Effect::ScheduleReconnect { delay } => Some(*delay),
        _ => None,
    })
}

#[test]
fn init_hydrates_everything_and_opens_once() {
    init_logging();
    let (state, effects) = init(settings());

    let mut expected: Vec<Effect> = EntityFamily::ALL.into_iter().map(Effect::Hydrate).collect();
    expected.push(Effect::OpenTransport { attempt: 1 });
    assert_eq!(effects, expected);
    assert_eq!(state.connection().status(), ConnectionStatus::Connecting);

    let (state, effects) = update(state, Msg::ConnectRequested);
    assert!(effects.is_empty());
    assert_eq!(state.connection().attempt(), 1);
}

#[test]
fn open_sends_refresh_command_once() {
    init_logging();
    let (state, _) = init(settings());
    let (state, effects) = update(state, Msg::TransportOpened { attempt: 1 });

    assert_eq!(effects, vec![Effect::SendControl("refresh_status".to_string())]);
    assert_eq!(state.connection().status(), ConnectionStatus::Connected);

    let (_state, effects) = update(state, Msg::TransportOpened { attempt: 1 });
    assert!(effects.is_empty());
}

#[test]
fn unexpected_close_schedules_base_then_doubled_delay() {
    init_logging();
    let (state, _) = init(settings());
    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });

    let (state, effects) = closed(state, 1);
    assert_eq!(state.connection().status(), ConnectionStatus::Disconnected);
    assert_eq!(effects[0], Effect::CloseTransport);
    assert_eq!(scheduled_delay(&effects), Some(Duration::from_millis(1_000)));

    let (state, effects) = update(state, Msg::ReconnectDue);
    assert_eq!(effects, vec![Effect::OpenTransport { attempt: 2 }]);
    assert_eq!(state.connection().status(), ConnectionStatus::Connecting);

    let (_state, effects) = closed(state, 2);
    assert_eq!(scheduled_delay(&effects), Some(Duration::from_millis(2_000)));
}

#[test]
fn delays_are_non_decreasing_capped_and_reset_after_success() {
    init_logging();
    let (mut state, _) = init(settings());
    let mut delays = Vec::new();
    for attempt in 1..=5 {
        let (next, effects) = closed(state, attempt);
        delays.push(scheduled_delay(&effects).unwrap());
        let (next, _) = update(next, Msg::ReconnectDue);
        state = next;
    }
    assert_eq!(
        delays,
        [1_000, 2_000, 4_000, 4_000, 4_000]
            .map(Duration::from_millis)
            .to_vec()
    );
    assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));

    let (state, _) = update(state, Msg::TransportOpened { attempt: 6 });
    let (_state, effects) = closed(state, 6);
    assert_eq!(scheduled_delay(&effects), Some(Duration::from_millis(1_000)));
}

#[test]
fn transport_error_forces_close_then_close_path_runs() {
    init_logging();
    let (state, _) = init(settings());
    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });
    let (state, effects) = update(
        state,
        Msg::TransportFailed {
            attempt: 1,
            message: "broken pipe".to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::CloseTransport]);

    let (state, effects) = closed(state, 1);
    assert!(scheduled_delay(&effects).is_some());
    assert!(state.connection().reconnect_pending());
}

#[test]
fn manual_connect_while_waiting_cancels_the_timer() {
    init_logging();
    let (state, _) = init(settings());
    let (state, _) = closed(state, 1);
    let (state, effects) = update(state, Msg::ConnectRequested);

    assert_eq!(
        effects,
        vec![Effect::CancelReconnect, Effect::OpenTransport { attempt: 2 }]
    );
    let (_state, effects) = update(state, Msg::ReconnectDue);
    assert!(effects.is_empty());
}

#[test]
fn reopening_after_a_drop_rehydrates_record_families() {
    init_logging();
    let (state, _) = init(settings());
    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });
    let (state, _) = closed(state, 1);
    let (state, _) = update(state, Msg::ReconnectDue);
    let (_state, effects) = update(state, Msg::TransportOpened { attempt: 2 });

    assert_eq!(
        effects,
        vec![
            Effect::SendControl("refresh_status".to_string()),
            Effect::Hydrate(EntityFamily::Connectors),
            Effect::Hydrate(EntityFamily::Documents),
        ]
    );
}

#[test]
fn refresh_only_goes_out_while_connected() {
    init_logging();
    let (state, _) = init(settings());
    let (state, effects) = update(state, Msg::RefreshRequested);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });
    let (_state, effects) = update(state, Msg::RefreshRequested);
    assert_eq!(effects, vec![Effect::SendControl("refresh_status".to_string())]);
}

#[test]
fn teardown_closes_clears_and_stops_retrying() {
    init_logging();
    let (state, _) = init(settings());
    let (state, _) = update(state, Msg::TransportOpened { attempt: 1 });
    let (state, _) = update(
        state,
        Msg::Hydrated {
            family: EntityFamily::Connectors,
            body: r#"[{"id":"A","name":"x"}]"#.to_string(),
        },
    );
    assert_eq!(state.connectors().len(), 1);

    let (state, effects) = update(state, Msg::TeardownRequested);
    assert_eq!(effects, vec![Effect::CloseTransport]);
    assert!(state.connectors().is_empty());

    let (state, effects) = closed(state, 1);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::ReconnectDue);
    assert!(effects.is_empty());
    assert_eq!(state.connection().status(), ConnectionStatus::Disconnected);
}
