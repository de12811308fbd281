use std::time::Instant;

use sync_logging::{sync_debug, sync_info, sync_warn};

use crate::envelope::decode;
use crate::route::route;
use crate::{Effect, EntityFamily, Msg, SyncSettings, SyncState};

/// Builds a fresh core and the effects that start it: hydrate every family and
/// open the first transport.
pub fn init(settings: SyncSettings) -> (SyncState, Vec<Effect>) {
    let mut state = SyncState::new(settings);
    let mut effects: Vec<Effect> = EntityFamily::ALL
        .into_iter()
        .map(|family| state.request_hydration(family))
        .collect();
    effects.extend(state.connection.connect());
    state.mark_dirty();
    (state, effects)
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SyncState, msg: Msg) -> (SyncState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConnectRequested => {
            let effects = state.connection.connect();
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::TransportOpened { attempt } => match state.connection.on_opened(attempt) {
            Some(mut effects) => {
                state.mark_dirty();
                // Notifications sent while we were away are gone; refetch records.
                if state.connection.established() > 1 && state.settings.rehydrate_on_reconnect {
                    for family in EntityFamily::ALL {
                        if !family.is_aggregate() {
                            effects.push(state.request_hydration(family));
                        }
                    }
                }
                effects
            }
            None => Vec::new(),
        },
        Msg::FrameReceived { attempt, text, at } => handle_frame(&mut state, attempt, &text, at),
        Msg::TransportFailed { attempt, message } => state.connection.on_failed(attempt, &message),
        Msg::TransportClosed { attempt, reason } => {
            let effects = state.connection.on_closed(attempt, &reason);
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::ReconnectDue => {
            let effects = state.connection.on_reconnect_due();
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::ActivityExpired { family, generation } => {
            if state.activity.expire(family, generation) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Hydrated { family, body } => {
            if state.connection.is_torn_down() {
                sync_debug!("ignoring {family} hydration after teardown");
                return (state, Vec::new());
            }
            if !state.settle_hydration(family) {
                sync_debug!("ignoring {family} hydration that outlived a release");
                return (state, Vec::new());
            }
            match state.hydrate(family, &body) {
                Ok(count) => {
                    state.stats.hydrations += 1;
                    sync_info!("hydrated {family} with {count} record(s)");
                }
                Err(err) => {
                    state.stats.hydration_failures += 1;
                    sync_warn!("discarding {family} hydration body: {err}");
                }
            }
            Vec::new()
        }
        Msg::HydrationFailed { family, message } => {
            state.settle_hydration(family);
            state.stats.hydration_failures += 1;
            sync_warn!("hydration of {family} failed: {message}");
            Vec::new()
        }
        Msg::FamilyReleased(family) => {
            state.release(family);
            Vec::new()
        }
        Msg::SessionEnded => {
            state.release_all();
            Vec::new()
        }
        Msg::RefreshRequested => state.connection.refresh(),
        Msg::TeardownRequested => {
            let effects = state.connection.teardown();
            state.release_all();
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn handle_frame(state: &mut SyncState, attempt: u64, text: &str, at: Instant) -> Vec<Effect> {
    if !state.connection.is_current(attempt) || state.connection.is_torn_down() {
        state.stats.stale_frames += 1;
        sync_debug!("dropping frame from stale attempt {attempt}");
        return Vec::new();
    }
    state.stats.frames_received += 1;

    let envelope = match decode(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            state.stats.frames_dropped += 1;
            state.tap.observe_dropped(&err.to_string(), text);
            return Vec::new();
        }
    };
    state
        .tap
        .observe_decoded(&envelope.tag, envelope.message.family());

    let outcome = route(state, envelope.message, at);
    state.record(outcome)
}
